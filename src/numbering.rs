use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use rand::Rng;

use crate::error::InvoiceError;

pub const MAX_PAGES: usize = 50;
pub const MAX_CONTROL: u32 = 999_999;
pub const CONTROL_JUMPS: RangeInclusive<u32> = 1..=11;
pub const MAX_CONTROL_REPEATS: usize = 3;

/// Sequential invoice numbers, one per page.
#[derive(Debug, Clone)]
pub struct InvoiceNumbers {
    next: Option<u32>,
    issued: usize,
}

impl InvoiceNumbers {
    pub fn new(start: u32) -> Result<Self, InvoiceError> {
        if start == 0 {
            return Err(InvoiceError::InvalidInvoiceStart);
        }
        Ok(Self {
            next: Some(start),
            issued: 0,
        })
    }

    pub fn issue(&mut self) -> Result<u32, InvoiceError> {
        if self.issued >= MAX_PAGES {
            return Err(InvoiceError::InvoiceLimit { max: MAX_PAGES });
        }
        let number = self
            .next
            .ok_or(InvoiceError::InvoiceOverflow { last: u32::MAX })?;
        self.next = number.checked_add(1);
        self.issued += 1;
        Ok(number)
    }
}

/// A six digit control number.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct ControlNumber(u32);

impl ControlNumber {
    pub fn new(value: u32) -> Result<Self, InvoiceError> {
        if value > MAX_CONTROL {
            return Err(InvoiceError::ControlOutOfRange { value });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ControlNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

/// Control numbers advancing by a random jump per page.
///
/// The first page gets the start value. No value is issued more than
/// `MAX_CONTROL_REPEATS` times for the same date; a fourth request bumps the
/// value until it is fresh for that date.
#[derive(Debug, Clone)]
pub struct ControlNumbers {
    next: u32,
    jumps: RangeInclusive<u32>,
    issued: usize,
    per_date: HashMap<(NaiveDate, u32), usize>,
}

impl ControlNumbers {
    pub fn new(start: ControlNumber) -> Self {
        Self::with_jumps(start, CONTROL_JUMPS)
    }

    pub(crate) fn with_jumps(
        start: ControlNumber,
        jumps: RangeInclusive<u32>,
    ) -> Self {
        Self {
            next: start.value(),
            jumps,
            issued: 0,
            per_date: HashMap::new(),
        }
    }

    pub fn issue<R: Rng + ?Sized>(
        &mut self,
        date: NaiveDate,
        rng: &mut R,
    ) -> Result<ControlNumber, InvoiceError> {
        let page = self.issued + 1;
        let mut value = self.next;
        while self.repeats(date, value) >= MAX_CONTROL_REPEATS {
            value += 1;
        }
        let number = ControlNumber::new(value)
            .map_err(|_| InvoiceError::ControlOverflow { page })?;

        *self.per_date.entry((date, value)).or_insert(0) += 1;
        self.issued += 1;
        self.next = value + rng.random_range(self.jumps.clone());
        Ok(number)
    }

    fn repeats(&self, date: NaiveDate, value: u32) -> usize {
        self.per_date.get(&(date, value)).copied().unwrap_or(0)
    }
}
