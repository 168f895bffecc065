use chrono::NaiveDate;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::index;
use rand::Rng;

use crate::calendar::{weekdays_between, Weekdays};
use crate::error::InvoiceError;

pub const EXPIRATION_DAYS: u64 = 30;
pub const MAX_DATE_REPEATS: usize = 3;

/// Inclusive range of invoice dates, both ends on weekdays.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DateRange {
    pub from: NaiveDate,
    pub until: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, until: NaiveDate) -> Result<Self, InvoiceError> {
        for date in [from, until] {
            if !date.is_weekday() {
                return Err(InvoiceError::NotWeekday { date });
            }
        }
        if until < from {
            return Err(InvoiceError::DateRangeReversed { from, until });
        }
        Ok(Self { from, until })
    }

    pub fn weekdays(&self) -> Vec<NaiveDate> {
        weekdays_between(self.from, self.until)
    }
}

pub fn expiration(date: NaiveDate) -> Result<NaiveDate, InvoiceError> {
    date.add_days_to_weekday(EXPIRATION_DAYS)
        .ok_or(InvoiceError::DateOutOfRange { date })
}

/// One invoice date per page, non-decreasing, weekdays only.
///
/// With no more pages than weekdays the dates are a random increasing subset.
/// Otherwise every weekday is used once and the remaining pages repeat dates
/// drawn with weights peaking mid-range, never more than `MAX_DATE_REPEATS`
/// times each.
pub fn invoice_dates<R: Rng + ?Sized>(
    range: &DateRange,
    pages: usize,
    rng: &mut R,
) -> Result<Vec<NaiveDate>, InvoiceError> {
    let weekdays = range.weekdays();
    let available = weekdays.len();

    if pages > available * MAX_DATE_REPEATS {
        return Err(InvoiceError::NotEnoughWeekdays {
            pages,
            weekdays: available,
            max_repeats: MAX_DATE_REPEATS,
        });
    }

    if pages <= available {
        let mut chosen = index::sample(&mut *rng, available, pages).into_vec();
        chosen.sort_unstable();
        return Ok(chosen.into_iter().map(|i| weekdays[i]).collect());
    }

    let mut repeats = vec![1; available];
    let weights = bell_weights(available);
    for _ in available..pages {
        let eligible = weights.iter().zip(repeats.iter()).map(|(w, r)| {
            if *r < MAX_DATE_REPEATS {
                *w
            } else {
                0.0
            }
        });
        let pick = WeightedIndex::new(eligible).map_err(|_| {
            InvoiceError::NotEnoughWeekdays {
                pages,
                weekdays: available,
                max_repeats: MAX_DATE_REPEATS,
            }
        })?;
        repeats[pick.sample(&mut *rng)] += 1;
    }

    Ok(weekdays
        .into_iter()
        .zip(repeats)
        .flat_map(|(date, count)| std::iter::repeat(date).take(count))
        .collect())
}

fn bell_weights(count: usize) -> Vec<f64> {
    let mid = (count as f64 - 1.0) / 2.0;
    let sigma = (count as f64 / 4.0).max(1.0);
    (0..count)
        .map(|i| {
            let x = (i as f64 - mid) / sigma;
            (-0.5 * x * x).exp().max(1e-6)
        })
        .collect()
}
