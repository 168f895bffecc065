use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvoiceError;

/// An A1 style cell reference, 1-based.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    pub fn offset(&self, cols: u32, rows: u32) -> Self {
        Self::new(self.col + cols, self.row + rows)
    }

    /// `(col, row)` as umya-spreadsheet addresses cells.
    pub fn coordinate(&self) -> (u32, u32) {
        (self.col, self.row)
    }
}

impl FromStr for CellRef {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cell = s.trim().to_uppercase();
        let invalid = || InvoiceError::InvalidCell { cell: s.to_string() };

        let split = cell
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = cell.split_at(split);

        if letters.is_empty()
            || !letters.chars().all(|c| c.is_ascii_uppercase())
            || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let col = letters.bytes().try_fold(0u32, |acc, b| {
            acc.checked_mul(26)?.checked_add(u32::from(b - b'A') + 1)
        });
        let row = digits.parse::<u32>().ok().filter(|r| *r > 0);

        match (col, row) {
            (Some(col), Some(row)) => Ok(Self::new(col, row)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for CellRef {
    type Error = InvoiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellRef> for String {
    fn from(cell: CellRef) -> Self {
        cell.to_string()
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.col;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(char::from(b'A' + rem as u8));
            n = (n - 1) / 26;
        }
        for c in letters.iter().rev() {
            write!(f, "{}", c)?;
        }
        write!(f, "{}", self.row)
    }
}

/// Where each page field lives in the template.
///
/// Item columns are offsets from `item_start`'s column. Each item takes
/// `item_row_step` rows; the part number label goes one row below the
/// description.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct TemplateLayout {
    pub sheet_index: usize,
    pub invoice_number: CellRef,
    pub control_number: CellRef,
    pub invoice_date: CellRef,
    pub expiration_row_offset: u32,
    pub item_start: CellRef,
    pub items_per_page: usize,
    pub item_row_step: u32,
    pub quantity_offset: u32,
    pub unit_price_offset: u32,
    pub total_offset: u32,
    pub part_number_label: String,
    pub page_row_stride: u32,
    pub control_format: String,
    pub date_format: String,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            sheet_index: 0,
            invoice_number: CellRef::new(5, 10),
            control_number: CellRef::new(11, 6),
            invoice_date: CellRef::new(11, 12),
            expiration_row_offset: 1,
            item_start: CellRef::new(2, 19),
            items_per_page: 9,
            item_row_step: 2,
            quantity_offset: 6,
            unit_price_offset: 7,
            total_offset: 9,
            part_number_label: "NUMERO DE PARTE: ".to_string(),
            page_row_stride: 49,
            control_format: "000000".to_string(),
            date_format: "dd/mm/yyyy".to_string(),
        }
    }
}

impl TemplateLayout {
    pub fn expiration_date(&self) -> CellRef {
        self.invoice_date.offset(0, self.expiration_row_offset)
    }

    /// Row of the description cell for `slot` on a page starting at
    /// `page_offset` rows below the first page.
    pub fn item_row(&self, page_offset: u32, slot: usize) -> u32 {
        self.item_start.row + page_offset + slot as u32 * self.item_row_step
    }

    /// Rows from the topmost filled cell to the last part number label.
    pub fn page_rows(&self) -> u64 {
        let top = [
            self.invoice_number.row,
            self.control_number.row,
            self.invoice_date.row,
            self.item_start.row,
        ]
        .into_iter()
        .min()
        .unwrap_or(self.item_start.row);

        let last_slot = self.items_per_page.saturating_sub(1) as u64;
        let last_label = u64::from(self.item_start.row)
            + last_slot * u64::from(self.item_row_step)
            + 1;
        let bottom = last_label.max(u64::from(self.expiration_date().row));

        bottom - u64::from(top) + 1
    }

    /// Stacked pages must not share rows.
    pub fn validate(&self) -> Result<(), InvoiceError> {
        if self.items_per_page == 0 {
            return Err(InvoiceError::EmptyPageLayout);
        }
        if self.page_row_stride == 0 {
            return Err(InvoiceError::EmptyPageStride);
        }
        let rows = self.page_rows();
        if rows > u64::from(self.page_row_stride) {
            return Err(InvoiceError::PageOverlap {
                stride: self.page_row_stride,
                rows,
            });
        }
        Ok(())
    }
}
