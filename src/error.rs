use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InvoiceError {
    #[error("No products found in the input table")]
    NoProducts,

    #[error("{items} products need {pages} pages, at most {max} are allowed")]
    TooManyPages { items: usize, pages: usize, max: usize },

    #[error("Invoice numbers are limited to {max} pages per run")]
    InvoiceLimit { max: usize },

    #[error("Invoice number overflowed after #{last}")]
    InvoiceOverflow { last: u32 },

    #[error("Invoice number must be a positive integer")]
    InvalidInvoiceStart,

    #[error("Control number {value} does not fit in 6 digits")]
    ControlOutOfRange { value: u32 },

    #[error(
        "Control number exceeded 6 digits on page {page}, \
         choose a smaller start number"
    )]
    ControlOverflow { page: usize },

    #[error("{date} is not a weekday")]
    NotWeekday { date: NaiveDate },

    #[error("No valid expiration date after {date}")]
    DateOutOfRange { date: NaiveDate },

    #[error("End date {until} is before start date {from}")]
    DateRangeReversed { from: NaiveDate, until: NaiveDate },

    #[error(
        "Cannot date {pages} pages with at most {max_repeats} per date \
         over {weekdays} weekday(s)"
    )]
    NotEnoughWeekdays {
        pages: usize,
        weekdays: usize,
        max_repeats: usize,
    },

    #[error("Invalid cell reference: '{cell}'")]
    InvalidCell { cell: String },

    #[error("Template layout needs at least one item per page")]
    EmptyPageLayout,

    #[error("Template layout page stride must be at least one row")]
    EmptyPageStride,

    #[error(
        "Page stride of {stride} rows is too small, \
         a page spans {rows} rows"
    )]
    PageOverlap { stride: u32, rows: u64 },

    #[error("Sheet {index} not found in template")]
    MissingSheet { index: usize },

    #[error("Amount {amount} cannot be written to a cell")]
    InvalidAmount { amount: String },

    #[error("Refusing to overwrite existing file: {path}")]
    OutputExists { path: String },
}
