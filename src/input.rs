use chrono::{NaiveDate, Weekday};
use inquire::validator::Validation;
use inquire::{
    error::InquireError, Confirm, CustomType, CustomUserError, DateSelect,
    Text,
};

use crate::calendar::Weekdays;
use crate::numbering::MAX_CONTROL;

type InputResult<T> = Result<T, InquireError>;
type Checked = Result<Validation, CustomUserError>;

pub fn invoice_start() -> InputResult<u32> {
    CustomType::<u32>::new("Start invoice number:")
        .with_help_message("e.g. 804")
        .with_error_message("Please enter a positive integer (e.g. 804)")
        .with_validator(|n: &u32| -> Checked {
            Ok(if *n > 0 {
                Validation::Valid
            } else {
                Validation::Invalid("Must be a positive integer".into())
            })
        })
        .prompt()
}

pub fn control_start() -> InputResult<u32> {
    let raw = Text::new("Start control number:")
        .with_help_message("6 digits, leading zeros optional (e.g. 000968)")
        .with_validator(|raw: &str| -> Checked { Ok(validate_control(raw)) })
        .prompt()?;
    parse_control(&raw)
}

fn parse_control(raw: &str) -> InputResult<u32> {
    raw.trim()
        .parse()
        .map_err(|e| InquireError::Custom(Box::new(e)))
}

fn validate_control(raw: &str) -> Validation {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Validation::Invalid("Please enter digits only".into());
    }
    match raw.parse::<u32>() {
        Ok(value) if value <= MAX_CONTROL => Validation::Valid,
        _ => Validation::Invalid(
            "Control number must be between 000000 and 999999".into(),
        ),
    }
}

fn weekday_only(date: NaiveDate) -> Validation {
    if date.is_weekday() {
        Validation::Valid
    } else {
        Validation::Invalid("Please pick a weekday (Mon-Fri)".into())
    }
}

pub fn date_from() -> InputResult<NaiveDate> {
    DateSelect::new("Start date:")
        .with_week_start(Weekday::Mon)
        .with_validator(|d: NaiveDate| -> Checked { Ok(weekday_only(d)) })
        .prompt()
}

pub fn date_until(from: NaiveDate) -> InputResult<NaiveDate> {
    DateSelect::new("End date:")
        .with_default(from)
        .with_min_date(from)
        .with_week_start(Weekday::Mon)
        .with_validator(|d: NaiveDate| -> Checked { Ok(weekday_only(d)) })
        .prompt()
}

pub fn confirm() -> InputResult<bool> {
    Confirm::new("Write invoices").with_default(true).prompt()
}
