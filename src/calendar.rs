use chrono::{Datelike, Days, NaiveDate, Weekday};

pub trait Weekdays {
    fn is_weekday(&self) -> bool;

    /// The same date if it is a weekday, otherwise the following Monday.
    fn on_or_after_weekday(&self) -> Option<Self>
    where
        Self: Sized;

    /// Adds `days` calendar days, then moves forward off a weekend.
    fn add_days_to_weekday(&self, days: u64) -> Option<Self>
    where
        Self: Sized;

    /// Days since the 1900 epoch as Excel stores them.
    fn excel_serial(&self) -> f64;
}

impl Weekdays for NaiveDate {
    fn is_weekday(&self) -> bool {
        !matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    fn on_or_after_weekday(&self) -> Option<Self> {
        let skip = match self.weekday() {
            Weekday::Sat => 2,
            Weekday::Sun => 1,
            _ => 0,
        };
        self.checked_add_days(Days::new(skip))
    }

    fn add_days_to_weekday(&self, days: u64) -> Option<Self> {
        self.checked_add_days(Days::new(days))
            .and_then(|d| d.on_or_after_weekday())
    }

    fn excel_serial(&self) -> f64 {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
            .expect("1899-12-30 is a valid date");
        (*self - epoch).num_days() as f64
    }
}

/// Every weekday from `from` through `until`, inclusive.
pub fn weekdays_between(from: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| d <= &until)
        .filter(|d| d.is_weekday())
        .collect()
}
