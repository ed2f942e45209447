use chrono::{Days, NaiveDate};

/// Days after a class's `end_date` during which submission files can still be downloaded.
pub const DOWNLOAD_GRACE_DAYS: u64 = 30;

/// Date range during which enrollments and activity flags may be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl EditPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends. An inverted range contains nothing.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Whether files of a class ending on `end_date` may still be downloaded on `today`.
pub fn is_date_within_limit(end_date: NaiveDate, today: NaiveDate) -> bool {
    match end_date.checked_add_days(Days::new(DOWNLOAD_GRACE_DAYS)) {
        Some(limit) => today <= limit,
        None => true,
    }
}
