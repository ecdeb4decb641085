use crate::error::{DispatchError, Result};
use chrono::{DateTime, Local, NaiveDate};
use secrecy::Secret;

/// Login data for one company database of the remote ledger.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub company_db: String,
    pub user_name: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn new(
        company_db: impl Into<String>,
        user_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            company_db: company_db.into(),
            user_name: user_name.into(),
            password: Secret::new(password.into()),
        }
    }
}

/// An authenticated handle on the remote ledger.
///
/// Acquired through [`LedgerGateway::login`](super::ports::LedgerGateway::login) and
/// passed explicitly to every ledger call. It stops being accepted once logged out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub company_db: String,
    pub user_name: String,
    pub established_at: DateTime<Local>,
}

/// Inclusive date range for a payment search, with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(DispatchError::InvalidDateRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let range = DateRange::new(date(1), date(31)).unwrap();
        assert!(range.contains(date(1)));
        assert!(range.contains(date(31)));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    }

    #[test]
    fn test_single_day_range() {
        assert!(DateRange::new(date(7), date(7)).is_ok());
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let result = DateRange::new(date(10), date(9));
        assert!(matches!(
            result,
            Err(DispatchError::InvalidDateRange { .. })
        ));
    }
}
