//! Internal helpers for model conversion and date ranges.
//!
//! These utilities are **not** part of the public API.

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::InvalidCurrency(format!("stored {value}")))
}

/// `[first day of month, first day of next month)` for a calendar month.
pub(crate) fn month_bounds(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::InvalidId(format!("invalid month {year:04}{month:02}")))?;
    let (next_year, next_month) = if start.month() == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| EngineError::InvalidId(format!("invalid month {year:04}{month:02}")))?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_wrap_the_year() {
        let (start, end) = month_bounds(2021, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2021, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    }

    #[test]
    fn unparseable_stored_currency() {
        assert_eq!(
            model_currency("usd").map(|c| c.code().to_string()),
            Ok("USD".to_string())
        );
        assert_eq!(
            model_currency("dollars").map(|c| c.code().to_string()),
            Err(EngineError::InvalidCurrency("stored dollars".to_string()))
        );
    }

    #[test]
    fn month_bounds_reject_invalid_month() {
        assert!(month_bounds(2021, 13).is_err());
    }
}
