//! Pure field validation.
//!
//! Validators never fail: they return a [`Checked`] value carrying the
//! normalized output together with every [`FieldError`] found, so callers
//! can merge the errors of several fields and answer with all of them at
//! once.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::Money;

/// The record an ownership failure refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Wallet,
    Transaction,
}

impl Resource {
    fn as_str(self) -> &'static str {
        match self {
            Resource::Wallet => "wallet",
            Resource::Transaction => "transaction",
        }
    }
}

/// A single business-rule failure of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Amount is not a number")]
    AmountNotNumber,
    #[error("Amount is too large")]
    AmountTooLarge,
    #[error("The date must be in YYYY-MM-DD format")]
    InvalidDateFormat,
    #[error("Invalid date")]
    InvalidDate,
    #[error("Concept must not be empty")]
    EmptyConcept,
    #[error("Currency must not be empty")]
    EmptyCurrency,
    #[error("Currency must be a 3 letter acronym")]
    BadCurrencyLength,
    #[error("Currency must match its parent")]
    CurrencyMismatch,
    #[error("Currency can't change while the wallet has subwallets")]
    ChildCurrencyMismatch,
    #[error("Wallet name must not be empty")]
    EmptyName,
    #[error("Wallet name already exists")]
    DuplicateName,
    #[error("Category doesn't exist")]
    CategoryNotFound,
    #[error("Category does not belong to the user")]
    CategoryNotOwned,
    #[error("User does not own this {}", .0.as_str())]
    NotOwner(Resource),
    #[error("User does not own parent wallet")]
    ParentNotOwned,
    #[error("Only one generation of subwallets is allowed")]
    DepthExceeded,
    #[error("Cannot transfer to the same wallet")]
    SameWallet,
}

impl FieldError {
    /// Payload key the error is reported under.
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            FieldError::AmountNotNumber | FieldError::AmountTooLarge => "amount",
            FieldError::InvalidDateFormat | FieldError::InvalidDate => "date",
            FieldError::EmptyConcept => "concept",
            FieldError::EmptyCurrency
            | FieldError::BadCurrencyLength
            | FieldError::CurrencyMismatch
            | FieldError::ChildCurrencyMismatch => "currency",
            FieldError::EmptyName | FieldError::DuplicateName => "name",
            FieldError::CategoryNotFound | FieldError::CategoryNotOwned => "category",
            FieldError::NotOwner(resource) => resource.as_str(),
            FieldError::ParentNotOwned | FieldError::DepthExceeded => "parent_id",
            FieldError::SameWallet => "wallet",
        }
    }
}

/// Field errors keyed by payload field.
///
/// At most one error is kept per key; a later error for the same key
/// replaces the earlier one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, FieldError>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` under its own field key.
    pub fn push(&mut self, error: FieldError) {
        self.0.insert(error.field(), error);
    }

    /// Record `error` under an explicit key.
    pub fn insert(&mut self, field: &'static str, error: FieldError) {
        self.0.insert(field, error);
    }

    pub fn merge(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<FieldError> {
        self.0.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FieldError)> + '_ {
        self.0.iter().map(|(field, error)| (*field, *error))
    }

    /// Field to message map as sent back to clients.
    #[must_use]
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(field, error)| (field.to_string(), error.to_string()))
            .collect()
    }
}

impl From<FieldError> for FieldErrors {
    fn from(error: FieldError) -> Self {
        let mut errors = Self::new();
        errors.push(error);
        errors
    }
}

/// Result of a validator or a guard: the produced value plus the errors.
///
/// The value is always present, even when [`Checked::is_valid`] is false,
/// so partially valid input can still be inspected.
#[derive(Clone, Debug, PartialEq)]
pub struct Checked<T> {
    pub errors: FieldErrors,
    pub value: T,
}

impl<T> Checked<T> {
    pub fn ok(value: T) -> Self {
        Self {
            errors: FieldErrors::new(),
            value,
        }
    }

    pub fn with_errors(value: T, errors: FieldErrors) -> Self {
        Self { errors, value }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_parts(self) -> (T, FieldErrors) {
        (self.value, self.errors)
    }
}

/// Parses an amount and rounds it to two decimals, half up.
///
/// The rounded value is returned even when parsing failed, in which case it
/// is `NaN`. A magnitude above [`Money::MAX_AMOUNT`] is `AmountTooLarge`.
#[must_use]
pub fn validate_amount(raw: &str) -> Checked<f64> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite());
    let Some(value) = parsed else {
        return Checked::with_errors(f64::NAN, FieldError::AmountNotNumber.into());
    };
    let rounded = round_cents(value);
    if Money::from_major(rounded).is_none() {
        return Checked::with_errors(rounded, FieldError::AmountTooLarge.into());
    }
    Checked::ok(rounded)
}

fn round_cents(value: f64) -> f64 {
    ((value + f64::EPSILON) * 100.0 + 0.5).floor() / 100.0
}

/// Checks that `raw` is a real `YYYY-MM-DD` calendar date.
#[must_use]
pub fn validate_date(raw: &str) -> Checked<Option<NaiveDate>> {
    let Some((year, month, day)) = split_date(raw) else {
        return Checked::with_errors(None, FieldError::InvalidDateFormat.into());
    };

    let last_day = match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    };
    if day > last_day {
        return Checked::with_errors(None, FieldError::InvalidDate.into());
    }

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => Checked::ok(Some(date)),
        None => Checked::with_errors(None, FieldError::InvalidDate.into()),
    }
}

/// Splits a strict `YYYY-MM-DD` string, with month in `01..=12` and day in
/// `01..=31`.
fn split_date(raw: &str) -> Option<(i32, u32, u32)> {
    let bytes = raw.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = &raw[range];
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    let year = digits(0..4)?;
    let month = digits(5..7)?;
    let day = digits(8..10)?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some((i32::try_from(year).ok()?, month, day))
}

fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// A concept must contain something besides whitespace. The output is
/// trimmed.
#[must_use]
pub fn validate_concept(raw: Option<&str>) -> Checked<String> {
    let concept = raw.map(str::trim).unwrap_or_default().to_string();
    if concept.is_empty() {
        return Checked::with_errors(concept, FieldError::EmptyConcept.into());
    }
    Checked::ok(concept)
}

/// Shape check of a currency code. The output is the trimmed code in
/// uppercase.
///
/// Matching a parent's currency needs storage and lives in the engine's
/// field checks.
#[must_use]
pub fn validate_currency_code(raw: Option<&str>) -> Checked<String> {
    let Some(raw) = raw else {
        return Checked::with_errors(String::new(), FieldError::EmptyCurrency.into());
    };
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Checked::with_errors(code, FieldError::EmptyCurrency.into());
    }
    if code.chars().count() != 3 {
        return Checked::with_errors(code, FieldError::BadCurrencyLength.into());
    }
    Checked::ok(code)
}

/// Icon ids are only stored for the clients; anything that is not a
/// non-negative integer becomes 0.
#[must_use]
pub fn set_icon_id(raw: Option<&str>) -> i32 {
    raw.map(str::trim)
        .and_then(leading_integer)
        .filter(|icon| *icon >= 0)
        .unwrap_or(0)
}

/// Integer prefix of a string (`"12.7"` is 12, `"4px"` is 4).
fn leading_integer(raw: &str) -> Option<i32> {
    let end = raw
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map_or(raw.len(), |(i, _)| i);
    raw[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_is_rounded_half_up() {
        let checked = validate_amount("12.345");
        assert!(checked.is_valid());
        assert_eq!(checked.value, 12.35);

        assert_eq!(validate_amount("1.005").value, 1.01);
        assert_eq!(validate_amount(" 20 ").value, 20.0);
        assert_eq!(validate_amount("-2.5").value, -2.5);
    }

    #[test]
    fn amount_beyond_the_limit() {
        for raw in ["1e300", "-1e300", "1000000000000.01"] {
            let checked = validate_amount(raw);
            assert!(!checked.is_valid(), "{raw} should be rejected");
            assert_eq!(checked.errors.get("amount"), Some(FieldError::AmountTooLarge));
        }
        assert!(validate_amount("1000000000000").is_valid());
        assert!(validate_amount("-999999999999.99").is_valid());
    }

    #[test]
    fn amount_that_is_not_a_number() {
        for raw in ["abc", "", "12abc", "inf", "NaN"] {
            let checked = validate_amount(raw);
            assert!(!checked.is_valid(), "{raw} should be rejected");
            assert!(checked.value.is_nan());
            assert_eq!(checked.errors.get("amount"), Some(FieldError::AmountNotNumber));
        }
    }

    #[test]
    fn real_calendar_dates_are_accepted() {
        for raw in ["2020-02-29", "2000-02-29", "2021-04-30", "2021-12-31", "2021-01-01"] {
            let checked = validate_date(raw);
            assert!(checked.is_valid(), "{raw} should be valid");
            assert!(checked.value.is_some());
        }
    }

    #[test]
    fn impossible_calendar_dates_are_rejected() {
        for raw in ["2021-02-29", "1900-02-29", "2020-02-30", "2021-04-31", "2021-09-31"] {
            let checked = validate_date(raw);
            assert_eq!(checked.errors.get("date"), Some(FieldError::InvalidDate), "{raw}");
            assert_eq!(checked.value, None);
        }
    }

    #[test]
    fn malformed_dates_are_format_errors() {
        for raw in ["2021-13-01", "2021-00-10", "2021-01-32", "21-01-01", "2021/01/01", "2021-1-01", ""] {
            let checked = validate_date(raw);
            assert_eq!(
                checked.errors.get("date"),
                Some(FieldError::InvalidDateFormat),
                "{raw}"
            );
        }
    }

    #[test]
    fn concept_is_trimmed_and_required() {
        assert_eq!(validate_concept(Some("  Rent ")).value, "Rent");
        assert!(!validate_concept(Some("   ")).is_valid());
        assert_eq!(
            validate_concept(None).errors.get("concept"),
            Some(FieldError::EmptyConcept)
        );
    }

    #[test]
    fn currency_code_shape() {
        assert_eq!(validate_currency_code(Some(" mxn ")).value, "MXN");
        assert_eq!(
            validate_currency_code(Some("EURO")).errors.get("currency"),
            Some(FieldError::BadCurrencyLength)
        );
        assert_eq!(
            validate_currency_code(Some("  ")).errors.get("currency"),
            Some(FieldError::EmptyCurrency)
        );
        assert_eq!(
            validate_currency_code(None).errors.get("currency"),
            Some(FieldError::EmptyCurrency)
        );
    }

    #[test]
    fn icon_id_defaults_to_zero() {
        assert_eq!(set_icon_id(Some("7")), 7);
        assert_eq!(set_icon_id(Some("12.9")), 12);
        assert_eq!(set_icon_id(Some("-3")), 0);
        assert_eq!(set_icon_id(Some("abc")), 0);
        assert_eq!(set_icon_id(None), 0);
    }

    #[test]
    fn errors_merge_by_field() {
        let mut errors = FieldErrors::from(FieldError::EmptyName);
        errors.push(FieldError::AmountNotNumber);
        errors.merge(FieldError::DuplicateName.into());

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name"), Some(FieldError::DuplicateName));
        assert_eq!(
            errors.messages().get("amount").map(String::as_str),
            Some("Amount is not a number")
        );
    }

    #[test]
    fn ownership_messages_name_the_resource() {
        assert_eq!(
            FieldError::NotOwner(Resource::Transaction).to_string(),
            "User does not own this transaction"
        );
        assert_eq!(FieldError::NotOwner(Resource::Wallet).field(), "wallet");
    }
}
