use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Three-letter currency code of a wallet.
///
/// The engine does not convert between currencies: the code only has to
/// match between a sub-wallet and its parent. Codes are kept in uppercase,
/// so `" usd "` and `"USD"` are the same currency.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Canonical form of a raw code: trimmed and uppercased.
    ///
    /// The result is not guaranteed to be a valid code; see
    /// [`Currency::try_from`].
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = Self::normalize(value);
        if code.chars().count() != 3 {
            return Err(EngineError::InvalidCurrency(format!("code {code}")));
        }
        Ok(Self(code))
    }
}

impl TryFrom<String> for Currency {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_uppercased() {
        let currency = Currency::try_from(" mxn ").unwrap();
        assert_eq!(currency.code(), "MXN");
        assert_eq!(currency, Currency::try_from("MXN").unwrap());
    }

    #[test]
    fn rejects_codes_that_are_not_three_letters() {
        assert_eq!(
            Currency::try_from("EURO"),
            Err(EngineError::InvalidCurrency("code EURO".to_string()))
        );
        assert!(Currency::try_from("").is_err());
    }
}
