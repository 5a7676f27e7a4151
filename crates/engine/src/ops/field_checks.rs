//! Field validators that need to look at stored data.

use uuid::Uuid;

use crate::{
    Category, ResultEngine,
    validation::{Checked, FieldError, FieldErrors, validate_currency_code},
};

use super::Engine;

impl Engine {
    /// Validates a currency code and, for a sub-wallet, that it equals the
    /// parent's currency. The output is the canonical code.
    pub async fn validate_currency(
        &self,
        raw: Option<&str>,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<Checked<String>> {
        if raw.is_none() {
            return Ok(validate_currency_code(raw));
        }
        let (code, mut errors) = validate_currency_code(raw).into_parts();

        if let Some(parent_id) = parent_id {
            let matches = self
                .wallet(parent_id)
                .await?
                .is_some_and(|parent| parent.currency.code() == code);
            if !matches {
                errors.push(FieldError::CurrencyMismatch);
            }
        }
        Ok(Checked::with_errors(code, errors))
    }

    /// Validates a wallet name. The duplicate probe always runs, even for a
    /// blank name. The output is the trimmed name.
    pub async fn validate_wallet_name(
        &self,
        user_id: &str,
        raw: Option<&str>,
    ) -> ResultEngine<Checked<String>> {
        let name = raw.map(str::trim).unwrap_or_default().to_string();
        let mut errors = FieldErrors::new();
        if name.is_empty() {
            errors.push(FieldError::EmptyName);
        }
        if self.wallet_by_name(user_id, &name).await?.is_some() {
            errors.push(FieldError::DuplicateName);
        }
        Ok(Checked::with_errors(name, errors))
    }

    /// Checks that the category exists and is global or owned by `user_id`.
    pub async fn validate_category(
        &self,
        user_id: &str,
        category_id: &str,
    ) -> ResultEngine<Checked<Option<Category>>> {
        let category = match Uuid::parse_str(category_id.trim()) {
            Ok(id) => self.category(id).await?,
            Err(_) => None,
        };
        let error = match &category {
            None => Some(FieldError::CategoryNotFound),
            Some(category) if !category.owner.allows(user_id) => {
                Some(FieldError::CategoryNotOwned)
            }
            Some(_) => None,
        };
        match error {
            Some(error) => Ok(Checked::with_errors(category, error.into())),
            None => Ok(Checked::ok(category)),
        }
    }
}
