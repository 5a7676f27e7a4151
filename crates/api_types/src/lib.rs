//! Wire types of the ledger worker.
//!
//! Requests arrive as an [`envelope::Request`] whose `payload` is decoded
//! into one of the payload structs below, depending on `type`. Payload
//! fields are optional and loosely typed, as sent by the clients; the
//! worker decides what a missing field means.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A loosely typed payload value: clients send numbers, numeric strings or
/// booleans for the same field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Textual form, as parsed by the validators.
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Flag(flag) => flag.to_string(),
            Scalar::Number(number) => number.to_string(),
            Scalar::Text(text) => text.clone(),
        }
    }

    /// Empty text, zero and `false` count as "not provided".
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Flag(flag) => !flag,
            Scalar::Number(number) => *number == 0.0 || number.is_nan(),
            Scalar::Text(text) => text.is_empty(),
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Scalar::Flag(flag) => Some(*flag),
            Scalar::Number(number) => Some(*number != 0.0),
            Scalar::Text(text) => match text.trim() {
                "true" | "1" => Some(true),
                "false" | "0" | "" => Some(false),
                _ => None,
            },
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

pub mod envelope {
    use std::collections::BTreeMap;

    use super::*;

    /// Incoming message: an operation name and its payload.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Request {
        #[serde(rename = "type")]
        pub kind: String,
        #[serde(default)]
        pub payload: serde_json::Value,
    }

    /// Outgoing message. `status` follows HTTP codes.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Response {
        #[serde(rename = "type")]
        pub kind: String,
        pub status: u16,
        pub payload: serde_json::Value,
    }

    /// Payload of every failed response.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ErrorPayload {
        pub message: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        pub errors: BTreeMap<String, String>,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct WalletAdd {
        pub user_id: Option<String>,
        pub name: Option<String>,
        /// Initial balance.
        pub money: Option<Scalar>,
        pub icon_id: Option<Scalar>,
        pub currency: Option<String>,
        pub parent_id: Option<String>,
    }

    /// Payload of delete-Wallet and get-Wallet.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct WalletRef {
        pub user_id: Option<String>,
        #[serde(rename = "_id")]
        pub id: Option<String>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct WalletEdit {
        pub user_id: Option<String>,
        #[serde(rename = "_id")]
        pub id: Option<String>,
        pub name: Option<String>,
        pub currency: Option<String>,
        pub icon_id: Option<Scalar>,
    }

    /// Payload of get-Wallets; the user id travels as `_id`.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct WalletsGet {
        pub user_id: Option<String>,
        #[serde(rename = "_id")]
        pub id: Option<String>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct WalletTransfer {
        pub user_id: Option<String>,
        pub from_id: Option<String>,
        pub to_id: Option<String>,
        pub amount: Option<Scalar>,
        pub concept: Option<String>,
        #[serde(rename = "transactionDate")]
        pub transaction_date: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct WalletView {
        #[serde(rename = "_id")]
        pub id: Uuid,
        pub user_id: String,
        pub name: String,
        pub money: f64,
        pub currency: String,
        pub icon_id: i32,
        /// `"-1"` for top-level wallets.
        pub parent_id: String,
        pub child_id: Vec<Uuid>,
        /// Sub-wallets, only loaded by get-Wallets.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub children: Vec<WalletView>,
        #[serde(rename = "createdAt")]
        pub created_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct WalletsView {
        pub wallets: Vec<WalletView>,
    }
}

pub mod transaction {
    use super::*;

    /// Reference to a category, `{ "_id": ... }`.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CategoryRef {
        #[serde(rename = "_id")]
        pub id: Option<String>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TransactionAdd {
        pub user_id: Option<String>,
        pub wallet_id: Option<String>,
        pub concept: Option<String>,
        pub amount: Option<Scalar>,
        #[serde(rename = "transactionDate")]
        pub transaction_date: Option<String>,
        pub category: Option<CategoryRef>,
        #[serde(rename = "excludeFromReport")]
        pub exclude_from_report: Option<Scalar>,
    }

    /// Payload of delete-Transaction and get-Transaction.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TransactionRef {
        pub user_id: Option<String>,
        #[serde(rename = "_id")]
        pub id: Option<String>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TransactionEdit {
        pub user_id: Option<String>,
        #[serde(rename = "_id")]
        pub id: Option<String>,
        pub wallet_id: Option<String>,
        pub concept: Option<String>,
        pub category: Option<CategoryRef>,
        pub amount: Option<Scalar>,
        #[serde(rename = "transactionDate")]
        pub transaction_date: Option<String>,
        #[serde(rename = "excludeFromReport")]
        pub exclude_from_report: Option<Scalar>,
    }

    /// Payload of get-Transactions. `_id` is a wallet id or `"-1"` for every
    /// wallet; `datamonth` is `YYYYMM`.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TransactionsGet {
        pub user_id: Option<String>,
        #[serde(rename = "_id")]
        pub id: Option<String>,
        pub datamonth: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryView {
        #[serde(rename = "_id")]
        pub id: Uuid,
        pub user_id: String,
        pub parent_id: String,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionView {
        #[serde(rename = "_id")]
        pub id: Uuid,
        pub user_id: String,
        pub wallet_id: Uuid,
        pub category: CategoryView,
        pub concept: String,
        pub amount: f64,
        #[serde(rename = "excludeFromReport")]
        pub exclude_from_report: bool,
        #[serde(rename = "transactionDate")]
        pub transaction_date: NaiveDate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub transfer_id: Option<Uuid>,
        #[serde(rename = "createdAt")]
        pub created_at: DateTime<Utc>,
    }

    /// Pre and post images of an edit.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionChangesView {
        pub old: Vec<TransactionView>,
        pub new: Vec<TransactionView>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_accepts_numbers_strings_and_flags() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[12.5, "12.5", true]"#).unwrap();
        assert_eq!(values[0], Scalar::Number(12.5));
        assert_eq!(values[1], Scalar::Text("12.5".to_string()));
        assert_eq!(values[2], Scalar::Flag(true));
        assert_eq!(values[0].as_text(), "12.5");
        assert_eq!(Scalar::Number(20.0).as_text(), "20");
    }

    #[test]
    fn blank_scalars() {
        assert!(Scalar::Number(0.0).is_blank());
        assert!(Scalar::Text(String::new()).is_blank());
        assert!(!Scalar::Text("0".to_string()).is_blank());
        assert!(!Scalar::Number(3.0).is_blank());
    }

    #[test]
    fn payload_fields_are_optional() {
        let edit: transaction::TransactionEdit =
            serde_json::from_str(r#"{"_id": "abc", "category": {"_id": "c"}}"#).unwrap();
        assert_eq!(edit.id.as_deref(), Some("abc"));
        assert_eq!(edit.category.and_then(|c| c.id).as_deref(), Some("c"));
        assert!(edit.amount.is_none());
    }
}
