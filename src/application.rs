//! Loan application models and payload coercion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Required keys of a submission payload, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 4] = ["email", "amount", "term_months", "monthly_payment"];

/// Annual rate used when the submission does not carry one.
pub const DEFAULT_INTEREST_RATE: f64 = 12.5;

static NULL: Value = Value::Null;

/// Application status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Persisted loan application row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoanApplication {
    pub id: i64,
    pub email: String,
    pub amount: i64,
    pub term_months: i64,
    pub monthly_payment: i64,
    pub interest_rate: f64,
    pub purpose: Option<String>,
    pub income: Option<String>,
    pub additional_info: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// A validated, strongly typed submission ready to be inserted.
///
/// Built from the untyped JSON payload by [`NewLoanApplication::from_payload`];
/// the status is not part of it because every new row starts as `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoanApplication {
    pub email: String,
    pub amount: i64,
    pub term_months: i64,
    pub monthly_payment: i64,
    pub interest_rate: f64,
    pub purpose: Option<String>,
    pub income: Option<String>,
    pub additional_info: Option<String>,
}

/// Failure to turn an untyped payload value into its column type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("invalid integer value for {field}: {value}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("invalid number value for {field}: {value}")]
    NotANumber { field: &'static str, value: String },

    #[error("invalid text value for {field}: {value}")]
    NotText { field: &'static str, value: String },
}

impl NewLoanApplication {
    /// Coerce a presence-checked payload into typed fields.
    ///
    /// Required keys missing here are treated like `null`, so callers are
    /// expected to run [`first_missing_field`] first.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, CoercionError> {
        let field = |name: &str| payload.get(name).unwrap_or(&NULL);

        let interest_rate = match payload.get("interest_rate") {
            Some(value) => coerce_float("interest_rate", value)?,
            None => DEFAULT_INTEREST_RATE,
        };

        Ok(Self {
            email: coerce_text("email", field("email"))?,
            amount: coerce_integer("amount", field("amount"))?,
            term_months: coerce_integer("term_months", field("term_months"))?,
            monthly_payment: coerce_integer("monthly_payment", field("monthly_payment"))?,
            interest_rate,
            purpose: optional_text(field("purpose")),
            income: optional_text(field("income")),
            additional_info: optional_text(field("additional_info")),
        })
    }
}

/// Name of the first required key absent from the payload.
///
/// Only presence is checked: a key holding `null` or an empty string counts.
/// A payload that is not a JSON object has no keys at all.
pub fn first_missing_field(payload: &Value) -> Option<&'static str> {
    let object = payload.as_object();
    REQUIRED_FIELDS
        .iter()
        .copied()
        .find(|name| !object.is_some_and(|map| map.contains_key(*name)))
}

fn coerce_integer(field: &'static str, value: &Value) -> Result<i64, CoercionError> {
    let invalid = || CoercionError::NotAnInteger {
        field,
        value: value.to_string(),
    };

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            // Floats truncate toward zero; out-of-range and non-finite values fail
            match n.as_f64() {
                Some(f)
                    if f.is_finite()
                        && f.trunc() >= i64::MIN as f64
                        && f.trunc() < i64::MAX as f64 =>
                {
                    Ok(f.trunc() as i64)
                }
                _ => Err(invalid()),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(invalid()),
    }
}

fn coerce_float(field: &'static str, value: &Value) -> Result<f64, CoercionError> {
    let invalid = || CoercionError::NotANumber {
        field,
        value: value.to_string(),
    };

    match value {
        Value::Number(n) => n.as_f64().ok_or_else(invalid),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(invalid),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        _ => Err(invalid()),
    }
}

fn coerce_text(field: &'static str, value: &Value) -> Result<String, CoercionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => Ok(value.to_string()),
        _ => Err(CoercionError::NotText {
            field,
            value: value.to_string(),
        }),
    }
}

fn optional_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
