//! Wire models of the target ledger API.
//!
//! Response models keep every field optional so that a missing field is an
//! explicit `None` rather than a deserialization failure. A field with the
//! wrong JSON type still fails the whole document, which callers treat as
//! an absent body.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "c")]
    Credit,
    #[serde(rename = "d")]
    Debit,
}

impl TransactionKind {
    pub fn code(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "c",
            TransactionKind::Debit => "d",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Body of `POST /clientes/{id}/transacoes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    #[serde(rename = "valor")]
    pub value: i64,
    #[serde(rename = "tipo")]
    pub kind: TransactionKind,
    #[serde(rename = "descricao")]
    pub description: String,
}

impl TransactionRequest {
    pub fn credit(value: i64, description: &str) -> Self {
        Self {
            value,
            kind: TransactionKind::Credit,
            description: description.to_string(),
        }
    }

    pub fn debit(value: i64, description: &str) -> Self {
        Self {
            value,
            kind: TransactionKind::Debit,
            description: description.to_string(),
        }
    }
}

/// Successful reply to a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionResponse {
    #[serde(rename = "saldo")]
    pub balance: Option<i64>,
    #[serde(rename = "limite")]
    pub limit: Option<i64>,
}

/// Reply to `GET /clientes/{id}/extrato`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Statement {
    #[serde(rename = "saldo")]
    pub balance: Option<StatementBalance>,
    #[serde(rename = "ultimas_transacoes")]
    pub recent_transactions: Option<Vec<StatementEntry>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StatementBalance {
    pub total: Option<i64>,
    #[serde(rename = "limite")]
    pub limit: Option<i64>,
    #[serde(rename = "data_extrato")]
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StatementEntry {
    #[serde(rename = "valor")]
    pub value: Option<i64>,
    /// Kept as the raw code so unexpected kinds surface as a mismatch instead of a parse error.
    #[serde(rename = "tipo")]
    pub kind: Option<String>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "realizada_em")]
    pub timestamp: Option<String>,
}

/// A transaction the harness expects to find in a statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedEntry {
    pub kind: TransactionKind,
    pub description: String,
}

impl ExpectedEntry {
    pub fn new(kind: TransactionKind, description: &str) -> Self {
        Self {
            kind,
            description: description.to_string(),
        }
    }
}

impl From<&TransactionRequest> for ExpectedEntry {
    fn from(req: &TransactionRequest) -> Self {
        Self::new(req.kind, &req.description)
    }
}
