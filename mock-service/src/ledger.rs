use rinha_core::{ClientSeed, DESCRIPTION_LEN};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;

const STATEMENT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    NotFound,
    Unprocessable,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Balance {
    #[serde(rename = "limite")]
    pub limit: i64,
    #[serde(rename = "saldo")]
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    #[serde(rename = "valor")]
    pub value: i64,
    #[serde(rename = "tipo")]
    pub kind: &'static str,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "realizada_em")]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementTotal {
    pub total: i64,
    #[serde(rename = "data_extrato")]
    pub timestamp: String,
    #[serde(rename = "limite")]
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementView {
    #[serde(rename = "saldo")]
    pub balance: StatementTotal,
    #[serde(rename = "ultimas_transacoes")]
    pub recent: Vec<Entry>,
}

#[derive(Debug)]
struct Account {
    limit: i64,
    balance: i64,
    /// Most recent first.
    recent: VecDeque<Entry>,
}

/// In-memory accounts keyed by client id.
#[derive(Debug)]
pub struct Ledger {
    accounts: HashMap<i64, Account>,
    ignore_limit: bool,
}

impl Ledger {
    pub fn new(clients: &[ClientSeed], ignore_limit: bool) -> Self {
        let accounts = clients
            .iter()
            .map(|client| {
                (
                    client.id,
                    Account {
                        limit: client.limit,
                        balance: 0,
                        recent: VecDeque::with_capacity(STATEMENT_LEN),
                    },
                )
            })
            .collect();

        Self {
            accounts,
            ignore_limit,
        }
    }

    /// Apply a raw transaction body. Anything malformed is `Unprocessable`.
    pub fn transact(&mut self, id: i64, body: &Value) -> Result<Balance, LedgerError> {
        let account = self.accounts.get_mut(&id).ok_or(LedgerError::NotFound)?;

        let value = body
            .get("valor")
            .and_then(Value::as_i64)
            .filter(|v| *v > 0)
            .ok_or(LedgerError::Unprocessable)?;
        let kind = match body.get("tipo").and_then(Value::as_str) {
            Some("c") => "c",
            Some("d") => "d",
            _ => return Err(LedgerError::Unprocessable),
        };
        let description = body
            .get("descricao")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty() && d.chars().count() <= DESCRIPTION_LEN)
            .ok_or(LedgerError::Unprocessable)?;

        let balance = if kind == "c" {
            account.balance.checked_add(value)
        } else {
            account.balance.checked_sub(value)
        }
        .ok_or(LedgerError::Unprocessable)?;

        if balance < -account.limit && !self.ignore_limit {
            return Err(LedgerError::Unprocessable);
        }

        account.balance = balance;
        account.recent.push_front(Entry {
            value,
            kind,
            description: description.to_string(),
            timestamp: now(),
        });
        account.recent.truncate(STATEMENT_LEN);

        Ok(Balance {
            limit: account.limit,
            balance,
        })
    }

    pub fn statement(&self, id: i64) -> Result<StatementView, LedgerError> {
        let account = self.accounts.get(&id).ok_or(LedgerError::NotFound)?;

        Ok(StatementView {
            balance: StatementTotal {
                total: account.balance,
                timestamp: now(),
                limit: account.limit,
            },
            recent: account.recent.iter().cloned().collect(),
        })
    }
}

fn now() -> String {
    humantime::format_rfc3339_micros(SystemTime::now()).to_string()
}
