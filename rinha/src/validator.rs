//! Consistency predicates over ledger responses.
//!
//! Every predicate degrades to `false` on absent or malformed data. None of
//! them can panic.
use rinha_core::{ClientSeed, ExpectedEntry, Statement, TransactionResponse};

/// The ledger's core invariant: `balance >= -limit`.
pub fn balance_within_limit(balance: Option<i64>, limit: Option<i64>) -> bool {
    match (balance, limit.and_then(i64::checked_neg)) {
        (Some(balance), Some(floor)) => balance >= floor,
        _ => false,
    }
}

pub fn transaction_within_limit(response: Option<&TransactionResponse>) -> bool {
    response.is_some_and(|r| balance_within_limit(r.balance, r.limit))
}

pub fn statement_within_limit(statement: Option<&Statement>) -> bool {
    statement
        .and_then(|s| s.balance.as_ref())
        .is_some_and(|b| balance_within_limit(b.total, b.limit))
}

/// Reported limit equals the seeded one.
pub fn statement_limit_matches(statement: Option<&Statement>, client: &ClientSeed) -> bool {
    statement
        .and_then(|s| s.balance.as_ref())
        .is_some_and(|b| b.limit == Some(client.limit))
}

pub fn statement_balance_is_zero(statement: Option<&Statement>) -> bool {
    statement
        .and_then(|s| s.balance.as_ref())
        .is_some_and(|b| b.total == Some(0))
}

/// A client with no prior transactions shows its seeded limit and a zero total.
pub fn statement_matches_seed(statement: Option<&Statement>, client: &ClientSeed) -> bool {
    statement_limit_matches(statement, client) && statement_balance_is_zero(statement)
}

/// `expected` lists transactions in the order they were issued. The
/// statement must open with them most-recent-first, compared on kind and
/// description.
pub fn transaction_order_correct(
    statement: Option<&Statement>,
    expected: &[ExpectedEntry],
) -> bool {
    let Some(entries) = statement.and_then(|s| s.recent_transactions.as_ref()) else {
        return false;
    };

    if entries.len() < expected.len() {
        return false;
    }

    entries
        .iter()
        .zip(expected.iter().rev())
        .all(|(entry, expected)| {
            entry.kind.as_deref() == Some(expected.kind.code())
                && entry.description.as_deref() == Some(expected.description.as_str())
        })
}

pub fn status_matches(actual: u16, expected: &[u16]) -> bool {
    expected.contains(&actual)
}
