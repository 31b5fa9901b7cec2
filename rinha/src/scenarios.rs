//! Scenario bodies and the table the scheduler resolves them from.
use crate::payload::{pick_client_id, random_transaction};
use crate::validator::{
    statement_balance_is_zero, statement_limit_matches, statement_within_limit, status_matches,
    transaction_order_correct, transaction_within_limit,
};
use crate::{Error, Worker};
use rinha_core::{
    ExpectedEntry, Statement, TransactionKind, TransactionRequest, TransactionResponse,
    REJECTION_STATUSES, VALIDATION_PAUSE,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type ScenarioFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send>>;

/// One iteration of a scenario. An `Err` ends the iteration early.
pub type ScenarioBody = Arc<dyn Fn(Worker) -> ScenarioFuture + Send + Sync>;

pub const VALIDATION: &str = "validacoes";
pub const CLIENT_NOT_FOUND: &str = "cliente_nao_encontrado";
pub const DEBITS: &str = "debitos";
pub const CREDITS: &str = "creditos";
pub const STATEMENTS: &str = "extratos";

/// Name to body mapping. [`ScenarioRegistry::default`] holds the five ledger scenarios.
#[derive(Clone)]
pub struct ScenarioRegistry {
    bodies: BTreeMap<String, ScenarioBody>,
}

impl Default for ScenarioRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(VALIDATION, validation)
            .register(CLIENT_NOT_FOUND, client_not_found)
            .register(DEBITS, debit)
            .register(CREDITS, credit)
            .register(STATEMENTS, statement);
        registry
    }
}

impl ScenarioRegistry {
    pub fn empty() -> Self {
        Self {
            bodies: BTreeMap::new(),
        }
    }

    pub fn register<T, F>(&mut self, name: &str, body: T) -> &mut Self
    where
        T: Fn(Worker) -> F + Send + Sync + 'static,
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let boxed: ScenarioBody =
            Arc::new(move |worker: Worker| -> ScenarioFuture { Box::pin(body(worker)) });
        self.bodies.insert(name.to_string(), boxed);
        self
    }

    pub fn get(&self, name: &str) -> Result<ScenarioBody, Error> {
        self.bodies
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownScenario(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bodies.keys().map(String::as_str)
    }
}

/// One random debit. The ledger may refuse it with 422 when it would break the limit.
pub async fn debit(worker: Worker) -> Result<(), Error> {
    let (client_id, request) = {
        let mut rng = rand::thread_rng();
        (
            pick_client_id(&mut rng, worker.clients()),
            random_transaction(&mut rng, TransactionKind::Debit),
        )
    };

    let res = worker.transaction(client_id, &request).await?;
    worker.check("status is 200 or 422", status_matches(res.status, &[200, 422]));
    if res.status == 200 {
        let body = res.json::<TransactionResponse>();
        worker.check("balance within limit", transaction_within_limit(body.as_ref()));
    }

    Ok(())
}

pub async fn credit(worker: Worker) -> Result<(), Error> {
    let (client_id, request) = {
        let mut rng = rand::thread_rng();
        (
            pick_client_id(&mut rng, worker.clients()),
            random_transaction(&mut rng, TransactionKind::Credit),
        )
    };

    let res = worker.transaction(client_id, &request).await?;
    worker.check("status is 200", res.status == 200);
    if res.status == 200 {
        let body = res.json::<TransactionResponse>();
        worker.check("balance within limit", transaction_within_limit(body.as_ref()));
    }

    Ok(())
}

pub async fn statement(worker: Worker) -> Result<(), Error> {
    let client_id = pick_client_id(&mut rand::thread_rng(), worker.clients());

    let res = worker.statement(client_id).await?;
    worker.check("status is 200", res.status == 200);
    if res.status == 200 {
        let body = res.json::<Statement>();
        worker.check("statement within limit", statement_within_limit(body.as_ref()));
    }

    Ok(())
}

pub async fn client_not_found(worker: Worker) -> Result<(), Error> {
    let res = worker.statement(worker.unknown_client_id()).await?;
    worker.check("status is 404", res.status == 404);
    Ok(())
}

/// Scripted read-write-read against the worker's own client, followed by
/// malformed writes which must all be rejected.
pub async fn validation(worker: Worker) -> Result<(), Error> {
    let Some(client) = worker.assigned_client().copied() else {
        worker.check("client assigned", false);
        return Ok(());
    };

    let res = worker.statement(client.id).await?;
    let body = res.json::<Statement>();
    worker.check("status is 200", res.status == 200);
    worker.check("limit matches seed", statement_limit_matches(body.as_ref(), &client));
    worker.check("initial balance is 0", statement_balance_is_zero(body.as_ref()));

    let toma = TransactionRequest::credit(1, "toma");
    let devolve = TransactionRequest::debit(1, "devolve");

    for request in [&toma, &devolve] {
        let res = worker.transaction(client.id, request).await?;
        let body = res.json::<TransactionResponse>();
        worker.check("status is 200", res.status == 200);
        worker.check("balance within limit", transaction_within_limit(body.as_ref()));
    }

    tokio::time::sleep(VALIDATION_PAUSE).await;

    let res = worker.statement(client.id).await?;
    let body = res.json::<Statement>();
    let expected = [ExpectedEntry::from(&toma), ExpectedEntry::from(&devolve)];
    worker.check(
        "recent transactions in order",
        transaction_order_correct(body.as_ref(), &expected),
    );

    for (label, payload) in invalid_payloads() {
        let res = worker.transaction(client.id, &payload).await?;
        worker.check(
            &format!("rejects {label}"),
            status_matches(res.status, &REJECTION_STATUSES),
        );
    }

    Ok(())
}

/// Transaction bodies the ledger must refuse with a client error.
pub fn invalid_payloads() -> [(&'static str, Value); 5] {
    [
        (
            "fractional value",
            json!({"valor": 1.2, "tipo": "d", "descricao": "devolve"}),
        ),
        (
            "unknown kind",
            json!({"valor": 1, "tipo": "x", "descricao": "devolve"}),
        ),
        (
            "long description",
            json!({"valor": 1, "tipo": "c", "descricao": "123456789 e mais"}),
        ),
        (
            "empty description",
            json!({"valor": 1, "tipo": "c", "descricao": ""}),
        ),
        (
            "null description",
            json!({"valor": 1, "tipo": "c", "descricao": null}),
        ),
    ]
}
