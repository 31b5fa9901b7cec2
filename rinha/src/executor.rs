//! Single HTTP calls against the target ledger.
use crate::Error;
use reqwest::{Client, Method, Url};
use rinha_core::{Endpoint, REQUEST_TIMEOUT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Normalized reply of one request.
///
/// Non-2xx statuses are ordinary responses. Only transport failures produce
/// an [`Error`].
#[derive(Clone, Debug)]
pub struct Response {
    pub endpoint: Endpoint,
    pub status: u16,
    /// `None` when the body was empty or not valid JSON.
    pub body: Option<serde_json::Value>,
    /// Wall-clock milliseconds from dispatch until the body was fully read.
    pub duration: f64,
}

impl Response {
    /// Deserialize the body into a typed model. A missing body or a
    /// mismatching shape both yield `None`.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        let body = self.body.as_ref()?;
        match T::deserialize(body) {
            Ok(value) => Some(value),
            Err(err) => {
                trace!("Unexpected body shape on {}: {err}", self.endpoint);
                None
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Executor {
    client: Client,
    base_url: Url,
}

impl Executor {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let parsed = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", parsed.scheme())));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn statement_url(&self, client_id: i64) -> String {
        self.url(&format!("clientes/{client_id}/extrato"))
    }

    pub fn transactions_url(&self, client_id: i64) -> String {
        self.url(&format!("clientes/{client_id}/transacoes"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// `GET /clientes/{id}/extrato`
    pub async fn statement(&self, client_id: i64) -> Result<Response, Error> {
        let url = self.statement_url(client_id);
        self.execute::<()>(Method::GET, Endpoint::Statement, &url, None)
            .await
    }

    /// `POST /clientes/{id}/transacoes` with any JSON body, including deliberately invalid ones.
    pub async fn transaction<B>(&self, client_id: i64, body: &B) -> Result<Response, Error>
    where
        B: Serialize + ?Sized,
    {
        let url = self.transactions_url(client_id);
        self.execute(Method::POST, Endpoint::Transactions, &url, Some(body))
            .await
    }

    /// Probe the target once before a run. Any HTTP status counts as reachable.
    pub async fn preflight(&self, client_id: i64) -> Result<u16, Error> {
        match self.statement(client_id).await {
            Ok(res) => Ok(res.status),
            Err(Error::Transport(source)) => Err(Error::Unreachable {
                url: self.statement_url(client_id),
                source,
            }),
            Err(err) => Err(err),
        }
    }

    pub async fn execute<B>(
        &self,
        method: Method,
        endpoint: Endpoint,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response, Error>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            // `json` also sets `Content-Type: application/json`.
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let duration = start.elapsed().as_secs_f64() * 1_000.;

        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        trace!("{endpoint} -> {status} in {duration:.2}ms");

        Ok(Response {
            endpoint,
            status,
            body,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_urls() {
        let executor = Executor::new("http://localhost:9999/").unwrap();
        assert_eq!(
            executor.statement_url(1),
            "http://localhost:9999/clientes/1/extrato"
        );
        assert_eq!(
            executor.transactions_url(6),
            "http://localhost:9999/clientes/6/transacoes"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = Executor::new("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidBaseUrl { .. }));

        let err = Executor::new("ftp://localhost").unwrap_err();
        assert!(matches!(err, Error::InvalidBaseUrl { .. }));
    }

    #[test]
    fn typed_body_mismatch_is_none() {
        let response = Response {
            endpoint: Endpoint::Transactions,
            status: 200,
            body: Some(serde_json::json!({"saldo": "abc", "limite": 1})),
            duration: 1.,
        };
        assert_eq!(response.json::<rinha_core::TransactionResponse>(), None);

        let response = Response {
            body: Some(serde_json::json!({"saldo": -1, "limite": 1})),
            ..response
        };
        let parsed = response.json::<rinha_core::TransactionResponse>().unwrap();
        assert_eq!(parsed.balance, Some(-1));
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let executor = Executor::new(&format!("http://127.0.0.1:{port}")).unwrap();
        let err = executor.statement(1).await.unwrap_err();
        assert!(err.is_transport());

        let err = executor.preflight(1).await.unwrap_err();
        assert!(matches!(err, Error::Unreachable { .. }));
    }
}
