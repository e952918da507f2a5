//! [`Transport`] over the gateway's JSON HTTP API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use ledger_api::wire::{InvokeRequest, QueryResponse, SubmitResponse};
use ledger_api::{Args, LedgerError, Submitted, Transport, TxStatus};

/// Gateway HTTP client.
///
/// Network failures and unparseable responses are LedgerCommunication
/// errors. Error responses carry a serialized [`LedgerError`], which is
/// returned as-is so callers see the contract's own error kind.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, LedgerError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LedgerError::communication(format!("POST {url}: {e}")))?;
        decode(resp).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::communication(format!("GET {url}: {e}")))?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, LedgerError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| LedgerError::communication(format!("read response: {e}")))?;

    if status.is_success() {
        return serde_json::from_str(&body)
            .map_err(|e| LedgerError::communication(format!("malformed gateway response: {e}")));
    }
    Err(error_from_body(status.as_u16(), &body))
}

/// Recover the remote error from a non-2xx body, falling back to a
/// communication error when the body is not one.
fn error_from_body(status: u16, body: &str) -> LedgerError {
    match serde_json::from_str::<LedgerError>(body) {
        Ok(err) => err,
        Err(_) => {
            tracing::debug!(status, body, "gateway returned a non-ledger error body");
            LedgerError::communication(format!("gateway HTTP {status}: {body}"))
        }
    }
}

impl Transport for HttpTransport {
    fn submit_transaction(
        &self,
        contract_id: &str,
        function: &str,
        args: Args,
    ) -> Pin<Box<dyn Future<Output = Result<Submitted, LedgerError>> + Send + '_>> {
        let req = InvokeRequest::new(contract_id, function, &args);
        Box::pin(async move {
            let resp: SubmitResponse = self.post("/api/v1/transactions", &req).await?;
            resp.into_submitted()
        })
    }

    fn evaluate_query(
        &self,
        contract_id: &str,
        function: &str,
        args: Args,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, LedgerError>> + Send + '_>> {
        let req = InvokeRequest::new(contract_id, function, &args);
        Box::pin(async move {
            let resp: QueryResponse = self.post("/api/v1/queries", &req).await?;
            resp.decode()
        })
    }

    fn commit_status(
        &self,
        tx_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<TxStatus, LedgerError>> + Send + '_>> {
        let path = format!("/api/v1/transactions/{tx_id}");
        Box::pin(async move { self.get(&path).await })
    }
}
