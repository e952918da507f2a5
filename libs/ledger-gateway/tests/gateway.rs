use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use event_contract::EventStore;
use ledger_api::wire::{InvokeRequest, QueryResponse, SubmitResponse};
use ledger_api::{Args, ErrorKind, LedgerError, TxStatus};
use ledger_client::LedgerClient;
use ledger_gateway::{AppState, router};
use ledger_memory::{MemoryLedger, MemoryLedgerConfig};
use transport_http::HttpTransport;

fn network() -> (Arc<MemoryLedger>, AppState) {
    let ledger = Arc::new(MemoryLedger::start(MemoryLedgerConfig {
        commit_delay_ms: 5,
        event_buffer: 64,
        ..MemoryLedgerConfig::default()
    }));
    ledger.deploy("events", Arc::new(EventStore::new()));
    let state = AppState::new(ledger.clone(), ledger.clone());
    (ledger, state)
}

fn post(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn invoke(function: &str, args: &[&str]) -> Vec<u8> {
    serde_json::to_vec(&InvokeRequest::new("events", function, &Args::from_strs(args))).unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn submit_returns_tx_id_and_status_goes_committed() {
    let (ledger, state) = network();
    let app = router(state);

    let response = app
        .clone()
        .oneshot(post("/api/v1/transactions", invoke("LogEvent", &["faucet", "1234", "6d61"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let submitted: SubmitResponse = json_body(response).await;

    for _ in 0..100 {
        if ledger.status(&submitted.tx_id).unwrap() != TxStatus::Pending {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let request = Request::builder()
        .uri(format!("/api/v1/transactions/{}", submitted.tx_id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status: TxStatus = json_body(response).await;
    assert_eq!(status, TxStatus::Committed { block: 1 });
}

#[tokio::test]
async fn query_payload_is_base64_of_contract_output() {
    let (_ledger, state) = network();
    let response = router(state)
        .oneshot(post("/api/v1/queries", invoke("QueryAllByDateRange", &["", ""])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let resp: QueryResponse = json_body(response).await;
    assert_eq!(resp.decode().unwrap(), b"[]");
}

#[tokio::test]
async fn contract_errors_map_to_status_and_json_body() {
    let (_ledger, state) = network();
    let response = router(state)
        .oneshot(post("/api/v1/queries", invoke("QueryEvent", &["faucet", "41"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: LedgerError = json_body(response).await;
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn malformed_body_is_invalid_argument() {
    let (_ledger, state) = network();
    let response = router(state)
        .oneshot(post("/api/v1/transactions", b"{\"contract\":".to_vec()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: LedgerError = json_body(response).await;
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn unknown_transaction_is_404() {
    let (_ledger, state) = network();
    let request = Request::builder()
        .uri("/api/v1/transactions/deadbeef")
        .body(Body::empty())
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn client_round_trip_over_http() {
    let (_ledger, state) = network();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(ledger_gateway::serve(listener, state, shutdown.clone()));

    let transport = HttpTransport::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    let client = LedgerClient::new(Arc::new(transport), "events")
        .with_poll_interval(Duration::from_millis(5))
        .with_commit_timeout(Duration::from_secs(2));

    for (device, ts) in [("faucet", "1234"), ("faucet", "40"), ("fauci", "1234")] {
        client.log_event_and_wait(device, ts, "6d61697961686565").await.unwrap();
    }

    let device = client.query_device_records("41", "2000", "fauci").await.unwrap();
    assert_eq!(device.len(), 1);
    assert_eq!(client.query_all_records("41", "2000").await.unwrap().len(), 2);

    let record = client.query_event_record("faucet", "40").await.unwrap();
    assert_eq!(record.payload().unwrap(), b"maiyahee");

    let err = client.log_event("faucet", "1", "xyz").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
    let err = client.query_event("nobody", "1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    shutdown.cancel();
    server.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ws_streams_committed_events() {
    use futures_util::StreamExt;
    use ledger_api::wire::EventMessage;

    let (ledger, state) = network();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(ledger_gateway::serve(listener, state, shutdown.clone()));

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/events?name=logEvent"))
        .await
        .unwrap();
    // The subscription is taken after the upgrade completes server-side.
    tokio::time::sleep(Duration::from_millis(50)).await;

    ledger
        .submit("events", "LogEvent", &Args::from_strs(&["faucet", "1234", "6d61"]))
        .unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frame: EventMessage = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    let EventMessage::Event { name, block, payload, .. } = frame;
    assert_eq!(name, "logEvent");
    assert_eq!(block, 1);
    assert_eq!(payload, "6d61");

    drop(ws);
    shutdown.cancel();
    server.await.unwrap().unwrap();
}
