//! Gateway push tests against an in-process HTTP gateway.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use faultline_aggregator::{ErrorCollector, ErrorExporter, ExportPayload};
use faultline_core::config::PushConfig;
use faultline_core::error::{FaultlineError, TransportError};
use faultline_core::types::{ErrorInstance, Severity};
use faultline_daemon::push::{GatewayPusher, spawn_push_task};

#[derive(Clone, Default)]
struct Gateway {
    received: Arc<Mutex<Vec<(Option<String>, Bytes)>>>,
    status: Arc<Mutex<Option<StatusCode>>>,
}

async fn receive(State(gateway): State<Gateway>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    gateway.received.lock().unwrap().push((content_type, body));
    gateway.status.lock().unwrap().unwrap_or(StatusCode::OK)
}

/// Start a gateway on an ephemeral port and return its base URL.
async fn start_gateway(gateway: Gateway) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/errors", post(receive))
        .with_state(gateway);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn collector_with_error() -> Arc<ErrorCollector> {
    let collector = Arc::new(
        ErrorCollector::builder()
            .stack_trace_provider(Vec::new)
            .build()
            .unwrap(),
    );
    collector.report_instance(
        ErrorInstance::new("testingError", "boom", vec![]),
        None,
        Severity::Error,
    );
    collector
}

fn push_config(gateway_url: String) -> PushConfig {
    PushConfig {
        enabled: true,
        gateway_url,
        interval_secs: 1,
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_push_posts_snapshot_as_json() {
    let gateway = Gateway::default();
    let url = start_gateway(gateway.clone()).await;
    let collector = collector_with_error();
    let pusher =
        GatewayPusher::new(&push_config(url), ErrorExporter::new(Arc::clone(&collector))).unwrap();

    pusher.push().await.unwrap();

    let received = gateway.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (content_type, body) = &received[0];
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let payload: ExportPayload = serde_json::from_slice(body).unwrap();
    assert_eq!(payload.target_uuid, collector.target_uuid());
    assert_eq!(payload.aggregated_errors[0].total_count, 1);
}

#[tokio::test]
async fn test_push_surfaces_non_success_status() {
    let gateway = Gateway::default();
    *gateway.status.lock().unwrap() = Some(StatusCode::SERVICE_UNAVAILABLE);
    let url = start_gateway(gateway.clone()).await;
    let collector = collector_with_error();
    let pusher =
        GatewayPusher::new(&push_config(url), ErrorExporter::new(Arc::clone(&collector))).unwrap();

    let err = pusher.push().await.unwrap_err();
    assert!(matches!(
        err,
        FaultlineError::Transport(TransportError::Status { status: 503 })
    ));

    // A failed push leaves the collector untouched
    assert_eq!(collector.store().len(), 1);
    assert_eq!(collector.store().snapshot_all()[0].total_count, 1);
}

#[tokio::test]
async fn test_push_to_unreachable_gateway_fails_with_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pusher = GatewayPusher::new(
        &push_config(format!("http://{addr}")),
        ErrorExporter::new(collector_with_error()),
    )
    .unwrap();

    let err = pusher.push().await.unwrap_err();
    assert!(matches!(
        err,
        FaultlineError::Transport(TransportError::Request(_))
    ));
}

#[tokio::test]
async fn test_push_task_pushes_once_more_on_shutdown() {
    let gateway = Gateway::default();
    let url = start_gateway(gateway.clone()).await;
    let pusher = GatewayPusher::new(&push_config(url), ErrorExporter::new(collector_with_error()))
        .unwrap();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    // Interval is long enough that only the shutdown push happens
    let task = spawn_push_task(pusher, Duration::from_secs(3600), shutdown_rx);
    tokio::task::yield_now().await;
    shutdown_tx.send(()).unwrap();
    task.await.unwrap();

    assert_eq!(gateway.received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_periodic_push_is_reported_as_warning() {
    let gateway = Gateway::default();
    *gateway.status.lock().unwrap() = Some(StatusCode::INTERNAL_SERVER_ERROR);
    let url = start_gateway(gateway.clone()).await;
    let collector = collector_with_error();
    let pusher =
        GatewayPusher::new(&push_config(url), ErrorExporter::new(Arc::clone(&collector))).unwrap();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = spawn_push_task(pusher, Duration::from_secs(3600), shutdown_rx);
    shutdown_tx.send(()).unwrap();
    task.await.unwrap();

    let warnings: Vec<_> = collector
        .store()
        .snapshot_all()
        .into_iter()
        .filter(|a| a.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].aggregation_key.contains("FaultlineError"));
    assert!(
        warnings[0].latest_errors[0]
            .error
            .message
            .contains("500")
    );
}
