//! HTTP surface for a lockstep participant.
//!
//! Maps the node's three operations onto the polling transport contract:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/setup` | Configure this participant for a run |
//! | `GET` | `/status` | Run one status poll |
//! | `GET` | `/data` | Retrieve the pending payload (JSON `null` if none) |
//! | `POST` | `/data` | Submit a payload to this participant |
//!
//! A single mutex serializes all access to the node, which is also what
//! serializes concurrent submissions into the coordinator's collections.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use lockstep_node::Node;
use lockstep_protocol::{Computation, ProtocolError, RunIo};
use lockstep_store::StateStore;
use lockstep_types::{ExchangePayload, ParticipantId, Role};

/// Shared handle to the participant node behind the HTTP handlers.
pub type NodeHandle<S, C, I> = Arc<Mutex<Node<S, C, I>>>;

/// Build the participant router.
pub fn participant_router<S, C, I>(node: NodeHandle<S, C, I>) -> Router
where
    S: StateStore + 'static,
    C: Computation + Send + 'static,
    I: RunIo + Send + 'static,
{
    Router::new()
        .route("/setup", post(setup::<S, C, I>))
        .route("/status", get(status::<S, C, I>))
        .route("/data", get(get_data::<S, C, I>).post(post_data::<S, C, I>))
        .with_state(node)
}

/// Body of the setup request.
#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    /// This participant's id.
    pub id: String,
    /// Whether this participant coordinates the run.
    pub is_coordinator: bool,
    /// Full roster of participant ids (required for the coordinator).
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Success-flag response for setup and submit.
#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_status(e: &ProtocolError) -> StatusCode {
    match e {
        ProtocolError::Config(_) | ProtocolError::UnexpectedPayload { .. } => {
            StatusCode::BAD_REQUEST
        }
        ProtocolError::NoInput | ProtocolError::Store(_) | ProtocolError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `POST /setup` — configure this participant for a run.
async fn setup<S, C, I>(
    State(node): State<NodeHandle<S, C, I>>,
    Json(request): Json<SetupRequest>,
) -> impl IntoResponse
where
    S: StateStore,
    C: Computation + Send,
    I: RunIo + Send,
{
    let role = Role::from_flag(request.is_coordinator);
    let participants = request
        .participants
        .into_iter()
        .map(ParticipantId::new)
        .collect();

    match node.lock().setup(ParticipantId::new(request.id), role, participants) {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })),
        Err(e) => {
            warn!(error = %e, "Setup failed");
            (error_status(&e), Json(SuccessResponse { success: false }))
        }
    }
}

/// `GET /status` — run one status poll.
async fn status<S, C, I>(State(node): State<NodeHandle<S, C, I>>) -> impl IntoResponse
where
    S: StateStore,
    C: Computation + Send,
    I: RunIo + Send,
{
    match node.lock().status() {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            warn!(error = %e, "Status poll failed");
            (
                error_status(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// `GET /data` — retrieve the pending payload.
///
/// Responds with JSON `null` when nothing is available; a premature
/// retrieve is not an error.
async fn get_data<S, C, I>(State(node): State<NodeHandle<S, C, I>>) -> impl IntoResponse
where
    S: StateStore,
    C: Computation + Send,
    I: RunIo + Send,
{
    match node.lock().retrieve() {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            warn!(error = %e, "Retrieve failed");
            (
                error_status(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// `POST /data` — submit a payload to this participant.
async fn post_data<S, C, I>(
    State(node): State<NodeHandle<S, C, I>>,
    Json(payload): Json<ExchangePayload>,
) -> impl IntoResponse
where
    S: StateStore,
    C: Computation + Send,
    I: RunIo + Send,
{
    match node.lock().submit(payload) {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })),
        Err(e) => {
            warn!(error = %e, "Submit rejected");
            (error_status(&e), Json(SuccessResponse { success: false }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use lockstep_compute::{MeanComputation, MemoryIo};
    use lockstep_store::MemoryStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router(samples: Vec<f64>) -> Router {
        let node = Arc::new(Mutex::new(Node::new(
            MemoryStore::new(),
            MeanComputation,
            MemoryIo::new(samples),
        )));
        participant_router(node)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_setup_member() {
        let app = test_router(vec![1.0]);
        let request = json_request(
            "POST",
            "/setup",
            json!({"id": "m1", "is_coordinator": false}),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_setup_coordinator_without_roster_is_rejected() {
        let app = test_router(vec![1.0]);
        let request = json_request(
            "POST",
            "/setup",
            json!({"id": "c0", "is_coordinator": true, "participants": []}),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"success": false}));
    }

    #[tokio::test]
    async fn test_status_reports_progress() {
        let app = test_router(vec![1.0]);

        let setup = json_request(
            "POST",
            "/setup",
            json!({"id": "m1", "is_coordinator": false}),
        );
        app.clone().oneshot(setup).await.unwrap();

        let response = app
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"available": false, "finished": false})
        );
    }

    #[tokio::test]
    async fn test_get_data_without_availability_is_null() {
        let app = test_router(vec![1.0]);
        let setup = json_request(
            "POST",
            "/setup",
            json!({"id": "m1", "is_coordinator": false}),
        );
        app.clone().oneshot(setup).await.unwrap();

        let response = app
            .oneshot(Request::get("/data").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, Value::Null);
    }

    #[tokio::test]
    async fn test_member_data_round_trip_over_http() {
        let app = test_router(vec![2.0, 4.0]);
        let setup = json_request(
            "POST",
            "/setup",
            json!({"id": "m1", "is_coordinator": false}),
        );
        app.clone().oneshot(setup).await.unwrap();

        // Three polls: init, local calculation, then the armed flag is
        // observed.
        for _ in 0..2 {
            app.clone()
                .oneshot(Request::get("/status").body(Body::empty()).unwrap())
                .await
                .unwrap();
        }
        let response = app
            .clone()
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"available": true, "finished": false})
        );

        let response = app
            .clone()
            .oneshot(Request::get("/data").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"kind": "contribution", "body": {"value": 3.0, "weight": 2}})
        );

        // The coordinator pushes the global result back.
        let push = json_request(
            "POST",
            "/data",
            json!({"kind": "global_result", "body": 3.0}),
        );
        let response = app.clone().oneshot(push).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_submit_wrong_variant_is_rejected() {
        let app = test_router(vec![1.0]);
        let setup = json_request(
            "POST",
            "/setup",
            json!({"id": "m1", "is_coordinator": false}),
        );
        app.clone().oneshot(setup).await.unwrap();

        let push = json_request(
            "POST",
            "/data",
            json!({"kind": "finished_flag", "body": true}),
        );
        let response = app.oneshot(push).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"success": false}));
    }
}
