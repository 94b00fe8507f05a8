use crate::config::Settings;
use crate::exceptions::CadasterError;
use crate::handlers::history;
use crate::handlers::query::{self, QueryOutcome};
use crate::historystore::HistoryStore;
use crate::models::{ErrorBody, Pong, QueryRequest, VerdictReply};
use crate::verifier::VerifierClient;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rand::Rng;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: HistoryStore,
    pub verifier: VerifierClient,
    /// Inclusive bounds, in seconds, of the `/result` double's delay.
    pub result_delay_secs: (u64, u64),
}

impl AppState {
    pub fn new(store: HistoryStore, verifier: VerifierClient) -> Self {
        Self {
            store,
            verifier,
            result_delay_secs: (0, 0),
        }
    }

    pub fn with_result_delay(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.result_delay_secs = (min_secs.min(max_secs), max_secs.max(min_secs));
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, CadasterError> {
        settings.validate()?;
        let store = HistoryStore::open(&settings.database_location()?)?;
        let verifier = VerifierClient::new(settings)?;
        Ok(Self::new(store, verifier)
            .with_result_delay(settings.result_min_delay_secs, settings.result_max_delay_secs))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/result", get(emulate_verifier))
        .route("/query", post(create_query))
        .route("/history", get(read_history).delete(clear_history))
        .route("/history/{record_id}", delete(delete_history_record))
        .with_state(state)
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, verifier = %state.verifier.url(), "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

// --- Error mapping ---

pub fn status_for(err: &CadasterError) -> StatusCode {
    match err {
        CadasterError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CadasterError::NotFound(_) => StatusCode::NOT_FOUND,
        CadasterError::VerifierUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CadasterError::VerifierProtocol(_)
        | CadasterError::Store(_)
        | CadasterError::Configuration(_)
        | CadasterError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for CadasterError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        error_response(status, self.to_string())
    }
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorBody { detail })).into_response()
}

// --- Handlers ---

async fn ping() -> Json<Pong> {
    Json(Pong {
        ping: "pong!".to_string(),
    })
}

/// Stand-in for the external verifier: answers a random verdict after a
/// random delay.
async fn emulate_verifier(State(state): State<AppState>) -> Json<VerdictReply> {
    let (min, max) = state.result_delay_secs;
    let (delay, result) = {
        let mut rng = rand::thread_rng();
        (rng.gen_range(min..=max), rng.gen_bool(0.5))
    };
    tokio::time::sleep(Duration::from_secs(delay)).await;
    Json(VerdictReply { result })
}

async fn create_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected query body");
            return error_response(rejection.status(), rejection.body_text());
        }
    };
    if let Err(e) = request.validate() {
        return e.into_response();
    }

    match query::handle(&state.verifier, &state.store, &request).await {
        Ok(QueryOutcome::Created(record)) => (StatusCode::CREATED, Json(record)).into_response(),
        Ok(QueryOutcome::NotCreated(body)) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Kept as raw strings: `skip`/`limit` are only parsed when no filter is given.
#[derive(Debug, Deserialize)]
struct HistoryParams {
    cadastral_number: Option<String>,
    skip: Option<String>,
    limit: Option<String>,
}

async fn read_history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text());
        }
    };

    let result = history::read_with_params(
        &state.store,
        params.cadastral_number.as_deref(),
        params.skip.as_deref(),
        params.limit.as_deref(),
    );
    match result {
        Ok(records) => Json(records).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn clear_history(State(state): State<AppState>) -> Response {
    match history::clear(&state.store) {
        Ok(()) => {
            info!("history cleared");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn delete_history_record(
    State(state): State<AppState>,
    record_id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Path(record_id) = match record_id {
        Ok(p) => p,
        Err(rejection) => {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text());
        }
    };

    match history::delete_one(&state.store, record_id) {
        Ok(record) => {
            info!(id = record.id, "history record deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => e.into_response(),
    }
}
