use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tokio::time::Instant;

use calshare_core::{
    ErrorResponse, LegacySaveResponse, SaveRequest, SaveResponse, StateQuery, StateResponse,
};

use crate::state::{Error, StateService};
use crate::store::KvStore;

pub type AppState = StateService<dyn KvStore>;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route(
            "/api/state",
            get(fetch_state).post(save_state).put(save_state),
        )
        .route("/api/save", post(legacy_save))
        .route("/api/:id", get(legacy_fetch))
        .fallback(not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(service)
}

async fn fetch_state(
    State(service): State<AppState>,
    Query(query): Query<StateQuery>,
) -> Result<Json<StateResponse>, Error> {
    let id = query.id.ok_or(Error::MissingId)?;
    let state = service.fetch(&id).await?;
    Ok(Json(StateResponse { state }))
}

async fn save_state(
    State(service): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, Error> {
    let Json(request) = payload.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
    let id = service.save(request).await?;
    Ok(Json(SaveResponse { id }))
}

async fn legacy_fetch(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, Error> {
    service.fetch_raw(&id).await.map(Json)
}

async fn legacy_save(
    State(service): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LegacySaveResponse>, Error> {
    let Json(body) = payload.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
    let id = service.save_raw(body).await?;
    Ok(Json(LegacySaveResponse { success: true, id }))
}

async fn not_found() -> Response {
    let status = StatusCode::NOT_FOUND;
    (status, error_body(status, "Not found")).into_response()
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() {
        log::error!("{method} {path} -> {status} ({:?})", start.elapsed());
    } else {
        log::debug!("{method} {path} -> {status} ({:?})", start.elapsed());
    }

    response
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::MissingId | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            Error::Store(err) => {
                log::error!("Storage failure: {err}");
                "Failed to access calendar state".to_string()
            }
            other => other.to_string(),
        };

        (status, error_body(status, message)).into_response()
    }
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        status_code: status.as_u16(),
        message: message.into(),
    })
}
