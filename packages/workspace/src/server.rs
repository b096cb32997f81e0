//! HTTP API over [`TemplateService`].
//!
//! Identity comes from the `x-user-id` header, set by whatever sits in
//! front of this server. Requests without it act as the anonymous user.

use crate::errors::{WorkspaceError, WorkspaceResult};
use crate::service::TemplateService;
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mailforge_model::{
    Context, Document, DocumentId, DocumentPatch, DocumentSummary, NewDocument, SaveOutcome,
    UserId,
};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub const USER_HEADER: &str = "x-user-id";

pub type AppState = Arc<TemplateService>;

/// The principal making the request.
#[derive(Debug, Clone)]
pub struct Requester(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(UserId::new)
            .unwrap_or_else(UserId::anonymous);
        Ok(Requester(user))
    }
}

/// Error response carrying a `{"message": ...}` body.
pub struct AppError(WorkspaceError);

impl From<WorkspaceError> for AppError {
    fn from(err: WorkspaceError) -> Self {
        AppError(err)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            WorkspaceError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkspaceError::Forbidden(_) => StatusCode::FORBIDDEN,
            WorkspaceError::Validation(_) => StatusCode::BAD_REQUEST,
            WorkspaceError::Transport(_) => StatusCode::BAD_GATEWAY,
            WorkspaceError::Serialization { .. }
            | WorkspaceError::Store(_)
            | WorkspaceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, AppError>;

/// Run a service call on the blocking pool. The store and the transports
/// do synchronous IO and must stay off the runtime's worker threads.
async fn blocking<T, F>(service: AppState, call: F) -> ApiResult<T>
where
    F: FnOnce(&TemplateService) -> WorkspaceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|err| AppError(WorkspaceError::Internal(err.to_string())))?
        .map_err(AppError)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    #[serde(default)]
    pub context_data: Option<Context>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub template_id: DocumentId,
    pub recipient_email: String,
    #[serde(default)]
    pub context_data: Option<Context>,
}

pub fn router(service: TemplateService) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/templates", get(list_templates).post(create_template))
        .route("/api/templates/categories", get(list_categories))
        .route(
            "/api/templates/:id",
            get(fetch_template).put(save_template).delete(delete_template),
        )
        .route("/api/templates/:id/preview", post(preview_template))
        .route("/api/email/send", post(send_email))
        .with_state(Arc::new(service))
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(service: TemplateService, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "MailForge API listening");
    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "MailForge API is running"
}

async fn list_templates(
    State(service): State<AppState>,
    Requester(user): Requester,
) -> ApiResult<Json<Vec<DocumentSummary>>> {
    Ok(Json(blocking(service, move |s| s.list(&user)).await?))
}

async fn create_template(
    State(service): State<AppState>,
    Requester(user): Requester,
    Json(input): Json<NewDocument>,
) -> ApiResult<impl IntoResponse> {
    let id = blocking(service, move |s| s.create(&user, input)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_categories(
    State(service): State<AppState>,
    Requester(user): Requester,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(blocking(service, move |s| s.categories(&user)).await?))
}

async fn fetch_template(
    State(service): State<AppState>,
    Requester(user): Requester,
    Path(id): Path<DocumentId>,
) -> ApiResult<Json<Document>> {
    Ok(Json(blocking(service, move |s| s.fetch(&id, &user)).await?))
}

async fn save_template(
    State(service): State<AppState>,
    Requester(user): Requester,
    Path(id): Path<DocumentId>,
    Json(patch): Json<DocumentPatch>,
) -> ApiResult<Json<SaveOutcome>> {
    Ok(Json(blocking(service, move |s| s.save(&id, &user, patch)).await?))
}

async fn delete_template(
    State(service): State<AppState>,
    Requester(user): Requester,
    Path(id): Path<DocumentId>,
) -> ApiResult<Json<serde_json::Value>> {
    blocking(service, move |s| s.delete(&id, &user)).await?;
    Ok(Json(json!({ "message": "Template deleted" })))
}

async fn preview_template(
    State(service): State<AppState>,
    Requester(user): Requester,
    Path(id): Path<DocumentId>,
    body: Option<Json<PreviewRequest>>,
) -> ApiResult<Html<String>> {
    let context = body.and_then(|Json(request)| request.context_data);
    Ok(Html(blocking(service, move |s| s.preview(&id, &user, context)).await?))
}

async fn send_email(
    State(service): State<AppState>,
    Requester(user): Requester,
    Json(request): Json<SendRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let delivery = blocking(service, move |s| {
        s.send(
            &request.template_id,
            &user,
            &request.recipient_email,
            request.context_data,
        )
    })
    .await?;
    Ok(Json(json!({
        "message": "Email sent successfully",
        "messageId": delivery.message_id,
    })))
}
