//! Route handlers and the bearer-token session extractor.

use crate::auth::SessionManager;
use crate::core::{DayEntry, DayKey, EntryDraft, MergeMode, OwnerId};
use crate::facade::Ledger;
use crate::web::{self, WebError};
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            sessions: Arc::new(SessionManager::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/days", post(save_day))
        .route("/api/days/range", get(date_range))
        .route("/api/days/:date", get(get_day).delete(delete_day))
        .with_state(state)
}

// ============================================================================
// Session extraction
// ============================================================================

/// The authenticated owner behind a `Authorization: Bearer <token>` header.
pub struct OwnerSession(pub OwnerId);

#[axum::async_trait]
impl FromRequestParts<AppState> for OwnerSession {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| WebError::Unauthorized("Missing authorization header".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| WebError::Unauthorized("Malformed authorization header".to_string()))?;
        let owner = state
            .sessions
            .resolve(token)
            .await
            .ok_or_else(|| WebError::Unauthorized("Invalid or expired token".to_string()))?;
        Ok(OwnerSession(owner))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct OwnerProfile {
    pub id: OwnerId,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub token: String,
    pub user: OwnerProfile,
}

#[derive(Debug, Deserialize)]
pub struct SaveDayBody {
    pub date: DayKey,
    #[serde(flatten)]
    pub draft: EntryDraft,
    #[serde(default)]
    pub mode: MergeMode,
}

/// A present day serializes with its identity and timestamp; an absent day is
/// the defined empty state, not a 404.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DayResponse {
    Present(DayEntry),
    Empty(EntryDraft),
}

#[derive(Debug, Serialize)]
pub struct RangeBody {
    pub min: DayKey,
    pub max: DayKey,
    pub dates: Vec<DayKey>,
}

#[derive(Debug, Serialize)]
pub struct DeleteAck {
    pub deleted: DayKey,
}

// ============================================================================
// Handlers
// ============================================================================

async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> web::Result<Json<SessionBody>> {
    let account = state.ledger.register(&body.username, &body.password).await?;
    let token = state.sessions.issue(account.id()).await;
    Ok(Json(SessionBody {
        token,
        user: OwnerProfile {
            id: account.id(),
            username: account.username().to_string(),
        },
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> web::Result<Json<SessionBody>> {
    let account = state
        .ledger
        .authenticate(&body.username, &body.password)
        .await?;
    let token = state.sessions.issue(account.id()).await;
    Ok(Json(SessionBody {
        token,
        user: OwnerProfile {
            id: account.id(),
            username: account.username().to_string(),
        },
    }))
}

async fn get_day(
    State(state): State<AppState>,
    OwnerSession(owner): OwnerSession,
    Path(date): Path<String>,
) -> web::Result<Json<DayResponse>> {
    let date = DayKey::parse(&date).map_err(WebError::from)?;
    let response = match state.ledger.day(owner, date).await {
        Some(entry) => DayResponse::Present(entry),
        None => DayResponse::Empty(EntryDraft::default()),
    };
    Ok(Json(response))
}

async fn save_day(
    State(state): State<AppState>,
    OwnerSession(owner): OwnerSession,
    Json(body): Json<SaveDayBody>,
) -> web::Result<Json<DayEntry>> {
    debug!(date = %body.date, mode = ?body.mode, "Saving day entry");
    let entry = state
        .ledger
        .save_day(owner, body.date, body.draft, body.mode)
        .await?;
    Ok(Json(entry))
}

async fn delete_day(
    State(state): State<AppState>,
    OwnerSession(owner): OwnerSession,
    Path(date): Path<String>,
) -> web::Result<Json<DeleteAck>> {
    let date = DayKey::parse(&date).map_err(WebError::from)?;
    state.ledger.delete_day(owner, date).await?;
    Ok(Json(DeleteAck { deleted: date }))
}

async fn date_range(
    State(state): State<AppState>,
    OwnerSession(owner): OwnerSession,
) -> web::Result<Json<RangeBody>> {
    let dates = state.ledger.entry_dates(owner).await;
    let range = state.ledger.navigable_range(owner).await;
    Ok(Json(RangeBody {
        min: range.min(),
        max: range.max(),
        dates,
    }))
}
