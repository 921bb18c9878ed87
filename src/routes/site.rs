/**
 * Site Routes
 * Read the site document and update it section by section
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::db::models::Document;
use crate::error::AppError;
use crate::publish::PublishOutcome;
use crate::service::SectionUpdate;
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of every successful write. `publish` tells the caller whether the
/// page caught up; a failed publish is still a successful write.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub status: String,
    pub publish: PublishOutcome,
}

impl UpdateResponse {
    fn ok(publish: PublishOutcome) -> Self {
        Self {
            status: "ok".to_string(),
            publish,
        }
    }
}

// A section key missing from the body clears that section. Anything present,
// `null` included, is stored exactly as sent.

/// Keeps an explicit `null` as `Some(Value::Null)` instead of folding it
/// into "missing".
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct HeroUpdate {
    #[serde(default, deserialize_with = "present")]
    pub hero: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AboutUpdate {
    #[serde(default, deserialize_with = "present")]
    pub about: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default, deserialize_with = "present")]
    pub telegram: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShirtsUpdate {
    #[serde(default, deserialize_with = "present")]
    pub shirts_title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub shirts: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountsUpdate {
    #[serde(default, deserialize_with = "present")]
    pub discounts: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct FooterUpdate {
    #[serde(default, deserialize_with = "present")]
    pub footer: Option<Value>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/data
/// Returns the stored document, `{}` if there is none
pub async fn get_data(State(state): State<AppState>) -> Result<Json<Document>, AppError> {
    let doc = state.site.document().await.map_err(AppError::Read)?;
    Ok(Json(doc))
}

async fn apply(state: &AppState, update: SectionUpdate) -> Result<Json<UpdateResponse>, AppError> {
    let publish = state.site.apply(update).await.map_err(AppError::Update)?;
    Ok(Json(UpdateResponse::ok(publish)))
}

/// POST /api/update-hero
pub async fn update_hero(
    State(state): State<AppState>,
    body: Result<Json<HeroUpdate>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let Json(body) = body?;
    apply(&state, SectionUpdate::Hero(body.hero)).await
}

/// POST /api/update-about
pub async fn update_about(
    State(state): State<AppState>,
    body: Result<Json<AboutUpdate>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let Json(body) = body?;
    apply(&state, SectionUpdate::About(body.about)).await
}

/// POST /api/update-telegram
pub async fn update_telegram(
    State(state): State<AppState>,
    body: Result<Json<TelegramUpdate>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let Json(body) = body?;
    apply(&state, SectionUpdate::Telegram(body.telegram)).await
}

/// POST /api/update-shirts
/// `shirtsTitle` and `shirts` are replaced together
pub async fn update_shirts(
    State(state): State<AppState>,
    body: Result<Json<ShirtsUpdate>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let Json(body) = body?;
    apply(
        &state,
        SectionUpdate::Shirts {
            title: body.shirts_title,
            shirts: body.shirts,
        },
    )
    .await
}

/// POST /api/update-discounts
pub async fn update_discounts(
    State(state): State<AppState>,
    body: Result<Json<DiscountsUpdate>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let Json(body) = body?;
    apply(&state, SectionUpdate::Discounts(body.discounts)).await
}

/// POST /api/update-footer
pub async fn update_footer(
    State(state): State<AppState>,
    body: Result<Json<FooterUpdate>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let Json(body) = body?;
    apply(&state, SectionUpdate::Footer(body.footer)).await
}

/// POST /api/update-all
/// Replaces the whole document; the body must be a JSON object
pub async fn update_all(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let Json(doc) = body?;
    apply(&state, SectionUpdate::All(doc)).await
}

/// POST /api/republish
/// Renders and publishes the stored document without changing it
pub async fn republish(State(state): State<AppState>) -> Result<Json<UpdateResponse>, AppError> {
    let publish = state.site.republish().await.map_err(AppError::Read)?;
    Ok(Json(UpdateResponse::ok(publish)))
}
