//! JSON API over the conversation controller.
//!
//! - `POST /api/chat`            free-text turn
//! - `GET  /api/search`          structured search from query parameters
//! - `POST /api/contact`         ask the agent of a listing to reach out
//! - `GET  /api/listings/{id}`   one listing
//! - `GET  /api/meta`            cities, languages and rent range for forms

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use homefinder_agent::{ChatIntent, ConversationController, SearchReply};
use homefinder_core::contact::{ContactMethod, ContactOutcome, ContactRequest};
use homefinder_core::domain::filter::FilterSet;
use homefinder_core::domain::listing::{Listing, ListingId};
use homefinder_core::errors::{ApplicationError, DomainError, InterfaceError};
use homefinder_core::search::ScoredListing;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<ConversationController>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: &'static str,
    pub correlation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub intent: ChatIntent,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSet>,
    pub listings: Vec<ScoredListing>,
}

/// Raw search form. Values arrive as strings so malformed numbers can be
/// dropped instead of rejecting the whole request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub max_rent: Option<String>,
    pub min_bedrooms: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "zip")]
    pub zip_code: Option<String>,
    pub language: Option<String>,
    #[serde(alias = "section8_accepted")]
    pub section8: Option<String>,
    pub hud_approved: Option<String>,
    #[serde(alias = "low_income_eligible")]
    pub low_income: Option<String>,
    #[serde(alias = "nearby_transit")]
    pub transit: Option<String>,
    #[serde(alias = "pets_allowed")]
    pub pets: Option<String>,
    pub accessibility: Option<String>,
    #[serde(alias = "max_ami")]
    pub max_ami_percent: Option<String>,
    pub top_n: Option<String>,
}

impl SearchParams {
    pub fn into_filters(self) -> FilterSet {
        FilterSet {
            max_rent: number(self.max_rent.as_deref()),
            min_bedrooms: number(self.min_bedrooms.as_deref()),
            city: text(self.city),
            state: text(self.state),
            zip_code: text(self.zip_code),
            language: text(self.language),
            section8_accepted: flag(self.section8.as_deref()),
            hud_approved: flag(self.hud_approved.as_deref()),
            low_income_eligible: flag(self.low_income.as_deref()),
            nearby_transit: flag(self.transit.as_deref()),
            pets_allowed: flag(self.pets.as_deref()),
            accessibility: flag(self.accessibility.as_deref()),
            max_ami_percent: number(self.max_ami_percent.as_deref()),
            top_n: number(self.top_n.as_deref()),
        }
    }
}

/// Contact form. Required fields are optional here so that a missing field
/// surfaces as a 400 with a readable message.
#[derive(Debug, Default, Deserialize)]
pub struct ContactPayload {
    pub listing_id: Option<ListingIdInput>,
    #[serde(alias = "name")]
    pub requester_name: Option<String>,
    #[serde(alias = "phone")]
    pub requester_phone: Option<String>,
    #[serde(alias = "email")]
    pub requester_email: Option<String>,
    #[serde(alias = "language")]
    pub preferred_language: Option<String>,
    pub method: Option<String>,
}

/// A listing id sent as a number (`3`) or as form text (`"3"`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListingIdInput {
    Number(u32),
    Text(String),
    Other(serde_json::Value),
}

impl ListingIdInput {
    fn resolve(self) -> Result<u32, DomainError> {
        let parsed = match &self {
            Self::Number(id) => Some(*id),
            Self::Text(raw) => raw.trim().parse::<u32>().ok(),
            Self::Other(_) => None,
        };
        parsed.ok_or_else(|| {
            DomainError::InvariantViolation("listing_id must be a whole number".to_string())
        })
    }
}

impl ContactPayload {
    fn into_request(self) -> Result<ContactRequest, DomainError> {
        let listing_id = self
            .listing_id
            .ok_or_else(|| DomainError::InvariantViolation("listing_id is required".to_string()))?
            .resolve()?;
        let method = match self.method.as_deref() {
            Some(raw) => raw.parse::<ContactMethod>()?,
            None => ContactMethod::default(),
        };

        let mut request = ContactRequest::new(
            ListingId(listing_id),
            self.requester_name.unwrap_or_default(),
            self.requester_phone.unwrap_or_default(),
        )
        .with_method(method);
        if let Some(email) = text(self.requester_email) {
            request = request.with_email(email);
        }
        if let Some(language) = text(self.preferred_language) {
            request = request.with_language(language);
        }
        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    #[serde(flatten)]
    pub outcome: ContactOutcome,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub listing_count: usize,
    pub cities: Vec<String>,
    pub languages: Vec<String>,
    pub min_rent: u32,
    pub max_rent: u32,
}

pub fn router(controller: Arc<ConversationController>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/search", get(search))
        .route("/api/contact", post(contact))
        .route("/api/listings/{id}", get(listing))
        .route("/api/meta", get(meta))
        .with_state(ApiState { controller })
}

pub async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(reject(DomainError::InvariantViolation("message is required".to_string())));
    }

    let reply = state.controller.handle(&request.message);
    Ok(Json(ChatResponse {
        intent: reply.intent,
        reply: reply.reply_text,
        filters: reply.filters,
        listings: reply.listings,
    }))
}

pub async fn search(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchReply> {
    Json(state.controller.handle_filters(&params.into_filters()))
}

pub async fn contact(
    State(state): State<ApiState>,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<ContactResponse>, ApiError> {
    let request = payload.into_request().map_err(reject)?;
    if state.controller.engine().store().get(request.listing_id).is_none() {
        return Err(reject(DomainError::UnknownListing(request.listing_id.0)));
    }

    let reply = state.controller.request_contact(&request).await;
    Ok(Json(ContactResponse { outcome: reply.outcome, reply: reply.reply_text }))
}

pub async fn listing(
    State(state): State<ApiState>,
    Path(id): Path<u32>,
) -> Result<Json<Listing>, ApiError> {
    state
        .controller
        .engine()
        .store()
        .get(ListingId(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(DomainError::UnknownListing(id)))
}

pub async fn meta(State(state): State<ApiState>) -> Json<MetaResponse> {
    let store = state.controller.engine().store();
    let (min_rent, max_rent) = store.price_range();
    Json(MetaResponse {
        listing_count: store.len(),
        cities: store.cities(),
        languages: store.languages(),
        min_rent,
        max_rent,
    })
}

fn reject(error: impl Into<ApplicationError>) -> ApiError {
    let interface = error.into().into_interface(Uuid::new_v4().to_string());
    let (status, detail) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message),
    };
    warn!(
        event_name = "api.request.rejected",
        correlation_id = interface.correlation_id(),
        status = status.as_u16(),
        error = %detail,
        "request rejected"
    );
    (
        status,
        Json(ErrorBody {
            error: detail.clone(),
            message: interface.user_message(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

fn number<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim).filter(|value| !value.is_empty()).and_then(|value| value.parse().ok())
}

fn flag(raw: Option<&str>) -> Option<bool> {
    let value = raw?.trim().to_ascii_lowercase();
    matches!(value.as_str(), "true" | "1" | "yes" | "on").then_some(true)
}

fn text(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
