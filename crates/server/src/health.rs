use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use homefinder_core::store::ListingStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub store: Arc<ListingStore>,
    pub contact_channels: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub dataset: HealthCheck,
    pub contact: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Disabled contact channels are reported but do not degrade readiness.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let dataset = dataset_check(&state.store);
    let ready = dataset.status == "ready";

    let contact = if state.contact_channels.is_empty() {
        HealthCheck { status: "disabled", detail: "no contact channel configured".to_string() }
    } else {
        HealthCheck {
            status: "ready",
            detail: format!("channels: {}", state.contact_channels.join(", ")),
        }
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "homefinder-server runtime initialized".to_string(),
        },
        dataset,
        contact,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn dataset_check(store: &ListingStore) -> HealthCheck {
    if store.is_empty() {
        return HealthCheck { status: "degraded", detail: "no listings loaded".to_string() };
    }
    let (min_rent, max_rent) = store.price_range();
    HealthCheck {
        status: "ready",
        detail: format!("{} listings loaded, rent ${min_rent}-${max_rent}", store.len()),
    }
}
