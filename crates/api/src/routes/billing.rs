//! Payment provider webhook.
//!
//! The provider reports completed checkouts out-of-band. Resource onboarding
//! payments advance the profile lifecycle; family subscription checkouts
//! activate premium access. Checkout session creation itself lives with the
//! provider and is not part of this API.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use database::{resource_profile, subscription};

use crate::error::{ApiError, Result};
use crate::state::AppState;

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
const KIND_RESOURCE_ONBOARDING: &str = "RESOURCE_ONBOARDING";
const KIND_FAMILY_SUBSCRIPTION: &str = "FAMILY_SUBSCRIPTION";

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: CheckoutSession,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    #[serde(default)]
    pub metadata: SessionMetadata,
    pub customer: Option<String>,
    pub subscription: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub kind: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
    pub validated: bool,
}

/// `POST /billing/webhook`
///
/// When a shared secret is configured the `x-webhook-secret` header must
/// match; otherwise verification is skipped with a warning. Signature
/// schemes beyond the shared secret are the provider SDK's concern.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<WebhookResponse>> {
    let validated = match &state.config.webhook_secret {
        Some(secret) => {
            let presented = headers
                .get("x-webhook-secret")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if presented != secret {
                return Err(ApiError::Unauthorized(
                    "Invalid webhook secret".to_string(),
                ));
            }
            true
        }
        None => {
            warn!("Webhook secret validation skipped (missing config)");
            false
        }
    };

    if event.event_type != CHECKOUT_COMPLETED {
        info!(event_type = %event.event_type, "Ignoring webhook event");
        return Ok(Json(WebhookResponse {
            received: true,
            validated,
        }));
    }

    let session = &event.data.object;
    let pool = state.db.pool();
    match (
        session.metadata.kind.as_deref(),
        session.metadata.user_id.as_deref(),
    ) {
        (Some(KIND_RESOURCE_ONBOARDING), Some(user_id)) => {
            resource_profile::mark_payment_completed(pool, user_id).await?;
            info!(user_id = %user_id, "Resource onboarding payment completed");
        }
        (Some(KIND_FAMILY_SUBSCRIPTION), Some(user_id)) => {
            subscription::mark_active(
                pool,
                &Uuid::new_v4().to_string(),
                user_id,
                session.customer.as_deref(),
                session.subscription.as_deref(),
            )
            .await?;
            info!(user_id = %user_id, "Family subscription activated");
        }
        _ => {
            warn!("Checkout completed event without usable metadata");
        }
    }

    Ok(Json(WebhookResponse {
        received: true,
        validated,
    }))
}
