//! Messaging: one conversation per family/resource pair plus its messages.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_core::Role;
use database::models::{Conversation, FamilyProfile, Message, User};
use database::{conversation, family_profile, resource_profile, subscription};

use crate::auth::CurrentUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Messages embedded in a conversation listing row.
const LIST_MESSAGE_LIMIT: i64 = 50;
/// Messages returned in a conversation detail.
const DETAIL_MESSAGE_LIMIT: i64 = 1000;

/// Compact participant descriptor. Contact details stay behind the profile
/// endpoints and their paywall.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: String,
    pub display_name: String,
    pub city: String,
    pub region: String,
}

impl From<&FamilyProfile> for PartySummary {
    fn from(profile: &FamilyProfile) -> Self {
        PartySummary {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            city: profile.city.clone(),
            region: profile.region.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub family: PartySummary,
    pub resource: PartySummary,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub resource_profile_id: String,
    pub initial_message: String,
}

/// `POST /messaging/conversations`
///
/// Families with an active subscription may contact allies that currently
/// satisfy the search-eligibility invariant. Creation is find-or-create on
/// the (family, resource) pair, so repeated calls append to the same thread.
pub async fn create_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateConversationRequest>,
) -> Result<Json<ConversationDetail>> {
    if user.role != Role::Family {
        return Err(ApiError::Forbidden(
            "Only FAMILY can initiate a conversation".to_string(),
        ));
    }
    let content = body.initial_message.trim();
    if content.is_empty() {
        return Err(ApiError::Validation(
            "initialMessage must not be empty".to_string(),
        ));
    }

    let pool = state.db.pool();
    if !subscription::has_active_subscription(pool, &user.id).await? {
        return Err(ApiError::Forbidden(
            "An active family subscription is required to contact allies".to_string(),
        ));
    }

    let family = family_profile::get_by_user(pool, &user.id).await?;
    let resource = resource_profile::get(pool, &body.resource_profile_id).await?;
    if !resource.is_search_eligible() {
        return Err(ApiError::Forbidden(
            "This ally is not available for contact".to_string(),
        ));
    }

    let created = conversation::find_or_create(
        pool,
        &Uuid::new_v4().to_string(),
        &family.id,
        &resource.id,
    )
    .await?;
    conversation::append_message(
        pool,
        &Uuid::new_v4().to_string(),
        &created.id,
        &user.id,
        content,
    )
    .await?;

    detail(&state, &created.id, DETAIL_MESSAGE_LIMIT).await.map(Json)
}

/// `GET /messaging/conversations` — the caller's inbox.
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ConversationDetail>>> {
    let pool = state.db.pool();

    let conversations = match user.role {
        Role::Family => match family_profile::find_by_user(pool, &user.id).await? {
            Some(family) => conversation::list_for_family(pool, &family.id).await?,
            None => Vec::new(),
        },
        Role::Resource => match resource_profile::find_by_user(pool, &user.id).await? {
            Some(resource) => conversation::list_for_resource(pool, &resource.id).await?,
            None => Vec::new(),
        },
        Role::Admin => Vec::new(),
    };

    let mut details = Vec::with_capacity(conversations.len());
    for row in conversations {
        details.push(detail(&state, &row.id, LIST_MESSAGE_LIMIT).await?);
    }

    Ok(Json(details))
}

/// `GET /messaging/conversations/:conversation_id` — participants only.
pub async fn get_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationDetail>> {
    require_participant(&state, &conversation_id, &user).await?;
    detail(&state, &conversation_id, DETAIL_MESSAGE_LIMIT)
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// `POST /messaging/conversations/:conversation_id/messages`
///
/// Family senders are re-checked for an active subscription so a lapsed
/// account cannot keep a thread going.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ConversationDetail>> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("content must not be empty".to_string()));
    }

    require_participant(&state, &conversation_id, &user).await?;

    let pool = state.db.pool();
    if user.role == Role::Family && !subscription::has_active_subscription(pool, &user.id).await? {
        return Err(ApiError::Forbidden(
            "Family subscription expired".to_string(),
        ));
    }

    conversation::append_message(
        pool,
        &Uuid::new_v4().to_string(),
        &conversation_id,
        &user.id,
        content,
    )
    .await?;

    detail(&state, &conversation_id, DETAIL_MESSAGE_LIMIT)
        .await
        .map(Json)
}

async fn require_participant(
    state: &AppState,
    conversation_id: &str,
    user: &User,
) -> Result<Conversation> {
    let pool = state.db.pool();
    let row = conversation::get(pool, conversation_id).await?;

    let family = family_profile::get(pool, &row.family_id).await?;
    let resource = resource_profile::get(pool, &row.resource_id).await?;
    if family.user_id != user.id && resource.user_id != user.id {
        return Err(ApiError::Forbidden(
            "Not part of this conversation".to_string(),
        ));
    }

    Ok(row)
}

async fn detail(
    state: &AppState,
    conversation_id: &str,
    message_limit: i64,
) -> Result<ConversationDetail> {
    let pool = state.db.pool();
    let row = conversation::get(pool, conversation_id).await?;
    let family = family_profile::get(pool, &row.family_id).await?;
    let resource = resource_profile::get(pool, &row.resource_id).await?;
    let messages = conversation::list_messages(pool, conversation_id, message_limit).await?;

    Ok(ConversationDetail {
        family: PartySummary::from(&family),
        resource: PartySummary {
            id: resource.id.clone(),
            display_name: resource.display_name.clone(),
            city: resource.city.clone(),
            region: resource.region.clone(),
        },
        conversation: row,
        messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{seed_family, seed_resource, seed_user, test_state};

    fn create_request(resource_id: &str, message: &str) -> CreateConversationRequest {
        CreateConversationRequest {
            resource_profile_id: resource_id.to_string(),
            initial_message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn second_contact_reuses_the_conversation() {
        let state = test_state().await;
        let family = seed_family(&state, "f", true).await;
        seed_resource(&state, "a", "H2X1Y4", true).await;

        let Json(first) = create_conversation(
            State(state.clone()),
            CurrentUser(family.clone()),
            Json(create_request("rp-a", "Bonjour!")),
        )
        .await
        .unwrap();
        let Json(second) = create_conversation(
            State(state),
            CurrentUser(family),
            Json(create_request("rp-a", "Encore moi.")),
        )
        .await
        .unwrap();

        assert_eq!(first.conversation.id, second.conversation.id);
        assert_eq!(second.messages.len(), 2);
        assert_eq!(second.messages[0].content, "Bonjour!");
        assert_eq!(second.messages[1].content, "Encore moi.");
    }

    #[tokio::test]
    async fn contact_requires_an_active_subscription() {
        let state = test_state().await;
        let family = seed_family(&state, "f", false).await;
        seed_resource(&state, "a", "H2X1Y4", true).await;

        let result = create_conversation(
            State(state),
            CurrentUser(family),
            Json(create_request("rp-a", "Bonjour!")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn unlisted_allies_cannot_be_contacted() {
        let state = test_state().await;
        let family = seed_family(&state, "f", true).await;
        seed_resource(&state, "draft", "H2X1Y4", false).await;

        let result = create_conversation(
            State(state),
            CurrentUser(family),
            Json(create_request("rp-draft", "Bonjour!")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn only_participants_may_read_or_write() {
        let state = test_state().await;
        let family = seed_family(&state, "f", true).await;
        seed_resource(&state, "a", "H2X1Y4", true).await;
        let outsider = seed_user(&state, "other", "other@example.com", Role::Family).await;

        let Json(created) = create_conversation(
            State(state.clone()),
            CurrentUser(family),
            Json(create_request("rp-a", "Bonjour!")),
        )
        .await
        .unwrap();

        let read = get_conversation(
            State(state.clone()),
            CurrentUser(outsider.clone()),
            Path(created.conversation.id.clone()),
        )
        .await;
        assert!(matches!(read, Err(ApiError::Forbidden(_))));

        let write = send_message(
            State(state.clone()),
            CurrentUser(outsider),
            Path(created.conversation.id.clone()),
            Json(SendMessageRequest {
                content: "intrusion".to_string(),
            }),
        )
        .await;
        assert!(matches!(write, Err(ApiError::Forbidden(_))));

        // The ally on the other side can answer without a subscription.
        let ally = database::user::get_user(state.db.pool(), "ally-a")
            .await
            .unwrap();
        let Json(replied) = send_message(
            State(state),
            CurrentUser(ally),
            Path(created.conversation.id),
            Json(SendMessageRequest {
                content: "Bonjour, bien sur.".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(replied.messages.len(), 2);
    }

    #[tokio::test]
    async fn lapsed_family_cannot_keep_writing() {
        let state = test_state().await;
        let family = seed_family(&state, "f", true).await;
        seed_resource(&state, "a", "H2X1Y4", true).await;

        let Json(created) = create_conversation(
            State(state.clone()),
            CurrentUser(family.clone()),
            Json(create_request("rp-a", "Bonjour!")),
        )
        .await
        .unwrap();

        database::subscription::update_status_by_provider_id(
            state.db.pool(),
            "provider-sub-f",
            care_core::SubscriptionStatus::Expired,
        )
        .await
        .unwrap();

        let result = send_message(
            State(state),
            CurrentUser(family),
            Path(created.conversation.id),
            Json(SendMessageRequest {
                content: "toujours la?".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn inbox_lists_both_sides() {
        let state = test_state().await;
        let family = seed_family(&state, "f", true).await;
        seed_resource(&state, "a", "H2X1Y4", true).await;

        create_conversation(
            State(state.clone()),
            CurrentUser(family.clone()),
            Json(create_request("rp-a", "Bonjour!")),
        )
        .await
        .unwrap();

        let Json(family_inbox) =
            list_conversations(State(state.clone()), CurrentUser(family)).await.unwrap();
        assert_eq!(family_inbox.len(), 1);
        assert_eq!(family_inbox[0].resource.display_name, "Ally a");

        let ally = database::user::get_user(state.db.pool(), "ally-a")
            .await
            .unwrap();
        let Json(ally_inbox) = list_conversations(State(state), CurrentUser(ally)).await.unwrap();
        assert_eq!(ally_inbox.len(), 1);
        assert_eq!(ally_inbox[0].family.display_name, "Famille f");
    }
}
