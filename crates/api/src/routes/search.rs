//! Public directory search.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use care_core::search::{
    fsa_prefix, normalize_postal_code, run_search, split_tags, SearchQuery, SearchResponse,
};
use care_core::{Caller, Role};
use database::{resource_profile, subscription};

use crate::auth::OptionalCurrentUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub postal_code: Option<String>,
    /// Comma-separated tag list.
    pub tags: Option<String>,
    pub page: Option<usize>,
}

/// `GET /search/resources?postalCode=&tags=&page=`
///
/// Storage narrows candidates by lifecycle columns and postal prefix; the
/// domain layer applies tags, ordering, pagination and the premium-vs-preview
/// projection.
pub async fn search_resources(
    State(state): State<AppState>,
    OptionalCurrentUser(user): OptionalCurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let postal_code = params
        .postal_code
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("postalCode is required".to_string()))?;

    let pool = state.db.pool();
    let caller = match user {
        Some(user) => {
            let premium = user.role == Role::Family
                && subscription::has_active_subscription(pool, &user.id).await?;
            Some(Caller::new(user.id, user.role).with_premium(premium))
        }
        None => None,
    };

    let normalized = normalize_postal_code(postal_code);
    let candidates =
        resource_profile::search_candidates(pool, &normalized, fsa_prefix(&normalized)).await?;

    let query = SearchQuery::new(
        postal_code,
        split_tags(params.tags.as_deref()),
        params.page.unwrap_or(1),
    );
    let response = run_search(&candidates, &query, caller.as_ref());

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{seed_family, seed_resource, test_state};

    fn params(postal: &str) -> SearchParams {
        SearchParams {
            postal_code: Some(postal.to_string()),
            tags: None,
            page: None,
        }
    }

    #[tokio::test]
    async fn family_without_subscription_gets_limited_preview() {
        let state = test_state().await;
        for i in 0..5 {
            seed_resource(&state, &format!("p{i}"), "H2X1Y4", true).await;
        }
        let family = seed_family(&state, "f", false).await;

        let Json(response) = search_resources(
            State(state),
            OptionalCurrentUser(Some(family)),
            Query(params("H2X1Y4")),
        )
        .await
        .unwrap();

        assert!(response.limited_preview);
        assert_eq!(response.total_found, 5);
        assert!(response.results.len() <= 3);

        let json = serde_json::to_value(&response).unwrap();
        for row in json["results"].as_array().unwrap() {
            let object = row.as_object().unwrap();
            assert!(!object.contains_key("contactEmail"));
            assert!(!object.contains_key("contactPhone"));
        }
    }

    #[tokio::test]
    async fn premium_family_gets_full_page_with_contact_fields() {
        let state = test_state().await;
        for i in 0..5 {
            seed_resource(&state, &format!("p{i}"), "H2X1Y4", true).await;
        }
        let family = seed_family(&state, "f", true).await;

        let Json(response) = search_resources(
            State(state),
            OptionalCurrentUser(Some(family)),
            Query(params("H2X 1Y4")),
        )
        .await
        .unwrap();

        assert!(!response.limited_preview);
        assert_eq!(response.total_found, 5);
        assert_eq!(response.page_size, 10);
        assert_eq!(response.results.len(), 5);

        let json = serde_json::to_value(&response).unwrap();
        for row in json["results"].as_array().unwrap() {
            let object = row.as_object().unwrap();
            assert!(object.contains_key("contactEmail"));
            assert!(object.contains_key("contactPhone"));
        }
    }

    #[tokio::test]
    async fn unapproved_profiles_never_surface() {
        let state = test_state().await;
        seed_resource(&state, "draft", "H2X1Y4", false).await;

        let Json(response) = search_resources(
            State(state),
            OptionalCurrentUser(None),
            Query(params("H2X1Y4")),
        )
        .await
        .unwrap();

        assert_eq!(response.total_found, 0);
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn tag_filter_narrows_the_set() {
        let state = test_state().await;
        seed_resource(&state, "a", "H2X1Y4", true).await;

        let with_match = SearchParams {
            postal_code: Some("H2X1Y4".to_string()),
            tags: Some("repit,autre".to_string()),
            page: None,
        };
        let Json(matched) = search_resources(
            State(state.clone()),
            OptionalCurrentUser(None),
            Query(with_match),
        )
        .await
        .unwrap();
        assert_eq!(matched.total_found, 1);

        let without_match = SearchParams {
            postal_code: Some("H2X1Y4".to_string()),
            tags: Some("menage".to_string()),
            page: None,
        };
        let Json(unmatched) = search_resources(
            State(state),
            OptionalCurrentUser(None),
            Query(without_match),
        )
        .await
        .unwrap();
        assert_eq!(unmatched.total_found, 0);
    }

    #[tokio::test]
    async fn missing_postal_code_is_rejected() {
        let state = test_state().await;
        let result = search_resources(
            State(state),
            OptionalCurrentUser(None),
            Query(SearchParams {
                postal_code: Some("   ".to_string()),
                tags: None,
                page: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
