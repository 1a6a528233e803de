//! Directory search: postal matching, tag overlap, ordering, pagination and
//! the premium-vs-preview result shaping.
//!
//! Location matching is deliberately coarse for now: a profile matches when
//! its stored postal code equals the normalized input or shares its
//! three-character forward sortation area prefix. Callers are expected to
//! validate input length; a short input degrades to a short-prefix match.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::caller::Caller;
use crate::profile::ResourceProfile;

/// Page size applied to premium family searches.
pub const PREMIUM_PAGE_SIZE: usize = 10;

/// Result cap applied to non-premium searches. Pagination is disabled.
pub const PREVIEW_LIMIT: usize = 3;

const MATCHING_STRATEGY: &str = "postal exact or forward-sortation-area prefix match";

/// Parsed search input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchQuery {
    pub postal_code: String,
    pub tags: Vec<String>,
    /// 1-indexed. Ignored for non-premium callers.
    pub page: usize,
}

impl SearchQuery {
    pub fn new(postal_code: impl Into<String>, tags: Vec<String>, page: usize) -> Self {
        Self {
            postal_code: postal_code.into(),
            tags,
            page,
        }
    }
}

/// Premium search row. Contact fields are included; the bio stays behind the
/// direct profile fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumSearchResult {
    pub id: String,
    pub display_name: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub skills_tags: Vec<String>,
    pub average_rating: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Preview search row shown to non-premium callers. No contact fields, no
/// postal code, no lifecycle columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSearchResult {
    pub id: String,
    pub display_name: String,
    pub city: String,
    pub region: String,
    pub skills_tags: Vec<String>,
    pub average_rating: Option<f64>,
    pub hourly_rate: Option<f64>,
}

/// One search result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchResult {
    Premium(PremiumSearchResult),
    Preview(PreviewSearchResult),
}

/// Search response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Size of the full eligible set, independent of pagination and of the
    /// caller's premium standing.
    pub total_found: usize,
    pub page: usize,
    pub page_size: usize,
    pub limited_preview: bool,
    pub matching_strategy: &'static str,
    pub results: Vec<SearchResult>,
}

/// Strip all whitespace and uppercase.
pub fn normalize_postal_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// First three characters of a normalized postal code (the forward sortation
/// area). Shorter inputs are returned whole.
pub fn fsa_prefix(normalized: &str) -> &str {
    normalized.get(..3).unwrap_or(normalized)
}

/// Split a comma-separated tag list, trimming and dropping empties.
pub fn split_tags(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(s) => s
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
    }
}

fn matches_location(stored: &str, normalized: &str, prefix: &str) -> bool {
    stored == normalized || stored.starts_with(prefix)
}

fn matches_tags(skills: &[String], requested: &[String]) -> bool {
    requested.is_empty() || requested.iter().any(|tag| skills.contains(tag))
}

fn compare_for_listing(a: &ResourceProfile, b: &ResourceProfile) -> Ordering {
    let by_rating = match (a.average_rating, b.average_rating) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_rating.then_with(|| b.created_at.cmp(&a.created_at))
}

/// Run a search over candidate profiles.
///
/// Candidates may be pre-narrowed by storage (status columns, postal prefix);
/// the full eligibility and tag checks are re-applied here so the function is
/// correct over any input set.
pub fn run_search(
    candidates: &[ResourceProfile],
    query: &SearchQuery,
    caller: Option<&Caller>,
) -> SearchResponse {
    let normalized = normalize_postal_code(&query.postal_code);
    let prefix = fsa_prefix(&normalized).to_string();

    let mut matches: Vec<&ResourceProfile> = candidates
        .iter()
        .filter(|p| {
            p.is_search_eligible()
                && matches_location(&p.postal_code, &normalized, &prefix)
                && matches_tags(&p.skills_tags, &query.tags)
        })
        .collect();
    matches.sort_by(|a, b| compare_for_listing(a, b));

    let total_found = matches.len();
    let premium = caller.map(Caller::is_premium_family).unwrap_or(false);

    if premium {
        let page = query.page.max(1);
        let results = matches
            .iter()
            .skip((page - 1) * PREMIUM_PAGE_SIZE)
            .take(PREMIUM_PAGE_SIZE)
            .map(|p| SearchResult::Premium(premium_result(p)))
            .collect();
        SearchResponse {
            total_found,
            page,
            page_size: PREMIUM_PAGE_SIZE,
            limited_preview: false,
            matching_strategy: MATCHING_STRATEGY,
            results,
        }
    } else {
        let results = matches
            .iter()
            .take(PREVIEW_LIMIT)
            .map(|p| SearchResult::Preview(preview_result(p)))
            .collect();
        SearchResponse {
            total_found,
            page: 1,
            page_size: PREVIEW_LIMIT,
            limited_preview: true,
            matching_strategy: MATCHING_STRATEGY,
            results,
        }
    }
}

fn premium_result(profile: &ResourceProfile) -> PremiumSearchResult {
    PremiumSearchResult {
        id: profile.id.clone(),
        display_name: profile.display_name.clone(),
        city: profile.city.clone(),
        region: profile.region.clone(),
        postal_code: profile.postal_code.clone(),
        skills_tags: profile.skills_tags.clone(),
        average_rating: profile.average_rating,
        hourly_rate: profile.hourly_rate,
        contact_email: profile.contact_email.clone(),
        contact_phone: profile.contact_phone.clone(),
    }
}

fn preview_result(profile: &ResourceProfile) -> PreviewSearchResult {
    PreviewSearchResult {
        id: profile.id.clone(),
        display_name: profile.display_name.clone(),
        city: profile.city.clone(),
        region: profile.region.clone(),
        skills_tags: profile.skills_tags.clone(),
        average_rating: profile.average_rating,
        hourly_rate: profile.hourly_rate,
    }
}
