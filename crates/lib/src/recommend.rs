//! # Recommendation Engine
//!
//! Filters stored spots down to reachable candidates, then asks the planner
//! model to pick a handful of them. The model's answer is treated as a hint:
//! unknown IDs are dropped, and a deterministic fill-up runs whenever too few
//! picks survive, so a failing or rambling model still yields results.

use crate::{
    categories::Category,
    constants::{
        DEFAULT_MAX_DISTANCE_KM, DEFAULT_MAX_TIME_HOURS, FALLBACK_RECOMMENDATION_MESSAGE,
        MAX_FALLBACK_RECOMMENDATIONS, MIN_RECOMMENDATIONS, NO_MATCHING_SPOTS_MESSAGE,
        RECENT_RECOMMENDATION_DAYS, RECOMMENDATION_CANDIDATE_LIMIT, AVERAGE_SPEED_KMH,
    },
    errors::SpotError,
    extract::parse_embedded,
    geo::{driving_minutes, haversine_km, round1},
    prompts::TaskPrompt,
    providers::{ai::AiProvider, db::sqlite::SqliteProvider},
    types::{Spot, UserPreferences, UserStats, VisitRecord},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info};

/// Tunables for the recommendation path, loaded from the `recommendation` config section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecommendSettings {
    pub default_max_distance_km: f64,
    pub default_max_time_hours: f64,
    pub candidate_limit: usize,
    pub recent_window_days: i64,
    pub history_limit: u32,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            default_max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            default_max_time_hours: DEFAULT_MAX_TIME_HOURS,
            candidate_limit: RECOMMENDATION_CANDIDATE_LIMIT,
            recent_window_days: RECENT_RECOMMENDATION_DAYS,
            history_limit: 20,
        }
    }
}

/// The body of `POST /api/recommend`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecommendRequest {
    pub lat: f64,
    pub lng: f64,
    /// One-way distance limit. 0 or absent means "use the default".
    #[serde(default)]
    pub max_distance_km: Option<f64>,
    /// One-way driving time limit in hours. 0 or absent means "use the default".
    #[serde(default)]
    pub max_time_hours: Option<f64>,
    #[serde(default, deserialize_with = "category_or_empty")]
    pub category: Option<Category>,
}

/// Accepts `""` as "no category" alongside `null` and a missing field.
fn category_or_empty<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A spot that passed the candidate filter, with its reachability figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub spot: Spot,
    pub distance_km: f64,
    pub driving_time_min: i64,
    pub round_trip_km: f64,
    pub round_trip_min: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendResponse {
    pub spots: Vec<Candidate>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_stats: Option<UserStats>,
}

/// The resolved limits the candidate filter applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFilter {
    pub max_distance_km: f64,
    pub max_time_hours: f64,
    pub category: Option<Category>,
}

impl CandidateFilter {
    /// Resolves request limits, falling back to stored preferences and then defaults.
    pub fn resolve(
        request: &RecommendRequest,
        preferences: &UserPreferences,
        settings: &RecommendSettings,
    ) -> Self {
        let pick = |requested: Option<f64>, preferred: Option<f64>, default: f64| {
            requested
                .filter(|v| *v != 0.0)
                .or(preferred.filter(|v| *v > 0.0))
                .unwrap_or(default)
        };
        Self {
            max_distance_km: pick(
                request.max_distance_km,
                preferences.max_distance_km,
                settings.default_max_distance_km,
            ),
            max_time_hours: pick(
                request.max_time_hours,
                preferences.max_duration_hours,
                settings.default_max_time_hours,
            ),
            category: request.category,
        }
    }
}

/// Keeps the spots reachable from the origin within the filter's limits.
///
/// Storage order is preserved. Visited spots are never candidates.
pub fn filter_candidates(
    spots: &[Spot],
    lat: f64,
    lng: f64,
    filter: &CandidateFilter,
    visited: &HashSet<i64>,
) -> Vec<Candidate> {
    spots
        .iter()
        .filter(|spot| !visited.contains(&spot.id))
        .filter_map(|spot| {
            let distance = haversine_km(lat, lng, spot.latitude, spot.longitude);
            if distance > filter.max_distance_km {
                return None;
            }
            if filter.category.is_some_and(|c| c != spot.category) {
                return None;
            }
            let driving_min = driving_minutes(distance, AVERAGE_SPEED_KMH);
            if driving_min as f64 / 60.0 > filter.max_time_hours {
                return None;
            }
            Some(Candidate {
                spot: spot.clone(),
                distance_km: round1(distance),
                driving_time_min: driving_min,
                round_trip_km: round1(distance * 2.0),
                round_trip_min: driving_min * 2,
            })
        })
        .collect()
}

/// What the planner knows about the user when picking spots.
#[derive(Debug, Clone, Copy)]
pub struct UserContext<'a> {
    pub history: &'a [VisitRecord],
    pub stats: Option<&'a UserStats>,
    pub preferences: &'a UserPreferences,
    /// Spots recommended to this user within the recent window.
    pub recent: &'a HashSet<i64>,
}

#[derive(Deserialize, Default)]
struct PlannerPicks {
    #[serde(default)]
    spot_ids: Vec<i64>,
    #[serde(default)]
    message: String,
}

fn join_labels(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join("、")
}

fn preference_context(user: &UserContext<'_>) -> String {
    let mut context = String::new();
    if let Some(category) = user.stats.and_then(|s| s.favorite_category) {
        let visits = user.stats.map(|s| s.total_visits).unwrap_or_default();
        context.push_str(&format!(
            "ユーザーの好み: {}を好む傾向があります（{}箇所訪問済み）\n",
            category.label(),
            visits
        ));
    }
    if !user.preferences.preferred_categories.is_empty() {
        context.push_str(&format!(
            "好きなカテゴリ: {}\n",
            join_labels(&user.preferences.preferred_categories)
        ));
    }
    if !user.preferences.avoided_categories.is_empty() {
        context.push_str(&format!(
            "避けたいカテゴリ: {}\n",
            join_labels(&user.preferences.avoided_categories)
        ));
    }
    context
}

fn history_context(history: &[VisitRecord]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut context = "ユーザーの訪問履歴:\n".to_string();
    for visit in history {
        let rating = match visit.rating {
            Some(r) => format!("{r}点"),
            None => "未評価".to_string(),
        };
        context.push_str(&format!(
            "- {} ({}): {}\n",
            visit.spot_name, visit.spot_category, rating
        ));
    }
    context
}

fn candidate_list(candidates: &[Candidate], recent: &HashSet<i64>, limit: usize) -> String {
    candidates
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, c)| {
            let tag = if recent.contains(&c.spot.id) {
                " [最近おすすめ済み]"
            } else {
                ""
            };
            format!(
                "{}. [ID:{}] {} ({}) - {:.1}km/片道{}分 - {}{}\n",
                i + 1,
                c.spot.id,
                c.spot.name,
                c.spot.category,
                c.distance_km,
                c.driving_time_min,
                c.spot.description.as_deref().unwrap_or_default(),
                tag
            )
        })
        .collect()
}

/// Builds the user prompt for the recommendation task.
pub fn build_recommendation_prompt(
    template: &str,
    candidates: &[Candidate],
    user: &UserContext<'_>,
    candidate_limit: usize,
) -> String {
    template
        .replace("{preference_context}", &preference_context(user))
        .replace("{history_context}", &history_context(user.history))
        .replace(
            "{candidate_list}",
            &candidate_list(candidates, user.recent, candidate_limit),
        )
}

/// Asks the planner to pick from `candidates` and applies the fill-up policy.
///
/// Returns the chosen candidates and the message to show. A failed model call
/// is logged and handled like an empty answer.
pub async fn select_recommendations(
    ai_provider: &dyn AiProvider,
    prompt: &TaskPrompt,
    candidates: &[Candidate],
    user: &UserContext<'_>,
    candidate_limit: usize,
) -> (Vec<Candidate>, String) {
    let user_prompt =
        build_recommendation_prompt(&prompt.user_prompt, candidates, user, candidate_limit);
    debug!(system_prompt = %prompt.system_prompt, user_prompt = %user_prompt, "--> Sending recommendation prompt to AI provider");

    let picks = match ai_provider
        .generate(&prompt.system_prompt, &user_prompt, prompt.max_tokens)
        .await
    {
        Ok(reply) => {
            debug!("<-- Recommendation reply: {}", reply);
            parse_embedded::<PlannerPicks>(&reply).unwrap_or_default()
        }
        Err(e) => {
            error!(error = %e, "Recommendation request to AI provider failed");
            PlannerPicks::default()
        }
    };

    let mut chosen: Vec<Candidate> = Vec::new();
    let mut seen = HashSet::new();
    for id in picks.spot_ids {
        if !seen.insert(id) {
            continue;
        }
        if let Some(candidate) = candidates.iter().find(|c| c.spot.id == id) {
            chosen.push(candidate.clone());
        }
    }

    let mut message = picks.message;
    if chosen.len() < MIN_RECOMMENDATIONS {
        info!(
            valid_picks = chosen.len(),
            "Too few planner picks, filling up from candidates."
        );
        for candidate in candidates {
            if chosen.len() >= MAX_FALLBACK_RECOMMENDATIONS {
                break;
            }
            if seen.contains(&candidate.spot.id) || user.recent.contains(&candidate.spot.id) {
                continue;
            }
            seen.insert(candidate.spot.id);
            chosen.push(candidate.clone());
        }
        if message.is_empty() {
            message = FALLBACK_RECOMMENDATION_MESSAGE.to_string();
        }
    }

    (chosen, message)
}

/// Runs a full recommendation for a user and records what was recommended.
///
/// The caller is expected to have registered the user with `touch_user`.
pub async fn recommend(
    db: &SqliteProvider,
    ai_provider: &dyn AiProvider,
    prompt: &TaskPrompt,
    settings: &RecommendSettings,
    user_id: &str,
    request: &RecommendRequest,
) -> Result<RecommendResponse, SpotError> {
    let visited = db.visited_spot_ids(user_id).await?;
    let recent = db
        .recent_recommendation_ids(user_id, settings.recent_window_days)
        .await?;
    let stats = db.user_stats(user_id).await?;
    let stats = (stats.total_visits > 0).then_some(stats);
    let preferences = db.get_preferences(user_id).await?;
    let history = db.visit_history(user_id, settings.history_limit).await?;
    let spots = db.list_spots().await?;

    let filter = CandidateFilter::resolve(request, &preferences, settings);
    let candidates = filter_candidates(&spots, request.lat, request.lng, &filter, &visited);
    info!(
        user_id = %user_id,
        candidates = candidates.len(),
        max_distance_km = filter.max_distance_km,
        max_time_hours = filter.max_time_hours,
        "Filtered recommendation candidates."
    );

    if candidates.is_empty() {
        return Ok(RecommendResponse {
            spots: Vec::new(),
            message: NO_MATCHING_SPOTS_MESSAGE.to_string(),
            user_stats: stats,
        });
    }

    let user = UserContext {
        history: &history,
        stats: stats.as_ref(),
        preferences: &preferences,
        recent: &recent,
    };
    let (chosen, message) =
        select_recommendations(ai_provider, prompt, &candidates, &user, settings.candidate_limit)
            .await;

    for candidate in &chosen {
        db.add_recommendation(user_id, candidate.spot.id).await?;
    }

    Ok(RecommendResponse {
        spots: chosen,
        message,
        user_stats: stats,
    })
}
