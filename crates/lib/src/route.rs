//! # Route Builder
//!
//! Plans a round trip from the user's position: a time budget caps how far
//! a single leg may go, reachable spots are bucketed by category and shuffled,
//! and the planner model proposes an order and stay durations. The reply is
//! replayed against the real coordinates to compute legs and clock times, so
//! every number in the response comes from this module rather than the model.
//!
//! Randomness is injected through [`rand::Rng`]. Use [`route_rng`] to obtain a
//! generator that is reproducible when a seed is configured.

use crate::{
    categories::Category,
    constants::{
        AVERAGE_SPEED_KMH, CURRENT_LOCATION_NAME, DEFAULT_AVAILABLE_HOURS, DEFAULT_DEPARTURE_TIME,
        DRIVING_TIME_SHARE, FALLBACK_ROUTE_MESSAGE, FALLBACK_STAY_MIN, NO_DRIVE_SPOTS_MESSAGE,
        RECENT_ROUTE_LIMIT, ROUTE_LEG_DIVISOR,
    },
    errors::SpotError,
    extract::parse_embedded,
    geo::{
        check_clock, driving_minutes, haversine_km, minutes_to_clock, parse_time_to_minutes, round1,
        route_fingerprint,
    },
    prompts::TaskPrompt,
    providers::{ai::AiProvider, db::sqlite::SqliteProvider},
    types::Spot,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Tunables for the route path, loaded from the `route` config section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouteSettings {
    /// Fixed seed for shuffling and fallback picks. Unset means a fresh seed per request.
    pub random_seed: Option<u64>,
    pub recent_route_limit: usize,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            random_seed: None,
            recent_route_limit: RECENT_ROUTE_LIMIT,
        }
    }
}

/// Returns the generator used for one route request.
pub fn route_rng(seed: Option<u64>) -> ChaCha8Rng {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    ChaCha8Rng::seed_from_u64(seed)
}

/// The body of `POST /api/route`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RouteRequest {
    pub lat: f64,
    pub lng: f64,
    /// `HH:MM`. Empty or absent means 10:00.
    #[serde(default)]
    pub departure_time: String,
    /// `HH:MM`. Ignored unless later than the departure.
    #[serde(default)]
    pub return_time: Option<String>,
    #[serde(default)]
    pub include_restaurant: bool,
    #[serde(default)]
    pub include_rest: bool,
}

impl RouteRequest {
    pub fn departure(&self) -> &str {
        if self.departure_time.is_empty() {
            DEFAULT_DEPARTURE_TIME
        } else {
            &self.departure_time
        }
    }

    /// Rejects departure or return times with out-of-range hours or minutes.
    pub fn validate(&self) -> Result<(), SpotError> {
        check_clock(self.departure())?;
        if let Some(return_time) = &self.return_time {
            check_clock(return_time)?;
        }
        Ok(())
    }
}

/// What a stop is: one of the synthetic endpoints or a real spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Start,
    End,
    Drive,
    Restaurant,
    Rest,
}

impl From<Category> for StopKind {
    fn from(category: Category) -> Self {
        match category {
            Category::Drive => StopKind::Drive,
            Category::Restaurant => StopKind::Restaurant,
            Category::Rest => StopKind::Rest,
        }
    }
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    /// 0 for the synthetic start and end stops.
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub category: StopKind,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub distance_from_prev: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arrival_time: String,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub stay_duration: i64,
}

impl RouteStop {
    fn endpoint(kind: StopKind, lat: f64, lng: f64, distance_from_prev: f64, clock: i64) -> Self {
        Self {
            id: 0,
            name: CURRENT_LOCATION_NAME.to_string(),
            description: String::new(),
            category: kind,
            lat,
            lng,
            distance_from_prev,
            arrival_time: minutes_to_clock(clock),
            stay_duration: 0,
        }
    }

    fn at_spot(spot: &Spot, distance_from_prev: f64, clock: i64, stay: i64) -> Self {
        Self {
            id: spot.id,
            name: spot.name.clone(),
            description: spot.description.clone().unwrap_or_default(),
            category: spot.category.into(),
            lat: spot.latitude,
            lng: spot.longitude,
            distance_from_prev,
            arrival_time: minutes_to_clock(clock),
            stay_duration: stay,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub stops: Vec<RouteStop>,
    pub total_distance_km: f64,
    pub total_time_min: f64,
    pub departure_time: String,
    pub estimated_return: String,
    pub message: String,
}

impl RouteResponse {
    /// The IDs of the real spots on the route, in visiting order.
    pub fn spot_ids(&self) -> Vec<i64> {
        self.stops.iter().map(|s| s.id).filter(|id| *id > 0).collect()
    }
}

/// The time budget of a trip and the distances derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBudget {
    pub departure_min: i64,
    pub available_hours: f64,
    pub max_round_trip_km: f64,
    pub max_leg_km: f64,
}

impl TimeBudget {
    pub fn new(departure: &str, return_time: Option<&str>) -> Self {
        let departure_min = parse_time_to_minutes(departure);
        let available_hours = return_time
            .filter(|t| !t.is_empty())
            .map(parse_time_to_minutes)
            .filter(|ret| *ret > departure_min)
            .map(|ret| (ret - departure_min) as f64 / 60.0)
            .unwrap_or(DEFAULT_AVAILABLE_HOURS);
        let max_round_trip_km = available_hours * AVERAGE_SPEED_KMH * DRIVING_TIME_SHARE;
        Self {
            departure_min,
            available_hours,
            max_round_trip_km,
            max_leg_km: max_round_trip_km / ROUTE_LEG_DIVISOR,
        }
    }
}

/// Reachable spots bucketed by category, each bucket shuffled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteCandidates {
    pub drive: Vec<Spot>,
    pub restaurant: Vec<Spot>,
    pub rest: Vec<Spot>,
}

impl RouteCandidates {
    fn bucket(&self, category: Category) -> &[Spot] {
        match category {
            Category::Drive => &self.drive,
            Category::Restaurant => &self.restaurant,
            Category::Rest => &self.rest,
        }
    }

    fn find(&self, id: i64) -> Option<&Spot> {
        self.drive
            .iter()
            .chain(&self.restaurant)
            .chain(&self.rest)
            .find(|s| s.id == id)
    }
}

/// Buckets the spots within `max_leg_km` of the origin and shuffles each bucket.
pub fn partition_candidates<R: Rng>(
    spots: &[Spot],
    lat: f64,
    lng: f64,
    max_leg_km: f64,
    include_restaurant: bool,
    include_rest: bool,
    rng: &mut R,
) -> RouteCandidates {
    let mut candidates = RouteCandidates::default();
    for spot in spots {
        if haversine_km(lat, lng, spot.latitude, spot.longitude) > max_leg_km {
            continue;
        }
        match spot.category {
            Category::Drive => candidates.drive.push(spot.clone()),
            Category::Restaurant if include_restaurant => candidates.restaurant.push(spot.clone()),
            Category::Rest if include_rest => candidates.rest.push(spot.clone()),
            _ => {}
        }
    }
    candidates.drive.shuffle(rng);
    candidates.restaurant.shuffle(rng);
    candidates.rest.shuffle(rng);
    candidates
}

fn route_candidate_list(candidates: &RouteCandidates, lat: f64, lng: f64) -> String {
    let mut sections = Vec::new();
    for category in Category::ALL {
        let bucket = candidates.bucket(category);
        // The drive section is always present; the others only when offered.
        if bucket.is_empty() && category != Category::Drive {
            continue;
        }
        let info = category.info();
        let mut section = format!("{}:\n", info.route_heading);
        for spot in bucket.iter().take(info.route_candidate_cap) {
            let distance = haversine_km(lat, lng, spot.latitude, spot.longitude);
            section.push_str(&format!(
                "  [ID:{}] {} ({:.1}km) - {}\n",
                spot.id,
                spot.name,
                distance,
                spot.description.as_deref().unwrap_or_default()
            ));
        }
        sections.push(section);
    }
    sections.join("\n")
}

fn avoid_hint(recent_hashes: &[String]) -> String {
    if recent_hashes.is_empty() {
        return String::new();
    }
    format!(
        "\n※最近提案したルートと同じ組み合わせは避けてください。\n最近提案したルート: {}\n",
        recent_hashes.join(", ")
    )
}

/// The inputs the route prompt is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct RoutePromptInput<'a> {
    pub lat: f64,
    pub lng: f64,
    pub departure_time: &'a str,
    pub available_hours: f64,
    pub random_seed: u32,
    pub recent_hashes: &'a [String],
    pub candidates: &'a RouteCandidates,
}

/// Builds the user prompt for the route planning task.
pub fn build_route_prompt(template: &str, input: &RoutePromptInput<'_>) -> String {
    template
        .replace("{lat}", &format!("{:.4}", input.lat))
        .replace("{lng}", &format!("{:.4}", input.lng))
        .replace("{departure_time}", input.departure_time)
        .replace("{available_hours}", &format!("{:.1}", input.available_hours))
        .replace("{random_seed}", &input.random_seed.to_string())
        .replace("{avoid_hint}", &avoid_hint(input.recent_hashes))
        .replace(
            "{candidate_list}",
            &route_candidate_list(input.candidates, input.lat, input.lng),
        )
}

/// The planner's proposal: spot IDs in visiting order and matching stays.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoutePlan {
    #[serde(default)]
    pub route_ids: Vec<i64>,
    #[serde(default)]
    pub stay_durations: Vec<i64>,
    #[serde(default)]
    pub message: String,
}

/// Replays a plan against the candidates and computes legs and clock times.
///
/// IDs that are not among the candidates, and repeats of an ID already
/// visited, are skipped; the stay list is still indexed by the ID's original
/// position. When nothing usable remains, a
/// single random drive spot is visited instead.
pub fn assemble_route<R: Rng>(
    lat: f64,
    lng: f64,
    departure_time: &str,
    budget: &TimeBudget,
    plan: RoutePlan,
    candidates: &RouteCandidates,
    rng: &mut R,
) -> RouteResponse {
    let mut clock = budget.departure_min;
    let mut total_km = 0.0;
    let mut stops = vec![RouteStop::endpoint(StopKind::Start, lat, lng, 0.0, clock)];
    let (mut prev_lat, mut prev_lng) = (lat, lng);
    let mut visited = HashSet::new();

    for (i, id) in plan.route_ids.iter().enumerate() {
        let Some(spot) = candidates.find(*id) else {
            warn!(spot_id = id, "Planner proposed a spot that is not a candidate, skipping.");
            continue;
        };
        if !visited.insert(spot.id) {
            debug!(spot_id = id, "Planner repeated a spot, skipping.");
            continue;
        }
        let leg = haversine_km(prev_lat, prev_lng, spot.latitude, spot.longitude);
        total_km += leg;
        clock += driving_minutes(leg, AVERAGE_SPEED_KMH);
        let stay = plan
            .stay_durations
            .get(i)
            .copied()
            .filter(|s| *s > 0)
            .unwrap_or(spot.category.info().default_stay_min);
        stops.push(RouteStop::at_spot(spot, round1(leg), clock, stay));
        clock += stay;
        prev_lat = spot.latitude;
        prev_lng = spot.longitude;
    }

    let message = plan.message;

    if stops.len() == 1 && !candidates.drive.is_empty() {
        let spot = &candidates.drive[rng.random_range(0..candidates.drive.len())];
        info!(spot_id = spot.id, "No usable planner route, falling back to a single drive spot.");
        let distance = haversine_km(lat, lng, spot.latitude, spot.longitude);
        let travel = driving_minutes(distance, AVERAGE_SPEED_KMH);
        let arrival = budget.departure_min + travel;
        let back = arrival + FALLBACK_STAY_MIN + travel;
        let stops = vec![
            RouteStop::endpoint(StopKind::Start, lat, lng, 0.0, budget.departure_min),
            RouteStop::at_spot(spot, round1(distance), arrival, FALLBACK_STAY_MIN),
            RouteStop::endpoint(StopKind::End, lat, lng, round1(distance), back),
        ];
        return RouteResponse {
            stops,
            total_distance_km: round1(distance * 2.0),
            total_time_min: (back - budget.departure_min) as f64,
            departure_time: departure_time.to_string(),
            estimated_return: minutes_to_clock(back),
            message: FALLBACK_ROUTE_MESSAGE.to_string(),
        };
    }

    let return_leg = haversine_km(prev_lat, prev_lng, lat, lng);
    total_km += return_leg;
    clock += driving_minutes(return_leg, AVERAGE_SPEED_KMH);
    stops.push(RouteStop::endpoint(StopKind::End, lat, lng, round1(return_leg), clock));

    RouteResponse {
        stops,
        total_distance_km: round1(total_km),
        total_time_min: ((clock - budget.departure_min) as f64).round(),
        departure_time: departure_time.to_string(),
        estimated_return: minutes_to_clock(clock),
        message,
    }
}

/// Plans a route for a user and records its fingerprint.
///
/// The caller is expected to have registered the user with `touch_user`.
pub async fn plan_route<R: Rng>(
    db: &SqliteProvider,
    ai_provider: &dyn AiProvider,
    prompt: &TaskPrompt,
    settings: &RouteSettings,
    user_id: &str,
    request: &RouteRequest,
    rng: &mut R,
) -> Result<RouteResponse, SpotError> {
    request.validate()?;
    let departure = request.departure();
    let budget = TimeBudget::new(departure, request.return_time.as_deref());
    let recent_hashes = db
        .recent_route_hashes(user_id, settings.recent_route_limit)
        .await?;
    let spots = db.list_spots().await?;

    let candidates = partition_candidates(
        &spots,
        request.lat,
        request.lng,
        budget.max_leg_km,
        request.include_restaurant,
        request.include_rest,
        rng,
    );
    info!(
        user_id = %user_id,
        available_hours = budget.available_hours,
        max_leg_km = budget.max_leg_km,
        drive = candidates.drive.len(),
        restaurant = candidates.restaurant.len(),
        rest = candidates.rest.len(),
        "Partitioned route candidates."
    );

    if candidates.drive.is_empty() {
        return Ok(RouteResponse {
            departure_time: departure.to_string(),
            message: NO_DRIVE_SPOTS_MESSAGE.to_string(),
            ..Default::default()
        });
    }

    let random_seed = rng.random_range(0..1000);
    let user_prompt = build_route_prompt(
        &prompt.user_prompt,
        &RoutePromptInput {
            lat: request.lat,
            lng: request.lng,
            departure_time: departure,
            available_hours: budget.available_hours,
            random_seed,
            recent_hashes: &recent_hashes,
            candidates: &candidates,
        },
    );
    debug!(system_prompt = %prompt.system_prompt, user_prompt = %user_prompt, "--> Sending route prompt to AI provider");

    let plan = match ai_provider
        .generate(&prompt.system_prompt, &user_prompt, prompt.max_tokens)
        .await
    {
        Ok(reply) => {
            debug!("<-- Route reply: {}", reply);
            parse_embedded::<RoutePlan>(&reply).unwrap_or_default()
        }
        Err(e) => {
            error!(error = %e, "Route request to AI provider failed");
            RoutePlan::default()
        }
    };

    let route = assemble_route(
        request.lat,
        request.lng,
        departure,
        &budget,
        plan,
        &candidates,
        rng,
    );

    if route.stops.len() > 2 {
        let ids = route.spot_ids();
        if !ids.is_empty() {
            db.add_route_history(user_id, &route_fingerprint(&ids), &ids)
                .await?;
        }
    }

    Ok(route)
}
