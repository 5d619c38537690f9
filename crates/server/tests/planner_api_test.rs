//! # Recommendation and Route API Tests
//!
//! The LLM is an `httpmock` server speaking the OpenAI chat format.

mod common;

use anyhow::Result;
use common::{chat_reply, TestApp, CHAT_PATH};
use drivespot::{constants::*, Category};
use drivespot_test_utils::{spot_north, ORIGIN};
use httpmock::Method::POST;
use reqwest::StatusCode;
use serde_json::{json, Value};

const SEEDED_ROUTE: &str = "route:\n  random_seed: 42\n";

fn recommend_body() -> Value {
    json!({"lat": ORIGIN.0, "lng": ORIGIN.1, "max_distance_km": 100, "max_time_hours": 3})
}

#[tokio::test]
async fn test_recommend_filters_by_distance_and_follows_model() -> Result<()> {
    let app = TestApp::spawn().await?;
    let spots = app
        .seed_spots(vec![
            spot_north("近い展望台", Category::Drive, 10.0),
            spot_north("湖畔", Category::Drive, 50.0),
            spot_north("遠い岬", Category::Drive, 120.0),
        ])
        .await?;
    let (near, lake) = (spots[0].id, spots[1].id);

    let reply = json!({"spot_ids": [lake, near, 9999], "message": "湖と展望台をどうぞ。"}).to_string();
    let mut llm = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(CHAT_PATH)
            .body_contains("近い展望台")
            .body_contains("湖畔");
        then.status(200)
            .json_body(chat_reply(&format!("おすすめです。\n{reply}")));
    });

    let response = app
        .client
        .post(app.url("/api/recommend"))
        .json(&recommend_body())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    llm.assert();

    let ids: Vec<i64> = body["spots"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![lake, near]);
    assert_eq!(body["message"], "湖と展望台をどうぞ。");
    assert_eq!(body["spots"][1]["distance_km"], 10.0);
    assert_eq!(body["spots"][1]["driving_time_min"], 15);
    assert_eq!(body["spots"][1]["round_trip_km"], 20.0);
    assert_eq!(body["spots"][1]["round_trip_min"], 30);
    assert!(body.get("user_stats").is_none());

    // Both spots were recorded, so the next prompt marks them.
    llm.delete();
    let marked = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(CHAT_PATH)
            .body_contains("[最近おすすめ済み]");
        then.status(200).json_body(chat_reply(&reply));
    });
    let again = app
        .client
        .post(app.url("/api/recommend"))
        .json(&recommend_body())
        .send()
        .await?;
    assert_eq!(again.status(), StatusCode::OK);
    marked.assert();
    Ok(())
}

#[tokio::test]
async fn test_recommend_without_candidates_skips_model() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.seed_spots(vec![spot_north("遠い岬", Category::Drive, 120.0)])
        .await?;
    let llm = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(200).json_body(chat_reply("{}"));
    });

    let body: Value = app
        .client
        .post(app.url("/api/recommend"))
        .json(&recommend_body())
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["spots"], json!([]));
    assert_eq!(body["message"], NO_MATCHING_SPOTS_MESSAGE);
    llm.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_recommend_falls_back_when_model_fails() -> Result<()> {
    let app = TestApp::spawn().await?;
    let spots = app
        .seed_spots(vec![
            spot_north("a", Category::Drive, 5.0),
            spot_north("b", Category::Restaurant, 6.0),
        ])
        .await?;
    app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(500).body("upstream exploded");
    });

    let response = app
        .client
        .post(app.url("/api/recommend"))
        .json(&recommend_body())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;

    let ids: Vec<i64> = body["spots"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![spots[0].id, spots[1].id]);
    assert_eq!(body["message"], FALLBACK_RECOMMENDATION_MESSAGE);
    Ok(())
}

#[tokio::test]
async fn test_recommend_rejects_bad_body() -> Result<()> {
    let app = TestApp::spawn().await?;
    let response = app
        .client
        .post(app.url("/api/recommend"))
        .json(&json!({"lat": "north", "lng": 139.0}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bad_category = app
        .client
        .post(app.url("/api/recommend"))
        .json(&json!({"lat": 35.0, "lng": 139.0, "category": "onsen"}))
        .send()
        .await?;
    assert_eq!(bad_category.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_route_from_ten_to_six() -> Result<()> {
    let app = TestApp::spawn_with_config(SEEDED_ROUTE).await?;
    let spots = app
        .seed_spots(vec![
            spot_north("近い展望台", Category::Drive, 10.0),
            spot_north("湖畔", Category::Drive, 50.0),
            spot_north("遠すぎる峠", Category::Drive, 60.0),
        ])
        .await?;
    let (near, lake) = (spots[0].id, spots[1].id);

    let reply = json!({
        "route_ids": [near, lake],
        "stay_durations": [30, 45],
        "message": "北へ向かう周遊ルートです。"
    })
    .to_string();
    let llm = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(CHAT_PATH)
            .body_contains("出発時刻: 10:00")
            .body_contains("使える時間: 約8.0時間")
            .body_contains("湖畔");
        then.status(200).json_body(chat_reply(&reply));
    });

    let response = app
        .client
        .post(app.url("/api/route"))
        .json(&json!({
            "lat": ORIGIN.0, "lng": ORIGIN.1,
            "departure_time": "10:00", "return_time": "18:00",
            "include_restaurant": true, "include_rest": true
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    llm.assert();

    let stops = body["stops"].as_array().unwrap();
    let kinds: Vec<&str> = stops.iter().filter_map(|s| s["category"].as_str()).collect();
    assert_eq!(kinds, vec!["start", "drive", "drive", "end"]);
    assert_eq!(stops[1]["id"], near);
    assert_eq!(stops[1]["arrival_time"], "10:15");
    assert_eq!(stops[1]["stay_duration"], 30);
    assert_eq!(stops[2]["id"], lake);
    assert_eq!(stops[2]["distance_from_prev"], 40.0);
    assert_eq!(stops[2]["arrival_time"], "11:45");
    assert_eq!(stops[3]["arrival_time"], "13:45");
    assert_eq!(body["total_distance_km"], 100.0);
    assert_eq!(body["total_time_min"], 225.0);
    assert_eq!(body["departure_time"], "10:00");
    assert_eq!(body["estimated_return"], "13:45");
    assert_eq!(body["message"], "北へ向かう周遊ルートです。");

    let history: Vec<Value> = app
        .client
        .get(app.url("/api/routes/history"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["spot_ids"], json!([near, lake]));
    Ok(())
}

#[tokio::test]
async fn test_route_prompt_lists_recent_fingerprints() -> Result<()> {
    let app = TestApp::spawn_with_config(SEEDED_ROUTE).await?;
    let spots = app
        .seed_spots(vec![spot_north("展望台", Category::Drive, 10.0)])
        .await?;
    let reply = json!({"route_ids": [spots[0].id], "stay_durations": [40], "message": "短いルート。"})
        .to_string();

    let mut first = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(200).json_body(chat_reply(&reply));
    });
    app.client
        .post(app.url("/api/route"))
        .json(&json!({"lat": ORIGIN.0, "lng": ORIGIN.1}))
        .send()
        .await?
        .error_for_status()?;
    first.assert();
    first.delete();

    let second = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(CHAT_PATH)
            .body_contains("最近提案したルート");
        then.status(200).json_body(chat_reply(&reply));
    });
    app.client
        .post(app.url("/api/route"))
        .json(&json!({"lat": ORIGIN.0, "lng": ORIGIN.1}))
        .send()
        .await?
        .error_for_status()?;
    second.assert();
    Ok(())
}

#[tokio::test]
async fn test_route_without_drive_spots() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.seed_spots(vec![spot_north("食堂", Category::Restaurant, 5.0)])
        .await?;
    let llm = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(200).json_body(chat_reply("{}"));
    });

    let body: Value = app
        .client
        .post(app.url("/api/route"))
        .json(&json!({"lat": ORIGIN.0, "lng": ORIGIN.1, "include_restaurant": true}))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["stops"], json!([]));
    assert_eq!(body["message"], NO_DRIVE_SPOTS_MESSAGE);
    llm.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_route_rejects_out_of_range_times() -> Result<()> {
    let app = TestApp::spawn().await?;
    let llm = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(200).json_body(chat_reply("{}"));
    });

    for (departure, return_time) in [("-1:00", "18:00"), ("10:00", "10:-30"), ("25:00", "18:00")] {
        let response = app
            .client
            .post(app.url("/api/route"))
            .json(&json!({
                "lat": ORIGIN.0, "lng": ORIGIN.1,
                "departure_time": departure, "return_time": return_time
            }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{departure} -> {return_time}");
        assert!(response.text().await?.contains("invalid time of day"));
    }
    llm.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_route_falls_back_to_single_spot_when_model_fails() -> Result<()> {
    let app = TestApp::spawn_with_config(SEEDED_ROUTE).await?;
    let spots = app
        .seed_spots(vec![spot_north("展望台", Category::Drive, 10.0)])
        .await?;
    app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(200).json_body(chat_reply("ルートは思いつきませんでした"));
    });

    let body: Value = app
        .client
        .post(app.url("/api/route"))
        .json(&json!({"lat": ORIGIN.0, "lng": ORIGIN.1}))
        .send()
        .await?
        .json()
        .await?;

    let stops = body["stops"].as_array().unwrap();
    assert_eq!(stops.len(), 3);
    assert_eq!(stops[1]["id"], spots[0].id);
    assert_eq!(stops[1]["stay_duration"], 40);
    assert_eq!(body["total_distance_km"], 20.0);
    assert_eq!(body["message"], FALLBACK_ROUTE_MESSAGE);
    Ok(())
}
