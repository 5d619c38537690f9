//! # Prompt Override Test
//!
//! Prompts set in `config.yml` replace the built-in defaults for a task.

mod common;

use anyhow::Result;
use common::{chat_reply, TestApp, CHAT_PATH};
use drivespot::Category;
use drivespot_test_utils::{spot_north, ORIGIN};
use httpmock::Method::POST;
use serde_json::{json, Value};

#[tokio::test]
async fn test_yaml_overrides_default_prompts() -> Result<()> {
    let app = TestApp::spawn_with_config(
        r#"
tasks:
  spot_recommendation:
    system_prompt: "You are a tour guide for drivers."
    user_prompt: "Pick from these spots: {candidate_list}"
    max_tokens: 123
"#,
    )
    .await?;
    let spots = app
        .seed_spots(vec![spot_north("展望台", Category::Drive, 5.0)])
        .await?;

    let llm = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(CHAT_PATH)
            .body_contains("You are a tour guide for drivers.")
            .body_contains("Pick from these spots: 1. [ID:")
            .body_contains("\"max_tokens\":123");
        then.status(200).json_body(chat_reply(
            &json!({"spot_ids": [spots[0].id], "message": "Enjoy the view."}).to_string(),
        ));
    });

    let body: Value = app
        .client
        .post(app.url("/api/recommend"))
        .json(&json!({"lat": ORIGIN.0, "lng": ORIGIN.1}))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    llm.assert();
    assert_eq!(body["message"], "Enjoy the view.");
    Ok(())
}
