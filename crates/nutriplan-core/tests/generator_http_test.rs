//! HTTP plan generators against a mock collaborator.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nutriplan_core::continuation::StartState;
use nutriplan_core::generator::{
    AgentQueryGenerator, GenerationError, GenerationRequest, HttpPlanGenerator, PlanGenerator,
};
use nutriplan_core::nutrition::targets::compute_targets;
use nutriplan_core::profile::{CompleteProfile, require_complete};
use nutriplan_test_utils::sample_profile;

const TIMEOUT: Duration = Duration::from_secs(5);

fn profile() -> CompleteProfile {
    require_complete(&sample_profile("user-1")).unwrap()
}

fn week_json(n: i32, start: f64, end: f64) -> serde_json::Value {
    json!({
        "week": n,
        "plan": format!("Week {n}\n📅 Day 1:\n- oats"),
        "totals": {"kcal": 14000.0, "protein": 1050.0, "carbs": 1400.0, "fat": 420.0},
        "start_weight": start,
        "end_weight": end
    })
}

#[tokio::test]
async fn structured_first_batch_omits_start_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/plans/user-1/generate"))
        .and(body_json(json!({"tenure_months": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weeks": [week_json(1, 80.0, 79.5), week_json(2, 79.5, 79.0)],
            "summary": {"total_kcal": 28000.0, "analysis": "on track"},
            "end_state": {"weight": 79.0, "week_offset": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = HttpPlanGenerator::new(&server.uri(), TIMEOUT).unwrap();
    let request = GenerationRequest {
        tenure_months: 4,
        start_state: None,
    };
    let response = generator.generate(&profile(), &request).await.unwrap();

    assert_eq!(response.weeks.len(), 2);
    assert_eq!(response.weeks[1].totals.protein_g, 1050.0);
    assert_eq!(response.summary.analysis_text.as_deref(), Some("on track"));
    assert_eq!(response.end_state.week_offset, 2);
    response
        .check_continuity(StartState {
            weight: 80.0,
            week_offset: 0,
        })
        .unwrap();
}

#[tokio::test]
async fn structured_continuation_sends_start_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/plans/user-1/generate"))
        .and(body_partial_json(
            json!({"start_state": {"weight": 78.0, "week_offset": 4}}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weeks": [week_json(5, 78.0, 77.5)],
            "summary": {},
            "end_state": {"weight": 77.5, "week_offset": 5}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = HttpPlanGenerator::new(&format!("{}/", server.uri()), TIMEOUT).unwrap();
    let request = GenerationRequest {
        tenure_months: 4,
        start_state: Some(StartState {
            weight: 78.0,
            week_offset: 4,
        }),
    };
    let response = generator.generate(&profile(), &request).await.unwrap();
    response.check_continuity(request.start_state.unwrap()).unwrap();
}

#[tokio::test]
async fn missing_targets_come_from_the_profile() {
    let server = MockServer::start().await;
    let mut reported = week_json(2, 79.5, 79.0);
    reported["tdee"] = json!(2600.0);
    reported["protein_goal"] = json!(150.0);
    Mock::given(method("POST"))
        .and(path("/plans/user-1/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weeks": [week_json(1, 80.0, 79.5), reported],
            "summary": {},
            "end_state": {"weight": 79.0, "week_offset": 2}
        })))
        .mount(&server)
        .await;

    let generator = HttpPlanGenerator::new(&server.uri(), TIMEOUT).unwrap();
    let request = GenerationRequest {
        tenure_months: 4,
        start_state: None,
    };
    let profile = profile();
    let response = generator.generate(&profile, &request).await.unwrap();

    let targets = compute_targets(&profile, profile.tenure_weeks()).targets;
    assert_eq!(response.weeks[0].tdee, targets.tdee);
    assert_eq!(response.weeks[0].protein_goal, targets.protein_g);
    assert_eq!(response.weeks[1].tdee, 2600.0);
    assert_eq!(response.weeks[1].protein_goal, 150.0);
}

#[tokio::test]
async fn structured_errors_are_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/plans/rejected/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "profile incomplete"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/plans/detail/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "agent crashed"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/plans/down/generate"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/plans/partial/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weeks": [week_json(1, 80.0, 79.5)],
            "summary": {}
        })))
        .mount(&server)
        .await;

    let generator = HttpPlanGenerator::new(&server.uri(), TIMEOUT).unwrap();
    let request = GenerationRequest {
        tenure_months: 4,
        start_state: None,
    };
    let for_user = |id: &str| CompleteProfile {
        user_id: id.to_owned(),
        ..profile()
    };

    match generator.generate(&for_user("rejected"), &request).await {
        Err(GenerationError::Rejected(message)) => assert_eq!(message, "profile incomplete"),
        other => panic!("unexpected result: {other:?}"),
    }
    match generator.generate(&for_user("detail"), &request).await {
        Err(GenerationError::Rejected(message)) => assert_eq!(message, "agent crashed"),
        other => panic!("unexpected result: {other:?}"),
    }
    match generator.generate(&for_user("down"), &request).await {
        Err(GenerationError::Status { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        generator.generate(&for_user("partial"), &request).await,
        Err(GenerationError::MissingField("end_state"))
    ));
}

#[tokio::test]
async fn unreachable_collaborator_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let generator = HttpPlanGenerator::new(&uri, TIMEOUT).unwrap();
    let request = GenerationRequest {
        tenure_months: 4,
        start_state: None,
    };
    assert!(matches!(
        generator.generate(&profile(), &request).await,
        Err(GenerationError::Transport(_))
    ));
}

#[tokio::test]
async fn agent_query_text_becomes_weeks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/query"))
        .and(body_json(json!({
            "user_id": "user-1",
            "query": "Generate my meal plan for weeks 5-8 based on my goal to cut from weight 80 to 72 over 4 months"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Here is your plan.\n\nWeek 1\n📅 Day 1:\nMonday oats\n\
                         Total: 2000.0 kcal, 150.0g protein, 200.0g carbs, 60.0g fat\n\n\
                         Week 2\n📅 Day 1:\nMonday dal"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = AgentQueryGenerator::new(&server.uri(), TIMEOUT).unwrap();
    let request = GenerationRequest {
        tenure_months: 4,
        start_state: Some(StartState {
            weight: 78.0,
            week_offset: 4,
        }),
    };
    let response = generator.generate(&profile(), &request).await.unwrap();

    // The introduction line is dropped; the two marked weeks become 5 and 6.
    let numbers: Vec<i32> = response.weeks.iter().map(|w| w.week_number).collect();
    assert_eq!(numbers, vec![5, 6]);
    assert_eq!(response.weeks[0].totals.kcal, 2000.0);
    assert!(response.weeks[0].plan_text.starts_with("Week 1"));
    assert_eq!(response.weeks[0].start_weight_kg, 78.0);
    assert_eq!(response.end_state.week_offset, 6);
    assert!(response.summary.analysis_text.is_some());
    response.check_continuity(request.start_state.unwrap()).unwrap();
}

#[tokio::test]
async fn agent_reply_without_response_is_missing_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let generator = AgentQueryGenerator::new(&server.uri(), TIMEOUT).unwrap();
    let request = GenerationRequest {
        tenure_months: 4,
        start_state: None,
    };
    assert!(matches!(
        generator.generate(&profile(), &request).await,
        Err(GenerationError::MissingField("response"))
    ));
}
