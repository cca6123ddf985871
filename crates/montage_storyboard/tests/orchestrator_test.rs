//! Tests for the storyboard orchestrator using a scripted planner.

use async_trait::async_trait;
use montage_core::{ArtifactRef, RetryConfig, StoryboardConfig};
use montage_error::{
    CollaboratorError, CollaboratorErrorKind, MontageErrorKind, MontageResult, PlanningErrorKind,
};
use montage_interface::{NarrativePlanner, PlannerResponse, PlanningRequest};
use montage_retry::RetryPolicy;
use montage_storyboard::StoryboardOrchestrator;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Planner that replays scripted answers and records every request.
struct ScriptedPlanner {
    answers: Mutex<VecDeque<MontageResult<PlannerResponse>>>,
    requests: Mutex<Vec<PlanningRequest>>,
}

impl ScriptedPlanner {
    fn new(answers: Vec<MontageResult<PlannerResponse>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<PlanningRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativePlanner for ScriptedPlanner {
    async fn plan(&self, request: &PlanningRequest) -> MontageResult<PlannerResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.answers.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(CollaboratorError::new(CollaboratorErrorKind::Unavailable(
                "script exhausted".to_string(),
            ))
            .into())
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

const SUBJECT: &str = "A matte black trail shoe with a neon green sole and reflective heel tab";

fn storyboard(count: usize, with_subject_text: bool) -> PlannerResponse {
    let scenes: Vec<_> = (1..=count)
        .map(|n| {
            let prompt = if with_subject_text {
                format!("{SUBJECT} splashes through a creek, shot {n}")
            } else {
                format!("The shoe splashes through a creek, shot {n}")
            };
            let presence = if n == 1 { "none" } else { "full" };
            json!({
                "scene_number": n,
                "narrative_stage": "build",
                "detailed_prompt": prompt,
                "subject_presence": presence,
                "duration_seconds": 6,
                "transition_to_next": "cut",
                "text_overlay": null
            })
        })
        .collect();
    let body = json!({
        "consistency_markers": {
            "style": "handheld documentary",
            "color_palette": "forest greens",
            "lighting": "overcast",
            "mood": "gritty"
        },
        "subject_description": SUBJECT,
        "scenes": scenes
    });
    PlannerResponse::new(format!("Here you go:\n```json\n{body}\n```"), 0.01)
}

fn orchestrator(planner: Arc<ScriptedPlanner>) -> StoryboardOrchestrator {
    let retry = RetryPolicy::new(
        RetryConfig::default()
            .with_max_attempts(2u32)
            .with_initial_backoff_ms(1u64)
            .with_max_delay_ms(2u64)
            .with_jitter(false),
    );
    StoryboardOrchestrator::new(planner, StoryboardConfig::default(), retry)
}

#[tokio::test]
async fn test_sixty_seconds_requests_eight_scenes() {
    let planner = ScriptedPlanner::new(vec![Ok(storyboard(8, true))]);
    let outcome = orchestrator(planner.clone())
        .plan("Trail shoes that grip anything", None, Some(60))
        .await
        .unwrap();

    assert_eq!(*planner.requests()[0].scene_count(), 8);
    assert_eq!(outcome.plan().len(), 8);
    assert_eq!(*outcome.required_scenes(), 8);
    assert!(!outcome.used_fallback());
}

#[tokio::test]
async fn test_fifteen_seconds_applies_minimum() {
    let planner = ScriptedPlanner::new(vec![Ok(storyboard(3, true))]);
    orchestrator(planner.clone())
        .plan("Trail shoes", None, Some(15))
        .await
        .unwrap();

    assert_eq!(*planner.requests()[0].scene_count(), 3);
    assert_eq!(*planner.requests()[0].target_duration(), Some(15));
}

#[tokio::test]
async fn test_out_of_range_duration_uses_default_count() {
    let planner = ScriptedPlanner::new(vec![Ok(storyboard(5, true))]);
    orchestrator(planner.clone())
        .plan("Trail shoes", None, Some(300))
        .await
        .unwrap();

    let request = &planner.requests()[0];
    assert_eq!(*request.scene_count(), 5);
    assert_eq!(*request.target_duration(), None);
}

#[tokio::test]
async fn test_missing_subject_text_is_repaired() {
    let planner = ScriptedPlanner::new(vec![Ok(storyboard(3, false))]);
    let outcome = orchestrator(planner)
        .plan("Trail shoes", None, Some(15))
        .await
        .unwrap();

    assert_eq!(outcome.repaired_scenes(), &vec![2, 3]);
    for scene in outcome.plan().scenes() {
        if scene.features_subject() {
            assert!(scene.detailed_prompt().starts_with(SUBJECT));
            assert!(scene.detailed_prompt().contains(SUBJECT));
        } else {
            assert!(!scene.detailed_prompt().contains(SUBJECT));
        }
    }
    assert!(outcome.plan().subject_identity_violations().is_empty());
}

#[tokio::test]
async fn test_schema_invalid_output_is_retried() {
    let planner = ScriptedPlanner::new(vec![
        Ok(PlannerResponse::new("I'd rather write a poem.", 0.01)),
        Ok(storyboard(3, true)),
    ]);
    let outcome = orchestrator(planner.clone())
        .plan("Trail shoes", None, Some(15))
        .await
        .unwrap();

    assert!(!outcome.used_fallback());
    assert_eq!(planner.requests().len(), 2);
    assert!((outcome.cost_usd() - 0.02).abs() < 1e-9);
}

#[tokio::test]
async fn test_too_few_scenes_falls_back_after_retries() {
    let planner = ScriptedPlanner::new(vec![Ok(storyboard(2, true)), Ok(storyboard(2, true))]);
    let outcome = orchestrator(planner.clone())
        .plan("Trail shoes", None, Some(60))
        .await
        .unwrap();

    assert!(outcome.used_fallback());
    assert_eq!(outcome.plan().len(), 3);
    assert!(!outcome.plan().has_subject());
    assert_eq!(planner.requests().len(), 2);
}

#[tokio::test]
async fn test_planner_outage_falls_back() {
    let planner = ScriptedPlanner::new(vec![]);
    let outcome = orchestrator(planner)
        .plan("Trail shoes", Some(&ArtifactRef::image("shoe.png")), None)
        .await
        .unwrap();

    assert!(outcome.used_fallback());
    assert_eq!(outcome.plan().len(), 3);
    assert_eq!(*outcome.cost_usd(), 0.0);
}

#[tokio::test]
async fn test_subject_scenes_without_description_fall_back() {
    let body = json!({
        "subject_description": "",
        "scenes": [
            {"detailed_prompt": "one", "subject_presence": "full"},
            {"detailed_prompt": "two", "subject_presence": "none"},
            {"detailed_prompt": "three", "subject_presence": "partial"}
        ]
    });
    let answer = || Ok(PlannerResponse::new(body.to_string(), 0.0));
    let planner = ScriptedPlanner::new(vec![answer(), answer()]);
    let outcome = orchestrator(planner)
        .plan("Trail shoes", None, Some(15))
        .await
        .unwrap();

    assert!(outcome.used_fallback());
}

#[tokio::test]
async fn test_extra_scenes_are_truncated_and_renumbered() {
    let planner = ScriptedPlanner::new(vec![Ok(storyboard(6, true))]);
    let outcome = orchestrator(planner)
        .plan("Trail shoes", None, Some(20))
        .await
        .unwrap();

    let numbers: Vec<u32> = outcome
        .plan()
        .scenes()
        .iter()
        .map(|s| *s.scene_number())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let planner = ScriptedPlanner::new(vec![]);
    let err = orchestrator(planner.clone())
        .plan("   ", None, None)
        .await
        .unwrap_err();

    match err.kind() {
        MontageErrorKind::Planning(e) => assert_eq!(e.kind, PlanningErrorKind::EmptyPrompt),
        other => panic!("Expected planning error, got {other}"),
    }
    assert!(planner.requests().is_empty());
}
