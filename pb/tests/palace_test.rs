//! Palace rendering integration tests
//!
//! Exercise PalaceGenerator and the worker pool against an in-memory store.

mod common;

use chrono::NaiveDate;
use palacebuilder::domain::{Category, NewMission, NewSubTask, Task};
use palacebuilder::state::StateManager;
use palacebuilder::{EnqueueResult, PalaceError, PalaceOutcome};

use common::{FakeImage, FakeLlm, GREY, PALACE_RED, PALACE_SIDE, REPORT_ANSWER, harness};

fn step(title: &str, order: i64) -> NewSubTask {
    NewSubTask {
        title: title.to_string(),
        category: Category::Analytical,
        complexity: 2,
        order,
        time_estimate: Some(15),
    }
}

/// Persist a mission with sub-tasks in the given orders
async fn seed(state: &StateManager, steps: &[(&str, i64)]) -> (Task, Vec<Task>) {
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
    let session = state.get_or_create_session("ada", date).await.expect("session");
    let mission = NewMission {
        title: "Write a report".to_string(),
        category: Category::Analytical,
        complexity: 3,
        sub_tasks: steps.iter().map(|(title, order)| step(title, *order)).collect(),
    };
    let task = state.create_mission(session.id, mission).await.expect("create_mission");
    let subs = state.list_sub_tasks(task.id).await.expect("list_sub_tasks");
    (task, subs)
}

// =============================================================================
// PalaceGenerator
// =============================================================================

#[tokio::test]
async fn test_no_completed_steps_renders_all_grey() {
    let h = harness(FakeLlm::answering(REPORT_ANSWER), FakeImage::red());
    let (task, _) = seed(&h.state, &[("Outline", 1), ("Draft", 2)]).await;

    let outcome = h.generator.generate_palace_image(task.id).await.expect("render");
    let PalaceOutcome::Rendered { completed, total, path } = outcome else {
        panic!("expected a rendered palace, got {:?}", outcome);
    };
    assert_eq!((completed, total), (0, 2));

    let png = h.media.read(&path).await.expect("palace readable");
    let palace = image::load_from_memory(&png).expect("palace decodes").to_rgb8();
    assert!(palace.pixels().all(|p| p.0 == GREY));
}

#[tokio::test]
async fn test_completed_step_reveals_its_band() {
    let h = harness(FakeLlm::answering(REPORT_ANSWER), FakeImage::red());
    let (task, subs) = seed(&h.state, &[("Outline", 1), ("Draft", 2)]).await;
    h.state.toggle_task(subs[1].id).await.expect("toggle");

    h.generator.generate_palace_image(task.id).await.expect("render");

    let task = h.state.get_task(task.id).await.expect("get_task").expect("task exists");
    let png = h.media.read(task.palace_image.as_deref().expect("palace set")).await.expect("read");
    let palace = image::load_from_memory(&png).expect("palace decodes").to_rgb8();

    // "Draft" is order 2 of 2, the top band
    assert_eq!(palace.get_pixel(0, 0).0, PALACE_RED);
    assert_eq!(palace.get_pixel(0, PALACE_SIDE / 2 - 1).0, PALACE_RED);
    assert_eq!(palace.get_pixel(0, PALACE_SIDE / 2).0, GREY);
    assert_eq!(palace.get_pixel(0, PALACE_SIDE - 1).0, GREY);
}

#[tokio::test]
async fn test_complete_palace_generated_once() {
    let h = harness(FakeLlm::answering(REPORT_ANSWER), FakeImage::red());
    let (task, subs) = seed(&h.state, &[("Outline", 1), ("Draft", 2), ("Polish", 3)]).await;

    h.generator.generate_palace_image(task.id).await.expect("first render");
    let first = h.state.get_task(task.id).await.expect("get_task").expect("task exists");

    h.state.toggle_task(subs[0].id).await.expect("toggle");
    h.generator.generate_palace_image(task.id).await.expect("second render");
    let second = h.state.get_task(task.id).await.expect("get_task").expect("task exists");

    assert_eq!(h.images.calls(), 1);
    assert!(first.complete_palace_image.is_some());
    assert_eq!(first.complete_palace_image, second.complete_palace_image);
    assert_ne!(first.palace_image, second.palace_image);
}

#[tokio::test]
async fn test_sub_task_id_renders_parent() {
    let h = harness(FakeLlm::answering(REPORT_ANSWER), FakeImage::red());
    let (task, subs) = seed(&h.state, &[("Outline", 1)]).await;
    h.state.toggle_task(subs[0].id).await.expect("toggle");

    let outcome = h.generator.generate_palace_image(subs[0].id).await.expect("render");
    assert!(matches!(outcome, PalaceOutcome::Rendered { completed: 1, total: 1, .. }));

    let task = h.state.get_task(task.id).await.expect("get_task").expect("task exists");
    assert!(task.palace_image.is_some());
    let sub = h.state.get_task(subs[0].id).await.expect("get_task").expect("sub exists");
    assert!(sub.palace_image.is_none());
}

#[tokio::test]
async fn test_image_failure_leaves_task_untouched() {
    let h = harness(FakeLlm::answering(REPORT_ANSWER), FakeImage::failing());
    let (task, subs) = seed(&h.state, &[("Outline", 1), ("Draft", 2)]).await;
    h.state.toggle_task(subs[0].id).await.expect("toggle");

    let outcome = h.generator.generate_palace_image(task.id).await.expect("render");
    assert_eq!(outcome, PalaceOutcome::Skipped);

    let after = h.state.get_task(task.id).await.expect("get_task").expect("task exists");
    assert!(after.complete_palace_image.is_none());
    assert!(after.palace_image.is_none());
}

#[tokio::test]
async fn test_unknown_task_is_an_error() {
    let h = harness(FakeLlm::answering(REPORT_ANSWER), FakeImage::red());

    let result = h.generator.generate_palace_image(404).await;
    assert!(matches!(result, Err(PalaceError::TaskNotFound(404))));
    assert_eq!(h.images.calls(), 0);
}

// =============================================================================
// Worker pool
// =============================================================================

#[tokio::test]
async fn test_queued_render_runs_on_workers() {
    let h = harness(FakeLlm::answering(REPORT_ANSWER), FakeImage::red());
    let (task, subs) = seed(&h.state, &[("Outline", 1), ("Draft", 2)]).await;
    h.state.toggle_task(subs[0].id).await.expect("toggle");

    let first = h.app.queue.enqueue(task.id);
    assert!(matches!(first, EnqueueResult::Queued | EnqueueResult::Coalesced));

    let h = h.drain().await;
    let task = h.state.get_task(task.id).await.expect("get_task").expect("task exists");
    assert!(task.palace_image.is_some());
    assert_eq!(h.images.calls(), 1);
}
