//! Integration tests: drag-to-connect (nl-editor ↔ nl-core).
//!
//! Drives the ConnectionEngine through anchor drops, release fallbacks,
//! geometry retries and cancellation against a laid-out CanvasSnapshot.

use nl_core::id::NodeId;
use nl_core::media::ImageFacts;
use nl_core::model::*;
use nl_core::registry::NodeRecord;
use nl_core::rules::Rejection;
use nl_core::{EngineConfig, Point, Size, Viewport};
use nl_editor::{AbortReason, ConnectionEngine, CursorFeedback, DragOutcome, InputEvent, Signal};
use pretty_assertions::assert_eq;
use std::time::Duration;

const MS: Duration = Duration::from_millis(1);

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine() -> ConnectionEngine {
    init_logs();
    ConnectionEngine::new(EngineConfig::default()).unwrap()
}

/// Text at the origin and an image to its right. Default viewport, so
/// screen = canvas. Text send anchor at (100, 0), image input at (300, 0).
fn text_and_image(tag: &str) -> (nl_editor::CanvasSnapshot, NodeId, NodeId) {
    let mut snap = nl_editor::CanvasSnapshot::new(Viewport::default());
    let text = snap.add(&format!("{tag}-text"), NodeKind::Text, Point::new(0.0, 0.0));
    let image = snap.add(&format!("{tag}-image"), NodeKind::Image, Point::new(400.0, 0.0));
    (snap, text, image)
}

fn start(engine: &mut ConnectionEngine, from: NodeId) {
    let out = engine.drag_started(from, AnchorSide::Send, Color::default(), Point::new(100.0, 0.0));
    assert_eq!(out, DragOutcome::Started);
}

// ─── Anchor drops ───────────────────────────────────────────────────────

#[test]
fn drop_on_anchor_creates_connection() {
    let (snap, text, image) = text_and_image("drop");
    let mut engine = engine();
    let (_, log) = engine.bus_mut().record();

    start(&mut engine, text);
    engine.pointer_move(&snap, Point::new(295.0, 2.0));
    assert_eq!(engine.cursor(), CursorFeedback::Valid);

    let out = engine.drag_completed(&snap, image, Anchor::Receive, None);
    let DragOutcome::Created(conn) = out.clone() else {
        panic!("expected a connection, got {out:?}");
    };
    assert_eq!((conn.from, conn.to, conn.to_anchor.clone()), (text, image, Anchor::Receive));
    assert_eq!(engine.store().all(), vec![conn.clone()]);
    assert!(engine.active_drag().is_none());
    assert!(!engine.is_committing());
    assert_eq!(engine.cursor(), CursorFeedback::Default);

    let signals = log.borrow();
    assert!(signals.contains(&Signal::ConnectionCreated {
        connection: conn,
        endpoints: Some((Point::new(100.0, 0.0), Point::new(300.0, 0.0))),
    }));
    assert!(signals.contains(&Signal::DragActive {
        active: false,
        from: None
    }));
}

#[test]
fn same_link_twice_is_a_duplicate() {
    let (snap, text, image) = text_and_image("dup");
    let mut engine = engine();

    start(&mut engine, text);
    assert!(matches!(
        engine.drag_completed(&snap, image, Anchor::Receive, None),
        DragOutcome::Created(_)
    ));
    start(&mut engine, text);
    assert_eq!(
        engine.drag_completed(&snap, image, Anchor::Receive, None),
        DragOutcome::Duplicate
    );
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn self_loop_aborts() {
    let (snap, _, image) = text_and_image("self");
    let mut engine = engine();

    start(&mut engine, image);
    assert_eq!(
        engine.drag_completed(&snap, image, Anchor::Receive, None),
        DragOutcome::Aborted(AbortReason::Rejected(Rejection::SelfLoop))
    );
    assert!(engine.store().is_empty());
    assert!(engine.active_drag().is_none());
}

#[test]
fn text_never_feeds_video() {
    let mut snap = nl_editor::CanvasSnapshot::new(Viewport::default());
    let text = snap.add("tv-text", NodeKind::Text, Point::new(0.0, 0.0));
    let video = snap.add("tv-video", NodeKind::Video, Point::new(400.0, 0.0));
    let mut engine = engine();

    start(&mut engine, text);
    engine.pointer_move(&snap, Point::new(300.0, 0.0));
    assert_eq!(engine.cursor(), CursorFeedback::Invalid);
    assert_eq!(
        engine.drag_completed(&snap, video, Anchor::Receive, None),
        DragOutcome::Aborted(AbortReason::Rejected(Rejection::NotInTable {
            from: NodeKind::Text,
            to: NodeKind::Video,
        }))
    );
    assert!(engine.store().is_empty());
}

// ─── Release fallback ───────────────────────────────────────────────────

#[test]
fn release_near_anchor_commits_after_settle() {
    let (snap, text, image) = text_and_image("settle");
    let mut engine = engine();

    start(&mut engine, text);
    // 36 px from the image input
    assert_eq!(engine.pointer_up(&snap, Point::new(320.0, 30.0)), DragOutcome::Pending);
    assert!(engine.store().is_empty());

    assert_eq!(engine.tick(&snap, 100 * MS), vec![]);
    let outcomes = engine.tick(&snap, 20 * MS);
    assert_eq!(outcomes.len(), 1);
    let DragOutcome::Created(conn) = &outcomes[0] else {
        panic!("expected a connection, got {outcomes:?}");
    };
    assert_eq!((conn.from, conn.to), (text, image));
    assert_eq!(engine.now(), 120 * MS);
}

#[test]
fn release_beyond_hover_but_within_release_radius() {
    let (snap, text, _) = text_and_image("radius");
    let mut engine = engine();

    start(&mut engine, text);
    // 80 px left of the image input
    engine.pointer_move(&snap, Point::new(220.0, 0.0));
    assert!(engine.hover().is_none());
    assert_eq!(engine.pointer_up(&snap, Point::new(220.0, 0.0)), DragOutcome::Pending);
    assert_eq!(engine.tick(&snap, 200 * MS).len(), 1);
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn anchor_drop_wins_over_settle_timer() {
    let (snap, text, image) = text_and_image("guard-a");
    let mut engine = engine();

    start(&mut engine, text);
    assert_eq!(engine.pointer_up(&snap, Point::new(300.0, 5.0)), DragOutcome::Pending);
    assert!(matches!(
        engine.drag_completed(&snap, image, Anchor::Receive, Some(Point::new(300.0, 5.0))),
        DragOutcome::Created(_)
    ));
    // the settle timer fires into an idle engine
    assert_eq!(engine.tick(&snap, 500 * MS), vec![]);
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn settle_timer_wins_over_late_anchor_drop() {
    let (snap, text, image) = text_and_image("guard-b");
    let mut engine = engine();

    start(&mut engine, text);
    engine.pointer_up(&snap, Point::new(300.0, 5.0));
    assert_eq!(engine.tick(&snap, 120 * MS).len(), 1);
    assert_eq!(
        engine.drag_completed(&snap, image, Anchor::Receive, None),
        DragOutcome::Ignored
    );
    assert_eq!(engine.pointer_up(&snap, Point::new(300.0, 5.0)), DragOutcome::Ignored);
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn second_release_does_not_schedule_again() {
    let (snap, text, _) = text_and_image("rerelease");
    let mut engine = engine();

    start(&mut engine, text);
    assert_eq!(engine.pointer_up(&snap, Point::new(300.0, 5.0)), DragOutcome::Pending);
    assert_eq!(engine.pointer_up(&snap, Point::new(300.0, 5.0)), DragOutcome::Ignored);
    assert_eq!(engine.pending_timers(), 1);
}

#[test]
fn invalid_release_target_aborts() {
    let mut snap = nl_editor::CanvasSnapshot::new(Viewport::default());
    let music = snap.add("rel-music", NodeKind::Music, Point::new(0.0, 0.0));
    snap.add("rel-image", NodeKind::Image, Point::new(400.0, 0.0));
    let mut engine = engine();

    start(&mut engine, music);
    assert!(matches!(
        engine.pointer_up(&snap, Point::new(300.0, 0.0)),
        DragOutcome::Aborted(AbortReason::Rejected(Rejection::NotInTable { .. }))
    ));
    assert_eq!(engine.tick(&snap, 500 * MS), vec![]);
    assert!(engine.store().is_empty());
}

#[test]
fn release_over_node_chrome_aborts() {
    let (snap, text, image) = text_and_image("chrome");
    let mut engine = engine();

    start(&mut engine, text);
    // inside the image frame, 158 px from its input
    assert_eq!(
        engine.pointer_up(&snap, Point::new(450.0, 50.0)),
        DragOutcome::Aborted(AbortReason::OverChrome(image))
    );
    assert!(engine.menu().is_none());
}

// ─── Geometry retry ─────────────────────────────────────────────────────

#[test]
fn unresolved_target_is_retried_once() {
    let (mut snap, text, _) = text_and_image("retry");
    let mut engine = engine();
    // classified as an image by prefix, but not laid out yet
    let late = NodeId::intern("canvas-image-retry");

    start(&mut engine, text);
    assert_eq!(
        engine.drag_completed(&snap, late, Anchor::Receive, Some(Point::new(600.0, 0.0))),
        DragOutcome::Pending
    );
    assert!(engine.is_committing());

    snap.add_node(
        late,
        NodeRecord::new(NodeKind::Image, Point::new(700.0, 0.0), Size::new(200.0, 120.0)),
    );
    let outcomes = engine.tick(&snap, 50 * MS);
    let [DragOutcome::Created(conn)] = outcomes.as_slice() else {
        panic!("expected one connection, got {outcomes:?}");
    };
    assert_eq!(conn.to, late);
}

#[test]
fn removing_the_retry_target_aborts_the_commit() {
    let (mut snap, text, _) = text_and_image("retry-removed");
    let mut engine = engine();
    let late = NodeId::intern("canvas-image-retry-removed");

    start(&mut engine, text);
    assert_eq!(
        engine.drag_completed(&snap, late, Anchor::Receive, None),
        DragOutcome::Pending
    );
    assert_eq!(engine.remove_node(late), vec![]);
    assert!(!engine.is_committing());
    assert!(engine.active_drag().is_none());

    // the host view still knows the node when the retry would have fired
    snap.add_node(
        late,
        NodeRecord::new(NodeKind::Image, Point::new(700.0, 0.0), Size::new(200.0, 120.0)),
    );
    assert_eq!(engine.tick(&snap, 50 * MS), vec![]);
    assert!(engine.store().is_empty());
}

#[test]
fn retry_gives_up_after_one_attempt() {
    let (snap, text, _) = text_and_image("giveup");
    let mut engine = engine();
    let ghost = NodeId::intern("canvas-image-ghost");

    start(&mut engine, text);
    assert_eq!(
        engine.drag_completed(&snap, ghost, Anchor::Receive, None),
        DragOutcome::Pending
    );
    assert_eq!(
        engine.tick(&snap, 50 * MS),
        vec![DragOutcome::Aborted(AbortReason::Unresolved)]
    );
    assert_eq!(engine.tick(&snap, 500 * MS), vec![]);
    assert!(engine.store().is_empty());
    assert!(!engine.is_committing());
}

#[test]
fn hidden_target_resolves_from_canvas_geometry() {
    let (mut snap, text, image) = text_and_image("hidden");
    snap.hide(image);
    let mut engine = engine();
    let (_, log) = engine.bus_mut().record();

    start(&mut engine, text);
    assert!(matches!(
        engine.drag_completed(&snap, image, Anchor::Receive, None),
        DragOutcome::Created(_)
    ));
    snap.show(image);

    let created = log
        .borrow()
        .iter()
        .find_map(|s| match s {
            Signal::ConnectionCreated { endpoints, .. } => *endpoints,
            _ => None,
        })
        .unwrap();
    assert_eq!(created.1, Point::new(300.0, 0.0));
}

// ─── Storyboard and image rules ─────────────────────────────────────────

/// Storyboard with a prompt input at (300, -20) and a character slot at
/// (300, 20).
fn storyboard(snap: &mut nl_editor::CanvasSnapshot, id: &str) -> NodeId {
    let id = NodeId::intern(id);
    snap.add_node(
        id,
        NodeRecord::new(NodeKind::Storyboard, Point::new(400.0, 0.0), Size::new(200.0, 120.0))
            .with_inputs([Anchor::Receive, Anchor::slot("character")]),
    );
    id
}

#[test]
fn storyboard_slots_take_images_and_prompt_takes_text() {
    let mut snap = nl_editor::CanvasSnapshot::new(Viewport::default());
    let text = snap.add("sb-text", NodeKind::Text, Point::new(0.0, -200.0));
    let image = snap.add("sb-image", NodeKind::Image, Point::new(0.0, 200.0));
    let board = storyboard(&mut snap, "sb-board");
    let slot = Some(Point::new(300.0, 20.0));
    let prompt = Some(Point::new(300.0, -20.0));
    let mut engine = engine();

    start(&mut engine, text);
    assert_eq!(
        engine.drag_completed(&snap, board, Anchor::slot("character"), slot),
        DragOutcome::Aborted(AbortReason::Rejected(Rejection::StoryboardSlot(NodeKind::Text)))
    );
    start(&mut engine, image);
    assert_eq!(
        engine.drag_completed(&snap, board, Anchor::Receive, prompt),
        DragOutcome::Aborted(AbortReason::Rejected(Rejection::StoryboardPrompt(NodeKind::Image)))
    );

    start(&mut engine, text);
    assert!(matches!(
        engine.drag_completed(&snap, board, Anchor::Receive, prompt),
        DragOutcome::Created(_)
    ));
    start(&mut engine, image);
    assert!(matches!(
        engine.drag_completed(&snap, board, Anchor::slot("character"), slot),
        DragOutcome::Created(_)
    ));
    assert_eq!(engine.store().incoming(board).len(), 2);
}

#[test]
fn image_to_image_follows_media_roles() {
    let mut snap = nl_editor::CanvasSnapshot::new(Viewport::default());
    let photo = snap.add_image("roles-photo", Point::new(0.0, 0.0), ImageFacts::uploaded());
    let prompt = snap.add_image(
        "roles-gen",
        Point::new(400.0, 0.0),
        ImageFacts::generation("a lighthouse at dusk"),
    );
    let produced = snap.add_image(
        "roles-done",
        Point::new(400.0, 300.0),
        ImageFacts::generation("a harbor").with_output(),
    );
    let mut engine = engine();

    // media into an empty generation
    start(&mut engine, photo);
    assert!(matches!(
        engine.drag_completed(&snap, prompt, Anchor::Receive, None),
        DragOutcome::Created(_)
    ));

    // media into a generation that already produced output
    start(&mut engine, photo);
    assert_eq!(
        engine.drag_completed(&snap, produced, Anchor::Receive, None),
        DragOutcome::Aborted(AbortReason::Rejected(Rejection::ProducedGeneration))
    );

    // a generation is not a media source
    start(&mut engine, prompt);
    assert_eq!(
        engine.drag_completed(&snap, produced, Anchor::Receive, None),
        DragOutcome::Aborted(AbortReason::Rejected(Rejection::GenerationSource))
    );
}

// ─── Cancellation ───────────────────────────────────────────────────────

#[test]
fn escape_and_pointer_cancel_end_the_drag() {
    let (snap, text, _) = text_and_image("cancel");
    let mut engine = engine();

    start(&mut engine, text);
    assert_eq!(
        engine.handle(&snap, InputEvent::key("Escape", false)),
        vec![DragOutcome::Aborted(AbortReason::Cancelled)]
    );
    assert!(engine.active_drag().is_none());

    start(&mut engine, text);
    assert_eq!(
        engine.handle(&snap, InputEvent::PointerCancel),
        vec![DragOutcome::Aborted(AbortReason::Cancelled)]
    );
    assert_eq!(engine.pointer_cancel(), DragOutcome::Ignored);
}

#[test]
fn stale_settle_timer_does_not_touch_the_next_drag() {
    let (snap, text, image) = text_and_image("stale");
    let mut engine = engine();

    start(&mut engine, text);
    engine.pointer_up(&snap, Point::new(300.0, 5.0));
    engine.pointer_cancel();

    start(&mut engine, image);
    assert_eq!(engine.tick(&snap, 500 * MS), vec![]);
    assert!(engine.store().is_empty());
    assert_eq!(engine.active_drag().map(|d| d.from), Some(image));
}

#[test]
fn handle_routes_a_full_gesture() {
    let (snap, text, image) = text_and_image("route");
    let mut engine = engine();

    let events = [
        InputEvent::DragStarted {
            node: text,
            side: AnchorSide::Send,
            color: Color::default(),
            x: 100.0,
            y: 0.0,
        },
        InputEvent::PointerMove { x: 200.0, y: 0.0 },
        InputEvent::PointerMove { x: 298.0, y: 1.0 },
        InputEvent::PointerUp { x: 298.0, y: 1.0 },
        InputEvent::tick_ms(60),
        InputEvent::tick_ms(60),
    ];
    let outcomes: Vec<DragOutcome> = events
        .into_iter()
        .flat_map(|ev| engine.handle(&snap, ev))
        .collect();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0], DragOutcome::Started);
    assert_eq!(outcomes[1], DragOutcome::Pending);
    assert!(matches!(&outcomes[2], DragOutcome::Created(c) if c.to == image));
}
