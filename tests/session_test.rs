//! Integration tests for editing sessions
//!
//! These tests drive [Session] the way a front end does:
//! - History depth bound and redo invalidation across real actions
//! - Regeneration under the selected user message
//! - Many concurrent producers streaming through one [SessionHandle]
//! - Producers stopped by cancellation or by deleting their node

mod common;

use common::{init_logging, seeded_session};
use stave_core::{
    config::StaveConfig,
    event::{pump, SessionHandle, StreamEvent},
    graph::{generated_children_of, parent_of},
    label::display_name,
    properties::{ModelTier, NodeKind, StreamState},
    session::Session,
};
use test_log::test;
use tokio::sync::mpsc::unbounded_channel;

#[test]
fn test_history_keeps_most_recent_snapshots() {
    init_logging();
    let mut config = StaveConfig::default();
    config.engine.max_history = 3;
    config.engine.jitter_seed = Some(9);
    let mut session = Session::new(config).unwrap();

    for _ in 0..5 {
        session.new_tree(None);
    }
    assert_eq!(session.nodes().len(), 10);
    assert_eq!(session.history().past().len(), 3);

    // Oldest to newest: the states before the 3rd, 4th and 5th trees.
    let counts: Vec<usize> = session.history().past().map(|item| item.nodes.len()).collect();
    assert_eq!(counts, vec![4, 6, 8]);

    for expected in [8, 6, 4] {
        assert!(session.undo());
        assert_eq!(session.nodes().len(), expected);
    }
    assert!(!session.undo());
}

#[test]
fn test_undo_redo_restore_exact_state() {
    let mut session = seeded_session(1);
    let user = session.new_tree(Some("Draft"));
    let before = session.current_state();

    session.edit_text(&user, "Final question").unwrap();
    let after = session.current_state();

    assert!(session.undo());
    assert_eq!(session.current_state(), before);
    assert!(session.redo());
    assert_eq!(session.current_state(), after);

    assert!(session.undo());
    session.rename(&user, "Renamed").unwrap();
    assert!(!session.redo());
}

#[test]
fn test_regenerate_reuses_generated_children() {
    let mut session = seeded_session(2);
    let user = session.new_tree(Some("Name a color"));
    let first = session.submit_prompt(false).unwrap();
    for slot in &first.completions {
        session.apply_delta(&slot.node_id, &slot.stream_id, "Blue").unwrap();
        session.finish_stream(&slot.node_id, &slot.stream_id);
    }

    // A human edit keeps the node a generated child.
    let edited = first.completions[2].node_id.clone();
    session.edit_text(&edited, "Teal").unwrap();
    assert_eq!(session.node(&edited).unwrap().kind, NodeKind::EditedGenerated);

    // One more slot than before: three are reused, one is new.
    let mut settings = session.settings().clone();
    settings.completion_count = 4;
    session.set_settings(settings).unwrap();

    session.select(&user);
    let second = session.submit_prompt(true).unwrap();
    let reused: Vec<_> = second.completions[..3].iter().map(|slot| &slot.node_id).collect();
    let original: Vec<_> = first.completions.iter().map(|slot| &slot.node_id).collect();
    assert_eq!(reused, original);
    assert_eq!(generated_children_of(session.nodes(), session.edges(), &user).len(), 4);
    for slot in &second.completions {
        let node = session.node(&slot.node_id).unwrap();
        assert_eq!(node.text, "");
        assert_eq!(node.stream, StreamState::Streaming(slot.stream_id.clone()));
        assert_eq!(node.label, display_name(node.kind, Some(ModelTier::Gpt4)));
    }
    let labels: Vec<_> = second
        .completions
        .iter()
        .map(|slot| session.node(&slot.node_id).unwrap().label.as_str())
        .collect();
    assert_eq!(labels, vec!["GPT-4", "GPT-4", "GPT-4 (edited)", "GPT-4"]);

    // Undo restores the finished answers in one step.
    assert!(session.undo());
    assert_eq!(session.node(&edited).unwrap().text, "Teal");
}

#[test]
fn test_new_child_lands_under_selection() {
    let mut session = seeded_session(3);
    let user = session.new_tree(None);
    let child = session.new_connected_to_selected(NodeKind::Generated).unwrap();

    let parent = parent_of(session.nodes(), session.edges(), &child).unwrap();
    assert_eq!(parent.id, user);

    let parent_pos = parent.position;
    let child_pos = session.node(&child).unwrap().position;
    assert_eq!(child_pos.x, parent_pos.x);
    let offset = child_pos.y - parent_pos.y - 100.0;
    assert!((0.0..20.0).contains(&offset));
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_producers_through_pump() {
    let mut session = seeded_session(4);
    let user = session.new_tree(Some("Count to five"));
    let submission = session.submit_prompt(false).unwrap();
    let handle = SessionHandle::new(session);

    let (tx, rx) = unbounded_channel();
    let pump_task = tokio::spawn(pump(handle.clone(), rx));

    let mut producers = Vec::new();
    for (idx, slot) in submission.completions.iter().cloned().enumerate() {
        let tx = tx.clone();
        producers.push(tokio::spawn(async move {
            for word in ["one", " two", " three", " four", " five"] {
                let text = format!("{word}{idx}");
                tx.send(StreamEvent::text(slot.node_id.clone(), slot.stream_id.clone(), text))
                    .unwrap();
                tokio::task::yield_now().await;
            }
            tx.send(StreamEvent::done(slot.node_id, slot.stream_id)).unwrap();
        }));
    }
    drop(tx);

    for producer in producers {
        producer.await.unwrap();
    }
    let summary = pump_task.await.unwrap();
    assert_eq!(summary.applied, 15);
    assert_eq!(summary.finished, 3);
    assert_eq!(summary.rejected, 0);

    let session = handle.lock();
    for (idx, slot) in submission.completions.iter().enumerate() {
        let node = session.node(&slot.node_id).unwrap();
        assert_eq!(
            node.text,
            format!("one{idx} two{idx} three{idx} four{idx} five{idx}")
        );
        assert_eq!(node.stream, StreamState::Idle);
    }
    assert_eq!(generated_children_of(session.nodes(), session.edges(), &user).len(), 3);
}

#[test(tokio::test)]
async fn test_cancel_stops_producer_mid_stream() {
    let mut session = seeded_session(5);
    let user = session.new_tree(Some("Write an essay"));
    let submission = session.submit_prompt(false).unwrap();
    let slot = submission.completions[0].clone();
    let handle = SessionHandle::new(session);

    let (tx, rx) = unbounded_channel();
    tx.send(StreamEvent::text(slot.node_id.clone(), slot.stream_id.clone(), "Once"))
        .unwrap();
    // The pump starts only after the cancel, so every queued delta reaches a canceled node.
    let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();
    let pump_task = tokio::spawn({
        let handle = handle.clone();
        async move {
            gate_rx.await.ok();
            pump(handle, rx).await
        }
    });

    handle.apply(&StreamEvent::text(slot.node_id.clone(), slot.stream_id.clone(), "Intro"));
    handle.lock().cancel_stream(&slot.node_id);
    tx.send(StreamEvent::text(slot.node_id.clone(), slot.stream_id.clone(), " upon"))
        .unwrap();
    drop(tx);
    gate_tx.send(()).unwrap();

    let summary = pump_task.await.unwrap();
    assert_eq!(summary.applied, 0);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.dropped, 1);

    let session = handle.lock();
    assert_eq!(session.node(&slot.node_id).unwrap().text, "Intro");
    assert!(parent_of(session.nodes(), session.edges(), &slot.node_id)
        .is_some_and(|parent| parent.id == user));
}

#[test(tokio::test)]
async fn test_deleting_generating_node_stops_producer() {
    let mut session = seeded_session(6);
    let user = session.new_tree(Some("Tell me a story"));
    let submission = session.submit_prompt(false).unwrap();
    let slot = submission.completions[0].clone();
    session.delete_selected();
    assert!(session.node(&slot.node_id).is_none());
    let handle = SessionHandle::new(session);

    let (tx, rx) = unbounded_channel();
    for word in ["Once", " upon", " a time"] {
        tx.send(StreamEvent::text(slot.node_id.clone(), slot.stream_id.clone(), word))
            .unwrap();
    }
    drop(tx);

    let summary = pump(handle.clone(), rx).await;
    assert_eq!(summary.applied, 0);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.dropped, 2);

    let session = handle.lock();
    assert!(session.node(&slot.node_id).is_none());
    assert_eq!(generated_children_of(session.nodes(), session.edges(), &user).len(), 2);
}
