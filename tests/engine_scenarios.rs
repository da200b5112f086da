//! End-to-end engine behaviour through the public API: the keyboard and
//! pointer surface a host drives, checked against the resulting list.

use outline::engine::Engine;
use outline::host::{FocusMode, UniformRows};
use outline::model::{Intent, MAX_INDENT, ProjectConfig, Task};
use outline::ops::store::normalize_task;
use outline::parse::parse_task_input;
use pretty_assertions::assert_eq;
use serde_json::json;

const ROW: f64 = 28.0;

fn task(id: &str, text: &str, indent: u8) -> Task {
    let mut t = Task::new(id.to_string(), text.to_string(), 1_000);
    t.indent = indent;
    t
}

fn engine(tasks: Vec<Task>) -> Engine {
    Engine::new(tasks, ProjectConfig::default())
}

fn ids(engine: &Engine) -> Vec<&str> {
    engine.tasks().iter().map(|t| t.id.as_str()).collect()
}

fn indents(engine: &Engine) -> Vec<u8> {
    engine.tasks().iter().map(|t| t.indent).collect()
}

/// One full pointer drag of `id`: press at x = 0, move to (x, y), one frame,
/// release.
fn drag(engine: &mut Engine, id: &str, x: f64, y: f64) -> bool {
    assert!(engine.begin_drag(id, 0.0));
    let layout = UniformRows {
        row_height: ROW,
        rows: engine.tasks().len(),
    };
    engine.pointer_move(x, y);
    engine.frame(&layout);
    engine.end_drag()
}

/// Indent-clamp property over the whole list
fn assert_indents_nest(engine: &Engine) {
    let tasks = engine.tasks();
    for (i, t) in tasks.iter().enumerate() {
        assert!(t.indent <= MAX_INDENT, "{} too deep", t.id);
        let parent = tasks[..i].iter().rev().find(|p| p.indent < t.indent);
        match parent {
            Some(p) => assert!(t.indent <= p.indent + 1, "{} skips a level", t.id),
            None => assert_eq!(t.indent, 0, "{} has no parent", t.id),
        }
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn loading_moves_inline_tags_out_of_text() {
    let raw = json!({"id": "t1", "text": "Buy milk #errand", "createdAt": 5});
    let task = normalize_task(&raw, 0, 0).unwrap();
    assert_eq!(task.text, "Buy milk");
    assert_eq!(task.tags, vec!["errand"]);
}

#[test]
fn committing_an_intent_token() {
    let mut engine = engine(vec![task("t1", "", 0)]);
    engine.start_editing("t1", None);
    engine.set_live_text("Call mom !soon", 14);
    assert!(engine.commit());

    let t = &engine.tasks()[0];
    assert_eq!(t.text, "Call mom");
    assert_eq!(t.intent, Some(Intent::Soon));
    assert!(t.tags.is_empty());
    assert!(engine.editing().is_none());
}

#[test]
fn enter_splits_at_the_caret() {
    let mut first = task("t1", "Write report", 0);
    first.tags = vec!["work".into()];
    let mut engine = engine(vec![first]);

    engine.start_editing("t1", Some(5));
    assert!(engine.enter(2_000));

    let tasks = engine.tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].text, "Write");
    assert_eq!(tasks[0].tags, vec!["work"]);
    assert_eq!(tasks[1].text, "report");
    assert!(tasks[1].tags.is_empty());

    let new_id = tasks[1].id.clone();
    let focus = engine.take_focus().unwrap();
    assert_eq!(focus.task_id, new_id);
    assert_eq!(focus.mode, FocusMode::Edit);
    assert_eq!(engine.editing().map(|s| s.task_id.as_str()), Some(new_id.as_str()));
}

#[test]
fn dragging_a_block_keeps_relative_indents() {
    let mut engine = engine(vec![
        task("p", "P", 0),
        task("b1", "B1", 1),
        task("b2", "B2", 2),
        task("b3", "B3", 2),
        task("x", "X", 1),
        task("y", "Y", 1),
        task("z", "Z", 1),
        task("w", "W", 0),
    ]);
    // three rows below the block: past z's midpoint, short of w's
    assert!(drag(&mut engine, "b1", 0.0, 6.75 * ROW));
    assert_eq!(ids(&engine), vec!["p", "x", "y", "z", "b1", "b2", "b3", "w"]);
    assert_eq!(indents(&engine), vec![0, 1, 1, 1, 1, 2, 2, 0]);
    assert_indents_nest(&engine);
}

#[test]
fn dragging_a_block_to_the_top_shifts_it_uniformly() {
    let mut engine = engine(vec![
        task("p", "P", 0),
        task("b1", "B1", 1),
        task("b2", "B2", 2),
        task("b3", "B3", 2),
        task("w", "W", 0),
    ]);
    assert!(drag(&mut engine, "b1", 0.0, 0.25 * ROW));
    assert_eq!(ids(&engine), vec!["b1", "b2", "b3", "p", "w"]);
    assert_eq!(indents(&engine), vec![0, 1, 1, 0, 0]);
    let focus = engine.take_focus().unwrap();
    assert_eq!(focus.task_id, "b1");
    assert_eq!(focus.mode, FocusMode::Row);
}

#[test]
fn delete_then_undo_restores_in_place() {
    let mut engine = engine((0..5).map(|i| task(&format!("t{i}"), "x", 0)).collect());
    let before = engine.tasks().to_vec();

    assert!(engine.delete("t2"));
    assert_eq!(ids(&engine), vec!["t0", "t1", "t3", "t4"]);
    assert_eq!(engine.take_focus().unwrap().task_id, "t3");

    assert!(engine.undo());
    assert_eq!(engine.tasks(), &before[..]);
    assert_eq!(engine.take_focus().unwrap().task_id, "t2");
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn parser_is_idempotent() {
    let inputs = [
        "Buy milk #errand",
        "Call mom !soon #family !m",
        "  spaced   out  !later  ",
        "#only #tags",
        "!now !soon both intents",
        "a#b not-a-tag #ok",
        "",
    ];
    for input in inputs {
        let first = parse_task_input(input);
        let second = parse_task_input(&first.text);
        assert!(second.tags.is_empty(), "{input:?}");
        assert_eq!(second.intent, None, "{input:?}");
        assert_eq!(second.text, first.text, "{input:?}");
    }
}

#[test]
fn commit_never_drops_existing_tags() {
    let mut t = task("t1", "Plan trip", 0);
    t.tags = vec!["travel".into()];
    let mut engine = engine(vec![t]);

    engine.start_editing("t1", None);
    engine.set_live_text("Plan the trip #summer", 21);
    assert!(engine.commit());
    assert_eq!(engine.tasks()[0].tags, vec!["travel", "summer"]);
}

#[test]
fn split_then_merge_restores_text_and_tags() {
    let source = "Write the report #q3";
    let parsed = parse_task_input(source);
    // every word boundary of the clean text; a cursor inside a word is left
    // out on purpose, because merge puts a space at the seam
    let boundaries: Vec<usize> = parsed
        .text
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .collect();

    for cursor in boundaries {
        let mut t = task("t1", "", 0);
        t.tags = vec!["work".into()];
        let mut engine = engine(vec![t]);

        engine.start_editing("t1", None);
        engine.set_live_text(source, cursor);
        assert!(engine.enter(2_000));
        assert!(engine.backspace_at_start());

        let tasks = engine.tasks();
        assert_eq!(tasks.len(), 1, "cursor {cursor}");
        assert_eq!(tasks[0].id, "t1");
        assert_eq!(tasks[0].text, parsed.text, "cursor {cursor}");
        assert_eq!(tasks[0].tags, vec!["work", "q3"], "cursor {cursor}");
    }

    let mut engine = engine(vec![task("t1", "", 0)]);
    engine.start_editing("t1", None);
    engine.set_live_text(source, 3);
    assert!(engine.enter(2_000));
    assert!(engine.backspace_at_start());
    assert_eq!(engine.tasks()[0].text, "Wri te the report");
}

#[test]
fn drags_never_break_nesting() {
    let mut engine = engine(vec![
        task("a", "A", 0),
        task("b", "B", 1),
        task("c", "C", 2),
        task("d", "D", 0),
        task("e", "E", 1),
        task("f", "F", 0),
    ]);
    let moves: [(&str, f64, f64); 6] = [
        ("d", 0.0, 1.6 * ROW),
        ("f", 3.0 * ROW, 0.1 * ROW),
        ("c", -2.0 * ROW, 5.9 * ROW),
        ("a", 2.0 * ROW, 2.5 * ROW),
        ("e", 4.0 * ROW, 0.5 * ROW),
        ("b", 1.0 * ROW, 3.8 * ROW),
    ];
    for (id, x, y) in moves {
        drag(&mut engine, id, x, y);
        assert!(engine.dragging().is_none());
        assert_indents_nest(&engine);
    }
}

#[test]
fn undo_restores_each_kind_exactly() {
    type Mutation = fn(&mut Engine) -> bool;
    let mutations: [(&str, Mutation); 7] = [
        ("delete", |e| e.delete("b")),
        ("edit", |e| {
            e.start_editing("b", None);
            e.set_live_text("Something else #new !later", 26);
            e.commit()
        }),
        ("toggle", |e| e.toggle_completed("b", 9_000)),
        ("indent", |e| e.indent("c")),
        ("split", |e| {
            e.start_editing("a", Some(3));
            e.enter(9_000)
        }),
        ("merge", |e| {
            e.start_editing("c", Some(0));
            e.backspace_at_start()
        }),
        ("reorder", |e| drag(e, "c", 0.0, 0.2 * ROW)),
    ];

    for (kind, mutate) in mutations {
        let mut first = task("a", "Alpha beta", 0);
        first.tags = vec!["x".into()];
        let mut engine = engine(vec![first, task("b", "Bravo", 0), task("c", "Charlie", 0)]);
        let before = engine.tasks().to_vec();

        assert!(mutate(&mut engine), "{kind} changed nothing");
        assert_ne!(engine.tasks(), &before[..], "{kind}");
        assert_eq!(engine.undo_stack().peek_last().map(|a| a.label()), Some(kind));

        assert!(engine.undo(), "{kind}");
        assert_eq!(engine.tasks(), &before[..], "{kind}");
        assert!(engine.undo_stack().is_empty(), "{kind}");
    }
}

#[test]
fn first_undo_reverts_open_typing() {
    let mut engine = engine(vec![task("a", "Alpha", 0)]);
    engine.start_editing("a", None);
    engine.set_live_text("Alpha and more", 14);
    assert!(engine.undo());
    assert_eq!(engine.tasks()[0].text, "Alpha");
    assert!(!engine.undo());
}

#[test]
fn stale_ids_are_no_ops() {
    let mut engine = engine(vec![task("a", "Alpha", 0)]);
    let before = engine.tasks().to_vec();
    assert!(!engine.delete("gone"));
    assert!(!engine.indent("gone"));
    assert!(!engine.remove_tag("a", "missing"));
    assert!(!engine.begin_drag("gone", 0.0));
    assert!(!engine.start_editing("gone", None));
    assert!(!engine.undo());
    assert_eq!(engine.tasks(), &before[..]);
}
