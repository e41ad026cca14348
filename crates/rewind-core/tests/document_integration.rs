// Integration tests for the document model.
//
// These run edit scripts end to end and check the resulting views, the way
// the command-line runner uses the crate.

use rewind_core::{Command, Document, DocumentView, NodeId};
use rewind_mod_history::HistoryConfig;

fn run(json: &str) -> Document {
    let commands = Command::parse_script(json).unwrap();
    let mut doc = Document::default();
    doc.run_script(&commands).unwrap();
    doc
}

#[test]
fn test_script_builds_tree() {
    let doc = run(r#"[
        {"op": "add", "label": "root", "weight": 1.0},
        {"op": "add", "label": "left", "weight": 2.0},
        {"op": "add", "label": "right", "weight": 3.0},
        {"op": "attach", "parent": 0, "child": 1},
        {"op": "attach", "parent": 0, "child": 2},
        {"op": "commit"},
        {"op": "rename", "id": 1, "label": "LEFT"}
    ]"#);

    let view = doc.view();
    assert_eq!(view.undo_depth, 2);
    assert_eq!(view.redo_depth, 0);
    assert_eq!(view.nodes.len(), 3);
    assert_eq!(view.node(NodeId(0)).unwrap().children, vec![NodeId(1), NodeId(2)]);
    assert_eq!(view.node(NodeId(1)).unwrap().label, "LEFT");
}

#[test]
fn test_script_undo_redo_steps() {
    let doc = run(r#"[
        {"op": "add", "label": "a"},
        {"op": "commit"},
        {"op": "set_weight", "id": 0, "weight": 4.0},
        {"op": "commit"},
        {"op": "set_weight", "id": 0, "weight": 8.0},
        {"op": "undo"},
        {"op": "undo"},
        {"op": "redo"}
    ]"#);

    let view = doc.view();
    assert!((view.node(NodeId(0)).unwrap().weight - 4.0).abs() < f64::EPSILON);
    assert_eq!(view.undo_depth, 2);
    assert_eq!(view.redo_depth, 1);
}

#[test]
fn test_new_edit_after_undo_drops_redo() {
    let doc = run(r#"[
        {"op": "add", "label": "a"},
        {"op": "add", "label": "b"},
        {"op": "commit"},
        {"op": "undo"},
        {"op": "add", "label": "c"}
    ]"#);

    let view = doc.view();
    assert_eq!(view.redo_depth, 0);
    assert_eq!(view.undo_depth, 1);
    // Ids keep counting even though `a` and `b` were undone.
    assert_eq!(view.nodes.len(), 1);
    assert_eq!(view.nodes[0].id, NodeId(2));
}

#[test]
fn test_undo_on_fresh_document_is_noop() {
    let doc = run(r#"[{"op": "undo"}, {"op": "redo"}]"#);
    let view = doc.view();
    assert_eq!(view.undo_depth, 0);
    assert_eq!(view.redo_depth, 0);
    assert_eq!(view.transaction, 0);
}

#[test]
fn test_full_rewind_and_replay() {
    let mut doc = Document::default();
    let mut states: Vec<DocumentView> = Vec::new();
    let snapshot_nodes = |doc: &Document| {
        let mut view = doc.view();
        // Revisions and history depths legitimately differ between passes.
        for node in &mut view.nodes {
            node.revision = 0;
        }
        view.transaction = 0;
        view.undo_depth = 0;
        view.redo_depth = 0;
        view
    };
    states.push(snapshot_nodes(&doc));

    let root = doc.add_node("root", 1.0).unwrap();
    doc.flush();
    states.push(snapshot_nodes(&doc));

    let child = doc.add_node("child", 2.0).unwrap();
    doc.attach(root, child).unwrap();
    doc.flush();
    states.push(snapshot_nodes(&doc));

    doc.rename(child, "kid").unwrap();
    doc.set_weight(root, 10.0).unwrap();
    doc.flush();
    states.push(snapshot_nodes(&doc));

    doc.remove_node(child).unwrap();
    doc.flush();
    states.push(snapshot_nodes(&doc));

    for expected in states.iter().rev().skip(1) {
        assert!(doc.undo().unwrap());
        assert_eq!(&snapshot_nodes(&doc), expected);
    }
    assert!(!doc.undo().unwrap());

    for expected in states.iter().skip(1) {
        assert!(doc.redo().unwrap());
        assert_eq!(&snapshot_nodes(&doc), expected);
    }
    assert!(!doc.redo().unwrap());
}

#[test]
fn test_undo_depth_cap() {
    let mut doc = Document::new(HistoryConfig::with_max_undo_depth(2));
    let a = doc.add_node("a", 0.0).unwrap();
    doc.flush();
    for i in 1..=3 {
        doc.set_weight(a, f64::from(i)).unwrap();
        doc.flush();
    }
    assert_eq!(doc.history().undo_depth(), 2);

    while doc.undo().unwrap() {}
    let view = doc.view();
    assert!((view.node(a).unwrap().weight - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_view_serializes_to_json() {
    let doc = run(r#"[
        {"op": "add", "label": "root"},
        {"op": "collapse", "id": 0}
    ]"#);

    let json = serde_json::to_value(doc.view()).unwrap();
    assert_eq!(json["undo_depth"], 1);
    assert_eq!(json["nodes"][0]["id"], 0);
    assert_eq!(json["nodes"][0]["label"], "root");
    assert_eq!(json["nodes"][0]["collapsed"], true);
    assert!(json["nodes"][0]["children"].as_array().unwrap().is_empty());
}

#[test]
fn test_notifications_counted_per_transaction() {
    let mut doc = Document::default();
    let a = doc.add_node("a", 0.0).unwrap();
    doc.flush();
    assert_eq!(doc.graph_revision(), 1);

    doc.rename(a, "b").unwrap();
    doc.rename(a, "c").unwrap();
    doc.set_weight(a, 1.0).unwrap();
    doc.flush();
    assert_eq!(doc.view().node(a).unwrap().revision, 1);

    doc.undo().unwrap();
    assert_eq!(doc.view().node(a).unwrap().revision, 2);
    assert_eq!(doc.view().node(a).unwrap().label, "a");
}
