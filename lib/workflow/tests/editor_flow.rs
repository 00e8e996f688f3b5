//! End-to-end editor flows: build, run, save, reload.

use aiflow_workflow::{
    Connection, EditorError, EditorSettings, ExecutionError, FileWorkflowStore,
    InMemoryWorkflowStore, ModuleCatalog, Node, NotificationLevel, Port, PortReference, Position,
    SimulatedBackend, WireConnection, WorkflowDocument, WorkflowEditor, WorkflowStore,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn editor() -> WorkflowEditor {
    WorkflowEditor::new(Arc::new(ModuleCatalog::builtin()), EditorSettings::default())
}

#[tokio::test]
async fn build_run_save_and_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileWorkflowStore::new(dir.path());
    let backend = SimulatedBackend::new(Duration::ZERO);

    let mut editor = editor();
    let writer = editor
        .drop_module("1", Position::new(0.0, 0.0))
        .expect("writer");
    let rewriter = editor
        .drop_module("1", Position::new(200.0, 0.0))
        .expect("rewriter");
    editor
        .connect(
            &PortReference::output(writer.clone(), "output-1", "text"),
            &PortReference::input(rewriter.clone(), "input-1", "text"),
        )
        .expect("connect");

    let outputs = editor.run(&backend).await.expect("run");
    assert_eq!(
        outputs.get(&rewriter),
        Some(&json!({ "generated_text": "This is a sample text." }))
    );

    let id = editor.save(&store).await.expect("save");
    assert!(!editor.is_dirty());

    let mut reopened = self::editor();
    reopened.load(&store, id).await.expect("load");
    assert_eq!(reopened.graph(), editor.graph());
    let port = &reopened
        .graph()
        .node(&rewriter)
        .expect("rewriter")
        .inputs[0];
    assert_eq!(port.connected_to().len(), 1);
    assert_eq!(port.connected_to()[0].item_id, writer);
}

#[tokio::test]
async fn stored_cycle_fails_to_run_and_is_reported() {
    let store = InMemoryWorkflowStore::new();
    let node = |id: &str| {
        Node::new(id, "x", "custom", id)
            .with_input(Port::new("input-1", "any"))
            .with_output(Port::new("output-1", "any"))
    };
    let document = WorkflowDocument {
        nodes: vec![node("a"), node("b")],
        edges: vec![
            WireConnection::from(&Connection::new("a", "output-1", "b", "input-1")),
            WireConnection::from(&Connection::new("b", "output-1", "a", "input-1")),
        ],
    };
    let id = store.insert_document("loop", document).await;

    let mut editor = editor();
    editor.load(&store, id).await.expect("load");
    assert_eq!(editor.graph().edge_count(), 2);

    let err = editor
        .run(&SimulatedBackend::new(Duration::ZERO))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EditorError::Execution(ExecutionError::CycleDetected(_))
    ));
    assert!(editor.graph().nodes().iter().all(|n| n.execution_result.is_none()));
    let note = editor.notifications().last().expect("notification");
    assert_eq!(note.level, NotificationLevel::Error);
    assert!(note.message.contains("cycle"));
}

#[tokio::test]
async fn deleting_a_node_survives_a_save_round_trip() {
    let store = InMemoryWorkflowStore::new();
    let mut editor = editor();
    let a = editor.drop_module("1", Position::default()).expect("a");
    let b = editor.drop_module("1", Position::default()).expect("b");
    let c = editor.drop_module("1", Position::default()).expect("c");
    editor
        .connect(
            &PortReference::output(a.clone(), "output-1", "text"),
            &PortReference::input(b.clone(), "input-1", "text"),
        )
        .expect("a -> b");
    editor
        .connect(
            &PortReference::output(b.clone(), "output-1", "text"),
            &PortReference::input(c.clone(), "input-1", "text"),
        )
        .expect("b -> c");

    editor.remove_node(&b).expect("remove");
    let id = editor.save(&store).await.expect("save");
    let graph = store.load(id).await.expect("load");

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.nodes().iter().all(|n| {
        n.inputs.iter().chain(&n.outputs).all(|p| !p.is_connected())
    }));
}
