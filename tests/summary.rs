// tests/summary.rs

//! Saving a run's cloned packages and restoring them in a later run.

mod common;

use common::{FakeCloner, FakeCompetingResolver, Workspace, graph_of};
use pkgfetch::{Error, NodeState, ResolutionSummary, fetch_packages};

#[test]
fn test_restore_reproduces_previous_run() {
    let ws = Workspace::new();
    ws.write_input(&graph_of(&["zlib", "bash"]));
    let summary_path = ws.path("summary.json");

    let first = FakeCloner::new(&ws.out_dir)
        .provides("zlib", &["zlib-1.2.13-1"])
        .provides("bash", &["bash-5.2-1"]);
    let config = ws.config().with_output_summary(Some(summary_path.clone()));
    fetch_packages(&config, &FakeCompetingResolver::new(&[]), |_| Ok(first.boxed())).unwrap();
    let saved = ResolutionSummary::load(&summary_path).unwrap();
    assert_eq!(saved.len(), 2);

    let second = FakeCloner::new(&ws.out_dir);
    let config = ws.config().with_input_summary(Some(summary_path.clone()));
    let report = fetch_packages(&config, &FakeCompetingResolver::new(&[]), |_| Ok(second.boxed()))
        .unwrap()
        .unwrap();

    assert!(report.restored);
    let repo = second.repo();
    assert_eq!(repo.provides_calls, 0);
    assert!(repo.clone_calls.is_empty());
    assert_eq!(repo.restored.as_ref(), Some(&saved));
    assert_eq!(repo.cloned, first.repo().cloned);
    assert!(repo.converted);
}

#[test]
fn test_restore_leaves_nodes_alone() {
    let ws = Workspace::new();
    ws.write_input(&graph_of(&["zlib"]));
    let summary_path = ws.path("summary.json");
    ResolutionSummary::new().save(&summary_path).unwrap();

    let cloner = FakeCloner::new(&ws.out_dir).provides("zlib", &["zlib-1.2.13-1"]);
    let config = ws.config().with_input_summary(Some(summary_path));
    fetch_packages(&config, &FakeCompetingResolver::new(&[]), |_| Ok(cloner.boxed())).unwrap();

    assert_eq!(ws.read_output().node(0).unwrap().state, NodeState::Unresolved);
}

#[test]
fn test_corrupt_summary_is_fatal() {
    let ws = Workspace::new();
    ws.write_input(&graph_of(&["zlib"]));
    let summary_path = ws.path("summary.json");
    std::fs::write(&summary_path, "{ not json").unwrap();

    let cloner = FakeCloner::new(&ws.out_dir);
    let config = ws.config().with_input_summary(Some(summary_path));
    let result = fetch_packages(&config, &FakeCompetingResolver::new(&[]), |_| Ok(cloner.boxed()));

    assert!(matches!(result, Err(Error::SummaryRestoreError(_))));
    assert!(cloner.repo().restored.is_none());
    assert!(!ws.output_graph.exists());
}

#[test]
fn test_summary_saved_on_stop_on_failure() {
    let ws = Workspace::new();
    ws.write_input(&graph_of(&["zlib", "ghost"]));
    let summary_path = ws.path("summary.json");

    let cloner = FakeCloner::new(&ws.out_dir).provides("zlib", &["zlib-1.2.13-1"]);
    let config = ws
        .config()
        .with_stop_on_failure(true)
        .with_output_summary(Some(summary_path.clone()));
    let result = fetch_packages(&config, &FakeCompetingResolver::new(&[]), |_| Ok(cloner.boxed()));

    assert!(matches!(result, Err(Error::StopOnFailure(_))));
    let saved = ResolutionSummary::load(&summary_path).unwrap();
    assert_eq!(
        saved.get("zlib-1.2.13-1").map(|p| p.rpm_path.clone()),
        Some(ws.out_dir.join("zlib-1.2.13-1.rpm"))
    );
}
