//! Descriptor and Request Validation Tests
//!
//! Covers kind-specific preconditions and the exact process argument
//! contracts, without spawning any process.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use codescope_analysis::models::analysis::{AnalysisKind, AnalysisOptions, AnalysisRequest};
use codescope_analysis::services::analysis::JobDescriptorBuilder;
use codescope_analysis::AnalysisError;

fn builder(temp: &TempDir) -> JobDescriptorBuilder {
    JobDescriptorBuilder::new(temp.path().join("toolchain"))
}

fn interpreter() -> PathBuf {
    PathBuf::from("python3")
}

#[test]
fn test_argument_contract_per_kind() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("app.py"), "pass\n").unwrap();
    fs::create_dir(project.join(".git")).unwrap();

    let builder = builder(&temp);

    // Project: [script, project_path]
    let descriptor = builder
        .build(
            &AnalysisRequest::new(AnalysisKind::Project, &project, AnalysisOptions::default()),
            interpreter(),
        )
        .unwrap();
    assert!(descriptor.args[0].ends_with("analyzer.py"));
    assert_eq!(descriptor.args[1..], [project.display().to_string()]);

    // File: [script, file_path]
    let file = project.join("app.py");
    let descriptor = builder
        .build(
            &AnalysisRequest::new(AnalysisKind::File, &file, AnalysisOptions::default()),
            interpreter(),
        )
        .unwrap();
    assert!(descriptor.args[0].ends_with("file_analyzer.py"));
    assert_eq!(descriptor.args[1..], [file.display().to_string()]);

    // GitAnalytics: [script, project_path, scope flag, --json]
    let descriptor = builder
        .build(
            &AnalysisRequest::new(
                AnalysisKind::GitAnalytics,
                &project,
                AnalysisOptions::new().with_analytics_subtype("author_stats"),
            ),
            interpreter(),
        )
        .unwrap();
    assert!(descriptor.args[0].ends_with("git_analytics.py"));
    assert_eq!(
        descriptor.args[1..],
        [
            project.display().to_string(),
            "--author-stats".to_string(),
            "--json".to_string()
        ]
    );

    // Schema: [script, project_path]
    let descriptor = builder
        .build(
            &AnalysisRequest::new(AnalysisKind::Schema, &project, AnalysisOptions::default()),
            interpreter(),
        )
        .unwrap();
    assert!(descriptor.args[0].ends_with("schema_analyzer.py"));
    assert_eq!(descriptor.args[1..], [project.display().to_string()]);
}

#[test]
fn test_default_timeouts_per_kind() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("app.py"), "pass\n").unwrap();
    fs::create_dir(project.join(".git")).unwrap();

    let builder = builder(&temp);
    let cases = [
        (AnalysisKind::Project, 300_000),
        (AnalysisKind::GitAnalytics, 180_000),
        (AnalysisKind::Schema, 120_000),
    ];
    for (kind, expected_ms) in cases {
        let descriptor = builder
            .build(
                &AnalysisRequest::new(kind, &project, AnalysisOptions::default()),
                interpreter(),
            )
            .unwrap();
        assert_eq!(descriptor.timeout, Duration::from_millis(expected_ms), "{kind:?}");
    }

    let file = project.join("app.py");
    let descriptor = builder
        .build(
            &AnalysisRequest::new(AnalysisKind::File, &file, AnalysisOptions::default()),
            interpreter(),
        )
        .unwrap();
    assert_eq!(descriptor.timeout, Duration::from_millis(60_000));
}

#[test]
fn test_sources_in_dependency_caches_do_not_count() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    for cache in ["venv/lib", ".venv/lib", "__pycache__", "node_modules/pkg"] {
        let dir = project.join(cache);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cached.py"), "pass\n").unwrap();
    }

    let err = builder(&temp)
        .build(
            &AnalysisRequest::new(AnalysisKind::Project, &project, AnalysisOptions::default()),
            interpreter(),
        )
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidRequest(_)));

    // One real source outside the caches flips the verdict.
    fs::write(project.join("app.py"), "pass\n").unwrap();
    assert!(builder(&temp)
        .build(
            &AnalysisRequest::new(AnalysisKind::Project, &project, AnalysisOptions::default()),
            interpreter(),
        )
        .is_ok());
}

#[test]
fn test_git_analytics_requires_metadata_before_building_arguments() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("app.py"), "pass\n").unwrap();

    let err = builder(&temp)
        .build(
            &AnalysisRequest::new(
                AnalysisKind::GitAnalytics,
                &project,
                AnalysisOptions::new().with_analytics_subtype("git_commit_timeline"),
            ),
            interpreter(),
        )
        .unwrap_err();

    match err {
        AnalysisError::InvalidRequest(msg) => assert!(msg.contains("git")),
        other => panic!("unexpected error: {other}"),
    }
}
