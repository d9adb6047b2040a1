//! Entry point tests: workspace isolation, delegation and failure propagation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use plugin_regression_core::fakes::{Outcome, ScriptedTestFactory};
use plugin_regression_core::workspace::MANIFEST_FILE;
use plugin_regression_core::{
    AppSource, CommandTestFactory, Dataset, HarnessConfig, HarnessError, LoadProfile,
    PluginTester, Scenario, UnitError, Variant,
};

fn dataset() -> Dataset {
    Dataset::new("small", "s3://homes/small", "s3://dbs/small")
}

fn task_dirs(root: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_dir())
        .collect()
}

#[tokio::test]
async fn test_run_isolates_workspace_and_writes_manifest() {
    let out = tempfile::tempdir().unwrap();
    let factory = Arc::new(ScriptedTestFactory::new());
    let tester = PluginTester::new(
        factory,
        dataset(),
        HarnessConfig::default().with_output_dir(out.path()),
    )
    .unwrap();

    let results = tester
        .run(
            Path::new("target/load.jar"),
            &Scenario::new("browse-boards"),
            Variant::new(AppSource::Empty),
            Variant::new(AppSource::maven("com.example", "plugin", "1.0.0")),
            LoadProfile::default(),
            "9.4.0",
        )
        .await
        .unwrap();

    assert_eq!(results.baseline.cohort.as_str(), "no-app");
    assert_eq!(results.experiment.cohort.as_str(), "1.0.0");

    let tasks = task_dirs(out.path());
    assert_eq!(tasks.len(), 1);
    let test_dir = tasks[0].join("Plugin%20Test");
    assert!(test_dir.is_dir());

    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(test_dir.join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(manifest["request"]["target_version"], "9.4.0");
    assert_eq!(manifest["request"]["scenario"], "browse-boards");
    assert_eq!(manifest["digest"].as_str().unwrap().len(), 64);
    assert!(results.baseline.results_dir.starts_with(&test_dir));
}

#[tokio::test]
async fn test_each_run_gets_a_fresh_workspace() {
    let out = tempfile::tempdir().unwrap();
    let tester = PluginTester::new(
        Arc::new(ScriptedTestFactory::new()),
        dataset(),
        HarnessConfig::default().with_output_dir(out.path()),
    )
    .unwrap();

    for _ in 0..2 {
        tester
            .run(
                Path::new("load.jar"),
                &Scenario::new("s"),
                Variant::new(AppSource::Empty),
                Variant::new(AppSource::Empty),
                LoadProfile::default(),
                "9.4.0",
            )
            .await
            .unwrap();
    }

    assert_eq!(task_dirs(out.path()).len(), 2);
}

#[tokio::test]
async fn test_failure_propagates_unchanged() {
    let out = tempfile::tempdir().unwrap();
    let factory = Arc::new(
        ScriptedTestFactory::new()
            .script("no-app*", Outcome::fail_execution(Duration::ZERO, "timed out")),
    );
    let tester = PluginTester::new(
        factory,
        dataset(),
        HarnessConfig::default().with_output_dir(out.path()),
    )
    .unwrap();

    let err = tester
        .run(
            Path::new("load.jar"),
            &Scenario::new("s"),
            Variant::new(AppSource::Empty),
            Variant::new(AppSource::Empty),
            LoadProfile::default(),
            "9.4.0",
        )
        .await
        .unwrap_err();

    match err {
        HarnessError::Unit { cohort, source } => {
            assert_eq!(cohort.as_str(), "no-app*");
            assert!(matches!(source, UnitError::Execution(ref r) if r == "timed out"));
        }
        other => panic!("expected unit error, got {other:?}"),
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = PluginTester::new(
        Arc::new(ScriptedTestFactory::new()),
        dataset(),
        HarnessConfig::default().with_lifespan(Duration::ZERO),
    );
    assert!(matches!(result, Err(HarnessError::Config(_))));
}

#[tokio::test]
async fn test_command_backed_comparison_end_to_end() {
    let out = tempfile::tempdir().unwrap();
    let factory = Arc::new(CommandTestFactory::new(vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"printf '{"cohort":"%s","users":%s}' "$PLUGIN_REGRESSION_COHORT" "$PLUGIN_REGRESSION_VIRTUAL_USERS""#
            .to_string(),
    ]));
    let tester = PluginTester::new(
        factory,
        dataset(),
        HarnessConfig::default()
            .with_output_dir(out.path())
            .with_lifespan(Duration::from_secs(30)),
    )
    .unwrap();

    let results = tester
        .run(
            Path::new("load.jar"),
            &Scenario::new("s"),
            Variant::new(AppSource::maven("g", "a", "7.2.0")),
            Variant::new(AppSource::maven("g", "a", "7.2.0")),
            LoadProfile {
                virtual_users: 3,
                ..LoadProfile::default()
            },
            "9.4.0",
        )
        .await
        .unwrap();

    assert_eq!(results.baseline.metrics["cohort"], "7.2.0");
    assert_eq!(results.experiment.metrics["cohort"], "7.2.0*");
    assert_eq!(results.experiment.metrics["users"], 3);
    assert_ne!(results.baseline.results_dir, results.experiment.results_dir);
    assert!(results.experiment.results_dir.join("stdout.log").is_file());
}

#[tokio::test]
async fn test_labels_that_look_alike_on_disk_get_distinct_directories() {
    let out = tempfile::tempdir().unwrap();
    let factory = Arc::new(CommandTestFactory::new(vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"printf '%s' "$PLUGIN_REGRESSION_COHORT""#.to_string(),
    ]));
    let tester = PluginTester::new(
        factory,
        dataset(),
        HarnessConfig::default()
            .with_output_dir(out.path())
            .with_lifespan(Duration::from_secs(30)),
    )
    .unwrap();

    for (baseline, experiment) in [("7.2.0-star", "7.2.0*"), ("my plugin.jar", "my_plugin.jar")] {
        let results = tester
            .run(
                Path::new("load.jar"),
                &Scenario::new("s"),
                Variant::labeled(AppSource::Empty, baseline),
                Variant::labeled(AppSource::Empty, experiment),
                LoadProfile::default(),
                "9.4.0",
            )
            .await
            .unwrap();

        assert_eq!(results.baseline.cohort.as_str(), baseline);
        assert_eq!(results.experiment.cohort.as_str(), experiment);
        assert_ne!(results.baseline.results_dir, results.experiment.results_dir);

        let logged = |dir: &Path| std::fs::read_to_string(dir.join("stdout.log")).unwrap();
        assert_eq!(logged(results.baseline.results_dir.as_path()), baseline);
        assert_eq!(logged(results.experiment.results_dir.as_path()), experiment);
    }
}
