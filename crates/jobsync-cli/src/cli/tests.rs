use super::config_cmd::apply_init_overrides;
use super::run_cmd::{RunSettings, execute_plan};
use super::*;
use std::fs;
use tempfile::TempDir;

fn run_args(plan: PathBuf) -> RunArgs {
    RunArgs {
        plan,
        workers: None,
        status: None,
        strict_max_errors: None,
        config: None,
    }
}

fn write_plan(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("plan.json");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn run_settings_prefer_args_over_config() {
    let config = AppConfig {
        workers: 2,
        recorder: RecorderOptions::default(),
        status_path: Some(PathBuf::from("config-status.json")),
    };
    let mut args = run_args(PathBuf::from("plan.json"));
    args.workers = Some(0);
    args.strict_max_errors = Some(7);

    let settings = RunSettings::resolve(config, &args);
    assert_eq!(settings.workers, 1);
    assert_eq!(settings.recorder.strict_max_errors, 7);
    assert_eq!(
        settings.status_path,
        Some(PathBuf::from("config-status.json"))
    );
}

#[test]
fn execute_plan_writes_final_status() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(
        tmp.path(),
        r#"{
            "ref_urls": { "source_url": "https://git.example.com/tree/main" },
            "operations": [
                { "path": "dash/a.json", "action": "created" },
                { "path": "dash/b.json", "action": "updated" },
                { "path": "stale.json", "action": "ignored", "error": "unsupported" }
            ]
        }"#,
    );
    let status_path = tmp.path().join("status.json");
    let settings = RunSettings {
        workers: 2,
        status_path: Some(status_path.clone()),
        recorder: RecorderOptions::default(),
    };

    let (status, report) = execute_plan(&plan, &settings).unwrap();
    assert_eq!(report.dispatched, 3);
    assert_eq!(status.state, JobState::Success);
    assert_eq!(status.message, "completed successfully");

    let written: JobStatus =
        serde_json::from_str(&fs::read_to_string(&status_path).unwrap()).unwrap();
    assert_eq!(written, status);
}

#[test]
fn execute_plan_reports_folder_failures() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(
        tmp.path(),
        r#"{
            "operations": [
                { "path": "team/", "action": "created", "error": "denied", "folder_path": "team/" },
                { "path": "team/a.json", "action": "created" },
                { "path": "other/b.json", "action": "created" }
            ]
        }"#,
    );
    let settings = RunSettings {
        workers: 1,
        status_path: None,
        recorder: RecorderOptions::default(),
    };

    let (status, report) = execute_plan(&plan, &settings).unwrap();
    assert_eq!(report.suppressed, 1);
    assert_eq!(status.state, JobState::Error);
    assert_eq!(status.message, "completed with 1 error");
    assert_eq!(status.errors.len(), 1);
    assert!(status.errors[0].contains("failed to create folder team/"));
}

#[test]
fn init_overrides_only_given_fields() {
    let mut config = AppConfig::default();
    let args = InitArgs {
        workers: Some(16),
        status: None,
        max_error_messages: None,
        strict_max_errors: Some(3),
        checkpoint_interval_ms: None,
        config: None,
    };
    apply_init_overrides(&mut config, &args);
    assert_eq!(config.workers, 16);
    assert_eq!(config.recorder.strict_max_errors, 3);
    assert_eq!(config.recorder.max_error_messages, 20);
    assert!(config.status_path.is_none());
}

#[test]
fn cli_parses_run_command() {
    let cli = Cli::try_parse_from([
        "jobsync",
        "run",
        "--plan",
        "plan.json",
        "--workers",
        "3",
        "--strict-max-errors",
        "5",
    ])
    .unwrap();
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.plan, PathBuf::from("plan.json"));
            assert_eq!(args.workers, Some(3));
            assert_eq!(args.strict_max_errors, Some(5));
        }
        Commands::Config(_) => panic!("expected run command"),
    }
}
