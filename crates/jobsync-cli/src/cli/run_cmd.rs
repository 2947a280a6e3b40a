use super::*;
pub(super) fn handle_run(args: RunArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path(args.config.clone())?;
    let config = AppConfig::load(&config_path)?;
    let settings = RunSettings::resolve(config, &args);
    let (status, report) = execute_plan(&args.plan, &settings)?;

    print_report(&report);
    print_status(&status);
    let data = serde_json::to_string_pretty(&status).context("serialize job status")?;
    println!("{data}");

    if status.state == JobState::Error {
        anyhow::bail!("job finished with errors: {}", status.message);
    }
    Ok(())
}

pub(super) struct RunSettings {
    pub(super) workers: usize,
    pub(super) status_path: Option<PathBuf>,
    pub(super) recorder: RecorderOptions,
}

impl RunSettings {
    pub(super) fn resolve(config: AppConfig, args: &RunArgs) -> Self {
        let mut recorder = config.recorder;
        if let Some(max) = args.strict_max_errors {
            recorder.strict_max_errors = max;
        }
        Self {
            workers: args.workers.unwrap_or(config.workers).max(1),
            status_path: args.status.clone().or(config.status_path),
            recorder,
        }
    }
}

pub(super) fn execute_plan(
    plan_path: &Path,
    settings: &RunSettings,
) -> anyhow::Result<(JobStatus, ReplayReport)> {
    let plan = ReplayPlan::load(plan_path)?;
    let sink = StatusSink::new(settings.status_path.clone());
    let recorder = JobProgressRecorder::with_options(
        move |status: &JobStatus| sink.publish(status),
        settings.recorder.clone(),
    );
    info!(
        job_id = %recorder.job_id(),
        plan = %plan_path.display(),
        operations = plan.operations.len(),
        "running job"
    );

    let report = run_plan(&recorder, plan, settings.workers);
    let status = match recorder.complete(report.error.as_ref()) {
        Ok(status) => status,
        Err(ProgressError::Report(err)) => {
            warn!(error = %format!("{err:#}"), "failed to publish final status");
            recorder
                .final_status()
                .context("final status missing after completion")?
        }
        Err(err) => return Err(err).context("complete job"),
    };
    Ok((status, report))
}

fn print_report(report: &ReplayReport) {
    println!(
        "Operations: dispatched {}, suppressed {}, skipped {}",
        report.dispatched, report.suppressed, report.skipped
    );
    if report.checkpoint_failures > 0 {
        println!("Checkpoint failures: {}", report.checkpoint_failures);
    }
}

fn print_status(status: &JobStatus) {
    println!("State: {}", status.state);
    println!("Message: {}", status.message);
    println!("Started: {}", format_millis(status.started));
    if let Some(finished) = status.finished {
        println!("Finished: {}", format_millis(finished));
    }
    for error in &status.errors {
        println!("  - {error}");
    }
}
