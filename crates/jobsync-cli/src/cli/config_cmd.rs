use super::*;
pub(super) fn handle_config(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Init(args) => handle_init(args),
        ConfigCommands::Show(args) => handle_show(args),
    }
}

pub(super) fn handle_init(args: InitArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path(args.config.clone())?;
    let mut config = AppConfig::load(&config_path)?;
    apply_init_overrides(&mut config, &args);
    config.save(&config_path)?;
    println!("Config saved to {}", config_path.display());
    Ok(())
}

pub(super) fn handle_show(args: ShowArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path(args.config)?;
    let config = AppConfig::load(&config_path)?;
    let data = serde_json::to_string_pretty(&config).context("serialize config")?;
    println!("{data}");
    Ok(())
}

pub(super) fn apply_init_overrides(config: &mut AppConfig, args: &InitArgs) {
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(status) = &args.status {
        config.status_path = Some(status.clone());
    }
    let recorder: &mut RecorderOptions = &mut config.recorder;
    if let Some(max) = args.max_error_messages {
        recorder.max_error_messages = max;
    }
    if let Some(max) = args.strict_max_errors {
        recorder.strict_max_errors = max;
    }
    if let Some(interval) = args.checkpoint_interval_ms {
        recorder.checkpoint_interval_ms = interval;
    }
}
