use anyhow::Result;
use clap::Parser;
use prompt_lab_core::LabConfig;
use std::process::ExitCode;

mod app;
mod cli;
mod logging;
mod output;

use crate::app::{App, VideoOptions};
use crate::cli::{Args, Command, HistoryAction};
use crate::logging::log_error;
use crate::output::print_usage_instructions;

/// Loads config, sets up logging and dispatches the subcommand
#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log_error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.log_level.as_deref(), args.verbose);

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Config file, then environment, then command-line flags
fn load_config(args: &Args) -> Result<LabConfig> {
    let mut config = match &args.config {
        Some(path) => LabConfig::load_from_file(path)?.with_env_overrides(),
        None => LabConfig::load()?,
    };
    if let Some(key) = args.api_key.clone() {
        config.api_key = Some(key);
    }
    if let Some(dir) = args.data_dir.clone() {
        config.data_dir = Some(dir);
    }
    Ok(config)
}

async fn run(args: Args, config: LabConfig) -> Result<()> {
    let Some(command) = args.command else {
        print_usage_instructions();
        return Ok(());
    };

    let mut app = App::new(config)?;
    match command {
        Command::Json {
            prompt,
            schema,
            raw,
            no_history,
        } => {
            app.run_json(prompt, schema.as_deref(), raw, !no_history)
                .await
        }
        Command::Video {
            prompt_file,
            template,
            pick_template,
            aspect_ratio,
            fps,
            duration,
            output,
            max_polls,
            max_wait_secs,
            poll_interval_secs,
            dry_run,
        } => {
            app.run_video(VideoOptions {
                prompt_file,
                template,
                pick_template,
                aspect_ratio,
                frame_rate: fps,
                duration,
                output,
                max_polls,
                max_wait_secs,
                poll_interval_secs,
                dry_run,
            })
            .await
        }
        Command::Check { file } => app.run_check(&file),
        Command::History { action } => {
            app.run_history(action.unwrap_or(HistoryAction::List))
                .await
        }
        Command::Theme { theme } => app.run_theme(theme),
        Command::Templates { name } => app.run_templates(name.as_deref()),
    }
}
