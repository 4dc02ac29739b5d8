use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use colored::*;
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use indicatif::{ProgressBar, ProgressStyle};
use prompt_lab_core::status::{DEFAULT_ROTATION, StatusTicker};
use prompt_lab_core::templates::{
    self, DEFAULT_JSON_PROMPT, DEFAULT_SCHEMA, VIDEO_LOADING_MESSAGES, VIDEO_TEMPLATES,
    VideoTemplate,
};
use prompt_lab_core::video::prepare_video_prompt;
use prompt_lab_core::{
    AspectRatio, CancellationToken, FileStore, FrameRate, GeminiClient, GenerationOutcome,
    HistoryEntry, HistoryStore, KeyValueStore, LabConfig, LabError, MediaRegistry, MediaSlot,
    PollerConfig, SchemaDescriptor, StructuredRequester, Theme, ThemeStore, VideoJobParameters,
    VideoPoller, jsonc,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::HistoryAction;
use crate::output::{
    print_code, print_history, print_history_entry, print_json_result, print_templates,
    terminal_prefers_dark,
};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Everything the `video` subcommand needs besides the config
#[derive(Debug, Default)]
pub struct VideoOptions {
    pub prompt_file: Option<PathBuf>,
    pub template: Option<String>,
    pub pick_template: bool,
    pub aspect_ratio: AspectRatio,
    pub frame_rate: FrameRate,
    pub duration: Option<u32>,
    pub output: Option<PathBuf>,
    pub max_polls: Option<u32>,
    pub max_wait_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub dry_run: bool,
}

pub struct App {
    config: LabConfig,
    store: FileStore,
    theme: Theme,
}

impl App {
    pub fn new(config: LabConfig) -> Result<Self> {
        let data_dir = config
            .data_dir()
            .context("Could not determine the data directory")?;
        debug!("Using data directory {}", data_dir.display());
        let store = FileStore::new(data_dir);
        let theme = ThemeStore::new(store.clone()).load();
        Ok(Self {
            config,
            store,
            theme,
        })
    }

    fn dark(&self) -> bool {
        self.theme.is_dark(terminal_prefers_dark())
    }

    fn history(&self) -> HistoryStore<FileStore> {
        HistoryStore::load_with_limit(self.store.clone(), self.config.history_limit())
    }

    /// Structured JSON generation, falling back to the cookie recipe example
    pub async fn run_json(
        &self,
        prompt: Option<String>,
        schema_path: Option<&Path>,
        raw: bool,
        record_history: bool,
    ) -> Result<()> {
        let prompt = prompt.unwrap_or_else(|| DEFAULT_JSON_PROMPT.to_string());
        let schema_text = match schema_path {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema file {}", path.display()))?,
            None => DEFAULT_SCHEMA.to_string(),
        };
        self.generate_json(&prompt, &schema_text, raw, record_history)
            .await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema_text: &str,
        raw: bool,
        record_history: bool,
    ) -> Result<()> {
        if prompt.trim().is_empty() || schema_text.trim().is_empty() {
            bail!("Prompt and schema cannot be empty.");
        }
        let schema = SchemaDescriptor::from_text(schema_text)
            .context("Please fix the invalid JSON schema before submitting")?;
        let requester = StructuredRequester::new(GeminiClient::new(&self.config)?);

        let spinner = spinner("Generating JSON...")?;
        let outcome = requester.generate_outcome(prompt, &schema).await;
        spinner.finish_and_clear();

        match outcome {
            GenerationOutcome::Success(text) => {
                let display = if raw {
                    text
                } else {
                    jsonc::format_for_display(&text)
                };
                print_json_result(&display, self.dark());
                if record_history {
                    self.record_history(prompt, schema_text);
                }
                Ok(())
            }
            GenerationOutcome::Failure(message) => Err(anyhow!(message)),
        }
    }

    fn record_history(&self, prompt: &str, schema_text: &str) {
        match self.history().add(prompt, schema_text) {
            Ok(true) => debug!("Saved prompt to history"),
            Ok(false) => debug!("Prompt already in history"),
            Err(e) => warn!(error = %e, "Failed to save history"),
        }
    }

    pub async fn run_history(&self, action: HistoryAction) -> Result<()> {
        let mut history = self.history();
        match action {
            HistoryAction::List => print_history(history.entries()),
            HistoryAction::Show { index } => {
                let entry = history_entry(&history, index)?;
                print_history_entry(index, entry, self.dark());
            }
            HistoryAction::Rerun { index } => {
                let entry = history_entry(&history, index)?.clone();
                println!("{} #{}", "Re-running".cyan(), index);
                self.generate_json(&entry.prompt, &entry.schema, false, true)
                    .await?;
            }
            HistoryAction::Clear => {
                history.clear().context("Failed to clear history")?;
                println!("History cleared.");
            }
        }
        Ok(())
    }

    /// Builds the final video prompt, runs the job and saves the result
    pub async fn run_video(&self, options: VideoOptions) -> Result<()> {
        let text = video_prompt_text(&options)?;
        // Syntax errors are reported before anything is sent
        if let Some(message) = jsonc::check(&text) {
            bail!(message);
        }
        let params =
            VideoJobParameters::new(options.aspect_ratio, options.frame_rate, options.duration)?;
        let final_prompt = prepare_video_prompt(&text, &params)?;

        if options.dry_run {
            print_code(&final_prompt, "json", self.dark());
            return Ok(());
        }

        let mut poller_config = PollerConfig::from(&self.config);
        if let Some(max_polls) = options.max_polls {
            poller_config.max_polls = Some(max_polls);
        }
        if let Some(secs) = options.max_wait_secs {
            poller_config.max_wait = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = options.poll_interval_secs {
            poller_config.poll_interval = Duration::from_secs(secs);
        }

        let registry = MediaRegistry::new();
        let poller = VideoPoller::new(
            GeminiClient::new(&self.config)?,
            registry.clone(),
            poller_config,
        );

        let cancel = CancellationToken::new();
        let handler_token = cancel.clone();
        ctrlc::set_handler(move || handler_token.cancel())
            .context("Failed to install Ctrl-C handler")?;

        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
                .progress_chars("=> ")
                .tick_chars(TICK_CHARS),
        );
        bar.enable_steady_tick(Duration::from_millis(120));

        let ticker_bar = bar.clone();
        let mut ticker = StatusTicker::spawn(VIDEO_LOADING_MESSAGES, DEFAULT_ROTATION, move |m| {
            ticker_bar.set_message(m)
        });

        let progress_bar = bar.clone();
        let result = poller
            .generate_video(
                &final_prompt,
                move |percent| progress_bar.set_position(u64::from(percent)),
                &cancel,
            )
            .await;
        ticker.stop();

        let handle = match result {
            Ok(handle) => {
                bar.finish_and_clear();
                handle
            }
            Err(LabError::Cancelled) => {
                bar.abandon_with_message("Cancelled");
                println!("{}", "Video generation cancelled.".yellow());
                return Ok(());
            }
            Err(e) => {
                bar.abandon();
                return Err(anyhow::Error::new(e).context("Video generation failed"));
            }
        };

        let mut slot = MediaSlot::new(registry.clone());
        slot.replace(handle.clone());
        let path = options.output.unwrap_or_else(default_video_path);
        registry
            .save_to(&handle, &path)
            .with_context(|| format!("Failed to save video to {}", path.display()))?;
        info!(url = %handle, path = %path.display(), "Video saved");
        println!(
            "{} {} ({} bytes)",
            "Saved".green().bold(),
            path.display(),
            handle.size()
        );
        slot.clear();
        Ok(())
    }

    /// Validates a JSON-with-comments file
    pub fn run_check(&self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if text.trim().is_empty() {
            println!("{}", "Nothing to check.".dimmed());
            return Ok(());
        }
        match jsonc::check(&text) {
            None => {
                println!("{} {}", "Valid JSON:".green().bold(), path.display());
                Ok(())
            }
            Some(message) => bail!(message),
        }
    }

    pub fn run_theme(&mut self, theme: Option<Theme>) -> Result<()> {
        match theme {
            Some(theme) => {
                ThemeStore::new(self.store.clone())
                    .set(theme)
                    .context("Failed to save theme")?;
                self.theme = theme;
                println!("Theme set to {}", theme.to_string().bold());
            }
            None => {
                let resolved = if self.dark() { "dark" } else { "light" };
                println!("Theme: {} ({})", self.theme.to_string().bold(), resolved);
            }
        }
        Ok(())
    }

    pub fn run_templates(&self, name: Option<&str>) -> Result<()> {
        match name {
            None => print_templates(VIDEO_TEMPLATES),
            Some(name) => {
                let template = find_template(name)?;
                println!("{}", template.name.bold());
                print_code(template.prompt, "js", self.dark());
            }
        }
        Ok(())
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars(TICK_CHARS)
            .template("{spinner} {msg}")?,
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

/// Looks up an entry numbered from 1
fn history_entry<S: KeyValueStore>(history: &HistoryStore<S>, number: usize) -> Result<&HistoryEntry> {
    number
        .checked_sub(1)
        .and_then(|i| history.get(i))
        .ok_or_else(|| anyhow!("No history entry #{} ({} saved)", number, history.len()))
}

fn find_template(name: &str) -> Result<&'static VideoTemplate> {
    templates::find_video_template(name).ok_or_else(|| {
        let available: Vec<&str> = VIDEO_TEMPLATES.iter().map(|t| t.slug).collect();
        anyhow!(
            "Unknown template `{}`. Available: {}",
            name,
            available.join(", ")
        )
    })
}

fn pick_template() -> Result<&'static VideoTemplate> {
    let names: Vec<&str> = VIDEO_TEMPLATES.iter().map(|t| t.name).collect();
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Choose a template")
        .items(&names)
        .default(0)
        .interact()
        .context("Template selection failed")?;
    Ok(&VIDEO_TEMPLATES[index])
}

fn video_prompt_text(options: &VideoOptions) -> Result<String> {
    if let Some(path) = &options.prompt_file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()));
    }
    let template = match &options.template {
        Some(name) => find_template(name)?,
        None if options.pick_template => pick_template()?,
        None => templates::default_video_template(),
    };
    Ok(template.prompt.to_string())
}

fn default_video_path() -> PathBuf {
    PathBuf::from(format!(
        "gemini-veo-video-{}.mp4",
        Utc::now().timestamp_millis()
    ))
}
