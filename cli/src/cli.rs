use clap::{Parser, Subcommand};
use prompt_lab_core::{AspectRatio, FrameRate, Theme};
use std::path::PathBuf;

/// Experiment with JSON prompting and JSON-structured video prompts on Gemini
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a config file (defaults to ~/.config/prompt-lab/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, env = "API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Directory holding history and preferences
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate JSON constrained by a response schema
    Json {
        /// The prompt to send (defaults to the cookie recipe example)
        prompt: Option<String>,

        /// File holding the response schema, comments allowed
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Print the response exactly as received
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Do not record the prompt and schema in history
        #[arg(long, default_value_t = false)]
        no_history: bool,
    },

    /// Generate a video from a JSON-like prompt
    Video {
        /// File holding the JSON-like prompt, comments allowed
        #[arg(short, long, conflicts_with_all = ["template", "pick_template"])]
        prompt_file: Option<PathBuf>,

        /// Start from a built-in template (see `templates`)
        #[arg(short, long, conflicts_with = "pick_template")]
        template: Option<String>,

        /// Choose a built-in template interactively
        #[arg(long, default_value_t = false)]
        pick_template: bool,

        #[arg(long, default_value = "16:9")]
        aspect_ratio: AspectRatio,

        #[arg(long, default_value = "30")]
        fps: FrameRate,

        /// Target duration in seconds (1-120)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=120))]
        duration: Option<u32>,

        /// Where to save the video
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Give up after this many status checks
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_polls: Option<u32>,

        /// Give up after this many seconds of polling
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_wait_secs: Option<u64>,

        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval_secs: Option<u64>,

        /// Print the final prompt without submitting it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Validate a JSON-with-comments file without calling the API
    Check { file: PathBuf },

    /// Show, reuse or clear previous JSON prompts
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Show or set the output colour theme
    Theme { theme: Option<Theme> },

    /// List the built-in video prompt templates, or print one
    Templates { name: Option<String> },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    List,
    /// Print an entry (numbered from 1, most recent first)
    Show { index: usize },
    /// Submit an entry's prompt and schema again
    Rerun { index: usize },
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_defaults() {
        let args = Args::try_parse_from(["prompt-lab", "video", "--template", "animation"]).unwrap();
        match args.command {
            Some(Command::Video {
                template,
                aspect_ratio,
                fps,
                duration,
                dry_run,
                ..
            }) => {
                assert_eq!(template.as_deref(), Some("animation"));
                assert_eq!(aspect_ratio, AspectRatio::Widescreen);
                assert_eq!(fps, FrameRate::Standard);
                assert_eq!(duration, None);
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_video_parameters_are_parsed() {
        let args = Args::try_parse_from([
            "prompt-lab",
            "video",
            "--aspect-ratio",
            "9:16",
            "--fps",
            "60",
            "--duration",
            "8",
        ])
        .unwrap();
        match args.command {
            Some(Command::Video {
                aspect_ratio,
                fps,
                duration,
                ..
            }) => {
                assert_eq!(aspect_ratio, AspectRatio::Vertical);
                assert_eq!(fps, FrameRate::Smooth);
                assert_eq!(duration, Some(8));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_duration_is_rejected() {
        assert!(Args::try_parse_from(["prompt-lab", "video", "--duration", "0"]).is_err());
        assert!(Args::try_parse_from(["prompt-lab", "video", "--duration", "121"]).is_err());
        assert!(Args::try_parse_from(["prompt-lab", "video", "--fps", "25"]).is_err());
        assert!(Args::try_parse_from(["prompt-lab", "video", "--max-polls", "0"]).is_err());
        assert!(Args::try_parse_from(["prompt-lab", "video", "--max-wait-secs", "0"]).is_err());
        assert!(Args::try_parse_from(["prompt-lab", "video", "--poll-interval-secs", "0"]).is_err());
    }

    #[test]
    fn test_prompt_sources_conflict() {
        assert!(
            Args::try_parse_from([
                "prompt-lab",
                "video",
                "--prompt-file",
                "p.jsonc",
                "--template",
                "simple"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_history_and_theme() {
        let args = Args::try_parse_from(["prompt-lab", "history", "rerun", "2"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::History {
                action: Some(HistoryAction::Rerun { index: 2 })
            })
        ));

        let args = Args::try_parse_from(["prompt-lab", "theme", "dark"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Theme {
                theme: Some(Theme::Dark)
            })
        ));
        assert!(Args::try_parse_from(["prompt-lab", "theme", "sepia"]).is_err());
    }
}
