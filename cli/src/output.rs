use colored::*;
use prompt_lab_core::HistoryEntry;
use prompt_lab_core::templates::VideoTemplate;
use std::io::{self, IsTerminal};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

pub const DARK_PALETTE: &str = "base16-ocean.dark";
pub const LIGHT_PALETTE: &str = "InspiredGitHub";

const PREVIEW_WIDTH: usize = 60;

/// Guesses the terminal background from `COLORFGBG` (`fg;bg` or `fg;default;bg`).
/// Unknown terminals are treated as dark.
pub fn terminal_prefers_dark() -> bool {
    prefers_dark_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

pub fn prefers_dark_from_colorfgbg(value: Option<&str>) -> bool {
    let background = value
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok());
    match background {
        // 7 and 9-15 are the light entries of the 16 colour palette
        Some(bg) => !(bg == 7 || bg >= 9),
        None => true,
    }
}

/// Highlights `code` for a 24-bit terminal using the syntax registered for `token`
pub fn highlight(code: &str, token: &str, dark: bool) -> String {
    let syntax_set = SyntaxSet::load_defaults_newlines();
    let theme_set = ThemeSet::load_defaults();
    let palette = if dark { DARK_PALETTE } else { LIGHT_PALETTE };
    let Some(theme) = theme_set.themes.get(palette) else {
        return code.to_string();
    };
    let syntax = syntax_set
        .find_syntax_by_token(token)
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut output = String::new();
    for line in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line, &syntax_set) {
            Ok(ranges) => output.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
            Err(_) => output.push_str(line),
        }
    }
    // Reset so the prompt does not inherit the last colour
    output.push_str("\x1b[0m");
    output
}

/// Prints code, highlighted only when stdout is a terminal
pub fn print_code(code: &str, token: &str, dark: bool) {
    if io::stdout().is_terminal() {
        print!("{}", highlight(code, token, dark));
    } else {
        print!("{}", code);
    }
    if !code.ends_with('\n') {
        println!();
    }
}

/// Print a generated JSON result
pub fn print_json_result(text: &str, dark: bool) {
    println!("{}", "Result".blue().bold());
    println!("{}", "─".repeat(40).dimmed());
    print_code(text, "json", dark);
    println!("{}", "─".repeat(40).dimmed());
}

pub fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("{}", "No history yet.".dimmed());
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}  {}  {}",
            (i + 1).to_string().yellow().bold(),
            preview(&entry.prompt, PREVIEW_WIDTH),
            entry.id.dimmed()
        );
    }
}

pub fn print_history_entry(number: usize, entry: &HistoryEntry, dark: bool) {
    println!("{} {}", format!("#{}", number).yellow().bold(), entry.id.dimmed());
    println!("{}", "Prompt:".cyan());
    println!("{}", entry.prompt);
    println!("{}", "Schema:".cyan());
    print_code(&entry.schema, "json", dark);
}

pub fn print_templates(templates: &[VideoTemplate]) {
    for template in templates {
        println!("  {:<16} {}", template.slug.green().bold(), template.name);
    }
}

/// Show usage instructions when no subcommand is given
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "prompt-lab json \"your prompt\" --schema schema.json".green().bold());
    println!("    Generate JSON that follows a response schema");
    println!();
    println!("  {}", "prompt-lab video --template documentary --duration 8".green().bold());
    println!("    Generate a video from a JSON-like prompt");
    println!();
    println!("  {}", "prompt-lab check prompt.jsonc".green().bold());
    println!("    Validate a JSON file that may contain comments");
    println!();
    println!("{}", "Other commands:".cyan());
    println!("  history [list|show N|rerun N|clear]");
    println!("  templates [NAME]");
    println!("  theme [light|dark|system]");
    println!();
    println!("Set API_KEY (or GEMINI_API_KEY) before calling the API.");
    println!("Run with --help for every option.");
}

/// First line of `text`, cut to `width` characters
fn preview(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > width || text.trim().contains('\n') {
        let cut: String = line.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}
