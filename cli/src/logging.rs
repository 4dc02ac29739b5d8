use colored::*;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Maps a config `log_level` string onto a tracing level
pub fn parse_level(level: Option<&str>) -> Level {
    match level.map(|l| l.trim().to_lowercase()).as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("error") => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Installs the global subscriber. Logs go to stderr so they never mix with
/// JSON written to stdout.
pub fn init(level: Option<&str>, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        parse_level(level)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        log_error(&format!("Failed to set tracing subscriber: {}", e));
    }
}

pub fn log_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("DEBUG")), Level::DEBUG);
        assert_eq!(parse_level(Some(" trace ")), Level::TRACE);
        assert_eq!(parse_level(Some("loud")), Level::WARN);
        assert_eq!(parse_level(None), Level::WARN);
    }
}
