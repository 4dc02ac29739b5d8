use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::errors::{LabError, LabResult};
use crate::storage::KeyValueStore;

pub const THEME_STORAGE_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    /// Resolves `System` using the environment's preference.
    pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
        match self {
            Theme::Light => false,
            Theme::Dark => true,
            Theme::System => system_prefers_dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(LabError::Validation(format!(
                "Unknown theme `{}` (expected light, dark or system)",
                other
            ))),
        }
    }
}

/// Persisted theme preference
#[derive(Debug)]
pub struct ThemeStore<S> {
    store: S,
}

impl<S: KeyValueStore> ThemeStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored preference; anything missing or unrecognised reads as `System`.
    pub fn load(&self) -> Theme {
        match self.store.get(THEME_STORAGE_KEY) {
            Ok(Some(value)) => value.parse().unwrap_or_else(|_| {
                warn!(value = %value, "Ignoring unknown stored theme");
                Theme::System
            }),
            Ok(None) => Theme::System,
            Err(e) => {
                warn!(error = %e, "Failed to read theme preference");
                Theme::System
            }
        }
    }

    pub fn set(&self, theme: Theme) -> LabResult<()> {
        self.store.set(THEME_STORAGE_KEY, theme.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[test]
    fn test_defaults_to_system() {
        let themes = ThemeStore::new(InMemoryStore::new());
        assert_eq!(themes.load(), Theme::System);
    }

    #[test]
    fn test_round_trip_and_unknown_value() {
        let store = InMemoryStore::new();
        let themes = ThemeStore::new(store.clone());
        themes.set(Theme::Dark).unwrap();
        assert_eq!(themes.load(), Theme::Dark);

        store.set(THEME_STORAGE_KEY, "sepia").unwrap();
        assert_eq!(themes.load(), Theme::System);
    }

    #[test]
    fn test_is_dark() {
        assert!(!Theme::Light.is_dark(true));
        assert!(Theme::Dark.is_dark(false));
        assert!(Theme::System.is_dark(true));
        assert!(!Theme::System.is_dark(false));
    }
}
