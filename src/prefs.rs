use std::fmt;

use anyhow::Result;

use crate::store::KeyValueStore;

pub const THEME_KEY: &str = "theme";
pub const FONT_SIZE_KEY: &str = "fontSize";

pub const DEFAULT_FONT_SIZE: f64 = 1.1;
pub const MIN_FONT_SIZE: f64 = 0.8;
pub const MAX_FONT_SIZE: f64 = 2.0;
pub const FONT_SIZE_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Theme and font size, persisted next to reading progress.
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn theme(&self) -> Result<Theme> {
        let stored = self.store.get(THEME_KEY)?;
        Ok(match stored.as_deref().map(str::trim) {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        })
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    pub fn toggle_theme(&self) -> Result<Theme> {
        let next = self.theme()?.toggled();
        self.set_theme(next)?;
        log::debug!("theme switched to {next}");
        Ok(next)
    }

    pub fn font_size(&self) -> Result<f64> {
        let stored = self.store.get(FONT_SIZE_KEY)?;
        let size = stored
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|size| size.is_finite())
            .unwrap_or(DEFAULT_FONT_SIZE);
        Ok(clamp_font_size(size))
    }

    pub fn adjust_font_size(&self, delta: f64) -> Result<f64> {
        let next = clamp_font_size(self.font_size()? + delta);
        self.store.set(FONT_SIZE_KEY, &format_font_size(next))?;
        Ok(next)
    }

    pub fn reset_font_size(&self) -> Result<f64> {
        self.store
            .set(FONT_SIZE_KEY, &format_font_size(DEFAULT_FONT_SIZE))?;
        Ok(DEFAULT_FONT_SIZE)
    }
}

/// Clamps into the accepted range and snaps to one decimal so repeated steps
/// do not accumulate float drift.
pub fn clamp_font_size(size: f64) -> f64 {
    let snapped = (size * 10.0).round() / 10.0;
    snapped.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

pub fn format_font_size(size: f64) -> String {
    format!("{size:.1}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn theme_defaults_to_light_and_toggles_back() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(&store);

        assert_eq!(prefs.theme().unwrap(), Theme::Light);
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(prefs.theme().unwrap(), Theme::Light);
    }

    #[test]
    fn unknown_stored_theme_reads_as_light() {
        let store = MemoryStore::new();
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(Preferences::new(&store).theme().unwrap(), Theme::Light);
    }

    #[test]
    fn font_size_defaults_and_steps() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(&store);

        assert_eq!(prefs.font_size().unwrap(), DEFAULT_FONT_SIZE);
        assert_eq!(prefs.adjust_font_size(FONT_SIZE_STEP).unwrap(), 1.2);
        assert_eq!(prefs.adjust_font_size(FONT_SIZE_STEP).unwrap(), 1.3);
        assert_eq!(store.get(FONT_SIZE_KEY).unwrap().as_deref(), Some("1.3"));
        assert_eq!(prefs.adjust_font_size(-FONT_SIZE_STEP).unwrap(), 1.2);
    }

    #[test]
    fn font_size_stays_within_bounds() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(&store);

        for _ in 0..20 {
            prefs.adjust_font_size(FONT_SIZE_STEP).unwrap();
        }
        assert_eq!(prefs.font_size().unwrap(), MAX_FONT_SIZE);
        for _ in 0..30 {
            prefs.adjust_font_size(-FONT_SIZE_STEP).unwrap();
        }
        assert_eq!(prefs.font_size().unwrap(), MIN_FONT_SIZE);
    }

    #[test]
    fn reset_restores_default() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(&store);

        prefs.adjust_font_size(0.5).unwrap();
        assert_eq!(prefs.reset_font_size().unwrap(), DEFAULT_FONT_SIZE);
        assert_eq!(store.get(FONT_SIZE_KEY).unwrap().as_deref(), Some("1.1"));
    }

    #[test]
    fn garbage_or_out_of_range_font_size_is_sanitized() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(&store);

        store.set(FONT_SIZE_KEY, "huge").unwrap();
        assert_eq!(prefs.font_size().unwrap(), DEFAULT_FONT_SIZE);
        store.set(FONT_SIZE_KEY, "7.5").unwrap();
        assert_eq!(prefs.font_size().unwrap(), MAX_FONT_SIZE);
        store.set(FONT_SIZE_KEY, "1.2000000000000002").unwrap();
        assert_eq!(prefs.font_size().unwrap(), 1.2);
    }
}
