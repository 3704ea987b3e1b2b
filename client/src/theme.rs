//! Process-wide light/dark theme.
//!
//! Initialised once from the persisted preference, mutated only through
//! [`toggle_theme`], observed through [`current`] or a [`subscribe`] receiver.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

static THEME: OnceLock<watch::Sender<Theme>> = OnceLock::new();

/// Resolves `System` from a `COLORFGBG`-style value ("fg;bg"). Dark when unknown.
pub fn resolve(preference: ThemePreference, colorfgbg: Option<&str>) -> Theme {
    match preference {
        ThemePreference::Light => Theme::Light,
        ThemePreference::Dark => Theme::Dark,
        ThemePreference::System => {
            let background = colorfgbg
                .and_then(|v| v.rsplit(';').next())
                .and_then(|bg| bg.trim().parse::<u8>().ok());
            match background {
                Some(bg) if bg == 7 || (9..=15).contains(&bg) => Theme::Light,
                _ => Theme::Dark,
            }
        }
    }
}

/// Installs the process-wide theme. Later calls keep the first value.
pub fn init(preference: ThemePreference) -> Theme {
    let colorfgbg = std::env::var("COLORFGBG").ok();
    let theme = resolve(preference, colorfgbg.as_deref());
    *THEME.get_or_init(|| watch::channel(theme).0).borrow()
}

fn sender() -> &'static watch::Sender<Theme> {
    THEME.get_or_init(|| watch::channel(resolve(ThemePreference::System, None)).0)
}

pub fn current() -> Theme {
    *sender().borrow()
}

pub fn toggle_theme() -> Theme {
    let mut next = Theme::Dark;
    sender().send_modify(|theme| {
        *theme = theme.toggled();
        next = *theme;
    });
    log::debug!("Theme switched to {:?}", next);
    next
}

pub fn subscribe() -> watch::Receiver<Theme> {
    sender().subscribe()
}
