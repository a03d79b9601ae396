//! Display settings that feed the render derivation.

use serde::{Deserialize, Serialize};

use crate::i18n::Locale;

/// Language sent with each request so the service can answer in kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Auto,
    French,
    Tunisian,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Auto => "auto",
            Language::French => "french",
            Language::Tunisian => "tunisian",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Language::Auto),
            "french" | "fr" | "francais" | "français" => Some(Language::French),
            "tunisian" | "tn" | "ar" | "arabic" => Some(Language::Tunisian),
            _ => None,
        }
    }

    pub fn all() -> Vec<Language> {
        vec![Language::Auto, Language::French, Language::Tunisian]
    }

    /// Next language in selector order, wrapping around
    pub fn next(self) -> Self {
        match self {
            Language::Auto => Language::French,
            Language::French => Language::Tunisian,
            Language::Tunisian => Language::Auto,
        }
    }

    /// The UI strings follow the chosen language; auto-detect keeps French.
    pub fn locale(self) -> Locale {
        match self {
            Language::Tunisian => Locale::Arabic,
            Language::Auto | Language::French => Locale::French,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Everything the render derivation reads besides the transcript itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: String,
    pub language: Language,
    pub theme: Theme,
}

impl ViewState {
    pub fn locale(&self) -> Locale {
        self.language.locale()
    }
}
