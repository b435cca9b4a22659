//! The closed set of locales the app can present itself in.
//!
//! Every locale carries the BCP-47 tag handed to the speech-synthesis
//! subsystem and a native display name for language-selector data. The set
//! is closed on purpose: catalog classification (see [`crate::core::catalog`])
//! depends on being able to decide "is this key a locale code?" exactly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Locale every leaf falls back to when it has no value for the requested
/// locale. A single designated default, applied uniformly.
pub const DEFAULT_LOCALE: Locale = Locale::En;

/// Supported app locales (ISO-639-1-based codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Es,
    Fr,
    De,
    Pt,
    It,
    Ja,
    Nl,
    Ru,
    Zh,
    Hi,
    Ar,
    Bn,
    Ko,
    Tr,
    Pl,
    Sv,
    Vi,
    Id,
    Ur,
    Tl,
    Th,
    El,
    Cs,
    Hu,
    Ro,
    Da,
    Fi,
}

impl Default for Locale {
    fn default() -> Self {
        DEFAULT_LOCALE
    }
}

impl Locale {
    /// Every supported locale, in stable presentation order.
    pub const ALL: [Locale; 28] = [
        Locale::En,
        Locale::Es,
        Locale::Fr,
        Locale::De,
        Locale::Pt,
        Locale::It,
        Locale::Ja,
        Locale::Nl,
        Locale::Ru,
        Locale::Zh,
        Locale::Hi,
        Locale::Ar,
        Locale::Bn,
        Locale::Ko,
        Locale::Tr,
        Locale::Pl,
        Locale::Sv,
        Locale::Vi,
        Locale::Id,
        Locale::Ur,
        Locale::Tl,
        Locale::Th,
        Locale::El,
        Locale::Cs,
        Locale::Hu,
        Locale::Ro,
        Locale::Da,
        Locale::Fi,
    ];

    /// The canonical two-letter code.
    pub const fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
            Locale::Fr => "fr",
            Locale::De => "de",
            Locale::Pt => "pt",
            Locale::It => "it",
            Locale::Ja => "ja",
            Locale::Nl => "nl",
            Locale::Ru => "ru",
            Locale::Zh => "zh",
            Locale::Hi => "hi",
            Locale::Ar => "ar",
            Locale::Bn => "bn",
            Locale::Ko => "ko",
            Locale::Tr => "tr",
            Locale::Pl => "pl",
            Locale::Sv => "sv",
            Locale::Vi => "vi",
            Locale::Id => "id",
            Locale::Ur => "ur",
            Locale::Tl => "tl",
            Locale::Th => "th",
            Locale::El => "el",
            Locale::Cs => "cs",
            Locale::Hu => "hu",
            Locale::Ro => "ro",
            Locale::Da => "da",
            Locale::Fi => "fi",
        }
    }

    /// BCP-47 tag handed to the speech-synthesis subsystem.
    pub const fn speech_tag(self) -> &'static str {
        match self {
            Locale::En => "en-US",
            Locale::Es => "es-ES",
            Locale::Fr => "fr-FR",
            Locale::De => "de-DE",
            Locale::Pt => "pt-BR",
            Locale::It => "it-IT",
            Locale::Ja => "ja-JP",
            Locale::Nl => "nl-NL",
            Locale::Ru => "ru-RU",
            Locale::Zh => "zh-CN",
            Locale::Hi => "hi-IN",
            Locale::Ar => "ar-SA",
            Locale::Bn => "bn-BD",
            Locale::Ko => "ko-KR",
            Locale::Tr => "tr-TR",
            Locale::Pl => "pl-PL",
            Locale::Sv => "sv-SE",
            Locale::Vi => "vi-VN",
            Locale::Id => "id-ID",
            Locale::Ur => "ur-PK",
            Locale::Tl => "tl-PH",
            Locale::Th => "th-TH",
            Locale::El => "el-GR",
            Locale::Cs => "cs-CZ",
            Locale::Hu => "hu-HU",
            Locale::Ro => "ro-RO",
            Locale::Da => "da-DK",
            Locale::Fi => "fi-FI",
        }
    }

    /// Native display name, for language-selector data.
    pub const fn display_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Es => "Español",
            Locale::Fr => "Français",
            Locale::De => "Deutsch",
            Locale::Pt => "Português",
            Locale::It => "Italiano",
            Locale::Ja => "日本語",
            Locale::Nl => "Nederlands",
            Locale::Ru => "Русский",
            Locale::Zh => "中文",
            Locale::Hi => "हिन्दी",
            Locale::Ar => "العربية",
            Locale::Bn => "বাংলা",
            Locale::Ko => "한국어",
            Locale::Tr => "Türkçe",
            Locale::Pl => "Polski",
            Locale::Sv => "Svenska",
            Locale::Vi => "Tiếng Việt",
            Locale::Id => "Bahasa Indonesia",
            Locale::Ur => "اردو",
            Locale::Tl => "Tagalog",
            Locale::Th => "ไทย",
            Locale::El => "Ελληνικά",
            Locale::Cs => "Čeština",
            Locale::Hu => "Magyar",
            Locale::Ro => "Română",
            Locale::Da => "Dansk",
            Locale::Fi => "Suomi",
        }
    }

    /// Parse a locale value, case-insensitive and tolerant of region tags
    /// ("en-GB" and "en_GB" both resolve to `En`).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let normalized = value.to_ascii_lowercase();
        let primary = normalized.split(['-', '_']).next().unwrap_or("");
        Locale::ALL.iter().copied().find(|l| l.code() == primary)
    }

    /// True when `key` is a member of the closed locale-code set. Used by
    /// catalog construction to classify leaves.
    pub fn is_locale_code(key: &str) -> bool {
        Locale::ALL.iter().any(|l| l.code() == key)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s).ok_or_else(|| format!("Unknown locale code: {s}"))
    }
}
