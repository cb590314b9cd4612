//! Prompt languages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language the model is asked to answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    /// Simplified Chinese
    Chinese,
    TraditionalChinese,
}

impl Language {
    pub const ALL: [Language; 3] = [
        Language::English,
        Language::Chinese,
        Language::TraditionalChinese,
    ];

    /// Key used in template files.
    pub fn key(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Chinese => "chinese",
            Language::TraditionalChinese => "traditional_chinese",
        }
    }

    /// Parse a user-supplied language, falling back to English for anything
    /// unrecognized.
    pub fn parse_or_default(input: &str) -> Self {
        input.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown language '{input}', falling back to english");
            Language::default()
        })
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "english" | "en" => Ok(Language::English),
            "chinese" | "zh" | "zh_cn" | "zh_hans" | "simplified_chinese" => Ok(Language::Chinese),
            "traditional_chinese" | "zh_tw" | "zh_hk" | "zh_hant" => {
                Ok(Language::TraditionalChinese)
            }
            _ => Err(format!("unknown language: {s}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
