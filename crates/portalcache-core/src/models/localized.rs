use serde::{Deserialize, Serialize};

/// Display language supported by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Parse a language code such as "zh", "zh-TW" or "en_US".
    /// Anything that isn't recognizably Chinese falls back to English.
    pub fn from_code(code: &str) -> Self {
        let prefix: String = code
            .trim()
            .chars()
            .take(2)
            .collect::<String>()
            .to_ascii_lowercase();
        match prefix.as_str() {
            "zh" => Language::Zh,
            _ => Language::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A bilingual string pair as delivered by the portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default, alias = "en-US")]
    pub en: String,
    #[serde(default, alias = "zh-TW")]
    pub zh: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, zh: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            zh: zh.into(),
        }
    }

    /// Same text for both languages
    pub fn uniform(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            en: text.clone(),
            zh: text,
        }
    }

    /// Pick the variant for `language`, falling back to the other one when
    /// the preferred variant is blank.
    pub fn get(&self, language: Language) -> &str {
        let (preferred, other) = match language {
            Language::En => (&self.en, &self.zh),
            Language::Zh => (&self.zh, &self.en),
        };
        if preferred.trim().is_empty() {
            other
        } else {
            preferred
        }
    }

    pub fn is_empty(&self) -> bool {
        self.en.trim().is_empty() && self.zh.trim().is_empty()
    }
}
