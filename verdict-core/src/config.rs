use crate::error::ConfigError;
use crate::filter::CommentFilter;
use crate::phrases::StopWords;
use crate::types::{ExpansionLimit, VerdictCategory};
use crate::verdict::{VerdictClassifier, DEFAULT_MARKERS};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "verdict-phrases.toml";

pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "REDDIT_REFRESH_TOKEN";

/// Reply expansion as written in the config file: `"unbounded"` or a round count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExpansionSetting {
    Rounds(u32),
    Keyword(String),
}

impl Default for ExpansionSetting {
    fn default() -> Self {
        ExpansionSetting::Keyword("unbounded".to_string())
    }
}

impl ExpansionSetting {
    pub fn to_limit(&self) -> Result<ExpansionLimit, ConfigError> {
        match self {
            ExpansionSetting::Rounds(n) => Ok(ExpansionLimit::Rounds(*n)),
            ExpansionSetting::Keyword(word) if word.eq_ignore_ascii_case("unbounded") => {
                Ok(ExpansionLimit::Unbounded)
            }
            ExpansionSetting::Keyword(word) => Err(ConfigError::InvalidValue {
                field: "expansion".to_string(),
                value: word.clone(),
            }),
        }
    }
}

/// Where a verdict marker leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerTarget {
    Asshole,
    NotAsshole,
    None,
}

impl From<MarkerTarget> for Option<VerdictCategory> {
    fn from(target: MarkerTarget) -> Self {
        match target {
            MarkerTarget::Asshole => Some(VerdictCategory::Asshole),
            MarkerTarget::NotAsshole => Some(VerdictCategory::NotAsshole),
            MarkerTarget::None => None,
        }
    }
}

impl From<Option<VerdictCategory>> for MarkerTarget {
    fn from(category: Option<VerdictCategory>) -> Self {
        match category {
            Some(VerdictCategory::Asshole) => MarkerTarget::Asshole,
            Some(VerdictCategory::NotAsshole) => MarkerTarget::NotAsshole,
            None => MarkerTarget::None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub user_agent: String,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            refresh_token: None,
            user_agent: format!("rust:verdict-phrases:v{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source_channel: String,
    pub destination_channel: String,
    pub post_count: u32,
    pub expansion: ExpansionSetting,
    pub excluded_users: Vec<String>,
    pub stop_words: Vec<String>,
    pub use_default_stop_words: bool,
    pub bar_count: usize,
    pub classify: bool,
    pub verdict_markers: BTreeMap<String, MarkerTarget>,
    pub output_path: PathBuf,
    pub dry_run: bool,
    pub reddit: RedditSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_channel: "amitheasshole".to_string(),
            destination_channel: "dataisbeautiful".to_string(),
            post_count: 200,
            expansion: ExpansionSetting::default(),
            excluded_users: vec!["AutoModerator".to_string(), "Judgement_Bot_AITA".to_string()],
            stop_words: Vec::new(),
            use_default_stop_words: true,
            bar_count: 10,
            classify: true,
            verdict_markers: DEFAULT_MARKERS
                .iter()
                .map(|(marker, category)| (marker.to_string(), MarkerTarget::from(*category)))
                .collect(),
            output_path: PathBuf::from("top_phrases_combined.png"),
            dry_run: false,
            reddit: RedditSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `path` when given; otherwise the default file when it exists,
    /// else built-in defaults. Environment credentials are applied and the
    /// result validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::read_file(default_path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        info!("Loading configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Credentials from the environment take precedence over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CLIENT_ID) {
            self.reddit.client_id = Some(value);
        }
        if let Some(value) = lookup(ENV_CLIENT_SECRET) {
            self.reddit.client_secret = Some(value);
        }
        if let Some(value) = lookup(ENV_REFRESH_TOKEN) {
            self.reddit.refresh_token = Some(value);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("source_channel", &self.source_channel),
            ("destination_channel", &self.destination_channel),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        if self.post_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "post_count".to_string(),
                value: "0".to_string(),
            });
        }
        if self.bar_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bar_count".to_string(),
                value: "0".to_string(),
            });
        }

        self.expansion.to_limit()?;
        if self.classify {
            self.classifier()?;
        }

        // Reading listings needs OAuth as much as posting does
        for (field, value) in [
            ("reddit.client_id", &self.reddit.client_id),
            ("reddit.client_secret", &self.reddit.client_secret),
            ("reddit.refresh_token", &self.reddit.refresh_token),
        ] {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn expansion_limit(&self) -> Result<ExpansionLimit, ConfigError> {
        self.expansion.to_limit()
    }

    pub fn comment_filter(&self) -> CommentFilter {
        CommentFilter::new(self.excluded_users.iter().cloned())
    }

    pub fn stop_word_set(&self) -> StopWords {
        let mut stop_words = if self.use_default_stop_words {
            StopWords::english()
        } else {
            StopWords::empty()
        };
        stop_words.extend(&self.stop_words);
        stop_words
    }

    pub fn classifier(&self) -> Result<VerdictClassifier, ConfigError> {
        VerdictClassifier::new(
            self.verdict_markers
                .iter()
                .map(|(marker, target)| (marker.clone(), Option::<VerdictCategory>::from(*target))),
        )
    }
}
