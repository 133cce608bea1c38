use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub knowledge: KnowledgeConfig,
    pub leads: LeadsConfig,
    pub conversation: ConversationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default)]
pub struct KnowledgeConfig {
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LeadsConfig {
    pub sink: LeadSinkKind,
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ConversationConfig {
    pub reset_slots_after_capture: bool,
    pub exit_words: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSinkKind {
    Log,
    Jsonl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub knowledge_path: Option<PathBuf>,
    pub lead_sink: Option<LeadSinkKind>,
    pub leads_path: Option<PathBuf>,
    pub reset_slots_after_capture: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            knowledge: KnowledgeConfig { path: None },
            leads: LeadsConfig { sink: LeadSinkKind::Log, path: None },
            conversation: ConversationConfig {
                reset_slots_after_capture: true,
                exit_words: vec!["exit".to_string(), "quit".to_string()],
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LeadSinkKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "jsonl" => Ok(Self::Jsonl),
            other => Err(ConfigError::Validation(format!(
                "unsupported lead sink `{other}` (expected log|jsonl)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("autostream.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// True when `input` (trimmed, case-folded) is one of the configured exit words.
    pub fn is_exit_word(&self, input: &str) -> bool {
        let normalized = input.trim().to_ascii_lowercase();
        self.conversation
            .exit_words
            .iter()
            .any(|word| word.trim().eq_ignore_ascii_case(&normalized))
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(knowledge) = patch.knowledge {
            if let Some(path) = knowledge.path {
                self.knowledge.path = Some(path);
            }
        }

        if let Some(leads) = patch.leads {
            if let Some(sink) = leads.sink {
                self.leads.sink = sink;
            }
            if let Some(path) = leads.path {
                self.leads.path = Some(path);
            }
        }

        if let Some(conversation) = patch.conversation {
            if let Some(reset) = conversation.reset_slots_after_capture {
                self.conversation.reset_slots_after_capture = reset;
            }
            if let Some(exit_words) = conversation.exit_words {
                self.conversation.exit_words =
                    exit_words.into_iter().map(|word| word.trim().to_string()).collect();
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AUTOSTREAM_KNOWLEDGE_PATH") {
            self.knowledge.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("AUTOSTREAM_LEADS_SINK") {
            self.leads.sink = value.parse()?;
        }
        if let Some(value) = read_env("AUTOSTREAM_LEADS_PATH") {
            self.leads.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("AUTOSTREAM_CONVERSATION_RESET_SLOTS_AFTER_CAPTURE") {
            self.conversation.reset_slots_after_capture =
                parse_bool("AUTOSTREAM_CONVERSATION_RESET_SLOTS_AFTER_CAPTURE", &value)?;
        }
        if let Some(value) = read_env("AUTOSTREAM_CONVERSATION_EXIT_WORDS") {
            self.conversation.exit_words = value
                .split(',')
                .map(|word| word.trim().to_string())
                .filter(|word| !word.is_empty())
                .collect();
        }

        let log_level =
            read_env("AUTOSTREAM_LOGGING_LEVEL").or_else(|| read_env("AUTOSTREAM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AUTOSTREAM_LOGGING_FORMAT").or_else(|| read_env("AUTOSTREAM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(knowledge_path) = overrides.knowledge_path {
            self.knowledge.path = Some(knowledge_path);
        }
        if let Some(lead_sink) = overrides.lead_sink {
            self.leads.sink = lead_sink;
        }
        if let Some(leads_path) = overrides.leads_path {
            self.leads.path = Some(leads_path);
        }
        if let Some(reset) = overrides.reset_slots_after_capture {
            self.conversation.reset_slots_after_capture = reset;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_knowledge(&self.knowledge)?;
        validate_leads(&self.leads)?;
        validate_conversation(&self.conversation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("autostream.toml"), PathBuf::from("config/autostream.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_knowledge(knowledge: &KnowledgeConfig) -> Result<(), ConfigError> {
    if let Some(path) = &knowledge.path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "knowledge.path must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_leads(leads: &LeadsConfig) -> Result<(), ConfigError> {
    if leads.sink == LeadSinkKind::Jsonl && leads.path.is_none() {
        return Err(ConfigError::Validation(
            "leads.path is required when leads.sink is `jsonl`".to_string(),
        ));
    }
    Ok(())
}

fn validate_conversation(conversation: &ConversationConfig) -> Result<(), ConfigError> {
    if conversation.exit_words.iter().any(|word| word.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "conversation.exit_words must not contain blank entries".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    knowledge: Option<KnowledgePatch>,
    leads: Option<LeadsPatch>,
    conversation: Option<ConversationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgePatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LeadsPatch {
    sink: Option<LeadSinkKind>,
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationPatch {
    reset_slots_after_capture: Option<bool>,
    exit_words: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
