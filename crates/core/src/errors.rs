use thiserror::Error;

use crate::config::ConfigError;
use crate::knowledge::KnowledgeError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("slot reply segment `{segment}` is not a `key: value` pair")]
    SlotParse { segment: String },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
    #[error("lead sink failure: {0}")]
    LeadSink(String),
}

impl ApplicationError {
    /// Stable class name used in CLI result payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "config_validation",
            Self::Knowledge(_) => "knowledge_load",
            Self::LeadSink(_) => "lead_sink",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Knowledge(_) => 3,
            Self::LeadSink(_) => 4,
        }
    }
}
