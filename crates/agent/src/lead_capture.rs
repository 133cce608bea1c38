use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use autostream_core::config::{AppConfig, LeadSinkKind};
use autostream_core::domain::lead::Lead;
use autostream_core::errors::ApplicationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Downstream hand-off for completed leads. Fire-and-forget: implementations
/// must not report failure to the caller.
pub trait LeadSink: Send + Sync {
    fn capture(&self, lead: &Lead);
}

impl<T> LeadSink for Box<T>
where
    T: LeadSink + ?Sized,
{
    fn capture(&self, lead: &Lead) {
        (**self).capture(lead);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingLeadSink;

impl LeadSink for LoggingLeadSink {
    fn capture(&self, lead: &Lead) {
        tracing::info!(
            event_name = "lead.captured",
            name = %lead.name,
            email = %lead.email,
            platform = %lead.platform,
            "lead captured successfully"
        );
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub lead_id: String,
    pub captured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub lead: Lead,
}

impl LeadRecord {
    fn new(lead: &Lead) -> Self {
        Self { lead_id: Uuid::new_v4().to_string(), captured_at: Utc::now(), lead: lead.clone() }
    }
}

/// Appends one JSON record per lead to a file.
#[derive(Clone, Debug)]
pub struct JsonlLeadSink {
    path: PathBuf,
}

impl JsonlLeadSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_append(&self, lead: &Lead) -> Result<LeadRecord, ApplicationError> {
        let record = LeadRecord::new(lead);
        let line = serde_json::to_string(&record)
            .map_err(|error| ApplicationError::LeadSink(error.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| {
                ApplicationError::LeadSink(format!("create `{}`: {error}", parent.display()))
            })?;
        }

        let mut file =
            OpenOptions::new().create(true).append(true).open(&self.path).map_err(|error| {
                ApplicationError::LeadSink(format!("open `{}`: {error}", self.path.display()))
            })?;
        writeln!(file, "{line}").map_err(|error| {
            ApplicationError::LeadSink(format!("write `{}`: {error}", self.path.display()))
        })?;

        Ok(record)
    }
}

impl LeadSink for JsonlLeadSink {
    fn capture(&self, lead: &Lead) {
        match self.try_append(lead) {
            Ok(record) => tracing::info!(
                event_name = "lead.captured",
                lead_id = %record.lead_id,
                path = %self.path.display(),
                "lead appended to file"
            ),
            Err(error) => tracing::warn!(
                event_name = "lead.capture_failed",
                path = %self.path.display(),
                error = %error,
                "lead could not be recorded"
            ),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryLeadSink {
    leads: Arc<Mutex<Vec<Lead>>>,
}

impl InMemoryLeadSink {
    pub fn leads(&self) -> Vec<Lead> {
        match self.leads.lock() {
            Ok(leads) => leads.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LeadSink for InMemoryLeadSink {
    fn capture(&self, lead: &Lead) {
        match self.leads.lock() {
            Ok(mut leads) => leads.push(lead.clone()),
            Err(poisoned) => poisoned.into_inner().push(lead.clone()),
        }
    }
}

/// Builds the sink selected by `leads.sink`.
pub fn sink_from_config(config: &AppConfig) -> Box<dyn LeadSink> {
    match (config.leads.sink, config.leads.path.as_ref()) {
        (LeadSinkKind::Jsonl, Some(path)) => Box::new(JsonlLeadSink::new(path.clone())),
        _ => Box::new(LoggingLeadSink),
    }
}
