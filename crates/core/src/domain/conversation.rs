use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::intent::IntentTag;
use crate::domain::lead::Lead;
use crate::flows::states::DialogueMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotField {
    Name,
    Email,
    Platform,
}

impl SlotField {
    pub const ALL: [SlotField; 3] = [SlotField::Name, SlotField::Email, SlotField::Platform];

    /// Matches a slot key case-insensitively, ignoring surrounding whitespace.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "platform" => Some(Self::Platform),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Platform => "platform",
        }
    }
}

impl fmt::Display for SlotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memory of a single conversation. Created empty at session start and
/// threaded by the caller through every turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_input: String,
    pub intent: IntentTag,
    pub name: String,
    pub email: String,
    pub platform: String,
    pub response: String,
    pub mode: DialogueMode,
    /// Set once the current slot set has been handed to the lead sink.
    /// Cleared by any slot write.
    #[serde(default)]
    pub lead_captured: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, field: SlotField) -> &str {
        match field {
            SlotField::Name => &self.name,
            SlotField::Email => &self.email,
            SlotField::Platform => &self.platform,
        }
    }

    pub fn set_slot(&mut self, field: SlotField, value: impl Into<String>) {
        let value = value.into();
        match field {
            SlotField::Name => self.name = value,
            SlotField::Email => self.email = value,
            SlotField::Platform => self.platform = value,
        }
        self.lead_captured = false;
    }

    pub fn missing_slots(&self) -> Vec<SlotField> {
        SlotField::ALL.into_iter().filter(|field| self.slot(*field).is_empty()).collect()
    }

    pub fn slots_complete(&self) -> bool {
        self.missing_slots().is_empty()
    }

    /// Returns the lead only when all three slots are non-empty and this
    /// slot set has not been captured yet.
    pub fn completed_lead(&self) -> Option<Lead> {
        if self.lead_captured {
            return None;
        }
        self.slots_complete().then(|| Lead::new(&self.name, &self.email, &self.platform))
    }

    pub fn mark_lead_captured(&mut self) {
        self.lead_captured = true;
    }

    pub fn clear_slots(&mut self) {
        self.name.clear();
        self.email.clear();
        self.platform.clear();
        self.lead_captured = false;
    }
}
