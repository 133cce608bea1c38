use serde::{Deserialize, Serialize};

use crate::domain::conversation::SlotField;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    LeadCapture,
}

/// How the next user input is read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueMode {
    /// Input is classified and dispatched by intent.
    #[default]
    Normal,
    /// Input is parsed as a `key: value` slot reply.
    SlotCollection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueEvent {
    Answered,
    SlotsRequested,
    SlotParseFailed,
    LeadCaptured,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub missing_slots: Vec<SlotField>,
    pub reset_slots_after_capture: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    AwaitSlotReply,
    ClearSlots,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogueMode,
    pub to: DialogueMode,
    pub event: DialogueEvent,
    pub actions: Vec<FlowAction>,
}
