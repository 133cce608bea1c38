use autostream_core::domain::conversation::ConversationState;
use autostream_core::domain::intent::IntentTag;
use autostream_core::domain::lead::Lead;
use autostream_core::knowledge::KnowledgeSource;

use crate::lead_capture::LeadSink;

pub const GREETING_RESPONSE: &str = "Hi! How can I help you with AutoStream today?";
pub const CLARIFY_RESPONSE: &str = "Can you please clarify your request?";
pub const SLOT_PROMPT_RESPONSE: &str = "Great! To get started, please provide your name, email, and the platform you use (e.g., Name: Abc, Email: Abc@example.com, Platform: YouTube).";
pub const LEAD_CAPTURED_RESPONSE: &str =
    "Lead captured successfully! Our team will contact you soon.";
pub const PARSE_FAILURE_RESPONSE: &str = "Sorry, I couldn't parse that. Please try again in the format: Name: ..., Email: ..., Platform: ...";

/// Which branch `respond` took.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControllerOutcome {
    Answered,
    PromptedForSlots,
    LeadCaptured(Lead),
}

pub struct DialogueController<K, L> {
    knowledge: K,
    lead_sink: L,
}

impl<K, L> DialogueController<K, L>
where
    K: KnowledgeSource,
    L: LeadSink,
{
    pub fn new(knowledge: K, lead_sink: L) -> Self {
        Self { knowledge, lead_sink }
    }

    pub fn knowledge(&self) -> &K {
        &self.knowledge
    }

    pub fn lead_sink(&self) -> &L {
        &self.lead_sink
    }

    /// Writes `state.response` for the current intent. Slots are read but
    /// never cleared here. A slot set already handed to the sink is answered
    /// with the capture confirmation without firing the sink again.
    pub fn respond(&self, state: &mut ConversationState) -> ControllerOutcome {
        match state.intent {
            IntentTag::Greeting => {
                state.response = GREETING_RESPONSE.to_string();
                ControllerOutcome::Answered
            }
            IntentTag::Pricing => {
                state.response = self.knowledge.context().to_string();
                ControllerOutcome::Answered
            }
            IntentTag::HighIntent if state.lead_captured => {
                state.response = LEAD_CAPTURED_RESPONSE.to_string();
                ControllerOutcome::Answered
            }
            IntentTag::HighIntent => match state.completed_lead() {
                None => {
                    state.response = SLOT_PROMPT_RESPONSE.to_string();
                    ControllerOutcome::PromptedForSlots
                }
                Some(lead) => {
                    self.lead_sink.capture(&lead);
                    state.mark_lead_captured();
                    state.response = LEAD_CAPTURED_RESPONSE.to_string();
                    ControllerOutcome::LeadCaptured(lead)
                }
            },
            IntentTag::Unknown => {
                state.response = CLARIFY_RESPONSE.to_string();
                ControllerOutcome::Answered
            }
        }
    }
}
