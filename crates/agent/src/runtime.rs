use autostream_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink,
};
use autostream_core::config::AppConfig;
use autostream_core::domain::conversation::ConversationState;
use autostream_core::domain::intent::IntentTag;
use autostream_core::domain::lead::Lead;
use autostream_core::errors::DomainError;
use autostream_core::flows::{
    DialogueEvent, DialogueMode, FlowAction, FlowContext, FlowEngine, LeadCaptureFlow,
};
use autostream_core::knowledge::KnowledgeSource;

use crate::controller::{ControllerOutcome, DialogueController, PARSE_FAILURE_RESPONSE};
use crate::conversation::IntentClassifier;
use crate::lead_capture::LeadSink;
use crate::slots::parse_slot_reply;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimePolicy {
    pub reset_slots_after_capture: bool,
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        Self { reset_slots_after_capture: true }
    }
}

impl RuntimePolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { reset_slots_after_capture: config.conversation.reset_slots_after_capture }
    }
}

/// A single conversation: its state plus the identifiers used for auditing.
#[derive(Clone, Debug)]
pub struct Conversation {
    pub audit: AuditContext,
    pub turn: u64,
    pub state: ConversationState,
}

impl Conversation {
    pub fn new(audit: AuditContext) -> Self {
        Self { audit, turn: 0, state: ConversationState::new() }
    }

    pub fn id(&self) -> &str {
        &self.audit.conversation_id
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub response: String,
    pub intent: IntentTag,
    pub mode: DialogueMode,
    pub captured_lead: Option<Lead>,
    pub parse_error: Option<DomainError>,
}

pub struct AgentRuntime<K, L> {
    classifier: IntentClassifier,
    controller: DialogueController<K, L>,
    flow: FlowEngine<LeadCaptureFlow>,
    policy: RuntimePolicy,
    audit_sink: Box<dyn AuditSink>,
}

impl<K, L> AgentRuntime<K, L>
where
    K: KnowledgeSource,
    L: LeadSink,
{
    pub fn new(knowledge: K, lead_sink: L, policy: RuntimePolicy) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            controller: DialogueController::new(knowledge, lead_sink),
            flow: FlowEngine::default(),
            policy,
            audit_sink: Box::new(TracingAuditSink),
        }
    }

    pub fn with_audit_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit_sink = Box::new(sink);
        self
    }

    pub fn controller(&self) -> &DialogueController<K, L> {
        &self.controller
    }

    pub fn start_conversation(&self, actor: &str) -> Conversation {
        let conversation = Conversation::new(AuditContext::for_new_conversation(actor));
        tracing::debug!(
            event_name = "conversation.started",
            conversation_id = %conversation.id(),
            "conversation started"
        );
        conversation
    }

    /// Runs one turn. In normal mode the input is classified and dispatched;
    /// in slot-collection mode it is parsed as a slot reply and the
    /// high-intent branch is re-evaluated within the same turn.
    pub fn handle_turn(&self, conversation: &mut Conversation, text: &str) -> TurnOutcome {
        conversation.turn += 1;
        conversation.state.user_input = text.to_string();

        match conversation.state.mode {
            DialogueMode::Normal => self.handle_normal_turn(conversation, text),
            DialogueMode::SlotCollection => self.handle_slot_reply(conversation, text),
        }
    }

    fn handle_normal_turn(&self, conversation: &mut Conversation, text: &str) -> TurnOutcome {
        let intent = self.classifier.classify(text);
        conversation.state.intent = intent;
        self.emit(
            conversation,
            "intent.classified",
            AuditCategory::Intent,
            AuditOutcome::Success,
            |event| event.with_metadata("intent", intent.as_str()),
        );

        let outcome = self.controller.respond(&mut conversation.state);
        self.advance(conversation, outcome)
    }

    fn handle_slot_reply(&self, conversation: &mut Conversation, text: &str) -> TurnOutcome {
        match parse_slot_reply(text) {
            Ok(update) => {
                update.apply(&mut conversation.state);
                let filled = update
                    .filled_fields()
                    .iter()
                    .map(|field| field.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                let missing = conversation
                    .state
                    .missing_slots()
                    .iter()
                    .map(|field| field.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                self.emit(
                    conversation,
                    "slots.collected",
                    AuditCategory::Slots,
                    AuditOutcome::Success,
                    |event| event.with_metadata("filled", filled).with_metadata("missing", missing),
                );

                // Slot replies always resume the high-intent branch.
                conversation.state.intent = IntentTag::HighIntent;
                let outcome = self.controller.respond(&mut conversation.state);
                self.advance(conversation, outcome)
            }
            Err(error) => {
                self.emit(
                    conversation,
                    "slots.parse_failed",
                    AuditCategory::Slots,
                    AuditOutcome::Rejected,
                    |event| event.with_metadata("error", error.to_string()),
                );
                conversation.state.response = PARSE_FAILURE_RESPONSE.to_string();
                self.transition(conversation, DialogueEvent::SlotParseFailed);
                self.outcome(conversation, None, Some(error))
            }
        }
    }

    fn advance(&self, conversation: &mut Conversation, outcome: ControllerOutcome) -> TurnOutcome {
        let (event, captured_lead) = match outcome {
            ControllerOutcome::Answered => (DialogueEvent::Answered, None),
            ControllerOutcome::PromptedForSlots => (DialogueEvent::SlotsRequested, None),
            ControllerOutcome::LeadCaptured(lead) => {
                self.emit(
                    conversation,
                    "lead.captured",
                    AuditCategory::Lead,
                    AuditOutcome::Success,
                    |event| event.with_metadata("platform", lead.platform.clone()),
                );
                (DialogueEvent::LeadCaptured, Some(lead))
            }
        };

        self.transition(conversation, event);
        self.outcome(conversation, captured_lead, None)
    }

    fn transition(&self, conversation: &mut Conversation, event: DialogueEvent) {
        let context = FlowContext {
            missing_slots: conversation.state.missing_slots(),
            reset_slots_after_capture: self.policy.reset_slots_after_capture,
        };

        let result = self.flow.apply_with_audit(
            &conversation.state.mode,
            &event,
            &context,
            self.audit_sink.as_ref(),
            &conversation.audit,
            conversation.turn,
        );

        match result {
            Ok(transition) => {
                for action in &transition.actions {
                    match action {
                        FlowAction::ClearSlots => conversation.state.clear_slots(),
                        FlowAction::AwaitSlotReply => {}
                    }
                }
                conversation.state.mode = transition.to;
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "flow.transition_rejected",
                    conversation_id = %conversation.id(),
                    error = %error,
                    "dialogue transition rejected; returning to normal mode"
                );
                conversation.state.mode = DialogueMode::Normal;
            }
        }
    }

    fn outcome(
        &self,
        conversation: &Conversation,
        captured_lead: Option<Lead>,
        parse_error: Option<DomainError>,
    ) -> TurnOutcome {
        TurnOutcome {
            response: conversation.state.response.clone(),
            intent: conversation.state.intent,
            mode: conversation.state.mode,
            captured_lead,
            parse_error,
        }
    }

    fn emit(
        &self,
        conversation: &Conversation,
        event_type: &str,
        category: AuditCategory,
        outcome: AuditOutcome,
        decorate: impl FnOnce(AuditEvent) -> AuditEvent,
    ) {
        let event =
            AuditEvent::new(&conversation.audit, conversation.turn, event_type, category, outcome);
        self.audit_sink.emit(decorate(event));
    }
}
