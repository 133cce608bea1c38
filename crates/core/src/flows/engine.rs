use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::conversation::SlotField;
use crate::flows::states::{
    DialogueEvent, DialogueMode, FlowAction, FlowContext, FlowType, TransitionOutcome,
};

pub trait FlowDefinition {
    fn flow_type(&self) -> FlowType;
    fn initial_mode(&self) -> DialogueMode;
    fn transition(
        &self,
        current: &DialogueMode,
        event: &DialogueEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct LeadCaptureFlow;

impl FlowDefinition for LeadCaptureFlow {
    fn flow_type(&self) -> FlowType {
        FlowType::LeadCapture
    }

    fn initial_mode(&self) -> DialogueMode {
        DialogueMode::Normal
    }

    fn transition(
        &self,
        current: &DialogueMode,
        event: &DialogueEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_lead_capture(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow.flow_type()
    }

    pub fn initial_mode(&self) -> DialogueMode {
        self.flow.initial_mode()
    }

    pub fn apply(
        &self,
        current: &DialogueMode,
        event: &DialogueEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &DialogueMode,
        event: &DialogueEvent,
        context: &FlowContext,
        sink: &S,
        audit: &AuditContext,
        turn: u64,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) if outcome.from != outcome.to => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        turn,
                        "flow.transition_applied",
                        AuditCategory::Flow,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Ok(_) => {}
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        turn,
                        "flow.transition_rejected",
                        AuditCategory::Flow,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<LeadCaptureFlow> {
    fn default() -> Self {
        Self::new(LeadCaptureFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("lead cannot be captured from {mode:?} while slots are missing: {missing_slots:?}")]
    IncompleteSlots { mode: DialogueMode, missing_slots: Vec<SlotField> },
    #[error("slot prompt issued from {mode:?} although every slot is filled")]
    SlotsAlreadyFilled { mode: DialogueMode },
    #[error("invalid transition from {mode:?} using event {event:?}")]
    InvalidTransition { mode: DialogueMode, event: DialogueEvent },
}

fn transition_lead_capture(
    current: &DialogueMode,
    event: &DialogueEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use DialogueEvent::{Answered, LeadCaptured, SlotParseFailed, SlotsRequested};
    use DialogueMode::{Normal, SlotCollection};
    use FlowAction::{AwaitSlotReply, ClearSlots};

    let (to, actions) = match (current, event) {
        (Normal, Answered) => (Normal, Vec::new()),
        (Normal, SlotsRequested) | (SlotCollection, SlotsRequested) => {
            if context.missing_slots.is_empty() {
                return Err(FlowTransitionError::SlotsAlreadyFilled { mode: *current });
            }
            (SlotCollection, vec![AwaitSlotReply])
        }
        (Normal, LeadCaptured) | (SlotCollection, LeadCaptured) => {
            if !context.missing_slots.is_empty() {
                return Err(FlowTransitionError::IncompleteSlots {
                    mode: *current,
                    missing_slots: context.missing_slots.clone(),
                });
            }
            let actions =
                if context.reset_slots_after_capture { vec![ClearSlots] } else { Vec::new() };
            (Normal, actions)
        }
        (SlotCollection, SlotParseFailed) => (Normal, vec![ClearSlots]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                mode: *current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), actions })
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::domain::conversation::SlotField;
    use crate::flows::engine::{FlowDefinition, FlowEngine, FlowTransitionError, LeadCaptureFlow};
    use crate::flows::states::{DialogueEvent, DialogueMode, FlowAction, FlowContext, FlowType};

    fn missing(slots: &[SlotField]) -> FlowContext {
        FlowContext { missing_slots: slots.to_vec(), reset_slots_after_capture: true }
    }

    #[test]
    fn prompt_then_capture_returns_to_normal_and_clears_slots() {
        let engine = FlowEngine::new(LeadCaptureFlow);
        let mode = engine.initial_mode();

        let prompted = engine
            .apply(&mode, &DialogueEvent::SlotsRequested, &missing(&SlotField::ALL))
            .expect("normal -> slot collection should succeed");
        assert_eq!(prompted.to, DialogueMode::SlotCollection);
        assert_eq!(prompted.actions, vec![FlowAction::AwaitSlotReply]);

        let captured = engine
            .apply(&prompted.to, &DialogueEvent::LeadCaptured, &missing(&[]))
            .expect("slot collection -> normal should succeed");
        assert_eq!(captured.to, DialogueMode::Normal);
        assert_eq!(captured.actions, vec![FlowAction::ClearSlots]);
    }

    #[test]
    fn capture_keeps_slots_when_reset_policy_is_off() {
        let engine = FlowEngine::default();
        let context = FlowContext { missing_slots: Vec::new(), reset_slots_after_capture: false };

        let captured = engine
            .apply(&DialogueMode::SlotCollection, &DialogueEvent::LeadCaptured, &context)
            .expect("capture should succeed");
        assert!(captured.actions.is_empty());
    }

    #[test]
    fn reprompt_stays_in_slot_collection() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(
                &DialogueMode::SlotCollection,
                &DialogueEvent::SlotsRequested,
                &missing(&[SlotField::Email]),
            )
            .expect("reprompt should succeed");
        assert_eq!(outcome.to, DialogueMode::SlotCollection);
    }

    #[test]
    fn parse_failure_returns_to_normal_with_cleared_slots() {
        let engine = FlowEngine::default();
        let outcome = engine
            .apply(
                &DialogueMode::SlotCollection,
                &DialogueEvent::SlotParseFailed,
                &missing(&SlotField::ALL),
            )
            .expect("parse failure should be recoverable");
        assert_eq!(outcome.to, DialogueMode::Normal);
        assert_eq!(outcome.actions, vec![FlowAction::ClearSlots]);
    }

    #[test]
    fn capture_with_missing_slots_is_rejected() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(
                &DialogueMode::Normal,
                &DialogueEvent::LeadCaptured,
                &missing(&[SlotField::Name]),
            )
            .expect_err("capture must require every slot");
        assert_eq!(
            error,
            FlowTransitionError::IncompleteSlots {
                mode: DialogueMode::Normal,
                missing_slots: vec![SlotField::Name],
            }
        );
    }

    #[test]
    fn prompt_with_all_slots_filled_is_rejected() {
        let engine = FlowEngine::default();
        let error = engine
            .apply(&DialogueMode::Normal, &DialogueEvent::SlotsRequested, &missing(&[]))
            .expect_err("prompt must require a missing slot");
        assert!(matches!(error, FlowTransitionError::SlotsAlreadyFilled { .. }));
    }

    #[test]
    fn answered_and_parse_failure_are_invalid_in_the_wrong_mode() {
        let engine = FlowEngine::default();
        let context = missing(&SlotField::ALL);

        assert!(matches!(
            engine.apply(&DialogueMode::SlotCollection, &DialogueEvent::Answered, &context),
            Err(FlowTransitionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            engine.apply(&DialogueMode::Normal, &DialogueEvent::SlotParseFailed, &context),
            Err(FlowTransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn audited_transitions_record_mode_changes_and_rejections() {
        let engine = FlowEngine::default();
        let sink = InMemoryAuditSink::default();
        let audit = AuditContext::new("conv-1", "flow-engine");

        engine
            .apply_with_audit(
                &DialogueMode::Normal,
                &DialogueEvent::SlotsRequested,
                &missing(&SlotField::ALL),
                &sink,
                &audit,
                1,
            )
            .expect("prompt should succeed");
        engine
            .apply_with_audit(
                &DialogueMode::Normal,
                &DialogueEvent::Answered,
                &missing(&SlotField::ALL),
                &sink,
                &audit,
                2,
            )
            .expect("answer should succeed");
        let rejected = engine.apply_with_audit(
            &DialogueMode::Normal,
            &DialogueEvent::SlotParseFailed,
            &missing(&SlotField::ALL),
            &sink,
            &audit,
            3,
        );
        assert!(rejected.is_err());

        assert_eq!(
            sink.event_types(),
            vec!["flow.transition_applied".to_string(), "flow.transition_rejected".to_string()]
        );
    }

    #[test]
    fn flow_definition_reports_type() {
        assert_eq!(LeadCaptureFlow.flow_type(), FlowType::LeadCapture);
    }
}
