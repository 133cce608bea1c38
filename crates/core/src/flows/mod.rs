pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, LeadCaptureFlow};
pub use states::{
    DialogueEvent, DialogueMode, FlowAction, FlowContext, FlowType, TransitionOutcome,
};
