pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod knowledge;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use domain::conversation::{ConversationState, SlotField};
pub use domain::intent::IntentTag;
pub use domain::lead::Lead;
pub use errors::{ApplicationError, DomainError};
pub use flows::{DialogueEvent, DialogueMode, FlowEngine, FlowTransitionError, LeadCaptureFlow};
pub use knowledge::{KnowledgeBase, KnowledgeError, KnowledgeSource};
