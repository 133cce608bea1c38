//! Dialogue runtime - intent routing and lead capture for AutoStream
//!
//! This crate turns one line of user text into one agent reply:
//! - Classifies the utterance into a coarse intent with ordered keyword rules
//! - Answers greetings, pricing questions, and unclear requests
//! - Collects `name`, `email`, and `platform` before handing a lead downstream
//!
//! # Architecture
//!
//! Each turn follows a fixed pipeline:
//! 1. **Intent Classification** (`conversation`) - text -> `IntentTag`
//! 2. **Response Dispatch** (`controller`) - intent + state -> reply
//! 3. **Slot Collection** (`slots`) - parse `key: value` replies while a lead
//!    is pending, instead of classifying them
//! 4. **Lead Hand-off** (`lead_capture`) - fire-and-forget `LeadSink`
//!
//! # Key Types
//!
//! - `AgentRuntime` - owns the pipeline and the mode machine (see `runtime`)
//! - `Conversation` - explicitly owned per-conversation state passed to every turn
//! - `LeadSink` - pluggable destination for captured leads

pub mod controller;
pub mod conversation;
pub mod lead_capture;
pub mod runtime;
pub mod slots;

pub use controller::{ControllerOutcome, DialogueController};
pub use conversation::IntentClassifier;
pub use lead_capture::{InMemoryLeadSink, JsonlLeadSink, LeadSink, LoggingLeadSink};
pub use runtime::{AgentRuntime, Conversation, RuntimePolicy, TurnOutcome};
