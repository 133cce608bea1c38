use autostream_agent::conversation::IntentClassifier;

use crate::commands::CommandResult;

pub fn run(text: &str) -> CommandResult {
    let intent = IntentClassifier::new().classify(text);
    CommandResult::success("classify", intent.as_str())
}
