use autostream_core::domain::conversation::{ConversationState, SlotField};
use autostream_core::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotUpdate {
    pub values: Vec<(SlotField, String)>,
    pub ignored_keys: Vec<String>,
}

impl SlotUpdate {
    pub fn apply(&self, state: &mut ConversationState) {
        for (field, value) in &self.values {
            state.set_slot(*field, value.as_str());
        }
    }

    pub fn filled_fields(&self) -> Vec<SlotField> {
        self.values.iter().map(|(field, _)| *field).collect()
    }
}

/// Parses a reply of the form `Name: ..., Email: ..., Platform: ...`.
///
/// Segments are split on `,`. Blank segments are skipped, segments with an
/// unknown key are ignored, and a non-blank segment without `:` fails the
/// whole reply. A key repeated later in the reply overrides the earlier value.
pub fn parse_slot_reply(text: &str) -> Result<SlotUpdate, DomainError> {
    let mut update = SlotUpdate::default();

    for segment in text.split(',').map(str::trim) {
        if segment.is_empty() {
            continue;
        }

        let Some((key, value)) = segment.split_once(':') else {
            return Err(DomainError::SlotParse { segment: segment.to_string() });
        };

        match SlotField::from_key(key) {
            Some(field) => update.values.push((field, value.trim().to_string())),
            None => update.ignored_keys.push(key.trim().to_string()),
        }
    }

    Ok(update)
}
