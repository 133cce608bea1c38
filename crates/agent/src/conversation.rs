use autostream_core::domain::intent::IntentTag;

/// One classification rule: the tag wins when any keyword is a substring of
/// the case-folded utterance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordRule {
    pub tag: IntentTag,
    pub keywords: &'static [&'static str],
}

/// Rules in priority order. Earlier rules shadow later ones.
pub const DEFAULT_RULES: &[KeywordRule] = &[
    KeywordRule { tag: IntentTag::Greeting, keywords: &["hi", "hello", "hey"] },
    KeywordRule { tag: IntentTag::Pricing, keywords: &["price", "pricing", "plan", "cost"] },
    KeywordRule { tag: IntentTag::HighIntent, keywords: &["buy", "try", "sign up", "pro plan"] },
];

#[derive(Clone, Debug)]
pub struct IntentClassifier {
    rules: &'static [KeywordRule],
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self { rules: DEFAULT_RULES }
    }

    pub fn classify(&self, text: &str) -> IntentTag {
        let normalized_text = normalize_text(text);
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|keyword| normalized_text.contains(keyword)))
            .map(|rule| rule.tag)
            .unwrap_or(IntentTag::Unknown)
    }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}
