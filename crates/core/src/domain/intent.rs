use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentTag {
    Greeting,
    Pricing,
    HighIntent,
    #[default]
    Unknown,
}

impl IntentTag {
    pub const ALL: [IntentTag; 4] =
        [IntentTag::Greeting, IntentTag::Pricing, IntentTag::HighIntent, IntentTag::Unknown];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Pricing => "pricing",
            Self::HighIntent => "high_intent",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
