use serde::{Deserialize, Serialize};

/// Contact details handed to a lead sink once every slot is filled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub platform: String,
}

impl Lead {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), email: email.into(), platform: platform.into() }
    }
}
