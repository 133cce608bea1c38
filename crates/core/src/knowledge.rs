//! Static product knowledge used to answer pricing questions.
//!
//! Knowledge is loaded once before the first turn is served and is read-only
//! afterwards. The pricing text is rendered at load time so every lookup
//! returns the same string.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub trait KnowledgeSource: Send + Sync {
    fn context(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("could not read knowledge file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse knowledge file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
    #[error("knowledge catalog has no plans or policies")]
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeCatalog {
    pub product: String,
    #[serde(default)]
    pub plans: Vec<PlanEntry>,
    #[serde(default)]
    pub policies: Vec<String>,
}

impl KnowledgeCatalog {
    pub fn autostream() -> Self {
        Self {
            product: "AutoStream".to_string(),
            plans: vec![
                PlanEntry {
                    name: "Basic".to_string(),
                    price: "$29/month".to_string(),
                    features: vec!["10 videos/month".to_string(), "720p resolution".to_string()],
                },
                PlanEntry {
                    name: "Pro".to_string(),
                    price: "$79/month".to_string(),
                    features: vec![
                        "Unlimited videos".to_string(),
                        "4K resolution".to_string(),
                        "AI captions".to_string(),
                    ],
                },
            ],
            policies: vec![
                "No refunds after 7 days".to_string(),
                "24/7 support available only on Pro plan".to_string(),
            ],
        }
    }

    pub fn render(&self) -> String {
        let mut text = format!("{} Pricing & Features\n", self.product);

        for plan in &self.plans {
            let _ = write!(text, "\n{} Plan:\n- {}\n", plan.name, plan.price);
            for feature in &plan.features {
                let _ = writeln!(text, "- {feature}");
            }
        }

        if !self.policies.is_empty() {
            text.push_str("\nCompany Policies:\n");
            for policy in &self.policies {
                let _ = writeln!(text, "- {policy}");
            }
        }

        text
    }
}

#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    catalog: KnowledgeCatalog,
    rendered: String,
}

impl KnowledgeBase {
    pub fn new(catalog: KnowledgeCatalog) -> Result<Self, KnowledgeError> {
        if catalog.plans.is_empty() && catalog.policies.is_empty() {
            return Err(KnowledgeError::Empty);
        }
        let rendered = catalog.render();
        Ok(Self { catalog, rendered })
    }

    pub fn builtin() -> Self {
        let catalog = KnowledgeCatalog::autostream();
        let rendered = catalog.render();
        Self { catalog, rendered }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, KnowledgeError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| KnowledgeError::ReadFile { path: path.to_path_buf(), source })?;
        let catalog = serde_json::from_str::<KnowledgeCatalog>(&raw)
            .map_err(|source| KnowledgeError::ParseFile { path: path.to_path_buf(), source })?;
        Self::new(catalog)
    }

    /// Loads the configured file, or the built-in catalog when none is set.
    pub fn load(path: Option<&Path>) -> Result<Self, KnowledgeError> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn catalog(&self) -> &KnowledgeCatalog {
        &self.catalog
    }
}

impl KnowledgeSource for KnowledgeBase {
    fn context(&self) -> &str {
        &self.rendered
    }
}
