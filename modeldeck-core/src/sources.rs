//! Vendor sources.
//!
//! A source is one configured account at a vendor. Models fetched through a
//! source are namespaced by its id, so two OpenAI accounts can coexist.

use serde::{Deserialize, Serialize};

/// Supported LLM API vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// OpenAI and OpenAI-compatible hosts
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::OpenAi => write!(f, "openai"),
        }
    }
}

impl Vendor {
    /// Parse from string, falling back to the default vendor.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "openai" => Vendor::OpenAi,
            other => {
                tracing::warn!(vendor = %other, "Unknown vendor, using openai");
                Vendor::OpenAi
            }
        }
    }

    /// Human readable vendor name.
    pub fn name(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "OpenAI",
        }
    }
}

/// A configured vendor source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSource {
    /// Source id, e.g. "openai" or "openai-2"
    pub id: String,
    /// Display label, e.g. "OpenAI #2"
    pub label: String,
    pub vendor: Vendor,
}

impl ModelSource {
    /// Create a new source for `vendor`, picking an id not used by `existing`.
    ///
    /// The first source of a vendor takes the bare vendor id; later ones are
    /// suffixed starting at `-2`.
    pub fn new_for_vendor(vendor: Vendor, existing: &[ModelSource]) -> Self {
        let base = vendor.to_string();
        let taken = |id: &str| existing.iter().any(|s| s.id == id);

        if !taken(&base) {
            return Self {
                id: base,
                label: vendor.name().to_string(),
                vendor,
            };
        }

        let mut n = 2;
        while taken(&format!("{base}-{n}")) {
            n += 1;
        }
        Self {
            id: format!("{base}-{n}"),
            label: format!("{} #{n}", vendor.name()),
            vendor,
        }
    }
}
