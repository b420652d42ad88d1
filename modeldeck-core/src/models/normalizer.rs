//! Vendor model descriptor normalization.
//!
//! The OpenAI listing endpoint returns bare ids with no context size or
//! display name. Everything we know about a model family lives in
//! [`OPENAI_FAMILIES`], matched first-prefix-wins; ids matching no family
//! still produce a record.

use std::collections::BTreeSet;

use super::types::{ModelRecord, VendorModelDescriptor, TAG_CHAT, TAG_STREAM};
use crate::sources::ModelSource;

/// Description given to every non-flagship id of a known family.
pub const SNAPSHOT_DESCRIPTION: &str = "snapshot";

/// Context window assumed for ids matching no family.
pub const UNKNOWN_CONTEXT_TOKENS: u32 = 4000;

/// One known model family.
#[derive(Debug, Clone, Copy)]
pub struct ModelFamily {
    /// Id prefix that selects this family
    pub prefix: &'static str,
    pub context_tokens: u32,
    /// The one id that gets `flagship_description`
    pub flagship_id: &'static str,
    pub flagship_description: &'static str,
    /// Builds the label from the id with `prefix` removed
    pub label: fn(&str) -> String,
}

impl ModelFamily {
    fn matches(&self, id: &str) -> bool {
        id.starts_with(self.prefix)
    }

    fn describe(&self, id: &str) -> &'static str {
        if id == self.flagship_id {
            self.flagship_description
        } else {
            SNAPSHOT_DESCRIPTION
        }
    }
}

/// OpenAI model families, most specific prefix first.
pub const OPENAI_FAMILIES: &[ModelFamily] = &[
    ModelFamily {
        prefix: "gpt-4-32k",
        context_tokens: 32768,
        flagship_id: "gpt-4-32k",
        flagship_description: "Largest context window for big thinking",
        label: gpt4_32k_label,
    },
    ModelFamily {
        prefix: "gpt-4",
        context_tokens: 8192,
        flagship_id: "gpt-4",
        flagship_description: "Insightful, big thinker, slower, pricey",
        label: gpt4_label,
    },
    ModelFamily {
        prefix: "gpt-3.5",
        context_tokens: 4097,
        flagship_id: "gpt-3.5-turbo",
        flagship_description: "Fair speed and insight",
        label: gpt35_label,
    },
];

fn gpt4_32k_label(rest: &str) -> String {
    format!("GPT-4-32{rest}")
}

fn gpt4_label(rest: &str) -> String {
    format!("GPT-4{}", rest.replace('-', " "))
}

fn gpt35_label(rest: &str) -> String {
    format!("3.5{}", rest.replacen("turbo", "Turbo", 1).replace('-', " "))
}

/// Find the family of a vendor model id.
pub fn classify(id: &str) -> Option<&'static ModelFamily> {
    OPENAI_FAMILIES.iter().find(|family| family.matches(id))
}

/// Turn an OpenAI model descriptor into a record owned by `source`.
///
/// Total: ids that match no family are labelled `"<ID>?"` and described as
/// unknown instead of being rejected.
pub fn openai_model_to_record(model: &VendorModelDescriptor, source: &ModelSource) -> ModelRecord {
    let id = model.id.as_str();

    let (label, context_tokens, description) = match classify(id) {
        Some(family) => {
            let rest = &id[family.prefix.len()..];
            (
                (family.label)(rest),
                family.context_tokens,
                family.describe(id).to_string(),
            )
        }
        None => (
            format!("{}?", id.to_uppercase()),
            UNKNOWN_CONTEXT_TOKENS,
            format!("Unknown model {id}"),
        ),
    };

    ModelRecord {
        id: format!("{}-{}", source.id, id),
        label,
        created: model.created,
        description,
        tags: BTreeSet::from([TAG_STREAM.to_string(), TAG_CHAT.to_string()]),
        context_tokens,
        source_id: source.id.clone(),
        source: source.clone(),
        settings: serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Vendor;
    use proptest::prelude::*;

    fn source() -> ModelSource {
        ModelSource {
            id: "openai".into(),
            label: "OpenAI".into(),
            vendor: Vendor::OpenAi,
        }
    }

    fn normalize(id: &str) -> ModelRecord {
        openai_model_to_record(&VendorModelDescriptor::new(id, 1_678_000_000), &source())
    }

    #[test]
    fn test_gpt4_32k_flagship() {
        let record = normalize("gpt-4-32k");
        assert_eq!(record.context_tokens, 32768);
        assert_eq!(record.label, "GPT-4-32");
        assert_eq!(record.description, "Largest context window for big thinking");
    }

    #[test]
    fn test_gpt4_32k_snapshot() {
        let record = normalize("gpt-4-32k-0314");
        assert_eq!(record.context_tokens, 32768);
        assert_eq!(record.label, "GPT-4-32-0314");
        assert_eq!(record.description, SNAPSHOT_DESCRIPTION);
    }

    #[test]
    fn test_gpt4_flagship() {
        let record = normalize("gpt-4");
        assert_eq!(record.context_tokens, 8192);
        assert_eq!(record.label, "GPT-4");
        assert_eq!(record.description, "Insightful, big thinker, slower, pricey");
    }

    #[test]
    fn test_gpt4_snapshot_label_uses_spaces() {
        let record = normalize("gpt-4-0613");
        assert_eq!(record.context_tokens, 8192);
        assert_eq!(record.label, "GPT-4 0613");
        assert_eq!(record.description, SNAPSHOT_DESCRIPTION);
    }

    #[test]
    fn test_gpt35_turbo_flagship() {
        let record = normalize("gpt-3.5-turbo");
        assert_eq!(record.context_tokens, 4097);
        assert_eq!(record.label, "3.5 Turbo");
        assert_eq!(record.description, "Fair speed and insight");
    }

    #[test]
    fn test_gpt35_turbo_snapshot() {
        let record = normalize("gpt-3.5-turbo-0301");
        assert_eq!(record.context_tokens, 4097);
        assert_eq!(record.label, "3.5 Turbo 0301");
        assert_eq!(record.description, SNAPSHOT_DESCRIPTION);
    }

    #[test]
    fn test_unknown_model() {
        let record = normalize("whisper-1");
        assert_eq!(record.context_tokens, UNKNOWN_CONTEXT_TOKENS);
        assert_eq!(record.label, "WHISPER-1?");
        assert_eq!(record.description, "Unknown model whisper-1");
    }

    #[test]
    fn test_record_shape() {
        let record = normalize("gpt-4");
        assert_eq!(record.id, "openai-gpt-4");
        assert_eq!(record.source_id, "openai");
        assert_eq!(record.source, source());
        assert_eq!(record.created, 1_678_000_000);
        assert!(record.has_tag(TAG_STREAM));
        assert!(record.has_tag(TAG_CHAT));
        assert_eq!(record.tags.len(), 2);
        assert!(record.settings.is_empty());
    }

    #[test]
    fn test_classify_prefers_most_specific_family() {
        assert_eq!(classify("gpt-4-32k-0613").unwrap().prefix, "gpt-4-32k");
        assert_eq!(classify("gpt-4-0613").unwrap().prefix, "gpt-4");
        assert!(classify("text-davinci-003").is_none());
    }

    proptest! {
        #[test]
        fn unknown_ids_fall_back(id in "\\PC*") {
            prop_assume!(classify(&id).is_none());
            let record = normalize(&id);
            prop_assert_eq!(record.context_tokens, UNKNOWN_CONTEXT_TOKENS);
            prop_assert_eq!(record.label, format!("{}?", id.to_uppercase()));
        }

        #[test]
        fn record_id_is_source_and_vendor_id(
            source_id in "[a-z]+(-[0-9]+)?",
            id in "(gpt-4-32k|gpt-4|gpt-3\\.5-turbo|ada)[-a-z0-9]{0,8}",
        ) {
            let source = ModelSource { id: source_id.clone(), label: "x".into(), vendor: Vendor::OpenAi };
            let record = openai_model_to_record(&VendorModelDescriptor::new(id.clone(), 0), &source);
            prop_assert_eq!(record.id, format!("{source_id}-{id}"));
        }

        #[test]
        fn classification_is_deterministic(id in "gpt-[-.a-z0-9]{0,12}") {
            let a = normalize(&id);
            let b = normalize(&id);
            prop_assert_eq!(a.label, b.label);
            prop_assert_eq!(a.context_tokens, b.context_tokens);
        }
    }
}
