//! Per-source vendor setup.
//!
//! A setup is stored as a [`PartialSourceSetup`] (only the fields the user
//! touched) and read back through [`normalize_setup`], which fills the gaps
//! with defaults.

use serde::{Deserialize, Serialize};

// =============================================================================
// Defaults and Ranges
// =============================================================================

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Default maximum number of tokens in a response.
pub const DEFAULT_RESPONSE_TOKENS: u32 = 1024;

/// Valid temperature range.
pub const TEMPERATURE_RANGE: (f32, f32) = (0.0, 1.0);

/// Valid response token range.
pub const RESPONSE_TOKENS_RANGE: (u32, u32) = (256, 4096);

// =============================================================================
// Setup Types
// =============================================================================

/// Fully populated setup of a vendor source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSetup {
    /// Vendor API key ("sk-..."). Empty means "use the server key".
    pub api_key: String,
    /// Host override, e.g. "oai.hconeai.com". Empty means the vendor default.
    pub api_host: String,
    /// Organization id for enterprise accounts.
    pub organization_id: String,
    /// Key for an observability proxy (Helicone).
    pub proxy_key: String,
    /// Temperature (0.0 - 1.0) - higher = more creative.
    pub temperature: f32,
    /// Max tokens for response.
    pub max_response_tokens: u32,
}

impl Default for SourceSetup {
    fn default() -> Self {
        normalize_setup(&PartialSourceSetup::default())
    }
}

/// Possibly-partial setup, as stored and as sent by field edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSourceSetup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_response_tokens: Option<u32>,
}

impl PartialSourceSetup {
    /// Overlay every field present in `update` onto `self`.
    pub fn merge(&mut self, update: PartialSourceSetup) {
        let update = update.clamped();
        if update.api_key.is_some() {
            self.api_key = update.api_key;
        }
        if update.api_host.is_some() {
            self.api_host = update.api_host;
        }
        if update.organization_id.is_some() {
            self.organization_id = update.organization_id;
        }
        if update.proxy_key.is_some() {
            self.proxy_key = update.proxy_key;
        }
        if update.temperature.is_some() {
            self.temperature = update.temperature;
        }
        if update.max_response_tokens.is_some() {
            self.max_response_tokens = update.max_response_tokens;
        }
    }

    /// Clamp numeric fields into their valid ranges.
    ///
    /// A NaN temperature is dropped rather than stored.
    pub fn clamped(mut self) -> Self {
        self.temperature = self
            .temperature
            .filter(|t| !t.is_nan())
            .map(|t| t.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1));
        self.max_response_tokens = self
            .max_response_tokens
            .map(|n| n.clamp(RESPONSE_TOKENS_RANGE.0, RESPONSE_TOKENS_RANGE.1));
        self
    }

    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<SourceSetup> for PartialSourceSetup {
    fn from(setup: SourceSetup) -> Self {
        Self {
            api_key: Some(setup.api_key),
            api_host: Some(setup.api_host),
            organization_id: Some(setup.organization_id),
            proxy_key: Some(setup.proxy_key),
            temperature: Some(setup.temperature),
            max_response_tokens: Some(setup.max_response_tokens),
        }
    }
}

/// Fill every missing field of a stored setup with its default.
///
/// Never fails and is idempotent: normalizing an already complete setup
/// returns it unchanged.
pub fn normalize_setup(partial: &PartialSourceSetup) -> SourceSetup {
    SourceSetup {
        api_key: partial.api_key.clone().unwrap_or_default(),
        api_host: partial.api_host.clone().unwrap_or_default(),
        organization_id: partial.organization_id.clone().unwrap_or_default(),
        proxy_key: partial.proxy_key.clone().unwrap_or_default(),
        temperature: partial.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_response_tokens: partial
            .max_response_tokens
            .unwrap_or(DEFAULT_RESPONSE_TOKENS),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_empty_gives_defaults() {
        let setup = normalize_setup(&PartialSourceSetup::default());
        assert_eq!(setup.api_key, "");
        assert_eq!(setup.api_host, "");
        assert_eq!(setup.organization_id, "");
        assert_eq!(setup.proxy_key, "");
        assert!((setup.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(setup.max_response_tokens, 1024);
        assert_eq!(setup, SourceSetup::default());
    }

    #[test]
    fn test_normalize_keeps_present_fields() {
        let partial = PartialSourceSetup {
            api_key: Some("sk-abc".into()),
            temperature: Some(0.9),
            ..Default::default()
        };
        let setup = normalize_setup(&partial);
        assert_eq!(setup.api_key, "sk-abc");
        assert!((setup.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(setup.max_response_tokens, DEFAULT_RESPONSE_TOKENS);
    }

    #[test]
    fn test_merge_overlays_only_present_fields() {
        let mut stored = PartialSourceSetup {
            api_key: Some("sk-old".into()),
            api_host: Some("oai.hconeai.com".into()),
            ..Default::default()
        };
        stored.merge(PartialSourceSetup {
            api_key: Some("sk-new".into()),
            ..Default::default()
        });
        assert_eq!(stored.api_key.as_deref(), Some("sk-new"));
        assert_eq!(stored.api_host.as_deref(), Some("oai.hconeai.com"));
        assert!(stored.temperature.is_none());
    }

    #[test]
    fn test_merge_clamps_numeric_fields() {
        let mut stored = PartialSourceSetup::default();
        stored.merge(PartialSourceSetup {
            temperature: Some(1.7),
            max_response_tokens: Some(10),
            ..Default::default()
        });
        assert_eq!(stored.temperature, Some(1.0));
        assert_eq!(stored.max_response_tokens, Some(256));

        stored.merge(PartialSourceSetup {
            temperature: Some(-0.2),
            max_response_tokens: Some(100_000),
            ..Default::default()
        });
        assert_eq!(stored.temperature, Some(0.0));
        assert_eq!(stored.max_response_tokens, Some(4096));
    }

    #[test]
    fn test_merge_ignores_nan_temperature() {
        let mut stored = PartialSourceSetup {
            temperature: Some(0.3),
            ..Default::default()
        };
        stored.merge(PartialSourceSetup {
            temperature: Some(f32::NAN),
            ..Default::default()
        });
        assert_eq!(stored.temperature, Some(0.3));
    }

    #[test]
    fn test_partial_serialization_skips_missing() {
        let partial = PartialSourceSetup {
            api_key: Some("sk-x".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&partial).unwrap();
        assert_eq!(json, r#"{"api_key":"sk-x"}"#);

        let parsed: PartialSourceSetup = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }

    fn partial_strategy() -> impl Strategy<Value = PartialSourceSetup> {
        (
            proptest::option::of(".*"),
            proptest::option::of("[a-z.]{0,20}"),
            proptest::option::of("org-[a-z0-9]{0,8}"),
            proptest::option::of(".*"),
            proptest::option::of(0.0f32..=1.0),
            proptest::option::of(256u32..=4096),
        )
            .prop_map(
                |(api_key, api_host, organization_id, proxy_key, temperature, tokens)| {
                    PartialSourceSetup {
                        api_key,
                        api_host,
                        organization_id,
                        proxy_key,
                        temperature,
                        max_response_tokens: tokens,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(partial in partial_strategy()) {
            let once = normalize_setup(&partial);
            let twice = normalize_setup(&PartialSourceSetup::from(once.clone()));
            prop_assert_eq!(once, twice);
        }
    }
}
