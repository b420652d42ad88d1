//! Setup panel state for an OpenAI source.
//!
//! Everything a front end needs to render the source settings form, without
//! the rendering: key validation, the temperature hint, slider ranges, and
//! when the "Models" fetch is allowed. Field edits go straight to the
//! [`SetupStore`] as partial merges.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{
    PartialSourceSetup, ServerConfig, SetupStore, SourceSetup, StoreError,
    DEFAULT_RESPONSE_TOKENS, DEFAULT_TEMPERATURE, RESPONSE_TOKENS_RANGE, TEMPERATURE_RANGE,
};
use crate::models::{openai_model_to_record, ModelStore, ModelStoreError};
use crate::sources::ModelSource;
use crate::vendor::{is_valid_openai_api_key, ListModelsAccess, ModelLister, VendorError};

/// Errors from a model refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Model fetch disabled: no valid API key and no server key")]
    FetchDisabled,
    #[error("Setup store error: {0}")]
    Store(#[from] StoreError),
    #[error("Model store error: {0}")]
    Models(#[from] ModelStoreError),
    #[error("Vendor error: {0}")]
    Vendor(#[from] VendorError),
}

/// Range and default of a numeric form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderSpec<T> {
    pub min: T,
    pub max: T,
    pub step: T,
    pub default: T,
}

/// Temperature slider.
pub const TEMPERATURE_SLIDER: SliderSpec<f32> = SliderSpec {
    min: TEMPERATURE_RANGE.0,
    max: TEMPERATURE_RANGE.1,
    step: 0.1,
    default: DEFAULT_TEMPERATURE,
};

/// Output tokens slider.
pub const RESPONSE_TOKENS_SLIDER: SliderSpec<u32> = SliderSpec {
    min: RESPONSE_TOKENS_RANGE.0,
    max: RESPONSE_TOKENS_RANGE.1,
    step: 256,
    default: DEFAULT_RESPONSE_TOKENS,
};

/// Validity of the entered API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStatus {
    pub valid: bool,
    /// A key was entered and it is not valid
    pub error: bool,
}

/// A hint shown next to the API key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHint {
    /// The server provides a key; entering one is optional.
    ServerKeySet,
    /// No key anywhere: point at key creation and GPT-4 access.
    CreateKey,
    /// A valid key is entered: point at the usage page.
    CheckUsage,
}

impl KeyHint {
    /// `(text, url)` links for the hint.
    pub fn links(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            KeyHint::ServerKeySet => &[],
            KeyHint::CreateKey => &[
                ("create Key", "https://platform.openai.com/account/api-keys"),
                ("apply to GPT-4", "https://openai.com/waitlist/gpt-4-api"),
            ],
            KeyHint::CheckUsage => &[("check usage", "https://platform.openai.com/account/usage")],
        }
    }
}

/// Helper text under the temperature slider.
pub fn temperature_hint(temperature: f32) -> &'static str {
    if temperature < 0.33 {
        "More strict"
    } else if temperature > 0.67 {
        "Larger freedom"
    } else {
        "Creativity"
    }
}

/// Setup panel bound to one source.
pub struct SetupPanel<'a> {
    source: &'a ModelSource,
    store: &'a dyn SetupStore,
    server: &'a ServerConfig,
}

impl<'a> SetupPanel<'a> {
    pub fn new(source: &'a ModelSource, store: &'a dyn SetupStore, server: &'a ServerConfig) -> Self {
        Self {
            source,
            store,
            server,
        }
    }

    pub fn source(&self) -> &ModelSource {
        self.source
    }

    /// Current setup, defaults filled in.
    pub fn setup(&self) -> Result<SourceSetup, StoreError> {
        self.store.read(&self.source.id)
    }

    /// Apply a partial edit.
    pub fn update(&self, update: PartialSourceSetup) -> Result<(), StoreError> {
        debug!(source_id = %self.source.id, "Updating source setup");
        self.store.merge(&self.source.id, update)
    }

    pub fn set_api_key(&self, value: impl Into<String>) -> Result<(), StoreError> {
        self.update(PartialSourceSetup {
            api_key: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn set_api_host(&self, value: impl Into<String>) -> Result<(), StoreError> {
        self.update(PartialSourceSetup {
            api_host: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn set_organization_id(&self, value: impl Into<String>) -> Result<(), StoreError> {
        self.update(PartialSourceSetup {
            organization_id: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn set_proxy_key(&self, value: impl Into<String>) -> Result<(), StoreError> {
        self.update(PartialSourceSetup {
            proxy_key: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn set_temperature(&self, value: f32) -> Result<(), StoreError> {
        self.update(PartialSourceSetup {
            temperature: Some(value),
            ..Default::default()
        })
    }

    pub fn set_max_response_tokens(&self, value: u32) -> Result<(), StoreError> {
        self.update(PartialSourceSetup {
            max_response_tokens: Some(value),
            ..Default::default()
        })
    }

    /// Validity of the stored key.
    pub fn key_status(&self) -> Result<KeyStatus, StoreError> {
        let setup = self.setup()?;
        Ok(key_status(&setup.api_key))
    }

    /// Whether a model fetch can be expected to succeed.
    ///
    /// An entered key must be valid; with no key, the server key decides.
    pub fn shall_fetch_succeed(&self) -> Result<bool, StoreError> {
        let setup = self.setup()?;
        Ok(shall_fetch_succeed(&setup.api_key, self.server))
    }

    /// Hints for the key field, in display order. Empty for an invalid key.
    pub fn key_hints(&self) -> Result<Vec<KeyHint>, StoreError> {
        let setup = self.setup()?;
        let mut hints = Vec::new();
        if self.server.has_server_key() {
            hints.push(KeyHint::ServerKeySet);
        } else if setup.api_key.is_empty() {
            hints.push(KeyHint::CreateKey);
        }
        if is_valid_openai_api_key(&setup.api_key) {
            hints.push(KeyHint::CheckUsage);
        }
        Ok(hints)
    }

    /// Whether the key field must be filled in.
    pub fn key_required(&self) -> bool {
        !self.server.has_server_key()
    }

    /// State of the "Models" button.
    pub fn fetch_enabled(&self, is_fetching: bool) -> Result<bool, StoreError> {
        Ok(self.shall_fetch_succeed()? && !is_fetching)
    }

    /// Whether models should be fetched without the user asking.
    ///
    /// Only when this source has no models yet.
    pub fn auto_fetch_enabled(&self, models: &dyn ModelStore) -> Result<bool, StoreError> {
        Ok(!models.has_models_for(&self.source.id) && self.shall_fetch_succeed()?)
    }

    /// Fetch the vendor's model list and add the normalized records.
    ///
    /// Nothing is requested when the fetch cannot succeed, and nothing is
    /// added when the listing fails. Returns the number of records added.
    pub async fn refresh_models(
        &self,
        lister: &dyn ModelLister,
        models: &mut dyn ModelStore,
    ) -> Result<usize, RefreshError> {
        let setup = self.setup()?;
        if !shall_fetch_succeed(&setup.api_key, self.server) {
            debug!(source_id = %self.source.id, "Skipping model fetch, no usable key");
            return Err(RefreshError::FetchDisabled);
        }

        let access = ListModelsAccess::from(&setup);
        let descriptors = lister.list_models(&access).await.map_err(|e| {
            warn!(source_id = %self.source.id, error = %e, "Failed to fetch models");
            e
        })?;

        let records: Vec<_> = descriptors
            .iter()
            .map(|d| openai_model_to_record(d, self.source))
            .collect();
        let count = records.len();
        models.add_models(records)?;

        info!(source_id = %self.source.id, count, "Added models from vendor");
        Ok(count)
    }
}

fn key_status(api_key: &str) -> KeyStatus {
    let valid = is_valid_openai_api_key(api_key);
    KeyStatus {
        valid,
        error: !api_key.is_empty() && !valid,
    }
}

fn shall_fetch_succeed(api_key: &str, server: &ServerConfig) -> bool {
    if api_key.is_empty() {
        server.has_server_key()
    } else {
        is_valid_openai_api_key(api_key)
    }
}
