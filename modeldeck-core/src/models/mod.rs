//! Model records and registry.
//!
//! This module provides:
//! - `VendorModelDescriptor` - A model as listed by the vendor
//! - `ModelRecord` - The normalized, display-ready record
//! - `openai_model_to_record` - The descriptor-to-record classification
//! - `ModelStore` / `ModelRegistry` - Where records are kept

mod normalizer;
mod registry;
mod types;

pub use normalizer::{
    classify, openai_model_to_record, ModelFamily, OPENAI_FAMILIES, SNAPSHOT_DESCRIPTION,
    UNKNOWN_CONTEXT_TOKENS,
};
pub use registry::{DbModelStore, ModelRegistry, ModelStore};
pub use types::{ModelRecord, ModelStoreError, VendorModelDescriptor, TAG_CHAT, TAG_STREAM};
