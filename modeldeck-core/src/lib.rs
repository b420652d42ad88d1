//! Modeldeck Core Library
//!
//! This crate provides the core functionality for Modeldeck, which configures
//! LLM vendor sources and keeps a registry of their models. It includes:
//!
//! - Vendor sources and their per-source setup (key, host, sampling)
//! - Normalization of vendor model ids into display-ready records
//! - Model registry backed by SQLite
//! - OpenAI model listing client
//! - Headless setup panel state

pub mod config;
pub mod db;
pub mod models;
pub mod panel;
pub mod sources;
pub mod vendor;

// Re-exports for convenience
pub use config::{
    normalize_setup, DbSetupStore, MemorySetupStore, PartialSourceSetup, ServerConfig,
    SetupStore, SourceSetup, StoreError,
};
pub use db::Database;

// Re-export models
pub use models::{
    openai_model_to_record, DbModelStore, ModelRecord, ModelRegistry, ModelStore,
    ModelStoreError, VendorModelDescriptor,
};

// Re-export panel and sources
pub use panel::{temperature_hint, KeyHint, KeyStatus, RefreshError, SetupPanel};
pub use sources::{ModelSource, Vendor};

// Re-export vendor clients
pub use vendor::{
    is_valid_openai_api_key, ListModelsAccess, ModelLister, OpenAiClient, VendorError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
