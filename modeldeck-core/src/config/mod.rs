//! Configuration module for Modeldeck.
//!
//! Per-source vendor setups (stored in SQLite) and server-side defaults
//! (read from the environment).

mod server;
mod setup;
mod store;

pub use server::{
    ServerConfig, HELICONE_API_KEY_ENV, OPENAI_API_HOST_ENV, OPENAI_API_KEY_ENV,
    OPENAI_API_ORG_ENV,
};
pub use setup::{
    normalize_setup, PartialSourceSetup, SourceSetup, DEFAULT_RESPONSE_TOKENS,
    DEFAULT_TEMPERATURE, RESPONSE_TOKENS_RANGE, TEMPERATURE_RANGE,
};
pub use store::{DbSetupStore, MemorySetupStore, SetupStore, StoreError};
