//! # On-Air Common Library
//!
//! Shared code for the on-air station engine including:
//! - Error types
//! - Configuration loading (TOML, config-path resolution)
//! - Event types (OnAirEvent) and the broadcast EventBus
//! - Station catalog model and asset metadata indexes
//! - Sample/second timing helpers
//! - Gain curve definitions

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod metadata;
pub mod news;
pub mod time;
pub mod timing;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
