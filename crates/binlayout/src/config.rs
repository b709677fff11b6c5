// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine constants and serializer configuration.
//!
//! [`SerializerConfig`] can be built programmatically or loaded from TOML:
//!
//! ```toml
//! endianness = "big"
//! max_depth = 32
//! max_collection_count = 4096
//! ```

use crate::descriptor::Endianness;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Limits
// ============================================================================

/// Default maximum nesting depth of a value graph.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default maximum number of items decoded into one collection.
pub const DEFAULT_MAX_COLLECTION_COUNT: usize = 1 << 20;

/// Longest base-type chain followed before giving up.
pub const MAX_INHERITANCE_DEPTH: usize = 64;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serializer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializerConfig {
    /// Byte order for members without an override.
    #[serde(default)]
    pub endianness: Endianness,

    /// Maximum value-graph depth (root is depth 0).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum item count accepted for one decoded collection.
    #[serde(default = "default_max_collection_count")]
    pub max_collection_count: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_collection_count() -> usize {
    DEFAULT_MAX_COLLECTION_COUNT
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            endianness: Endianness::Little,
            max_depth: DEFAULT_MAX_DEPTH,
            max_collection_count: DEFAULT_MAX_COLLECTION_COUNT,
        }
    }
}

impl SerializerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Builder-style byte order.
    #[must_use]
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        if self.max_collection_count == 0 {
            return Err(ConfigError::Invalid(
                "max_collection_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
