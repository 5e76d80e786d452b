//! # Engine Configuration
//!
//! Optional knobs shared by the compile and validate paths. Every field has
//! a default, so an empty YAML document is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::limits::Limits;

/// OpenAPI version written into compiled documents.
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";

/// Media type assumed for RAML bodies that do not name one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Recursion bounds.
    pub limits: Limits,
    /// `openapi` field of compiled documents.
    pub openapi_version: String,
    /// Fallback media type for bodies declared without one.
    pub default_media_type: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            openapi_version: DEFAULT_OPENAPI_VERSION.to_string(),
            default_media_type: DEFAULT_MEDIA_TYPE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from YAML text. Missing fields take defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, CodecError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| CodecError::Parse {
            message: e.to_string(),
            line: e.location().map(|loc| loc.line()),
            excerpt: String::new(),
        })
    }
}
