//! Defaults applied during desired-state synthesis.
//!
//! Image defaults are carried in [`SynthesisDefaults`] and handed to the
//! generators explicitly, so callers (and tests) can swap them without
//! touching global state. Port numbers are fixed well-known values.

/// Valkey server image used when a cluster does not name one.
pub const DEFAULT_IMAGE: &str = "valkey/valkey:9-alpine";
/// Metrics exporter image used when a cluster does not name one.
pub const DEFAULT_EXPORTER_IMAGE: &str = "oliver006/redis_exporter:v1.67.0";

/// Valkey client port
pub const DEFAULT_PORT: i32 = 6379;
/// Valkey cluster bus port (client port + 10000)
pub const DEFAULT_CLUSTER_BUS_PORT: i32 = 16379;
/// Metrics exporter listen port
pub const DEFAULT_EXPORTER_PORT: i32 = 9121;

/// Environment variable overriding [`DEFAULT_IMAGE`] in the binary.
pub const DEFAULT_IMAGE_ENV: &str = "VALKEY_DEFAULT_IMAGE";
/// Environment variable overriding [`DEFAULT_EXPORTER_IMAGE`] in the binary.
pub const DEFAULT_EXPORTER_IMAGE_ENV: &str = "VALKEY_DEFAULT_EXPORTER_IMAGE";

/// Image defaults injected into resource generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesisDefaults {
    /// Fallback Valkey server image.
    pub image: String,
    /// Fallback metrics exporter image.
    pub exporter_image: String,
}

impl Default for SynthesisDefaults {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            exporter_image: DEFAULT_EXPORTER_IMAGE.to_string(),
        }
    }
}

impl SynthesisDefaults {
    /// Replace the fallback server image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Replace the fallback exporter image.
    pub fn with_exporter_image(mut self, image: impl Into<String>) -> Self {
        self.exporter_image = image.into();
        self
    }

    /// Server image to run: the override when non-empty, otherwise the default.
    pub fn resolve_image<'a>(&'a self, requested: &'a str) -> &'a str {
        resolve(requested, &self.image)
    }

    /// Exporter image to run: the override when non-empty, otherwise the default.
    pub fn resolve_exporter_image<'a>(&'a self, requested: &'a str) -> &'a str {
        resolve(requested, &self.exporter_image)
    }
}

fn resolve<'a>(requested: &'a str, fallback: &'a str) -> &'a str {
    if requested.is_empty() {
        fallback
    } else {
        requested
    }
}
