//! Decoder configuration

use serde::Deserialize;

use crate::error::{StreamError, StreamResult};

/// Encoding used when detection gives no usable answer
pub const DEFAULT_ENCODING: &str = "utf8";

/// Bytes to accumulate before forcing a detection decision
pub const DEFAULT_DETECTION_BUFFER_SIZE: usize = 128;

/// Configuration for an auto-detecting decoder.
///
/// All fields are optional in TOML form:
///
/// ```toml
/// default_encoding = "windows-1252"
/// min_confidence = 0.5
/// detection_buffer_size = 256
/// strip_bom = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Encoding to fall back to (any label the codec registry understands)
    pub default_encoding: String,
    /// Minimum detector confidence, `None` leaves the detector's own threshold
    pub min_confidence: Option<f32>,
    /// How many bytes to feed the detector
    pub detection_buffer_size: usize,
    /// Strip a leading byte order mark from decoded text
    pub strip_bom: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            default_encoding: DEFAULT_ENCODING.to_string(),
            min_confidence: None,
            detection_buffer_size: DEFAULT_DETECTION_BUFFER_SIZE,
            strip_bom: true,
        }
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback encoding
    pub fn with_default_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.default_encoding = encoding.into();
        self
    }

    /// Set the minimum detector confidence. Clamped into `0..=1` by
    /// [`normalized`](Self::normalized) when a codec is built.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = Some(confidence);
        self
    }

    /// Set the detection buffer size
    pub fn with_detection_buffer_size(mut self, size: usize) -> Self {
        self.detection_buffer_size = size;
        self
    }

    /// Enable or disable BOM stripping
    pub fn with_strip_bom(mut self, strip: bool) -> Self {
        self.strip_bom = strip;
        self
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> StreamResult<Self> {
        let config: DecoderConfig = toml::from_str(content)
            .map_err(|e| StreamError::invalid_config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config.normalized())
    }

    /// Check value ranges
    pub fn validate(&self) -> StreamResult<()> {
        if let Some(confidence) = self.min_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(StreamError::invalid_config(format!(
                    "min_confidence must be within 0..=1, got {}",
                    confidence
                )));
            }
        }
        Ok(())
    }

    /// Replace empty / zero settings with their defaults and clamp the
    /// confidence into `0..=1` (NaN leaves it unset)
    pub fn normalized(mut self) -> Self {
        self.min_confidence = self
            .min_confidence
            .filter(|c| !c.is_nan())
            .map(|c| c.clamp(0.0, 1.0));
        if self.default_encoding.trim().is_empty() {
            self.default_encoding = DEFAULT_ENCODING.to_string();
        }
        if self.detection_buffer_size == 0 {
            self.detection_buffer_size = DEFAULT_DETECTION_BUFFER_SIZE;
        }
        self
    }
}
