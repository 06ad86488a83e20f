//! Charset detection
//!
//! A [`Detector`] looks at the first bytes of a stream and proposes an
//! encoding label. The label only has to be something the codec registry
//! understands; an `"ascii"` answer is treated as "no answer" by the caller.

use encoding_rs::Encoding;
use thiserror::Error;

/// Threshold applied when the caller does not ask for one
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.2;

/// Label reported for pure 7-bit input
pub const ASCII: &str = "ascii";

/// Detector failure. Never reaches the stream consumer.
#[derive(Debug, Error)]
#[error("detection failed: {0}")]
pub struct DetectError(pub String);

impl DetectError {
    pub fn new(msg: impl Into<String>) -> Self {
        DetectError(msg.into())
    }
}

/// Outcome of a successful detection
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Encoding label
    pub encoding: String,
    /// Confidence in `0.0..=1.0`
    pub confidence: f32,
}

impl Detection {
    pub fn new(encoding: impl Into<String>, confidence: f32) -> Self {
        Self {
            encoding: encoding.into(),
            confidence,
        }
    }

    /// Whether the detector only saw 7-bit data
    pub fn is_ascii(&self) -> bool {
        self.encoding.eq_ignore_ascii_case(ASCII)
    }
}

/// Guess the encoding of a byte sample.
///
/// The confidence threshold is passed on every call so detectors can be
/// shared between streams with different settings.
pub trait Detector: Send + Sync {
    /// Returns `Ok(None)` when no candidate reaches `min_confidence`.
    fn detect(&self, sample: &[u8], min_confidence: Option<f32>) -> Result<Option<Detection>, DetectError>;
}

impl<F> Detector for F
where
    F: Fn(&[u8], Option<f32>) -> Result<Option<Detection>, DetectError> + Send + Sync,
{
    fn detect(&self, sample: &[u8], min_confidence: Option<f32>) -> Result<Option<Detection>, DetectError> {
        self(sample, min_confidence)
    }
}

/// Detector backed by `chardetng`, with BOM and UTF-8 checks up front
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetngDetector;

impl ChardetngDetector {
    pub fn new() -> Self {
        Self
    }

    fn sniff(sample: &[u8]) -> Option<Detection> {
        if sample.is_empty() {
            return None;
        }

        if let Some((encoding, _)) = Encoding::for_bom(sample) {
            return Some(Detection::new(encoding.name(), 1.0));
        }

        if sample.is_ascii() {
            return Some(Detection::new(ASCII, 1.0));
        }

        if is_utf8_with_non_ascii(sample) {
            return Some(Detection::new(encoding_rs::UTF_8.name(), 0.99));
        }

        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(sample, true);
        let encoding = detector.guess(None, false);

        let confidence = if decodes_cleanly(encoding, sample) { 0.5 } else { 0.1 };
        Some(Detection::new(encoding.name(), confidence))
    }
}

impl Detector for ChardetngDetector {
    fn detect(&self, sample: &[u8], min_confidence: Option<f32>) -> Result<Option<Detection>, DetectError> {
        let threshold = min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE);
        let detection = Self::sniff(sample).filter(|d| d.confidence >= threshold);

        tracing::trace!(
            sample_len = sample.len(),
            threshold,
            detected = ?detection,
            "Charset sniffed"
        );

        Ok(detection)
    }
}

/// Valid UTF-8 with at least one complete non-ASCII sequence.
///
/// A sequence cut off at the end of the sample is allowed but does not count.
fn is_utf8_with_non_ascii(sample: &[u8]) -> bool {
    let valid = match std::str::from_utf8(sample) {
        Ok(_) => sample,
        Err(e) if e.error_len().is_none() => &sample[..e.valid_up_to()],
        Err(_) => return false,
    };
    !valid.is_ascii()
}

/// Decode without replacement, ignoring a truncated trailing sequence
fn decodes_cleanly(encoding: &'static Encoding, sample: &[u8]) -> bool {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let Some(capacity) = decoder.max_utf8_buffer_length(sample.len()) else {
        return false;
    };
    let mut out = String::with_capacity(capacity);
    let (_, _, had_errors) = decoder.decode_to_string(sample, &mut out, false);
    !had_errors
}
