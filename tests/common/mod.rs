//! Shared helpers for autodecode integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use autodecode::{DetectError, Detection, Detector};

/// "Test" in any ASCII-compatible encoding
pub const TEST_BYTES: &[u8] = &[0x54, 0x65, 0x73, 0x74];

/// Mixed-script UTF-8 sample with 2, 3 and 4 byte sequences
pub const UNICODE: &str = "ěščřžýáíé こんにちは 🦀 naïve café";

static TRACING: Once = Once::new();

/// Install a test subscriber once, honoring RUST_LOG
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Detector that records how often and with what it was called
#[derive(Default)]
pub struct RecordingDetector {
    calls: AtomicUsize,
    last_sample_len: AtomicUsize,
    answer: Option<Detection>,
}

impl RecordingDetector {
    pub fn answering(answer: Option<Detection>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_sample_len(&self) -> usize {
        self.last_sample_len.load(Ordering::SeqCst)
    }
}

impl Detector for RecordingDetector {
    fn detect(&self, sample: &[u8], _min_confidence: Option<f32>) -> Result<Option<Detection>, DetectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_sample_len.store(sample.len(), Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// Split `bytes` into pieces of at most `size` bytes
pub fn chunked(bytes: &[u8], size: usize) -> Vec<Vec<u8>> {
    bytes.chunks(size).map(<[u8]>::to_vec).collect()
}
