//! Auto-detecting text codec
//!
//! Buffers the first bytes of a stream, asks a [`Detector`] which encoding
//! they are in, then decodes everything through a single incremental decoder.

use std::sync::Arc;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, warn};

use super::chunk::Chunk;
use crate::config::DecoderConfig;
use crate::detect::{ChardetngDetector, Detector};
use crate::error::{StreamError, StreamResult};
use crate::registry::{CodecRegistry, DecoderOptions, EncodingRsRegistry, TextDecoder};

/// Why the default encoding was used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Detector found nothing above the threshold
    NoResult,
    /// Detector only saw ASCII, which says nothing about the rest
    Ascii,
    /// Detector returned an error
    DetectorError,
}

/// Where the resolved encoding came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodingSource {
    Detected { confidence: f32 },
    Fallback(FallbackReason),
}

/// Encoding chosen for a stream, fixed once set
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEncoding {
    /// Name as handed to the codec registry
    pub name: String,
    pub source: EncodingSource,
}

impl ResolvedEncoding {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, EncodingSource::Fallback(_))
    }
}

enum State {
    AwaitingDetection { buffer: BytesMut },
    Decoding { decoder: Box<dyn TextDecoder> },
    Flushed,
    Aborted,
    Failed,
}

/// Codec that decodes bytes of unknown encoding into text chunks.
///
/// Usable directly through [`feed`](Self::feed) / [`finish`](Self::finish),
/// or as a `tokio_util` [`Decoder`] inside `FramedRead`.
pub struct AutoDetectCodec {
    config: DecoderConfig,
    detector: Arc<dyn Detector>,
    registry: Arc<dyn CodecRegistry>,
    state: State,
    resolved: Option<ResolvedEncoding>,
}

impl AutoDetectCodec {
    /// Create a codec with the `chardetng` detector and `encoding_rs` registry
    pub fn new(config: DecoderConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(ChardetngDetector::new()),
            Arc::new(EncodingRsRegistry::new()),
        )
    }

    /// Create a codec with custom detection and decoding services
    pub fn with_collaborators(
        config: DecoderConfig,
        detector: Arc<dyn Detector>,
        registry: Arc<dyn CodecRegistry>,
    ) -> Self {
        let config = config.normalized();
        let buffer = BytesMut::with_capacity(config.detection_buffer_size);
        Self {
            config,
            detector,
            registry,
            state: State::AwaitingDetection { buffer },
            resolved: None,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// The encoding in use, once detection has run
    pub fn resolved_encoding(&self) -> Option<&ResolvedEncoding> {
        self.resolved.as_ref()
    }

    /// Whether the decoder has been drained
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Flushed)
    }

    /// Push one chunk, returning any text it completes
    pub fn feed(&mut self, chunk: impl Into<Chunk>) -> StreamResult<Option<String>> {
        match chunk.into() {
            Chunk::Bytes(bytes) => self.push_bytes(&bytes),
            Chunk::Text(text) => Err(StreamError::invalid_input(format!(
                "decoder needs bytes as its input, got {} bytes of text",
                text.len()
            ))),
        }
    }

    /// Signal end of input and drain the decoder.
    ///
    /// Runs detection first if it has not happened yet, even on an empty
    /// stream. Calling it again after a successful flush returns `Ok(None)`.
    pub fn finish(&mut self) -> StreamResult<Option<String>> {
        let head = match self.state {
            State::AwaitingDetection { .. } => self.resolve_and_drain()?,
            State::Decoding { .. } => None,
            State::Flushed => return Ok(None),
            State::Aborted => return Err(StreamError::Aborted),
            State::Failed => return Err(StreamError::Failed),
        };

        let tail = match std::mem::replace(&mut self.state, State::Flushed) {
            State::Decoding { mut decoder } => non_empty(decoder.end()),
            _ => None,
        };

        Ok(join(head, tail))
    }

    /// Stop accepting input and release the decoder without emitting anything
    pub fn abort(&mut self) {
        if !matches!(self.state, State::Flushed) {
            debug!("Decoding stream aborted");
            self.state = State::Aborted;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> StreamResult<Option<String>> {
        match &mut self.state {
            State::AwaitingDetection { buffer } => {
                buffer.extend_from_slice(bytes);
                if buffer.len() >= self.config.detection_buffer_size {
                    self.resolve_and_drain()
                } else {
                    Ok(None)
                }
            }
            State::Decoding { decoder } => Ok(decode_and_emit(decoder.as_mut(), bytes)),
            State::Flushed => Err(StreamError::Finished),
            State::Aborted => Err(StreamError::Aborted),
            State::Failed => Err(StreamError::Failed),
        }
    }

    /// Run detection over the buffered bytes and decode them.
    ///
    /// Leaves the codec `Failed` if no decoder could be created.
    fn resolve_and_drain(&mut self) -> StreamResult<Option<String>> {
        let buffer = match std::mem::replace(&mut self.state, State::Failed) {
            State::AwaitingDetection { buffer } => buffer,
            other => {
                self.state = other;
                return Ok(None);
            }
        };

        let mut decoder = self.resolve(&buffer)?;
        let text = decode_and_emit(decoder.as_mut(), &buffer);
        self.state = State::Decoding { decoder };
        Ok(text)
    }

    fn resolve(&mut self, sample: &[u8]) -> StreamResult<Box<dyn TextDecoder>> {
        let resolved = match self.detector.detect(sample, self.config.min_confidence) {
            Ok(Some(detection)) if detection.is_ascii() => {
                debug!(sample_len = sample.len(), "Detector saw only ASCII, using default encoding");
                self.fallback(FallbackReason::Ascii)
            }
            Ok(Some(detection)) if detection.encoding.trim().is_empty() => {
                debug!(sample_len = sample.len(), "Detector returned an empty encoding name, using default encoding");
                self.fallback(FallbackReason::NoResult)
            }
            Ok(Some(detection)) => ResolvedEncoding {
                name: detection.encoding,
                source: EncodingSource::Detected {
                    confidence: detection.confidence,
                },
            },
            Ok(None) => {
                debug!(sample_len = sample.len(), "No encoding detected, using default encoding");
                self.fallback(FallbackReason::NoResult)
            }
            Err(err) => {
                debug!(error = %err, "Detector failed, using default encoding");
                self.fallback(FallbackReason::DetectorError)
            }
        };

        let options = DecoderOptions {
            strip_bom: self.config.strip_bom,
        };
        let decoder = self
            .registry
            .decoder(&resolved.name, options)
            .inspect_err(|err| warn!(encoding = %resolved.name, error = %err, "No decoder for encoding"))?;

        debug!(
            encoding = %resolved.name,
            source = ?resolved.source,
            sample_len = sample.len(),
            "Encoding resolved"
        );
        self.resolved = Some(resolved);
        Ok(decoder)
    }

    fn fallback(&self, reason: FallbackReason) -> ResolvedEncoding {
        ResolvedEncoding {
            name: self.config.default_encoding.clone(),
            source: EncodingSource::Fallback(reason),
        }
    }
}

impl std::fmt::Debug for AutoDetectCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::AwaitingDetection { buffer } => format!("AwaitingDetection({} bytes)", buffer.len()),
            State::Decoding { decoder } => format!("Decoding({})", decoder.encoding()),
            State::Flushed => "Flushed".to_string(),
            State::Aborted => "Aborted".to_string(),
            State::Failed => "Failed".to_string(),
        };
        f.debug_struct("AutoDetectCodec")
            .field("config", &self.config)
            .field("state", &state)
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl Decoder for AutoDetectCodec {
    type Item = String;
    type Error = StreamError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let bytes = src.split();
        self.push_bytes(&bytes)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let head = self.decode(src)?;
        let tail = self.finish()?;
        Ok(join(head, tail))
    }
}

fn decode_and_emit(decoder: &mut dyn TextDecoder, bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    non_empty(decoder.write(bytes))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn join(head: Option<String>, tail: Option<String>) -> Option<String> {
    match (head, tail) {
        (Some(mut head), Some(tail)) => {
            head.push_str(&tail);
            Some(head)
        }
        (head, tail) => head.or(tail),
    }
}
