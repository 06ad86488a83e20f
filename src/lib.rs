//! Streaming text decoder for bytes of unknown encoding
//!
//! The decoder buffers the first bytes of a stream, sniffs their character
//! encoding and then decodes the whole stream incrementally with one decoder.
//!
//! # Module Organization
//!
//! - [`codec`] - The auto-detecting codec (AutoDetectCodec, Chunk)
//! - [`detect`] - Charset detection (Detector, ChardetngDetector)
//! - [`registry`] - Decoder lookup (CodecRegistry, TextDecoder, EncodingRsRegistry)
//! - [`stream`] - Async adapters (decode_reader, decode_stream, collect_all)
//! - [`config`] - Decoder configuration (DecoderConfig)
//! - [`error`] - Error types (StreamError, StreamResult)
//!
//! # Example
//!
//! ```no_run
//! use autodecode::{collect_all, decode_reader, DecoderConfig};
//!
//! # async fn run() -> autodecode::StreamResult<()> {
//! let file = tokio::fs::File::open("legacy.txt").await?;
//! let config = DecoderConfig::new().with_default_encoding("windows-1252");
//! let text = collect_all(decode_reader(file, config)).await?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod detect;
pub mod error;
pub mod registry;
pub mod stream;

pub use codec::{AutoDetectCodec, Chunk, EncodingSource, FallbackReason, ResolvedEncoding};
pub use config::DecoderConfig;
pub use detect::{ChardetngDetector, DetectError, Detection, Detector};
pub use error::{StreamError, StreamResult};
pub use registry::{CodecRegistry, DecoderOptions, EncodingRsDecoder, EncodingRsRegistry, TextDecoder};
pub use stream::{collect_all, collect_with, decode_all, decode_reader, decode_stream};
