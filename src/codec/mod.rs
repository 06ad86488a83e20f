//! Auto-detecting decoder, usable as a `tokio_util::codec::Decoder`
//!
//! The codec consumes every byte it is handed, so `FramedRead` never holds
//! more than one read's worth of unprocessed input.

mod autodetect;
mod chunk;

pub use autodetect::{AutoDetectCodec, EncodingSource, FallbackReason, ResolvedEncoding};
pub use chunk::Chunk;
