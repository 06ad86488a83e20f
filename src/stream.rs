//! Stream adapters around [`AutoDetectCodec`]

use async_stream::try_stream;
use futures::stream::{Stream, StreamExt, TryStreamExt};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::{AutoDetectCodec, Chunk};
use crate::config::DecoderConfig;
use crate::error::{StreamError, StreamResult};

/// Decode an `AsyncRead` source into text chunks
pub fn decode_reader<R>(reader: R, config: DecoderConfig) -> FramedRead<R, AutoDetectCodec>
where
    R: AsyncRead,
{
    FramedRead::new(reader, AutoDetectCodec::new(config))
}

/// Decode a stream of byte chunks into a stream of text chunks.
///
/// The upstream is only polled once the previous chunk has been decoded and
/// its text handed out. Upstream errors end the stream as
/// [`StreamError::Upstream`]; dropping the returned stream releases the
/// decoder.
pub fn decode_stream<S, T, E>(input: S, codec: AutoDetectCodec) -> impl Stream<Item = StreamResult<String>>
where
    S: Stream<Item = Result<T, E>>,
    T: Into<Chunk>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    try_stream! {
        let mut codec = codec;
        futures::pin_mut!(input);

        while let Some(item) = input.next().await {
            let chunk = item.map_err(StreamError::upstream)?;
            if let Some(text) = codec.feed(chunk)? {
                yield text;
            }
        }

        if let Some(text) = codec.finish()? {
            yield text;
        }
    }
}

/// Concatenate every text chunk, or return the first error
pub async fn collect_all<S>(stream: S) -> StreamResult<String>
where
    S: Stream<Item = StreamResult<String>>,
{
    stream
        .try_fold(String::new(), |mut text, chunk| async move {
            text.push_str(&chunk);
            Ok(text)
        })
        .await
}

/// Callback flavour of [`collect_all`].
///
/// `callback` runs exactly once, with `(None, Some(text))` on success or
/// `(Some(error), None)` on failure.
pub async fn collect_with<S, F>(stream: S, callback: F)
where
    S: Stream<Item = StreamResult<String>>,
    F: FnOnce(Option<StreamError>, Option<String>),
{
    match collect_all(stream).await {
        Ok(text) => callback(None, Some(text)),
        Err(err) => callback(Some(err), None),
    }
}

/// Decode a complete buffer in one go
pub fn decode_all(bytes: &[u8], config: DecoderConfig) -> StreamResult<String> {
    let mut codec = AutoDetectCodec::new(config);
    let mut text = codec.feed(bytes)?.unwrap_or_default();
    if let Some(tail) = codec.finish()? {
        text.push_str(&tail);
    }
    Ok(text)
}
