//! Streaming response bodies
//!
//! [`ByteStream`] is the live body reader returned by
//! [`Dispatcher::stream`](crate::Dispatcher::stream). The caller drives it to
//! completion; dropping it closes the underlying connection.

use bytes::Bytes;
use futures::Stream;
use futures_util::StreamExt;
use std::pin::Pin;

use crate::error::{RequestError, Result};

/// Boxed stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Boxed stream of decoded text chunks.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Decode a byte stream as UTF-8 text.
///
/// Multi-byte characters split across chunk boundaries are held back until the
/// next chunk completes them. Invalid sequences fail the stream with a
/// [`RequestError::Decode`].
pub fn utf8_text(stream: ByteStream) -> TextStream {
    let mut inner = stream;
    let s = async_stream::stream! {
        let mut pending: Vec<u8> = Vec::new();
        while let Some(chunk) = inner.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            pending.extend_from_slice(&chunk);
            match std::str::from_utf8(&pending) {
                Ok(text) => {
                    let text = text.to_string();
                    pending.clear();
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                }
                Err(e) if e.error_len().is_none() => {
                    // Incomplete trailing sequence: emit the valid prefix, keep the rest.
                    let valid = e.valid_up_to();
                    if valid > 0 {
                        let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
                        pending.drain(..valid);
                        yield Ok(text);
                    }
                }
                Err(e) => {
                    yield Err(RequestError::Decode(format!("Invalid UTF-8 in stream: {e}")));
                    return;
                }
            }
        }
        if !pending.is_empty() {
            yield Err(RequestError::Decode(
                "Stream ended inside a UTF-8 sequence".to_string(),
            ));
        }
    };
    Box::pin(s)
}

/// Wrap an in-memory list of chunks as a [`ByteStream`].
pub fn from_chunks<I>(chunks: I) -> ByteStream
where
    I: IntoIterator<Item = Bytes>,
    I::IntoIter: Send + 'static,
{
    Box::pin(futures::stream::iter(
        chunks.into_iter().map(Ok::<Bytes, RequestError>),
    ))
}
