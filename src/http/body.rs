//! Response body module
//!
//! Every response shares one boxed body type so that fixed status bodies and
//! streamed files can flow through the same service.

use futures_util::TryStreamExt;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::logger;

/// Read size for streamed file bodies
pub const CHUNK_SIZE: usize = 64 * 1024;

pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// Body holding a complete, in-memory payload
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Body with no content (redirects, HEAD responses)
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream an open file in `CHUNK_SIZE` reads.
///
/// The file handle is owned by the body: it is released when the body is
/// exhausted or dropped, which is what happens when the client goes away.
/// A read error ends the stream and hyper aborts the in-flight response.
pub fn file_stream(file: File) -> ResponseBody {
    let stream = ReaderStream::with_capacity(file, CHUNK_SIZE)
        .inspect_err(|e| logger::log_error(&format!("File stream aborted: {e}")))
        .map_ok(Frame::data);
    StreamBody::new(stream).boxed_unsync()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_full_and_empty() {
        let bytes = full("hello").collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");

        let bytes = empty().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_file_stream_spans_multiple_chunks() {
        let content: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&content).unwrap();

        let file = File::open(tmp.path()).await.unwrap();
        let bytes = file_stream(file).collect().await.unwrap().to_bytes();
        assert_eq!(bytes.len(), content.len());
        assert_eq!(&bytes[..], &content[..]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_read_error_ends_stream_with_error() {
        // Opening a directory succeeds on Linux, reading it fails with EISDIR
        let dir = tempfile::tempdir().unwrap();
        let file = File::open(dir.path()).await.unwrap();

        match file_stream(file).collect().await {
            Ok(_) => panic!("reading a directory handle should fail"),
            Err(err) => assert!(err.raw_os_error().is_some()),
        }
    }
}
