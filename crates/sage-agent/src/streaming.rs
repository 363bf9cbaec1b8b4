//! Newline-delimited frame reassembly for streamed chat responses.
//!
//! The send endpoint produces its body incrementally; record boundaries
//! are newlines and may fall anywhere relative to network fragment
//! boundaries. `FrameDecoder` buffers the incomplete tail across
//! fragments and emits complete records as they close.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sage_common::ApiError;

use crate::FragmentStream;

/// Incremental splitter turning raw body fragments into complete
/// newline-delimited frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment; returns every frame it completes, in order.
    ///
    /// Blank and whitespace-only segments are dropped. A segment that is
    /// not valid UTF-8 is skipped like any other malformed record.
    pub fn push(&mut self, fragment: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(fragment);

        let mut frames = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let segment: Vec<u8> = self.pending.drain(..=pos).take(pos).collect();
            match String::from_utf8(segment) {
                Ok(line) if line.trim().is_empty() => {}
                Ok(line) => frames.push(line),
                Err(e) => warn!("skipping non-UTF-8 frame: {e}"),
            }
        }
        frames
    }

    /// Finish the stream. A non-empty leftover is a truncated record and
    /// is discarded by policy, not surfaced as an error.
    pub fn finish(self) {
        if !self.pending.is_empty() {
            debug!(
                bytes = self.pending.len(),
                "discarding truncated trailing frame"
            );
        }
    }
}

/// How a drained stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The body was consumed to completion.
    Completed,
    /// The caller's cancellation token fired; remaining fragments were
    /// left unread and the connection dropped.
    Cancelled,
}

/// Drain a fragment stream through a `FrameDecoder`, invoking `on_frame`
/// for each complete frame in arrival order.
///
/// The cancellation token is checked between fragments, so a cancelled
/// caller stops within one frame-processing step. A transport error
/// while reading aborts the drain and is returned to the caller.
pub async fn drain_frames(
    mut fragments: FragmentStream,
    cancel: &CancellationToken,
    mut on_frame: impl FnMut(String),
) -> Result<StreamEnd, ApiError> {
    let mut decoder = FrameDecoder::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            next = fragments.next() => match next {
                Some(Ok(fragment)) => {
                    for frame in decoder.push(&fragment) {
                        on_frame(frame);
                    }
                }
                Some(Err(e)) => return Err(e),
                None => {
                    decoder.finish();
                    return Ok(StreamEnd::Completed);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn decode_all(fragments: &[&[u8]]) -> Vec<String> {
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for fragment in fragments {
            frames.extend(decoder.push(fragment));
        }
        decoder.finish();
        frames
    }

    #[test]
    fn whole_body_in_one_fragment() {
        let frames = decode_all(&[b"alpha\nbeta\ngamma\n"]);
        assert_eq!(frames, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn record_split_across_fragments() {
        let frames = decode_all(&[b"al", b"pha\nbe", b"ta\n"]);
        assert_eq!(frames, vec!["alpha", "beta"]);
    }

    #[test]
    fn arbitrary_splits_match_single_shot() {
        let body = b"{\"type\":\"status\",\"text\":\"Thinking...\"}\n\
                     {\"type\":\"chat_start\"}\n\
                     {\"type\":\"chat_chunk\",\"text\":\"Sure, \"}\n";
        let whole = decode_all(&[body]);

        // Every split point, including mid-record, yields the same frames.
        for split in 0..body.len() {
            let frames = decode_all(&[&body[..split], &body[split..]]);
            assert_eq!(frames, whole, "split at byte {split}");
        }

        // One byte at a time.
        let bytes: Vec<&[u8]> = body.chunks(1).collect();
        assert_eq!(decode_all(&bytes), whole);
    }

    #[test]
    fn blank_segments_are_dropped() {
        let frames = decode_all(&[b"\n  \nreal\n\t\n"]);
        assert_eq!(frames, vec!["real"]);
    }

    #[test]
    fn truncated_tail_is_discarded() {
        let frames = decode_all(&[b"complete\nincompl"]);
        assert_eq!(frames, vec!["complete"]);
    }

    #[test]
    fn multibyte_char_split_across_fragments() {
        let body = "héllo\n".as_bytes();
        // Split inside the two-byte 'é'.
        let frames = decode_all(&[&body[..2], &body[2..]]);
        assert_eq!(frames, vec!["héllo"]);
    }

    #[test]
    fn invalid_utf8_segment_skipped() {
        let frames = decode_all(&[b"good\n\xff\xfe\nalso good\n"]);
        assert_eq!(frames, vec!["good", "also good"]);
    }

    fn fragment_stream(fragments: Vec<Result<Vec<u8>, ApiError>>) -> FragmentStream {
        Box::pin(stream::iter(fragments))
    }

    #[tokio::test]
    async fn drain_emits_frames_in_order() {
        let body = fragment_stream(vec![
            Ok(b"one\ntw".to_vec()),
            Ok(b"o\nthree\n".to_vec()),
        ]);
        let mut seen = Vec::new();
        let end = drain_frames(body, &CancellationToken::new(), |f| seen.push(f))
            .await
            .unwrap();
        assert_eq!(end, StreamEnd::Completed);
        assert_eq!(seen, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn drain_propagates_transport_error() {
        let body = fragment_stream(vec![
            Ok(b"first\n".to_vec()),
            Err(ApiError::Network("connection reset".into())),
        ]);
        let mut seen = Vec::new();
        let err = drain_frames(body, &CancellationToken::new(), |f| seen.push(f))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        // Frames decoded before the failure were still delivered.
        assert_eq!(seen, vec!["first"]);
    }

    #[tokio::test]
    async fn drain_stops_on_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let body = fragment_stream(vec![Ok(b"never\n".to_vec())]);
        let mut seen = Vec::new();
        let end = drain_frames(body, &cancel, |f| seen.push(f)).await.unwrap();
        assert_eq!(end, StreamEnd::Cancelled);
        assert!(seen.is_empty());
    }
}
