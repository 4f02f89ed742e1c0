//! JPEG frame extraction from the raw MJPEG capture stream.
//!
//! The capture process emits an unframed byte stream of concatenated JPEG
//! images. This module turns that stream, chunk by chunk, into discrete
//! frame payloads delimited by the JPEG SOI/EOI markers.

use bytes::Bytes;

/// JPEG start-of-image marker.
const SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker.
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Accumulation buffer cap (256 KiB).
///
/// A buffer that grows past this without yielding a frame is presumed
/// desynchronized and is dropped whole, trading a lost partial frame for
/// bounded memory.
pub const MAX_BUFFER_BYTES: usize = 256 * 1024;

/// Incremental frame extractor for one stream session.
///
/// State is per-session: bytes of a frame whose end marker has not arrived
/// stay buffered between `feed` calls, so frames may span chunk boundaries.
/// The extractor is not restartable; it is discarded with its session.
pub struct FrameExtractor {
    buf: Vec<u8>,
}

impl FrameExtractor {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append a chunk and return every frame it completes, in stream order.
    ///
    /// Scans for the earliest start marker, then the earliest end marker at
    /// or after it, and slices out `[start, end_of_eoi)` as one frame. The
    /// scan repeats until no complete pair remains; consumed bytes are
    /// discarded in a single compaction per call, not per match. A stray end
    /// marker with no start marker before it is skipped, never emitted.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut cursor = 0;

        while let Some((start, end)) = next_frame(&self.buf[cursor..]) {
            frames.push(Bytes::copy_from_slice(
                &self.buf[cursor + start..cursor + end],
            ));
            cursor += end;
        }

        if cursor > 0 {
            self.buf.drain(..cursor);
        }

        // Desync recovery: discard the entire buffer, not a trimmed prefix.
        if self.buf.len() > MAX_BUFFER_BYTES {
            self.buf.clear();
        }

        frames
    }

    /// Bytes currently buffered for a frame in progress.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the earliest complete frame in `buf`.
///
/// Returns `(start, end)` offsets with the end marker inside the range, or
/// `None` when no start/end pair is present.
fn next_frame(buf: &[u8]) -> Option<(usize, usize)> {
    let start = find_marker(buf, SOI)?;
    let eoi = start + find_marker(&buf[start..], EOI)?;
    Some((start, eoi + EOI.len()))
}

fn find_marker(buf: &[u8], marker: [u8; 2]) -> Option<usize> {
    buf.windows(2).position(|w| w == marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a well-formed frame around the given payload bytes.
    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut f = SOI.to_vec();
        f.extend_from_slice(payload);
        f.extend_from_slice(&EOI);
        f
    }

    /// Feeding the whole sequence at once and feeding it split at any point
    /// yield the same single frame.
    #[test]
    fn split_invariance() {
        let data = frame(&[0x01, 0x02, 0x03, 0x04, 0x05]);

        let mut whole = FrameExtractor::new();
        let reference = whole.feed(&data);
        assert_eq!(reference.len(), 1);
        assert_eq!(&reference[0][..], &data[..]);

        for split in 0..=data.len() {
            let mut ex = FrameExtractor::new();
            let mut got = ex.feed(&data[..split]);
            got.extend(ex.feed(&data[split..]));

            assert_eq!(got.len(), 1, "split at {}", split);
            assert_eq!(&got[0][..], &data[..], "split at {}", split);
        }
    }

    /// A start marker with no end marker stays pending across any number of
    /// feed calls and emits nothing until the end marker arrives.
    #[test]
    fn pending_frame_across_feeds() {
        let mut ex = FrameExtractor::new();

        assert!(ex.feed(&SOI).is_empty());
        for _ in 0..10 {
            assert!(ex.feed(&[0x10, 0x20, 0x30]).is_empty());
        }
        assert!(ex.pending_len() > 0);

        let frames = ex.feed(&EOI);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 2 + 30 + 2);
    }

    /// Growing past the cap without a complete frame drops the whole buffer.
    #[test]
    fn overflow_resets_buffer() {
        let mut ex = FrameExtractor::new();

        // A start marker followed by filler that never closes the frame.
        ex.feed(&SOI);
        let filler = vec![0xAA; MAX_BUFFER_BYTES];
        assert!(ex.feed(&filler).is_empty());
        assert_eq!(ex.pending_len(), 0);

        // The dropped partial frame must not pollute the next frame.
        let data = frame(&[0x07, 0x08]);
        let frames = ex.feed(&data);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &data[..]);
    }

    /// Exactly at the cap the buffer is retained; one byte past it is not.
    #[test]
    fn overflow_boundary_is_exclusive() {
        let mut ex = FrameExtractor::new();
        ex.feed(&vec![0xAA; MAX_BUFFER_BYTES]);
        assert_eq!(ex.pending_len(), MAX_BUFFER_BYTES);

        ex.feed(&[0xAA]);
        assert_eq!(ex.pending_len(), 0);
    }

    /// Two frames delivered in two chunks split mid-payload come out as
    /// exactly two frames, in order, each matching its delimited span.
    #[test]
    fn two_frames_split_mid_payload() {
        let first = frame(&[0x11, 0x22, 0x33, 0x44]);
        let second = frame(&[0x55, 0x66]);

        let mut stream = first.clone();
        stream.extend_from_slice(&second);
        let split = 4; // inside payload1

        let mut ex = FrameExtractor::new();
        let mut frames = ex.feed(&stream[..split]);
        frames.extend(ex.feed(&stream[split..]));

        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], &first[..]);
        assert_eq!(&frames[1][..], &second[..]);
        assert_eq!(ex.pending_len(), 0);
    }

    /// Several complete frames in one chunk are all extracted by one call.
    #[test]
    fn multiple_frames_in_one_chunk() {
        let a = frame(b"aa");
        let b = frame(b"bbbb");
        let c = frame(b"c");

        let mut stream = a.clone();
        stream.extend_from_slice(&b);
        stream.extend_from_slice(&c);

        let mut ex = FrameExtractor::new();
        let frames = ex.feed(&stream);
        assert_eq!(frames.len(), 3);
        assert_eq!(&frames[0][..], &a[..]);
        assert_eq!(&frames[1][..], &b[..]);
        assert_eq!(&frames[2][..], &c[..]);
    }

    /// An end marker arriving before any start marker is ignored; extraction
    /// picks up at the first real start marker.
    #[test]
    fn stray_end_marker_ignored() {
        let data = frame(&[0x0A, 0x0B]);

        let mut ex = FrameExtractor::new();
        assert!(ex.feed(&EOI).is_empty());
        assert!(ex.feed(&[0x99, 0x98]).is_empty());

        let frames = ex.feed(&data);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &data[..]);
    }

    /// Noise between frames is skipped, not emitted.
    #[test]
    fn garbage_between_frames() {
        let a = frame(&[0x01]);
        let b = frame(&[0x02]);

        let mut stream = vec![0x00, 0x11, 0x22];
        stream.extend_from_slice(&a);
        stream.extend_from_slice(&[0x33, 0x44]);
        stream.extend_from_slice(&b);

        let mut ex = FrameExtractor::new();
        let frames = ex.feed(&stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], &a[..]);
        assert_eq!(&frames[1][..], &b[..]);
    }
}
