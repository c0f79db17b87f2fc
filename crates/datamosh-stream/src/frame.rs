//! Frame splitting and keyframe classification.
//!
//! The intermediate AVI written by the transcode step stores each video
//! chunk as `<payload>00dc`. Splitting on that marker is not a real RIFF
//! demux (audio chunks and the index ride along inside payloads), but it is
//! stable for the ffmpeg output this crate is fed, and it keeps every byte of
//! the file accounted for.

/// End-of-frame marker, ASCII `00dc` (`30 30 64 63`).
pub const FRAME_MARKER: [u8; 4] = *b"00dc";

/// Bytes identifying a keyframe (MPEG-4 Part 2 VOS start code `00 01 B0`).
pub const KEYFRAME_SIGNATURE: [u8; 3] = [0x00, 0x01, 0xB0];

/// Offset of [`KEYFRAME_SIGNATURE`] within a frame payload.
pub const SIGNATURE_OFFSET: usize = 5;

/// Kind of an encoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    /// Self-contained frame; resets the decoder's reference picture.
    Keyframe,
    /// Frame predicted from the previous reference picture.
    Predictive,
}

impl FrameKind {
    pub fn is_keyframe(&self) -> bool {
        matches!(self, Self::Keyframe)
    }
}

/// Classify a frame payload by the signature at [`SIGNATURE_OFFSET`].
///
/// Payloads too short to hold the signature are predictive.
pub fn classify(payload: &[u8]) -> FrameKind {
    let end = SIGNATURE_OFFSET + KEYFRAME_SIGNATURE.len();
    match payload.get(SIGNATURE_OFFSET..end) {
        Some(window) if window == KEYFRAME_SIGNATURE => FrameKind::Keyframe,
        _ => FrameKind::Predictive,
    }
}

/// One frame payload, borrowed from the raw buffer, without its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Position in stream order, starting at 0.
    pub index: usize,
    /// Payload bytes, marker excluded.
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(index: usize, payload: &'a [u8]) -> Self {
        Self { index, payload }
    }

    pub fn kind(&self) -> FrameKind {
        classify(self.payload)
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Lazy iterator over the frames of a raw buffer.
///
/// Splits on every non-overlapping [`FRAME_MARKER`], scanning left to right.
/// The fragment after the last marker is always yielded, even when empty, so
/// a buffer with `n` markers yields `n + 1` frames.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    rest: Option<&'a [u8]>,
    index: usize,
}

impl<'a> Frames<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            rest: Some(buf),
            index: 0,
        }
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.take()?;

        let payload = match find_marker(rest) {
            Some(pos) => {
                self.rest = Some(&rest[pos + FRAME_MARKER.len()..]);
                &rest[..pos]
            }
            None => rest,
        };

        let frame = Frame::new(self.index, payload);
        self.index += 1;
        Some(frame)
    }
}

impl std::iter::FusedIterator for Frames<'_> {}

/// Split a raw buffer into its ordered frame sequence.
pub fn split_frames(buf: &[u8]) -> Vec<Frame<'_>> {
    Frames::new(buf).collect()
}

fn find_marker(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(FRAME_MARKER.len())
        .position(|w| w == FRAME_MARKER)
}
