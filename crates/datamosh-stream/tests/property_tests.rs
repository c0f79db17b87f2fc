//! Property-based tests for frame splitting and the mosh transducer.

use datamosh_stream::frame::{KEYFRAME_SIGNATURE, SIGNATURE_OFFSET};
use datamosh_stream::{
    classify, split_frames, EffectWindow, FrameKind, Frames, Transducer, FRAME_MARKER,
};
use proptest::prelude::*;

/// Payload bytes that can never form the marker (no ASCII '0').
fn payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("no '0'", |b| *b != b'0'), 0..48)
}

/// Frame payload, a keyframe half of the time.
fn frame() -> impl Strategy<Value = Vec<u8>> {
    (payload(), any::<bool>()).prop_map(|(mut bytes, key)| {
        if key {
            if bytes.len() < SIGNATURE_OFFSET + 3 {
                bytes.resize(SIGNATURE_OFFSET + 3, 0xAA);
            }
            bytes[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 3].copy_from_slice(&KEYFRAME_SIGNATURE);
        }
        bytes
    })
}

proptest! {
    /// Property: joining split payloads with the marker rebuilds the buffer.
    #[test]
    fn prop_split_round_trip(buf in prop::collection::vec(any::<u8>(), 0..512)) {
        let payloads: Vec<&[u8]> = split_frames(&buf).iter().map(|f| f.payload).collect();
        prop_assert_eq!(payloads.join(&FRAME_MARKER[..]), buf);
    }

    /// Property: splitting recovers exactly the frames that were joined.
    #[test]
    fn prop_split_recovers_frames(frames in prop::collection::vec(payload(), 1..20)) {
        let raw = frames.join(&FRAME_MARKER[..]);
        let split: Vec<Vec<u8>> = Frames::new(&raw).map(|f| f.payload.to_vec()).collect();
        prop_assert_eq!(split, frames);
    }

    /// Property: anything shorter than 8 bytes is a predictive frame.
    #[test]
    fn prop_short_frames_are_predictive(bytes in prop::collection::vec(any::<u8>(), 0..8)) {
        prop_assert_eq!(classify(&bytes), FrameKind::Predictive);
    }

    /// Property: the signature at offset 5 wins regardless of surrounding bytes.
    #[test]
    fn prop_signature_marks_keyframe(
        prefix in prop::collection::vec(any::<u8>(), SIGNATURE_OFFSET),
        suffix in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut bytes = prefix;
        bytes.extend_from_slice(&KEYFRAME_SIGNATURE);
        bytes.extend_from_slice(&suffix);
        prop_assert_eq!(classify(&bytes), FrameKind::Keyframe);
    }

    /// Property: output size never grows when the repeat count shrinks.
    #[test]
    fn prop_output_monotonic_in_repeat_count(
        frames in prop::collection::vec(frame(), 1..24),
        start in -4i64..12,
        span in 0i64..12,
        repeat in 0u32..8,
    ) {
        let raw = frames.join(&FRAME_MARKER[..]);
        let window = EffectWindow::new(start, start + span);

        let smaller = Transducer::new(window, repeat).mosh(&raw);
        let larger = Transducer::new(window, repeat + 1).mosh(&raw);

        prop_assert!(smaller.data.len() <= larger.data.len());
        prop_assert_eq!(smaller.stats.frames_in, frames.len());
    }

    /// Property: with a window past the end of the stream the output is the
    /// input plus one trailing marker.
    #[test]
    fn prop_window_past_end_is_identity(
        frames in prop::collection::vec(frame(), 1..24),
        repeat in 0u32..8,
    ) {
        let raw = frames.join(&FRAME_MARKER[..]);
        let window = EffectWindow::new(frames.len() as i64, frames.len() as i64 + 10);

        let output = Transducer::new(window, repeat).mosh(&raw);

        let mut expected = raw.clone();
        expected.extend_from_slice(&FRAME_MARKER);
        prop_assert_eq!(&output.data[..], &expected[..]);
    }

    /// Property: emitted frame units add up to pass-through plus repeats.
    #[test]
    fn prop_frames_out_accounting(
        frames in prop::collection::vec(frame(), 1..24),
        start in 0i64..12,
        span in 0i64..12,
        repeat in 0u32..8,
    ) {
        let raw = frames.join(&FRAME_MARKER[..]);
        let output = Transducer::new(EffectWindow::new(start, start + span), repeat).mosh(&raw);
        let stats = output.stats;

        prop_assert_eq!(
            stats.frames_out,
            stats.passed_through as u64 + stats.repeated as u64 * u64::from(repeat)
        );
        prop_assert_eq!(
            stats.frames_in,
            stats.passed_through + stats.repeated + stats.dropped_keyframes
        );
    }
}
