//! The mosh transducer.
//!
//! A single forward pass over the frame sequence. Outside the effect window,
//! and everywhere before the first keyframe, frames are copied once. Inside
//! the window, predictive frames are written `repeat_count` times and
//! keyframes are dropped, so the decoder keeps applying motion vectors to a
//! stale reference picture for the whole window.

use bytes::{BufMut, Bytes, BytesMut};

use crate::frame::{Frame, FrameKind, Frames, FRAME_MARKER};
use crate::window::EffectWindow;

/// Default number of copies written for each predictive frame in the window.
pub const DEFAULT_REPEAT_COUNT: u32 = 15;

/// How many copies of a frame the transducer writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Written once, verbatim.
    PassThrough,
    /// Predictive frame inside the window, written `n` times (possibly zero).
    Repeat(u32),
    /// Keyframe inside the window, not written.
    Drop,
}

impl Emission {
    /// Number of frame copies this emission produces.
    pub fn copies(&self) -> u32 {
        match self {
            Emission::PassThrough => 1,
            Emission::Repeat(n) => *n,
            Emission::Drop => 0,
        }
    }
}

/// State carried across one transduction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoshState {
    /// Set by the first keyframe written; never cleared.
    pub seen_first_keyframe: bool,
}

impl MoshState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what to do with the frame at `index` and advance the state.
    pub fn step(
        &mut self,
        index: usize,
        kind: FrameKind,
        window: &EffectWindow,
        repeat_count: u32,
    ) -> Emission {
        let in_window = self.seen_first_keyframe && window.contains(index);

        if !in_window {
            if kind.is_keyframe() {
                self.seen_first_keyframe = true;
            }
            return Emission::PassThrough;
        }

        match kind {
            FrameKind::Predictive => Emission::Repeat(repeat_count),
            FrameKind::Keyframe => Emission::Drop,
        }
    }
}

/// Counters collected during a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MoshStats {
    /// Frames read from the input.
    pub frames_in: usize,
    /// Keyframes read from the input, wherever they were.
    pub keyframes: usize,
    /// Frames copied once.
    pub passed_through: usize,
    /// Predictive frames inside the window.
    pub repeated: usize,
    /// Keyframes inside the window.
    pub dropped_keyframes: usize,
    /// Total frame copies written.
    pub frames_out: u64,
    /// Index of the keyframe that armed the window.
    pub first_keyframe_index: Option<usize>,
}

impl MoshStats {
    fn record(&mut self, frame: &Frame<'_>, kind: FrameKind, emission: Emission) {
        self.frames_in += 1;
        if kind.is_keyframe() {
            self.keyframes += 1;
            if self.first_keyframe_index.is_none() && emission == Emission::PassThrough {
                self.first_keyframe_index = Some(frame.index);
            }
        }
        match emission {
            Emission::PassThrough => self.passed_through += 1,
            Emission::Repeat(_) => self.repeated += 1,
            Emission::Drop => self.dropped_keyframes += 1,
        }
        self.frames_out += u64::from(emission.copies());
    }

    /// Whether any frame was actually moshed.
    pub fn moshed(&self) -> bool {
        self.repeated > 0 || self.dropped_keyframes > 0
    }
}

/// Rewritten stream plus the counters for the pass that produced it.
#[derive(Debug, Clone)]
pub struct MoshOutput {
    pub data: Bytes,
    pub stats: MoshStats,
}

/// Applies the windowed repeat/drop policy to a frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transducer {
    window: EffectWindow,
    repeat_count: u32,
}

impl Transducer {
    pub fn new(window: EffectWindow, repeat_count: u32) -> Self {
        Self {
            window,
            repeat_count,
        }
    }

    pub fn window(&self) -> EffectWindow {
        self.window
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Split `raw` and rewrite it in one streaming pass.
    pub fn mosh(&self, raw: &[u8]) -> MoshOutput {
        let mut out = BytesMut::with_capacity(raw.len() + FRAME_MARKER.len());
        let stats = self.transduce(Frames::new(raw), &mut out);
        MoshOutput {
            data: out.freeze(),
            stats,
        }
    }

    /// Rewrite an ordered frame sequence into `out`.
    ///
    /// Frames are handled strictly in iteration order; the frame index used
    /// for window membership is the one carried by each [`Frame`].
    pub fn transduce<'a, I>(&self, frames: I, out: &mut BytesMut) -> MoshStats
    where
        I: IntoIterator<Item = Frame<'a>>,
    {
        let mut state = MoshState::new();
        let mut stats = MoshStats::default();

        for frame in frames {
            let kind = frame.kind();
            let emission = state.step(frame.index, kind, &self.window, self.repeat_count);
            write_copies(out, frame.payload, emission.copies());
            stats.record(&frame, kind, emission);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            window = %self.window,
            frames_in = stats.frames_in,
            frames_out = stats.frames_out,
            repeated = stats.repeated,
            dropped_keyframes = stats.dropped_keyframes,
            first_keyframe = ?stats.first_keyframe_index,
            "Mosh pass finished"
        );

        stats
    }
}

fn write_copies(out: &mut BytesMut, payload: &[u8], copies: u32) {
    if copies == 0 {
        return;
    }
    out.reserve((payload.len() + FRAME_MARKER.len()) * copies as usize);
    for _ in 0..copies {
        out.put_slice(payload);
        out.put_slice(&FRAME_MARKER);
    }
}


#[cfg(all(test, feature = "tracing"))]
mod tracing_tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Metadata, Subscriber};

    /// Counts events emitted from this crate.
    struct CountEvents(Arc<AtomicUsize>);

    impl Subscriber for CountEvents {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _: &Attributes<'_>) -> Id {
            Id::from_u64(1)
        }

        fn record(&self, _: &Id, _: &Record<'_>) {}

        fn record_follows_from(&self, _: &Id, _: &Id) {}

        fn event(&self, event: &Event<'_>) {
            if event.metadata().target().starts_with("datamosh_stream") {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn enter(&self, _: &Id) {}

        fn exit(&self, _: &Id) {}
    }

    #[test]
    fn test_mosh_pass_emits_summary_event() {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = CountEvents(Arc::clone(&count));

        tracing::subscriber::with_default(subscriber, || {
            Transducer::new(EffectWindow::new(0, 1), 2).mosh(b"frame");
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
