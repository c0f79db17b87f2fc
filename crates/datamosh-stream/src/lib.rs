//! Datamosh-Stream: frame-level rewriting of marker-delimited AVI video data
//!
//! This crate holds the part of datamosh that touches encoded bytes. It has no
//! I/O of its own: callers hand it the full intermediate AVI as a byte slice
//! and receive the rewritten stream back.
//!
//! # Modules
//!
//! - `frame` - Splitting a buffer on the `00dc` end-of-frame marker and
//!   classifying payloads as keyframes or predictive frames
//! - `window` - Converting effect start/end seconds into an inclusive frame
//!   index window on the trimmed timeline
//! - `transducer` - The single-pass rewrite that repeats predictive frames and
//!   drops keyframes inside the window
//! - `settings` - Immutable run configuration shared by the resolver and the
//!   transducer
//!
//! # Example
//!
//! ```
//! use datamosh_stream::MoshSettings;
//!
//! let settings = MoshSettings::default();
//! let transducer = settings.transducer()?;
//!
//! let raw = b"\x00\x00\x00\x00\x00\x00\x01\xB0I00dcP00dcP";
//! let output = transducer.mosh(raw);
//! assert_eq!(output.stats.frames_in, 3);
//! # Ok::<(), datamosh_stream::Error>(())
//! ```

pub mod error;
pub mod frame;
pub mod settings;
pub mod transducer;
pub mod window;

pub use error::{Error, Result};
pub use frame::{classify, split_frames, Frame, FrameKind, Frames, FRAME_MARKER};
pub use settings::MoshSettings;
pub use transducer::{Emission, MoshOutput, MoshState, MoshStats, Transducer};
pub use window::{resolve, EffectTimes, EffectWindow, ResolvedWindow};
