//! # tessella-render
//!
//! The tessella rendering engine. Decodes the input and tile animations,
//! renders every synchronized output frame as a grid of tinted tiles on a
//! rayon pool, and hands the ordered frames to an encoder.

pub mod loader;
pub mod pipeline;
pub mod sampler;
pub mod tile;

pub use loader::{load_animation, load_image, LoadedAnimation};
pub use pipeline::{AnimationSource, FrameSequenceAssembler, MosaicJob, MosaicPlan, MosaicSequence};
pub use tile::{FrameRequest, TileOffset, TileRenderer};
