//! # tessella-encode
//!
//! Encoding module: converts rendered mosaic frames to a looping animated GIF.

pub mod gif;

pub use gif::{frame_delay, GifEncoder};
