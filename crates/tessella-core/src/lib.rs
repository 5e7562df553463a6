//! # tessella-core
//!
//! Core types for the tessella animated mosaic generator.
//! This crate holds everything that does not touch pixels in bulk or files:
//! exact timing math, loop synchronization, mosaic grid geometry, frame
//! buffers, colors, configuration and error types.

pub mod animation;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod hash;
pub mod layout;
pub mod math;
pub mod rational;
pub mod sync;

pub use animation::Animation;
pub use color::Color;
pub use config::{AssetConfig, MosaicSettings, TessellaConfig};
pub use error::{TessellaError, TessellaResult};
pub use frame::FrameBuffer;
pub use layout::{MosaicLayout, Tile};
pub use math::{GridPosition, PixelRect, PixelSize};
pub use rational::Rational;
pub use sync::{synchronize, FramePair, SyncOptions, SynchronizationResult};
