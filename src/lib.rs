//! Simple Elements - example pipeline elements with a multi-client preview.
//!
//! A solid-color source, an overlay relay, a receive element that fans
//! frames out to HTTP clients as an MJPEG stream, and a placeholder
//! train/inference pair.

pub mod ai;
pub mod broadcaster;
pub mod config;
pub mod elements;
pub mod encode;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod server;

pub use broadcaster::{BroadcasterConfig, ClientHandle, FrameBroadcaster};
pub use error::{Error, Result};
pub use frame::{ColorFormat, Frame, RegionOfInterest, SegmentationMask};
