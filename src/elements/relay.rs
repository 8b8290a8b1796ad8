//! Overlay relay.
//!
//! Grays out the first region's mask and draws a bordered box that moves
//! one pixel per frame across the image along a wavy vertical path.

use rand::Rng;
use std::f64::consts::PI;
use tokio::sync::mpsc;
use uuid::uuid;

use crate::elements::{ElementDescriptor, ElementKind};
use crate::error::Result;
use crate::frame::Frame;

pub const DESCRIPTOR: ElementDescriptor = ElementDescriptor {
    id: uuid!("ae601581-d71f-46f1-b31b-4883d56ec854"),
    name: "simple_relay",
    display_name: "Simple Relay",
    version: "0.1.0",
    framework_version: Some("0.4"),
    kind: ElementKind::Inference,
};

pub const MASK_COLOR: [u8; 3] = [100, 100, 100];
pub const BOX_SIZE: i64 = 50;
pub const BOX_COLOR: [u8; 3] = [255, 255, 255];
pub const BOX_BORDER_WIDTH: i64 = 3;
const BOX_FILL: [u8; 3] = [0, 0, 0];
const BOX_SPEED: u32 = 1;

/// Per-stream animation state.
#[derive(Debug, Clone)]
pub struct Relay {
    idx: u32,
    y_offset_factor: f64,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(rand::thread_rng().gen_range(0.25..0.75))
    }
}

impl Relay {
    /// Creates a relay whose box travels around `y_offset_factor * height`.
    pub fn new(y_offset_factor: f64) -> Self {
        Self {
            idx: 0,
            y_offset_factor,
        }
    }

    /// Horizontal box position used for the most recent frame.
    pub fn position(&self) -> u32 {
        self.idx
    }

    /// Vertical box position for a given column and frame size.
    pub fn box_y(&self, idx: u32, width: u32, height: u32) -> i64 {
        let h = height as f64;
        let y_offset = self.y_offset_factor * h;
        let long_arc = (h * 0.18) * (2.0 * PI * idx as f64 / width as f64).sin();
        let short_arc = (h * 0.05) * (idx as f64 * 0.03).cos();
        (long_arc + short_arc + y_offset) as i64
    }

    /// Applies the mask overlay and advances the box by one step.
    ///
    /// A malformed frame is forwarded untouched and the box does not move.
    /// A mask whose data does not match its size is ignored.
    pub fn process(&mut self, mut frame: Frame) -> Frame {
        if let Err(e) = frame.validate() {
            tracing::warn!(error = %e, "Forwarding malformed frame untouched");
            return frame;
        }

        let rois = std::mem::take(&mut frame.rois);
        if let Some(mask) = rois.first().and_then(|roi| roi.mask.as_ref()) {
            match mask.validate() {
                Ok(()) => frame.apply_mask_color(mask, MASK_COLOR),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed mask"),
            }
        }
        frame.rois = rois;

        self.idx = (self.idx + BOX_SPEED) % frame.width;
        let x = self.idx as i64;
        let y = self.box_y(self.idx, frame.width, frame.height);

        frame.fill_rect(x, y, BOX_SIZE, BOX_SIZE, BOX_COLOR);
        frame.fill_rect(
            x + BOX_BORDER_WIDTH,
            y + BOX_BORDER_WIDTH,
            BOX_SIZE - 2 * BOX_BORDER_WIDTH,
            BOX_SIZE - 2 * BOX_BORDER_WIDTH,
            BOX_FILL,
        );
        frame
    }
}

/// Relays frames from `input` to `output` until either side closes.
pub async fn run(mut input: mpsc::Receiver<Frame>, output: mpsc::Sender<Frame>) -> Result<u64> {
    let mut relay = Relay::default();
    tracing::info!(y_offset_factor = relay.y_offset_factor, "Relay element started");

    let mut relayed = 0u64;
    while let Some(frame) = input.recv().await {
        if output.send(relay.process(frame)).await.is_err() {
            break;
        }
        relayed += 1;
    }

    tracing::info!(frames = relayed, "Relay element stopped");
    Ok(relayed)
}
