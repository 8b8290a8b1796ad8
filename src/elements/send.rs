//! Solid-color frame source.
//!
//! Paints one frame in the configured color, marks a random 200x100
//! rectangle in a segmentation mask covering the whole frame, and emits
//! that frame repeatedly.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::uuid;

use crate::elements::{ElementDescriptor, ElementKind};
use crate::error::{Error, Result};
use crate::frame::{ColorFormat, Frame, RegionOfInterest, SegmentationMask};

pub const DESCRIPTOR: ElementDescriptor = ElementDescriptor {
    id: uuid!("74040ed5-9440-423c-8541-5155aef24338"),
    name: "simple_send",
    display_name: "Simple Send",
    version: "0.1.0",
    framework_version: Some("0.7"),
    kind: ElementKind::Source,
};

/// Mask rectangle width in pixels.
pub const MASK_WIDTH: u32 = 200;
/// Mask rectangle height in pixels.
pub const MASK_HEIGHT: u32 = 100;

/// Fill color of the emitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Black,
    Red,
    Green,
    Blue,
}

impl Color {
    pub const VALID_VALUES: [&'static str; 4] = ["black", "red", "green", "blue"];

    pub fn rgb(self) -> [u8; 3] {
        match self {
            Color::Black => [0, 0, 0],
            Color::Red => [255, 0, 0],
            Color::Green => [0, 255, 0],
            Color::Blue => [0, 0, 255],
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            other => Err(Error::InvalidSetting {
                name: "color",
                value: other.to_string(),
            }),
        }
    }
}

/// Settings for the send element.
#[derive(Debug, Clone)]
pub struct SendSettings {
    pub color: Color,

    /// Pause between frames (default: 50ms). Zero sends as fast as the
    /// downstream channel accepts.
    pub delay: Duration,

    pub width: u32,
    pub height: u32,
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            color: Color::Black,
            delay: Duration::from_millis(50),
            width: 1920,
            height: 1080,
        }
    }
}

impl SendSettings {
    /// Whether a settings UI should show the advanced `delay` field.
    ///
    /// Only affects presentation; the executor always honors `delay`.
    pub fn delay_visible(&self) -> bool {
        self.color == Color::Red
    }
}

/// Builds the frame the element emits.
pub fn build_frame<R: Rng>(settings: &SendSettings, rng: &mut R) -> Frame {
    let mut frame = Frame::solid(
        settings.width,
        settings.height,
        settings.color.rgb(),
        ColorFormat::Rgb,
    );

    let mask_w = MASK_WIDTH.min(settings.width);
    let mask_h = MASK_HEIGHT.min(settings.height);
    let start_row = rng.gen_range(0..=settings.height - mask_h);
    let start_col = rng.gen_range(0..=settings.width - mask_w);

    let mut mask = SegmentationMask::empty(settings.width, settings.height);
    mask.fill_rect(start_col, start_row, mask_w, mask_h);

    frame.rois.push(RegionOfInterest::new(0, 0, settings.width, settings.height).with_mask(mask));
    frame
}

/// Emits the frame until the downstream receiver goes away.
///
/// Returns the number of frames sent.
pub async fn run(settings: SendSettings, output: mpsc::Sender<Frame>) -> Result<u64> {
    if settings.width == 0 || settings.height == 0 {
        return Err(Error::InvalidSetting {
            name: "size",
            value: format!("{}x{}", settings.width, settings.height),
        });
    }

    let frame = build_frame(&settings, &mut rand::thread_rng());
    tracing::info!(
        color = ?settings.color,
        delay_ms = settings.delay.as_millis() as u64,
        width = settings.width,
        height = settings.height,
        "Send element started"
    );

    let mut sent = 0u64;
    loop {
        if output.send(frame.clone()).await.is_err() {
            break;
        }
        sent += 1;

        if !settings.delay.is_zero() {
            tokio::time::sleep(settings.delay).await;
        }
    }

    tracing::info!(frames = sent, "Send element stopped, downstream closed");
    Ok(sent)
}
