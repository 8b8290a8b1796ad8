//! Command line and environment configuration.
//!
//! Every option has a default, can be given as a flag, and falls back to a
//! `SIMPLE_ELEMENTS_*` environment variable.

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::train::TrainSettings;
use crate::broadcaster::BroadcasterConfig;
use crate::elements::receive::ReceiveSettings;
use crate::elements::send::{Color, SendSettings};
use crate::encode::DEFAULT_QUALITY;
use crate::server::{ServerConfig, DEFAULT_PORT};

/// Complete configuration of the demo binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub broadcaster: BroadcasterConfig,
    pub send: SendSettings,
    pub receive: ReceiveSettings,
    pub train: TrainSettings,

    /// Frames buffered between pipeline stages (default: 4).
    pub pipeline_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            broadcaster: BroadcasterConfig::default(),
            send: SendSettings::default(),
            receive: ReceiveSettings::default(),
            train: TrainSettings::default(),
            pipeline_capacity: 4,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "simple-elements")]
#[command(version, about = "Frame broadcaster demo elements", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub settings: Settings,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run send -> relay -> receive with the live preview server (default)
    Pipeline,
    /// Run the placeholder trainer and write `artifact/`
    Train,
    /// Load `artifact/` and run one prediction
    Infer,
    /// Print the element descriptors as JSON
    Elements,
}

impl Cli {
    /// Selected mode, `pipeline` when none is given.
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Pipeline)
    }
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Address the preview server binds to
    #[arg(long, env = "SIMPLE_ELEMENTS_HOST", global = true,
          default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Preview server port
    #[arg(short, long, env = "SIMPLE_ELEMENTS_PORT", global = true,
          default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Close idle `/image` streams after this many milliseconds (0 disables)
    #[arg(long, env = "SIMPLE_ELEMENTS_IDLE_TIMEOUT_MS", global = true, default_value_t = 0)]
    pub idle_timeout_ms: u64,

    /// Frames buffered per client before the oldest is dropped
    #[arg(long, env = "SIMPLE_ELEMENTS_QUEUE_CAPACITY", global = true, default_value_t = 8,
          value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub queue_capacity: usize,

    /// Maximum simultaneous `/image` clients (0 is unlimited)
    #[arg(long, env = "SIMPLE_ELEMENTS_MAX_CLIENTS", global = true, default_value_t = 0)]
    pub max_clients: usize,

    /// Fill color of the send element: black, red, green or blue
    #[arg(long, env = "SIMPLE_ELEMENTS_COLOR", global = true, default_value = "black")]
    pub color: Color,

    /// Pause between emitted frames in milliseconds
    #[arg(long, env = "SIMPLE_ELEMENTS_DELAY_MS", global = true, default_value_t = 50)]
    pub delay_ms: u64,

    /// Frame width in pixels
    #[arg(long, env = "SIMPLE_ELEMENTS_WIDTH", global = true, default_value_t = 1920,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Frame height in pixels
    #[arg(long, env = "SIMPLE_ELEMENTS_HEIGHT", global = true, default_value_t = 1080,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// JPEG quality of the preview stream
    #[arg(long, env = "SIMPLE_ELEMENTS_JPEG_QUALITY", global = true,
          default_value_t = DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    /// Directory the `artifact/` folder lives in
    #[arg(long, env = "SIMPLE_ELEMENTS_ARTIFACT_ROOT", global = true, default_value = ".")]
    pub artifact_root: PathBuf,

    /// Number of training epochs
    #[arg(long, env = "SIMPLE_ELEMENTS_EPOCHS", global = true, default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub epochs: u32,

    /// Time spent per training epoch in milliseconds
    #[arg(long, env = "SIMPLE_ELEMENTS_EPOCH_DELAY_MS", global = true, default_value_t = 200)]
    pub epoch_delay_ms: u64,

    /// Frames buffered between pipeline stages
    #[arg(long, env = "SIMPLE_ELEMENTS_PIPELINE_CAPACITY", global = true, default_value_t = 4,
          value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub pipeline_capacity: usize,
}

impl Settings {
    /// Builds the runtime configuration; zero means "off" for the optional limits.
    pub fn config(&self) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: self.host,
                port: self.port,
                idle_timeout: (self.idle_timeout_ms > 0)
                    .then(|| Duration::from_millis(self.idle_timeout_ms)),
            },
            broadcaster: BroadcasterConfig {
                queue_capacity: self.queue_capacity,
                max_clients: (self.max_clients > 0).then_some(self.max_clients),
            },
            send: SendSettings {
                color: self.color,
                delay: Duration::from_millis(self.delay_ms),
                width: self.width,
                height: self.height,
            },
            receive: ReceiveSettings {
                jpeg_quality: self.jpeg_quality,
            },
            train: TrainSettings {
                epochs: self.epochs,
                epoch_delay: Duration::from_millis(self.epoch_delay_ms),
                root: self.artifact_root.clone(),
            },
            pipeline_capacity: self.pipeline_capacity,
        }
    }
}
