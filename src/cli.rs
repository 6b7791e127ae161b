use clap::Parser;
use std::path::PathBuf;

/// Headless keyframe playback driver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Keyframe document to play (JSON, as written by the engine's file store)
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Media item UUID to play (default: first one in the document)
    #[arg(short = 'm', long = "media", value_name = "UUID")]
    pub media: Option<uuid::Uuid>,

    /// Repeat count (-1 = loop forever)
    #[arg(short = 'r', long = "repeat", value_name = "N", default_value = "1", allow_hyphen_values = true)]
    pub repeat: i32,

    /// Easing curve name (linear, optimizedcubic, easeoutexpo, bezier, csseaseinout)
    #[arg(short = 'e', long = "easing", value_name = "NAME", default_value = "csseaseinout")]
    pub easing: String,

    /// Scroll-glide duration between keyframes, seconds (0 = instant cuts)
    #[arg(long = "transition", value_name = "SECS", default_value = "0.8")]
    pub transition_secs: f64,

    /// Dwell time for keyframes without recorded timing, seconds
    #[arg(long = "dwell", value_name = "SECS", default_value = "3.0")]
    pub default_dwell_secs: f64,

    /// Engine tick rate in Hz
    #[arg(long = "rate", value_name = "HZ", default_value = "60")]
    pub tick_hz: u32,

    /// Viewport height in pixels (for relative-position math)
    #[arg(long = "viewport", value_name = "PX", default_value = "1080")]
    pub viewport_height: f32,

    /// Scrollable content height in pixels
    #[arg(long = "height", value_name = "PX", default_value = "10000")]
    pub scrollable_height: f32,
}
