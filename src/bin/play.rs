//! Headless playback driver.
//!
//! Loads a keyframe document, plays one media item's sequence, and prints
//! the engine's event stream. Useful for checking recorded timing without
//! a UI, and as a minimal example of driving the engine.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use scrolla::cli::Args;
use scrolla::{
    Easing, EngineEvent, EngineSettings, JsonKeyframeStore, KeyframeEngine, ScrollSurface,
    SystemClock,
};

/// Surface that just remembers the offset; positions are reported through
/// the event stream rather than per-tick prints.
struct HeadlessSurface {
    viewport: f32,
    scrollable: f32,
    offset: f32,
}

impl ScrollSurface for HeadlessSurface {
    fn set_scroll_offset(&mut self, y: f32) {
        self.offset = y;
    }

    fn viewport_height(&self) -> f32 {
        self.viewport
    }

    fn scrollable_height(&self) -> f32 {
        self.scrollable
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = EngineSettings {
        transition_secs: args.transition_secs,
        default_dwell_secs: args.default_dwell_secs,
        easing: Easing::from_name(&args.easing),
        play_repeat_count: args.repeat,
        ..Default::default()
    };

    let store = JsonKeyframeStore::open(&args.document, settings.min_distance_px)
        .with_context(|| format!("opening {}", args.document.display()))?;

    let media = match args.media.or_else(|| store.media_items().first().copied()) {
        Some(media) => media,
        None => bail!("document contains no keyframes"),
    };

    let (mut engine, events) = KeyframeEngine::with_channel(store, SystemClock::new(), settings);
    engine.set_active_media(Some(media));

    let mut surface = HeadlessSurface {
        viewport: args.viewport_height,
        scrollable: args.scrollable_height,
        offset: 0.0,
    };

    info!("Playing media item {} at {} Hz", media, args.tick_hz);
    engine.toggle_playback(&mut surface)?;

    let tick = Duration::from_secs_f64(1.0 / args.tick_hz.max(1) as f64);
    loop {
        engine.tick(&mut surface)?;

        let mut finished = false;
        for event in events.try_iter() {
            match event {
                EngineEvent::CurrentKeyframeChanged { index, y_position } => {
                    println!("keyframe {:>3}  y={:.0}", index + 1, y_position);
                }
                EngineEvent::ScrollAnimationRequested { start, end, duration_secs, easing } => {
                    println!("  glide {:.0} -> {:.0} over {:.2}s ({})", start, end, duration_secs, easing.name());
                }
                EngineEvent::PlayFinished { completed_count } => {
                    println!("finished after {} pass(es)", completed_count);
                    finished = true;
                }
                EngineEvent::Status(msg) => println!("status: {}", msg),
                _ => {}
            }
        }
        if finished {
            break;
        }
        thread::sleep(tick);
    }
    Ok(())
}
