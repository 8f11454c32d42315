use anyhow::{Context, Result, ensure};
use clap::{Arg, ArgAction, Command, value_parser};
use log::error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::{panic, process};

use crate::capture::{FileCaptureDevice, StreamConfig};
use crate::config::Config;
use crate::decoder::{FfmpegDecoder, FfmpegScaler};
use crate::display::{HeadlessSurface, PresentationConsumer};
use crate::pipeline::handoff;
use crate::pipeline::types::VideoGeometry;
use crate::pipeline::{DecodeStage, PipelineHealth, PipelineSession};

pub mod capture;
pub mod config;
pub mod decoder;
pub mod display;
pub mod pipeline;
pub mod utils;

fn main() {
    tracing_subscriber::fmt::init();

    let matches = Command::new("camview")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("input")
                .value_name("STREAM")
                .help("H.264 elementary stream to replay as the capture source.")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .help("Output width of the display surface.")
                .default_value("1280")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .help("Output height of the display surface.")
                .default_value("720")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_name("RATE")
                .help("Replay pacing in access units per second.")
                .default_value("30")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("queue")
                .long("queue")
                .value_name("FRAMES")
                .help("Handoff queue capacity before drop-oldest kicks in.")
                .default_value("8")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("loop")
                .long("loop")
                .help("Restart the stream from the beginning when it ends.")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // kill the process as soon as a secondary thread panics
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(105);
    }));

    let config = match build_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {:#}", e);
            process::exit(2);
        }
    };

    if let Err(e) = run(config) {
        error!("fatal: {:#}", e);
        process::exit(1);
    }
}

fn build_config(matches: &clap::ArgMatches) -> Result<Config> {
    let width = *matches.get_one::<u32>("width").unwrap();
    let height = *matches.get_one::<u32>("height").unwrap();
    let frame_rate = *matches.get_one::<u32>("fps").unwrap();
    let queue_capacity = *matches.get_one::<usize>("queue").unwrap();
    ensure!(frame_rate > 0, "frame rate must be at least 1");
    ensure!(queue_capacity > 0, "queue capacity must be at least 1");

    Ok(Config {
        input: matches.get_one::<PathBuf>("input").unwrap().clone(),
        output: VideoGeometry::new(width, height)?,
        frame_rate,
        queue_capacity,
        looped: matches.get_flag("loop"),
    })
}

fn run(config: Config) -> Result<()> {
    let health = Arc::new(PipelineHealth::new());
    let (producer, consumer) = handoff::bounded(config.queue_capacity);

    // Capture/decode context: everything here moves into the capture thread
    let decoder = FfmpegDecoder::new().context("failed to create H.264 decoder")?;
    let converter = FfmpegScaler::new(config.output);
    let stage = DecodeStage::new(decoder, converter, producer, Arc::clone(&health));
    let device = FileCaptureDevice::new(config.input.clone(), config.looped);

    let mut session = PipelineSession::new(device, consumer.control(), Arc::clone(&health));
    session.start(
        StreamConfig {
            width: config.output.width,
            height: config.output.height,
            frame_rate: config.frame_rate,
        },
        Box::new(stage),
    )?;
    let session = Arc::new(Mutex::new(session));

    // gracefully stop the session when receiving SIGINT, SIGTERM, or SIGHUP
    {
        let session = Arc::clone(&session);
        ctrlc::set_handler(move || {
            if let Ok(mut session) = session.lock()
                && let Err(e) = session.stop()
            {
                error!("shutdown error: {:#}", e);
            }
        })
        .context("failed to set signal handler")?;
    }

    // Presentation context: this thread owns the surface until the stream
    // ends or a stop is requested
    let surface = HeadlessSurface::new(config.output);
    let mut presenter = PresentationConsumer::new(consumer, surface, Arc::clone(&health));
    presenter.run()?;

    session.lock().unwrap().stop()
}
