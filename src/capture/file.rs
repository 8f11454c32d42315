//! File-backed capture device
//!
//! Replays an H.264 elementary stream from disk as if a camera were
//! producing it: the file is split into start-code-delimited access units
//! and each unit is delivered to the sink at the configured frame
//! interval from a dedicated capture thread. Lets the whole pipeline run
//! without camera hardware.

use anyhow::{Context, Result, anyhow, ensure};
use bytes::Bytes;
use log::{debug, info};
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;
use std::{fs, thread};

use crate::capture::{AccessUnitSink, CaptureDevice, StreamConfig};
use crate::decoder::classifier::START_CODE;
use crate::utils::sos::SignalOfStop;

pub struct FileCaptureDevice {
    path: PathBuf,
    looped: bool,
    sos: SignalOfStop,
    worker: Option<JoinHandle<()>>,
}

impl FileCaptureDevice {
    /// `looped` replays the file from the start after reaching its end,
    /// approximating an endless camera stream.
    pub fn new(path: PathBuf, looped: bool) -> Self {
        Self {
            path,
            looped,
            sos: SignalOfStop::new(),
            worker: None,
        }
    }
}

impl CaptureDevice for FileCaptureDevice {
    fn start(&mut self, config: StreamConfig, mut sink: Box<dyn AccessUnitSink>) -> Result<()> {
        ensure!(self.worker.is_none(), "capture already started");

        let data = Bytes::from(
            fs::read(&self.path)
                .with_context(|| format!("failed to read {}", self.path.display()))?,
        );
        let units = split_access_units(&data);
        ensure!(
            !units.is_empty(),
            "no access units found in {}",
            self.path.display()
        );
        info!(
            "replaying {} access units from {} at {} fps",
            units.len(),
            self.path.display(),
            config.frame_rate
        );

        let interval = Duration::from_secs_f64(1.0 / f64::from(config.frame_rate.max(1)));
        let looped = self.looped;
        self.sos = SignalOfStop::new();
        let sos = self.sos.clone();

        let worker = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                loop {
                    for unit in &units {
                        if sos.cancelled() {
                            info!("capture halted");
                            return;
                        }
                        // One serialized callback per unit; the borrow
                        // ends when the sink returns
                        sink.on_access_unit(unit);
                        if sos.wait_timeout(interval) {
                            info!("capture halted");
                            return;
                        }
                    }
                    if !looped {
                        break;
                    }
                }
                info!("capture reached end of stream");
            })
            .context("failed to spawn capture thread")?;

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.sos.cancel();
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| anyhow!("capture thread panicked"))?;
        }
        Ok(())
    }
}

/// Split an Annex B elementary stream into access units on four-byte
/// start-code boundaries. Bytes before the first start code are dropped.
fn split_access_units(data: &Bytes) -> Vec<Bytes> {
    let bytes = data.as_ref();
    let mut starts = Vec::new();
    let mut i = 0;
    while i + START_CODE.len() <= bytes.len() {
        if bytes[i..i + START_CODE.len()] == START_CODE {
            starts.push(i);
            i += START_CODE.len();
        } else {
            i += 1;
        }
    }

    if let Some(&first) = starts.first()
        && first > 0
    {
        debug!("dropping {} bytes before first start code", first);
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(bytes.len());
            data.slice(start..end)
        })
        .collect()
}
