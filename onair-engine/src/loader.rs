//! Asset loading
//!
//! The engine never decodes audio itself; it only needs to know how long
//! each asset is and where it lives. [`AssetLoader`] is the seam to the
//! decoding side. [`FileProbeLoader`] reads container headers with symphonia
//! to obtain the frame count without decoding any audio.

use crate::error::{Error, Result};
use crate::sequence::{LoadedItem, LoadedJob, SequenceJob};
use onair_common::timing::{rescale_frames, samples_to_seconds};
use std::path::{Path, PathBuf};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// A loaded asset: where it lives and how long it plays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedBuffer {
    pub asset_id: String,
    pub location: PathBuf,
    /// Length in samples at the working sample rate
    pub length_samples: u64,
}

impl TimedBuffer {
    pub fn new(asset_id: impl Into<String>, location: impl Into<PathBuf>, length_samples: u64) -> Self {
        Self {
            asset_id: asset_id.into(),
            location: location.into(),
            length_samples,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        samples_to_seconds(self.length_samples)
    }
}

/// Resolves an asset identifier to a [`TimedBuffer`]
///
/// Implementations may block; the runner calls them from the blocking pool.
pub trait AssetLoader: Send + Sync {
    fn load(&self, asset_id: &str) -> Result<TimedBuffer>;
}

/// Loads every item of `job`, dropping items whose main asset fails
///
/// A narration that fails to load is dropped on its own; the music item it
/// belongs to still plays, just without that overlay.
pub fn load_job(loader: &dyn AssetLoader, job: SequenceJob) -> LoadedJob {
    let mut items = Vec::with_capacity(job.items.len());

    for item in job.items {
        let buffer = match loader.load(&item.asset_id) {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("Dropping {:?} item {}: {}", item.kind, item.asset_id, e);
                continue;
            }
        };
        let intro_buffer = item.intro.as_ref().and_then(|n| load_narration(loader, &n.asset_id));
        let outro_buffer = item.outro.as_ref().and_then(|n| load_narration(loader, &n.asset_id));
        items.push(LoadedItem {
            item,
            buffer,
            intro_buffer,
            outro_buffer,
        });
    }

    LoadedJob {
        id: job.id,
        template: job.template,
        items,
        followup_hint: job.followup_hint,
    }
}

fn load_narration(loader: &dyn AssetLoader, asset_id: &str) -> Option<TimedBuffer> {
    match loader.load(asset_id) {
        Ok(buffer) => Some(buffer),
        Err(e) => {
            warn!("Dropping narration {}: {}", asset_id, e);
            None
        }
    }
}

/// Probes audio files under a root folder with symphonia
#[derive(Debug, Clone)]
pub struct FileProbeLoader {
    root: PathBuf,
}

impl FileProbeLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Frame count and sample rate of the file's default audio track
    ///
    /// Uses the container's declared frame count when present, otherwise
    /// sums packet durations (still no decoding).
    fn probe(path: &Path) -> std::result::Result<(u64, u32), String> {
        let file = std::fs::File::open(path).map_err(|e| format!("open failed: {}", e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| format!("probe failed: {}", e))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| "no audio track".to_string())?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| "sample rate unknown".to_string())?;

        if let Some(frames) = track.codec_params.n_frames {
            return Ok((frames, sample_rate));
        }

        let mut frames = 0u64;
        loop {
            match format.next_packet() {
                Ok(packet) if packet.track_id() == track_id => frames += packet.dur,
                Ok(_) => {}
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break
                }
                Err(e) => return Err(format!("packet scan failed: {}", e)),
            }
        }
        Ok((frames, sample_rate))
    }
}

impl AssetLoader for FileProbeLoader {
    fn load(&self, asset_id: &str) -> Result<TimedBuffer> {
        let location = self.root.join(asset_id);
        let (frames, sample_rate) = Self::probe(&location).map_err(|reason| Error::load(asset_id, reason))?;
        if frames == 0 {
            return Err(Error::load(asset_id, "no audio frames"));
        }
        let length_samples = rescale_frames(frames, sample_rate);
        debug!(
            "Probed {}: {} frames @ {} Hz -> {} samples",
            asset_id, frames, sample_rate, length_samples
        );
        Ok(TimedBuffer {
            asset_id: asset_id.to_string(),
            location,
            length_samples,
        })
    }
}
