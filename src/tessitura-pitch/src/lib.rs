//! Audio decoding and monophonic pitch tracking.
//!
//! One call to [`extract_pitches`] decodes a file down to mono f32
//! samples and runs the YIN estimator over a sliding analysis
//! window, yielding one [`PitchRecord`] per full frame.

use std::path::Path;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

mod decode;

mod yin;
use yin::{FRAME_SIZE, HOP_SIZE};

/// Errors that can occur while analyzing an audio file.
#[derive(Debug, Error)]
pub enum PitchError {
    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// Wrapper around IO errors encountered while reading the file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error returned when the container does not expose a decodable track.
    #[error("input stream does not provide a decodable track")]
    MissingTrack,

    /// Error returned when the decoder track lacks a sample rate.
    #[error("input stream does not advertise a sample rate")]
    MissingSampleRate,
}

/// One row of analysis output for a single frame of audio.
#[derive(Clone, Debug, PartialEq)]
pub struct PitchRecord {
    /// The identifier of the source file.
    pub file: String,
    /// The estimated fundamental frequency in Hz, 0.0 when unvoiced.
    pub pitch: f32,
    /// The estimator's confidence in the range [0, 1].
    pub confidence: f32,
}

/// Analyzes a single audio file and returns one record per frame.
///
/// Frames are 4096 samples long with a hop of 512; a trailing
/// stretch shorter than a full frame is dropped. Files shorter than
/// one frame therefore produce an empty result, which is not an
/// error.
pub fn extract_pitches(path: &Path) -> Result<Vec<PitchRecord>, PitchError> {
    let audio = decode::decode_mono(path)?;
    let file = path.display().to_string();

    let mut records = Vec::new();
    let mut start = 0;
    while start + FRAME_SIZE <= audio.samples.len() {
        let frame = &audio.samples[start..start + FRAME_SIZE];
        let estimate = yin::estimate(frame, audio.sample_rate);

        records.push(PitchRecord {
            file: file.clone(),
            pitch: estimate.pitch,
            confidence: estimate.confidence,
        });

        start += HOP_SIZE;
    }

    log::debug!(
        "analyzed '{}': {} samples at {} Hz, {} frames",
        file,
        audio.samples.len(),
        audio.sample_rate,
        records.len()
    );

    Ok(records)
}
