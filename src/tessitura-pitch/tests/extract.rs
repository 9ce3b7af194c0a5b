use std::{f32::consts::TAU, fs::File, io::Write, path::Path};

use tessitura_pitch::extract_pitches;

const SAMPLE_RATE: u32 = 44_100;

/// Writes a minimal 16-bit PCM mono WAV file with a sine tone.
fn write_sine_wav(path: &Path, freq: f32, seconds: f32) {
    let frames = (SAMPLE_RATE as f32 * seconds) as u32;
    let data_len = frames * 2;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16_u32.to_le_bytes());
    out.extend_from_slice(&1_u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1_u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    out.extend_from_slice(&2_u16.to_le_bytes());
    out.extend_from_slice(&16_u16.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for i in 0..frames {
        let sample = (TAU * freq * i as f32 / SAMPLE_RATE as f32).sin();
        out.extend_from_slice(&((sample * 0.8 * i16::MAX as f32) as i16).to_le_bytes());
    }

    File::create(path).unwrap().write_all(&out).unwrap();
}

#[test]
fn extracts_pitch_from_a_wav_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a440.wav");
    write_sine_wav(&path, 440.0, 0.5);

    let records = extract_pitches(&path).unwrap();

    // 0.5s at 44.1kHz gives (22050 - 4096) / 512 + 1 full frames.
    assert_eq!(records.len(), 36);
    for record in &records {
        assert_eq!(record.file, path.display().to_string());
        assert!(
            (record.pitch - 440.0).abs() < 5.0,
            "estimated {} Hz",
            record.pitch
        );
        assert!(record.confidence > 0.5);
    }
}

#[test]
fn short_file_produces_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blip.wav");
    write_sine_wav(&path, 440.0, 0.01);

    let records = extract_pitches(&path).unwrap();
    assert!(records.is_empty());
}

#[test]
fn unreadable_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.wav");

    assert!(extract_pitches(&path).is_err());
}

#[test]
fn garbage_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.wav");
    File::create(&path)
        .unwrap()
        .write_all(b"definitely not audio")
        .unwrap();

    assert!(extract_pitches(&path).is_err());
}
