//! YIN fundamental frequency estimation.
//!
//! Straight implementation of the difference function, cumulative
//! mean normalization, absolute thresholding and parabolic
//! interpolation steps from de Cheveigne and Kawahara's paper.

pub(crate) const FRAME_SIZE: usize = 4096;
pub(crate) const HOP_SIZE: usize = 512;

/// Absolute threshold on the normalized difference function below
/// which a lag candidate is accepted as periodic.
const TOLERANCE: f32 = 0.8;

pub(crate) struct PitchEstimate {
    pub pitch: f32,
    pub confidence: f32,
}

/// Estimates the fundamental frequency of one frame of mono samples.
///
/// Returns a pitch of 0.0 with the according confidence when the
/// frame is judged unvoiced.
pub(crate) fn estimate(frame: &[f32], sample_rate: u32) -> PitchEstimate {
    let half = frame.len() / 2;
    if half < 2 {
        return PitchEstimate {
            pitch: 0.0,
            confidence: 0.0,
        };
    }

    // Difference function d(tau) over the first half of the frame.
    let mut diff = vec![0.0_f32; half];
    for (tau, d) in diff.iter_mut().enumerate().skip(1) {
        for j in 0..half {
            let delta = frame[j] - frame[j + tau];
            *d += delta * delta;
        }
    }

    // Cumulative mean normalized difference d'(tau).
    let mut cmndf = vec![1.0_f32; half];
    let mut running_sum = 0.0_f32;
    for tau in 1..half {
        running_sum += diff[tau];
        cmndf[tau] = if running_sum > 0.0 {
            diff[tau] * tau as f32 / running_sum
        } else {
            // Dead silence; keep the frame unvoiced.
            1.0
        };
    }

    // Absolute threshold: take the first dip below the tolerance
    // and walk down to the bottom of that dip.
    let mut tau = 2;
    let best_tau = loop {
        if tau >= half {
            break None;
        }

        if cmndf[tau] < TOLERANCE {
            while tau + 1 < half && cmndf[tau + 1] < cmndf[tau] {
                tau += 1;
            }
            break Some(tau);
        }

        tau += 1;
    };

    let Some(tau) = best_tau else {
        // No candidate under the threshold; report the global
        // minimum as (lack of) confidence.
        let min = cmndf[2..]
            .iter()
            .fold(1.0_f32, |acc, &v| if v < acc { v } else { acc });

        return PitchEstimate {
            pitch: 0.0,
            confidence: (1.0 - min).clamp(0.0, 1.0),
        };
    };

    let refined = parabolic_interpolation(&cmndf, tau);
    PitchEstimate {
        pitch: sample_rate as f32 / refined,
        confidence: (1.0 - cmndf[tau]).clamp(0.0, 1.0),
    }
}

/// Refines an integer lag by fitting a parabola through its
/// neighborhood in the normalized difference function.
fn parabolic_interpolation(cmndf: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= cmndf.len() {
        return tau as f32;
    }

    let (left, center, right) = (cmndf[tau - 1], cmndf[tau], cmndf[tau + 1]);
    let denominator = 2.0 * (left - 2.0 * center + right);
    if denominator.abs() < f32::EPSILON {
        return tau as f32;
    }

    tau as f32 + (left - right) / denominator
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use super::*;

    const SAMPLE_RATE: u32 = 44_100;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    #[test]
    fn detects_a440() {
        let frame = sine(440.0, FRAME_SIZE);
        let estimate = estimate(&frame, SAMPLE_RATE);

        assert!(
            (estimate.pitch - 440.0).abs() < 5.0,
            "estimated {} Hz",
            estimate.pitch
        );
        assert!(estimate.confidence > 0.8);
    }

    #[test]
    fn detects_a_low_voice() {
        let frame = sine(110.0, FRAME_SIZE);
        let estimate = estimate(&frame, SAMPLE_RATE);

        assert!(
            (estimate.pitch - 110.0).abs() < 2.0,
            "estimated {} Hz",
            estimate.pitch
        );
    }

    #[test]
    fn silence_is_unvoiced() {
        let frame = vec![0.0; FRAME_SIZE];
        let estimate = estimate(&frame, SAMPLE_RATE);

        assert_eq!(estimate.pitch, 0.0);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn tiny_frame_is_unvoiced() {
        let estimate = estimate(&[0.5, -0.5], SAMPLE_RATE);
        assert_eq!(estimate.pitch, 0.0);
    }
}
