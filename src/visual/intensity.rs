//! Reduction of a frequency snapshot to a single audio intensity.

use crate::audio::AnalyserSource;

pub const BASS_BINS: usize = 50;
pub const MID_BINS: usize = 100;

pub const BASS_WEIGHT: f32 = 0.5;
pub const MID_WEIGHT: f32 = 0.3;
pub const TREBLE_WEIGHT: f32 = 0.2;

/// Mean of `bins` over a band of `width`, normalised to `[0, 1]`.
fn band_level(bins: &[u8], width: usize) -> f32 {
    if width == 0 {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f32 / width as f32 / 255.0
}

/// Weighted bass/mid/treble energy of `snapshot`, in `[0, 1]`.
///
/// Returns 0 when there is no snapshot or the visualizer is inactive.
pub fn audio_intensity(snapshot: Option<&[u8]>, active: bool) -> f32 {
    let Some(bins) = snapshot.filter(|_| active) else {
        return 0.0;
    };

    let len = bins.len();
    let mid_start = BASS_BINS.min(len);
    let treble_start = (BASS_BINS + MID_BINS).min(len);

    let bass = band_level(&bins[..mid_start], BASS_BINS);
    let mid = band_level(&bins[mid_start..treble_start], MID_BINS);
    let treble = band_level(&bins[treble_start..], len.saturating_sub(BASS_BINS + MID_BINS));

    bass * BASS_WEIGHT + mid * MID_WEIGHT + treble * TREBLE_WEIGHT
}

/// Pulls one intensity sample per frame, reusing its snapshot buffer.
#[derive(Default)]
pub struct IntensitySampler {
    snapshot: Vec<u8>,
}

impl IntensitySampler {
    pub fn sample(&mut self, source: &dyn AnalyserSource) -> f32 {
        if !source.is_active() {
            return 0.0;
        }
        let Some(handle) = source.analyser_handle() else {
            return 0.0;
        };
        let Some(bins) = handle.frequency_bin_count() else {
            return 0.0;
        };

        self.snapshot.resize(bins, 0);
        if !handle.sample(&mut self.snapshot) {
            return 0.0;
        }
        audio_intensity(Some(&self.snapshot), true)
    }
}
