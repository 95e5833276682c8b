//! Frequency analyser node.
//!
//! Mirrors the platform analyser: Blackman window, forward FFT, temporal
//! smoothing, and a decibel range mapped onto unsigned bytes.

use super::GraphError;
use crate::fft::{find_dft, DFTBase};
use num_complex::Complex32;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Tunables fixed at analyser creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyserOptions {
    pub fft_size: usize,
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub smoothing_time_constant: f32,
}

impl Default for AnalyserOptions {
    fn default() -> Self {
        Self {
            fft_size: 512,
            min_decibels: -100.0,
            max_decibels: -30.0,
            smoothing_time_constant: 0.8,
        }
    }
}

/// Time-domain input of an analyser, written from the audio thread.
#[derive(Clone)]
pub struct AnalyserInput {
    samples: Arc<Mutex<VecDeque<f32>>>,
}

impl AnalyserInput {
    fn new(size: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::from(vec![0.0; size]))),
        }
    }

    /// Appends samples, keeping only the most recent window.
    pub fn write(&self, data: &[f32]) {
        let mut samples = self.samples.lock();
        let size = samples.len();

        let data = &data[data.len().saturating_sub(size)..];
        samples.drain(..data.len());
        samples.extend(data.iter().copied());
    }
}

struct AnalysisState {
    block: Vec<Complex32>,
    smoothed: Vec<f32>,
}

pub struct AnalyserNode {
    options: AnalyserOptions,
    window: Vec<f32>,
    plan: Arc<dyn DFTBase>,
    input: AnalyserInput,
    state: RefCell<AnalysisState>,
}

impl AnalyserNode {
    pub fn new(options: AnalyserOptions) -> Result<Self, GraphError> {
        let n = options.fft_size;
        let planned = if (32..=32768).contains(&n) { find_dft(n) } else { None };
        let plan = planned.ok_or_else(|| {
            GraphError::GraphConstruction(format!(
                "analyser fft size {} is not a power of two in 32..=32768",
                n
            ))
        })?;

        //
        // Blackman window (alpha = 0.16).
        //
        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();

        Ok(Self {
            options,
            window,
            plan,
            input: AnalyserInput::new(n),
            state: RefCell::new(AnalysisState {
                block: vec![Complex32::default(); n],
                smoothed: vec![0.0; n / 2],
            }),
        })
    }

    pub fn fft_size(&self) -> usize {
        self.options.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.options.fft_size / 2
    }

    /// Handle used by the audio thread to feed samples in.
    pub fn input(&self) -> AnalyserInput {
        self.input.clone()
    }

    /// Writes the current byte-scaled magnitude spectrum into `out`.
    pub fn get_byte_frequency_data(&self, out: &mut [u8]) {
        let mut state = self.state.borrow_mut();
        let AnalysisState { block, smoothed } = &mut *state;

        //
        // Apply window to the latest time-domain block.
        //
        {
            let samples = self.input.samples.lock();
            for ((slot, &x), &w) in block.iter_mut().zip(samples.iter()).zip(&self.window) {
                *slot = Complex32::new(x * w, 0.0);
            }
        }

        self.plan.xform_inplace(block);

        //
        // Smooth magnitudes over time, then map the decibel range onto bytes.
        //
        let n = self.options.fft_size as f32;
        let tau = self.options.smoothing_time_constant;
        let min_db = self.options.min_decibels;
        let range = self.options.max_decibels - min_db;

        for (k, level) in smoothed.iter_mut().enumerate() {
            let mag = block[k].norm() / n;
            *level = tau * *level + (1.0 - tau) * mag;
            if !level.is_finite() {
                *level = 0.0;
            }
        }

        for (byte, &level) in out.iter_mut().zip(smoothed.iter()) {
            let db = 20.0 * level.log10();
            let scaled = 255.0 * (db - min_db) / range;
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Read-only sampling handle given to the render surface.
///
/// Holds a weak reference; the graph manager remains the only owner.
#[derive(Clone)]
pub struct AnalyserHandle(Weak<AnalyserNode>);

impl AnalyserHandle {
    pub fn new(node: &Rc<AnalyserNode>) -> Self {
        Self(Rc::downgrade(node))
    }

    pub fn frequency_bin_count(&self) -> Option<usize> {
        self.0.upgrade().map(|node| node.frequency_bin_count())
    }

    /// Samples into `out`; false if the analyser no longer exists.
    pub fn sample(&self, out: &mut [u8]) -> bool {
        match self.0.upgrade() {
            Some(node) => {
                node.get_byte_frequency_data(out);
                true
            }
            None => false,
        }
    }
}
