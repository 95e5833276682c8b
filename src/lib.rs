//! Audio-reactive particle field.
//!
//! A single process-wide audio graph feeds a frequency analyser; every display
//! frame the render surface reduces the latest spectrum to one intensity and
//! lets it drive particle motion, size, opacity and connectivity.

pub mod audio;
pub mod config;
pub mod fft;
pub mod gui;
pub mod player;
pub mod visual;
