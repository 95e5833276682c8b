//! Minimal transport standing in for the playback UI.

use crate::audio::{PlayableElement, VisualizerControl};
use cpal::traits::StreamTrait;

/// Volume applied to the element when the transport takes it over.
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Increment used by the volume keys.
pub const VOLUME_STEP: f32 = 0.1;

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("Cannot start playback: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("Cannot pause playback: {0}")]
    Pause(#[from] cpal::PauseStreamError),
}

/// Starts and stops whatever produces an element's audio.
pub trait Playback {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self) -> Result<(), PlaybackError>;
}

impl Playback for cpal::Stream {
    fn play(&mut self) -> Result<(), PlaybackError> {
        Ok(StreamTrait::play(self)?)
    }
    fn pause(&mut self) -> Result<(), PlaybackError> {
        Ok(StreamTrait::pause(self)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    Unbound,
    Connected,
    /// Wrapped by a failed attempt; the element must not be retried.
    Failed,
}

pub struct Transport {
    element: PlayableElement,
    playback: Option<Box<dyn Playback>>,
    binding: Binding,
    playing: bool,
}

impl Transport {
    pub fn new(element: PlayableElement, playback: Option<Box<dyn Playback>>) -> Self {
        element.set_volume(DEFAULT_VOLUME);
        Self {
            element,
            playback,
            binding: Binding::Unbound,
            playing: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn volume(&self) -> f32 {
        self.element.volume()
    }

    /// Sets the element volume; the analyser sees the scaled signal.
    pub fn set_volume(&mut self, volume: f32) {
        self.element.set_volume(volume);
        log::debug!("Volume set to {:.2}", self.element.volume());
    }

    /// Nudges the volume by `delta`, clamped to [0, 1].
    pub fn adjust_volume(&mut self, delta: f32) {
        self.set_volume(self.volume() + delta);
    }

    /// Toggles playback, connecting the element to the visualizer before the first play.
    pub fn toggle_play(&mut self, control: &dyn VisualizerControl) {
        if self.playing {
            if let Some(playback) = self.playback.as_mut() {
                if let Err(err) = playback.pause() {
                    log::error!("Error pausing audio: {}", err);
                }
            }
            self.playing = false;
            return;
        }

        if self.binding == Binding::Unbound {
            if control.connect_element(&self.element) {
                self.binding = Binding::Connected;
            } else if self.element.is_bound() {
                self.binding = Binding::Failed;
            }
        }

        match self.playback.as_mut() {
            Some(playback) => match playback.play() {
                Ok(()) => self.playing = true,
                Err(err) => log::error!("Error playing audio: {}", err),
            },
            None => log::warn!("No audio source available for '{}'", self.element.label()),
        }
    }
}
