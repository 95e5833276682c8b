//! Playable media elements and the source nodes that wrap them.

use super::GraphError;
use parking_lot::Mutex;
use ringbuf::{Consumer, HeapRb, Producer};
use std::cell::RefCell;
use std::sync::Arc;

/// Consumer half of an element's mono sample feed.
pub type SampleFeed = Consumer<f32, Arc<HeapRb<f32>>>;

/// Producer half handed to whatever generates the element's audio.
pub type ElementSink = Producer<f32, Arc<HeapRb<f32>>>;

/// Element volume shared with the source node reading its feed.
#[derive(Clone)]
struct Volume(Arc<Mutex<f32>>);

impl Volume {
    fn get(&self) -> f32 {
        *self.0.lock()
    }
}

/// A media element producing mono f32 samples.
///
/// The feed can be wrapped into the audio graph exactly once; after that the
/// element is permanently bound, whether or not the wiring succeeded.
pub struct PlayableElement {
    label: String,
    feed: RefCell<Option<SampleFeed>>,
    volume: Volume,
}

impl PlayableElement {
    pub fn new(label: impl Into<String>, capacity: usize) -> (Self, ElementSink) {
        let (producer, consumer) = HeapRb::<f32>::new(capacity.max(1)).split();
        let element = Self {
            label: label.into(),
            feed: RefCell::new(Some(consumer)),
            volume: Volume(Arc::new(Mutex::new(1.0))),
        };
        (element, producer)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// Sets the playback volume, clamped to [0, 1].
    ///
    /// Applies to everything downstream of the element, analyser included,
    /// and takes effect on the next pull even after the element is bound.
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        *self.volume.0.lock() = volume;
    }

    /// True once the feed has been taken by a source node.
    pub fn is_bound(&self) -> bool {
        self.feed.borrow().is_none()
    }

    fn take_feed(&self) -> Option<SampleFeed> {
        self.feed.borrow_mut().take()
    }
}

/// Graph node feeding an element's samples into the processing context.
pub struct SourceNode {
    label: String,
    feed: SampleFeed,
    volume: Volume,
}

impl SourceNode {
    /// Wraps `element`; fails if it is already bound to a graph.
    pub fn wrap(element: &PlayableElement) -> Result<Self, GraphError> {
        let feed = element
            .take_feed()
            .ok_or_else(|| GraphError::SourceBinding {
                element: element.label().to_string(),
                reason: "element is already bound to an audio graph".into(),
            })?;

        Ok(Self {
            label: element.label().to_string(),
            feed,
            volume: element.volume.clone(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fills `out` with the next samples scaled by the element volume,
    /// padding with silence on underrun. Returns the number of real samples
    /// delivered.
    pub fn pull(&mut self, out: &mut [f32]) -> usize {
        let n = self.feed.pop_slice(out);
        out[n..].fill(0.0);

        let volume = self.volume.get();
        if volume != 1.0 {
            out[..n].iter_mut().for_each(|s| *s *= volume);
        }
        n
    }
}
