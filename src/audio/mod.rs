//! Audio graph manager.
//!
//! Owns the processing context and analyser for the lifetime of the process
//! and permits at most one source connection.

pub mod analyser;
pub mod capture;
pub mod device;
pub mod element;

pub use analyser::{AnalyserHandle, AnalyserInput, AnalyserNode, AnalyserOptions};
pub use element::{ElementSink, PlayableElement, SampleFeed, SourceNode};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    /// The platform refused to create the processing context or analyser.
    #[error("Audio graph construction failed: {0}")]
    GraphConstruction(String),

    /// The element could not be wrapped into a source node.
    #[error("Cannot bind element '{element}': {reason}")]
    SourceBinding { element: String, reason: String },

    #[error("Detaching source failed: {0}")]
    Detach(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
}

/// Live audio routing graph container.
pub trait ProcessingContext {
    fn state(&self) -> ContextState;

    /// Fire-and-forget resumption; failures are logged by the implementation.
    fn resume(&mut self);

    fn sample_rate(&self) -> u32;

    /// Wires source → analyser → destination.
    fn connect_source(&mut self, source: SourceNode, analyser: AnalyserInput)
        -> Result<(), GraphError>;

    fn disconnect_source(&mut self) -> Result<(), GraphError>;
}

/// Capability check yielding a working processing context or a failure.
pub trait AudioPlatform {
    fn create_context(&self) -> Result<Box<dyn ProcessingContext>, GraphError>;
}

/// Interface exposed to the playback UI and the activity indicator.
pub trait VisualizerControl {
    fn connect_element(&self, element: &PlayableElement) -> bool;
    fn disconnect(&self);
    fn is_active(&self) -> bool;
}

/// Interface exposed to the render surface.
pub trait AnalyserSource {
    fn analyser_handle(&self) -> Option<AnalyserHandle>;
    fn is_active(&self) -> bool;
}

/// Marks the single permitted source connection.
#[derive(Clone, Debug)]
struct SourceHandle {
    element: String,
}

#[derive(Default)]
struct GraphState {
    context: Option<Box<dyn ProcessingContext>>,
    analyser: Option<Rc<AnalyserNode>>,
    source: Option<SourceHandle>,
}

impl GraphState {
    fn resume_if_suspended(context: &mut dyn ProcessingContext) {
        if context.state() == ContextState::Suspended {
            log::debug!("Resuming suspended audio context");
            context.resume();
        }
    }

    fn build_connection(
        &mut self,
        platform: &dyn AudioPlatform,
        options: AnalyserOptions,
        element: &PlayableElement,
    ) -> Result<SourceHandle, GraphError> {
        //
        // Lazily create the processing context; it is never recreated.
        //
        let context = match self.context.take() {
            Some(context) => context,
            None => {
                let context = platform.create_context()?;
                log::info!("Audio context created @ {}Hz", context.sample_rate());
                context
            }
        };
        let context = self.context.insert(context);
        Self::resume_if_suspended(context.as_mut());

        //
        // Lazily create the analyser with its fixed spectral resolution.
        //
        let analyser = match &self.analyser {
            Some(analyser) => Rc::clone(analyser),
            None => {
                let analyser = Rc::new(AnalyserNode::new(options)?);
                log::info!(
                    "Analyser created (fft size {}, {} bins)",
                    analyser.fft_size(),
                    analyser.frequency_bin_count()
                );
                self.analyser = Some(Rc::clone(&analyser));
                analyser
            }
        };

        //
        // Wrap the element and wire it through the analyser to the destination.
        //
        let source = SourceNode::wrap(element)?;
        context.connect_source(source, analyser.input())?;

        Ok(SourceHandle {
            element: element.label().to_string(),
        })
    }
}

/// Process-wide audio graph shared by every consumer on the UI thread.
pub struct AudioGraph {
    platform: Box<dyn AudioPlatform>,
    options: AnalyserOptions,
    state: RefCell<GraphState>,
    active: Cell<bool>,
}

impl AudioGraph {
    pub fn new(platform: Box<dyn AudioPlatform>, options: AnalyserOptions) -> Self {
        Self {
            platform,
            options,
            state: RefCell::new(GraphState::default()),
            active: Cell::new(false),
        }
    }

    /// Connects `element` once; later calls only resume the context.
    ///
    /// Returns false (leaving the connection state untouched) when the graph
    /// cannot be built or the element cannot be wrapped.
    pub fn connect_element(&self, element: &PlayableElement) -> bool {
        let mut state = self.state.borrow_mut();

        if let Some(source) = &state.source {
            log::debug!("Source '{}' already connected", source.element);
            if let Some(context) = state.context.as_mut() {
                GraphState::resume_if_suspended(context.as_mut());
            }
            return true;
        }

        match state.build_connection(self.platform.as_ref(), self.options, element) {
            Ok(source) => {
                log::info!("Connected audio element '{}'", source.element);
                state.source = Some(source);
                self.active.set(true);
                true
            }
            Err(err) => {
                log::error!("Error connecting audio element: {}", err);
                false
            }
        }
    }

    /// Detaches the source (best effort) and clears the activity flag.
    pub fn disconnect(&self) {
        let mut state = self.state.borrow_mut();

        if state.source.is_some() {
            if let Some(context) = state.context.as_mut() {
                if let Err(err) = context.disconnect_source() {
                    log::warn!("Error disconnecting audio: {}", err);
                }
            }
        }

        if self.active.replace(false) {
            log::info!("Audio visualizer deactivated");
        }
    }

    pub fn analyser_handle(&self) -> Option<AnalyserHandle> {
        self.state.borrow().analyser.as_ref().map(AnalyserHandle::new)
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.state.borrow().context.as_ref().map(|c| c.state())
    }
}

impl VisualizerControl for AudioGraph {
    fn connect_element(&self, element: &PlayableElement) -> bool {
        AudioGraph::connect_element(self, element)
    }
    fn disconnect(&self) {
        AudioGraph::disconnect(self)
    }
    fn is_active(&self) -> bool {
        AudioGraph::is_active(self)
    }
}

impl AnalyserSource for AudioGraph {
    fn analyser_handle(&self) -> Option<AnalyserHandle> {
        AudioGraph::analyser_handle(self)
    }
    fn is_active(&self) -> bool {
        AudioGraph::is_active(self)
    }
}
