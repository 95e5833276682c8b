//! Processing context backed by a cpal output stream.

use super::{
    AnalyserInput, AudioPlatform, ContextState, GraphError, ProcessingContext, SourceNode,
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source and analyser tap currently wired to the destination.
struct Route {
    source: SourceNode,
    tap: AnalyserInput,
    scratch: Vec<f32>,
}

/// Opens the default (or named) output device as the graph destination.
pub struct CpalPlatform {
    device_name: Option<String>,
    monitor_gain: f32,
}

impl CpalPlatform {
    pub fn new(device_name: Option<String>, monitor_gain: f32) -> Self {
        Self {
            device_name,
            monitor_gain,
        }
    }

    fn select_device(&self, host: &cpal::Host) -> Result<cpal::Device, GraphError> {
        let device = match &self.device_name {
            Some(wanted) => host
                .output_devices()
                .map_err(|e| GraphError::GraphConstruction(e.to_string()))?
                .find(|dev| dev.name().map(|n| n == *wanted).unwrap_or(false)),
            None => host.default_output_device(),
        };

        device.ok_or_else(|| {
            GraphError::GraphConstruction(match &self.device_name {
                Some(name) => format!("output device '{}' not found", name),
                None => "no audio output device found".into(),
            })
        })
    }
}

impl AudioPlatform for CpalPlatform {
    fn create_context(&self) -> Result<Box<dyn ProcessingContext>, GraphError> {
        let host = cpal::default_host();
        let device = self.select_device(&host)?;

        log::info!(
            "Selected output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".into())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| GraphError::GraphConstruction(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        let config: cpal::StreamConfig = supported_config.into();

        log::info!(
            "Output config: {:?} @ {}Hz, Channels: {}",
            sample_format,
            config.sample_rate.0,
            config.channels
        );

        let route = Arc::new(Mutex::new(None));
        let gain = self.monitor_gain;

        let stream = match sample_format {
            SampleFormat::F32 => build_output::<f32>(&device, &config, Arc::clone(&route), gain),
            SampleFormat::I16 => build_output::<i16>(&device, &config, Arc::clone(&route), gain),
            SampleFormat::U16 => build_output::<u16>(&device, &config, Arc::clone(&route), gain),
            other => {
                return Err(GraphError::GraphConstruction(format!(
                    "unsupported output sample format: {:?}",
                    other
                )))
            }
        }?;

        //
        // Contexts start suspended until the first resume.
        //
        if let Err(err) = stream.pause() {
            log::debug!("Output stream could not be paused at creation: {}", err);
        }

        Ok(Box::new(CpalContext {
            stream,
            route,
            state: ContextState::Suspended,
            sample_rate: config.sample_rate.0,
        }))
    }
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    route: Arc<Mutex<Option<Route>>>,
    gain: f32,
) -> Result<cpal::Stream, GraphError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let err_fn = |err| log::error!("Audio output error: {}", err);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut route = route.lock();

                let Some(Route {
                    source,
                    tap,
                    scratch,
                }) = route.as_mut()
                else {
                    data.fill(T::EQUILIBRIUM);
                    return;
                };

                //
                // Pull one mono frame per output frame, feed the analyser, and fan out.
                //
                scratch.resize(data.len() / channels.max(1), 0.0);
                source.pull(scratch);
                tap.write(scratch);

                for (frame, &mono) in data.chunks_exact_mut(channels.max(1)).zip(scratch.iter()) {
                    frame.fill(T::from_sample(mono * gain));
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| GraphError::GraphConstruction(e.to_string()))
}

pub struct CpalContext {
    stream: cpal::Stream,
    route: Arc<Mutex<Option<Route>>>,
    state: ContextState,
    sample_rate: u32,
}

impl ProcessingContext for CpalContext {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) {
        match self.stream.play() {
            Ok(()) => self.state = ContextState::Running,
            Err(err) => log::error!("Failed to resume audio context: {}", err),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn connect_source(
        &mut self,
        source: SourceNode,
        analyser: AnalyserInput,
    ) -> Result<(), GraphError> {
        attach(&self.route, source, analyser)
    }

    fn disconnect_source(&mut self) -> Result<(), GraphError> {
        detach(&self.route)
    }
}

fn attach(
    route: &Mutex<Option<Route>>,
    source: SourceNode,
    tap: AnalyserInput,
) -> Result<(), GraphError> {
    let mut route = route.lock();
    if let Some(existing) = route.as_ref() {
        return Err(GraphError::SourceBinding {
            element: source.label().to_string(),
            reason: format!("context already routes '{}'", existing.source.label()),
        });
    }

    *route = Some(Route {
        source,
        tap,
        scratch: Vec::new(),
    });
    Ok(())
}

fn detach(route: &Mutex<Option<Route>>) -> Result<(), GraphError> {
    match route.lock().take() {
        Some(route) => {
            log::debug!("Detached source '{}'", route.source.label());
            Ok(())
        }
        None => Err(GraphError::Detach("no source is connected".into())),
    }
}
