use super::ElementSink;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("No audio input device found{0}")]
    NoDevice(String),

    #[error("Input device configuration failed: {0}")]
    Config(String),

    #[error("Unsupported audio sample format: {0:?}")]
    UnsupportedFormat(SampleFormat),

    #[error("Failed to build audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
}

/// Opens an input device and pushes its audio, downmixed to mono, into `sink`.
/// The returned stream is paused; playing it starts the element's audio.
pub fn open_input(
    device_name: Option<&str>,
    sink: ElementSink,
) -> Result<cpal::Stream, CaptureError> {
    let host = cpal::default_host();

    //
    // Log all available input devices for debugging.
    //
    log::info!("--- AVAILABLE INPUT DEVICES ---");
    if let Ok(devices) = host.input_devices() {
        for (i, dev) in devices.enumerate() {
            let name = dev.name().unwrap_or("Unknown".into());
            log::info!("  [{}]: {}", i, name);
        }
    }
    log::info!("-------------------------------");

    //
    // Select the requested input device, falling back to the default one.
    //
    let device = match device_name {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| CaptureError::Config(e.to_string()))?
            .find(|dev| dev.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| CaptureError::NoDevice(format!(" named '{}'", wanted)))?,
        None => host
            .default_input_device()
            .ok_or_else(|| CaptureError::NoDevice(String::new()))?,
    };

    log::info!(
        "Selected input device: {}",
        device.name().unwrap_or("Unknown".into())
    );

    let supported_config = device
        .default_input_config()
        .map_err(|e| CaptureError::Config(e.to_string()))?;

    let sample_format = supported_config.sample_format();
    let config: cpal::StreamConfig = supported_config.into();

    log::info!(
        "Input config: {:?} @ {}Hz, Channels: {}",
        sample_format,
        config.sample_rate.0,
        config.channels
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_input::<f32>(&device, &config, sink)?,
        SampleFormat::I16 => build_input::<i16>(&device, &config, sink)?,
        SampleFormat::U16 => build_input::<u16>(&device, &config, sink)?,
        other => return Err(CaptureError::UnsupportedFormat(other)),
    };

    if let Err(err) = stream.pause() {
        log::debug!("Input stream could not be paused at creation: {}", err);
    }

    Ok(stream)
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut sink: ElementSink,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let err_fn = |err| log::error!("Audio input error: {}", err);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            push_mono(&mut sink, data, channels);
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}

/// Downmixes interleaved frames to mono and pushes them; drops samples on overrun.
fn push_mono<T>(sink: &mut ElementSink, data: &[T], channels: usize)
where
    T: Sample,
    f32: FromSample<T>,
{
    match channels {
        0 => {}
        1 => {
            for &s in data {
                let _ = sink.push(f32::from_sample(s));
            }
        }
        //
        // Stereo is averaged; wider layouts keep the first channel.
        //
        2 => {
            for chunk in data.chunks_exact(2) {
                let mono = (f32::from_sample(chunk[0]) + f32::from_sample(chunk[1])) * 0.5;
                let _ = sink.push(mono);
            }
        }
        _ => {
            for chunk in data.chunks_exact(channels) {
                let _ = sink.push(f32::from_sample(chunk[0]));
            }
        }
    }
}
