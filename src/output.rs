//! Platform audio binding: drives a [`RenderSource`] from the host output
//! device callback via cpal.
//!
//! This is the external collaborator side of the render contract; the bridge
//! itself never talks to a device.

use crate::render::RenderSource;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use dasp_sample::FromSample;
use tracing::{error, info};

/// The sample rate the default output device runs at, which becomes the
/// session's native rate.
pub fn default_output_rate() -> Result<f64> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no output device available")?;
    let config = device
        .default_output_config()
        .context("failed to query default output config")?;
    Ok(config.sample_rate().0 as f64)
}

/// An open output stream pulling from a [`RenderSource`].
pub struct AudioOutput {
    _stream: Stream,
}

impl AudioOutput {
    pub fn start<S>(source: S) -> Result<Self>
    where
        S: RenderSource + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no output device available")?;
        info!(
            "using output device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let config = device
            .default_output_config()
            .context("failed to query default output config")?;
        info!("output config: {:?}", config);

        let stream_config = StreamConfig {
            channels: config.channels().min(2), // limit to stereo
            sample_rate: config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match config.sample_format() {
            SampleFormat::I16 => Self::build_output_stream::<i16, S>(&device, &stream_config, source)?,
            SampleFormat::U16 => Self::build_output_stream::<u16, S>(&device, &stream_config, source)?,
            SampleFormat::F32 => Self::build_output_stream::<f32, S>(&device, &stream_config, source)?,
            format => anyhow::bail!("unsupported sample format: {format:?}"),
        };

        stream.play().context("failed to start output stream")?;
        info!("audio output started");

        Ok(Self { _stream: stream })
    }

    fn build_output_stream<T, S>(
        device: &Device,
        config: &StreamConfig,
        mut source: S,
    ) -> Result<Stream>
    where
        T: cpal::SizedSample + FromSample<f32>,
        S: RenderSource + 'static,
    {
        let channels = config.channels as usize;
        let mut left: Vec<f32> = Vec::new();
        let mut right: Vec<f32> = Vec::new();

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels;
                    // Scratch buffers only ever resize when the device
                    // changes its callback size.
                    if left.len() != frames {
                        left.resize(frames, 0.0);
                        right.resize(frames, 0.0);
                    }

                    source.produce(&mut left, &mut right);

                    for (i, frame) in data.chunks_exact_mut(channels).enumerate() {
                        frame[0] = T::from_sample(left[i]);
                        if channels > 1 {
                            frame[1] = T::from_sample(right[i]);
                        }
                    }
                },
                move |err| {
                    error!("audio output error: {err}");
                },
                None,
            )
            .context("failed to build output stream")?;

        Ok(stream)
    }
}
