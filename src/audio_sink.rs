/*! Play float samples on the default audio output.

Uses cpal. The audio callback runs on its own realtime-ish thread, fed
through a bounded channel. The sink block does a blocking send per
sample, so the audio device paces the whole pipeline when the source
outruns it.
*/
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use crate::block::{Block, BlockRet};
use crate::stream::Streamp;
use crate::{Error, Float, Result};

struct CpalOutput {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl CpalOutput {
    fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Device("no audio output device".into()))?;
        debug!(
            "audio output device: {}",
            device.name().unwrap_or_else(|_| "unknown".into())
        );
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        Ok(Self { device, config })
    }

    fn start(&self) -> Result<(SyncSender<f32>, cpal::Stream)> {
        // Three seconds of buffer between pipeline and callback.
        let (sender, receiver): (SyncSender<f32>, Receiver<f32>) =
            sync_channel(3 * self.config.sample_rate.0 as usize);
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for out in data.iter_mut() {
                        // Underrun plays silence.
                        *out = receiver.try_recv().unwrap_or(0.0);
                    }
                },
                |err| error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| Error::Device(format!("failed to build audio stream: {e}")))?;
        stream
            .play()
            .map_err(|e| Error::Device(format!("failed to start audio stream: {e}")))?;
        Ok((sender, stream))
    }
}

/// Audio sink block.
pub struct AudioSink {
    src: Streamp<Float>,
    sender: SyncSender<f32>,
    // Dropping the cpal stream stops playback, so keep it alive for
    // the life of the block.
    _stream: cpal::Stream,
}

impl AudioSink {
    /// Open the default output device at the given sample rate.
    pub fn new(src: Streamp<Float>, sample_rate: u32) -> Result<Self> {
        let output = CpalOutput::new(sample_rate)?;
        let (sender, stream) = output.start()?;
        Ok(Self {
            src,
            sender,
            _stream: stream,
        })
    }
}

impl Block for AudioSink {
    fn block_name(&self) -> &'static str {
        "AudioSink"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        for sample in input {
            self.sender
                .send(sample)
                .map_err(|_| Error::Device("audio output thread gone".into()))?;
        }
        Ok(BlockRet::Again)
    }
}
/* vim: textwidth=80
 */
