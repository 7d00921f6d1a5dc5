use crate::alphabet::AudioClip;
use crate::error::{DtmfPipeError, Result};
use crate::sink::AudioSink;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use log::{debug, error};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct PlaybackCursor {
    position: usize,
    finished: bool,
}

/// Copies the next slice of `samples` into `data`, padding with silence.
///
/// The clip only counts as finished on the first callback that starts past
/// its end, so the buffer carrying its last samples has already been
/// consumed by the device when the stream is dropped.
fn fill_buffer(cursor: &mut PlaybackCursor, samples: &[f32], volume: f32, data: &mut [f32]) {
    if cursor.position >= samples.len() {
        data.fill(0.0);
        cursor.finished = true;
        return;
    }

    for sample in data.iter_mut() {
        *sample = match samples.get(cursor.position) {
            Some(&s) => {
                cursor.position += 1;
                s * volume
            }
            None => 0.0,
        };
    }
}

/// One open output stream bound to a single clip.
pub struct CpalPlayback {
    _stream: Stream,
    cursor: Arc<Mutex<PlaybackCursor>>,
}

pub struct CpalSink {
    device: Device,
}

impl CpalSink {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| DtmfPipeError::AudioDevice("No output device found".into()))?;

        if let Ok(name) = device.name() {
            debug!("Using output device {}", name);
        }

        Ok(Self { device })
    }
}

impl AudioSink for CpalSink {
    type Handle = CpalPlayback;

    fn play(&mut self, clip: Arc<AudioClip>, volume: f32) -> Result<CpalPlayback> {
        let config = StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(clip.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let cursor = Arc::new(Mutex::new(PlaybackCursor::default()));
        let cursor_clone = Arc::clone(&cursor);

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut cursor) = cursor_clone.lock() else {
                        data.fill(0.0);
                        return;
                    };
                    fill_buffer(&mut cursor, &clip.samples, volume, data);
                },
                |err| error!("Audio output error: {}", err),
                None,
            )
            .map_err(|e| DtmfPipeError::AudioDevice(e.to_string()))?;

        stream
            .play()
            .map_err(|e| DtmfPipeError::AudioDevice(e.to_string()))?;

        Ok(CpalPlayback {
            _stream: stream,
            cursor,
        })
    }

    fn is_finished(&self, handle: &CpalPlayback) -> bool {
        // a poisoned cursor can never advance again
        handle.cursor.lock().map(|c| c.finished).unwrap_or(true)
    }

    fn close(&mut self, handle: CpalPlayback) {
        drop(handle);
    }
}

pub fn list_audio_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let Ok(name) = device.name() {
                devices.push(format!("Output: {}", name));
            }
        }
    }

    devices
}
