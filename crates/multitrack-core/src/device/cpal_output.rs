//! CPAL output device.

use super::{AudioDevice, StreamFormat};
use crate::render::RenderCallback;
use crate::{EngineConfig, Error, Result, CHANNELS};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Minimum ring size, in samples, so a large host period can still be filled.
const MIN_RING_SAMPLES: usize = 16384;

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. This is safe because
/// the device is only reached through the render engine's `Mutex`.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for StreamHandle {}

/// System audio output through CPAL.
///
/// Rendered buffers go into a lock-free ring; the CPAL callback drains it
/// and asks the engine for more whenever it runs short.
pub struct CpalDevice {
    device_index: Option<usize>,
    capacity: usize,
    producer: HeapProd<i16>,
    consumer: Option<HeapCons<i16>>,
    stream: Option<StreamHandle>,
}

impl CpalDevice {
    /// Open the output device at `device_index`, or the default when `None`.
    pub fn new(device_index: Option<usize>, config: &EngineConfig) -> Result<Self> {
        get_device(device_index)?;
        let capacity = (config.samples_per_buffer() * config.buffer_count).max(MIN_RING_SAMPLES);
        let (producer, consumer) = HeapRb::<i16>::new(capacity).split();
        Ok(Self {
            device_index,
            capacity,
            producer,
            consumer: Some(consumer),
            stream: None,
        })
    }

    /// Native sample rate of the device.
    pub fn default_sample_rate(device_index: Option<usize>) -> Result<u32> {
        Ok(get_device(device_index)?
            .default_output_config()?
            .sample_rate()
            .0)
    }

    pub fn list_devices() -> Result<Vec<String>> {
        cpal::default_host()
            .output_devices()?
            .enumerate()
            .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
            .collect()
    }
}

impl AudioDevice for CpalDevice {
    fn name(&self) -> String {
        get_device(self.device_index)
            .and_then(|device| Ok(device.name()?))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    fn play(&mut self, format: StreamFormat, callback: RenderCallback) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let consumer = self
            .consumer
            .take()
            .ok_or_else(|| Error::Device("output ring already attached".into()))?;

        let device = get_device(self.device_index)?;
        let supported = device.default_output_config()?;
        let config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer, callback)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer, callback)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer, callback)?,
            other => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {other:?}"
                )));
            }
        };

        stream.play()?;
        self.stream = Some(StreamHandle(stream));
        Ok(())
    }

    fn enqueue(&mut self, samples: &[i16]) -> Result<()> {
        if self.producer.vacant_len() < samples.len() {
            return Err(Error::QueueFull);
        }
        self.producer.push_slice(samples);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        // Dropping the stream stops it; the old consumer goes with it.
        self.stream = None;
        let (producer, consumer) = HeapRb::<i16>::new(self.capacity).split();
        self.producer = producer;
        self.consumer = Some(consumer);
        Ok(())
    }
}

fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::DeviceUnavailable(format!(
                    "Device index {i} out of range ({count} available)"
                ))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::DeviceUnavailable("No output device available".into())),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<i16>,
    callback: RenderCallback,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let needed = (data.len() / channels) * CHANNELS;
                while consumer.occupied_len() < needed {
                    if !callback.tick() {
                        break;
                    }
                }
                write_output(data, channels, &mut consumer);
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        |_err| {},
        None,
    )?;

    Ok(stream)
}

/// Pop stereo frames from the ring into the device layout. Underruns play silence.
#[inline]
fn write_output<T: cpal::SizedSample + cpal::FromSample<i16>>(
    data: &mut [T],
    channels: usize,
    consumer: &mut HeapCons<i16>,
) {
    for frame in data.chunks_mut(channels) {
        let left = consumer.try_pop().unwrap_or(0);
        let right = consumer.try_pop().unwrap_or(0);
        for (ch, sample) in frame.iter_mut().enumerate() {
            let value = match ch {
                0 => left,
                1 => right,
                _ => 0,
            };
            *sample = T::from_sample(value);
        }
    }
}

#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<i16>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0i16);
    }
}
