// Audio sources - delivers mono 16 kHz i16 PCM from a WAV file or a live
// capture device, behind a single `AudioSource` trait so the pipeline never
// branches on which one it has.
//
// `LiveCaptureSource`'s device setup and mono downmixing follows the
// `AudioCapture`/`build_input_stream` shape of a `cpal`-based voice capture
// client, swapping its f32-ring-buffer-for-transcription form for an i16
// queue the pipeline reads from directly. `WavFileSource` is grounded on the
// strict-format contract AudioId's decoder setup assumes.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use tracing::info;

use crate::error::AudioIdError;

pub trait AudioSource {
    fn sample_rate(&self) -> u32;

    /// Fill `buf` with as many samples as are currently available (up to
    /// `buf.len()`), returning the count actually written. `0` means EOF in
    /// file mode, or simply "nothing captured yet" in live mode.
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, AudioIdError>;
}

/// Reads mono 16-bit PCM from a WAV file, failing fast on any other format
/// rather than silently resampling or channel-mixing.
pub struct WavFileSource {
    reader: hound::WavReader<std::io::BufReader<std::fs::File>>,
}

impl WavFileSource {
    pub fn open(path: &Path, expected_sample_rate: u32) -> Result<Self, AudioIdError> {
        let reader = hound::WavReader::open(path).map_err(|e| AudioIdError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

        let spec = reader.spec();
        if spec.channels != 1 {
            return Err(AudioIdError::ConfigMismatch {
                expected: 1,
                found: spec.channels as usize,
            });
        }
        if spec.sample_rate != expected_sample_rate {
            return Err(AudioIdError::ConfigMismatch {
                expected: expected_sample_rate as usize,
                found: spec.sample_rate as usize,
            });
        }
        if spec.bits_per_sample != 16 {
            return Err(AudioIdError::ConfigMismatch {
                expected: 16,
                found: spec.bits_per_sample as usize,
            });
        }

        Ok(Self { reader })
    }
}

impl AudioSource for WavFileSource {
    fn sample_rate(&self) -> u32 {
        self.reader.spec().sample_rate
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, AudioIdError> {
        let mut n = 0;
        for (slot, sample) in buf.iter_mut().zip(self.reader.samples::<i16>()) {
            let sample = sample.map_err(|e| AudioIdError::Io {
                path: std::path::PathBuf::new(),
                source: std::io::Error::other(e),
            })?;
            *slot = sample;
            n += 1;
        }
        Ok(n)
    }
}

struct SharedQueue {
    queue: VecDeque<i16>,
}

/// Captures from the default input device via `cpal`, mono-downmixing
/// multi-channel devices, pushing samples into a lock-protected queue that
/// the pipeline drains from the main thread.
pub struct LiveCaptureSource {
    shared: Arc<Mutex<SharedQueue>>,
    _stream: cpal::Stream,
    sample_rate: u32,
}

unsafe impl Send for LiveCaptureSource {}

impl LiveCaptureSource {
    pub fn new() -> Result<Self, AudioIdError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| AudioIdError::Io {
            path: std::path::PathBuf::new(),
            source: std::io::Error::other("no audio input device found"),
        })?;

        let supported_config = device.default_input_config().map_err(|e| AudioIdError::Io {
            path: std::path::PathBuf::new(),
            source: std::io::Error::other(e),
        })?;
        let sample_rate = supported_config.sample_rate().0;
        let sample_format = supported_config.sample_format();
        let channels = supported_config.channels() as usize;
        let config: cpal::StreamConfig = supported_config.into();

        info!(sample_rate, channels, "opening live capture device");

        let shared = Arc::new(Mutex::new(SharedQueue { queue: VecDeque::new() }));
        let shared_clone = Arc::clone(&shared);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_input_stream::<f32>(&device, &config, shared_clone, channels)?,
            cpal::SampleFormat::I16 => build_input_stream::<i16>(&device, &config, shared_clone, channels)?,
            cpal::SampleFormat::U16 => build_input_stream::<u16>(&device, &config, shared_clone, channels)?,
            format => {
                return Err(AudioIdError::Io {
                    path: std::path::PathBuf::new(),
                    source: std::io::Error::other(format!("unsupported sample format: {format:?}")),
                });
            }
        };

        stream.play().map_err(|e| AudioIdError::Io {
            path: std::path::PathBuf::new(),
            source: std::io::Error::other(e),
        })?;

        Ok(Self {
            shared,
            _stream: stream,
            sample_rate,
        })
    }
}

impl AudioSource for LiveCaptureSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, AudioIdError> {
        let mut state = self.shared.lock().unwrap();
        let n = buf.len().min(state.queue.len());
        for slot in buf.iter_mut().take(n) {
            *slot = state.queue.pop_front().unwrap();
        }
        Ok(n)
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: Arc<Mutex<SharedQueue>>,
    channels: usize,
) -> Result<cpal::Stream, AudioIdError>
where
    T: SizedSample + Send + 'static,
    i16: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Ok(mut state) = shared.try_lock() {
                    for chunk in data.chunks(channels) {
                        let sum: i32 = chunk.iter().map(|&s| i16::from_sample(s) as i32).sum();
                        let mono = (sum / channels as i32) as i16;
                        state.queue.push_back(mono);
                    }
                }
            },
            |err| tracing::error!("audio stream error: {err}"),
            None,
        )
        .map_err(|e| AudioIdError::Io {
            path: std::path::PathBuf::new(),
            source: std::io::Error::other(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_source_rejects_wrong_sample_rate() {
        let dir = std::env::temp_dir();
        let path = dir.join("audioid_test_wrong_rate.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        {
            let mut writer = hound::WavWriter::create(&path, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let result = WavFileSource::open(&path, 16000);
        assert!(matches!(result, Err(AudioIdError::ConfigMismatch { expected: 16000, found: 8000 })));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn wav_source_rejects_stereo() {
        let dir = std::env::temp_dir();
        let path = dir.join("audioid_test_stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        {
            let mut writer = hound::WavWriter::create(&path, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let result = WavFileSource::open(&path, 16000);
        assert!(matches!(result, Err(AudioIdError::ConfigMismatch { expected: 1, found: 2 })));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn wav_source_reads_samples_in_order() {
        let dir = std::env::temp_dir();
        let path = dir.join("audioid_test_read.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        {
            let mut writer = hound::WavWriter::create(&path, spec).unwrap();
            for i in 0..10i16 {
                writer.write_sample(i).unwrap();
            }
            writer.finalize().unwrap();
        }

        let mut source = WavFileSource::open(&path, 16000).unwrap();
        let mut buf = [0i16; 5];
        let n = source.read(&mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(buf, [0, 1, 2, 3, 4]);

        let n2 = source.read(&mut buf).unwrap();
        assert_eq!(n2, 5);
        assert_eq!(buf, [5, 6, 7, 8, 9]);

        let n3 = source.read(&mut buf).unwrap();
        assert_eq!(n3, 0);
        let _ = std::fs::remove_file(&path);
    }
}
