//! Asynchronous source acquisition.
//!
//! Fetching and decoding material, and asking for a capture device, are the
//! only places the stage waits. Both sit behind `async` traits so a host can
//! plug in its own fetcher or permission prompt.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hound::{SampleFormat, WavReader};
use pedalboard_core::AudioBuffer;

use crate::{Error, Result};

/// Turns a locator (path, URL, asset key) into decoded material.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    /// Fetches and decodes `locator`.
    async fn load(&self, locator: &str) -> Result<AudioBuffer>;
}

/// Loads WAV files from disk.
///
/// Decoding runs on the blocking thread pool.
#[derive(Debug, Clone, Default)]
pub struct WavLoader {
    base_dir: Option<PathBuf>,
}

impl WavLoader {
    /// A loader that resolves locators as given.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative locators against `dir`.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl SourceLoader for WavLoader {
    async fn load(&self, locator: &str) -> Result<AudioBuffer> {
        let path = self.resolve(locator);
        tracing::debug!(path = %path.display(), "loading wav");
        tokio::task::spawn_blocking(move || read_wav(&path)).await?
    }
}

/// Decodes a WAV file into planar channels.
pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = WavReader::open(path)?;
    decode(reader)
}

/// Decodes WAV bytes held in memory.
pub fn decode_wav_bytes(bytes: &[u8]) -> Result<AudioBuffer> {
    let reader = WavReader::new(std::io::Cursor::new(bytes))?;
    decode(reader)
}

fn decode<R: Read>(reader: WavReader<R>) -> Result<AudioBuffer> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if !(1..=2).contains(&channels) {
        return Err(Error::Decode(format!(
            "{channels} channels, only mono and stereo are supported"
        )));
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(Error::Decode(format!(
                    "unsupported bit depth {}",
                    spec.bits_per_sample
                )));
            }
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    // Deinterleave
    let mut planar = vec![Vec::with_capacity(samples.len() / channels); channels];
    for frame in samples.chunks(channels) {
        for (channel, &sample) in planar.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    Ok(AudioBuffer::new(spec.sample_rate as f32, planar))
}

/// A granted capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureGrant {
    /// Device identifier, `None` for the system default.
    pub device: Option<String>,
    /// Human-readable label.
    pub label: String,
}

/// Grants access to live input devices.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Asks for `device` (or the default). May wait on a permission prompt.
    async fn acquire(&self, device: Option<&str>) -> Result<CaptureGrant>;

    /// Available input devices.
    async fn devices(&self) -> Vec<String>;
}

/// A fixed device list with a single permission switch.
///
/// Useful for hosts that enumerate devices up front, and in tests.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<String>,
    denied: bool,
}

impl DeviceCatalog {
    /// A catalog of the given device identifiers. The first is the default.
    pub fn new(devices: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            devices: devices.into_iter().map(Into::into).collect(),
            denied: false,
        }
    }

    /// Refuses every request, as if the user declined the prompt.
    #[must_use]
    pub fn denied(mut self) -> Self {
        self.denied = true;
        self
    }
}

#[async_trait]
impl CaptureProvider for DeviceCatalog {
    async fn acquire(&self, device: Option<&str>) -> Result<CaptureGrant> {
        if self.denied {
            return Err(Error::PermissionDenied);
        }
        match device {
            Some(id) => self
                .devices
                .iter()
                .find(|d| *d == id)
                .map(|d| CaptureGrant {
                    device: Some(d.clone()),
                    label: d.clone(),
                })
                .ok_or_else(|| Error::DeviceNotFound(id.to_string())),
            None => self
                .devices
                .first()
                .map(|d| CaptureGrant {
                    device: None,
                    label: d.clone(),
                })
                .ok_or_else(|| Error::DeviceNotFound("default".to_string())),
        }
    }

    async fn devices(&self) -> Vec<String> {
        self.devices.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_stereo_int(path: &Path) {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(-16384i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn test_wav_loader_decodes_stereo() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("riff.wav");
        write_stereo_int(&path);

        let buffer = WavLoader::new()
            .load(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 100);
        assert_eq!(buffer.sample_rate(), 8000.0);
        assert!((buffer.channel(0).unwrap()[0] - 0.5).abs() < 1e-6);
        assert!((buffer.channel(1).unwrap()[0] + 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_wav_loader_base_dir() {
        let temp = TempDir::new().unwrap();
        write_stereo_int(&temp.path().join("take.wav"));

        let loader = WavLoader::new().with_base_dir(temp.path());
        assert!(loader.load("take.wav").await.is_ok());
    }

    #[tokio::test]
    async fn test_wav_loader_missing_file() {
        let err = WavLoader::new()
            .load("/nonexistent/take_12345.wav")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Wav(_)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_wav_bytes(b"definitely not a wav"),
            Err(Error::Wav(_))
        ));
    }

    #[test]
    fn test_decode_float_mono_bytes() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut bytes = std::io::Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut bytes, spec).unwrap();
            for sample in [0.25f32, -0.75, 1.0] {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }

        let buffer = decode_wav_bytes(bytes.get_ref()).unwrap();
        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.channel(0).unwrap(), &[0.25, -0.75, 1.0]);
    }

    #[test]
    fn test_decode_rejects_surround() {
        let spec = WavSpec {
            channels: 6,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut bytes = std::io::Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut bytes, spec).unwrap();
            for _ in 0..6 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        assert!(matches!(
            decode_wav_bytes(bytes.get_ref()),
            Err(Error::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_device_catalog() {
        let catalog = DeviceCatalog::new(["built-in", "usb-1"]);
        let grant = catalog.acquire(None).await.unwrap();
        assert_eq!(grant.device, None);
        assert_eq!(grant.label, "built-in");

        let grant = catalog.acquire(Some("usb-1")).await.unwrap();
        assert_eq!(grant.device.as_deref(), Some("usb-1"));

        assert!(matches!(
            catalog.acquire(Some("usb-9")).await,
            Err(Error::DeviceNotFound(_))
        ));
        assert!(matches!(
            DeviceCatalog::default().acquire(None).await,
            Err(Error::DeviceNotFound(_))
        ));
        assert!(matches!(
            catalog.clone().denied().acquire(None).await,
            Err(Error::PermissionDenied)
        ));
        assert_eq!(catalog.devices().await.len(), 2);
    }
}
