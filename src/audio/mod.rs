//! Audio Module
//!
//! Decoded PCM fragments, silence, concatenation and encoding of the final
//! artifact.

mod assembler;
mod decode;
mod encode;

pub use assembler::{assemble, CombinedAudio, Fragment};
pub use decode::decode_audio;
pub use encode::{encode, encode_mp3, encode_wav};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Format used for silence when no speech fragment fixes one
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
pub const DEFAULT_CHANNELS: u16 = 1;

/// Longest stretch of silence rendered in one piece
pub const MAX_SILENCE: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("Audio data contains no decodable track")]
    NoAudioTrack,

    #[error(
        "Fragment format {rate} Hz/{channels} ch does not match {expected_rate} Hz/{expected_channels} ch"
    )]
    FormatMismatch {
        expected_rate: u32,
        expected_channels: u16,
        rate: u32,
        channels: u16,
    },

    #[error("Silence of {seconds:.1} seconds is too long to render")]
    SilenceTooLong { seconds: f64 },

    #[error("MP3 encoding failed: {0}")]
    Encode(String),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Container format of the final artifact
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }
}

/// Decoded interleaved PCM samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFragment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioFragment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Empty fragment in the given format
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    /// Silence lasting `duration`, rounded to the nearest frame. Durations
    /// beyond `MAX_SILENCE` are refused.
    pub fn silence(
        duration: Duration,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, AudioError> {
        let too_long = || AudioError::SilenceTooLong {
            seconds: duration.as_secs_f64(),
        };
        if duration > MAX_SILENCE {
            return Err(too_long());
        }
        let frames = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
        let channels = channels.max(1);
        let len = frames
            .checked_mul(channels as usize)
            .ok_or_else(too_long)?;
        Ok(Self::new(vec![0.0; len], sample_rate, channels))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.frames() as u64;
        let rate = self.sample_rate as u64;
        Duration::from_secs(frames / rate)
            + Duration::from_nanos((frames % rate) * 1_000_000_000 / rate)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn same_format(&self, other: &AudioFragment) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }

    /// Append `other` after this fragment. Both must share a format.
    pub fn append(&mut self, other: &AudioFragment) -> Result<(), AudioError> {
        if !self.same_format(other) {
            return Err(AudioError::FormatMismatch {
                expected_rate: self.sample_rate,
                expected_channels: self.channels,
                rate: other.sample_rate,
                channels: other.channels,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_duration_is_exact() {
        let silence = AudioFragment::silence(Duration::from_secs(2), 24_000, 1).unwrap();
        assert_eq!(silence.frames(), 48_000);
        assert_eq!(silence.duration(), Duration::from_millis(2000));
        assert!(silence.samples().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_silence_stereo_has_two_samples_per_frame() {
        let silence = AudioFragment::silence(Duration::from_millis(500), 44_100, 2).unwrap();
        assert_eq!(silence.frames(), 22_050);
        assert_eq!(silence.samples().len(), 44_100);
        assert_eq!(silence.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_length_silence() {
        let silence = AudioFragment::silence(Duration::ZERO, 24_000, 1).unwrap();
        assert!(silence.is_empty());
        assert_eq!(silence.duration(), Duration::ZERO);
    }

    #[test]
    fn test_oversized_silence_is_an_error() {
        for duration in [
            Duration::from_secs(1_000_000_000_000_000),
            MAX_SILENCE + Duration::from_secs(1),
        ] {
            assert!(matches!(
                AudioFragment::silence(duration, 24_000, 1),
                Err(AudioError::SilenceTooLong { .. })
            ));
        }
        assert!(AudioFragment::silence(Duration::from_secs(1), 24_000, 2).is_ok());
    }

    #[test]
    fn test_append_keeps_order() {
        let mut a = AudioFragment::new(vec![0.1, 0.2], 24_000, 1);
        let b = AudioFragment::new(vec![0.3], 24_000, 1);
        a.append(&b).unwrap();
        assert_eq!(a.samples(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_append_rejects_format_mismatch() {
        let mut a = AudioFragment::new(vec![0.1], 24_000, 1);
        let b = AudioFragment::new(vec![0.3, 0.3], 44_100, 2);
        let err = a.append(&b).unwrap_err();
        assert!(matches!(
            err,
            AudioError::FormatMismatch {
                expected_rate: 24_000,
                rate: 44_100,
                ..
            }
        ));
        assert_eq!(a.samples(), &[0.1]);
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(AudioFormat::default(), AudioFormat::Mp3);
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(AudioFormat::Wav.extension(), "wav");
    }
}
