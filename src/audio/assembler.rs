use std::time::Duration;

use super::{AudioError, AudioFragment, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};

/// Per-segment output of the synthesizer
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Decoded speech
    Audio(AudioFragment),
    /// Silence to be rendered in the output format
    Silence(Duration),
}

impl Fragment {
    pub fn duration(&self) -> Duration {
        match self {
            Fragment::Audio(audio) => audio.duration(),
            Fragment::Silence(duration) => *duration,
        }
    }
}

/// The finished buffer handed to the presenter
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedAudio {
    audio: AudioFragment,
    fragment_count: usize,
}

impl CombinedAudio {
    pub fn audio(&self) -> &AudioFragment {
        &self.audio
    }

    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    pub fn duration(&self) -> Duration {
        self.audio.duration()
    }
}

/// Concatenate fragments in order.
///
/// The first audio fragment fixes the output format; silence is rendered in
/// that format (24 kHz mono when the list holds no audio at all). A later
/// fragment in a different format is an error.
pub fn assemble(fragments: Vec<Fragment>) -> Result<CombinedAudio, AudioError> {
    let (sample_rate, channels) = fragments
        .iter()
        .find_map(|f| match f {
            Fragment::Audio(audio) => Some((audio.sample_rate(), audio.channels())),
            Fragment::Silence(_) => None,
        })
        .unwrap_or((DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS));

    let fragment_count = fragments.len();
    let mut combined = AudioFragment::empty(sample_rate, channels);

    for fragment in fragments {
        match fragment {
            Fragment::Audio(audio) => combined.append(&audio)?,
            Fragment::Silence(duration) => {
                combined.append(&AudioFragment::silence(duration, sample_rate, channels)?)?
            }
        }
    }

    tracing::debug!(
        "Assembled {} fragments into {:.2}s at {} Hz",
        fragment_count,
        combined.duration().as_secs_f64(),
        sample_rate
    );

    Ok(CombinedAudio {
        audio: combined,
        fragment_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speech(value: f32, frames: usize) -> Fragment {
        Fragment::Audio(AudioFragment::new(vec![value; frames], 24_000, 1))
    }

    #[test]
    fn test_speech_pause_speech_duration() {
        let a = speech(0.5, 12_000); // 500 ms
        let b = speech(-0.5, 6_000); // 250 ms
        let combined = assemble(vec![a, Fragment::Silence(Duration::from_secs(2)), b]).unwrap();

        assert_eq!(combined.fragment_count(), 3);
        assert_eq!(
            combined.duration(),
            Duration::from_millis(500) + Duration::from_millis(2000) + Duration::from_millis(250)
        );
    }

    #[test]
    fn test_order_is_preserved() {
        let combined = assemble(vec![
            speech(0.1, 2),
            Fragment::Silence(Duration::from_secs_f64(1.0 / 24_000.0)),
            speech(0.2, 1),
            speech(0.3, 1),
        ])
        .unwrap();

        assert_eq!(combined.audio().samples(), &[0.1, 0.1, 0.0, 0.2, 0.3]);
    }

    #[test]
    fn test_leading_pause_uses_first_speech_format() {
        let speech = Fragment::Audio(AudioFragment::new(vec![0.0; 4_410], 44_100, 1));
        let combined =
            assemble(vec![Fragment::Silence(Duration::from_millis(100)), speech]).unwrap();

        assert_eq!(combined.audio().sample_rate(), 44_100);
        assert_eq!(combined.audio().frames(), 8_820);
    }

    #[test]
    fn test_pause_only_uses_default_format() {
        let combined = assemble(vec![Fragment::Silence(Duration::from_secs(1))]).unwrap();
        assert_eq!(combined.audio().sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(combined.audio().channels(), DEFAULT_CHANNELS);
        assert_eq!(combined.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_mismatched_formats_fail() {
        let a = speech(0.0, 10);
        let b = Fragment::Audio(AudioFragment::new(vec![0.0; 10], 22_050, 1));
        assert!(matches!(
            assemble(vec![a, b]),
            Err(AudioError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn test_huge_pause_fails_without_allocating() {
        let result = assemble(vec![
            speech(0.0, 10),
            Fragment::Silence(Duration::from_secs(1_000_000_000_000_000)),
        ]);
        assert!(matches!(result, Err(AudioError::SilenceTooLong { .. })));
    }

    #[test]
    fn test_empty_input() {
        let combined = assemble(Vec::new()).unwrap();
        assert_eq!(combined.fragment_count(), 0);
        assert_eq!(combined.duration(), Duration::ZERO);
    }
}
