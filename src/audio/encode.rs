use std::io::Cursor;

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};

use super::{AudioError, AudioFormat, AudioFragment};

/// Encode `audio` into the container selected by `format`
pub fn encode(audio: &AudioFragment, format: AudioFormat) -> Result<Vec<u8>, AudioError> {
    match format {
        AudioFormat::Mp3 => encode_mp3(audio),
        AudioFormat::Wav => encode_wav(audio),
    }
}

fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// MP3 at 128 kbps through LAME
pub fn encode_mp3(audio: &AudioFragment) -> Result<Vec<u8>, AudioError> {
    if audio.channels() > 2 {
        return Err(AudioError::Encode(format!(
            "{} channels not supported, MP3 holds at most 2",
            audio.channels()
        )));
    }

    let mut builder =
        Builder::new().ok_or_else(|| AudioError::Encode("failed to create LAME builder".into()))?;
    builder
        .set_num_channels(audio.channels() as u8)
        .map_err(|e| AudioError::Encode(format!("channels: {:?}", e)))?;
    builder
        .set_sample_rate(audio.sample_rate())
        .map_err(|e| AudioError::Encode(format!("sample rate: {:?}", e)))?;
    builder
        .set_brate(Bitrate::Kbps128)
        .map_err(|e| AudioError::Encode(format!("bitrate: {:?}", e)))?;
    builder
        .set_quality(Quality::Good)
        .map_err(|e| AudioError::Encode(format!("quality: {:?}", e)))?;
    let mut encoder = builder
        .build()
        .map_err(|e| AudioError::Encode(format!("init: {:?}", e)))?;

    let pcm = to_i16(audio.samples());
    let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(pcm.len()));

    if audio.channels() == 1 {
        encoder.encode_to_vec(MonoPcm(pcm.as_slice()), &mut out)
    } else {
        encoder.encode_to_vec(InterleavedPcm(pcm.as_slice()), &mut out)
    }
    .map_err(|e| AudioError::Encode(format!("encode: {:?}", e)))?;

    out.reserve(mp3lame_encoder::max_required_buffer_size(0));
    encoder
        .flush_to_vec::<FlushNoGap>(&mut out)
        .map_err(|e| AudioError::Encode(format!("flush: {:?}", e)))?;

    tracing::debug!(
        "Encoded {:.2}s of audio into {} MP3 bytes",
        audio.duration().as_secs_f64(),
        out.len()
    );

    Ok(out)
}

/// 16-bit PCM WAV
pub fn encode_wav(audio: &AudioFragment) -> Result<Vec<u8>, AudioError> {
    let spec = hound::WavSpec {
        channels: audio.channels(),
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in to_i16(audio.samples()) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_i16_clamps() {
        assert_eq!(to_i16(&[0.0, 1.0, -1.0, 2.0, -3.0]), vec![0, 32767, -32767, 32767, -32767]);
    }

    #[test]
    fn test_wav_header() {
        let audio = AudioFragment::new(vec![0.0; 240], 24_000, 1);
        let bytes = encode_wav(&audio).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header + 2 bytes per sample
        assert_eq!(bytes.len(), 44 + 240 * 2);
    }

    #[test]
    fn test_mp3_produces_frames() {
        let audio = AudioFragment::new(vec![0.0; 24_000], 24_000, 1);
        let bytes = encode_mp3(&audio).unwrap();
        assert!(!bytes.is_empty());
        // MPEG frame sync: 11 set bits
        let has_sync = bytes
            .windows(2)
            .any(|w| w[0] == 0xFF && (w[1] & 0xE0) == 0xE0);
        assert!(has_sync);
    }

    #[test]
    fn test_mp3_stereo() {
        let audio = AudioFragment::new(vec![0.0; 44_100 * 2], 44_100, 2);
        assert!(encode_mp3(&audio).is_ok());
    }

    #[test]
    fn test_mp3_rejects_surround() {
        let audio = AudioFragment::new(vec![0.0; 60], 48_000, 6);
        assert!(matches!(encode_mp3(&audio), Err(AudioError::Encode(_))));
    }

    #[test]
    fn test_encode_dispatches_on_format() {
        let audio = AudioFragment::new(vec![0.0; 100], 24_000, 1);
        let wav = encode(&audio, AudioFormat::Wav).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
    }
}
