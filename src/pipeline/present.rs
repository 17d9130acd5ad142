//! Presenter
//!
//! Writes the encoded artifact under a fixed name and optionally plays it.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;

use super::PipelineError;
use crate::audio::AudioFormat;

/// Where the finished artifact ended up
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: &'static str,
    pub size_bytes: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct Presenter {
    output_dir: PathBuf,
    format: AudioFormat,
    play: bool,
}

impl Presenter {
    pub fn new(output_dir: impl Into<PathBuf>, format: AudioFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            play: false,
        }
    }

    pub fn with_playback(mut self, play: bool) -> Self {
        self.play = play;
        self
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Write `bytes` to `<output_dir>/<stem>.<ext>`.
    ///
    /// The data goes to a uniquely named temporary file in the same directory
    /// first and is renamed into place, so an interrupted run never leaves a
    /// truncated artifact and concurrent runs never share a scratch path.
    pub async fn present(
        &self,
        bytes: &[u8],
        duration: Duration,
        stem: &str,
    ) -> Result<Presentation, PipelineError> {
        let file_name = format!("{}.{}", stem, self.format.extension());
        let path = self.output_dir.join(&file_name);

        write_atomically(&self.output_dir, &path, bytes).map_err(|source| {
            PipelineError::Output {
                path: path.clone(),
                source,
            }
        })?;

        tracing::info!(
            "Wrote {} ({} bytes, {:.1}s)",
            path.display(),
            bytes.len(),
            duration.as_secs_f64()
        );

        if self.play {
            play(&path, self.format).await;
        }

        Ok(Presentation {
            path,
            file_name,
            mime_type: self.format.mime_type(),
            size_bytes: bytes.len(),
            duration,
        })
    }
}

fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

type PlayerCommand = (&'static str, &'static [&'static str]);

/// Candidate players, most capable first
const MP3_PLAYERS: &[PlayerCommand] = &[
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    ("mpv", &["--no-video", "--really-quiet"]),
    ("afplay", &[]),
    ("mpg123", &["-q"]),
];

const WAV_PLAYERS: &[PlayerCommand] = &[
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    ("mpv", &["--no-video", "--really-quiet"]),
    ("afplay", &[]),
    ("aplay", &["-q"]),
    ("paplay", &[]),
];

fn players(format: AudioFormat) -> &'static [PlayerCommand] {
    match format {
        AudioFormat::Mp3 => MP3_PLAYERS,
        AudioFormat::Wav => WAV_PLAYERS,
    }
}

fn find_player(format: AudioFormat) -> Option<(PathBuf, &'static [&'static str])> {
    players(format)
        .iter()
        .find_map(|(name, args)| which::which(name).ok().map(|path| (path, *args)))
}

/// Play the file with the first player found on `PATH`. Playback problems
/// are reported but never fail the run.
async fn play(path: &Path, format: AudioFormat) {
    let Some((player, args)) = find_player(format) else {
        tracing::warn!("No audio player found on PATH; skipping playback");
        println!("No audio player found. Open {} to listen.", path.display());
        return;
    };

    tracing::info!("Playing {} with {}", path.display(), player.display());
    match tokio::process::Command::new(&player)
        .args(args)
        .arg(path)
        .status()
        .await
    {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::warn!("{} exited with {}", player.display(), status),
        Err(e) => tracing::warn!("Failed to start {}: {}", player.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_present_writes_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let presenter = Presenter::new(dir.path(), AudioFormat::Mp3);

        let presentation = presenter
            .present(b"ID3fake", Duration::from_secs(3), "speech")
            .await
            .unwrap();

        assert_eq!(presentation.file_name, "speech.mp3");
        assert_eq!(presentation.path, dir.path().join("speech.mp3"));
        assert_eq!(presentation.mime_type, "audio/mpeg");
        assert_eq!(presentation.size_bytes, 7);
        assert_eq!(std::fs::read(&presentation.path).unwrap(), b"ID3fake");
    }

    #[tokio::test]
    async fn test_present_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let presenter = Presenter::new(dir.path(), AudioFormat::Wav);

        presenter
            .present(b"first", Duration::ZERO, "meditation")
            .await
            .unwrap();
        presenter
            .present(b"second", Duration::ZERO, "meditation")
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("meditation.wav")]);
        assert_eq!(
            std::fs::read(dir.path().join("meditation.wav")).unwrap(),
            b"second"
        );
    }

    #[tokio::test]
    async fn test_present_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let presenter = Presenter::new(&nested, AudioFormat::Mp3);

        let presentation = presenter
            .present(b"x", Duration::ZERO, "speech")
            .await
            .unwrap();
        assert!(presentation.path.exists());
    }

    #[tokio::test]
    async fn test_present_reports_unwritable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let presenter = Presenter::new(&file, AudioFormat::Mp3);

        let err = presenter
            .present(b"x", Duration::ZERO, "speech")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Output { .. }));
    }

    #[test]
    fn test_player_lists_are_not_empty() {
        assert!(!players(AudioFormat::Mp3).is_empty());
        assert!(!players(AudioFormat::Wav).is_empty());
    }
}
