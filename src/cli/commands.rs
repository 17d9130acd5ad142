//! CLI subcommands: speak, meditate, voices, init, config, logs, and config loading.

use anyhow::{Context, Result};
use std::io::{IsTerminal, Read};
use std::path::Path;

use crate::config::{Config, SecretString};
use crate::error::SpeechcraftError;
use crate::pipeline::{
    OpenAiClients, Pipeline, PipelineSettings, Presenter, RunOutput, RunRequest, RunTracker,
};
use crate::script::Segment;
use crate::speech::Voice;

use super::{LogCommands, SynthesisArgs};

/// Load configuration from file or defaults
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = config_path {
        tracing::info!("Loading configuration from custom path: {}", path);
        Config::load_from_path(path)?
    } else {
        tracing::debug!("Loading default configuration");
        Config::load()?
    };

    config.validate()?;

    Ok(config)
}

/// Input text from `--text`, `--file`, or piped stdin, in that order
fn read_input(args: &SynthesisArgs) -> Result<String> {
    if let Some(ref text) = args.text {
        return Ok(text.clone());
    }

    if let Some(ref path) = args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()));
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }

    let mut text = String::new();
    stdin
        .lock()
        .read_to_string(&mut text)
        .context("Failed to read input from stdin")?;
    Ok(text)
}

/// `--api-key` wins over the environment and config file, which are already
/// merged into `config`
fn resolve_credential(flag: Option<&str>, config: &Config) -> Option<SecretString> {
    flag.filter(|k| !k.trim().is_empty())
        .map(SecretString::from_str)
        .or_else(|| config.openai.api_key.clone())
}

fn build_pipeline(config: &Config, play: bool) -> Pipeline<OpenAiClients> {
    let presenter = Presenter::new(&config.output.dir, config.output.format).with_playback(play);
    Pipeline::new(
        OpenAiClients::from_config(config),
        PipelineSettings::from_config(config),
        presenter,
    )
}

fn build_request(config: &Config, args: &SynthesisArgs) -> Result<RunRequest> {
    Ok(RunRequest {
        text: read_input(args)?,
        voice: config.synthesis.voice,
        credential: resolve_credential(args.api_key.as_deref(), config),
    })
}

/// Convert text to speech
pub(crate) async fn cmd_speak(config: &Config, args: SynthesisArgs) -> Result<()> {
    let request = build_request(config, &args)?;
    let pipeline = build_pipeline(config, args.play);
    let mut tracker = RunTracker::new();

    let output = pipeline
        .speak(request, &mut tracker)
        .await
        .map_err(SpeechcraftError::from)?;

    print_result(&output, &tracker);
    Ok(())
}

/// Generate and voice a meditation
pub(crate) async fn cmd_meditate(config: &Config, args: SynthesisArgs) -> Result<()> {
    let request = build_request(config, &args)?;
    let pipeline = build_pipeline(config, args.play);
    let mut tracker = RunTracker::new();

    println!(
        "🧘 Writing a {}s meditation with voice {}...",
        config.meditation.target_seconds, request.voice
    );

    let output = pipeline
        .meditate(request, &mut tracker)
        .await
        .map_err(SpeechcraftError::from)?;

    print_script(&output);
    print_result(&output, &tracker);
    Ok(())
}

fn print_script(output: &RunOutput) {
    let speech = output
        .script
        .segments()
        .iter()
        .filter(|s| !s.is_pause())
        .count();
    println!(
        "\n📜 Script: {} segments ({} speech, {} pause, {:.1}s of silence)",
        output.script.len(),
        speech,
        output.script.len() - speech,
        output.script.total_pause().as_secs_f64()
    );
    for segment in output.script.segments() {
        match segment {
            Segment::Speech(text) => tracing::debug!("speech: {}", text),
            Segment::Pause(seconds) => tracing::debug!("pause: {}s", seconds),
        }
    }
}

fn print_result(output: &RunOutput, tracker: &RunTracker) {
    let presentation = &output.presentation;
    println!("\n✅ Saved {}", presentation.file_name);
    println!("   Path:     {}", presentation.path.display());
    println!("   Type:     {}", presentation.mime_type);
    println!("   Duration: {:.1}s", presentation.duration.as_secs_f64());
    println!("   Size:     {:.1} KB", presentation.size_bytes as f64 / 1024.0);
    println!("   Run:      {}", tracker.run_id());
}

/// List voices
pub(crate) fn cmd_voices(config: &Config) -> Result<()> {
    println!("🎙️  Available voices\n");
    for voice in Voice::ALL {
        let marker = if voice == config.synthesis.voice {
            " (default)"
        } else {
            ""
        };
        println!("  - {}{}", voice, marker);
    }
    Ok(())
}

/// Initialize configuration file
pub(crate) fn cmd_init(force: bool) -> Result<()> {
    println!("🎙️  Speechcraft Configuration Initialization\n");

    let config_path =
        Config::system_config_path().context("Could not determine config directory")?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            config_path.display()
        );
    }

    Config::default().save(&config_path)?;

    println!("✅ Configuration initialized at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set the OPENAI_API_KEY environment variable (or add it to .env)");
    println!("   2. Run 'speechcraft speak --text \"Hello\"'");

    Ok(())
}

/// Show configuration
pub(crate) fn cmd_config(config: &Config, show_secrets: bool) -> Result<()> {
    println!("🎙️  Speechcraft Configuration\n");

    println!("Log level: {}", config.logging.level);
    if let Some(ref file) = config.logging.file {
        println!("Log file: {}", file.display());
    }
    println!("\nOpenAI:");
    println!("  Base URL:   {}", config.openai.base_url);
    println!("  TTS model:  {}", config.openai.tts_model);
    println!("  Chat model: {}", config.openai.chat_model);
    match (&config.openai.api_key, show_secrets) {
        (Some(key), true) if !key.is_empty() => println!("  API Key:    {}", key.expose_secret()),
        _ => println!(
            "  API Key:    {}",
            if config.has_api_key() {
                "[SET]"
            } else {
                "[NOT SET]"
            }
        ),
    }
    println!("\nSynthesis:");
    println!("  Voice:           {}", config.synthesis.voice);
    println!("  Max chunk chars: {}", config.synthesis.max_chunk_chars);
    println!("\nMeditation:");
    println!("  Target seconds: {}", config.meditation.target_seconds);
    println!("\nOutput:");
    println!("  Directory: {}", config.output.dir.display());
    println!("  Format:    {}", config.output.format.extension());

    if !show_secrets {
        println!("\n💡 Use --show-secrets to display the API key");
    }

    Ok(())
}

/// Log management commands
pub(crate) fn cmd_logs(operation: LogCommands) -> Result<()> {
    use crate::logging;

    let log_dir = logging::get_log_dir();

    match operation {
        LogCommands::Status => print_log_status(&log_dir),

        LogCommands::View { lines } => {
            let Some(log_path) = logging::get_log_path() else {
                println!("❌ No log files found.\n");
                println!("💡 Run Speechcraft with -d flag to enable debug logging:");
                println!("   speechcraft -d speak --text \"Hello\"");
                return Ok(());
            };

            println!("📜 Viewing last {} lines of: {}\n", lines, log_path.display());
            let contents = std::fs::read_to_string(&log_path)
                .with_context(|| format!("Failed to read log file: {}", log_path.display()))?;
            let tail = tail_lines(&contents, lines);
            if tail.is_empty() {
                println!("(empty log file)");
            }
            for line in tail {
                println!("{}", line);
            }
            Ok(())
        }

        LogCommands::Clean { days } => {
            println!("🧹 Cleaning up log files older than {} days...\n", days);
            let removed = logging::cleanup_old_logs(days)?;
            if removed > 0 {
                println!("✅ Removed {} old log file(s)", removed);
            } else {
                println!("✅ No old log files to remove");
            }
            Ok(())
        }
    }
}

fn print_log_status(log_dir: &Path) -> Result<()> {
    println!("📊 Speechcraft Logging Status\n");
    println!("Log directory: {}", log_dir.display());

    let files = crate::logging::log_files_in(log_dir);
    if files.is_empty() {
        println!("Status: ❌ No logs found");
        println!("\n💡 To enable debug logging, run with -d flag:");
        println!("   speechcraft -d speak --text \"Hello\"");
        return Ok(());
    }

    let total_size: u64 = files
        .iter()
        .filter_map(|path| path.metadata().ok())
        .map(|metadata| metadata.len())
        .sum();

    println!("Status: ✅ Active");
    println!("Log files: {}", files.len());
    println!("Total size: {:.2} MB", total_size as f64 / (1024.0 * 1024.0));
    if let Some(latest) = crate::logging::get_log_path() {
        println!("Latest log: {}", latest.display());
        if let Ok(modified) = latest.metadata().and_then(|m| m.modified()) {
            let modified: chrono::DateTime<chrono::Local> = modified.into();
            println!("Last write: {}", modified.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    Ok(())
}

/// Last `n` lines of `contents`
fn tail_lines(contents: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_read_input_prefers_text() {
        let args = SynthesisArgs {
            text: Some("Hello there".to_string()),
            ..Default::default()
        };
        assert_eq!(read_input(&args).unwrap(), "Hello there");
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "From a file\nwith two lines").unwrap();

        let args = SynthesisArgs {
            file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert_eq!(read_input(&args).unwrap(), "From a file\nwith two lines");
    }

    #[test]
    fn test_read_input_missing_file() {
        let args = SynthesisArgs {
            file: Some("/definitely/not/here.txt".into()),
            ..Default::default()
        };
        let err = read_input(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }

    #[rstest]
    #[case(Some("sk-flag"), Some("sk-config"), Some("sk-flag"))]
    #[case(None, Some("sk-config"), Some("sk-config"))]
    #[case(Some("  "), Some("sk-config"), Some("sk-config"))]
    #[case(None, None, None)]
    fn test_credential_precedence(
        #[case] flag: Option<&str>,
        #[case] configured: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let mut config = Config::default();
        config.openai.api_key = configured.map(SecretString::from_str);

        let resolved = resolve_credential(flag, &config);
        assert_eq!(
            resolved.as_ref().map(|k| k.expose_secret()),
            expected
        );
    }

    #[test]
    fn test_tail_lines() {
        let contents = "a\nb\nc\nd";
        assert_eq!(tail_lines(contents, 2), vec!["c", "d"]);
        assert_eq!(tail_lines(contents, 10), vec!["a", "b", "c", "d"]);
        assert!(tail_lines("", 5).is_empty());
    }

    #[test]
    fn test_load_config_from_custom_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[meditation]\ntarget_seconds = 120").unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.meditation.target_seconds, 120);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[synthesis]\nmax_chunk_chars = 0").unwrap();

        assert!(load_config(file.path().to_str()).is_err());
    }
}
