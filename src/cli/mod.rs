//! CLI Module
//!
//! Command-line interface for Speechcraft using Clap v4.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::audio::AudioFormat;
use crate::config::Config;
use crate::speech::Voice;

pub use commands::load_config;

/// Speechcraft - turn text into speech, or a description into a guided meditation
#[derive(Parser, Debug)]
#[command(name = "speechcraft")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (creates log files in .speechcraft/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert text to speech
    Speak {
        #[command(flatten)]
        args: SynthesisArgs,
    },

    /// Generate a guided meditation from a short description
    Meditate {
        #[command(flatten)]
        args: SynthesisArgs,

        /// Approximate length of the meditation in seconds
        #[arg(long)]
        target_seconds: Option<u32>,
    },

    /// List the available voices
    Voices,

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    Config {
        /// Show full configuration including secrets
        #[arg(short, long)]
        show_secrets: bool,
    },

    /// Log management operations
    Logs {
        #[command(subcommand)]
        operation: LogCommands,
    },
}

/// Options shared by `speak` and `meditate`
#[derive(Args, Debug, Clone, Default)]
pub struct SynthesisArgs {
    /// Input text (reads --file or stdin when omitted)
    #[arg(short = 't', long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Read input text from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Voice to use
    #[arg(short, long)]
    pub voice: Option<Voice>,

    /// OpenAI API key (overrides OPENAI_API_KEY and the config file)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Directory the audio file is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output audio format
    #[arg(long)]
    pub format: Option<AudioFormat>,

    /// Play the result when done
    #[arg(short, long)]
    pub play: bool,
}

impl SynthesisArgs {
    /// Fold flag values into the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(voice) = self.voice {
            config.synthesis.voice = voice;
        }
        if let Some(ref dir) = self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Show log file location and status
    Status,
    /// View recent log entries (requires debug mode)
    View {
        /// Number of lines to show (default: 50)
        #[arg(short, long, default_value = "50")]
        lines: usize,
    },
    /// Clean up old log files
    Clean {
        /// Maximum age in days (default: 7)
        #[arg(short = 'a', long, default_value = "7")]
        days: u64,
    },
}

/// Main CLI entry point
pub async fn run(cli: Cli, mut config: Config) -> Result<()> {
    if cli.debug {
        tracing::info!("Debug mode enabled");
    }

    match cli.command {
        Commands::Speak { args } => {
            args.apply_to(&mut config);
            commands::cmd_speak(&config, args).await
        }
        Commands::Meditate {
            args,
            target_seconds,
        } => {
            args.apply_to(&mut config);
            if let Some(seconds) = target_seconds {
                config.meditation.target_seconds = seconds;
            }
            config.validate()?;
            commands::cmd_meditate(&config, args).await
        }
        Commands::Voices => commands::cmd_voices(&config),
        Commands::Init { force } => commands::cmd_init(force),
        Commands::Config { show_secrets } => commands::cmd_config(&config, show_secrets),
        Commands::Logs { operation } => commands::cmd_logs(operation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_speak_with_flags() {
        let cli = Cli::try_parse_from([
            "speechcraft",
            "-d",
            "speak",
            "--text",
            "Hello",
            "--voice",
            "onyx",
            "--format",
            "wav",
            "--play",
        ])
        .unwrap();

        assert!(cli.debug);
        let Commands::Speak { args } = cli.command else {
            panic!("expected speak");
        };
        assert_eq!(args.text.as_deref(), Some("Hello"));
        assert_eq!(args.voice, Some(Voice::Onyx));
        assert_eq!(args.format, Some(AudioFormat::Wav));
        assert!(args.play);
    }

    #[test]
    fn test_parse_meditate_target() {
        let cli = Cli::try_parse_from([
            "speechcraft",
            "meditate",
            "-t",
            "anxious before an exam",
            "--target-seconds",
            "90",
        ])
        .unwrap();

        let Commands::Meditate {
            args,
            target_seconds,
        } = cli.command
        else {
            panic!("expected meditate");
        };
        assert_eq!(args.text.as_deref(), Some("anxious before an exam"));
        assert_eq!(target_seconds, Some(90));
    }

    #[test]
    fn test_meditate_short_t_means_text() {
        let cli = Cli::try_parse_from([
            "speechcraft",
            "meditate",
            "--text",
            "calm",
            "--target-seconds",
            "60",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Meditate {
                target_seconds: Some(60),
                ..
            }
        ));

        let short = Cli::try_parse_from(["speechcraft", "meditate", "-t", "60"]).unwrap();
        let Commands::Meditate {
            args,
            target_seconds,
        } = short.command
        else {
            panic!("expected meditate");
        };
        assert_eq!(args.text.as_deref(), Some("60"));
        assert_eq!(target_seconds, None);
    }

    #[test]
    fn test_text_and_file_conflict() {
        let result = Cli::try_parse_from([
            "speechcraft",
            "speak",
            "--text",
            "a",
            "--file",
            "b.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_voice_is_rejected() {
        let result = Cli::try_parse_from(["speechcraft", "speak", "--voice", "robot"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let args = SynthesisArgs {
            voice: Some(Voice::Shimmer),
            output_dir: Some(PathBuf::from("/tmp/out")),
            format: Some(AudioFormat::Wav),
            ..Default::default()
        };

        args.apply_to(&mut config);
        assert_eq!(config.synthesis.voice, Voice::Shimmer);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.output.format, AudioFormat::Wav);
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let mut config = Config::default();
        config.synthesis.voice = Voice::Echo;
        SynthesisArgs::default().apply_to(&mut config);
        assert_eq!(config.synthesis.voice, Voice::Echo);
    }
}
