use clap::Parser;
use speechcraft::{cli, logging, ErrorCode, SpeechcraftError};

#[tokio::main]
async fn main() {
    // Load .env file before anything else (silently ignore if missing)
    dotenvy::dotenv().ok();

    let cli_args = cli::Cli::parse();

    // Stderr logging while the configuration is read; the full setup below
    // depends on it
    let bootstrap = logging::bootstrap_subscriber(
        &logging::LogConfig::new().with_debug_mode(cli_args.debug),
    );
    let loaded = tracing::subscriber::with_default(bootstrap, || {
        cli::load_config(cli_args.config.as_deref())
    });

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(ErrorCode::Config.exit_code());
        }
    };

    let log_config = logging::LogConfig::new()
        .with_debug_mode(cli_args.debug)
        .with_level(config.logging.level.clone())
        .with_log_file(config.logging.file.clone());

    let guards = match logging::init_logging(log_config) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            std::process::exit(ErrorCode::Config.exit_code());
        }
    };

    // Clean up old log files (keep last 7 days)
    if cli_args.debug
        && let Ok(removed) = logging::cleanup_old_logs(7)
        && removed > 0
    {
        tracing::info!("🧹 Cleaned up {} old log file(s)", removed);
    }

    if let Err(e) = cli::run(cli_args, config).await {
        // Pipeline errors already carry their cause in the message
        let code = match e.downcast_ref::<SpeechcraftError>() {
            Some(err) => {
                eprintln!("❌ {}", err);
                err.code().exit_code()
            }
            None => {
                eprintln!("❌ {:#}", e);
                1
            }
        };
        // Flush file writers before exiting
        drop(guards);
        std::process::exit(code);
    }
}
