use anyhow::Result;
use clap::Parser;
use tintcam::{TintcamApp, TintcamConfig};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "tintcam")]
#[command(about = "Webcam face-detection demo with red tint and live system telemetry overlay")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "tintcam.toml",
        help = "Path to TOML configuration file"
    )]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting")]
    validate_config: bool,

    /// Print effective configuration and exit
    #[arg(long, help = "Print effective configuration in TOML format and exit")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = match TintcamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", args.config, e);
            return Err(e.into());
        }
    };

    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        println!("Configuration is valid");
        return Ok(());
    }

    info!("Starting tintcam v{}", env!("CARGO_PKG_VERSION"));

    let stats = TintcamApp::new(config).run().await.map_err(|e| {
        error!("Tintcam failed: {}", e);
        e
    })?;

    info!(
        "Tintcam exited after {} frames ({} detection passes, {} faces)",
        stats.frames, stats.detect_runs, stats.faces_seen
    );

    Ok(())
}

fn init_logging(args: &Args) {
    use tracing_subscriber::EnvFilter;

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tintcam={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(args.debug)
        .init();
}
