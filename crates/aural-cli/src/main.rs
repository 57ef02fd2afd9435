//! Aural CLI - a thin demonstration binary over `aural-engine`/`aural-io`:
//! open a device, synthesize or load a buffer, position a source, and
//! render it to a WAV file or to the speakers.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aural")]
#[command(author, version, about = "Aural 3D positional audio demo CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List and manage audio devices
    Devices(commands::devices::DevicesArgs),

    /// Play a positioned source through the speakers
    Play(commands::play::PlayArgs),

    /// Render a positioned source to a WAV file
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let config = aural_engine::Config::from_env();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level.as_tracing_filter()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match &config.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            subscriber.with_writer(std::sync::Mutex::new(file)).init();
        }
        None => subscriber.init(),
    }

    let cli = Cli::parse();
    tracing::debug!(command = ?std::mem::discriminant(&cli.command), "dispatching command");

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
