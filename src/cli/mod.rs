use ballot::serialization::ExportFormat;
use clap::{Parser, Subcommand};

pub mod config;
pub mod events;
pub mod init;
pub mod logging;
pub mod run;
pub mod version;

#[derive(Parser)]
#[command(name = "ballot")]
#[command(author = "Ballot Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Single-question ballot engine with phased voting", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Identity of the initial administrator
        #[arg(long)]
        administrator: String,

        /// The question put to the voters
        #[arg(long)]
        question: String,

        /// Path to config file (default: ~/.local/share/ballot/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run a scripted ballot session
    Run {
        /// Path to the TOML script of steps
        #[arg(long)]
        script: String,

        /// Path to config file (default: ~/.local/share/ballot/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Write the notification log to this file when done
        #[arg(long)]
        export: Option<String>,

        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Cbor)]
        format: ExportFormat,

        /// Print every notification as it is committed
        #[arg(long)]
        follow: bool,
    },

    /// Print an exported notification log as JSON lines
    Events {
        /// Path to the exported log
        #[arg(long)]
        input: String,

        /// Format of the exported log
        #[arg(long, value_enum, default_value_t = ExportFormat::Cbor)]
        format: ExportFormat,

        /// First sequence number to print
        #[arg(long, default_value_t = 0)]
        from: u64,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init {
            administrator,
            question,
            config,
            force,
        } => init::execute(administrator, question, config, force).await,
        Commands::Run {
            script,
            config,
            export,
            format,
            follow,
        } => run::execute(script, config, export, format, follow).await,
        Commands::Events {
            input,
            format,
            from,
        } => events::execute(input, format, from).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
