//! PortProbe CLI - Find and stop the process behind a TCP port
//!
//! A command-line tool for checking ports, listing listeners,
//! suggesting free ports and killing the processes that hold them.

mod commands;
mod output;
mod prompt;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portprobe")]
#[command(author, version, about = "Find and stop the process behind a TCP port")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan common development ports
    Scan,

    /// Check if a specific port is in use
    Check {
        /// Port number to check
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
    },

    /// Detailed port information
    Info {
        /// Port number
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
    },

    /// List all listening ports
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Filter by process name, PID or user
        #[arg(short = 'n', long)]
        name: Option<String>,
    },

    /// Suggest free ports
    Suggest {
        /// Number of ports to suggest
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u16).range(1..=20))]
        count: Option<u16>,

        /// First port of the range to search
        #[arg(long, requires = "to", value_parser = clap::value_parser!(u16).range(1..))]
        from: Option<u16>,

        /// Last port of the range to search
        #[arg(long, requires = "from", value_parser = clap::value_parser!(u16).range(1..))]
        to: Option<u16>,
    },

    /// Kill the process using a port
    Kill {
        /// Port number
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,

        /// Force kill (SIGKILL) without graceful shutdown
        #[arg(short, long)]
        force: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive port conflict resolution
    Fix {
        /// Port number
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
    },

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Replace the ports checked by `scan`
    Ports {
        #[arg(required = true, value_delimiter = ',', value_parser = clap::value_parser!(u16).range(1..))]
        ports: Vec<u16>,
    },
    /// Replace the ranges searched by `suggest` (e.g. 3000-3999)
    Ranges {
        #[arg(required = true, value_delimiter = ',')]
        ranges: Vec<String>,
    },
    /// Set how many ports `suggest` returns by default
    Count {
        #[arg(value_parser = clap::value_parser!(u16).range(1..=20))]
        count: u16,
    },
    /// Restore the defaults
    Reset,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan => commands::scan::run(cli.json)?,
        Commands::Check { port } => commands::check::run(port, cli.json)?,
        Commands::Info { port } => commands::check::info(port, cli.json)?,
        Commands::List { port, name } => commands::list::run(port, name, cli.json)?,
        Commands::Suggest { count, from, to } => {
            commands::suggest::run(count, from.zip(to), cli.json)?
        }
        Commands::Kill { port, force, yes } => commands::kill::run(port, force, yes)?,
        Commands::Fix { port } => commands::fix::run(port)?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config::show(cli.json)?,
            ConfigAction::Ports { ports } => commands::config::set_ports(ports)?,
            ConfigAction::Ranges { ranges } => commands::config::set_ranges(&ranges)?,
            ConfigAction::Count { count } => commands::config::set_count(count.into())?,
            ConfigAction::Reset => commands::config::reset()?,
        },
    }

    Ok(())
}
