use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use vpn_menu::config::LOCAL_CONFIG_FILE;
use vpn_menu::menu::LinePrompter;
use vpn_menu::{Config, MenuController, NmcliBackend};

#[derive(Parser)]
#[command(name = "vpn-menu")]
#[command(about = "Interactive menu for managing NetworkManager VPN profiles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ./vpn-menu.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate default config file
    Init,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr at WARN by default so they stay out of the menu
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(Commands::Init) = cli.command {
        info!("Generating default config...");
        let path = PathBuf::from(LOCAL_CONFIG_FILE);
        Config::default().save(&path)?;
        println!("Created default config: {}", LOCAL_CONFIG_FILE);
        return Ok(());
    }

    let config = Config::discover(cli.config.as_deref())?;
    let backend = NmcliBackend::new(&config.backend);
    let mut menu = MenuController::new(
        backend,
        LinePrompter::stdio(),
        config.menu.capabilities(),
    );

    // A broken terminal ends the program; backend failures never get here
    if let Err(e) = menu.run() {
        error!("Menu failed: {}", e);
        println!("Error: {}", e);
    }

    Ok(())
}
