mod app;
mod config;
mod data;
mod error;
mod state;
mod stats;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use app::Explorer;
use config::ExplorerConfig;
use data::filter::FilterSelection;
use data::model::City;
use ui::prompt::Terminal;

#[derive(Parser)]
#[command(
    name = "bikeshare-explorer",
    about = "Explore US bikeshare trip data for Chicago, New York City and Washington",
    version
)]
struct Cli {
    /// Path to a JSON config file mapping cities to data files
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the city data files (overrides the config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Run once for this city instead of prompting; --month, --day,
    /// --preview and --json only apply together with it
    #[arg(long)]
    city: Option<City>,

    /// Month filter: all, january .. june
    #[arg(long, default_value = "all")]
    month: String,

    /// Day filter: all, monday .. sunday
    #[arg(long, default_value = "all")]
    day: String,

    /// Print the first N filtered rows before the reports
    #[arg(long)]
    preview: Option<usize>,

    /// Emit the reports as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = match &cli.config {
        Some(path) => ExplorerConfig::load_from(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    log::debug!("Using config {config:?}");

    let mut stdout = std::io::stdout();
    let mut explorer = Explorer::new(config, &mut stdout);

    match cli.city {
        Some(city) => {
            let selection = FilterSelection::parse(&cli.month, &cli.day)?;
            explorer.run_once(city, selection, cli.preview, cli.json)
        }
        None => {
            let mut terminal = Terminal::new()?;
            explorer.run_interactive(&mut terminal)
        }
    }
}
