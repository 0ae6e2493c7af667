//! xvulcan CLI - Command-line interface
//!
//! This binary provides a command-line interface to the xvulcan library:
//! job submission, imagery search, assessment runs and the standalone tile,
//! mosaic and footprint tools.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use commands::common::AreaArgs;
use commands::config::ConfigCommands;
use commands::footprints::FootprintArgs;
use commands::mosaic::MosaicArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "xvulcan")]
#[command(version = xvulcan::VERSION)]
#[command(about = "Building damage assessment from satellite imagery", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the slippy-map tiles covering an area
    Tiles {
        #[command(flatten)]
        area: AreaArgs,

        /// Zoom level (0-22)
        #[arg(long, default_value = "18")]
        zoom: u8,

        /// Print every tile, not just the range
        #[arg(long)]
        list: bool,
    },

    /// Fetch an area from a tile server and write a GeoTIFF mosaic
    Mosaic {
        #[command(flatten)]
        area: AreaArgs,

        /// Tile URL with {z}, {x}, {y} and optional {s} placeholders
        #[arg(long)]
        template: String,

        /// Subdomains substituted for {s}
        #[arg(long, value_delimiter = ',')]
        subdomains: Vec<String>,

        /// Zoom level (defaults to imagery.zoom from the config)
        #[arg(long)]
        zoom: Option<u8>,

        /// Concurrent tile workers (defaults to imagery.workers from the config)
        #[arg(long)]
        workers: Option<usize>,

        /// Output GeoTIFF path (.tif)
        #[arg(long)]
        output: String,
    },

    /// Fetch OpenStreetMap building footprints for an area
    Footprints {
        #[command(flatten)]
        area: AreaArgs,

        /// Tag predicates, e.g. building or building,amenity=hospital
        #[arg(long)]
        tags: Option<String>,

        /// Overpass interpreter URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Output GeoJSON path (.geojson)
        #[arg(long)]
        output: String,
    },

    /// Register a new assessment job and print its id
    Submit {
        #[command(flatten)]
        area: AreaArgs,
    },

    /// Search provider imagery for a job
    Search {
        /// Job id
        job: String,

        /// End of the search window (RFC 3339, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Select pre/post imagery and run the assessment
    Launch {
        /// Job id
        job: String,

        /// Pre-event image id
        #[arg(long)]
        pre: String,

        /// Post-event image id
        #[arg(long)]
        post: String,

        /// Tile zoom for tile-server imagery (defaults to imagery.zoom)
        #[arg(long)]
        zoom: Option<u8>,
    },

    /// Show a job, or list all jobs
    Status {
        /// Job id
        job: Option<String>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        e.exit();
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Tiles { area, zoom, list } => {
            let _runner = start("tiles")?;
            commands::tiles::run(area, zoom, list)
        }
        Commands::Mosaic {
            area,
            template,
            subdomains,
            zoom,
            workers,
            output,
        } => {
            let runner = start("mosaic")?;
            let args = MosaicArgs {
                area,
                template,
                subdomains,
                zoom,
                workers,
                output,
            };
            commands::mosaic::run(&runner, args).await
        }
        Commands::Footprints {
            area,
            tags,
            endpoint,
            output,
        } => {
            let runner = start("footprints")?;
            let args = FootprintArgs {
                area,
                tags,
                endpoint,
                output,
            };
            commands::footprints::run(&runner, args).await
        }
        Commands::Submit { area } => {
            let runner = start("submit")?;
            commands::jobs::run_submit(&runner, area)
        }
        Commands::Search { job, date } => {
            let runner = start("search")?;
            commands::jobs::run_search(&runner, &job, date.as_deref()).await
        }
        Commands::Launch {
            job,
            pre,
            post,
            zoom,
        } => {
            let runner = start("launch")?;
            commands::jobs::run_launch(&runner, &job, pre, post, zoom).await
        }
        Commands::Status { job } => {
            let runner = start("status")?;
            commands::jobs::run_status(&runner, job.as_deref())
        }
        Commands::Config { command } => commands::config::run(command),
    }
}

/// Load config, start logging and record which command is running.
fn start(command: &str) -> Result<CliRunner, CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup(command);
    Ok(runner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let cli = Cli::try_parse_from(["xvulcan", "submit", "-43.2", "-22.9", "-43.1", "-22.8"])
            .unwrap();
        match cli.command {
            Commands::Submit { area } => {
                assert_eq!(area.start(), (-43.2, -22.9));
                assert_eq!(area.end(), (-43.1, -22.8));
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn test_mosaic_subdomains_split() {
        let cli = Cli::try_parse_from([
            "xvulcan",
            "mosaic",
            "30.496",
            "50.450",
            "30.513",
            "50.457",
            "--template",
            "https://{s}.tiles.example/{z}/{x}/{y}.png",
            "--subdomains",
            "a,b,c",
            "--output",
            "kyiv.tif",
        ])
        .unwrap();
        match cli.command {
            Commands::Mosaic { subdomains, .. } => assert_eq!(subdomains, ["a", "b", "c"]),
            _ => panic!("expected mosaic"),
        }
    }
}
