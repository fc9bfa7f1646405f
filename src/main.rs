use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

use refscope::asset::{AssetIdentifier, LinkDirection, QueryAdapter, SnapshotIndex};
use refscope::config::ExplorerConfig;
use refscope::explorer::{Explorer, RebuildOutcome};
use refscope::export::listing::reference_listing;
use refscope::export::{export, ExportData, ExportFormat};
use refscope::graph::Point;
use refscope::ui::{run_app, App};

#[derive(Parser)]
#[command(name = "refscope")]
#[command(version)]
#[command(about = "Terminal UI asset reference explorer with radial graph layout", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Referencers,
    Dependencies,
}

impl From<Direction> for LinkDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Referencers => LinkDirection::Referencers,
            Direction::Dependencies => LinkDirection::Dependencies,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the reference graph of an asset and export it
    Explore {
        /// Asset index snapshot (JSON)
        #[arg(short, long)]
        index: PathBuf,

        /// Asset to explore, e.g. /Game/Props/Crate or /Game/Props/Crate.Crate
        #[arg(short, long)]
        root: AssetIdentifier,

        /// Explorer configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format: json, csv or markdown
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Position of the root node
        #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
        origin: Option<Vec<f64>>,
    },
    /// Browse the referencers of an asset interactively
    Tui {
        /// Asset index snapshot (JSON)
        #[arg(short, long)]
        index: PathBuf,

        /// Asset to explore
        #[arg(short, long)]
        root: AssetIdentifier,

        /// Explorer configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the hard and soft links of packages
    List {
        /// Asset index snapshot (JSON)
        #[arg(short, long)]
        index: PathBuf,

        /// Which side of the links to list
        #[arg(short, long, value_enum, default_value = "referencers")]
        direction: Direction,

        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Explore {
            index,
            root,
            config,
            format,
            output,
            origin,
        }) => {
            let index = load_index(&index)?;
            let mut explorer = create_explorer(&index, config.as_deref())?;
            if let Some([x, y]) = origin.as_deref() {
                explorer.set_origin(Point::new(*x, *y));
            }
            build_graph(&mut explorer, &index, root)?;

            let data = ExportData::from_graph(
                explorer.graph(),
                &explorer.config().style,
                explorer.status_text(),
            );
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    let mut writer = BufWriter::new(file);
                    export(format, &data, &mut writer)?;
                    writer.flush()?;
                    info!("wrote {} export to {}", format, path.display());
                }
                None => export(format, &data, &mut io::stdout().lock())?,
            }
        }
        Some(Commands::Tui {
            index,
            root,
            config,
        }) => {
            let index = load_index(&index)?;
            let mut explorer = create_explorer(&index, config.as_deref())?;
            build_graph(&mut explorer, &index, root)?;
            run_tui(App::new(explorer, &index))?;
        }
        Some(Commands::List {
            index,
            direction,
            packages,
        }) => {
            let index = load_index(&index)?;
            let listing = reference_listing(&QueryAdapter::new(&index), &packages, direction.into())
                .context("failed to query the asset index")?;
            print!("{}", listing);
        }
        Some(Commands::Version) => {
            println!("refscope v{}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            println!("refscope - Asset Reference Explorer");
            println!("Run 'refscope tui --index <FILE> --root <ASSET>' to browse referencers");
            println!("Run 'refscope --help' for more information");
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_index(path: &Path) -> Result<SnapshotIndex> {
    let index = SnapshotIndex::load(path)
        .with_context(|| format!("failed to load asset index {}", path.display()))?;
    info!("loaded {} packages from {}", index.package_count(), path.display());
    Ok(index)
}

fn create_explorer(index: &SnapshotIndex, config: Option<&Path>) -> Result<Explorer> {
    let config = match config {
        Some(path) => ExplorerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExplorerConfig::default(),
    };
    Ok(Explorer::new(config).with_back_references(Box::new(index.field_registry().clone())))
}

fn build_graph(explorer: &mut Explorer, index: &SnapshotIndex, root: AssetIdentifier) -> Result<()> {
    match explorer.set_root(index, root) {
        RebuildOutcome::Built(_) => Ok(()),
        // A snapshot never finishes loading later, so there is nothing to wait for
        RebuildOutcome::Deferred => bail!("{}", explorer.status_text()),
        RebuildOutcome::NoRoot => bail!("no root asset to explore"),
    }
}

fn run_tui(mut app: App<'_, SnapshotIndex>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.context("terminal UI failed")
}
