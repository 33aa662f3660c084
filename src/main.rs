use std::io::Read;
use std::path::PathBuf;
use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use flowdraft::config::load_config;
use flowdraft::graph_layout::Viewport;
use flowdraft::{FlowError, Format};

#[derive(Debug, Parser)]
#[command(
    name = "flowdraft",
    about = "Convert flowcharts between Mermaid-style text and JSON projects"
)]
struct Cli {
    /// Input file (reads from stdin if not provided)
    file: Option<PathBuf>,

    /// Input format (guessed from the extension or content if not provided)
    #[arg(long, value_enum)]
    from: Option<Format>,

    /// Output format (defaults to the other format)
    #[arg(long, value_enum)]
    to: Option<Format>,

    /// Re-run the layered layout before writing
    #[arg(long)]
    layout: bool,

    /// Layout viewport as WIDTHxHEIGHT, e.g. 1024x768
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Viewport>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .ok()
            .filter(|n| n.is_finite() && *n > 0.0)
            .ok_or_else(|| format!("invalid viewport dimension `{v}`"))
    };
    Ok(Viewport {
        width: parse(width)?,
        height: parse(height)?,
    })
}

fn read_input(file: Option<&PathBuf>) -> Result<String, FlowError> {
    match file {
        Some(path) => {
            info!(path = path.display().to_string(); "Reading input file");
            Ok(std::fs::read_to_string(path)?)
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run(cli: &Cli) -> Result<String, FlowError> {
    let mut config = load_config(cli.config.as_ref())?;
    if let Some(viewport) = cli.viewport {
        config.viewport = viewport;
    }

    let input = read_input(cli.file.as_ref())?;
    let from = cli
        .from
        .or_else(|| cli.file.as_deref().and_then(Format::from_path))
        .unwrap_or_else(|| Format::sniff(&input));
    let to = cli.to.unwrap_or(from.other());
    debug!(from:?, to:?; "Converting");

    flowdraft::convert_with_config(&input, from, to, cli.layout, &config)
}

fn main() {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", cli.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(cli:?; "Parsed arguments");

    match run(&cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!(err:% = e; "Conversion failed");
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    }
}
