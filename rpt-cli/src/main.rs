//! Report Runner CLI Application
//!
//! Command-line front end for the rpt-reports library. It adds:
//! - Database files per source from config.toml or `--db`
//! - Single runs from the command line or a batch of `[[jobs]]`
//! - Text or JSON run summaries

use anyhow::{bail, Context, Result};
use clap::Parser;
use rpt_reports::{Param, ParamSet, RunOutcome, Runner};
use std::path::PathBuf;

mod config;
mod summary;

/// Report Runner - Run database reports into Excel workbooks
#[derive(Parser, Debug)]
#[command(name = "rpt")]
#[command(about = "Run parameterized database reports into Excel workbooks", long_about = None)]
#[command(version)]
struct Args {
    /// Report to run (see --list)
    #[arg(short, long, value_name = "NAME")]
    report: Option<String>,

    /// Report parameter as name=value (can be repeated)
    #[arg(short, long, value_name = "NAME=VALUE")]
    param: Vec<String>,

    /// Database file for a source as source=path (can be repeated)
    #[arg(long, value_name = "SOURCE=FILE")]
    db: Vec<String>,

    /// Output directory (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List available reports and exit
    #[arg(long)]
    list: bool,

    /// Print run outcomes as JSON
    #[arg(long)]
    json: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Report Runner CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using report library v{}", rpt_reports::VERSION);

    if args.list {
        summary::print_report_list();
        return Ok(());
    }

    let mut app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };
    if let Some(dir) = &args.output {
        app_config.output.output_dir = dir.clone();
    }

    let jobs = jobs(&args, &app_config)?;
    if jobs.is_empty() {
        println!("Report Runner - No report specified");
        println!("\nQuick Start:");
        println!("  rpt --list");
        println!("  rpt --db edb=edb.sqlite --report never_out --param enddate=03/31/2024");
        println!("\nFor batches:");
        println!("  rpt --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let mut sources = app_config.sources()?;
    for arg in &args.db {
        sources.push(config::parse_db_arg(arg)?);
    }
    let conns = config::open_connections(&sources)?;
    log::debug!("Connections: {:?}", conns);

    let runner = Runner::new(conns, app_config.output.clone());
    let outcomes: Vec<RunOutcome> = jobs
        .iter()
        .map(|(report, params)| runner.run(report, params))
        .collect();

    summary::print_outcomes(&outcomes, args.json)?;

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 {
        bail!("{} of {} report runs failed", failed, outcomes.len());
    }
    Ok(())
}

/// Runs requested on the command line, or the config file's batch
fn jobs(args: &Args, app_config: &config::AppConfig) -> Result<Vec<(String, ParamSet)>> {
    if let Some(report) = &args.report {
        let params = args
            .param
            .iter()
            .map(|raw| {
                raw.parse::<Param>()
                    .with_context(|| format!("Invalid --param: {}", raw))
            })
            .collect::<Result<ParamSet>>()?;
        return Ok(vec![(report.clone(), params)]);
    }

    if !args.param.is_empty() {
        bail!("--param requires --report");
    }

    app_config
        .jobs
        .iter()
        .map(|job| -> Result<(String, ParamSet)> {
            Ok((job.report.clone(), job.param_set()?))
        })
        .collect()
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
