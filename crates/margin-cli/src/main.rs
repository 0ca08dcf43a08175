//! `margin` command-line tool

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use margin_highlight::MarginConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

fn cli() -> Command {
    Command::new("margin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Excerpt fingerprinting, page location and rewrite reconciliation")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("fingerprint")
                .about("Print the cache fingerprint of an excerpt")
                .arg(Arg::new("text").required(true).help("Excerpt text")),
        )
        .subcommand(
            Command::new("locate")
                .about("Find the page an excerpt comes from")
                .arg(
                    Arg::new("document")
                        .long("document")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Page snapshot JSON ({numPages, pages}); '-' for stdin"),
                )
                .arg(
                    Arg::new("excerpt")
                        .long("excerpt")
                        .required(true)
                        .help("Excerpt text"),
                )
                .arg(
                    Arg::new("rank")
                        .long("rank")
                        .action(ArgAction::SetTrue)
                        .help("Print every matching page with its score as JSON"),
                ),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Apply accept/reject decisions to suggested-edit segments")
                .arg(
                    Arg::new("segments")
                        .long("segments")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Segment list JSON ([{op, orig, suggested}]); '-' for stdin"),
                )
                .arg(
                    Arg::new("accept")
                        .long("accept")
                        .value_delimiter(',')
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(usize))
                        .help("Segment indices to accept"),
                )
                .arg(
                    Arg::new("reject")
                        .long("reject")
                        .value_delimiter(',')
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(usize))
                        .help("Segment indices to reject"),
                )
                .arg(
                    Arg::new("accept-all")
                        .long("accept-all")
                        .action(ArgAction::SetTrue)
                        .help("Accept every segment before applying --reject"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> Result<MarginConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => MarginConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(MarginConfig::default()),
    }
}

fn init_tracing(config: &MarginConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter.as_deref().unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn indices(args: &ArgMatches, id: &str) -> Vec<usize> {
    args.get_many::<usize>(id)
        .map(|values| values.copied().collect())
        .unwrap_or_default()
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    init_tracing(&config);

    let output = match matches.subcommand() {
        Some(("fingerprint", args)) => {
            let text = args.get_one::<String>("text").context("missing text")?;
            commands::fingerprint(text)
        }
        Some(("locate", args)) => {
            let document = args.get_one::<PathBuf>("document").context("missing document")?;
            let excerpt = args.get_one::<String>("excerpt").context("missing excerpt")?;
            let document_json = commands::read_input(document)?;
            commands::locate(&document_json, excerpt, args.get_flag("rank"), &config)?
        }
        Some(("reconcile", args)) => {
            let segments = args.get_one::<PathBuf>("segments").context("missing segments")?;
            let segments_json = commands::read_input(segments)?;
            let decisions = commands::DecisionArgs {
                accept: indices(args, "accept"),
                reject: indices(args, "reject"),
                accept_all: args.get_flag("accept-all"),
                json: args.get_flag("json"),
            };
            commands::reconcile(&segments_json, &decisions)?
        }
        _ => unreachable!("subcommand_required"),
    };

    println!("{output}");
    Ok(())
}
