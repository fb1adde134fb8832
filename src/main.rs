//! Mail-room batch CLI.
//!
//! Decides routes for everything in the shared inbox and prints the batch
//! report as JSON. Dry-run is the default; `--apply` performs the moves.

use std::path::PathBuf;
use std::process::ExitCode;

use mailroom::{BatchOptions, CommandDetector, Mailroom, RoutingConfig};

const USAGE: &str = "\
Usage: mailroom [OPTIONS]

Options:
  --root PATH    Mail-room root directory (default: $NAVI_ROOT or ./NAVI)
  --apply        Move files instead of dry-running
  --dry-run      Decide and write sidecars, move nothing
  --force        Allow --apply together with --dry-run (runs as dry-run)
  --limit N      Process at most N files
  --help         Show this help";

struct Args {
    root: Option<PathBuf>,
    apply: bool,
    dry_run: bool,
    force: bool,
    limit: Option<usize>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        root: None,
        apply: false,
        dry_run: false,
        force: false,
        limit: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--apply" => args.apply = true,
            "--dry-run" => args.dry_run = true,
            "--force" => args.force = true,
            "--root" => {
                let value = iter.next().ok_or("--root requires a path")?;
                args.root = Some(PathBuf::from(value));
            }
            "--limit" => {
                let value = iter.next().ok_or("--limit requires a number")?;
                args.limit = Some(parse_limit(&value)?);
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => {
                if let Some(value) = other.strip_prefix("--root=") {
                    args.root = Some(PathBuf::from(value));
                } else if let Some(value) = other.strip_prefix("--limit=") {
                    args.limit = Some(parse_limit(value)?);
                } else {
                    return Err(format!("Unknown argument: {other}"));
                }
            }
        }
    }
    Ok(args)
}

fn parse_limit(value: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid --limit value: {value}"))
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    // --apply --dry-run is a contradiction; --force resolves it as dry-run.
    if args.apply && args.dry_run && !args.force {
        eprintln!("--apply and --dry-run conflict; pass --force to run as dry-run");
        return ExitCode::from(2);
    }

    let pinned = args
        .root
        .or_else(|| std::env::var_os("NAVI_ROOT").map(PathBuf::from));
    let root = pinned.clone().unwrap_or_else(|| PathBuf::from("NAVI"));
    let config = RoutingConfig::load_or_default(&root.join("config/routing_config.json"));
    // A configured root only applies when the caller didn't pin one.
    let root = match (pinned, &config.navi_root) {
        (None, Some(configured)) => configured.clone(),
        _ => root,
    };

    let dry_run = if args.apply && args.dry_run {
        true
    } else if args.apply {
        false
    } else if args.dry_run {
        true
    } else {
        !config.enable_mailroom_routing
    };

    let detector = CommandDetector::from_command(&config.detector_command);
    let mut mailroom = Mailroom::new(&root, config);
    if let Some(detector) = detector {
        mailroom = mailroom.with_detector(Box::new(detector));
    }

    let options = BatchOptions {
        dry_run,
        limit: args.limit,
    };
    let report = match mailroom.run(options) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Batch failed: {e}");
            return ExitCode::from(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Failed to serialize batch report: {e}");
            return ExitCode::from(1);
        }
    }
    ExitCode::SUCCESS
}
