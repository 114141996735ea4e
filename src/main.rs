// Entry point: parse flags, load configuration, generate one report.
//
// Every data-side failure (bad year label, unreachable store, empty result)
// is reported on stderr and the process still exits cleanly; only bad
// command-line usage or an unreadable config file exits nonzero.
mod config;
mod error;
mod header;
mod loader;
mod output;
mod period;
mod reports;
mod types;
mod util;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use config::ReportConfig;
use reports::{ReportOutcome, ReportRequest};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};
use types::Orientation;

fn cli() -> Command {
    Command::new("crop_report")
        .version(clap::crate_version!())
        .about("Generate a crop yield forecast report (.docx) for a season and year")
        .arg(
            Arg::new("template")
                .short('t')
                .long("template")
                .help("Template input path (accepted but not used)")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output .docx file name")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .help("Page orientation")
                .value_parser(["LANDSCAPE", "PORTRAIT"])
                .default_value("PORTRAIT"),
        )
        .arg(
            Arg::new("logo")
                .short('l')
                .long("logo")
                .help("Path to logo image")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("year")
                .short('y')
                .long("year")
                .help("Prediction year, e.g. '2025-2026' or '2025-26'")
                .required(true)
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("season")
                .short('s')
                .long("season")
                .help("Season for the report, e.g. 'Kharif', 'Rabi', 'Zaid'")
                .required(true)
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a JSON report configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .help("Store path. Overrides store.path in the configuration file.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("preview")
                .long("preview")
                .help("Also print every crop table to stdout as Markdown")
                .action(ArgAction::SetTrue),
        )
}

fn load_config(matches: &ArgMatches) -> Result<ReportConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ReportConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(db) = matches.get_one::<PathBuf>("database") {
        config.store.path = db.clone();
    }
    Ok(config)
}

fn request_from(matches: &ArgMatches) -> Result<ReportRequest> {
    let orientation: Orientation = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("PORTRAIT")
        .parse()
        .map_err(anyhow::Error::msg)?;
    let required = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .cloned()
            .with_context(|| format!("missing --{}", name))
    };
    let required_path = |name: &str| -> Result<PathBuf> {
        matches
            .get_one::<PathBuf>(name)
            .cloned()
            .with_context(|| format!("missing --{}", name))
    };
    Ok(ReportRequest {
        output: required_path("output")?,
        orientation,
        logo: required_path("logo")?,
        period: required("year")?,
        season: required("season")?,
        preview: matches.get_flag("preview"),
    })
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    if let Some(template) = matches.get_one::<PathBuf>("template") {
        debug!(template = %template.display(), "template path is not used");
    }

    let config = load_config(&matches)?;
    let request = request_from(&matches)?;
    info!(
        period = %request.period,
        season = %request.season,
        store = %config.store.path.display(),
        "generating report"
    );

    match reports::create_report(&request, &config) {
        ReportOutcome::Written { path, crops } => {
            println!("Report generated successfully -> {} ({} crops)", path.display(), crops);
        }
        ReportOutcome::Aborted { reason } => {
            eprintln!("Report generation aborted: {}", reason);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ArgMatches {
        cli().try_get_matches_from(args).unwrap()
    }

    const BASE: [&str; 11] = [
        "crop_report", "-t", "tpl.docx", "-o", "out.docx", "-l", "logo.png", "-y", "2024-25", "-s",
        "Kharif",
    ];

    #[test]
    fn orientation_defaults_to_portrait() {
        let request = request_from(&parse(&BASE)).unwrap();
        assert_eq!(request.orientation, Orientation::Portrait);
        assert_eq!(request.period, "2024-25");
        assert!(!request.preview);
    }

    #[test]
    fn landscape_flag_is_honoured() {
        let mut args = BASE.to_vec();
        args.extend(["-f", "LANDSCAPE", "--preview"]);
        let request = request_from(&parse(&args)).unwrap();
        assert_eq!(request.orientation, Orientation::Landscape);
        assert!(request.preview);
    }

    #[test]
    fn unknown_orientation_is_usage_error() {
        let mut args = BASE.to_vec();
        args.extend(["-f", "SIDEWAYS"]);
        assert!(cli().try_get_matches_from(args).is_err());
    }

    #[test]
    fn missing_required_flag_is_usage_error() {
        let args: Vec<&str> = BASE.iter().copied().filter(|a| *a != "-s" && *a != "Kharif").collect();
        assert!(cli().try_get_matches_from(args).is_err());
    }

    #[test]
    fn database_flag_overrides_config() {
        let mut args = BASE.to_vec();
        args.extend(["--database", "other.db"]);
        let config = load_config(&parse(&args)).unwrap();
        assert_eq!(config.store.path, PathBuf::from("other.db"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }
}
