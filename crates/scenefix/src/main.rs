//! scenefix - strip legacy shaders from a glTF 1.0 scene and bind the
//! texture files sitting next to it.
//!
//! Usage: scenefix [OPTIONS] <file.gltf>

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::LevelFilter;
use scenefix_core::{process_file, FileCommandInspector, HeaderInspector, ProcessOptions};

const USAGE: &str = "\
Usage: scenefix [OPTIONS] <file.gltf>

Rewrites the document in place: removes shaders, programs and techniques,
then binds <material>_<role>.<ext> files from the document's directory.

Options:
  --inspector <header|file>  How texture formats are detected (default: header)
  -v, --verbose              Log every decision
  -q, --quiet                Only log warnings and errors
  -h, --help                 Show this help";

/// How texture files are classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InspectorKind {
    /// In-process header parsing
    Header,
    /// The system `file` command
    FileCommand,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    path: PathBuf,
    inspector: InspectorKind,
    log_level: LevelFilter,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(Args),
    Help,
}

fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut path = None;
    let mut inspector = InspectorKind::Header;
    let mut log_level = LevelFilter::Info;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--verbose" => log_level = LevelFilter::Debug,
            "-q" | "--quiet" => log_level = LevelFilter::Warn,
            "--inspector" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--inspector needs a value".to_string())?;
                inspector = match value.as_str() {
                    "header" => InspectorKind::Header,
                    "file" => InspectorKind::FileCommand,
                    other => return Err(format!("Unknown inspector: {other}")),
                };
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("Unknown option: {flag}"));
            }
            _ if path.is_some() => return Err(format!("Unexpected argument: {arg}")),
            _ => path = Some(PathBuf::from(&arg)),
        }
    }

    let path = path.ok_or_else(|| "Missing required argument <file.gltf>".to_string())?;
    Ok(Command::Run(Args {
        path,
        inspector,
        log_level,
    }))
}

fn run(args: &Args) -> Result<()> {
    let options = match args.inspector {
        InspectorKind::Header => ProcessOptions::default().with_inspector(HeaderInspector),
        InspectorKind::FileCommand => {
            ProcessOptions::default().with_inspector(FileCommandInspector::new())
        }
    };

    log::info!("Processing {}", args.path.display());

    let report = process_file(&args.path, &options)
        .with_context(|| format!("Failed to process {}", args.path.display()))?;

    if report.is_unchanged() {
        log::info!("Nothing to do");
    } else {
        log::info!("Done: {report}");
    }

    Ok(())
}

fn main() -> ExitCode {
    let command = match parse_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let args = match command {
        Command::Help => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Command::Run(args) => args,
    };

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
