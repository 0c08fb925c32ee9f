use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::process::ExitCode;
use whatarch::fs::{Environment, OsEnvironment, OsFileSystem, StaticEnvironment};

/// Detect the target architecture of Windows PE binaries
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path or bare file name of the binary to analyze
    path: String,

    /// Directories to search instead of PATH, separated like PATH
    #[arg(long)]
    search_path: Option<OsString>,

    /// Log decoding and resolution steps to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_module("whatarch", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    // One line on stderr: the error's own message, without its source chain.
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let env: Box<dyn Environment> = match args.search_path {
        Some(dirs) => Box::new(StaticEnvironment::new(Some(dirs))),
        None => Box::new(OsEnvironment),
    };

    let report = whatarch::inspect(&OsFileSystem, &*env, &args.path)?;
    println!("{report}");

    Ok(())
}
