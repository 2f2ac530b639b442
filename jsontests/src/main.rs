use anyhow::{bail, ensure};
use clap::{ArgAction, Parser, Subcommand};
use homestead_evm_jsontests::error::SourcePathError;
use homestead_evm_jsontests::run::{fixture_files, run_file};
use std::path::{Path, PathBuf};

///  JSON state-test CLI tool
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
pub struct Cli {
	/// Verbosity, repeat for more (`-v` debug, `-vv` trace)
	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,

	/// Print failed tests only
	#[arg(short = 'f')]
	failed_only: bool,

	#[command(subcommand)]
	commands: Commands,
}

/// Subcommand for CLI
#[derive(Debug, Subcommand)]
enum Commands {
	/// Run State tests
	#[command(arg_required_else_help = true)]
	State {
		/// Set of json file or directory paths for State test
		#[arg(required = true)]
		path: Vec<PathBuf>,
	},
}

/// Check source path - is it exist
fn check_source_path(paths: &[PathBuf]) -> anyhow::Result<()> {
	for src in paths {
		let path = Path::new(&src);
		ensure!(
			path.exists(),
			SourcePathError::SourceTestsNotFound(src.clone())
		);
	}
	Ok(())
}

fn init_logger(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "debug",
		_ => "trace",
	};
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> anyhow::Result<()> {
	let args = Cli::parse();
	init_logger(args.verbose);

	let Commands::State { path } = &args.commands;
	check_source_path(path)?;

	let mut passed = 0usize;
	let mut failed = 0usize;
	for src in path {
		for file in fixture_files(src)? {
			for (name, outcome) in run_file(&file)? {
				match outcome {
					Ok(()) => {
						passed += 1;
						if !args.failed_only {
							println!("PASS {}::{name}", file.display());
						}
					}
					Err(e) => {
						failed += 1;
						println!("FAIL {}::{name}: {e}", file.display());
					}
				}
			}
		}
	}

	println!("{passed} passed, {failed} failed");
	if failed > 0 {
		bail!("{failed} state tests failed");
	}
	Ok(())
}
