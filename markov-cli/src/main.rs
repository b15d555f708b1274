use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use markov_core::Chain;
use markov_text::corpus::{ingest_text, load_chain};
use markov_text::{SplitMode, Tokenizer};
use rand::SeedableRng;
use rand::rngs::StdRng;

const DEMO_ORDER: usize = 1;
const DEMO_COUNT: usize = 50;
const DEMO_TEXTS: [&str; 2] = [
	"I am not a number! I am a free man!",
	"They are the eggmen. I am the walrus.",
];

#[derive(Parser, Debug)]
#[command(author, version, about = "Markov chain text generator", long_about = None)]
struct Cli {
	/// Increase verbosity (-v, -vv)
	#[arg(short = 'v', long, global = true, action = ArgAction::Count)]
	verbose: u8,

	/// Decrease verbosity (-q)
	#[arg(short = 'q', long, global = true, action = ArgAction::Count)]
	quiet: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Learn from text files and print generated tokens
	Generate(GenerateArgs),
	/// Learn from two built-in sentences and print what comes out
	Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
	/// Number of preceding tokens used as context
	order: usize,

	/// Number of tokens to generate
	count: usize,

	/// How to split the input: word, char or boundary
	mode: SplitMode,

	/// Text files to learn from, each one a separate sequence
	#[arg(required = true)]
	files: Vec<PathBuf>,

	/// Seed for a reproducible run
	#[arg(long, value_name = "SEED")]
	seed: Option<u64>,

	/// Separator printed between tokens (defaults to the mode's)
	#[arg(long, value_name = "TEXT")]
	delimiter: Option<String>,
}

#[derive(Args, Debug)]
struct DemoArgs {
	/// Seed for a reproducible run
	#[arg(long, value_name = "SEED")]
	seed: Option<u64>,
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	let stdout = io::stdout();
	let mut out = BufWriter::new(stdout.lock());
	match cli.command {
		Commands::Generate(args) => run_generate(args, &mut out)?,
		Commands::Demo(args) => run_demo(args, &mut out)?,
	}
	out.flush()?;
	Ok(())
}

fn init_logging(verbose: u8, quiet: u8) {
	use log::LevelFilter;

	let level = if quiet > 0 {
		LevelFilter::Error
	} else {
		match verbose {
			0 => LevelFilter::Warn,
			1 => LevelFilter::Info,
			2 => LevelFilter::Debug,
			_ => LevelFilter::Trace,
		}
	};

	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
	builder.filter_level(level);
	let _ = builder.try_init();
}

fn make_rng(seed: Option<u64>) -> StdRng {
	match seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	}
}

fn run_generate<W: Write>(args: GenerateArgs, out: &mut W) -> Result<()> {
	let tokenizer = Tokenizer::new(args.mode)?;
	let chain = load_chain(args.order, &args.files, &tokenizer)
		.with_context(|| format!("failed to build an order-{} chain", args.order))?;

	let delimiter = args.delimiter.as_deref().unwrap_or(args.mode.delimiter());
	write_generated(&chain, args.count, delimiter, make_rng(args.seed), out)
}

fn run_demo<W: Write>(args: DemoArgs, out: &mut W) -> Result<()> {
	let tokenizer = Tokenizer::new(SplitMode::Boundary)?;
	let mut chain = Chain::new(DEMO_ORDER, String::new())?;
	let mut rng = make_rng(args.seed);

	for text in DEMO_TEXTS {
		writeln!(out, "Input: {text}")?;
		let count = ingest_text(&mut chain, &tokenizer, text)?;
		info!("demo ingested {count} tokens");

		writeln!(out, "Generated:")?;
		write_generated(&chain, DEMO_COUNT, SplitMode::Boundary.delimiter(), &mut rng, out)?;
	}
	Ok(())
}

/// Writes `count` tokens from `chain` on one line.
fn write_generated<W: Write, R: rand::Rng>(
	chain: &Chain<String>,
	count: usize,
	delimiter: &str,
	rng: R,
	out: &mut W,
) -> Result<()> {
	let generator = chain.stream(rng).context("nothing to generate from")?;
	for (i, token) in generator.take(count).enumerate() {
		if i > 0 {
			out.write_all(delimiter.as_bytes())?;
		}
		out.write_all(token?.as_bytes())?;
	}
	writeln!(out)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::env;
	use std::fs;
	use std::process;

	fn output_of(run: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
		let mut out = Vec::new();
		run(&mut out).unwrap();
		String::from_utf8(out).unwrap()
	}

	fn generate_args(line: &[&str]) -> GenerateArgs {
		let argv = ["markov", "generate"].iter().chain(line);
		match Cli::try_parse_from(argv).unwrap().command {
			Commands::Generate(args) => args,
			other => panic!("unexpected command {other:?}"),
		}
	}

	#[test]
	fn parses_positional_arguments() {
		let args = generate_args(&["3", "50", "char", "a.txt", "b.txt", "--seed", "7"]);
		assert_eq!(args.order, 3);
		assert_eq!(args.count, 50);
		assert_eq!(args.mode, SplitMode::Char);
		assert_eq!(args.files.len(), 2);
		assert_eq!(args.seed, Some(7));
	}

	#[test]
	fn rejects_unknown_mode_and_missing_files() {
		assert!(Cli::try_parse_from(["markov", "generate", "1", "5", "line", "a.txt"]).is_err());
		assert!(Cli::try_parse_from(["markov", "generate", "1", "5", "word"]).is_err());
	}

	#[test]
	fn generates_from_files() {
		let dir = env::temp_dir().join(format!("markov-cli-{}", process::id()));
		fs::create_dir_all(&dir).unwrap();
		let path = dir.join("single.txt");
		fs::write(&path, "alpha beta gamma").unwrap();
		let path = path.to_string_lossy().to_string();

		// A single sequence leaves only one path through the chain.
		let args = generate_args(&["1", "7", "word", &path, "--seed", "1"]);
		let text = output_of(|out| run_generate(args, out));
		assert_eq!(text, "alpha beta gamma alpha beta gamma alpha\n");

		let args = generate_args(&["2", "3", "word", &path, "--delimiter", ","]);
		let text = output_of(|out| run_generate(args, out));
		assert_eq!(text, "alpha,beta,gamma\n");
	}

	#[test]
	fn demo_is_reproducible_with_a_seed() {
		let first = output_of(|out| run_demo(DemoArgs { seed: Some(11) }, out));
		let second = output_of(|out| run_demo(DemoArgs { seed: Some(11) }, out));
		assert_eq!(first, second);
		assert!(first.starts_with("Input: I am not a number!"));
		assert_eq!(first.lines().count(), 6);
	}
}
