use std::path::PathBuf;

use blob_search::{Algorithm, InputMode, SearchError, SearchOptions, Strategy};
use clap::{Parser, ValueEnum};

const DEFAULT_BLOB_BASES: usize = 5_000_000;

#[derive(Debug, Parser)]
#[command(
	name = "blob-search",
	version,
	about = "Search sequence archives for a pattern, blob by blob, on many threads"
)]
pub struct Config {
	/// Pattern to look for
	pub pattern: String,

	/// Accessions to search; an existing file path is searched directly
	#[arg(required = true)]
	pub accessions: Vec<String>,

	/// Directory holding <ACCESSION>.fa / .fasta / .fq / .fastq[.gz] files
	#[arg(long, default_value = ".")]
	pub archive_dir: PathBuf,

	#[arg(long, value_enum, default_value_t = AlgorithmArg::Literal)]
	pub algorithm: AlgorithmArg,

	/// Minimum percent identity for --algorithm approximate
	#[arg(long, default_value_t = 90)]
	pub score: u8,

	#[arg(long, value_enum, default_value_t = StrategyArg::Blob)]
	pub strategy: StrategyArg,

	/// Worker threads (defaults to the number of CPUs)
	#[arg(long)]
	pub threads: Option<usize>,

	/// Bases packed into each blob
	#[arg(long, default_value_t = DEFAULT_BLOB_BASES)]
	pub blob_bases: usize,

	/// How archive files are read
	#[arg(long, value_enum, default_value_t = ModeArg::Stream)]
	pub mode: ModeArg,

	/// Stop after this many matches per accession
	#[arg(long)]
	pub max_matches: Option<usize>,

	#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Enable debug logging
	#[arg(short, long)]
	pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
	Literal,
	Approximate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
	Blob,
	Fragment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
	Mmap,
	Stream,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	Text,
	Tsv,
	Json,
}

impl Config {
	pub fn algorithm(&self) -> Algorithm {
		match self.algorithm {
			AlgorithmArg::Literal => Algorithm::Literal,
			AlgorithmArg::Approximate => Algorithm::Approximate { score: self.score },
		}
	}

	pub fn strategy(&self) -> Strategy {
		match self.strategy {
			StrategyArg::Blob => Strategy::Blob,
			StrategyArg::Fragment => Strategy::Fragment,
		}
	}

	pub fn input_mode(&self) -> InputMode {
		match self.mode {
			ModeArg::Mmap => InputMode::Mmap,
			ModeArg::Stream => InputMode::Stream,
		}
	}

	/// Rejects settings that would only fail once workers are running.
	pub fn search_options(&self) -> Result<SearchOptions, SearchError> {
		let threads = self.threads.unwrap_or_else(num_cpus::get);
		if threads == 0 {
			return Err(SearchError::Initialization("--threads must be > 0".to_string()));
		}
		if self.blob_bases == 0 {
			return Err(SearchError::Initialization("--blob-bases must be > 0".to_string()));
		}
		if self.algorithm == AlgorithmArg::Approximate && !(1..=100).contains(&self.score) {
			return Err(SearchError::Initialization(
				"--score must be between 1 and 100".to_string(),
			));
		}
		Ok(SearchOptions {
			threads,
			max_matches: self.max_matches,
		})
	}
}
