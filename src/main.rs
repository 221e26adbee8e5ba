mod config;

use std::io::{self, BufWriter, Write};

use anyhow::Context;
use blob_search::{DirectoryArchive, Match, SearchPool};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Config, OutputFormat};

fn main() {
	if let Err(err) = run() {
		eprintln!("Error: {err:#}");
		std::process::exit(1);
	}
}

fn run() -> anyhow::Result<()> {
	let config = Config::parse();
	init_logging(config.verbose);

	let pool = SearchPool::new(config.search_options()?)?;
	let factory = config.algorithm().factory(&config.pattern)?;
	let opener = DirectoryArchive::new(&config.archive_dir, config.blob_bases, config.input_mode());

	let stdout = io::stdout();
	let mut sink = MatchSink::new(config.format, BufWriter::with_capacity(1 << 20, stdout.lock()))?;
	let mut total = 0usize;
	for accession in &config.accessions {
		let iterator = config
			.strategy()
			.iterator(factory.clone(), &opener, accession)
			.with_context(|| format!("cannot search {accession}"))?;
		let stats = pool
			.for_each_match(iterator.as_ref(), |found| sink.write(&found))
			.with_context(|| format!("search of {accession} failed"))?;
		total += stats.matches;
	}
	sink.finish()?;
	eprintln!("Found {total} matching fragments");
	Ok(())
}

fn init_logging(verbose: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("blob_search=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_target(false)
		.without_time()
		.init();
}

enum MatchSink<W: Write> {
	Text(W),
	Tsv(csv::Writer<W>),
	Json(W),
}

impl<W: Write> MatchSink<W> {
	fn new(format: OutputFormat, writer: W) -> io::Result<Self> {
		Ok(match format {
			OutputFormat::Text => MatchSink::Text(writer),
			OutputFormat::Tsv => {
				let mut tsv = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
				tsv.write_record(["accession", "fragment", "subject"])?;
				MatchSink::Tsv(tsv)
			}
			OutputFormat::Json => MatchSink::Json(writer),
		})
	}

	fn write(&mut self, found: &Match) -> blob_search::Result<()> {
		match self {
			MatchSink::Text(writer) => {
				writeln!(writer, "{}\t{}", found.accession(), found.fragment_id())?;
			}
			MatchSink::Tsv(writer) => {
				writer
					.write_record([
						found.accession().as_bytes(),
						found.fragment_id().as_bytes(),
						found.subject(),
					])
					.map_err(io::Error::from)?;
			}
			MatchSink::Json(writer) => {
				serde_json::to_writer(&mut *writer, found).map_err(io::Error::from)?;
				writer.write_all(b"\n")?;
			}
		}
		Ok(())
	}

	fn finish(self) -> io::Result<()> {
		match self {
			MatchSink::Text(mut writer) | MatchSink::Json(mut writer) => writer.flush(),
			MatchSink::Tsv(mut writer) => writer.flush(),
		}
	}
}
