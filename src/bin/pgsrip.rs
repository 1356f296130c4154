//! Command line entry point: scans the given paths for `.sup`/`.mkv`/`.mks`
//! sources and rips every matching PGS subtitle track to `.srt`.
//!
//! Flag shape grounded on `original_source/pgsrip/cli.py`; the worker-pool
//! and reporting style follow the `gwen-lg-subtile-ocr` companion binary's
//! `run`/`write_srt`.

use clap::Parser;
use pgsrip::{
    media_path::Language,
    options::RipOptions,
    ripper::{rip_source, scan_path},
};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use regex::Regex;
use std::{
    path::PathBuf,
    process::ExitCode,
    sync::OnceLock,
    time::Duration,
};
use thiserror::Error;

/// Errors that can end the CLI run early.
#[derive(Debug, Error)]
enum CliError {
    /// A `--language` value wasn't a recognized IETF/ISO code.
    #[error("'{0}' is not a valid language")]
    InvalidLanguage(String),

    /// An `--age`/`--srt-age` value didn't match `[0-9]+w[0-9]+d[0-9]+h`.
    #[error("'{0}' is not a valid age, expected e.g. '12h', '1w2d'")]
    InvalidAge(String),

    /// The rayon global thread pool could not be built.
    #[error("Failed to build the worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn age_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?P<weeks>\d+)w)?(?:(?P<days>\d+)d)?(?:(?P<hours>\d+)h)?$")
            .expect("static age regex")
    })
}

fn parse_age(value: &str) -> Result<Duration, CliError> {
    let caps = age_regex()
        .captures(value)
        .filter(|caps| caps.iter().skip(1).any(|group| group.is_some()))
        .ok_or_else(|| CliError::InvalidAge(value.to_string()))?;
    let group = |name: &str| -> u64 {
        caps.name(name).and_then(|m| m.as_str().parse().ok()).unwrap_or(0)
    };
    let weeks = group("weeks");
    let days = group("days");
    let hours = group("hours");
    Ok(Duration::from_secs(((weeks * 7 + days) * 24 + hours) * 3600))
}

fn parse_language(value: &str) -> Result<Language, CliError> {
    Language::from_ietf(value).ok_or_else(|| CliError::InvalidLanguage(value.to_string()))
}

/// Rips PGS subtitles from `.sup`/`.mkv`/`.mks` sources to SRT using OCR.
#[derive(Debug, Parser)]
#[command(name = "pgsrip", version, about)]
struct Opt {
    /// Language as IETF code, e.g. en, pt-BR (can be used multiple times).
    #[arg(short = 'l', long = "language", value_parser = parse_language)]
    language: Vec<Language>,

    /// Rule tags to be used (carried through, unused by the core pipeline).
    #[arg(short = 't', long = "tag")]
    tag: Vec<String>,

    /// Save subtitles using the following encoding.
    #[arg(short, long)]
    encoding: Option<String>,

    /// Filter sources newer than AGE, e.g. 12h, 1w2d.
    #[arg(short, long, value_parser = parse_age)]
    age: Option<Duration>,

    /// Filter sources whose srt subtitle is newer than AGE, e.g. 12h, 1w2d.
    #[arg(short = 'A', long = "srt-age", value_parser = parse_age)]
    srt_age: Option<Duration>,

    /// Re-rip and overwrite existing srt subtitles, even if they already exist.
    #[arg(short, long)]
    force: bool,

    /// Rip every matching track for a language, not just the first.
    #[arg(long)]
    all: bool,

    /// Maximum number of worker threads to use.
    #[arg(short = 'w', long = "max-workers", value_parser = clap::value_parser!(u16).range(1..=50))]
    max_workers: Option<u16>,

    /// Keep temporary files created (extracted sup, mosaic png, OCR json).
    #[arg(long)]
    keep_temp_files: bool,

    /// Print Tesseract/engine diagnostics and keep per-pass debug artifacts.
    #[arg(long)]
    debug: bool,

    /// Display debug messages (use -vv, -vvv for more).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Files or directories to scan for PGS subtitle sources.
    #[arg(required = true)]
    path: Vec<PathBuf>,
}

impl Opt {
    fn into_options(self) -> RipOptions {
        RipOptions {
            languages: self.language.into_iter().collect(),
            tags: self.tag.into_iter().collect(),
            encoding: self.encoding,
            overwrite: self.force,
            one_per_lang: !self.all,
            keep_temp_files: self.keep_temp_files,
            max_workers: self.max_workers.map(usize::from),
            age: self.age,
            srt_age: self.srt_age,
            ..RipOptions::default()
        }
    }
}

fn log_level(verbose: u8, debug: bool) -> log::LevelFilter {
    if debug || verbose >= 3 {
        log::LevelFilter::Trace
    } else if verbose == 2 {
        log::LevelFilter::Debug
    } else if verbose == 1 {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    }
}

fn run(opt: Opt) -> Result<usize, CliError> {
    simple_logger::SimpleLogger::new()
        .with_level(log_level(opt.verbose, opt.debug))
        .init()
        .ok();

    rayon::ThreadPoolBuilder::new()
        .num_threads(opt.max_workers.map(usize::from).unwrap_or(0))
        .thread_name(|idx| format!("pgsrip-worker-{idx}"))
        .build_global()?;

    // Advisory only (spec §5, §9): the OCR engine reads this process-wide, so
    // when several sources run concurrently the last writer wins. It never
    // affects correctness, only how many native threads tesseract spins up.
    if let Some(max_workers) = opt.max_workers {
        // SAFETY: single-threaded at this point in `main`, before the rayon
        // pool or any OCR call reads the variable.
        unsafe {
            std::env::set_var("OMP_THREAD_LIMIT", max_workers.to_string());
        }
    }

    let debug_dir = opt.debug.then(|| PathBuf::from("pgsrip-debug"));
    let paths = opt.path.clone();
    let options = opt.into_options();

    let mut sources = Vec::new();
    for path in &paths {
        sources.extend(scan_path(path));
    }
    log::info!("{} source(s) collected from {} path(s)", sources.len(), paths.len());

    let ripped: usize = sources
        .par_iter()
        .map(|source| match rip_source(source, &options, debug_dir.as_deref()) {
            Ok(count) => count,
            Err(err) => {
                // Wrap in anyhow::Error to display the full cause chain with `:#`.
                let err = anyhow::Error::new(err);
                log::warn!("Error while ripping '{}': {err:#}", source.display());
                0
            }
        })
        .sum();

    println!(
        "{ripped} subtitle line{} ripped from {} source{}",
        if ripped == 1 { "" } else { "s" },
        sources.len(),
        if sources.len() == 1 { "" } else { "s" },
    );

    Ok(ripped)
}

fn main() -> ExitCode {
    let opt = Opt::parse();
    match run(opt) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
