//! Adaptive OCR retry policy and per-source orchestration: turns a decoded
//! PGS stream (or a Matroska container holding one) into a written `.srt`.
//!
//! Grounded on `original_source/pgsrip/ripper.py::PgsToSrtRipper.rip` (retry
//! policy), `core.py` (`scan_path`/`rip`) and `media.py::Pgs.matches`/
//! `Media.matches` (skip rules), merged into one module since the spec
//! doesn't carve out a separate orchestration layer (spec §4.8, §6).

use crate::{
    errors::Error,
    item::{build_items, PgsSubtitleItem},
    media_path::{Language, MediaPath, MediaPathPatch},
    mkv,
    mosaic,
    ocr::{self, accept, TsvData},
    options::{RipOptions, TesseractEngineMode, TesseractPageSegmentationMode},
    pgs::SupParser,
    srt,
    time::{TimePoint, TimeSpan},
};
use compact_str::CompactString;
use std::{
    io::Cursor,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Default minimum OCR confidence accepted without corroboration.
const DEFAULT_CONFIDENCE: u8 = 65;
/// Tesseract's own hard ceiling on image width, in pixels.
const MAX_TESS_WIDTH: u32 = 31 * 1024;
/// Floor under which a mosaic is too cramped to be worth attempting.
const MIN_TESS_WIDTH: u32 = 10 * 1024;
/// Below this many unresolved items, give up on shrinking and spend one
/// last zero-confidence pass trying to rescue whatever is left.
const RESCUE_THRESHOLD: usize = 20;
/// A retry pass that resolved less than this fraction of the backlog is
/// judged to be making little progress, and narrows its next attempt.
const LITTLE_PROGRESS_RATIO: f64 = 0.8;
const EXTENSIONS: [&str; 3] = ["sup", "mkv", "mks"];

/// What to do with the items an OCR pass couldn't resolve.
enum PassOutcome {
    /// Nothing left to retry.
    Done,
    /// Spend one final zero-confidence pass on a narrowed mosaic, then stop
    /// regardless of its outcome.
    Rescue {
        /// Mosaic width for the rescue pass.
        max_width: u32,
    },
    /// Try again with the given parameters.
    Retry {
        /// Mosaic width for the next pass.
        max_width: u32,
        /// Confidence floor for the next pass.
        confidence: u8,
    },
}

fn next_pass(
    remaining_len: usize,
    previous_len: usize,
    confidence: u8,
    max_width: u32,
    max_tess_width: u32,
    width_sum: u32,
) -> PassOutcome {
    if remaining_len == 0 {
        return PassOutcome::Done;
    }
    if remaining_len < RESCUE_THRESHOLD {
        return PassOutcome::Rescue {
            max_width: width_sum.min(max_tess_width).max(1),
        };
    }
    #[allow(clippy::cast_precision_loss)]
    let made_little_progress = remaining_len as f64 > LITTLE_PROGRESS_RATIO * previous_len as f64;
    if made_little_progress {
        return PassOutcome::Retry {
            max_width: (width_sum.min(max_tess_width) / 2).max(1),
            confidence: confidence.saturating_sub(5),
        };
    }
    PassOutcome::Retry { max_width, confidence }
}

fn item_span(item: &PgsSubtitleItem) -> TimeSpan {
    let start = TimePoint::from_msecs(i64::from(item.start_ms));
    let end_ms = item.end_ms.unwrap_or_else(|| item.start_ms.saturating_add(1));
    let end = TimePoint::from_msecs(i64::from(end_ms));
    TimeSpan::new(start, end)
}

#[allow(clippy::too_many_arguments)]
fn run_pass(
    items: Vec<PgsSubtitleItem>,
    max_width: u32,
    confidence: u8,
    lang: &str,
    oem: TesseractEngineMode,
    psm: TesseractPageSegmentationMode,
    debug_dir: Option<&Path>,
    pass_index: usize,
) -> Result<(Vec<PgsSubtitleItem>, Vec<(TimeSpan, String)>), Error> {
    let (image, places) = mosaic::layout(&items, max_width)?;
    let mut items = items;
    for (item, place) in items.iter_mut().zip(places) {
        item.place = place;
    }

    let data = ocr::recognize(&image, lang, oem, psm, confidence)?;

    if let Some(dir) = debug_dir {
        dump_pass_debug(dir, pass_index, &image, &data);
    }

    let mut remaining = Vec::new();
    let mut accepted = Vec::new();
    for item in items {
        let Some(place) = item.place else {
            log::warn!("Dropping item {}: could not be placed in the mosaic", item.index);
            continue;
        };
        match accept(&data, &place) {
            Some(text) if !text.is_empty() => accepted.push((item_span(&item), text)),
            Some(_) => {}
            None => remaining.push(item),
        }
    }

    Ok((remaining, accepted))
}

fn dump_pass_debug(dir: &Path, pass_index: usize, image: &image::GrayImage, data: &TsvData) {
    let mosaic_dir = dir.join(format!("pass-{pass_index:02}"));
    if let Err(source) = crate::image::dump_images(&mosaic_dir.to_string_lossy(), [image]) {
        log::warn!("Could not dump mosaic image for pass {pass_index}: {source}");
        return;
    }
    let result_path = mosaic_dir.join("ocr.json");
    match serde_json::to_vec_pretty(data.rows()) {
        Ok(bytes) => {
            if let Err(source) = std::fs::write(&result_path, bytes) {
                log::warn!("Could not write OCR dump '{}': {source}", result_path.display());
            }
        }
        Err(source) => log::warn!("Could not serialize OCR dump for pass {pass_index}: {source}"),
    }
}

/// Runs the adaptive retry policy (spec §4.8) over `items`, returning every
/// accepted `(span, text)` pair sorted by start time.
///
/// # Errors
///
/// Returns [`Error`] if mosaic layout or OCR recognition fails.
pub fn rip_items(
    items: Vec<PgsSubtitleItem>,
    options: &RipOptions,
    lang: &Language,
    debug_dir: Option<&Path>,
) -> Result<Vec<(TimeSpan, String)>, Error> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let (_, gap_x) = mosaic::gap(&items);
    let max_tess_width = options
        .tesseract_width
        .unwrap_or(MAX_TESS_WIDTH)
        .clamp(MIN_TESS_WIDTH, MAX_TESS_WIDTH);
    let oem = options.tesseract_oem.unwrap_or_default();
    let psm = options.tesseract_psm.unwrap_or_default();
    let lang_code = lang.alpha3();

    let mut confidence = options.confidence.unwrap_or(DEFAULT_CONFIDENCE).min(100);
    let mut max_width = max_tess_width;
    let mut previous_len = items.len();
    let mut pending = items;
    let mut accepted = Vec::new();
    let mut pass_index = 0usize;

    loop {
        let (remaining, newly_accepted) = run_pass(
            pending, max_width, confidence, lang_code, oem, psm, debug_dir, pass_index,
        )?;
        pass_index += 1;
        accepted.extend(newly_accepted);

        let width_sum: u32 = remaining.iter().map(|item| item.width() + gap_x).sum();
        match next_pass(remaining.len(), previous_len, confidence, max_width, max_tess_width, width_sum) {
            PassOutcome::Done => break,
            PassOutcome::Rescue { max_width: rescue_width } => {
                let (still_remaining, rescued) =
                    run_pass(remaining, rescue_width, 0, lang_code, oem, psm, debug_dir, pass_index)?;
                accepted.extend(rescued);
                if !still_remaining.is_empty() {
                    log::warn!(
                        "{} subtitle(s) could not be read and were dropped: {:?}",
                        still_remaining.len(),
                        still_remaining.iter().map(|item| item.index).collect::<Vec<_>>(),
                    );
                }
                break;
            }
            PassOutcome::Retry { max_width: next_width, confidence: next_confidence } => {
                previous_len = remaining.len();
                max_width = next_width;
                confidence = next_confidence;
                pending = remaining;
            }
        }
    }

    accepted.sort_by_key(|(span, _)| span.start);
    Ok(accepted)
}

/// Whether `media_path`'s source, age and an existing `.srt` allow ripping
/// to go ahead (spec §6, grounded on `media.py`'s `matches` pair).
#[must_use]
pub fn should_rip(media_path: &MediaPath, options: &RipOptions) -> bool {
    if !options.languages.is_empty() && !options.languages.contains(media_path.language()) {
        return false;
    }

    let srt_path = media_path.translate(MediaPathPatch {
        number: Some(0),
        extension: Some(CompactString::new("srt")),
        ..MediaPathPatch::default()
    });
    if !srt_path.exists() {
        return true;
    }
    if !options.overwrite {
        return false;
    }
    if let Some(srt_age) = options.srt_age {
        if srt_path.age().is_ok_and(|age| age < srt_age) {
            return false;
        }
    }
    true
}

fn source_too_old(path: &Path, options: &RipOptions) -> bool {
    let Some(max_age) = options.age else {
        return false;
    };
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    let age = SystemTime::now().duration_since(modified).unwrap_or_default();
    age > max_age
}

fn write_srt_for(
    media_path: &MediaPath,
    subtitles: &[(TimeSpan, String)],
    options: &RipOptions,
) -> Result<PathBuf, Error> {
    if let Some(encoding) = &options.encoding {
        if !encoding.eq_ignore_ascii_case("utf-8") {
            log::warn!("Requested encoding '{encoding}' is not supported, writing UTF-8");
        }
    }

    let srt_path = media_path.translate(MediaPathPatch {
        number: Some(0),
        extension: Some(CompactString::new("srt")),
        ..MediaPathPatch::default()
    });
    let path = srt_path.to_path_buf();
    let mut file = std::fs::File::create(&path).map_err(|source| Error::Io { source, path: path.clone() })?;
    srt::write_srt(&mut file, subtitles).map_err(|source| Error::Io { source, path: path.clone() })?;
    Ok(path)
}

/// Decodes, OCRs and writes one `.sup` stream's subtitles, returning the
/// number of lines written.
///
/// # Errors
///
/// Returns [`Error`] if the stream can't be decoded, OCR fails, or the
/// `.srt` can't be written.
pub fn rip_sup(
    media_path: &MediaPath,
    data: &[u8],
    options: &RipOptions,
    debug_dir: Option<&Path>,
) -> Result<usize, Error> {
    let display_sets = SupParser::new(Cursor::new(data));
    let items = build_items(display_sets, media_path);
    let subtitles = rip_items(items, options, media_path.language(), debug_dir)?;
    write_srt_for(media_path, &subtitles, options)?;
    Ok(subtitles.len())
}

/// Probes `path` for PGS subtitle tracks, extracts and rips each selected
/// one, and returns the total number of subtitle lines written.
///
/// # Errors
///
/// Returns [`Error`] if probing fails; per-track extraction/OCR failures are
/// logged and skipped rather than aborting the whole container.
pub fn rip_mkv(path: &Path, options: &RipOptions, debug_dir: Option<&Path>) -> Result<usize, Error> {
    let tracks = mkv::probe(path)?;
    let selected = mkv::select_tracks(&tracks, &options.languages, options.one_per_lang);
    if selected.is_empty() {
        log::debug!("No matching PGS subtitle tracks in '{}'", path.display());
        return Ok(0);
    }

    let base_media_path = MediaPath::parse(path);
    let mut ripped = 0;

    for (track_index, track) in selected.into_iter().enumerate() {
        let track_number = u32::try_from(track_index).unwrap_or(u32::MAX);
        let track_media_path = base_media_path.translate(MediaPathPatch {
            number: Some(track_number),
            language: Some(track.language.clone()),
            extension: Some(CompactString::new("sup")),
        });

        if !should_rip(&track_media_path, options) {
            continue;
        }

        let temp_dir = match tempfile::Builder::new().prefix("pgsrip-").tempdir() {
            Ok(dir) => dir,
            Err(source) => {
                log::warn!("Could not create a temporary directory for '{}': {source}", path.display());
                continue;
            }
        };
        let extracted_path = temp_dir.path().join(format!("track-{}.sup", track.id));

        match mkv::extract_track(path, track, &extracted_path) {
            Ok(data) => {
                let track_debug_dir = debug_dir.map(|dir| dir.join(format!("track-{}", track.id)));
                match rip_sup(&track_media_path, &data, options, track_debug_dir.as_deref()) {
                    Ok(count) => ripped += count,
                    Err(err) => log::warn!(
                        "Error while ripping track {} of '{}': {err}",
                        track.id,
                        path.display()
                    ),
                }
            }
            Err(err) => log::warn!(
                "Error while extracting track {} of '{}': {err}",
                track.id,
                path.display()
            ),
        }

        if options.keep_temp_files {
            log::info!("Keeping temporary files in '{}'", temp_dir.path().display());
            let _: PathBuf = temp_dir.into_path();
        }
    }

    Ok(ripped)
}

/// Rips one source, dispatching on its extension: a `.sup` stream is read
/// and OCR'd directly, a `.mkv`/`.mks` container has its PGS tracks
/// extracted first. Returns the number of subtitle lines written.
///
/// # Errors
///
/// Returns [`Error::Config`] for an unsupported extension, or whatever
/// [`rip_sup`]/[`rip_mkv`] returns for a supported one.
pub fn rip_source(path: &Path, options: &RipOptions, debug_dir: Option<&Path>) -> Result<usize, Error> {
    if source_too_old(path, options) {
        log::debug!("Skipping '{}': older than the configured age limit", path.display());
        return Ok(0);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();

    match extension.as_str() {
        "sup" => {
            let media_path = MediaPath::parse(path);
            if !should_rip(&media_path, options) {
                return Ok(0);
            }
            let data = std::fs::read(path).map_err(|source| Error::Io { source, path: path.to_path_buf() })?;
            rip_sup(&media_path, &data, options, debug_dir)
        }
        "mkv" | "mks" => rip_mkv(path, options, debug_dir),
        other => Err(Error::Config(format!(
            "Unsupported source extension '.{other}' for '{}'",
            path.display()
        ))),
    }
}

/// Recursively collects every `.sup`/`.mkv`/`.mks` file under `path` (spec
/// §6), silently discarding paths that don't exist or can't be read.
#[must_use]
pub fn scan_path(path: &Path) -> Vec<PathBuf> {
    let mut collected = Vec::new();
    scan_path_into(path, &mut collected);
    collected
}

fn scan_path_into(path: &Path, collected: &mut Vec<PathBuf>) {
    if path.is_file() {
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
        if extension.is_some_and(|ext| EXTENSIONS.contains(&ext.as_str())) {
            collected.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        let Ok(entries) = std::fs::read_dir(path) else {
            log::debug!("Could not read directory '{}'", path.display());
            return;
        };
        for entry in entries.flatten() {
            scan_path_into(&entry.path(), collected);
        }
    } else {
        log::debug!("Non-existent path '{}' discarded", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_once_nothing_remains() {
        assert!(matches!(next_pass(0, 100, 65, 1000, 2000, 0), PassOutcome::Done));
    }

    #[test]
    fn rescues_below_threshold() {
        match next_pass(RESCUE_THRESHOLD - 1, 100, 65, 1000, 2000, 500) {
            PassOutcome::Rescue { max_width } => assert_eq!(max_width, 500),
            _ => panic!("expected a rescue pass"),
        }
    }

    #[test]
    fn rescue_width_is_capped_at_the_tesseract_ceiling() {
        match next_pass(RESCUE_THRESHOLD - 1, 100, 65, 1000, 2000, 50_000) {
            PassOutcome::Rescue { max_width } => assert_eq!(max_width, 2000),
            _ => panic!("expected a rescue pass"),
        }
    }

    #[test]
    fn shrinks_and_lowers_confidence_on_little_progress() {
        match next_pass(90, 100, 65, 1000, 2000, 1000) {
            PassOutcome::Retry { max_width, confidence } => {
                assert_eq!(max_width, 500);
                assert_eq!(confidence, 60);
            }
            PassOutcome::Done | PassOutcome::Rescue { .. } => panic!("expected a retry"),
        }
    }

    #[test]
    fn keeps_parameters_on_good_progress() {
        match next_pass(40, 100, 65, 1000, 2000, 1000) {
            PassOutcome::Retry { max_width, confidence } => {
                assert_eq!(max_width, 1000);
                assert_eq!(confidence, 65);
            }
            PassOutcome::Done | PassOutcome::Rescue { .. } => panic!("expected a retry"),
        }
    }

    #[test]
    fn should_rip_is_true_when_no_srt_exists() {
        let media_path = MediaPath::parse("/nonexistent/path/movie.eng.sup");
        let options = RipOptions::default();
        assert!(should_rip(&media_path, &options));
    }

    #[test]
    fn should_rip_honors_the_language_filter() {
        let media_path = MediaPath::parse("/nonexistent/path/movie.fre.sup");
        let mut options = RipOptions::default();
        options.languages.insert(Language::from_ietf("en").unwrap());
        assert!(!should_rip(&media_path, &options));
    }

    #[test]
    fn scan_path_finds_nothing_under_a_missing_directory() {
        let found = scan_path(Path::new("/nonexistent/pgsrip-scan-test"));
        assert!(found.is_empty());
    }
}
