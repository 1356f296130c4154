//! Matroska container support: probing tracks with `mkvmerge` and pulling a
//! single PGS subtitle track out with `mkvextract`.
//!
//! Grounded on `original_source/pgsrip/mkv.py`, but restricted to the
//! selection rule spec §4.11/§6 actually asks for: enabled `subtitles`
//! tracks encoded as `HDMV PGS`, filtered by language, one per language
//! unless the caller asks for every matching track. The original's extended
//! SDH/forced-only/track-name heuristics are out of scope.

use crate::media_path::Language;
use serde::Deserialize;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};
use thiserror::Error;

/// Errors raised while probing or extracting Matroska subtitle tracks.
#[derive(Debug, Error)]
pub enum MkvError {
    /// The external tool could not even be spawned (not installed, no perms).
    #[error("Failed to run '{tool}' on '{}': {source}", path.display())]
    Spawn {
        /// Name of the external tool (`mkvmerge` or `mkvextract`).
        tool: &'static str,
        /// Path we were operating on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The external tool ran but reported failure.
    #[error("'{tool}' exited with {status} on '{}'", path.display())]
    ExitStatus {
        /// Name of the external tool (`mkvmerge` or `mkvextract`).
        tool: &'static str,
        /// Path we were operating on.
        path: PathBuf,
        /// Exit status reported by the tool.
        status: ExitStatus,
    },

    /// `mkvmerge`'s JSON identification output didn't match the expected shape.
    #[error("Failed to parse mkvmerge output for '{}': {source}", path.display())]
    Json {
        /// Path we were probing.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The file `mkvextract` was told to write could not be read back.
    #[error("Could not read extracted track at '{}': {source}", path.display())]
    ReadExtracted {
        /// Path `mkvextract` was asked to write to.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct MkvmergeOutput {
    #[serde(default)]
    tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: u64,
    #[serde(rename = "type")]
    track_type: String,
    codec: String,
    #[serde(default)]
    properties: RawTrackProperties,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrackProperties {
    #[serde(default)]
    language_ietf: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    enabled_track: Option<bool>,
    #[serde(default)]
    forced_track: Option<bool>,
}

/// One subtitle track inside a Matroska container, as reported by `mkvmerge`.
#[derive(Debug, Clone)]
pub struct MkvTrack {
    /// `mkvmerge`'s track id, used to address it for extraction.
    pub id: u64,
    /// Track type, e.g. `"subtitles"`.
    pub track_type: String,
    /// Codec name, e.g. `"HDMV PGS"`.
    pub codec: String,
    /// Track language, `und` when the container carries none.
    pub language: Language,
    /// Whether the container flags this track as forced.
    pub forced: bool,
    /// Whether the container flags this track as enabled.
    pub enabled: bool,
}

impl MkvTrack {
    fn from_raw(raw: RawTrack) -> Self {
        let language = raw
            .properties
            .language_ietf
            .as_deref()
            .or(raw.properties.language.as_deref())
            .and_then(Language::from_ietf)
            .unwrap_or_else(Language::undetermined);

        Self {
            id: raw.id,
            track_type: raw.track_type,
            codec: raw.codec,
            language,
            forced: raw.properties.forced_track.unwrap_or(false),
            enabled: raw.properties.enabled_track.unwrap_or(true),
        }
    }

    /// Whether this track is a PGS subtitle stream eligible for ripping.
    #[must_use]
    pub fn is_pgs_subtitle(&self) -> bool {
        self.track_type == "subtitles" && self.codec == "HDMV PGS" && self.enabled
    }
}

fn parse_mkvmerge_json(bytes: &[u8], path: &Path) -> Result<Vec<MkvTrack>, MkvError> {
    let parsed: MkvmergeOutput = serde_json::from_slice(bytes).map_err(|source| MkvError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parsed.tracks.into_iter().map(MkvTrack::from_raw).collect())
}

/// Probe `path` with `mkvmerge -i -F json`, returning every track it reports.
///
/// # Errors
///
/// Returns [`MkvError`] if `mkvmerge` cannot be spawned, exits non-zero, or
/// its output cannot be parsed as the expected JSON shape.
pub fn probe(path: &Path) -> Result<Vec<MkvTrack>, MkvError> {
    let output = Command::new("mkvmerge")
        .args(["-i", "-F", "json"])
        .arg(path)
        .output()
        .map_err(|source| MkvError::Spawn {
            tool: "mkvmerge",
            path: path.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(MkvError::ExitStatus {
            tool: "mkvmerge",
            path: path.to_path_buf(),
            status: output.status,
        });
    }

    parse_mkvmerge_json(&output.stdout, path)
}

/// Selects and orders the PGS subtitle tracks to rip (spec §6): keep enabled
/// `subtitles`/`HDMV PGS` tracks, sort stably by `forced` then by `id`,
/// restrict to `languages` (an empty set means "every language"), then, if
/// `one_per_lang` is set, keep only the first track seen per language in
/// that order.
#[must_use]
pub fn select_tracks<'a>(
    tracks: &'a [MkvTrack],
    languages: &HashSet<Language>,
    one_per_lang: bool,
) -> Vec<&'a MkvTrack> {
    let mut candidates: Vec<&MkvTrack> = tracks.iter().filter(|track| track.is_pgs_subtitle()).collect();
    candidates.sort_by_key(|track| track.forced);
    candidates.sort_by_key(|track| track.id);

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|track| languages.is_empty() || languages.contains(&track.language))
        .filter(|track| !one_per_lang || seen.insert(track.language.clone()))
        .collect()
}

/// Extract `track`'s raw PGS stream from `path` into `dest`, returning its
/// bytes.
///
/// # Errors
///
/// Returns [`MkvError`] if `mkvextract` cannot be spawned, exits non-zero, or
/// the extracted file cannot be read back.
pub fn extract_track(path: &Path, track: &MkvTrack, dest: &Path) -> Result<Vec<u8>, MkvError> {
    let spec = format!("{}:{}", track.id, dest.display());
    let status = Command::new("mkvextract")
        .arg(path)
        .arg("tracks")
        .arg(&spec)
        .status()
        .map_err(|source| MkvError::Spawn {
            tool: "mkvextract",
            path: path.to_path_buf(),
            source,
        })?;

    if !status.success() {
        return Err(MkvError::ExitStatus {
            tool: "mkvextract",
            path: path.to_path_buf(),
            status,
        });
    }

    std::fs::read(dest).map_err(|source| MkvError::ReadExtracted {
        path: dest.to_path_buf(),
        source,
    })
}
