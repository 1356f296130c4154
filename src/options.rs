//! User-facing configuration threaded from the CLI into the ripper.
//!
//! Grounded on `original_source/pgsrip/options.py`; the `cleanit`
//! rule-selection config that Python version also carries is out of scope
//! (spec §1: "rule loading/selection lives outside, CLI wires a no-op").

use crate::media_path::Language;
use std::{collections::HashSet, time::Duration};

/// Tesseract OCR engine mode (`--oem`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TesseractEngineMode {
    /// Legacy engine only.
    Legacy,
    /// Neural nets LSTM engine only.
    Neural,
    /// Legacy + LSTM combined.
    LegacyAndNeural,
    /// Whatever is available, tesseract's default.
    Default,
}

impl TesseractEngineMode {
    /// The numeric value tesseract's `--oem` flag expects.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Legacy => 0,
            Self::Neural => 1,
            Self::LegacyAndNeural => 2,
            Self::Default => 3,
        }
    }
}

impl Default for TesseractEngineMode {
    fn default() -> Self {
        Self::Neural
    }
}

/// Tesseract page segmentation mode (`--psm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TesseractPageSegmentationMode {
    /// Treat the image as a single block of text (psm 6).
    SingleUniformBlockOfText,
    /// Treat the image as a single text line (psm 7).
    SingleLine,
    /// Treat the image as a single word (psm 8).
    SingleWord,
    /// Fully automatic page segmentation, no OSD (psm 3).
    AutoNoOrientationDetection,
}

impl TesseractPageSegmentationMode {
    /// The numeric value tesseract's `--psm` flag expects.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::AutoNoOrientationDetection => 3,
            Self::SingleUniformBlockOfText => 6,
            Self::SingleLine => 7,
            Self::SingleWord => 8,
        }
    }
}

impl Default for TesseractPageSegmentationMode {
    fn default() -> Self {
        Self::SingleUniformBlockOfText
    }
}

/// Configuration shared by every source ripped in one run.
#[derive(Debug, Clone)]
pub struct RipOptions {
    /// Only rip sources matching one of these languages; empty means "all".
    pub languages: HashSet<Language>,
    /// Rule tags, carried through for a future post-processor; unused by
    /// the core pipeline itself.
    pub tags: HashSet<String>,
    /// Output SRT text encoding. `None` means UTF-8.
    pub encoding: Option<String>,
    /// Re-rip and overwrite an existing `.srt`.
    pub overwrite: bool,
    /// When `true` (the default), only the first matching track per
    /// language is ripped; set to `false` (CLI `--all`) to rip every
    /// matching track instead.
    pub one_per_lang: bool,
    /// Keep extracted `.sup`, mosaic `.png` and OCR result `.json` files.
    pub keep_temp_files: bool,
    /// Cap on concurrently processed sources; also sets `OMP_THREAD_LIMIT`.
    pub max_workers: Option<usize>,
    /// Minimum OCR confidence accepted without corroboration, `0..=100`.
    pub confidence: Option<u8>,
    /// Tesseract OCR engine mode.
    pub tesseract_oem: Option<TesseractEngineMode>,
    /// Tesseract page segmentation mode.
    pub tesseract_psm: Option<TesseractPageSegmentationMode>,
    /// Mosaic width ceiling passed to tesseract, in pixels.
    pub tesseract_width: Option<u32>,
    /// Skip source files older than this.
    pub age: Option<Duration>,
    /// Skip sources whose existing `.srt` is newer than this.
    pub srt_age: Option<Duration>,
}

impl Default for RipOptions {
    fn default() -> Self {
        Self {
            languages: HashSet::new(),
            tags: HashSet::new(),
            encoding: None,
            overwrite: false,
            one_per_lang: true,
            keep_temp_files: false,
            max_workers: None,
            confidence: None,
            tesseract_oem: None,
            tesseract_psm: None,
            tesseract_width: None,
            age: None,
            srt_age: None,
        }
    }
}
