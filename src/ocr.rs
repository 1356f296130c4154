//! OCR adapter: binds to `leptess` (libtesseract) and demultiplexes its
//! output back to individual subtitle items.
//!
//! Grounded on `original_source/pgsrip/tsv.py` (row model, `select`,
//! `has_word`) and `ripper.py::accept` (the demuxer). The engine itself is
//! asked for hOCR output, tesseract's structured HTML format, which is
//! parsed into the same row shape `tsv.py` builds from `image_to_data`'s
//! TSV: both carry `(page, block, paragraph, line, word)` nesting, a
//! bounding box and a confidence per word.

use crate::{content::Area, options::{TesseractEngineMode, TesseractPageSegmentationMode}};
use image::GrayImage;
use leptess::{LepTess, Variable};
use regex::Regex;
use std::{collections::HashSet, io::Cursor, sync::OnceLock};
use thiserror::Error;

/// Errors raised while invoking the OCR engine or parsing its output.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The mosaic image could not be encoded for handoff to the engine.
    #[error("Failed to encode mosaic image for OCR: {0}")]
    Encode(String),
    /// The engine failed to initialize (missing language data, bad path).
    #[error("Failed to initialize the OCR engine: {0}")]
    EngineInit(String),
    /// A configuration variable (OEM, PSM) was rejected by the engine.
    #[error("Failed to configure the OCR engine: {0}")]
    Configure(String),
    /// Recognition itself failed.
    #[error("OCR recognition failed: {0}")]
    Recognize(String),
}

/// Tesseract's word granularity, the only level the demuxer consumes.
const WORD_LEVEL: u32 = 5;

/// One recognized token, mirroring tesseract's TSV/hOCR word row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OcrRow {
    /// Granularity level; only [`WORD_LEVEL`] rows are produced.
    pub level: u32,
    /// 1-based page number.
    pub page_num: u32,
    /// 1-based block number within the page.
    pub block_num: u32,
    /// 1-based paragraph number within the block.
    pub par_num: u32,
    /// 1-based line number within the paragraph.
    pub line_num: u32,
    /// 1-based word number within the line.
    pub word_num: u32,
    /// Left edge of the word's bounding box.
    pub left: u32,
    /// Top edge of the word's bounding box.
    pub top: u32,
    /// Width of the word's bounding box.
    pub width: u32,
    /// Height of the word's bounding box.
    pub height: u32,
    /// Confidence, `0..=100`.
    pub conf: u8,
    /// Recognized text.
    pub text: String,
}

impl OcrRow {
    /// Vertical midpoint of this word's bounding box.
    #[must_use]
    pub const fn h_center(&self) -> u32 {
        self.top + self.height / 2
    }

    /// Horizontal midpoint of this word's bounding box.
    #[must_use]
    pub const fn w_center(&self) -> u32 {
        self.left + self.width / 2
    }

    fn matches(&self, place: &Area) -> bool {
        let h_start = u32::from(place.top());
        let h_end = h_start + u32::from(place.height());
        let w_start = u32::from(place.left());
        let w_end = w_start + u32::from(place.width());
        h_start <= self.h_center()
            && self.h_center() <= h_end
            && w_start <= self.w_center()
            && self.w_center() <= w_end
    }
}

/// One OCR pass's recognized rows, in table order, plus the set of words
/// seen at or above `confidence` anywhere in the pass (used to rescue a
/// marginal reading corroborated elsewhere).
pub struct TsvData {
    confidence: u8,
    rows: Vec<OcrRow>,
    words: HashSet<String>,
}

impl TsvData {
    fn from_rows(mut rows: Vec<OcrRow>, confidence: u8) -> Self {
        rows.sort_by_key(|row| {
            (
                row.page_num,
                row.block_num,
                row.par_num,
                row.line_num,
                row.word_num,
            )
        });
        let words = rows
            .iter()
            .filter(|row| !row.text.is_empty() && row.conf >= confidence)
            .map(|row| row.text.clone())
            .collect();
        Self {
            confidence,
            rows,
            words,
        }
    }

    /// Word-level rows whose center falls inside `place`, in table order.
    #[must_use]
    pub fn select(&self, place: &Area) -> Vec<&OcrRow> {
        self.rows
            .iter()
            .filter(|row| row.level == WORD_LEVEL && row.matches(place))
            .collect()
    }

    /// Whether `word` was recognized at or above this pass's confidence
    /// threshold anywhere in the mosaic.
    #[must_use]
    pub fn has_word(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// The confidence threshold this pass was built with.
    #[must_use]
    pub const fn confidence(&self) -> u8 {
        self.confidence
    }

    /// Every recognized row, in table order. Exposed for debug dumps only;
    /// item-level consumers should use [`TsvData::select`].
    #[must_use]
    pub fn rows(&self) -> &[OcrRow] {
        &self.rows
    }
}

/// Reassembles the words inside `place` into text, rejecting the whole item
/// when a low-confidence word isn't corroborated elsewhere in the pass
/// (spec §4.7).
#[must_use]
pub fn accept(data: &TsvData, place: &Area) -> Option<String> {
    let rows = data.select(place);
    let mut lines = Vec::new();
    let mut words: Vec<&str> = Vec::new();
    let mut last: Option<&OcrRow> = None;

    for row in rows {
        if row.conf < data.confidence() && !data.has_word(&row.text) {
            return None;
        }

        if let Some(last_row) = last {
            let advanced = last_row.page_num < row.page_num
                || last_row.block_num < row.block_num
                || last_row.par_num < row.par_num
                || last_row.line_num < row.line_num;
            if advanced && !words.is_empty() {
                lines.push(words.join(" "));
                words.clear();
            }
        }
        words.push(&row.text);
        last = Some(row);
    }
    if !words.is_empty() {
        lines.push(words.join(" "));
    }

    Some(lines.join("\n").trim().to_string())
}

fn bbox_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"bbox (\d+) (\d+) (\d+) (\d+)").expect("static hOCR regex"))
}

fn conf_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"x_wconf (\d+)").expect("static hOCR regex"))
}

fn element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"<span class=['"](ocr_page|ocr_carea|ocr_par|ocr_line|ocrx_word)['"][^>]*title=['"]([^'"]*)['"][^>]*>(?:([^<]*)</span>)?"#,
        )
        .expect("static hOCR regex")
    })
}

fn parse_hocr(hocr: &str, confidence: u8) -> TsvData {
    let (mut page, mut block, mut par, mut line, mut word) = (0u32, 0u32, 0u32, 0u32, 0u32);
    let mut rows = Vec::new();

    for caps in element_regex().captures_iter(hocr) {
        let class = &caps[1];
        let title = &caps[2];
        match class {
            "ocr_page" => {
                page += 1;
                block = 0;
            }
            "ocr_carea" => {
                block += 1;
                par = 0;
            }
            "ocr_par" => {
                par += 1;
                line = 0;
            }
            "ocr_line" => {
                line += 1;
                word = 0;
            }
            "ocrx_word" => {
                word += 1;
                let Some(bbox) = bbox_regex().captures(title) else {
                    continue;
                };
                let Some((left, top, right, bottom)) = (|| {
                    Some((
                        bbox[1].parse::<u32>().ok()?,
                        bbox[2].parse::<u32>().ok()?,
                        bbox[3].parse::<u32>().ok()?,
                        bbox[4].parse::<u32>().ok()?,
                    ))
                })() else {
                    continue;
                };
                let conf = conf_regex()
                    .captures(title)
                    .and_then(|caps| caps[1].parse::<u8>().ok())
                    .unwrap_or(0);
                let text = caps
                    .get(3)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();
                if text.is_empty() {
                    continue;
                }
                rows.push(OcrRow {
                    level: WORD_LEVEL,
                    page_num: page.max(1),
                    block_num: block,
                    par_num: par,
                    line_num: line,
                    word_num: word,
                    left,
                    top,
                    width: right.saturating_sub(left),
                    height: bottom.saturating_sub(top),
                    conf,
                    text,
                });
            }
            _ => {}
        }
    }

    TsvData::from_rows(rows, confidence)
}

/// Runs one OCR pass over `image`, returning the recognized rows.
///
/// # Errors
///
/// Returns [`OcrError`] if the image can't be encoded, the engine can't be
/// initialized or configured, or recognition itself fails.
#[profiling::function]
pub fn recognize(
    image: &GrayImage,
    lang: &str,
    oem: TesseractEngineMode,
    psm: TesseractPageSegmentationMode,
    confidence: u8,
) -> Result<TsvData, OcrError> {
    let mut png_bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|source| OcrError::Encode(source.to_string()))?;

    let mut api =
        LepTess::new(None, lang).map_err(|source| OcrError::EngineInit(source.to_string()))?;
    api.set_variable(Variable::TesseditPagesegMode, &psm.value().to_string())
        .map_err(|source| OcrError::Configure(source.to_string()))?;
    api.set_variable(Variable::TesseditOcrEngineMode, &oem.value().to_string())
        .map_err(|source| OcrError::Configure(source.to_string()))?;
    api.set_image_from_mem(&png_bytes)
        .map_err(|source| OcrError::Recognize(source.to_string()))?;
    let hocr = api
        .get_hocr_text(0)
        .map_err(|source| OcrError::Recognize(source.to_string()))?;

    Ok(parse_hocr(&hocr, confidence))
}
