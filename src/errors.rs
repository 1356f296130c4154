//! Crate-wide error aggregate.
//!
//! Each module defines its own focused `thiserror` error enum (see
//! `pgs::segment::Error`, `pgs::ods::Error`, `content::ContentError`,
//! `mosaic::MosaicError`, `ocr::OcrError`, `mkv::MkvError`, ...). This type
//! aggregates them at the crate boundary via `#[from]`, matching the
//! `SubError`/per-module pattern used by the teacher this crate is built
//! from.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the `pgsrip` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A PGS segment stream could not be read or framed correctly.
    #[error(transparent)]
    Pgs(#[from] crate::pgs::PgsError),

    /// A subtitle bounding box was invalid.
    #[error(transparent)]
    Content(#[from] crate::content::ContentError),

    /// Mosaic layout failed (no items to pack, or inconsistent bookkeeping).
    #[error(transparent)]
    Mosaic(#[from] crate::mosaic::MosaicError),

    /// OCR invocation or result handling failed.
    #[error(transparent)]
    Ocr(#[from] crate::ocr::OcrError),

    /// MKV probing or track extraction failed.
    #[error(transparent)]
    Mkv(#[from] crate::mkv::MkvError),

    /// Invalid user-supplied configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// We could not read or write a file.
    #[error("Could not access '{path}'")]
    Io {
        /// Source error.
        source: io::Error,
        /// Path of the file we tried to access.
        path: PathBuf,
    },

    /// An image could not be dumped to disk for debugging.
    #[error(transparent)]
    Dump(#[from] crate::image::DumpError),
}
