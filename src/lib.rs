//! `pgsrip` rips PGS (Presentation Graphic Stream) subtitles out of
//! `.sup`/`.mkv`/`.mks` sources and turns them into `.srt` files via OCR.
//!
//! # Pipeline
//!
//! [`pgs`] decodes the raw segment stream into [`pgs::DisplaySet`]s.
//! [`item`] groups those into timed [`item::PgsSubtitleItem`]s, repairing
//! missing end timestamps. [`mosaic`] packs many items into one composite
//! image so [`ocr`] only has to invoke the OCR engine a handful of times per
//! source instead of once per line. [`ripper`] drives the adaptive retry
//! policy over that pipeline and writes the resulting `.srt`; [`mkv`]
//! extracts PGS tracks out of a Matroska container first when the source is
//! one.
//!
//! # Project
//!
//! Built on top of [subtile](https://github.com/gwen-lg/subtile), a Rust
//! library for working with subtitles that this crate forked to focus on
//! one pipeline: PGS-to-SRT ripping.

#![deny(missing_docs)]
#![deny(unused_imports)]
#![deny(clippy::bind_instead_of_map)]
#![deny(clippy::borrowed_box)]
#![deny(clippy::cast_lossless)]
#![deny(clippy::clone_on_copy)]
#![deny(clippy::derive_partial_eq_without_eq)]
#![deny(clippy::doc_markdown)]
#![deny(clippy::extra_unused_lifetimes)]
#![deny(clippy::if_not_else)]
#![deny(clippy::match_same_arms)]
#![deny(clippy::missing_const_for_fn)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_fields_in_debug)]
#![deny(clippy::missing_panics_doc)]
#![deny(clippy::must_use_candidate)]
#![deny(clippy::or_fun_call)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::uninlined_format_args)]
#![deny(clippy::use_self)]
#![deny(clippy::unreadable_literal)]
#![deny(clippy::useless_conversion)]
// For error-chain.
#![recursion_limit = "1024"]

pub mod content;
mod errors;
pub mod image;
pub mod item;
pub mod media_path;
pub mod mkv;
pub mod mosaic;
pub mod ocr;
pub mod options;
pub mod pgs;
pub mod ripper;
pub mod srt;
pub mod time;

pub use errors::Error;
