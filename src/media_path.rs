//! Structured subtitle filenames: `<base>[-<n>].<lang>.<ext>` (spec §4.12).
//!
//! Grounded on `original_source/pgsrip/media_path.py`. The pack carries no
//! `babelfish`-equivalent language-tag crate, so [`Language`] is a small
//! static table over common IETF/ISO codes rather than a full BCP-47
//! implementation; anything outside the table resolves to `und`.

use compact_str::CompactString;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

/// A 3-letter (ISO 639-2) language code, `und` when undetermined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(CompactString);

/// Common 2- and 3-letter codes mapped to their ISO 639-2 form. Not
/// exhaustive: anything missing here falls back to `und`, never an error.
const KNOWN_LANGUAGES: &[(&str, &str)] = &[
    ("en", "eng"),
    ("eng", "eng"),
    ("fr", "fre"),
    ("fre", "fre"),
    ("fra", "fre"),
    ("de", "ger"),
    ("ger", "ger"),
    ("deu", "ger"),
    ("es", "spa"),
    ("spa", "spa"),
    ("it", "ita"),
    ("ita", "ita"),
    ("pt", "por"),
    ("por", "por"),
    ("nl", "dut"),
    ("dut", "dut"),
    ("nld", "dut"),
    ("ja", "jpn"),
    ("jpn", "jpn"),
    ("zh", "chi"),
    ("chi", "chi"),
    ("zho", "chi"),
    ("ko", "kor"),
    ("kor", "kor"),
    ("ru", "rus"),
    ("rus", "rus"),
    ("ar", "ara"),
    ("ara", "ara"),
    ("sv", "swe"),
    ("swe", "swe"),
    ("pl", "pol"),
    ("pol", "pol"),
];

impl Language {
    /// The `und` (undetermined) language.
    #[must_use]
    pub fn undetermined() -> Self {
        Self(CompactString::new("und"))
    }

    /// Parse a 2- or 3-letter IETF/ISO code, returning `None` if unrecognized.
    #[must_use]
    pub fn from_ietf(tag: &str) -> Option<Self> {
        let lower = tag.to_lowercase();
        KNOWN_LANGUAGES
            .iter()
            .find(|(code, _)| *code == lower)
            .map(|(_, alpha3)| Self(CompactString::new(alpha3)))
    }

    /// The 3-letter ISO 639-2 code, as passed to the OCR engine.
    #[must_use]
    pub fn alpha3(&self) -> &str {
        &self.0
    }

    /// Whether this is the `und` placeholder.
    #[must_use]
    pub fn is_undetermined(&self) -> bool {
        self.0 == "und"
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split a trailing `-<n>` disambiguator off a path's file name, e.g.
/// `movie-2` -> (`movie`, 2). Returns `(path, 0)` unchanged when there is no
/// dash or the suffix isn't all digits.
fn split_trailing_number(path: &Path) -> (PathBuf, u32) {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return (path.to_path_buf(), 0);
    };
    let Some((stem, suffix)) = file_name.rsplit_once('-') else {
        return (path.to_path_buf(), 0);
    };
    if stem.is_empty() || suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return (path.to_path_buf(), 0);
    }
    let Ok(number) = suffix.parse() else {
        return (path.to_path_buf(), 0);
    };
    (path.with_file_name(stem), number)
}

/// Fields to overwrite on a [`MediaPath`] via [`MediaPath::translate`].
#[derive(Debug, Clone, Default)]
pub struct MediaPathPatch {
    /// New numeric suffix.
    pub number: Option<u32>,
    /// New language tag.
    pub language: Option<Language>,
    /// New extension (without the leading dot).
    pub extension: Option<CompactString>,
}

/// A structured input/output filename: base name, numeric disambiguator,
/// language tag and extension, each independently replaceable.
#[derive(Debug, Clone)]
pub struct MediaPath {
    base_path: PathBuf,
    number: u32,
    language: Language,
    extension: Option<CompactString>,
}

impl MediaPath {
    /// Parse a path into its structured components.
    ///
    /// The trailing extension is always split off. The one before it is
    /// tried as a language tag; if recognized it is stripped too, otherwise
    /// it is treated as part of the base name and the language is `und`.
    #[must_use]
    pub fn parse(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(CompactString::new);
        let file_part = path.with_extension("");

        let lang_candidate = file_part
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_ietf);

        let (base_path, language) = match lang_candidate {
            Some(language) => (file_part.with_extension(""), language),
            None => (file_part, Language::undetermined()),
        };

        let (base_path, number) = split_trailing_number(&base_path);

        Self {
            base_path,
            number,
            language,
            extension,
        }
    }

    /// The path stem, with any numeric suffix/language/extension removed.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The numeric disambiguator, `0` when unset.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// The language tag, `und` when undetermined.
    #[must_use]
    pub const fn language(&self) -> &Language {
        &self.language
    }

    /// The extension, without a leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Reassemble the structured components into the path they describe.
    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.to_string())
    }

    /// Return a modified copy, overwriting only the fields set in `patch`.
    ///
    /// Pure: `translate(a).translate(b) == translate(b)` when `b` sets every
    /// field `a` did (spec §8).
    #[must_use]
    pub fn translate(&self, patch: MediaPathPatch) -> Self {
        let mut next = self.clone();
        if let Some(number) = patch.number {
            next.number = number;
        }
        if let Some(language) = patch.language {
            next.language = language;
        }
        if let Some(extension) = patch.extension {
            next.extension = Some(extension);
        }
        next
    }

    /// Whether the file this path describes exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.to_path_buf().exists()
    }

    /// Age of the file this path describes, since last modification.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'd.
    pub fn age(&self) -> io::Result<Duration> {
        let modified = fs::metadata(self.to_path_buf())?.modified()?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default())
    }

    /// Read the full file content this path describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(self.to_path_buf())
    }
}

impl fmt::Display for MediaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_path.display())?;
        if self.number != 0 {
            write!(f, "-{}", self.number)?;
        }
        if !self.language.is_undetermined() {
            write!(f, ".{}", self.language)?;
        }
        if let Some(extension) = &self.extension {
            write!(f, ".{extension}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base_language_and_extension() {
        let media_path = MediaPath::parse("movie.eng.sup");
        assert_eq!(media_path.base_path(), Path::new("movie"));
        assert_eq!(media_path.language().alpha3(), "eng");
        assert_eq!(media_path.extension(), Some("sup"));
    }

    #[test]
    fn unrecognized_middle_extension_stays_in_the_base_name() {
        let media_path = MediaPath::parse("my.movie.sup");
        assert_eq!(media_path.base_path(), Path::new("my.movie"));
        assert!(media_path.language().is_undetermined());
    }

    #[test]
    fn no_middle_extension_defaults_to_undetermined() {
        let media_path = MediaPath::parse("movie.sup");
        assert_eq!(media_path.base_path(), Path::new("movie"));
        assert!(media_path.language().is_undetermined());
        assert_eq!(media_path.extension(), Some("sup"));
    }

    #[test]
    fn translate_is_a_pure_overwrite() {
        let media_path = MediaPath::parse("movie.eng.sup");
        let once = media_path.translate(MediaPathPatch {
            extension: Some(CompactString::new("srt")),
            ..MediaPathPatch::default()
        });
        let twice = once.translate(MediaPathPatch {
            extension: Some(CompactString::new("txt")),
            ..MediaPathPatch::default()
        });
        let direct = media_path.translate(MediaPathPatch {
            extension: Some(CompactString::new("txt")),
            ..MediaPathPatch::default()
        });
        assert_eq!(twice.to_string(), direct.to_string());
    }

    #[test]
    fn parse_recovers_the_numeric_suffix() {
        let media_path = MediaPath::parse("movie-2.eng.srt");
        assert_eq!(media_path.base_path(), Path::new("movie"));
        assert_eq!(media_path.number(), 2);
        assert_eq!(media_path.language().alpha3(), "eng");
        assert_eq!(media_path.to_string(), "movie-2.eng.srt");
    }

    #[test]
    fn non_numeric_dash_suffix_stays_in_the_base_name() {
        let media_path = MediaPath::parse("my-movie.eng.srt");
        assert_eq!(media_path.base_path(), Path::new("my-movie"));
        assert_eq!(media_path.number(), 0);
    }

    #[test]
    fn display_reassembles_the_structured_path() {
        let media_path = MediaPath::parse("movie.eng.sup").translate(MediaPathPatch {
            number: Some(2),
            extension: Some(CompactString::new("srt")),
            ..MediaPathPatch::default()
        });
        assert_eq!(media_path.to_string(), "movie-2.eng.srt");
    }
}
