//! Subtitle item construction: fuses display sets into timed, placed
//! bitmaps and repairs missing or inconsistent timings.
//!
//! Grounded on `original_source/pgsrip/media.py`'s `PgsSubtitleItem` and
//! `Pgs.decode`, re-expressed per the run-grouping algorithm the display-set
//! stream now exposes (§4.4): a run is the span of display sets from one
//! `is_start()` set up to, but not including, the next one.

use crate::{
    content::Area,
    image::ImageSize,
    media_path::MediaPath,
    pgs::{DisplaySet, PgsImage},
};

/// Items whose start is further than this from the next item's start, with
/// no end timestamp of their own, are dropped rather than repaired.
pub const TIMING_REPAIR_WINDOW_MS: u32 = 10_000;

/// One subtitle bitmap with its timing, placement and (once OCR'd) text.
pub struct PgsSubtitleItem {
    /// Position in the decode order, used for debug dumps and ordering ties.
    pub index: usize,
    /// The input this item was decoded from.
    pub media_path: MediaPath,
    /// Presentation start, in milliseconds.
    pub start_ms: u32,
    /// Presentation end, in milliseconds. `None` until repaired.
    pub end_ms: Option<u32>,
    pub(crate) image: PgsImage,
    /// Horizontal offset of the image on the original video frame.
    pub x_offset: u16,
    /// Vertical offset of the image on the original video frame.
    pub y_offset: u16,
    /// Text recognized by OCR, filled in by the ripper.
    pub text: Option<String>,
    /// Bounding box assigned to this item inside the OCR mosaic.
    pub place: Option<Area>,
}

impl PgsSubtitleItem {
    /// The decoded subtitle bitmap.
    #[must_use]
    pub const fn image(&self) -> &PgsImage {
        &self.image
    }

    /// Width of the decoded bitmap, in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the decoded bitmap, in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(top, left, bottom, right)` on the original video frame.
    #[must_use]
    pub fn shape(&self) -> (u32, u32, u32, u32) {
        let top = u32::from(self.y_offset);
        let left = u32::from(self.x_offset);
        (top, left, top + self.height(), left + self.width())
    }

    /// Vertical midpoint of this item's shape.
    #[must_use]
    pub fn h_center(&self) -> u32 {
        let (top, _, bottom, _) = self.shape();
        top + (bottom - top) / 2
    }

    /// Whether `other`'s vertical center falls within this item's band.
    ///
    /// Used to cluster items sharing one mosaic row (spec §3, §4.5).
    #[must_use]
    pub fn intersect(&self, other: &Self) -> bool {
        let (top, _, bottom, _) = self.shape();
        let center = other.h_center();
        top <= center && center <= bottom
    }
}

fn build_item(
    run: &[DisplaySet],
    media_path: &MediaPath,
    index: usize,
) -> Option<PgsSubtitleItem> {
    let source = run.iter().find(|ds| ds.is_start()).or_else(|| run.first())?;
    let image = source.build_image()?;
    let start_ms = run.iter().map(DisplaySet::pts_ms).min()?;
    let end_candidate = run.iter().map(DisplaySet::pts_ms).max()?;
    let end_ms = (end_candidate > start_ms).then_some(end_candidate);
    let (x_offset, y_offset) = run
        .iter()
        .filter_map(DisplaySet::window_offset)
        .reduce(|(ax, ay), (bx, by)| (ax.min(bx), ay.min(by)))
        .unwrap_or((0, 0));

    Some(PgsSubtitleItem {
        index,
        media_path: media_path.clone(),
        start_ms,
        end_ms,
        image,
        x_offset,
        y_offset,
        text: None,
        place: None,
    })
}

/// Groups a display-set stream into subtitle items (spec §4.4).
///
/// A run starts at one `is_start()` display set and extends up to, but not
/// including, the next one. A run with no decodable image yields no item
/// (boundary: a single display set with no ODS emits nothing).
#[must_use]
pub fn build_items(
    display_sets: impl Iterator<Item = DisplaySet>,
    media_path: &MediaPath,
) -> Vec<PgsSubtitleItem> {
    let mut items = Vec::new();
    let mut current: Vec<DisplaySet> = Vec::new();
    let mut index = 0;

    for ds in display_sets {
        if !current.is_empty() && ds.is_start() {
            if let Some(item) = build_item(&current, media_path, index) {
                index += 1;
                items.push(item);
            }
            current.clear();
        }
        current.push(ds);
    }
    if !current.is_empty() {
        if let Some(item) = build_item(&current, media_path, index) {
            items.push(item);
        }
    }

    repair_timings(items)
}

/// Walks items pairwise, filling in missing/invalid end timestamps from the
/// next item's start, or dropping the item when no such neighbor exists
/// within [`TIMING_REPAIR_WINDOW_MS`] (spec §4.4, §8).
fn repair_timings(items: Vec<PgsSubtitleItem>) -> Vec<PgsSubtitleItem> {
    let starts: Vec<u32> = items.iter().map(|item| item.start_ms).collect();
    let mut out = Vec::with_capacity(items.len());

    for (i, mut item) in items.into_iter().enumerate() {
        let needs_repair = item.end_ms.is_none_or(|end| end <= item.start_ms);
        if needs_repair {
            let Some(&next_start) = starts.get(i + 1) else {
                log::warn!("Dropping item {}: no end timestamp and no follower", item.index);
                continue;
            };
            let gap = next_start.saturating_sub(item.start_ms);
            if gap > TIMING_REPAIR_WINDOW_MS {
                log::warn!(
                    "Dropping item {}: next item is {gap}ms away, past the {TIMING_REPAIR_WINDOW_MS}ms repair window",
                    item.index
                );
                continue;
            }
            let repaired_end = (item.start_ms + 1).max(next_start.saturating_sub(1));
            log::debug!("Repaired end timing for item {}: {repaired_end}ms", item.index);
            item.end_ms = Some(repaired_end);
        }
        out.push(item);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgs::SupParser;
    use std::io::Cursor;

    fn segment(tag: u8, pts: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x50, 0x47];
        bytes.extend_from_slice(&pts.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(tag);
        bytes.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn epoch(pts: u32) -> Vec<u8> {
        let mut stream = Vec::new();
        let pcs_payload = [0, 10, 0, 1, 0x10, 0, 0, 0x80, 0, 0, 0];
        stream.extend(segment(0x16, pts, &pcs_payload));
        let wds_payload = [1, 0, 0, 10, 0, 20, 0, 4, 0, 1];
        stream.extend(segment(0x17, pts, &wds_payload));
        let pds_payload = [0, 0, 0, 16, 128, 128, 255, 1, 235, 128, 128, 255];
        stream.extend(segment(0x14, pts, &pds_payload));
        let mut ods_payload = vec![0, 1, 0, 0xC0, 0, 0, 8, 0, 4, 0, 1];
        ods_payload.extend_from_slice(&[1, 1, 1, 1]);
        stream.extend(segment(0x15, pts, &ods_payload));
        stream.extend(segment(0x80, pts, &[]));
        stream
    }

    fn end_only(pts: u32) -> Vec<u8> {
        let mut stream = Vec::new();
        let pcs_payload = [0, 10, 0, 1, 0x10, 0, 0, 0x00, 0, 0, 0];
        stream.extend(segment(0x16, pts, &pcs_payload));
        let wds_payload = [1, 0, 0, 10, 0, 20, 0, 4, 0, 1];
        stream.extend(segment(0x17, pts, &wds_payload));
        stream.extend(segment(0x80, pts, &[]));
        stream
    }

    fn media_path() -> MediaPath {
        MediaPath::parse("movie.sup")
    }

    #[test]
    fn standalone_epoch_is_dropped_without_a_follower() {
        let parser = SupParser::new(Cursor::new(epoch(9000)));
        let items = build_items(parser, &media_path());
        assert!(items.is_empty());
    }

    #[test]
    fn end_only_display_set_supplies_the_end_timestamp() {
        let mut stream = epoch(9000);
        stream.extend(end_only(18_000));
        let parser = SupParser::new(Cursor::new(stream));
        let items = build_items(parser, &media_path());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].start_ms, 100);
        assert_eq!(items[0].end_ms, Some(200));
    }

    #[test]
    fn adjacent_subtitles_repair_each_other_and_the_last_is_dropped() {
        let mut stream = epoch(9000);
        stream.extend(epoch(18_000));
        let parser = SupParser::new(Cursor::new(stream));
        let items = build_items(parser, &media_path());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].start_ms, 100);
        assert_eq!(items[0].end_ms, Some(199));
    }

    #[test]
    fn gap_past_the_repair_window_drops_the_earlier_item() {
        let mut stream = epoch(0);
        stream.extend(epoch(10_001 * 90));
        let parser = SupParser::new(Cursor::new(stream));
        let items = build_items(parser, &media_path());
        assert!(items.is_empty());
    }
}
