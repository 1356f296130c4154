//! Mosaic layout: packs many subtitle bitmaps into one composite image so
//! the OCR engine can be invoked once per pass instead of once per item.
//!
//! Grounded on `original_source/pgsrip/ripper.py`'s `ImageArea`/`FullImage`.

use crate::{
    content::{Area, AreaValues},
    item::PgsSubtitleItem,
};
use image::{GrayImage, Luma};
use thiserror::Error;

/// Errors raised while laying out the OCR mosaic.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// Asked to lay out an empty item list.
    #[error("No items to lay out in the mosaic")]
    Empty,
}

const BORDER: u32 = 100;

/// Derives the vertical/horizontal gap between mosaic rows and items from
/// the tallest item (spec §4.5): a wider horizontal gap keeps OCR from
/// fusing two adjacent items into a single word.
#[must_use]
pub fn gap(items: &[PgsSubtitleItem]) -> (u32, u32) {
    let max_height = items.iter().map(PgsSubtitleItem::height).max().unwrap_or(0);
    (max_height / 2 + 30, max_height / 2 + 100)
}

fn group_into_areas(items: &[PgsSubtitleItem], gap_x: u32, max_width: u32) -> Vec<Vec<usize>> {
    let mut remaining: Vec<usize> = (0..items.len()).collect();
    remaining.sort_by_key(|&i| items[i].height());

    let mut areas = Vec::new();
    while !remaining.is_empty() {
        let first = remaining.remove(0);
        let first_item = &items[first];
        let (cluster, rest): (Vec<usize>, Vec<usize>) = remaining
            .iter()
            .copied()
            .partition(|&i| items[i].intersect(first_item));
        remaining = rest;

        let mut cluster_items = Vec::with_capacity(cluster.len() + 1);
        cluster_items.push(first);
        cluster_items.extend(cluster);

        let mut current = Vec::new();
        let mut current_width = 0u32;
        for idx in cluster_items {
            current_width += items[idx].width() + gap_x;
            if current_width > max_width && !current.is_empty() {
                areas.push(std::mem::take(&mut current));
                current_width = items[idx].width();
            }
            current.push(idx);
        }
        if !current.is_empty() {
            areas.push(current);
        }
    }
    areas
}

struct Row {
    indices: Vec<usize>,
    top: u32,
    bottom: u32,
    width: u32,
}

fn measure_row(items: &[PgsSubtitleItem], indices: Vec<usize>, gap_x: u32) -> Row {
    let top = indices
        .iter()
        .map(|&i| items[i].shape().0)
        .min()
        .unwrap_or(0);
    let bottom = indices
        .iter()
        .map(|&i| items[i].shape().2)
        .max()
        .unwrap_or(0);
    let width = indices.iter().map(|&i| items[i].width()).sum::<u32>()
        + gap_x.saturating_mul(indices.len().saturating_sub(1) as u32);
    Row {
        indices,
        top,
        bottom,
        width,
    }
}

fn to_area(top: u32, left: u32, bottom: u32, right: u32) -> Option<Area> {
    let clamp = |value: u32| u16::try_from(value).unwrap_or(u16::MAX);
    let values = AreaValues {
        x1: clamp(left),
        y1: clamp(top),
        x2: clamp(right.saturating_sub(1)),
        y2: clamp(bottom.saturating_sub(1)),
    };
    Area::try_from(values).ok()
}

/// Packs `items` into one composite binary (OCR-friendly) image, bounded to
/// `max_width` pixels wide per row. Returns the image plus each item's
/// placement, aligned by index to `items`.
///
/// # Errors
///
/// Returns [`MosaicError::Empty`] if `items` is empty.
pub fn layout(
    items: &[PgsSubtitleItem],
    max_width: u32,
) -> Result<(GrayImage, Vec<Option<Area>>), MosaicError> {
    if items.is_empty() {
        return Err(MosaicError::Empty);
    }

    let (gap_y, gap_x) = gap(items);
    let rows: Vec<Row> = group_into_areas(items, gap_x, max_width)
        .into_iter()
        .map(|indices| measure_row(items, indices, gap_x))
        .collect();

    let total_height = rows.iter().map(|row| row.bottom - row.top).sum::<u32>()
        + gap_y.saturating_mul(rows.len().saturating_sub(1) as u32)
        + 2 * BORDER;
    let total_width = rows.iter().map(|row| row.width).max().unwrap_or(0) + 2 * BORDER;

    let mut canvas = GrayImage::from_pixel(total_width, total_height, Luma([255]));
    let mut places: Vec<Option<Area>> = vec![None; items.len()];

    let mut row_top = BORDER;
    for row in &rows {
        let mut column = BORDER;
        for &idx in &row.indices {
            let item = &items[idx];
            let (item_top, ..) = item.shape();
            let top = row_top + (item_top - row.top);
            let left = column;
            let bottom = top + item.height();
            let right = left + item.width();

            let binary = item.image().to_binary_image();
            for y in 0..binary.height() {
                for x in 0..binary.width() {
                    if top + y < bottom && left + x < right {
                        canvas.put_pixel(left + x, top + y, *binary.get_pixel(x, y));
                    }
                }
            }

            places[idx] = to_area(top, left, bottom, right);
            column += item.width() + gap_x;
        }
        row_top += (row.bottom - row.top) + gap_y;
    }

    Ok((canvas, places))
}
