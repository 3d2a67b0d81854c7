use crate::ocr::WordDetection;

/// Axis-aligned box of one detection, derived once per pass.
#[derive(Debug, Clone)]
pub(super) struct WordBox<'a> {
    pub(super) index: usize,
    pub(super) text: &'a str,
    pub(super) top: f64,
    pub(super) bottom: f64,
    pub(super) center_x: f64,
    pub(super) center_y: f64,
    pub(super) width: f64,
    pub(super) height: f64,
}

pub(super) fn word_box(index: usize, word: &WordDetection) -> WordBox<'_> {
    let mut left = f64::INFINITY;
    let mut right = f64::NEG_INFINITY;
    let mut top = f64::INFINITY;
    let mut bottom = f64::NEG_INFINITY;
    for corner in &word.corners {
        left = left.min(corner.x);
        right = right.max(corner.x);
        top = top.min(corner.y);
        bottom = bottom.max(corner.y);
    }

    WordBox {
        index,
        text: &word.text,
        top,
        bottom,
        center_x: (left + right) / 2.0,
        center_y: (top + bottom) / 2.0,
        width: right - left,
        height: bottom - top,
    }
}

/// Shared vertical extent over the smaller of the two heights.
pub(super) fn vertical_overlap_ratio(a_top: f64, a_bottom: f64, b_top: f64, b_bottom: f64) -> f64 {
    let min_h = (a_bottom - a_top).min(b_bottom - b_top);
    if min_h <= 0.0 {
        return 0.0;
    }
    let overlap = a_bottom.min(b_bottom) - a_top.max(b_top);
    if overlap <= 0.0 {
        return 0.0;
    }
    overlap / min_h
}
