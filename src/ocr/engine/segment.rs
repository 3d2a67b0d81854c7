use crate::ocr::ClusterParams;

use super::geom::WordBox;
use super::lines::LineCluster;
use super::text::line_is_rtl;

/// A word placed on the 1-D axis running along its line.
#[derive(Debug, Clone, Copy)]
struct Projected<'w, 'a> {
    word: &'w WordBox<'a>,
    center: f64,
    min: f64,
    max: f64,
    along: f64,
}

#[derive(Debug)]
pub(super) struct LineSegments<'w, 'a> {
    pub(super) rtl: bool,
    pub(super) segments: Vec<Vec<&'w WordBox<'a>>>,
}

/// Splits one finished line into phrases, each in reading order.
pub(super) fn split_line<'w, 'a>(
    line: &LineCluster,
    words: &'w [WordBox<'a>],
    params: &ClusterParams,
) -> LineSegments<'w, 'a> {
    let members = line
        .members
        .iter()
        .map(|&idx| &words[idx])
        .collect::<Vec<_>>();
    let rtl = line_is_rtl(&members);

    let angle = line.slope.atan();
    let (sin_a, cos_a) = angle.sin_cos();
    let mut projected = members
        .into_iter()
        .map(|word| {
            let center = word.center_x * cos_a + word.center_y * sin_a;
            let half = (cos_a.abs() * word.width + sin_a.abs() * word.height) / 2.0;
            Projected {
                word,
                center,
                min: center - half,
                max: center + half,
                along: half * 2.0,
            }
        })
        .collect::<Vec<_>>();
    if rtl {
        projected.sort_by(|a, b| b.center.total_cmp(&a.center));
    } else {
        projected.sort_by(|a, b| a.center.total_cmp(&b.center));
    }

    let mut segments = Vec::new();
    let mut current: Vec<&'w WordBox<'a>> = Vec::new();
    let mut prev: Option<Projected<'w, 'a>> = None;
    for item in projected {
        if let Some(last) = prev {
            let gap = if rtl {
                last.min - item.max
            } else {
                item.min - last.max
            };
            let avg_along = (last.along + item.along) / 2.0;
            let max_gap = (avg_along * params.gap_factor).max(line.avg_height * params.gap_factor);
            if gap > max_gap {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(item.word);
        prev = Some(item);
    }
    if !current.is_empty() {
        segments.push(current);
    }

    LineSegments { rtl, segments }
}
