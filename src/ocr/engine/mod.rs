mod geom;
mod lines;
mod segment;
mod text;

use tracing::debug;

use crate::ocr::{
    ClusterDebug, ClusterOutput, ClusterParams, ClusterReport, ImageSize, LineReport, PlacedText,
    WordDetection,
};

pub(super) fn run(words: &[WordDetection], image: ImageSize, params: &ClusterParams) -> ClusterReport {
    let image = image.sanitized();
    let boxes = words
        .iter()
        .enumerate()
        .map(|(idx, word)| geom::word_box(idx, word))
        .collect::<Vec<_>>();
    let clusters = lines::cluster_lines(&boxes, params);

    let mut texts = Vec::new();
    let mut reports = Vec::with_capacity(clusters.len());
    for (line_idx, line) in clusters.iter().enumerate() {
        let split = segment::split_line(line, &boxes, params);
        debug!(
            "line {}: {} words, {} segments, slope {:.4}, rtl {}",
            line_idx,
            line.members.len(),
            split.segments.len(),
            line.slope,
            split.rtl
        );

        let mut kept = Vec::new();
        for members in &split.segments {
            let joined = text::join_words(members);
            if joined.trim().is_empty() {
                continue;
            }
            let count = members.len() as f64;
            let cx = members.iter().map(|word| word.center_x).sum::<f64>() / count;
            let cy = members.iter().map(|word| word.center_y).sum::<f64>() / count;
            texts.push(PlacedText {
                text: joined,
                x: text::to_percent(cx, image.width),
                y: text::to_percent(cy, image.height),
            });
            kept.push(members.iter().map(|word| word.index).collect());
        }

        reports.push(LineReport {
            segments: kept,
            slope: line.slope,
            intercept: line.intercept,
            center_y: line.center_y,
            avg_height: line.avg_height,
            rtl: split.rtl,
        });
    }

    let total_clusters = texts.len();
    ClusterReport {
        output: ClusterOutput {
            texts,
            debug: ClusterDebug {
                total_words: words.len(),
                total_clusters,
                image_size: image,
            },
        },
        lines: reports,
    }
}
