use crate::ocr::ClusterParams;

use super::geom::{WordBox, vertical_overlap_ratio};

/// Words believed to share one visual, possibly tilted, line.
#[derive(Debug, Clone)]
pub(super) struct LineCluster {
    /// Input indices in arrival order.
    pub(super) members: Vec<usize>,
    pub(super) center_y: f64,
    pub(super) avg_height: f64,
    pub(super) top: f64,
    pub(super) bottom: f64,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_xy: f64,
    pub(super) slope: f64,
    pub(super) intercept: f64,
}

impl LineCluster {
    fn new(word: &WordBox<'_>) -> Self {
        Self {
            members: vec![word.index],
            center_y: word.center_y,
            avg_height: word.height,
            top: word.top,
            bottom: word.bottom,
            sum_x: word.center_x,
            sum_y: word.center_y,
            sum_xx: word.center_x * word.center_x,
            sum_xy: word.center_x * word.center_y,
            slope: 0.0,
            intercept: word.center_y,
        }
    }

    fn distance_to(&self, word: &WordBox<'_>) -> f64 {
        if self.members.len() < 2 {
            return (word.center_y - self.center_y).abs();
        }
        let predicted = self.slope * word.center_x + self.intercept;
        (word.center_y - predicted).abs()
    }

    /// Distance to `word` when the line would take it, `None` otherwise.
    fn accepts(&self, word: &WordBox<'_>, params: &ClusterParams) -> Option<f64> {
        let distance = self.distance_to(word);
        let reference_h = self.avg_height.max(word.height);
        if distance <= params.strict_distance_factor * reference_h {
            return Some(distance);
        }
        let overlap = vertical_overlap_ratio(self.top, self.bottom, word.top, word.bottom);
        if overlap > params.overlap_ratio_threshold
            && distance <= params.relaxed_distance_factor * reference_h
        {
            return Some(distance);
        }
        None
    }

    fn push(&mut self, word: &WordBox<'_>, params: &ClusterParams) {
        self.members.push(word.index);
        let n = self.members.len() as f64;

        self.center_y = (self.center_y * (n - 1.0) + word.center_y) / n;
        self.avg_height = (self.avg_height * (n - 1.0) + word.height) / n;
        self.top = self.top.min(word.top);
        self.bottom = self.bottom.max(word.bottom);

        self.sum_x += word.center_x;
        self.sum_y += word.center_y;
        self.sum_xx += word.center_x * word.center_x;
        self.sum_xy += word.center_x * word.center_y;

        let denominator = n * self.sum_xx - self.sum_x * self.sum_x;
        self.slope = if n > 1.0 && denominator.abs() > params.slope_epsilon {
            (n * self.sum_xy - self.sum_x * self.sum_y) / denominator
        } else {
            0.0
        };
        self.intercept = (self.sum_y - self.slope * self.sum_x) / n;
    }
}

/// Greedy best-fit assignment, top of the image first.
pub(super) fn cluster_lines(words: &[WordBox<'_>], params: &ClusterParams) -> Vec<LineCluster> {
    let mut order = words.iter().collect::<Vec<_>>();
    order.sort_by(|a, b| a.center_y.total_cmp(&b.center_y));

    let mut clusters: Vec<LineCluster> = Vec::new();
    for word in order {
        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            let Some(distance) = cluster.accepts(word, params) else {
                continue;
            };
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((idx, distance)),
            }
        }
        match best {
            Some((idx, _)) => clusters[idx].push(word, params),
            None => clusters.push(LineCluster::new(word)),
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::WordDetection;
    use crate::ocr::engine::geom::word_box;

    fn boxes(words: &[WordDetection]) -> Vec<WordBox<'_>> {
        words
            .iter()
            .enumerate()
            .map(|(idx, word)| word_box(idx, word))
            .collect()
    }

    #[test]
    fn words_on_one_band_share_a_cluster() {
        let words = vec![
            WordDetection::centered("a", 10.0, 100.0, 20.0, 20.0),
            WordDetection::centered("b", 50.0, 104.0, 20.0, 20.0),
            WordDetection::centered("c", 90.0, 98.0, 20.0, 20.0),
        ];
        let clusters = cluster_lines(&boxes(&words), &ClusterParams::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 3);
    }

    #[test]
    fn members_follow_vertical_arrival_order() {
        let words = vec![
            WordDetection::centered("low", 10.0, 104.0, 20.0, 20.0),
            WordDetection::centered("high", 60.0, 100.0, 20.0, 20.0),
        ];
        let clusters = cluster_lines(&boxes(&words), &ClusterParams::default());
        assert_eq!(clusters[0].members, vec![1, 0]);
    }

    #[test]
    fn distant_lines_are_separate() {
        let words = vec![
            WordDetection::centered("first", 10.0, 100.0, 20.0, 20.0),
            WordDetection::centered("second", 10.0, 200.0, 20.0, 20.0),
        ];
        let clusters = cluster_lines(&boxes(&words), &ClusterParams::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![0]);
        assert_eq!(clusters[1].members, vec![1]);
        assert_eq!(clusters[1].intercept, 200.0);
        assert_eq!(clusters[1].slope, 0.0);
    }

    #[test]
    fn fit_follows_tilted_line() {
        let words = (0..5)
            .map(|i| {
                let cx = 40.0 + i as f64 * 40.0;
                WordDetection::centered(format!("w{i}"), cx, 100.0 + 0.3 * cx, 30.0, 20.0)
            })
            .collect::<Vec<_>>();
        let clusters = cluster_lines(&boxes(&words), &ClusterParams::default());
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].slope - 0.3).abs() < 1e-9);
        assert!((clusters[0].intercept - 100.0).abs() < 1e-9);
    }

    #[test]
    fn relaxed_distance_needs_overlap() {
        // Stacked pair: zero slope, line at y=105, band 90..120.
        let params = ClusterParams::default();
        let mut line = LineCluster::new(&word_box(
            0,
            &WordDetection::centered("a", 10.0, 100.0, 20.0, 20.0),
        ));
        line.push(
            &word_box(1, &WordDetection::centered("b", 10.0, 110.0, 20.0, 20.0)),
            &params,
        );

        // 17px away: beyond the strict 15px, overlap 8/20 unlocks the relaxed 22px.
        let near = WordDetection::centered("c", 40.0, 122.0, 20.0, 20.0);
        assert_eq!(line.accepts(&word_box(2, &near), &params), Some(17.0));

        // 19px away: overlap 6/20 is not enough.
        let far = WordDetection::centered("d", 40.0, 124.0, 20.0, 20.0);
        assert_eq!(line.accepts(&word_box(3, &far), &params), None);
    }

    #[test]
    fn vertical_stack_keeps_zero_slope() {
        let params = ClusterParams::default();
        let mut line = LineCluster::new(&word_box(
            0,
            &WordDetection::centered("a", 10.0, 100.0, 20.0, 20.0),
        ));
        line.push(
            &word_box(1, &WordDetection::centered("b", 10.0, 110.0, 20.0, 20.0)),
            &params,
        );
        assert_eq!(line.slope, 0.0);
        assert_eq!(line.intercept, 105.0);
        assert_eq!(line.center_y, 105.0);
    }

    fn sloped_and_flat_lines(probe_y: f64) -> Vec<LineCluster> {
        // Line A rises with slope 0.1, line B starts far to the right.
        let words = vec![
            WordDetection::centered("a1", 0.0, 100.0, 20.0, 20.0),
            WordDetection::centered("a2", 100.0, 110.0, 20.0, 20.0),
            WordDetection::centered("b1", 1000.0, 130.0, 20.0, 20.0),
            WordDetection::centered("probe", 500.0, probe_y, 20.0, 20.0),
        ];
        cluster_lines(&boxes(&words), &ClusterParams::default())
    }

    #[test]
    fn nearest_accepting_line_wins() {
        let clusters = sloped_and_flat_lines(141.0);
        assert_eq!(clusters[0].members, vec![0, 1, 3]);
        assert_eq!(clusters[1].members, vec![2]);

        let clusters = sloped_and_flat_lines(139.0);
        assert_eq!(clusters[0].members, vec![0, 1]);
        assert_eq!(clusters[1].members, vec![2, 3]);
    }

    #[test]
    fn ties_go_to_the_older_cluster() {
        let clusters = sloped_and_flat_lines(140.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![0, 1, 3]);
        assert_eq!(clusters[1].members, vec![2]);
    }
}
