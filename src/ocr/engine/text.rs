use super::geom::WordBox;

pub(super) fn is_arabic(ch: char) -> bool {
    matches!(ch as u32, 0x0600..=0x06FF)
}

/// A line reads right-to-left as soon as one member carries Arabic script.
pub(super) fn line_is_rtl(words: &[&WordBox<'_>]) -> bool {
    words.iter().any(|word| word.text.chars().any(is_arabic))
}

pub(super) fn join_words(words: &[&WordBox<'_>]) -> String {
    words
        .iter()
        .map(|word| word.text)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn to_percent(value: f64, extent: f64) -> f64 {
    (value / extent * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_range_bounds() {
        assert!(is_arabic('\u{0600}'));
        assert!(is_arabic('م'));
        assert!(is_arabic('\u{06FF}'));
        assert!(!is_arabic('\u{0700}'));
        assert!(!is_arabic('a'));
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(to_percent(250.0, 1000.0), 25.0);
        assert_eq!(to_percent(-5.0, 1000.0), 0.0);
        assert_eq!(to_percent(1200.0, 1000.0), 100.0);
    }
}
