use crate::types::Color;

/// 8-bit RGB triple. The whole report draws from the [`palette`] table below so
/// the document and any UI that renders the same scores agree on color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// Parses `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Shifts each channel by a signed offset, saturating at 0 and 255.
    pub fn offset(self, dr: i16, dg: i16, db: i16) -> Self {
        let shift = |v: u8, d: i16| (v as i16 + d).clamp(0, 255) as u8;
        Self::new(shift(self.r, dr), shift(self.g, dg), shift(self.b, db))
    }
}

impl From<Rgb> for Color {
    fn from(value: Rgb) -> Self {
        Color::from_rgb8(value.r, value.g, value.b)
    }
}

pub mod palette {
    use super::Rgb;

    pub const GREEN: Rgb = Rgb::new(16, 185, 129);
    pub const CYAN: Rgb = Rgb::new(6, 182, 212);
    pub const AMBER: Rgb = Rgb::new(245, 158, 11);
    pub const RED: Rgb = Rgb::new(239, 68, 68);
    pub const SLATE: Rgb = Rgb::new(107, 114, 128);

    pub const WHITE: Rgb = Rgb::gray(255);
    pub const INK: Rgb = Rgb::gray(30);
    pub const CARD: Rgb = Rgb::new(248, 249, 250);
    pub const TRACK: Rgb = Rgb::gray(230);
    pub const RULE: Rgb = Rgb::gray(220);
    pub const MUTED: Rgb = Rgb::gray(150);

    pub const PASS_TINT: Rgb = Rgb::new(236, 253, 243);
    pub const FAIL_TINT: Rgb = Rgb::new(254, 242, 242);
    pub const WARN_TINT: Rgb = Rgb::new(255, 250, 235);
    pub const SAVINGS: Rgb = Rgb::new(180, 100, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreTier {
    Poor,
    NeedsImprovement,
    Good,
    Excellent,
}

impl ScoreTier {
    pub fn label(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "Excellent",
            ScoreTier::Good => "Good",
            ScoreTier::NeedsImprovement => "Needs Improvement",
            ScoreTier::Poor => "Poor",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            ScoreTier::Excellent => palette::GREEN,
            ScoreTier::Good => palette::CYAN,
            ScoreTier::NeedsImprovement => palette::AMBER,
            ScoreTier::Poor => palette::RED,
        }
    }
}

/// Clamps a score into 0..=100. Non-finite input counts as 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn tier(score: f64) -> ScoreTier {
    let score = clamp_score(score);
    if score >= 90.0 {
        ScoreTier::Excellent
    } else if score >= 70.0 {
        ScoreTier::Good
    } else if score >= 50.0 {
        ScoreTier::NeedsImprovement
    } else {
        ScoreTier::Poor
    }
}

pub fn classify(score: f64) -> (ScoreTier, Rgb) {
    let tier = tier(score);
    (tier, tier.color())
}

pub fn score_color(score: f64) -> Rgb {
    classify(score).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_the_higher_tier() {
        assert_eq!(tier(90.0), ScoreTier::Excellent);
        assert_eq!(tier(89.99), ScoreTier::Good);
        assert_eq!(tier(70.0), ScoreTier::Good);
        assert_eq!(tier(69.5), ScoreTier::NeedsImprovement);
        assert_eq!(tier(50.0), ScoreTier::NeedsImprovement);
        assert_eq!(tier(49.0), ScoreTier::Poor);
    }

    #[test]
    fn classification_is_monotonic_over_the_whole_range() {
        let mut previous = tier(0.0);
        for step in 0..=1000 {
            let current = tier(step as f64 / 10.0);
            assert!(current >= previous, "tier dropped at {}", step as f64 / 10.0);
            previous = current;
        }
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        assert_eq!(classify(250.0), (ScoreTier::Excellent, palette::GREEN));
        assert_eq!(classify(-4.0), (ScoreTier::Poor, palette::RED));
        assert_eq!(classify(f64::NAN), (ScoreTier::Poor, palette::RED));
    }

    #[test]
    fn tier_colors_match_palette() {
        assert_eq!(score_color(95.0), palette::GREEN);
        assert_eq!(score_color(75.0), palette::CYAN);
        assert_eq!(score_color(55.0), palette::AMBER);
        assert_eq!(ScoreTier::NeedsImprovement.label(), "Needs Improvement");
    }

    #[test]
    fn hex_parsing_accepts_optional_hash() {
        assert_eq!(Rgb::from_hex("#0075FF"), Some(Rgb::new(0, 117, 255)));
        assert_eq!(Rgb::from_hex("10b981"), Some(palette::GREEN));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn offset_saturates() {
        assert_eq!(Rgb::new(10, 200, 250).offset(-15, -15, 20), Rgb::new(0, 185, 255));
    }
}
