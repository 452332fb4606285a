use plotly::color::NamedColor;
use serde::{Deserialize, Serialize};

/// Route counts at which a route moves into the medium and high tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyThresholds {
    pub medium: usize,
    pub high: usize,
}

impl Default for FrequencyThresholds {
    fn default() -> Self {
        Self { medium: 5, high: 10 }
    }
}

impl FrequencyThresholds {
    /// Returns a description of the problem when the thresholds cannot form
    /// three ordered tiers.
    pub fn check(&self) -> Result<(), String> {
        if self.medium == 0 {
            return Err("medium threshold must be at least 1".into());
        }
        if self.medium > self.high {
            return Err(format!(
                "medium threshold {} exceeds high threshold {}",
                self.medium, self.high
            ));
        }
        Ok(())
    }
}

/// Frequency bucket of a route.
///
/// | Count                    | Tier   | Colour |
/// |--------------------------|--------|--------|
/// | `< medium`               | Low    | blue   |
/// | `medium ..< high`        | Medium | red    |
/// | `>= high`                | High   | green  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyTier {
    Low,
    Medium,
    High,
}

impl FrequencyTier {
    pub fn classify(count: usize, thresholds: &FrequencyThresholds) -> Self {
        match count {
            c if c >= thresholds.high => Self::High,
            c if c >= thresholds.medium => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn color(self) -> NamedColor {
        match self {
            Self::Low => NamedColor::Blue,
            Self::Medium => NamedColor::Red,
            Self::High => NamedColor::Green,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let t = FrequencyThresholds::default();
        assert_eq!(FrequencyTier::classify(1, &t), FrequencyTier::Low);
        assert_eq!(FrequencyTier::classify(4, &t), FrequencyTier::Low);
        assert_eq!(FrequencyTier::classify(5, &t), FrequencyTier::Medium);
        assert_eq!(FrequencyTier::classify(9, &t), FrequencyTier::Medium);
        assert_eq!(FrequencyTier::classify(10, &t), FrequencyTier::High);
        assert_eq!(FrequencyTier::classify(250, &t), FrequencyTier::High);
    }

    #[test]
    fn test_equal_thresholds_skip_medium() {
        let t = FrequencyThresholds { medium: 3, high: 3 };
        assert_eq!(FrequencyTier::classify(2, &t), FrequencyTier::Low);
        assert_eq!(FrequencyTier::classify(3, &t), FrequencyTier::High);
    }

    #[test]
    fn test_threshold_check() {
        assert!(FrequencyThresholds::default().check().is_ok());
        assert!(FrequencyThresholds { medium: 0, high: 4 }.check().is_err());
        assert!(FrequencyThresholds { medium: 6, high: 4 }.check().is_err());
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(FrequencyTier::Low.label(), "low");
        assert_eq!(FrequencyTier::Medium.label(), "medium");
        assert_eq!(FrequencyTier::High.label(), "high");
    }
}
