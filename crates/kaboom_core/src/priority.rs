use serde::Deserialize;

/// Scheduling class for an asset request.
/// Critical assets gate the first playable frame; the rest load afterwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPriority {
    /// Awaited before gameplay starts.
    Critical,
    /// First thing loaded once the game is playable.
    High,
    #[default]
    Medium,
    /// Loaded opportunistically, last.
    Low,
}

impl LoadPriority {
    /// All tiers in scheduling order.
    pub const ALL: &'static [LoadPriority] = &[
        LoadPriority::Critical,
        LoadPriority::High,
        LoadPriority::Medium,
        LoadPriority::Low,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Default number of concurrent fetches per batch for this tier.
    pub fn default_batch_size(self) -> usize {
        match self {
            Self::Critical => 6,
            Self::High | Self::Medium => 3,
            Self::Low => 2,
        }
    }
}

impl std::fmt::Display for LoadPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_scheduling_order() {
        let mut sorted = LoadPriority::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, LoadPriority::ALL);
        assert_eq!(LoadPriority::ALL.first(), Some(&LoadPriority::Critical));
    }

    #[test]
    fn critical_batches_widest() {
        for &tier in LoadPriority::ALL {
            assert!(tier.default_batch_size() >= 1);
            assert!(tier.default_batch_size() <= LoadPriority::Critical.default_batch_size());
        }
    }

    #[test]
    fn deserializes_lowercase_names() {
        let p: LoadPriority = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(p, LoadPriority::High);
        assert_eq!(format!("{}", LoadPriority::Low), "low");
    }
}
