//! News calendar
//!
//! Only some news bulletins are current on a given day. The calendar maps a
//! day of month to the base names (extension stripped) eligible that day.

use crate::Result;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

/// Decides which news base names may air on a given day of month
pub trait DayEligibility: Send + Sync {
    fn is_eligible(&self, day_of_month: u32, base_name: &str) -> bool;
}

/// JSON-backed calendar: `{"1": ["NEWS_01", ...], "2": [...]}`
///
/// A day with no entry has no eligible bulletins.
#[derive(Debug, Clone, Default)]
pub struct NewsCalendar {
    days: HashMap<u32, HashSet<String>>,
}

impl NewsCalendar {
    pub fn new(days: HashMap<u32, HashSet<String>>) -> Self {
        Self { days }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(content)?;
        let mut days = HashMap::new();
        for (key, names) in raw {
            match key.trim().parse::<u32>() {
                Ok(day) if (1..=31).contains(&day) => {
                    days.insert(day, names.into_iter().collect());
                }
                _ => warn!("Ignoring news calendar entry with invalid day {:?}", key),
            }
        }
        Ok(Self { days })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load the calendar, degrading to an empty one (no news airs)
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(calendar) => calendar,
            Err(e) => {
                warn!("News calendar unavailable ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }
}

impl DayEligibility for NewsCalendar {
    fn is_eligible(&self, day_of_month: u32, base_name: &str) -> bool {
        self.days
            .get(&day_of_month)
            .is_some_and(|names| names.contains(base_name))
    }
}
