//! Heuristic weights and the tuning surface over them.
//!
//! A [`HeuristicWeights`] value is owned by each search policy and handed to
//! the evaluator by reference, so weights can only change between searches.
//!
//! ```
//! use snake_2048::weights::{HeuristicWeights, Preset};
//! let mut w = HeuristicWeights::default();
//! w.apply_preset(Preset::Balanced);
//! assert_eq!(w.snake_weight, 10.0);
//! assert!(w.set("snake_bonus", 2.5).is_ok());
//! assert!(w.set("no_such_key", 1.0).is_err());
//! ```

use std::fmt;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(thiserror::Error, Debug)]
pub enum WeightsError {
    #[error("unknown weight key {key:?}; available keys: {}", .valid.join(", "))]
    UnknownKey { key: String, valid: Vec<&'static str> },
    #[error("snake strength must be between 1 (weak) and 5 (extreme), got {0}")]
    InvalidStrength(u8),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Tunable knobs of the configurable snake heuristic.
///
/// Defaults are the "super" snake configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// Multiplier on the in-game score.
    pub base_score_weight: f64,
    /// Added per empty cell (capped at 8 cells).
    pub empty_cell_bonus: f64,
    /// Empty-cell count at which `empty_cell_multiplier` kicks in.
    pub empty_cell_threshold: f64,
    pub empty_cell_multiplier: f64,
    /// Added per monotonic row or column.
    pub monotonic_bonus: f64,
    /// Applied when the largest tile sits in a corner.
    pub corner_multiplier: f64,
    /// Divisor on the best snake dot product; lower pushes harder towards the snake.
    pub snake_weight: f64,
    pub snake_bonus: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            base_score_weight: 0.1,
            empty_cell_bonus: 500.0,
            empty_cell_threshold: 4.0,
            empty_cell_multiplier: 2.0,
            monotonic_bonus: 10_000.0,
            corner_multiplier: 500.0,
            snake_weight: 2.0,
            snake_bonus: 5.0,
        }
    }
}

/// Named multi-key configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    Strong,
    Super,
    Balanced,
}

/// `(snake_weight, snake_bonus)` for strength levels 1..=5.
const SNAKE_STRENGTHS: [(f64, f64); 5] = [(20.0, 0.5), (10.0, 1.0), (5.0, 2.0), (3.0, 3.0), (1.0, 5.0)];

impl HeuristicWeights {
    pub const KEYS: [&'static str; 8] = [
        "base_score_weight",
        "empty_cell_bonus",
        "empty_cell_threshold",
        "empty_cell_multiplier",
        "monotonic_bonus",
        "corner_multiplier",
        "snake_weight",
        "snake_bonus",
    ];

    /// Valid keys for [`get`](Self::get) and [`set`](Self::set).
    #[inline]
    pub fn keys() -> &'static [&'static str] { &Self::KEYS }

    fn slot_mut(&mut self, key: &str) -> Option<&mut f64> {
        Some(match key {
            "base_score_weight" => &mut self.base_score_weight,
            "empty_cell_bonus" => &mut self.empty_cell_bonus,
            "empty_cell_threshold" => &mut self.empty_cell_threshold,
            "empty_cell_multiplier" => &mut self.empty_cell_multiplier,
            "monotonic_bonus" => &mut self.monotonic_bonus,
            "corner_multiplier" => &mut self.corner_multiplier,
            "snake_weight" => &mut self.snake_weight,
            "snake_bonus" => &mut self.snake_bonus,
            _ => return None,
        })
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        let mut copy = *self;
        copy.slot_mut(key).map(|v| *v)
    }

    /// All `(key, value)` pairs in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        Self::KEYS
            .iter()
            .filter_map(|&k| self.get(k).map(|v| (k, v)))
            .collect()
    }

    /// Set a single weight. Unknown keys leave the weights untouched.
    pub fn set(&mut self, key: &str, value: f64) -> Result<(), WeightsError> {
        match self.slot_mut(key) {
            Some(slot) => {
                *slot = value;
                info!(key, value, "weight updated");
                Ok(())
            }
            None => Err(WeightsError::UnknownKey { key: key.to_string(), valid: Self::KEYS.to_vec() }),
        }
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        match preset {
            Preset::Strong => {
                self.snake_weight = 5.0;
                self.snake_bonus = 3.0;
                self.corner_multiplier = 200.0;
                self.monotonic_bonus = 8_000.0;
            }
            Preset::Super => {
                self.snake_weight = 2.0;
                self.snake_bonus = 5.0;
                self.corner_multiplier = 500.0;
                self.monotonic_bonus = 10_000.0;
                self.empty_cell_bonus = 500.0;
            }
            Preset::Balanced => {
                self.snake_weight = 10.0;
                self.snake_bonus = 1.0;
                self.corner_multiplier = 100.0;
                self.monotonic_bonus = 5_000.0;
                self.empty_cell_bonus = 1_000.0;
            }
        }
        info!(?preset, "weight preset applied");
    }

    /// Map a strength level (1 weak ..= 5 extreme) onto the snake weight/bonus pair.
    pub fn set_snake_strength(&mut self, level: u8) -> Result<(), WeightsError> {
        let (weight, bonus) = level
            .checked_sub(1)
            .and_then(|i| SNAKE_STRENGTHS.get(i as usize))
            .copied()
            .ok_or(WeightsError::InvalidStrength(level))?;
        self.snake_weight = weight;
        self.snake_bonus = bonus;
        info!(level, snake_weight = weight, snake_bonus = bonus, "snake strength set");
        Ok(())
    }

    /// Parse a TOML table; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, WeightsError> { Ok(toml::from_str(s)?) }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WeightsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl fmt::Display for HeuristicWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.entries() {
            writeln!(f, "{key:<22} {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn balanced_preset_literals() {
        let mut w = HeuristicWeights::default();
        w.apply_preset(Preset::Balanced);
        assert_eq!(w.snake_weight, 10.0);
        assert_eq!(w.snake_bonus, 1.0);
        assert_eq!(w.corner_multiplier, 100.0);
        assert_eq!(w.monotonic_bonus, 5_000.0);
        assert_eq!(w.empty_cell_bonus, 1_000.0);
        // Untouched by the preset.
        assert_eq!(w.base_score_weight, 0.1);
    }

    #[test]
    fn strong_then_super() {
        let mut w = HeuristicWeights::default();
        w.apply_preset(Preset::Strong);
        assert_eq!((w.snake_weight, w.snake_bonus), (5.0, 3.0));
        assert_eq!(w.corner_multiplier, 200.0);
        w.apply_preset(Preset::Super);
        assert_eq!(w, HeuristicWeights::default());
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut w = HeuristicWeights::default();
        let err = w.set("snakeWeight", 3.0).unwrap_err();
        match &err {
            WeightsError::UnknownKey { key, valid } => {
                assert_eq!(key, "snakeWeight");
                assert_eq!(valid.len(), 8);
                assert!(valid.contains(&"snake_weight"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("monotonic_bonus"));
        assert_eq!(w, HeuristicWeights::default());

        w.set("snake_weight", 3.0).unwrap();
        assert_eq!(w.get("snake_weight"), Some(3.0));
        assert_eq!(w.get("nope"), None);
    }

    #[test]
    fn snake_strength_levels() {
        let mut w = HeuristicWeights::default();
        w.set_snake_strength(1).unwrap();
        assert_eq!((w.snake_weight, w.snake_bonus), (20.0, 0.5));
        w.set_snake_strength(5).unwrap();
        assert_eq!((w.snake_weight, w.snake_bonus), (1.0, 5.0));
        assert!(matches!(w.set_snake_strength(0), Err(WeightsError::InvalidStrength(0))));
        assert!(matches!(w.set_snake_strength(6), Err(WeightsError::InvalidStrength(6))));
        assert_eq!((w.snake_weight, w.snake_bonus), (1.0, 5.0));
    }

    #[test]
    fn entries_cover_every_key() {
        let w = HeuristicWeights::default();
        let entries = w.entries();
        assert_eq!(entries.len(), HeuristicWeights::keys().len());
        assert_eq!(entries[6], ("snake_weight", 2.0));
        assert_eq!(w.to_string().lines().count(), 8);
    }

    #[test]
    fn load_partial_toml() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "snake_weight = 7.5\ncorner_multiplier = 42").unwrap();
        let w = HeuristicWeights::load(tmp.path()).unwrap();
        assert_eq!(w.snake_weight, 7.5);
        assert_eq!(w.corner_multiplier, 42.0);
        assert_eq!(w.snake_bonus, 5.0);
    }

    #[test]
    fn load_rejects_bad_toml() {
        assert!(matches!(HeuristicWeights::from_toml_str("snake_weight = \"x\""), Err(WeightsError::Toml(_))));
        assert!(matches!(HeuristicWeights::load("/definitely/not/here.toml"), Err(WeightsError::Io(_))));
    }
}
