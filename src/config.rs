// Search configuration - per-strategy settings loaded from JSON
//
// Every strategy instance is built from its own `SearchConfig`; nothing is
// shared process-wide. Every field is optional, so `{}` is the default setup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};
use crate::evaluation::Heuristic;
use crate::players::alphabeta::MoveOrdering;
use crate::players::mcts::PlayoutPolicy;

const DEFAULT_DEPTH: u32 = 3;
const DEFAULT_TIMER_THRESHOLD_MS: f64 = 10.0;
const DEFAULT_MCTS_TIMER_THRESHOLD_MS: f64 = 40.0;
const DEFAULT_GREEDY_EPSILON: f64 = 0.125; // one random playout move in eight

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies searched by the fixed-depth minimax player.
    pub search_depth: u32,

    /// Milliseconds kept in reserve: a search stops once the clock reports
    /// less than this.
    pub timer_threshold_ms: f64,

    pub heuristic: Heuristic,

    pub move_ordering: MoveOrdering,

    pub mcts: MctsConfig,

    /// Seed for every randomized choice (playouts, random and greedy
    /// players). `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_depth: DEFAULT_DEPTH,
            timer_threshold_ms: DEFAULT_TIMER_THRESHOLD_MS,
            heuristic: Heuristic::default(),
            move_ordering: MoveOrdering::default(),
            mcts: MctsConfig::default(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Weight of the exploration term in UCT.
    pub exploration: f64,

    /// Reserve for the simulation loop, larger than the tree searches' since a
    /// single playout is not interruptible.
    pub timer_threshold_ms: f64,

    pub playout_policy: PlayoutPolicy,

    /// Probability that a greedy playout move is picked at random instead.
    pub greedy_epsilon: f64,

    /// Plies after which a playout is graded by mobility instead of played
    /// out. `None` plays to the end.
    pub playout_max_plies: Option<u32>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: std::f64::consts::SQRT_2,
            timer_threshold_ms: DEFAULT_MCTS_TIMER_THRESHOLD_MS,
            playout_policy: PlayoutPolicy::default(),
            greedy_epsilon: DEFAULT_GREEDY_EPSILON,
            playout_max_plies: None,
        }
    }
}

impl SearchConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            details: err.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.search_depth == 0 {
            return Err(ConfigError::invalid("search_depth", "must be at least 1"));
        }
        check_margin("timer_threshold_ms", self.timer_threshold_ms)?;
        self.mcts.validate()
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.search_depth = depth;
        self
    }

    pub fn with_timer_threshold(mut self, threshold_ms: f64) -> Self {
        self.timer_threshold_ms = threshold_ms;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_move_ordering(mut self, ordering: MoveOrdering) -> Self {
        self.move_ordering = ordering;
        self
    }

    pub fn with_mcts(mut self, mcts: MctsConfig) -> Self {
        self.mcts = mcts;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl MctsConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(ConfigError::invalid(
                "mcts.exploration",
                "must be a non-negative number",
            ));
        }
        check_margin("mcts.timer_threshold_ms", self.timer_threshold_ms)?;
        if !(0.0..=1.0).contains(&self.greedy_epsilon) {
            return Err(ConfigError::invalid(
                "mcts.greedy_epsilon",
                "must lie in [0, 1]",
            ));
        }
        if self.playout_max_plies == Some(0) {
            return Err(ConfigError::invalid(
                "mcts.playout_max_plies",
                "must be at least 1 when set",
            ));
        }
        Ok(())
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_playout_policy(mut self, policy: PlayoutPolicy) -> Self {
        self.playout_policy = policy;
        self
    }

    pub fn with_playout_max_plies(mut self, plies: u32) -> Self {
        self.playout_max_plies = Some(plies);
        self
    }

    pub fn with_timer_threshold(mut self, threshold_ms: f64) -> Self {
        self.timer_threshold_ms = threshold_ms;
        self
    }
}

fn check_margin(field: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be a non-negative number"))
    }
}
