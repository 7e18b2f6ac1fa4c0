//! Rule and session configuration.
//!
//! - `RulesConfig`: board parity and optional capture rules, consumed by
//!   the rules engine.
//! - `SessionConfig`: timer settings and the rules for one game session.
//!
//! Nothing about parity or backward captures is hardcoded in the engine;
//! both come from here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::player::Color;

/// Rule switches for the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Color of the origin cell a1 = (0, 0). When dark, playable cells are
    /// those with even `x + y`; otherwise odd.
    pub a1_is_dark: bool,

    /// Whether men may capture backwards. Forward captures are always legal.
    pub allow_backward_capture: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            a1_is_dark: true,
            allow_backward_capture: true,
        }
    }
}

impl RulesConfig {
    /// Set the origin-cell color.
    #[must_use]
    pub fn with_a1_dark(mut self, dark: bool) -> Self {
        self.a1_is_dark = dark;
        self
    }

    /// Enable or disable backward captures for men.
    #[must_use]
    pub fn with_backward_capture(mut self, allowed: bool) -> Self {
        self.allow_backward_capture = allowed;
        self
    }

    /// Parity test for a cell. Independent of occupancy and bounds.
    #[must_use]
    pub fn is_playable(&self, cell: Cell) -> bool {
        let odd = (i16::from(cell.x) + i16::from(cell.y)) & 1 == 1;
        if self.a1_is_dark {
            !odd
        } else {
            odd
        }
    }
}

/// Settings for one game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Time each side gets per turn (reset on every turn and continuation).
    pub turn_duration: Duration,

    /// Remaining time at or below which the timer is shown as a warning.
    pub warning_threshold: Duration,

    /// Delay between a declined rematch and the return to the outer menu.
    pub decline_exit_delay: Duration,

    /// Side that moves first.
    pub first_color: Color,

    /// Board rules.
    pub rules: RulesConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_duration: Duration::from_secs(30),
            warning_threshold: Duration::from_secs(5),
            decline_exit_delay: Duration::from_millis(1200),
            first_color: Color::White,
            rules: RulesConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Set the per-turn duration.
    #[must_use]
    pub fn with_turn_duration(mut self, duration: Duration) -> Self {
        self.turn_duration = duration;
        self
    }

    /// Set the timer warning threshold.
    #[must_use]
    pub fn with_warning_threshold(mut self, threshold: Duration) -> Self {
        self.warning_threshold = threshold;
        self
    }

    /// Set the post-decline exit delay.
    #[must_use]
    pub fn with_decline_exit_delay(mut self, delay: Duration) -> Self {
        self.decline_exit_delay = delay;
        self
    }

    /// Set the side that moves first.
    #[must_use]
    pub fn with_first_color(mut self, color: Color) -> Self {
        self.first_color = color;
        self
    }

    /// Set the board rules.
    #[must_use]
    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }
}
