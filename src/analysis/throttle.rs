// ThrottleGate - cooldowns between classification and presentation
//
// Two gates with deliberately different comparisons:
// - AlertGate is per feature and fires only once MORE than the cooldown has
//   passed since that feature last alerted.
// - FeedbackGate is global and lets text through once AT LEAST the cooldown
//   has passed since the last non-empty emission.
//
// Timestamps are monotonic Durations from the session clock. A timestamp at
// or before the last recorded one is treated as "cooldown not elapsed".

use std::collections::HashMap;
use std::time::Duration;

/// Per-feature alert cooldowns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertGate {
    last_alert: HashMap<String, Duration>,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether an incorrect `feature` may alert at `now`
    ///
    /// Only call this for features currently in an incorrect state; correct
    /// features leave their cooldown untouched.
    pub fn should_alert(&mut self, feature: &str, now: Duration, cooldown: Duration) -> bool {
        let past_cooldown = self
            .last_alert
            .get(feature)
            .map(|last| now.saturating_sub(*last) > cooldown)
            .unwrap_or(true);

        if past_cooldown {
            self.last_alert.insert(feature.to_string(), now);
        }
        past_cooldown
    }

    pub fn last_alert(&self, feature: &str) -> Option<Duration> {
        self.last_alert.get(feature).copied()
    }
}

/// Global feedback text cooldown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackGate {
    last_emission: Option<Duration>,
}

impl FeedbackGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether composed text may be emitted at `now`
    pub fn should_emit(&mut self, now: Duration, cooldown: Duration) -> bool {
        let past_cooldown = self
            .last_emission
            .map(|last| now > last && now - last >= cooldown)
            .unwrap_or(true);

        if past_cooldown {
            self.last_emission = Some(now);
        }
        past_cooldown
    }

    /// Record an emission that bypassed the gate
    pub fn mark_emitted(&mut self, now: Duration) {
        self.last_emission = Some(self.last_emission.map_or(now, |last| last.max(now)));
    }

    pub fn last_emission(&self) -> Option<Duration> {
        self.last_emission
    }
}
