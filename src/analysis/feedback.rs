// FeedbackGenerator - declarative rule evaluation
//
// Rules are plain data on the profile. Evaluation is a pure function of the
// frame and the classifier's current/previous phase: it never reads the
// clock and never touches session state, so it can run before the throttle
// decides whether anything is shown.

use super::classifier::Phase;
use super::frame::AngleFrame;
use crate::profile::FeedbackRule;

/// Text produced when no rule matches
pub const MAINTAIN_FORM: &str = "Maintain current form";

/// Separator between matched rule messages
const MESSAGE_SEPARATOR: &str = ". ";

/// Rules that matched one frame, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEvaluation<'a> {
    matched: Vec<&'a FeedbackRule>,
}

impl<'a> FeedbackEvaluation<'a> {
    pub fn is_clean(&self) -> bool {
        self.matched.is_empty()
    }

    pub fn matched(&self) -> &[&'a FeedbackRule] {
        &self.matched
    }

    /// Features in an incorrect state, first occurrence order, no repeats
    pub fn incorrect_features(&self) -> Vec<&'a str> {
        let mut features: Vec<&'a str> = Vec::new();
        for rule in &self.matched {
            if !features.contains(&rule.feature.as_str()) {
                features.push(rule.feature.as_str());
            }
        }
        features
    }

    /// Messages of every matched rule belonging to `feature`
    pub fn messages_for(&self, feature: &str) -> Vec<&'a str> {
        self.matched
            .iter()
            .filter(|rule| rule.feature == feature)
            .map(|rule| rule.message.as_str())
            .collect()
    }

    /// Composed feedback text
    pub fn text(&self) -> String {
        if self.matched.is_empty() {
            return MAINTAIN_FORM.to_string();
        }
        self.matched
            .iter()
            .map(|rule| rule.message.as_str())
            .collect::<Vec<_>>()
            .join(MESSAGE_SEPARATOR)
    }
}

/// Evaluates a profile's rule table
pub struct FeedbackGenerator<'a> {
    rules: &'a [FeedbackRule],
}

impl<'a> FeedbackGenerator<'a> {
    pub fn new(rules: &'a [FeedbackRule]) -> Self {
        Self { rules }
    }

    pub fn evaluate(
        &self,
        frame: &AngleFrame,
        current: &Phase,
        previous: &Phase,
    ) -> FeedbackEvaluation<'a> {
        let matched = self
            .rules
            .iter()
            .filter(|rule| Self::rule_matches(rule, frame, current, previous))
            .collect();
        FeedbackEvaluation { matched }
    }

    fn rule_matches(
        rule: &FeedbackRule,
        frame: &AngleFrame,
        current: &Phase,
        previous: &Phase,
    ) -> bool {
        if !Self::phase_allowed(&rule.phases, current)
            || !Self::phase_allowed(&rule.previous_phases, previous)
        {
            return false;
        }

        // An angle absent from the frame never satisfies a condition
        rule.conditions.iter().all(|condition| {
            frame
                .get(condition.angle)
                .map(|degrees| condition.comparison.holds(degrees))
                .unwrap_or(false)
        })
    }

    fn phase_allowed(filter: &[String], phase: &Phase) -> bool {
        filter.is_empty() || filter.iter().any(|name| phase.is(name))
    }
}
