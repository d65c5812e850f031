use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tracing::debug;

use waypoint_state::{PhaseState, WorkflowState};

use crate::suggestion::{PriorityTier, Proposal, Suggestion};

/// Snapshot a rule is evaluated against.
///
/// `now` is supplied by the caller so evaluation stays a pure function of its inputs.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub state: &'a WorkflowState,
    pub now: DateTime<Utc>,
    /// Selected goals without progress for longer than this trigger a review
    pub review_after: TimeDelta,
}

impl<'a> RuleContext<'a> {
    #[must_use]
    pub fn new(state: &'a WorkflowState, now: DateTime<Utc>, review_after_days: u32) -> Self {
        Self {
            state,
            now,
            review_after: TimeDelta::days(i64::from(review_after_days)),
        }
    }

    /// Base call parameters shared by every suggestion
    #[must_use]
    pub fn project_params(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut params = serde_json::Map::new();
        params.insert(
            "projectPath".to_string(),
            serde_json::Value::String(self.state.project_path.clone()),
        );
        params
    }

    pub(crate) fn current_phase_in_progress(&self) -> bool {
        self.state.phase_state(&self.state.current_phase) == Some(PhaseState::InProgress)
    }

    pub(crate) fn remaining_steps(&self) -> Vec<&'static str> {
        self.state.remaining_steps(&self.state.current_phase)
    }
}

/// A condition and the suggestion it produces.
///
/// Both halves are plain function pointers: rules are data, registered in an ordered list and
/// evaluated by [`suggest_next`]. Neither half may mutate state.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    /// 1-100, higher is more urgent
    pub priority: u8,
    pub predicate: fn(&RuleContext<'_>) -> bool,
    pub build: fn(&RuleContext<'_>) -> Proposal,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

impl Rule {
    /// Evaluate the predicate and build the suggestion if it holds
    #[must_use]
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<Suggestion> {
        if !(self.predicate)(ctx) {
            return None;
        }
        let proposal = (self.build)(ctx);
        Some(Suggestion {
            priority: self.priority,
            tier: PriorityTier::from_priority(self.priority),
            action: proposal.action,
            target_tool: proposal.target_tool.to_string(),
            params: proposal.params,
            rule_id: self.id.to_string(),
        })
    }
}

/// Why a suggestion list is what it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NextStepsStatus {
    Actionable,
    /// No rule fired and the workflow's terminal phase is complete
    WorkflowComplete,
    /// No rule fired; not an error
    NothingActionable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSteps {
    pub status: NextStepsStatus,
    pub suggestions: Vec<Suggestion>,
}

/// Evaluate `rules` and return up to `max_suggestions`, most urgent first.
///
/// Ties keep the order in which the rules were declared.
#[must_use]
pub fn suggest_next(ctx: &RuleContext<'_>, rules: &[Rule], max_suggestions: usize) -> NextSteps {
    let mut suggestions: Vec<Suggestion> = rules.iter().filter_map(|r| r.evaluate(ctx)).collect();
    let fired = suggestions.len();

    // Vec::sort_by is stable
    suggestions.sort_by(|a, b| b.priority.cmp(&a.priority));
    suggestions.truncate(max_suggestions);

    let status = if fired > 0 {
        NextStepsStatus::Actionable
    } else if ctx.state.phase_state(ctx.state.domain().terminal_phase().name)
        == Some(PhaseState::Complete)
    {
        NextStepsStatus::WorkflowComplete
    } else {
        NextStepsStatus::NothingActionable
    };

    debug!(
        project = %ctx.state.project_path,
        evaluated = rules.len(),
        fired,
        returned = suggestions.len(),
        status = %status,
        "rules evaluated"
    );

    NextSteps {
        status,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use waypoint_state::WorkflowType;

    fn always(_: &RuleContext<'_>) -> bool {
        true
    }

    fn never(_: &RuleContext<'_>) -> bool {
        false
    }

    fn proposal(_: &RuleContext<'_>) -> Proposal {
        Proposal {
            action: "do it".to_string(),
            target_tool: "noop",
            params: json!({}),
        }
    }

    fn rule(id: &'static str, priority: u8, predicate: fn(&RuleContext<'_>) -> bool) -> Rule {
        Rule {
            id,
            priority,
            predicate,
            build: proposal,
        }
    }

    fn state() -> WorkflowState {
        WorkflowState::new(
            "/p1",
            WorkflowType::from("demo"),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_sorted_by_priority_with_stable_ties() {
        let state = state();
        let ctx = RuleContext::new(&state, state.created, 14);
        let rules = [
            rule("low", 61, always),
            rule("tie-first", 80, always),
            rule("skipped", 99, never),
            rule("tie-second", 80, always),
            rule("top", 95, always),
        ];

        let next = suggest_next(&ctx, &rules, 10);
        let ids: Vec<_> = next.suggestions.iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["top", "tie-first", "tie-second", "low"]);
        assert_eq!(next.status, NextStepsStatus::Actionable);
        assert_eq!(next.suggestions[0].tier, PriorityTier::Critical);
    }

    #[test]
    fn test_truncates_to_max() {
        let state = state();
        let ctx = RuleContext::new(&state, state.created, 14);
        let rules = [rule("a", 70, always), rule("b", 60, always)];

        let next = suggest_next(&ctx, &rules, 1);
        assert_eq!(next.suggestions.len(), 1);
        assert_eq!(next.suggestions[0].rule_id, "a");
    }

    #[test]
    fn test_nothing_fired_is_not_an_error() {
        let state = state();
        let ctx = RuleContext::new(&state, state.created, 14);

        let next = suggest_next(&ctx, &[rule("x", 50, never)], 5);
        assert!(next.suggestions.is_empty());
        assert_eq!(next.status, NextStepsStatus::NothingActionable);
    }

    #[test]
    fn test_complete_workflow_status() {
        let mut state = state();
        state.current_phase = "completion".to_string();
        state.phases.get_mut("completion").unwrap().status = PhaseState::Complete;
        let ctx = RuleContext::new(&state, state.created, 14);

        let next = suggest_next(&ctx, &[], 5);
        assert_eq!(next.status, NextStepsStatus::WorkflowComplete);
    }
}
