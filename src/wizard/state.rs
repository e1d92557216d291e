//! Navigation state: current step plus the stack of visited steps.

use serde::{Deserialize, Serialize};

use super::graph::StepId;

/// Where the wizard is and how it got there.
///
/// `history` only changes through [`NavigationState::advance`],
/// [`NavigationState::retreat`] and [`NavigationState::restart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    current_step_id: StepId,
    history: Vec<StepId>,
}

impl NavigationState {
    pub fn new(initial_step_id: impl Into<StepId>) -> Self {
        Self {
            current_step_id: initial_step_id.into(),
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current_step_id
    }

    pub fn history(&self) -> &[StepId] {
        &self.history
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// Push the current step and move to `next`.
    pub fn advance(&mut self, next: impl Into<StepId>) {
        let previous = std::mem::replace(&mut self.current_step_id, next.into());
        self.history.push(previous);
    }

    /// Pop the last visited step and make it current. Returns `None` at the start.
    pub fn retreat(&mut self) -> Option<&str> {
        let previous = self.history.pop()?;
        self.current_step_id = previous;
        Some(&self.current_step_id)
    }

    /// Return to `initial_step_id` with empty history.
    pub fn restart(&mut self, initial_step_id: &str) {
        self.history.clear();
        self.current_step_id = initial_step_id.to_string();
    }

    /// Progress percentage: `min(depth * weight, 100)`.
    pub fn progress(&self, step_weight: u32) -> u32 {
        let depth = u32::try_from(self.history.len()).unwrap_or(u32::MAX);
        depth.saturating_mul(step_weight).min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_pushes_exactly_one() {
        let mut state = NavigationState::new("a");
        state.advance("b");
        state.advance("c");
        assert_eq!(state.current(), "c");
        assert_eq!(state.history(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn retreat_undoes_advance() {
        let mut state = NavigationState::new("a");
        state.advance("b");
        assert_eq!(state.retreat(), Some("a"));
        assert_eq!(state, NavigationState::new("a"));
    }

    #[test]
    fn retreat_at_start_is_noop() {
        let mut state = NavigationState::new("a");
        assert_eq!(state.retreat(), None);
        assert_eq!(state.current(), "a");
        assert!(!state.can_go_back());
    }

    #[test]
    fn progress_caps_at_100() {
        let mut state = NavigationState::new("s0");
        assert_eq!(state.progress(15), 0);
        for i in 1..=10 {
            state.advance(format!("s{i}"));
        }
        assert_eq!(state.progress(15), 100);
        state.restart("s0");
        assert_eq!(state.progress(15), 0);
    }

    #[test]
    fn progress_is_monotonic_forward() {
        let mut state = NavigationState::new("s0");
        let mut last = state.progress(15);
        for i in 1..=8 {
            state.advance(format!("s{i}"));
            let p = state.progress(15);
            assert!(p >= last);
            last = p;
        }
    }
}
