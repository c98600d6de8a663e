//! First-run wizard: welcome, name entry, goal selection.
//!
//! Transitions are strictly linear. Nothing reaches [`AppState`](crate::AppState)
//! until [`OnboardingWizard::complete`] hands back a validated name and goal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::ValidationError;
use crate::model::Goal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    #[default]
    Welcome,
    Name,
    Goal,
}

impl OnboardingStep {
    pub const COUNT: u8 = 3;

    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Welcome => 1,
            Self::Name => 2,
            Self::Goal => 3,
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::Welcome => Some(Self::Name),
            Self::Name => Some(Self::Goal),
            Self::Goal => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Welcome => None,
            Self::Name => Some(Self::Welcome),
            Self::Goal => Some(Self::Name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("already at the first step")]
    AtFirstStep,
    #[error("no step after goal selection; complete onboarding instead")]
    AtLastStep,
    #[error("onboarding can only be completed from the goal step")]
    NotAtGoalStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    name: String,
    selected_goal: Option<Goal>,
}

impl OnboardingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selected_goal(&self) -> Option<&Goal> {
        self.selected_goal.as_ref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Selecting a card replaces any earlier choice.
    pub fn select_goal(&mut self, goal: Goal) {
        self.selected_goal = Some(goal);
    }

    /// Advances one step. Leaving the name step needs a non-blank name.
    pub fn next(&mut self) -> Result<OnboardingStep, OnboardingError> {
        let next = self.step.next().ok_or(OnboardingError::AtLastStep)?;
        if self.step == OnboardingStep::Name && self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.step = next;
        Ok(next)
    }

    pub fn back(&mut self) -> Result<OnboardingStep, OnboardingError> {
        let previous = self.step.previous().ok_or(OnboardingError::AtFirstStep)?;
        self.step = previous;
        Ok(previous)
    }

    /// Returns the trimmed name and chosen goal for committing.
    pub fn complete(&self) -> Result<(String, Goal), OnboardingError> {
        if self.step != OnboardingStep::Goal {
            return Err(OnboardingError::NotAtGoalStep);
        }
        let goal = self.selected_goal.clone().ok_or(ValidationError::NoGoalSelected)?;
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok((name.to_string(), goal))
    }

    pub fn progress_percent(&self) -> u8 {
        let percent = u16::from(self.step.number()) * 100 / u16::from(OnboardingStep::COUNT);
        u8::try_from(percent).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_welcome() {
        let wizard = OnboardingWizard::new();
        assert_eq!(wizard.step(), OnboardingStep::Welcome);
        assert_eq!(wizard.progress_percent(), 33);
    }

    #[test]
    fn name_step_refuses_blank_name() {
        let mut wizard = OnboardingWizard::new();
        wizard.next().unwrap();
        wizard.set_name("   ");
        assert_eq!(
            wizard.next(),
            Err(OnboardingError::Validation(ValidationError::EmptyName))
        );
        assert_eq!(wizard.step(), OnboardingStep::Name);
    }

    #[test]
    fn linear_walk_and_back() {
        let mut wizard = OnboardingWizard::new();
        assert_eq!(wizard.back(), Err(OnboardingError::AtFirstStep));
        assert_eq!(wizard.next(), Ok(OnboardingStep::Name));
        wizard.set_name("Alex");
        assert_eq!(wizard.next(), Ok(OnboardingStep::Goal));
        assert_eq!(wizard.progress_percent(), 100);
        assert_eq!(wizard.next(), Err(OnboardingError::AtLastStep));
        assert_eq!(wizard.back(), Ok(OnboardingStep::Name));
        assert_eq!(wizard.name(), "Alex");
    }

    #[test]
    fn completion_requires_goal() {
        let mut wizard = OnboardingWizard::new();
        wizard.next().unwrap();
        wizard.set_name(" Alex ");
        wizard.next().unwrap();
        assert_eq!(
            wizard.complete(),
            Err(OnboardingError::Validation(ValidationError::NoGoalSelected))
        );
        wizard.select_goal(Goal::Health);
        wizard.select_goal(Goal::Career);
        assert_eq!(wizard.complete(), Ok(("Alex".to_string(), Goal::Career)));
    }

    #[test]
    fn completion_only_from_goal_step() {
        let mut wizard = OnboardingWizard::new();
        wizard.select_goal(Goal::Learning);
        assert_eq!(wizard.complete(), Err(OnboardingError::NotAtGoalStep));
    }

    #[test]
    fn name_cleared_after_reaching_goal_step_blocks_completion() {
        let mut wizard = OnboardingWizard::new();
        wizard.next().unwrap();
        wizard.set_name("Alex");
        wizard.next().unwrap();
        wizard.set_name("");
        wizard.select_goal(Goal::Personal);
        assert_eq!(
            wizard.complete(),
            Err(OnboardingError::Validation(ValidationError::EmptyName))
        );
    }
}
