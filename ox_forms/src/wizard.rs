use serde::Serialize;

use crate::error::FormError;

/// Position within a step-by-step form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub current: usize,
    pub step_count: usize,
}

impl WizardState {
    pub fn new(step_count: usize) -> Self {
        Self { current: 0, step_count }
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.step_count
    }

    /// Moves forward; stays put on the last step.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn back(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn go_to(&mut self, step: usize) -> Result<(), FormError> {
        if step >= self.step_count {
            return Err(FormError::StepOutOfRange(step));
        }
        self.current = step;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_stays_in_range() {
        let mut wizard = WizardState::new(3);
        assert!(!wizard.back());
        assert!(wizard.advance());
        assert!(wizard.advance());
        assert!(wizard.is_last());
        assert!(!wizard.advance());
        assert_eq!(wizard.current, 2);
        wizard.go_to(0).unwrap();
        assert!(wizard.is_first());
        assert!(matches!(wizard.go_to(3), Err(FormError::StepOutOfRange(3))));
    }
}
