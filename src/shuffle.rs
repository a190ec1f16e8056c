pub const DEFAULT_SHUFFLES: u32 = 3;

/// Bounded number of free problem discards per session. Never replenished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleBudget {
    remaining: u32,
}

impl ShuffleBudget {
    pub fn new(budget: u32) -> Self {
        Self { remaining: budget }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Spend one shuffle. Returns false, leaving the budget untouched, once
    /// it is used up.
    pub fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

impl Default for ShuffleBudget {
    fn default() -> Self {
        Self::new(DEFAULT_SHUFFLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_allows_three() {
        let mut budget = ShuffleBudget::default();
        assert_eq!(budget.remaining(), 3);

        assert!(budget.consume());
        assert!(budget.consume());
        assert!(budget.consume());
        assert_eq!(budget.remaining(), 0);
        assert!(budget.is_exhausted());

        assert!(!budget.consume());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn zero_budget_is_exhausted() {
        let mut budget = ShuffleBudget::new(0);
        assert!(budget.is_exhausted());
        assert!(!budget.consume());
    }
}
