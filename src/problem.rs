use rand::Rng;
use std::fmt;
use std::ops::RangeInclusive;

pub const DIVISORS: RangeInclusive<u32> = 2..=10;
pub const QUOTIENTS: RangeInclusive<u32> = 1..=12;

/// One division challenge. `question` always divides without remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub question: String,
    pub answer: u32,
}

impl Problem {
    pub fn new(dividend: u32, divisor: u32) -> Self {
        Self {
            question: format!("{dividend} ÷ {divisor}"),
            answer: dividend / divisor,
        }
    }

    /// Parse the operands back out of the question text.
    pub fn operands(&self) -> Option<(u32, u32)> {
        let (dividend, divisor) = self.question.split_once(" ÷ ")?;
        Some((dividend.parse().ok()?, divisor.parse().ok()?))
    }

    /// Whether a submitted string is the right answer. Anything that does not
    /// parse is simply wrong.
    pub fn check(&self, input: &str) -> bool {
        input.trim().parse::<u32>() == Ok(self.answer)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ?", self.question)
    }
}

/// Draw a divisor and a quotient and build the matching dividend.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let divisor = rng.gen_range(DIVISORS);
    let quotient = rng.gen_range(QUOTIENTS);
    Problem::new(divisor * quotient, divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_problems_divide_exactly() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let problem = generate(&mut rng);
            let (dividend, divisor) = problem.operands().unwrap();

            assert!(DIVISORS.contains(&divisor), "divisor {divisor}");
            assert!(QUOTIENTS.contains(&problem.answer), "quotient {}", problem.answer);
            assert_eq!(dividend % divisor, 0);
            assert_eq!(dividend, divisor * problem.answer);
        }
    }

    #[test]
    fn same_seed_same_problems() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(generate(&mut a), generate(&mut b));
        }
    }

    #[test]
    fn question_format() {
        let problem = Problem::new(56, 7);
        assert_eq!(problem.question, "56 ÷ 7");
        assert_eq!(problem.answer, 8);
        assert_eq!(problem.to_string(), "56 ÷ 7 = ?");
    }

    #[test]
    fn check_accepts_only_the_answer() {
        let problem = Problem::new(24, 6);
        assert!(problem.check("4"));
        assert!(problem.check("04"));
        assert!(!problem.check("5"));
        assert!(!problem.check(""));
        assert!(!problem.check("99999"));
    }
}
