//! Dice notation (`2d6+3 d20 + 1d4-1`) parsing, rolling and formatting.

use std::fmt;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Default upper bound on dice rolled by a single term.
pub const DEFAULT_MAX_COUNT: u32 = 1000;

static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<count>\d*)d(?P<sides>\d+)(?:(?P<sign>[-+])(?P<modifier>\d+))?$")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("empty dice expression")]
    Empty,

    #[error("invalid dice term: {0}")]
    InvalidToken(String),

    #[error("dice term {0} has no sides")]
    NonPositiveSides(String),

    #[error("dice term {0} rolls no dice")]
    ZeroCount(String),

    #[error("dice term {term} rolls more than {max} dice")]
    TooManyDice { term: String, max: u32 },

    #[error("dice total of {0} does not fit in 64 bits")]
    Overflow(String),
}

/// Source of uniform die draws.
pub trait DiceSource {
    /// A uniform draw in `1..=sides`. `sides` is never zero.
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Adapts any [`rand::Rng`] into a [`DiceSource`].
#[derive(Debug, Clone)]
pub struct RngDice<R>(pub R);

impl<R: Rng> DiceSource for RngDice<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.0.gen_range(1..=sides)
    }
}

/// One `NdS[+/-M]` unit of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceTerm {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

impl DiceTerm {
    pub fn parse(token: &str, max_count: u32) -> Result<Self, DiceError> {
        let invalid = || DiceError::InvalidToken(token.to_string());
        let caps = TERM_RE.captures(token).ok_or_else(invalid)?;

        let count = match caps.name("count").map(|m| m.as_str()) {
            None | Some("") => 1,
            Some(digits) => match digits.parse::<u32>() {
                Ok(n) => n,
                // All digits, so the only failure is overflow.
                Err(_) => {
                    return Err(DiceError::TooManyDice {
                        term: token.to_string(),
                        max: max_count,
                    })
                }
            },
        };
        if count == 0 {
            return Err(DiceError::ZeroCount(token.to_string()));
        }
        if count > max_count {
            return Err(DiceError::TooManyDice {
                term: token.to_string(),
                max: max_count,
            });
        }

        let sides = caps["sides"].parse::<u32>().map_err(|_| invalid())?;
        if sides == 0 {
            return Err(DiceError::NonPositiveSides(token.to_string()));
        }

        let modifier = match caps.name("modifier") {
            None => 0,
            Some(m) => {
                let value = i64::from(m.as_str().parse::<u32>().map_err(|_| invalid())?);
                if &caps["sign"] == "-" {
                    -value
                } else {
                    value
                }
            }
        };

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    pub fn roll<S: DiceSource + ?Sized>(&self, source: &mut S) -> Result<TermRoll, DiceError> {
        let draws: Vec<u32> = (0..self.count).map(|_| source.roll_die(self.sides)).collect();
        let subtotal = draws
            .iter()
            .try_fold(self.modifier, |acc, &d| acc.checked_add(i64::from(d)))
            .ok_or_else(|| DiceError::Overflow(self.to_string()))?;
        Ok(TermRoll {
            term: *self,
            draws,
            subtotal,
        })
    }
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        write_modifier(f, self.modifier)
    }
}

/// A parsed expression: one or more terms, `+` separators dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceExpression {
    terms: Vec<DiceTerm>,
}

impl DiceExpression {
    pub fn parse(expression: &str) -> Result<Self, DiceError> {
        Self::parse_with_limit(expression, DEFAULT_MAX_COUNT)
    }

    /// Parse with a custom upper bound on dice per term.
    ///
    /// Any invalid token rejects the whole expression.
    pub fn parse_with_limit(expression: &str, max_count: u32) -> Result<Self, DiceError> {
        let terms = expression
            .split_whitespace()
            .filter(|token| *token != "+")
            .map(|token| DiceTerm::parse(token, max_count))
            .collect::<Result<Vec<_>, _>>()?;

        if terms.is_empty() {
            return Err(DiceError::Empty);
        }
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[DiceTerm] {
        &self.terms
    }

    /// Roll every term. Fails only if the total overflows.
    pub fn roll<S: DiceSource + ?Sized>(&self, source: &mut S) -> Result<RollOutcome, DiceError> {
        let terms = self
            .terms
            .iter()
            .map(|t| t.roll(source))
            .collect::<Result<Vec<_>, _>>()?;
        let total = terms
            .iter()
            .try_fold(0i64, |acc, t| acc.checked_add(t.subtotal))
            .ok_or_else(|| DiceError::Overflow(self.to_string()))?;
        Ok(RollOutcome { terms, total })
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Parse and roll in one step.
pub fn evaluate<S: DiceSource + ?Sized>(
    expression: &str,
    source: &mut S,
) -> Result<RollOutcome, DiceError> {
    DiceExpression::parse(expression)?.roll(source)
}

/// Individual draws of one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRoll {
    pub term: DiceTerm,
    pub draws: Vec<u32>,
    /// Sum of the draws plus the modifier.
    pub subtotal: i64,
}

impl TermRoll {
    fn draws_joined(&self) -> String {
        self.draws
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// Result of rolling an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub terms: Vec<TermRoll>,
    pub total: i64,
}

impl fmt::Display for RollOutcome {
    /// A single term shows only its draws (`3+5`). Several terms show each
    /// term in parentheses with its modifier, then the total:
    /// `(3+5+2)+(4-1) = 13`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.terms.as_slice() {
            return f.write_str(&single.draws_joined());
        }

        for (i, roll) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "({}", roll.draws_joined())?;
            write_modifier(f, roll.term.modifier)?;
            f.write_str(")")?;
        }
        write!(f, " = {}", self.total)
    }
}

fn write_modifier(f: &mut fmt::Formatter<'_>, modifier: i64) -> fmt::Result {
    match modifier {
        0 => Ok(()),
        m if m > 0 => write!(f, "+{m}"),
        m => write!(f, "{m}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, SeedableRng};

    /// Returns scripted draws in order (wrapping).
    struct Scripted {
        draws: Vec<u32>,
        next: usize,
        requested: Vec<u32>,
    }

    impl Scripted {
        fn new(draws: &[u32]) -> Self {
            Self {
                draws: draws.to_vec(),
                next: 0,
                requested: Vec::new(),
            }
        }
    }

    impl DiceSource for Scripted {
        fn roll_die(&mut self, sides: u32) -> u32 {
            self.requested.push(sides);
            let d = self.draws[self.next % self.draws.len()];
            self.next += 1;
            d
        }
    }

    fn term(count: u32, sides: u32, modifier: i64) -> DiceTerm {
        DiceTerm {
            count,
            sides,
            modifier,
        }
    }

    #[test]
    fn parses_terms_with_defaults() {
        let expr = DiceExpression::parse("d6 2d10+3 + 1d4-1").unwrap();
        assert_eq!(
            expr.terms(),
            &[term(1, 6, 0), term(2, 10, 3), term(1, 4, -1)]
        );
    }

    #[test]
    fn rejects_invalid_notation() {
        for bad in ["3x6", "abc", "2d", "d", "2D6", "1d6+", "+1d6", "1d6*2", "-1d6"] {
            assert!(
                matches!(
                    DiceExpression::parse(bad),
                    Err(DiceError::InvalidToken(_))
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn rejects_zero_sides_and_zero_count() {
        assert_eq!(
            DiceExpression::parse("d0"),
            Err(DiceError::NonPositiveSides("d0".to_string()))
        );
        assert_eq!(
            DiceExpression::parse("0d6"),
            Err(DiceError::ZeroCount("0d6".to_string()))
        );
    }

    #[test]
    fn one_bad_term_rejects_everything() {
        assert!(DiceExpression::parse("1d6 2d8 nope").is_err());
    }

    #[test]
    fn empty_and_separator_only_are_rejected() {
        assert_eq!(DiceExpression::parse(""), Err(DiceError::Empty));
        assert_eq!(DiceExpression::parse("  +  + "), Err(DiceError::Empty));
    }

    #[test]
    fn enforces_dice_limit() {
        assert!(DiceExpression::parse_with_limit("10d6", 10).is_ok());
        assert!(matches!(
            DiceExpression::parse_with_limit("11d6", 10),
            Err(DiceError::TooManyDice { max: 10, .. })
        ));
        assert!(matches!(
            DiceExpression::parse("99999999999d6"),
            Err(DiceError::TooManyDice { .. })
        ));
    }

    #[test]
    fn oversized_modifiers_are_invalid_notation() {
        let mut dice = Scripted::new(&[1]);
        assert_eq!(
            evaluate("1d6+9223372036854775807", &mut dice),
            Err(DiceError::InvalidToken("1d6+9223372036854775807".to_string()))
        );
        assert!(matches!(
            evaluate("1d6+9223372036854775000 1d6+9223372036854775000", &mut dice),
            Err(DiceError::InvalidToken(_))
        ));
        assert!(dice.requested.is_empty());

        let out = evaluate("1d6+4294967295 1d6-4294967295", &mut dice).unwrap();
        assert_eq!(out.total, 2);
    }

    #[test]
    fn overflowing_totals_are_errors() {
        let mut dice = Scripted::new(&[6]);
        assert_eq!(
            term(1, 6, i64::MAX - 1).roll(&mut dice),
            Err(DiceError::Overflow("1d6+9223372036854775806".to_string()))
        );

        let expr = DiceExpression {
            terms: vec![term(1, 6, i64::MAX - 10), term(1, 6, i64::MAX - 10)],
        };
        assert!(matches!(expr.roll(&mut dice), Err(DiceError::Overflow(_))));
    }

    #[test]
    fn single_die_formats_without_total() {
        let mut dice = Scripted::new(&[4]);
        let out = evaluate("1d6", &mut dice).unwrap();
        assert_eq!(out.total, 4);
        assert_eq!(out.to_string(), "4");
        assert_eq!(dice.requested, vec![6]);
    }

    #[test]
    fn single_term_with_modifier_stays_single_term_format() {
        let mut dice = Scripted::new(&[2, 5]);
        let out = evaluate("2d6+3", &mut dice).unwrap();
        assert_eq!(out.total, 10);
        assert_eq!(out.to_string(), "2+5");
    }

    #[test]
    fn multi_term_formats_with_parentheses_and_total() {
        let mut dice = Scripted::new(&[17, 3]);
        let out = evaluate("1d20 1d4-1", &mut dice).unwrap();
        assert_eq!(out.total, 19);
        assert_eq!(out.to_string(), "(17)+(3-1) = 19");
        assert_eq!(dice.requested, vec![20, 4]);
    }

    #[test]
    fn plus_separators_are_ignored() {
        let mut dice = Scripted::new(&[1, 2, 3]);
        let out = evaluate("2d6+1 + d8", &mut dice).unwrap();
        assert_eq!(out.terms.len(), 2);
        assert_eq!(out.to_string(), "(1+2+1)+(3) = 7");
    }

    #[test]
    fn draws_stay_within_sides() {
        let mut dice = RngDice(StdRng::seed_from_u64(7));
        for _ in 0..500 {
            let out = evaluate("1d6", &mut dice).unwrap();
            assert!((1..=6).contains(&out.total));
        }
        let out = evaluate("50d3", &mut dice).unwrap();
        assert!(out.terms[0].draws.iter().all(|d| (1..=3).contains(d)));
    }

    #[test]
    fn seeded_source_is_reproducible() {
        let expr = "3d6+2 d20 + 4d4-1";
        let a = evaluate(expr, &mut RngDice(StdRng::seed_from_u64(42))).unwrap();
        let b = evaluate(expr, &mut RngDice(StdRng::seed_from_u64(42))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn term_display_round_trips_notation() {
        assert_eq!(term(2, 6, 3).to_string(), "2d6+3");
        assert_eq!(term(1, 4, -1).to_string(), "1d4-1");
        assert_eq!(term(1, 20, 0).to_string(), "1d20");
    }
}
