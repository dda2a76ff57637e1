//! AST for year-filter expressions.
//!
//! Produced by [`crate::parse_year_filter`] and evaluated against a
//! document's publication year by the date filter.

use serde::{Deserialize, Serialize};

/// A boolean expression over the single variable `year`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearFilter {
    /// `year <op> value`
    Compare { op: CompOp, value: i32 },
    And(Box<YearFilter>, Box<YearFilter>),
    Or(Box<YearFilter>, Box<YearFilter>),
    Not(Box<YearFilter>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompOp {
    /// The operator that keeps the comparison true with operands swapped
    /// (`2000 <= year` is `year >= 2000`).
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Neq => Self::Neq,
            Self::Lt => Self::Gt,
            Self::Lte => Self::Gte,
            Self::Gt => Self::Lt,
            Self::Gte => Self::Lte,
        }
    }

    #[must_use]
    pub fn apply(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Neq => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
        }
    }
}

impl YearFilter {
    #[must_use]
    pub fn compare(op: CompOp, value: i32) -> Self {
        Self::Compare { op, value }
    }

    #[must_use]
    pub fn and(self, other: YearFilter) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: YearFilter) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate the expression for a concrete year.
    #[must_use]
    pub fn matches(&self, year: i32) -> bool {
        match self {
            Self::Compare { op, value } => op.apply(year, *value),
            Self::And(a, b) => a.matches(year) && b.matches(year),
            Self::Or(a, b) => a.matches(year) || b.matches(year),
            Self::Not(inner) => !inner.matches(year),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => 1,
            Self::And(..) => 2,
            Self::Not(_) => 3,
            Self::Compare { .. } => 4,
        }
    }

    fn fmt_operand(&self, parent: u8, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.precedence() < parent {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl std::fmt::Display for CompOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq => write!(f, "=="),
            Self::Neq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
        }
    }
}

impl std::fmt::Display for YearFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prec = self.precedence();
        match self {
            Self::Compare { op, value } => write!(f, "year {op} {value}"),
            Self::And(a, b) => {
                a.fmt_operand(prec, f)?;
                f.write_str(" and ")?;
                b.fmt_operand(prec, f)
            }
            Self::Or(a, b) => {
                a.fmt_operand(prec, f)?;
                f.write_str(" or ")?;
                b.fmt_operand(prec, f)
            }
            Self::Not(inner) => {
                f.write_str("not ")?;
                inner.fmt_operand(prec, f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flipped_operators_preserve_meaning() {
        for op in [CompOp::Eq, CompOp::Neq, CompOp::Lt, CompOp::Lte, CompOp::Gt, CompOp::Gte] {
            for (a, b) in [(1999, 2000), (2000, 2000), (2001, 2000)] {
                assert_eq!(op.apply(a, b), op.flipped().apply(b, a), "{op} {a} {b}");
            }
        }
    }

    #[test]
    fn display_parenthesizes_lower_precedence_operands() {
        let nineties = YearFilter::compare(CompOp::Gte, 1990).and(YearFilter::compare(CompOp::Lt, 2000));
        let twenties = YearFilter::compare(CompOp::Gte, 2020).and(YearFilter::compare(CompOp::Lt, 2030));
        let either = nineties.or(twenties);
        assert_eq!(
            either.to_string(),
            "year >= 1990 and year < 2000 or year >= 2020 and year < 2030"
        );

        let grouped = YearFilter::compare(CompOp::Eq, 2019)
            .or(YearFilter::compare(CompOp::Eq, 2020))
            .and(YearFilter::compare(CompOp::Neq, 2020).negate());
        assert_eq!(
            grouped.to_string(),
            "(year == 2019 or year == 2020) and not year != 2020"
        );
    }

    #[test]
    fn matches_evaluates_boolean_structure() {
        let filter = YearFilter::compare(CompOp::Gte, 2015).and(YearFilter::compare(CompOp::Eq, 2018).negate());
        assert!(filter.matches(2015));
        assert!(!filter.matches(2018));
        assert!(!filter.matches(2014));
    }
}
