//! Year-filter expression parser (pest PEG grammar in `year_filter.pest`).
//!
//! Only `year`, integer literals, comparisons, `and`/`or`/`not` and
//! parentheses are accepted; anything else is a syntax error.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::{CompOp, YearFilter};
use crate::error::ParseError;

#[derive(Parser)]
#[grammar = "year_filter.pest"]
struct YearFilterParser;

/// Parse a year-filter expression such as `year >= 2015`.
///
/// # Errors
///
/// Returns [`ParseError::Syntax`] for input outside the grammar,
/// [`ParseError::UnboundedComparison`] for a bare `year`, and
/// [`ParseError::IntegerOutOfRange`] for literals that do not fit an `i32`.
pub fn parse_year_filter(input: &str) -> Result<YearFilter, ParseError> {
    let mut pairs = YearFilterParser::parse(Rule::filter, input)
        .map_err(|e| ParseError::Syntax(e.to_string()))?;
    let filter = pairs
        .next()
        .ok_or_else(|| ParseError::Syntax("empty expression".to_string()))?;
    let disjunction = filter
        .into_inner()
        .find(|p| p.as_rule() == Rule::disjunction)
        .ok_or_else(|| ParseError::Syntax("empty expression".to_string()))?;
    build_disjunction(disjunction)
}

fn build_disjunction(pair: Pair<'_, Rule>) -> Result<YearFilter, ParseError> {
    fold_operands(pair, Rule::conjunction, build_conjunction, YearFilter::or)
}

fn build_conjunction(pair: Pair<'_, Rule>) -> Result<YearFilter, ParseError> {
    fold_operands(pair, Rule::negation, build_negation, YearFilter::and)
}

fn fold_operands(
    pair: Pair<'_, Rule>,
    operand: Rule,
    build: fn(Pair<'_, Rule>) -> Result<YearFilter, ParseError>,
    combine: fn(YearFilter, YearFilter) -> YearFilter,
) -> Result<YearFilter, ParseError> {
    let mut acc: Option<YearFilter> = None;
    for inner in pair.into_inner().filter(|p| p.as_rule() == operand) {
        let next = build(inner)?;
        acc = Some(match acc {
            Some(prev) => combine(prev, next),
            None => next,
        });
    }
    acc.ok_or_else(|| ParseError::Syntax("missing operand".to_string()))
}

fn build_negation(pair: Pair<'_, Rule>) -> Result<YearFilter, ParseError> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| ParseError::Syntax("missing operand".to_string()))?;
    match first.as_rule() {
        Rule::not_kw => {
            let operand = inner
                .next()
                .ok_or_else(|| ParseError::Syntax("`not` without operand".to_string()))?;
            Ok(build_negation(operand)?.negate())
        }
        Rule::group => {
            let body = first
                .into_inner()
                .next()
                .ok_or_else(|| ParseError::Syntax("empty parentheses".to_string()))?;
            build_disjunction(body)
        }
        Rule::comparison => build_comparison(first),
        other => Err(ParseError::Syntax(format!("unexpected {other:?}"))),
    }
}

/// `[lower op] year [op upper]`, chained bounds combine with `and`.
fn build_comparison(pair: Pair<'_, Rule>) -> Result<YearFilter, ParseError> {
    let mut bounds = Vec::with_capacity(2);
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::lower_bound => {
                let (value, op) = bound_parts(part)?;
                bounds.push(YearFilter::compare(op.flipped(), value));
            }
            Rule::upper_bound => {
                let (value, op) = bound_parts(part)?;
                bounds.push(YearFilter::compare(op, value));
            }
            _ => {}
        }
    }
    bounds
        .into_iter()
        .reduce(YearFilter::and)
        .ok_or(ParseError::UnboundedComparison)
}

fn bound_parts(pair: Pair<'_, Rule>) -> Result<(i32, CompOp), ParseError> {
    let mut value = None;
    let mut op = None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::integer => {
                let text = part.as_str();
                value = Some(
                    text.parse::<i32>()
                        .map_err(|_| ParseError::IntegerOutOfRange(text.to_string()))?,
                );
            }
            Rule::comp_op => op = Some(comp_op(part.as_str())?),
            _ => {}
        }
    }
    match (value, op) {
        (Some(v), Some(o)) => Ok((v, o)),
        _ => Err(ParseError::Syntax("incomplete comparison".to_string())),
    }
}

fn comp_op(text: &str) -> Result<CompOp, ParseError> {
    match text {
        "==" => Ok(CompOp::Eq),
        "!=" => Ok(CompOp::Neq),
        "<" => Ok(CompOp::Lt),
        "<=" => Ok(CompOp::Lte),
        ">" => Ok(CompOp::Gt),
        ">=" => Ok(CompOp::Gte),
        other => Err(ParseError::Syntax(format!("unknown operator '{other}'"))),
    }
}
