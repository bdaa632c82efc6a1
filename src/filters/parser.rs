//! Query parser for message filters.
//!
//! A query is a run of `field:value` terms, optionally separated by `AND`/`OR`
//! (any case). Values with spaces go in double quotes.
//!
//! ```text
//! query     := term (join? term)*
//! term      := field ":" value | field ":" '"' text '"'
//! join      := AND | OR
//! field     := from | since | until | has
//! ```
//!
//! - `from:name`: sender contains `name`, ignoring case
//! - `since:YYYY-MM-DD` / `until:YYYY-MM-DD`: inclusive day bounds
//! - `has:attachment` / `has:media`: any attached file, or playable media only
//!
//! Without an explicit join, repeating a field means OR and switching fields means AND,
//! so `from:alice from:bob has:media` reads as `(alice OR bob) AND media`.
//!
//! ```rust
//! # use chat_export_viewer::filters::parser::parse_filter;
//! let expr = parse_filter("from:\"Alice Smith\" since:2024-01-01").unwrap();
//! assert_eq!(expr.len(), 2);
//! assert!(parse_filter("has:links").is_err());
//! ```

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;

use super::ast::{Condition, FilterExpr, Join, Presence};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Term { field: &'a str, value: &'a str },
    Join(Join),
}

/// Split `input` into terms and join keywords
fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();
    while !rest.is_empty() {
        let (token, remaining) = next_token(rest)?;
        tokens.push(token);
        rest = remaining.trim_start();
    }
    Ok(tokens)
}

/// Read one token from the start of `input`, returning it with the unread remainder
fn next_token(input: &str) -> Result<(Token<'_>, &str)> {
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    let word = &input[..end];

    if word.eq_ignore_ascii_case("and") {
        return Ok((Token::Join(Join::And), &input[end..]));
    }
    if word.eq_ignore_ascii_case("or") {
        return Ok((Token::Join(Join::Or), &input[end..]));
    }

    let Some((field, value)) = word.split_once(':') else {
        bail!("Invalid token: '{word}' (expected field:value or AND/OR)");
    };

    // A quoted value may run past the first whitespace
    let (value, remaining) = match input[field.len() + 1..].strip_prefix('"') {
        Some(quoted) => {
            let close = quoted.find('"').ok_or_else(|| anyhow!("Unterminated quoted string"))?;
            (&quoted[..close], &quoted[close + 1..])
        }
        None => (value, &input[end..]),
    };

    if field.is_empty() || value.is_empty() {
        bail!("Invalid field:value format: {word}");
    }
    Ok((Token::Term { field, value }, remaining))
}

fn parse_condition(field: &str, value: &str) -> Result<Condition> {
    match field.to_ascii_lowercase().as_str() {
        "from" => Ok(Condition::From(value.to_lowercase())),
        "since" => parse_day(value).map(Condition::Since),
        "until" => parse_day(value).map(Condition::Until),
        "has" => match value.to_ascii_lowercase().as_str() {
            "attachment" => Ok(Condition::Has(Presence::Attachment)),
            "media" => Ok(Condition::Has(Presence::Media)),
            _ => bail!("Invalid has value: '{value}' (must be 'attachment' or 'media')"),
        },
        _ => bail!("Unknown field: '{field}' (valid fields: from, since, until, has)"),
    }
}

/// Strict `YYYY-MM-DD`; chrono alone would also take unpadded months and days
fn parse_day(value: &str) -> Result<NaiveDate> {
    if value.len() == 10
        && let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
    {
        return Ok(day);
    }
    bail!("Invalid date format: '{value}' (expected YYYY-MM-DD)")
}

/// Parse a filter query. Blank input gives an empty expression that matches everything.
pub fn parse_filter(input: &str) -> Result<FilterExpr> {
    let tokens = tokenize(input).context("Failed to tokenize filter")?;

    let mut expr = FilterExpr::new();
    let mut pending: Option<Join> = None;
    let mut previous_field: Option<&'static str> = None;

    for token in tokens {
        match token {
            Token::Join(join) => {
                if previous_field.is_none() || pending.is_some() {
                    bail!("Unexpected {} operator (expected field:value)", join.keyword());
                }
                pending = Some(join);
            }
            Token::Term { field, value } => {
                let condition = parse_condition(field, value)?;
                let join = pending.take().unwrap_or(if previous_field == Some(condition.field()) {
                    Join::Or
                } else {
                    Join::And
                });
                previous_field = Some(condition.field());
                expr.push(join, condition);
            }
        }
    }

    if pending.is_some() {
        bail!("Filter ended with operator (expected field:value)");
    }
    Ok(expr)
}
