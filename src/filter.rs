//! # Filter Expressions
//!
//! A small boolean language over [`Flag`] names, used by `--where`:
//!
//! - `,` separates alternatives (OR, lowest precedence)
//! - `+` joins terms inside an alternative (AND)
//! - a leading `^` negates a term
//!
//! `dirty+unpushed,^detached` matches when the repository is both dirty and
//! unpushed, or when it is not detached.
//!
//! Parsing validates every flag name, so a typo is rejected before any
//! repository is queried.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::flags::{Flag, RepoFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub flag: Flag,
    pub negated: bool,
}

impl Term {
    fn matches(&self, flags: &RepoFlags) -> bool {
        flags.get(self.flag) != self.negated
    }
}

/// A parsed filter: a disjunction of conjunctions of terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpr {
    alternatives: Vec<Vec<Term>>,
}

fn valid_names() -> String {
    Flag::ALL
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_term(raw: &str) -> Result<Term> {
    let text = raw.trim();
    let (negated, name) = match text.strip_prefix('^') {
        Some(rest) => (true, rest.trim()),
        None => (false, text),
    };
    if name.is_empty() {
        return Err(Error::InvalidFilter {
            term: raw.trim().to_string(),
            message: "empty term".to_string(),
        });
    }
    let flag = Flag::from_name(name).ok_or_else(|| Error::InvalidFilter {
        term: name.to_string(),
        message: format!("unknown flag (valid flags: {})", valid_names()),
    })?;
    Ok(Term { flag, negated })
}

impl FilterExpr {
    /// Parse and validate an expression.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(Error::InvalidFilter {
                term: String::new(),
                message: "empty filter expression".to_string(),
            });
        }
        let alternatives = input
            .split(',')
            .map(|alt| alt.split('+').map(parse_term).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches(&self, flags: &RepoFlags) -> bool {
        self.alternatives
            .iter()
            .any(|terms| terms.iter().all(|t| t.matches(flags)))
    }

    pub fn alternatives(&self) -> &[Vec<Term>] {
        &self.alternatives
    }
}

impl FromStr for FilterExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .alternatives
            .iter()
            .map(|terms| {
                terms
                    .iter()
                    .map(|t| format!("{}{}", if t.negated { "^" } else { "" }, t.flag))
                    .collect::<Vec<_>>()
                    .join("+")
            })
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&text)
    }
}
