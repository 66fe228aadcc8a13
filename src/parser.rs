//! Parser for declarative spec files
//!
//! A spec file is a plain-text description of a suite tree:
//!
//! ```text
//! # comment
//! suite "outer"
//!     spec "works" pass
//!     suite "inner"
//!         spec "breaks" fail "Expected function to throw."
//!     end
//! end
//! ```
//!
//! Suites nest arbitrarily; each spec declares its verdict up front. The
//! engine evaluates nothing at parse time.

use crate::error::{Error, Result};

/// A single test case declaration
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDef {
    /// The spec description as it appears in reports
    pub name: String,
    /// The declared outcome
    pub verdict: Verdict,
    /// Line number in the original file (for error reporting)
    pub line_num: usize,
}

/// The declared outcome of a spec
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The spec passes
    Pass,
    /// The spec fails with the given expectation message
    Fail { message: String },
}

/// A named grouping of specs and nested suites
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteDef {
    /// The suite description
    pub name: String,
    /// Child items in declaration order
    pub items: Vec<SuiteItem>,
    /// Line number of the `suite` keyword
    pub line_num: usize,
}

/// A single child of a suite
#[derive(Debug, Clone, PartialEq)]
pub enum SuiteItem {
    Suite(SuiteDef),
    Spec(SpecDef),
}

/// Parse a spec file into its top-level suites
///
/// # Errors
/// Returns a Parse error for unknown keywords, specs outside a suite,
/// unbalanced `suite`/`end` pairs, or malformed verdicts.
pub fn parse(content: &str) -> Result<Vec<SuiteDef>> {
    let mut top_level = Vec::new();
    let mut stack: Vec<SuiteDef> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line_num = i + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let tokens = parse_tokens(trimmed, line_num)?;
        let Some(keyword) = tokens.first() else {
            continue;
        };

        match keyword.as_str() {
            "suite" => {
                if tokens.len() != 2 {
                    return Err(Error::parse_error(
                        line_num,
                        "suite requires exactly one name argument",
                    ));
                }
                stack.push(SuiteDef {
                    name: tokens[1].clone(),
                    items: Vec::new(),
                    line_num,
                });
            }
            "spec" => {
                let spec = parse_spec_line(&tokens, line_num)?;
                match stack.last_mut() {
                    Some(suite) => suite.items.push(SuiteItem::Spec(spec)),
                    None => {
                        return Err(Error::parse_error(
                            line_num,
                            "spec declared outside of a suite",
                        ))
                    }
                }
            }
            "end" => {
                if tokens.len() != 1 {
                    return Err(Error::parse_error(line_num, "end takes no arguments"));
                }
                let Some(finished) = stack.pop() else {
                    return Err(Error::parse_error(line_num, "end without matching suite"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.items.push(SuiteItem::Suite(finished)),
                    None => top_level.push(finished),
                }
            }
            other => {
                return Err(Error::parse_error(
                    line_num,
                    format!("unknown keyword: {}", other),
                ));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::parse_error(
            open.line_num,
            format!("suite '{}' is never closed", open.name),
        ));
    }

    Ok(top_level)
}

/// Parse the tokens of a `spec` line into a SpecDef
fn parse_spec_line(tokens: &[String], line_num: usize) -> Result<SpecDef> {
    if tokens.len() < 3 {
        return Err(Error::parse_error(
            line_num,
            "spec requires a name and a verdict",
        ));
    }

    let name = tokens[1].clone();
    let verdict = match tokens[2].as_str() {
        "pass" => {
            if tokens.len() > 3 {
                return Err(Error::parse_error(
                    line_num,
                    "pass takes no further arguments",
                ));
            }
            Verdict::Pass
        }
        "fail" => {
            if tokens.len() > 4 {
                return Err(Error::parse_error(
                    line_num,
                    "fail takes at most one message argument",
                ));
            }
            let message = tokens
                .get(3)
                .cloned()
                .unwrap_or_else(|| "Failed".to_string());
            Verdict::Fail { message }
        }
        other => {
            return Err(Error::parse_error(
                line_num,
                format!("unknown verdict: {} (expected pass or fail)", other),
            ));
        }
    };

    Ok(SpecDef {
        name,
        verdict,
        line_num,
    })
}

/// Split a line into tokens, handling quoted arguments
fn parse_tokens(input: &str, line_num: usize) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current_token = String::new();
    let mut in_quotes = false;
    let mut just_closed_quotes = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                just_closed_quotes = !in_quotes;
            }
            ' ' | '\t' => {
                if in_quotes {
                    current_token.push(ch);
                } else if !current_token.is_empty() || just_closed_quotes {
                    tokens.push(current_token.clone());
                    current_token.clear();
                    just_closed_quotes = false;
                }
            }
            '\\' => {
                if let Some(next_ch) = chars.next() {
                    match next_ch {
                        'n' => current_token.push('\n'),
                        't' => current_token.push('\t'),
                        '\\' => current_token.push('\\'),
                        '"' => current_token.push('"'),
                        _ => {
                            current_token.push('\\');
                            current_token.push(next_ch);
                        }
                    }
                } else {
                    current_token.push('\\');
                }
            }
            _ => {
                current_token.push(ch);
                just_closed_quotes = false;
            }
        }
    }

    if in_quotes {
        return Err(Error::parse_error(line_num, "unterminated quoted string"));
    }

    if !current_token.is_empty() || just_closed_quotes {
        tokens.push(current_token);
    }

    Ok(tokens)
}
