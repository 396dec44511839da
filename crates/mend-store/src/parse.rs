//! # DL Sentence Parser
//!
//! Parses the Description Logic string notation that the generation
//! capability emits into typed [`AxiomForm`] values. The accepted grammar
//! is deliberately small (one sentence, one axiom):
//!
//! | Input | Shape |
//! |-------|-------|
//! | `A ⊑ B` | subsumption |
//! | `A ⊑ ∃p.F` | existential restriction |
//! | `A ⊑ ∀p.F` | universal restriction |
//! | `A ⊓ B ⊑ ⊥` / `Disjoint(A, B)` | disjointness |
//! | `A ⊑ ≤n p` / `A ⊑ <=n p` | max cardinality |
//! | `A ⊑ ≥n p` / `A ⊑ >=n p` | min cardinality |
//!
//! ASCII fallbacks (`some`/`only` keywords are not accepted; `<=`, `>=`
//! are) keep hand-written fixtures readable. Anything else fails with
//! [`StoreError::AxiomSyntax`]; unparseable candidates fail the cycle
//! immediately and are never retried.

use crate::models::{AxiomForm, Result, StoreError};
use regex::Regex;
use std::sync::OnceLock;

/// Parses a single DL sentence into an [`AxiomForm`].
///
/// # Example
///
/// ```rust
/// use mend_store::{parse_axiom, AxiomForm};
///
/// let ax = parse_axiom("Pneumonia ⊑ ∃causedBy.NovelVirusX").unwrap();
/// assert_eq!(ax, AxiomForm::some_values("Pneumonia", "causedBy", "NovelVirusX"));
///
/// assert!(parse_axiom("not an axiom").is_err());
/// ```
pub fn parse_axiom(input: &str) -> Result<AxiomForm> {
    let text = input.trim();
    if text.is_empty() {
        return Err(StoreError::AxiomSyntax("empty sentence".to_string()));
    }

    // Disjoint(A, B) function form.
    if let Some(rest) = text.strip_prefix("Disjoint(") {
        let inner = rest
            .strip_suffix(')')
            .ok_or_else(|| syntax_err(text, "unterminated Disjoint(...)"))?;
        let (a, b) = split_pair(inner, ',').ok_or_else(|| {
            syntax_err(text, "Disjoint(...) expects exactly two class names")
        })?;
        return Ok(AxiomForm::disjoint(ident(a, text)?, ident(b, text)?));
    }

    let (lhs, rhs) = split_pair(text, '⊑')
        .ok_or_else(|| syntax_err(text, "expected exactly one ⊑"))?;

    // A ⊓ B ⊑ ⊥ infix disjointness.
    if rhs == "⊥" {
        let (a, b) = split_pair(lhs, '⊓')
            .ok_or_else(|| syntax_err(text, "bottom subsumption expects A ⊓ B on the left"))?;
        return Ok(AxiomForm::disjoint(ident(a, text)?, ident(b, text)?));
    }

    let sub = ident(lhs, text)?;

    // Restrictions: ∃p.F and ∀p.F.
    for (prefix, existential) in [("∃", true), ("∀", false)] {
        if let Some(rest) = rhs.strip_prefix(prefix) {
            let (property, filler) = split_pair(rest, '.')
                .ok_or_else(|| syntax_err(text, "restriction expects property.Filler"))?;
            let property = ident(property, text)?;
            let filler = ident(filler, text)?;
            return Ok(if existential {
                AxiomForm::some_values(sub, property, filler)
            } else {
                AxiomForm::all_values(sub, property, filler)
            });
        }
    }

    // Cardinalities: ≤n p / ≥n p with ASCII fallbacks.
    for (prefixes, upper) in [(["≤", "<="], true), (["≥", ">="], false)] {
        for prefix in prefixes {
            if let Some(rest) = rhs.strip_prefix(prefix) {
                let mut parts = rest.split_whitespace();
                let n: u32 = parts
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| syntax_err(text, "cardinality expects a bound"))?;
                let property = parts
                    .next()
                    .ok_or_else(|| syntax_err(text, "cardinality expects a property"))?;
                if parts.next().is_some() {
                    return Err(syntax_err(text, "trailing tokens after cardinality"));
                }
                let property = ident(property, text)?;
                return Ok(if upper {
                    AxiomForm::max_cardinality(sub, property, n)
                } else {
                    AxiomForm::min_cardinality(sub, property, n)
                });
            }
        }
    }

    // Plain subsumption.
    Ok(AxiomForm::sub_class_of(sub, ident(rhs, text)?))
}

/// Splits `text` on exactly one occurrence of `sep`, trimming both sides.
fn split_pair(text: &str, sep: char) -> Option<(&str, &str)> {
    let mut parts = text.splitn(2, sep);
    let left = parts.next()?.trim();
    let right = parts.next()?.trim();
    if left.is_empty() || right.is_empty() || right.contains(sep) {
        return None;
    }
    Some((left, right))
}

/// The identifier pattern, compiled once.
fn ident_pattern() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    // Pattern is constant, compilation cannot fail.
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap())
}

/// Validates an identifier token (class or property name).
fn ident(token: &str, sentence: &str) -> Result<String> {
    let token = token.trim();
    if ident_pattern().is_match(token) {
        Ok(token.to_string())
    } else {
        Err(syntax_err(sentence, &format!("invalid identifier '{token}'")))
    }
}

fn syntax_err(sentence: &str, reason: &str) -> StoreError {
    StoreError::AxiomSyntax(format!("'{sentence}': {reason}"))
}
