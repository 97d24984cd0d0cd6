//! Property value interpolation.
//!
//! `resolve` turns a `[from, to]` endpoint pair into a boxed
//! [`ValueInterpolator`]. Candidates are tried most specific first: plain
//! number with unit, color, token list, constant, and finally an instant
//! switch that never fails. Scalar parses are memoized in an LRU cache keyed
//! by the source string, since the same property values recur across tweens.

pub mod color;
pub mod constant;
pub mod numeric;
pub mod tokens;

use crate::dom::AnimationType;
use crate::params::PropValue;
use self::color::Rgba;
use lru::LruCache;
use std::fmt::Debug;
use std::num::NonZeroUsize;

/// Emits one committed value per frame for a fixed endpoint pair.
pub trait ValueInterpolator: Debug {
    /// Value at the given eased progression. `eased` is usually in [0, 1]
    /// but may overshoot for elastic easings.
    fn value_at(&self, eased: f64) -> PropValue;
}

/// Context handed to the interpolator resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    /// The origin was read live from the target rather than supplied.
    pub from_is_live: bool,
    pub prop_name: &'a str,
    pub kind: AnimationType,
}

/// One token of a mixed value string.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number { value: f64, unit: Option<String> },
    Literal(String),
}

/// A parsed scalar property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Number { value: f64, unit: Option<String> },
    Color(Rgba),
    Tokens(Vec<Token>),
    Raw(String),
}

/// Memoized scalar parsing.
pub struct ParseCache {
    cache: LruCache<String, Parsed>,
}

impl ParseCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn parsed(&mut self, value: &PropValue) -> Parsed {
        match value {
            PropValue::Number(n) => Parsed::Number {
                value: *n,
                unit: None,
            },
            PropValue::Text(s) => {
                if let Some(hit) = self.cache.get(s) {
                    return hit.clone();
                }
                let parsed = parse_scalar(s);
                self.cache.put(s.clone(), parsed.clone());
                parsed
            }
        }
    }
}

/// Parse one scalar value string.
pub fn parse_scalar(s: &str) -> Parsed {
    let t = s.trim();
    if let Some((value, unit)) = parse_number_unit(t) {
        return Parsed::Number { value, unit };
    }
    if let Some(color) = color::parse(t) {
        return Parsed::Color(color);
    }
    let tokens = tokenize(t);
    if tokens
        .iter()
        .any(|tok| matches!(tok, Token::Number { .. }))
    {
        Parsed::Tokens(tokens)
    } else {
        Parsed::Raw(t.to_string())
    }
}

/// Parse a string that is exactly one number with an optional unit.
fn parse_number_unit(s: &str) -> Option<(f64, Option<String>)> {
    let split = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_alphabetic() || *c == '%')
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    let value: f64 = num.trim().parse().ok()?;
    if unit.is_empty() {
        return Some((value, None));
    }
    if unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
        Some((value, Some(unit.to_string())))
    } else {
        None
    }
}

fn starts_number(cs: &[char], i: usize) -> bool {
    let c = cs[i];
    if c.is_ascii_digit() {
        return true;
    }
    let next = cs.get(i + 1);
    match c {
        '-' | '+' => matches!(next, Some(n) if n.is_ascii_digit() || *n == '.'),
        '.' => matches!(next, Some(n) if n.is_ascii_digit()),
        _ => false,
    }
}

/// Split a value string into literal and number-with-unit tokens.
pub fn tokenize(s: &str) -> Vec<Token> {
    let cs: Vec<char> = s.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < cs.len() {
        if starts_number(&cs, i) {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            let mut num = String::new();
            if cs[i] == '-' || cs[i] == '+' {
                num.push(cs[i]);
                i += 1;
            }
            while i < cs.len() && (cs[i].is_ascii_digit() || cs[i] == '.') {
                num.push(cs[i]);
                i += 1;
            }
            let mut unit = String::new();
            while i < cs.len() && (cs[i].is_ascii_alphabetic() || cs[i] == '%') {
                unit.push(cs[i]);
                i += 1;
            }
            let value: f64 = num.parse().unwrap_or(0.0);
            tokens.push(Token::Number {
                value,
                unit: if unit.is_empty() { None } else { Some(unit) },
            });
        } else {
            literal.push(cs[i]);
            i += 1;
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Resolve an interpolator for an endpoint pair. Never fails: the instant
/// interpolator is the last resort.
pub fn resolve(
    from: &PropValue,
    to: &PropValue,
    opts: ResolveOptions<'_>,
    cache: &mut ParseCache,
) -> Box<dyn ValueInterpolator> {
    let pf = cache.parsed(from);
    let pt = cache.parsed(to);

    if let Some(interp) = numeric::create(&pf, &pt) {
        return interp;
    }
    if let Some(interp) = color::create(&pf, &pt) {
        return interp;
    }
    if let Some(interp) = tokens::create(&pf, &pt) {
        return interp;
    }
    if from == to {
        return Box::new(constant::ConstantInterpolator::new(to.clone()));
    }
    log::debug!(
        "property '{}' ({}, live origin: {}) falls back to an instant switch",
        opts.prop_name,
        opts.kind.name(),
        opts.from_is_live
    );
    Box::new(constant::InstantInterpolator::new(from.clone(), to.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ResolveOptions<'static> {
        ResolveOptions {
            from_is_live: false,
            prop_name: "left",
            kind: AnimationType::Css,
        }
    }

    #[test]
    fn test_parse_number_unit() {
        assert_eq!(
            parse_scalar("16px"),
            Parsed::Number {
                value: 16.0,
                unit: Some("px".to_string())
            }
        );
        assert_eq!(
            parse_scalar("-1.5"),
            Parsed::Number {
                value: -1.5,
                unit: None
            }
        );
        assert_eq!(
            parse_scalar("50%"),
            Parsed::Number {
                value: 50.0,
                unit: Some("%".to_string())
            }
        );
    }

    #[test]
    fn test_parse_raw() {
        assert_eq!(parse_scalar("auto"), Parsed::Raw("auto".to_string()));
    }

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize("translate(10px, -2.5em)");
        assert_eq!(
            tokens,
            vec![
                Token::Literal("translate(".to_string()),
                Token::Number {
                    value: 10.0,
                    unit: Some("px".to_string())
                },
                Token::Literal(", ".to_string()),
                Token::Number {
                    value: -2.5,
                    unit: Some("em".to_string())
                },
                Token::Literal(")".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_numeric() {
        let mut cache = ParseCache::new(8);
        let interp = resolve(&"0px".into(), &"16px".into(), opts(), &mut cache);
        assert_eq!(interp.value_at(0.5), PropValue::Text("8px".to_string()));
    }

    #[test]
    fn test_resolve_prefers_specific_over_instant() {
        let mut cache = ParseCache::new(8);
        // unit mismatch: numeric refuses, tokens refuse (literal shape
        // differs), instant takes over
        let interp = resolve(&"10px".into(), &"50%".into(), opts(), &mut cache);
        assert_eq!(interp.value_at(0.0), PropValue::Text("10px".to_string()));
        assert_eq!(interp.value_at(1.0), PropValue::Text("50%".to_string()));
    }

    #[test]
    fn test_resolve_constant() {
        let mut cache = ParseCache::new(8);
        let interp = resolve(&"auto".into(), &"auto".into(), opts(), &mut cache);
        assert_eq!(interp.value_at(0.3), PropValue::Text("auto".to_string()));
    }

    #[test]
    fn test_cache_hit_returns_same_parse() {
        let mut cache = ParseCache::new(8);
        let a = cache.parsed(&"12px".into());
        let b = cache.parsed(&"12px".into());
        assert_eq!(a, b);
    }
}
