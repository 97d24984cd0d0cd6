//! Token-list interpolation for compound values such as `translate(10px, 4px)`
//! or `0 0 4px`. Both endpoints must tokenize to the same shape: identical
//! literals in identical positions, numbers aligned pairwise.

use crate::interpolation::{Parsed, Token, ValueInterpolator};
use crate::params::{format_number, PropValue};

#[derive(Debug)]
enum Segment {
    Literal(String),
    Pair {
        from: f64,
        to: f64,
        unit: Option<String>,
    },
}

#[derive(Debug)]
pub struct TokenListInterpolator {
    segments: Vec<Segment>,
}

impl ValueInterpolator for TokenListInterpolator {
    fn value_at(&self, eased: f64) -> PropValue {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Pair { from, to, unit } => {
                    let v = from + (to - from) * eased;
                    out.push_str(&format_number(v));
                    if let Some(unit) = unit {
                        out.push_str(unit);
                    }
                }
            }
        }
        PropValue::Text(out)
    }
}

/// Accepts two token lists of identical shape.
pub fn create(from: &Parsed, to: &Parsed) -> Option<Box<dyn ValueInterpolator>> {
    let (Parsed::Tokens(ft), Parsed::Tokens(tt)) = (from, to) else {
        return None;
    };
    if ft.len() != tt.len() {
        return None;
    }
    let mut segments = Vec::with_capacity(ft.len());
    for (f, t) in ft.iter().zip(tt.iter()) {
        match (f, t) {
            (Token::Literal(a), Token::Literal(b)) if a == b => {
                segments.push(Segment::Literal(a.clone()));
            }
            (
                Token::Number { value: fv, unit: fu },
                Token::Number { value: tv, unit: tu },
            ) => {
                let unit = match (fu, tu) {
                    (None, None) => None,
                    (Some(u), None) | (None, Some(u)) => Some(u.clone()),
                    (Some(a), Some(b)) if a == b => Some(a.clone()),
                    _ => return None,
                };
                segments.push(Segment::Pair {
                    from: *fv,
                    to: *tv,
                    unit,
                });
            }
            _ => return None,
        }
    }
    Some(Box::new(TokenListInterpolator { segments }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::parse_scalar;

    #[test]
    fn test_translate_pair() {
        let from = parse_scalar("translate(0px, 0px)");
        let to = parse_scalar("translate(16px, 32px)");
        let interp = create(&from, &to).unwrap();
        assert_eq!(
            interp.value_at(0.5),
            PropValue::Text("translate(8px, 16px)".to_string())
        );
        assert_eq!(
            interp.value_at(1.0),
            PropValue::Text("translate(16px, 32px)".to_string())
        );
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let from = parse_scalar("translate(0px, 0px)");
        let to = parse_scalar("rotate(45deg)");
        assert!(create(&from, &to).is_none());
    }

    #[test]
    fn test_rejects_unit_mismatch() {
        let from = parse_scalar("inset(1px 2px)");
        let to = parse_scalar("inset(3px 4em)");
        assert!(create(&from, &to).is_none());
    }

    #[test]
    fn test_bare_number_list() {
        let from = parse_scalar("0 0 4px");
        let to = parse_scalar("8 8 16px");
        let interp = create(&from, &to).unwrap();
        assert_eq!(
            interp.value_at(0.5),
            PropValue::Text("4 4 10px".to_string())
        );
    }
}
