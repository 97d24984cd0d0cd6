//! Number-with-unit interpolation.

use crate::interpolation::{Parsed, ValueInterpolator};
use crate::params::{format_number, PropValue};

#[derive(Debug)]
pub struct NumericInterpolator {
    from: f64,
    to: f64,
    unit: Option<String>,
}

impl NumericInterpolator {
    pub fn new(from: f64, to: f64, unit: Option<String>) -> Self {
        Self { from, to, unit }
    }
}

impl ValueInterpolator for NumericInterpolator {
    fn value_at(&self, eased: f64) -> PropValue {
        let value = self.from + (self.to - self.from) * eased;
        match &self.unit {
            Some(unit) => PropValue::Text(format!("{}{}", format_number(value), unit)),
            None => PropValue::Number(value),
        }
    }
}

/// Accepts two plain numbers whose units agree. A one-sided unit (a bare
/// number against `"16px"`) adopts the explicit unit.
pub fn create(from: &Parsed, to: &Parsed) -> Option<Box<dyn ValueInterpolator>> {
    let (Parsed::Number { value: f, unit: uf }, Parsed::Number { value: t, unit: ut }) =
        (from, to)
    else {
        return None;
    };
    let unit = match (uf, ut) {
        (None, None) => None,
        (Some(u), None) | (None, Some(u)) => Some(u.clone()),
        (Some(a), Some(b)) if a == b => Some(a.clone()),
        _ => return None,
    };
    Some(Box::new(NumericInterpolator::new(*f, *t, unit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: f64, unit: Option<&str>) -> Parsed {
        Parsed::Number {
            value,
            unit: unit.map(str::to_string),
        }
    }

    #[test]
    fn test_interpolates_with_unit() {
        let interp = create(&number(0.0, Some("px")), &number(16.0, Some("px"))).unwrap();
        assert_eq!(interp.value_at(0.0), PropValue::Text("0px".to_string()));
        assert_eq!(interp.value_at(0.5), PropValue::Text("8px".to_string()));
        assert_eq!(interp.value_at(1.0), PropValue::Text("16px".to_string()));
    }

    #[test]
    fn test_bare_numbers_stay_numeric() {
        let interp = create(&number(1.0, None), &number(2.0, None)).unwrap();
        assert_eq!(interp.value_at(0.5), PropValue::Number(1.5));
    }

    #[test]
    fn test_adopts_one_sided_unit() {
        let interp = create(&number(0.0, None), &number(10.0, Some("em"))).unwrap();
        assert_eq!(interp.value_at(1.0), PropValue::Text("10em".to_string()));
    }

    #[test]
    fn test_rejects_unit_mismatch() {
        assert!(create(&number(0.0, Some("px")), &number(1.0, Some("em"))).is_none());
    }

    #[test]
    fn test_overshoot() {
        let interp = create(&number(0.0, Some("px")), &number(10.0, Some("px"))).unwrap();
        assert_eq!(interp.value_at(1.2), PropValue::Text("12px".to_string()));
    }
}
