//! Last-resort interpolators.

use crate::interpolation::ValueInterpolator;
use crate::params::PropValue;

/// Emits the same value on every frame; used when both endpoints are equal.
#[derive(Debug)]
pub struct ConstantInterpolator {
    value: PropValue,
}

impl ConstantInterpolator {
    pub fn new(value: PropValue) -> Self {
        Self { value }
    }
}

impl ValueInterpolator for ConstantInterpolator {
    fn value_at(&self, _eased: f64) -> PropValue {
        self.value.clone()
    }
}

/// Holds the origin value until the easing reaches 1, then switches. This is
/// the interpolator that cannot fail, so heterogeneous endpoints (`"auto"` to
/// `"8px"`) still produce a well-defined animation.
#[derive(Debug)]
pub struct InstantInterpolator {
    from: PropValue,
    to: PropValue,
}

impl InstantInterpolator {
    pub fn new(from: PropValue, to: PropValue) -> Self {
        Self { from, to }
    }
}

impl ValueInterpolator for InstantInterpolator {
    fn value_at(&self, eased: f64) -> PropValue {
        if eased >= 1.0 {
            self.to.clone()
        } else {
            self.from.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let interp = ConstantInterpolator::new(PropValue::Text("auto".into()));
        assert_eq!(interp.value_at(0.0), PropValue::Text("auto".into()));
        assert_eq!(interp.value_at(1.0), PropValue::Text("auto".into()));
    }

    #[test]
    fn test_instant_switch() {
        let interp = InstantInterpolator::new(
            PropValue::Text("hidden".into()),
            PropValue::Text("visible".into()),
        );
        assert_eq!(interp.value_at(0.0), PropValue::Text("hidden".into()));
        assert_eq!(interp.value_at(0.99), PropValue::Text("hidden".into()));
        assert_eq!(interp.value_at(1.0), PropValue::Text("visible".into()));
    }
}
