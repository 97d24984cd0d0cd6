//! Parameter types accepted by the animation DSL.

use crate::dom::Element;
use crate::easing::Easing;
use crate::time::Ms;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// A single committed property value: either a bare number or a string
/// (numbers with units, colors, token lists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Number(n) => f.write_str(&format_number(*n)),
            PropValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        PropValue::Number(n)
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        PropValue::Number(n as f64)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Text(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Text(s)
    }
}

/// Format a number the way stylesheets expect: at most three decimals, no
/// trailing zeros.
pub(crate) fn format_number(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    if r == r.trunc() {
        format!("{}", r as i64)
    } else {
        format!("{}", r)
    }
}

/// A property animation spec: destination only (origin read live from the
/// target) or an explicit `[from, to]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertySpec {
    To(PropValue),
    FromTo(PropValue, PropValue),
}

impl From<&str> for PropertySpec {
    fn from(v: &str) -> Self {
        PropertySpec::To(v.into())
    }
}

impl From<String> for PropertySpec {
    fn from(v: String) -> Self {
        PropertySpec::To(v.into())
    }
}

impl From<f64> for PropertySpec {
    fn from(v: f64) -> Self {
        PropertySpec::To(v.into())
    }
}

impl From<i64> for PropertySpec {
    fn from(v: i64) -> Self {
        PropertySpec::To(v.into())
    }
}

impl<A: Into<PropValue>, B: Into<PropValue>> From<(A, B)> for PropertySpec {
    fn from((from, to): (A, B)) -> Self {
        PropertySpec::FromTo(from.into(), to.into())
    }
}

impl From<[&str; 2]> for PropertySpec {
    fn from([from, to]: [&str; 2]) -> Self {
        PropertySpec::FromTo(from.into(), to.into())
    }
}

/// Callback target: receives each committed `(property, value)` pair.
pub type ApplyFn = Rc<dyn Fn(&str, &PropValue)>;

/// An animation target.
#[derive(Clone)]
pub enum Target {
    /// A selector resolved through the timeline's scope when the tween group
    /// is built.
    Selector(String),
    /// A resolved element.
    Element(Element),
    /// A target function invoked with every committed property.
    Callback(ApplyFn),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Target::Element(e) => f.debug_tuple("Element").field(&e.tag()).finish(),
            Target::Callback(_) => f.write_str("Callback"),
        }
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::Selector(s.to_string())
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Target::Selector(s)
    }
}

impl From<Element> for Target {
    fn from(e: Element) -> Self {
        Target::Element(e)
    }
}

/// Parameters for `animate()` / `set()`.
///
/// The control fields mirror the inherited settings; anything added through
/// [`prop`](AnimateParams::prop) is a property spec.
#[derive(Debug, Clone, Default)]
pub struct AnimateParams {
    pub target: Option<Target>,
    pub easing: Option<Easing>,
    pub duration: Option<Ms>,
    pub delay: Option<Ms>,
    pub release: Option<Ms>,
    pub elasticity: Option<f64>,
    pub speed: Option<f64>,
    pub props: Vec<(String, PropertySpec)>,
}

impl AnimateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn duration(mut self, duration: Ms) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn delay(mut self, delay: Ms) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn release(mut self, release: Ms) -> Self {
        self.release = Some(release);
        self
    }

    pub fn elasticity(mut self, elasticity: f64) -> Self {
        self.elasticity = Some(elasticity);
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn prop(mut self, name: impl Into<String>, spec: impl Into<PropertySpec>) -> Self {
        self.props.push((name.into(), spec.into()));
        self
    }
}

/// Parameters for a nested sub-player created by `play()`.
#[derive(Debug, Clone)]
pub struct PlayParams {
    /// Number of cycles to run. Zero collapses the sub-player to a
    /// zero-duration filler.
    pub times: u32,
    /// Play the wrapped timeline backward on the second half of each cycle.
    pub alternate: bool,
    /// Speed of the forward leg.
    pub speed: f64,
    /// Speed of the backward leg; defaults to `speed`.
    pub back_speed: Option<f64>,
    pub delay: Ms,
    pub release: Ms,
}

impl Default for PlayParams {
    fn default() -> Self {
        Self {
            times: 1,
            alternate: false,
            speed: 1.0,
            back_speed: None,
            delay: 0,
            release: 0,
        }
    }
}

impl PlayParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn times(mut self, times: u32) -> Self {
        self.times = times;
        self
    }

    pub fn alternate(mut self, alternate: bool) -> Self {
        self.alternate = alternate;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn back_speed(mut self, back_speed: f64) -> Self {
        self.back_speed = Some(back_speed);
        self
    }

    pub fn delay(mut self, delay: Ms) -> Self {
        self.delay = delay;
        self
    }

    pub fn release(mut self, release: Ms) -> Self {
        self.release = release;
        self
    }

    /// Effective backward-leg speed.
    #[inline]
    pub fn effective_back_speed(&self) -> f64 {
        self.back_speed.unwrap_or(self.speed)
    }
}

/// Parameters for `iterate()`.
#[derive(Debug, Clone)]
pub struct IterParams {
    /// Selector resolved against the timeline's scope.
    pub targets: String,
    /// Run one group per target in parallel instead of sequentially.
    pub parallel: bool,
}

impl From<&str> for IterParams {
    fn from(selector: &str) -> Self {
        Self {
            targets: selector.to_string(),
            parallel: false,
        }
    }
}

impl IterParams {
    pub fn parallel(selector: &str) -> Self {
        Self {
            targets: selector.to_string(),
            parallel: true,
        }
    }
}
