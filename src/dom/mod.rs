//! DOM read/write adapters.
//!
//! The engine never talks to a concrete document model. Targets are
//! [`Element`] handles over an [`ElementBackend`], selectors resolve through a
//! [`Scope`], and every write is dispatched by the property's resolved
//! [`AnimationType`]. The in-memory implementations back the demos and tests;
//! a browser integration would provide its own backends.

pub mod transform;

use crate::params::{PropValue, Target};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

lazy_static! {
    /// CSS transform functions a property name can address directly.
    pub static ref TRANSFORM_FUNCTIONS: HashSet<&'static str> = [
        "translate",
        "translateX",
        "translateY",
        "translateZ",
        "rotate",
        "rotateX",
        "rotateY",
        "rotateZ",
        "scale",
        "scaleX",
        "scaleY",
        "scaleZ",
        "skew",
        "skewX",
        "skewY",
        "perspective",
    ]
    .into_iter()
    .collect();
}

/// How a property is read from and written to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    /// The target is a callback; values are handed to it directly.
    Function,
    /// An element attribute (covers SVG presentation attributes).
    Attribute,
    /// One function of the element's CSS transform chain.
    Transform,
    /// A style property.
    Css,
    /// The property cannot be rendered; the tween contributes no frames.
    Invalid,
}

impl AnimationType {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Attribute => "attribute",
            Self::Transform => "transform",
            Self::Css => "css",
            Self::Invalid => "invalid",
        }
    }
}

/// Storage behind an [`Element`] handle.
pub trait ElementBackend {
    fn tag(&self) -> &str;
    fn is_svg(&self) -> bool;
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&mut self, name: &str, value: String);
    fn style(&self, name: &str) -> Option<String>;
    fn set_style(&mut self, name: &str, value: String);
}

/// Cloneable handle to an animation target element.
#[derive(Clone)]
pub struct Element {
    inner: Rc<RefCell<dyn ElementBackend>>,
}

impl Element {
    pub fn new(backend: Rc<RefCell<dyn ElementBackend>>) -> Self {
        Self { inner: backend }
    }

    pub fn tag(&self) -> String {
        self.inner.borrow().tag().to_string()
    }

    pub fn is_svg(&self) -> bool {
        self.inner.borrow().is_svg()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.borrow().attribute(name)
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.inner.borrow_mut().set_attribute(name, value.into());
    }

    pub fn style(&self, name: &str) -> Option<String> {
        self.inner.borrow().style(name)
    }

    pub fn set_style(&self, name: &str, value: impl Into<String>) {
        self.inner.borrow_mut().set_style(name, value.into());
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("tag", &self.tag()).finish()
    }
}

/// Selector resolution over a document.
pub trait Scope {
    fn query(&self, selector: &str) -> Vec<Element>;
}

/// Resolve the animation type of one property on a target.
///
/// Function targets take everything. For elements, a present attribute wins
/// (this is how SVG presentation attributes such as `cx` are picked up), then
/// the transform-function set, then CSS.
pub fn resolve_type(target: &Target, prop: &str) -> AnimationType {
    match target {
        Target::Callback(_) => AnimationType::Function,
        Target::Element(el) => {
            if el.attribute(prop).is_some() {
                AnimationType::Attribute
            } else if TRANSFORM_FUNCTIONS.contains(prop) {
                AnimationType::Transform
            } else {
                AnimationType::Css
            }
        }
        Target::Selector(_) => AnimationType::Invalid,
    }
}

/// Read the current value of a property from an element.
pub fn read_value(el: &Element, prop: &str, kind: AnimationType) -> Option<String> {
    match kind {
        AnimationType::Css => el.style(prop),
        AnimationType::Attribute => el.attribute(prop),
        AnimationType::Transform => transform::read_component(el, prop),
        AnimationType::Function | AnimationType::Invalid => None,
    }
}

/// Write a committed value to an element according to its animation type.
pub fn write_value(el: &Element, prop: &str, kind: AnimationType, value: &PropValue) {
    match kind {
        AnimationType::Css => el.set_style(prop, value.to_string()),
        AnimationType::Attribute => el.set_attribute(prop, value.to_string()),
        AnimationType::Transform => transform::write_component(el, prop, &value.to_string()),
        AnimationType::Function | AnimationType::Invalid => {
            log::warn!("unsupported write type {} for '{}'", kind.name(), prop);
        }
    }
}

/// In-memory element used by demos and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryElement {
    tag: String,
    svg: bool,
    id: Option<String>,
    classes: Vec<String>,
    attributes: HashMap<String, String>,
    styles: HashMap<String, String>,
}

impl MemoryElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// An HTML element with an id, e.g. `MemoryElement::div("box")`.
    pub fn div(id: impl Into<String>) -> Self {
        Self::new("div").with_id(id)
    }

    /// An SVG element, e.g. `MemoryElement::svg("circle", "dot")`.
    pub fn svg(tag: impl Into<String>, id: impl Into<String>) -> Self {
        let mut el = Self::new(tag).with_id(id);
        el.svg = true;
        el
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(name.into(), value.into());
        self
    }

    fn matches(&self, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            self.id.as_deref() == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            self.classes.iter().any(|c| c == class)
        } else {
            self.tag == selector
        }
    }
}

impl ElementBackend for MemoryElement {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn is_svg(&self) -> bool {
        self.svg
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: String) {
        self.attributes.insert(name.to_string(), value);
    }

    fn style(&self, name: &str) -> Option<String> {
        self.styles.get(name).cloned()
    }

    fn set_style(&mut self, name: &str, value: String) {
        self.styles.insert(name.to_string(), value);
    }
}

/// Flat in-memory document. Elements are matched by `#id`, `.class` or tag.
#[derive(Default)]
pub struct MemoryDocument {
    elements: Vec<Rc<RefCell<MemoryElement>>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element and return a handle to it.
    pub fn add(&mut self, element: MemoryElement) -> Element {
        let rc = Rc::new(RefCell::new(element));
        self.elements.push(rc.clone());
        Element::new(rc)
    }
}

impl Scope for MemoryDocument {
    fn query(&self, selector: &str) -> Vec<Element> {
        self.elements
            .iter()
            .filter(|el| el.borrow().matches(selector))
            .map(|el| Element::new(el.clone()))
            .collect()
    }
}
