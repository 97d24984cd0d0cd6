//! Inherited animation settings.
//!
//! Every timeline carries a settings chain. `defaults()` pushes a new record
//! whose lookup falls through to the previous one; child timelines copy the
//! parent's chain head when they attach, so an override is scoped to the
//! timeline it was made on and to children created afterwards. Fields that no
//! record specifies fall back to a fixed default record.

use crate::easing::Easing;
use crate::time::Ms;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A partial settings override, as accepted by `defaults()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub easing: Option<Easing>,
    pub duration: Option<Ms>,
    pub delay: Option<Ms>,
    pub release: Option<Ms>,
    pub elasticity: Option<f64>,
    pub speed: Option<f64>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
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
}

#[derive(Debug)]
struct SettingsRecord {
    patch: SettingsPatch,
    parent: Option<Rc<SettingsRecord>>,
}

/// A settings chain head. Cloning shares the chain; deriving extends it.
#[derive(Debug, Clone)]
pub struct Settings {
    head: Option<Rc<SettingsRecord>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::root()
    }
}

impl Settings {
    /// The empty chain: every lookup resolves to the fixed defaults
    /// (easing = OutElastic, duration = 1000, delay = 0, release = 0,
    /// elasticity = 0.5, speed = 1).
    pub fn root() -> Self {
        Self { head: None }
    }

    /// Push an override record on top of this chain.
    pub fn derive(&self, patch: SettingsPatch) -> Self {
        Self {
            head: Some(Rc::new(SettingsRecord {
                patch,
                parent: self.head.clone(),
            })),
        }
    }

    fn lookup<T: Copy>(&self, field: impl Fn(&SettingsPatch) -> Option<T>, fallback: T) -> T {
        let mut record = self.head.as_deref();
        while let Some(r) = record {
            if let Some(v) = field(&r.patch) {
                return v;
            }
            record = r.parent.as_deref();
        }
        fallback
    }

    pub fn easing(&self) -> Easing {
        self.lookup(|p| p.easing, Easing::OutElastic)
    }

    pub fn duration(&self) -> Ms {
        self.lookup(|p| p.duration, 1000)
    }

    pub fn delay(&self) -> Ms {
        self.lookup(|p| p.delay, 0)
    }

    pub fn release(&self) -> Ms {
        self.lookup(|p| p.release, 0)
    }

    pub fn elasticity(&self) -> f64 {
        self.lookup(|p| p.elasticity, 0.5)
    }

    pub fn speed(&self) -> f64 {
        self.lookup(|p| p.speed, 1.0)
    }
}
