//! Tweens and tween groups.
//!
//! One `animate()` call becomes one [`TweenGroup`]: every non-control key of
//! the parameters is a [`Tween`] bound to the same resolved target. Per
//! frame, the group gathers the tweens' values and commits them in one pass,
//! either through the DOM adapter or through a caller-supplied apply
//! function.

use crate::dom::{self, AnimationType, Element, Scope};
use crate::easing::Easing;
use crate::engine::entity::{Entity, EntityCore};
use crate::engine::pipe::EngineShared;
use crate::interpolation::{self, ResolveOptions, ValueInterpolator};
use crate::params::{AnimateParams, ApplyFn, PropValue, PropertySpec, Target};
use crate::settings::Settings;
use crate::time::{adjust_duration, Ms};
use crate::Result;
use std::rc::Rc;

/// One property binding on the group's target.
pub(crate) struct Tween {
    pub prop: String,
    pub kind: AnimationType,
    pub is_valid: bool,
    interpolator: Option<Box<dyn ValueInterpolator>>,
}

/// How gathered frame values reach the target.
pub(crate) enum ApplyStrategy {
    /// Dispatch each property through the DOM adapter by its recorded type.
    Dom(Element),
    /// Hand each `(property, value)` pair to the target function.
    Callback(ApplyFn),
}

pub(crate) struct TweenGroup {
    core: EntityCore,
    easing: Easing,
    elasticity: f64,
    tweens: Vec<Tween>,
    apply: ApplyStrategy,
}

impl TweenGroup {
    /// Build a group from `animate()` parameters. Returns `None` (after
    /// logging) when the target cannot be resolved; invalid property specs
    /// only invalidate their own tween.
    pub fn build(
        params: AnimateParams,
        settings: &Settings,
        scope: &Rc<dyn Scope>,
        ctx: &EngineShared,
    ) -> Option<TweenGroup> {
        let target = match params.target {
            Some(Target::Selector(selector)) => match scope.query(&selector).into_iter().next() {
                Some(el) => Target::Element(el),
                None => {
                    log::error!(
                        "animate(): selector '{}' did not match any element",
                        selector
                    );
                    return None;
                }
            },
            Some(other) => other,
            None => {
                log::error!("animate(): missing target");
                return None;
            }
        };

        let speed = params.speed.unwrap_or_else(|| settings.speed());
        let duration =
            adjust_duration(params.duration.unwrap_or_else(|| settings.duration()), speed);
        let delay = adjust_duration(params.delay.unwrap_or_else(|| settings.delay()), speed);
        let release = adjust_duration(params.release.unwrap_or_else(|| settings.release()), speed);
        let easing = params.easing.unwrap_or_else(|| settings.easing());
        let elasticity = params.elasticity.unwrap_or_else(|| settings.elasticity());

        let mut tweens = Vec::with_capacity(params.props.len());
        {
            let mut cache = ctx.parse_cache.borrow_mut();
            for (prop, spec) in &params.props {
                let kind = dom::resolve_type(&target, prop);
                if kind == AnimationType::Invalid {
                    log::error!("tween '{}': unrenderable target (E1000)", prop);
                    tweens.push(Tween {
                        prop: prop.clone(),
                        kind,
                        is_valid: false,
                        interpolator: None,
                    });
                    continue;
                }
                let (from, to, from_is_live) = match spec {
                    PropertySpec::FromTo(from, to) => (from.clone(), to.clone(), false),
                    PropertySpec::To(to) => {
                        let from = match &target {
                            Target::Element(el) => dom::read_value(el, prop, kind)
                                .map(PropValue::Text)
                                .unwrap_or_else(|| PropValue::Text("0".to_string())),
                            _ => PropValue::Text("0".to_string()),
                        };
                        (from, to.clone(), true)
                    }
                };
                let interpolator = interpolation::resolve(
                    &from,
                    &to,
                    ResolveOptions {
                        from_is_live,
                        prop_name: prop.as_str(),
                        kind,
                    },
                    &mut cache,
                );
                tweens.push(Tween {
                    prop: prop.clone(),
                    kind,
                    is_valid: true,
                    interpolator: Some(interpolator),
                });
            }
        }

        let apply = match target {
            Target::Element(el) => ApplyStrategy::Dom(el),
            Target::Callback(f) => ApplyStrategy::Callback(f),
            // selectors were resolved above
            Target::Selector(_) => return None,
        };

        Some(TweenGroup {
            core: EntityCore::new(ctx.next_name("tween"), delay, release, Some(duration)),
            easing,
            elasticity,
            tweens,
            apply,
        })
    }

    fn commit(&self, eased: f64) {
        let mut values: Vec<(&Tween, PropValue)> = Vec::with_capacity(self.tweens.len());
        for tween in &self.tweens {
            if !tween.is_valid {
                continue;
            }
            if let Some(interpolator) = &tween.interpolator {
                values.push((tween, interpolator.value_at(eased)));
            }
        }
        match &self.apply {
            ApplyStrategy::Callback(f) => {
                for (tween, value) in &values {
                    f(&tween.prop, value);
                }
            }
            ApplyStrategy::Dom(el) => {
                for (tween, value) in &values {
                    dom::write_value(el, &tween.prop, tween.kind, value);
                }
            }
        }
    }
}

impl Entity for TweenGroup {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn display_frame(
        &mut self,
        time: Ms,
        target_time: Ms,
        forward: bool,
        ctx: &EngineShared,
    ) -> Result<()> {
        if self.core.active_window_contains(time) {
            let c = &self.core;
            // Intermediate frames only commit when they land exactly on the
            // delayed start or done time; only the target frame receives a
            // fully interpolated value.
            let progression = if time == target_time && time <= c.done_time {
                Some(time - c.delayed_start_time)
            } else if forward && target_time >= c.done_time && time == c.done_time {
                Some(time - c.delayed_start_time)
            } else if !forward && target_time <= c.delayed_start_time && time == c.delayed_start_time
            {
                Some(0)
            } else {
                None
            };
            if let Some(p) = progression {
                let duration = c.duration.unwrap_or(0);
                let normalized = if duration > 0 {
                    p as f64 / duration as f64
                } else if forward {
                    1.0
                } else {
                    0.0
                };
                let eased = self.easing.evaluate(normalized, self.elasticity);
                self.commit(eased);
            }
        }
        if self.core.check_done_and_release(time, forward) {
            ctx.pipe.bump();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::dom::{MemoryDocument, MemoryElement};

    fn build_group(params: AnimateParams) -> (Element, Option<TweenGroup>) {
        let mut doc = MemoryDocument::new();
        let el = doc.add(MemoryElement::div("a").with_style("left", "0px"));
        let scope: Rc<dyn Scope> = Rc::new(doc);
        let ctx = EngineShared::new(EngineConfig::default());
        let group = TweenGroup::build(params, &Settings::root(), &scope, &ctx);
        (el, group)
    }

    #[test]
    fn test_build_resolves_selector() {
        let (_el, group) = build_group(
            AnimateParams::new()
                .target("#a")
                .duration(16)
                .prop("left", ("0px", "16px")),
        );
        let group = group.unwrap();
        assert_eq!(group.tweens.len(), 1);
        assert!(group.tweens[0].is_valid);
        assert_eq!(group.tweens[0].kind, AnimationType::Css);
    }

    #[test]
    fn test_build_rejects_unknown_selector() {
        let (_el, group) = build_group(
            AnimateParams::new()
                .target("#missing")
                .prop("left", "16px"),
        );
        assert!(group.is_none());
    }

    #[test]
    fn test_quantizes_timing() {
        let (_el, group) = build_group(
            AnimateParams::new()
                .target("#a")
                .duration(100)
                .delay(10)
                .prop("left", ("0px", "16px")),
        );
        let group = group.unwrap();
        assert_eq!(group.core.duration, Some(96));
        assert_eq!(group.core.delay, 16);
    }

    #[test]
    fn test_commit_through_dom() {
        let (el, group) = build_group(
            AnimateParams::new()
                .target("#a")
                .duration(16)
                .easing(Easing::Linear)
                .prop("left", ("0px", "16px")),
        );
        let group = group.unwrap();
        group.commit(0.5);
        assert_eq!(el.style("left").as_deref(), Some("8px"));
        group.commit(1.0);
        assert_eq!(el.style("left").as_deref(), Some("16px"));
    }

    #[test]
    fn test_live_origin_read() {
        let mut doc = MemoryDocument::new();
        let el = doc.add(MemoryElement::div("a").with_style("left", "8px"));
        let scope: Rc<dyn Scope> = Rc::new(doc);
        let ctx = EngineShared::new(EngineConfig::default());
        let group = TweenGroup::build(
            AnimateParams::new()
                .target("#a")
                .duration(16)
                .easing(Easing::Linear)
                .prop("left", "24px"),
            &Settings::root(),
            &scope,
            &ctx,
        )
        .unwrap();
        group.commit(0.5);
        assert_eq!(el.style("left").as_deref(), Some("16px"));
    }

    #[test]
    fn test_callback_target() {
        use std::cell::RefCell;
        let seen: Rc<RefCell<Vec<(String, String)>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let ctx = EngineShared::new(EngineConfig::default());
        let scope: Rc<dyn Scope> = Rc::new(MemoryDocument::new());
        let group = TweenGroup::build(
            AnimateParams::new()
                .target(Target::Callback(Rc::new(move |prop, value| {
                    sink.borrow_mut().push((prop.to_string(), value.to_string()));
                })))
                .duration(16)
                .easing(Easing::Linear)
                .prop("volume", (0.0, 10.0)),
            &Settings::root(),
            &scope,
            &ctx,
        )
        .unwrap();
        assert_eq!(group.tweens[0].kind, AnimationType::Function);
        group.commit(0.5);
        assert_eq!(seen.borrow().as_slice(), &[("volume".to_string(), "5".to_string())]);
    }
}
