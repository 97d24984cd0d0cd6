//! Nested sub-players.
//!
//! A sub-player wraps a fresh sub-timeline with playback semantics: `times`
//! cycles, optional alternation (forward leg then backward leg), and separate
//! forward/backward speeds. Its duration is unknown until the wrapped
//! timeline completes once; the first `done` report fixes the leg lengths
//! and the total window.

use crate::engine::entity::EntityCore;
use crate::engine::pipe::EngineShared;
use crate::engine::timeline::Timeline;
use crate::params::PlayParams;
use crate::time::{adjust_duration, Ms};
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;

fn scale(t: Ms, speed: f64) -> Ms {
    (t as f64 * speed).trunc() as Ms
}

fn unscale(t: Ms, speed: f64) -> Ms {
    if speed <= 0.0 {
        0
    } else {
        (t as f64 / speed).trunc() as Ms
    }
}

pub(crate) struct PlayerEntity {
    pub core: EntityCore,
    wrapped: Timeline,
    times: u32,
    alternate: bool,
    speed: f64,
    back_speed: f64,
    /// Forward / backward leg lengths on the outer axis; meaningful once the
    /// duration is known.
    d1: Ms,
    d2: Ms,
    last_outer_forward: Option<bool>,
}

impl PlayerEntity {
    pub fn new(name: String, params: PlayParams, wrapped: Timeline) -> Self {
        let mut speed = params.speed;
        if speed <= 0.0 {
            log::warn!("sub-player '{}': non-positive speed, using 1", name);
            speed = 1.0;
        }
        let mut back_speed = params.effective_back_speed();
        if back_speed <= 0.0 {
            back_speed = speed;
        }
        // Zero cycles never runs the wrapped timeline at all: the entity is
        // a zero-duration filler.
        let duration = if params.times == 0 { Some(0) } else { None };
        let delay = adjust_duration(params.delay, 1.0);
        let release = adjust_duration(params.release, 1.0);
        Self {
            core: EntityCore::new(name, delay, release, duration),
            wrapped,
            times: params.times,
            alternate: params.alternate,
            speed,
            back_speed,
            d1: 0,
            d2: 0,
            last_outer_forward: None,
        }
    }

    fn finalize_duration(&mut self, tl_duration: Ms) {
        self.d1 = unscale(tl_duration, self.speed);
        self.d2 = if self.alternate {
            unscale(tl_duration, self.back_speed)
        } else {
            0
        };
        let total = (self.d1 + self.d2) * self.times as Ms;
        self.core.set_duration(total);
    }
}

#[derive(Clone)]
pub(crate) struct PlayerEntityHandle {
    inner: Rc<RefCell<PlayerEntity>>,
}

/// The leg of a cycle that contains `rel`: `(leg_start, leg_end,
/// is_forward_leg)` on the relative axis. On a leg boundary, forward
/// traversal picks the leg starting there, backward the leg ending there.
fn current_leg(rel: Ms, cycle: Ms, d1: Ms, forward: bool) -> (Ms, Ms, bool) {
    let mut k = rel.div_euclid(cycle);
    let mut t = rel.rem_euclid(cycle);
    if !forward && t == 0 && rel != 0 {
        k -= 1;
        t = cycle;
    }
    let base = k * cycle;
    if d1 >= cycle {
        // no backward leg
        (base, base + cycle, true)
    } else if (forward && t < d1) || (!forward && t <= d1) {
        (base, base + d1, true)
    } else {
        (base + d1, base + cycle, false)
    }
}

/// Nearest leg boundary strictly past `rel` within `[0, total]`.
fn next_boundary(rel: Ms, cycle: Ms, d1: Ms, total: Ms, forward: bool) -> Option<Ms> {
    let k = rel.div_euclid(cycle);
    let mut boundaries = Vec::with_capacity(8);
    for kk in [k - 1, k, k + 1] {
        if kk >= 0 {
            boundaries.push(kk * cycle);
            if d1 > 0 && d1 < cycle {
                boundaries.push(kk * cycle + d1);
            }
        }
    }
    boundaries.push(total);
    boundaries.retain(|b| *b >= 0 && *b <= total);
    if forward {
        boundaries.into_iter().filter(|b| *b > rel).min()
    } else {
        boundaries.into_iter().filter(|b| *b < rel).max()
    }
}

impl PlayerEntityHandle {
    pub fn new(entity: PlayerEntity) -> Self {
        Self {
            inner: Rc::new(RefCell::new(entity)),
        }
    }

    pub fn ptr_eq(&self, other: &PlayerEntityHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn with_core<R>(&self, f: impl FnOnce(&EntityCore) -> R) -> R {
        f(&self.inner.borrow().core)
    }

    pub fn with_core_mut<R>(&self, f: impl FnOnce(&mut EntityCore) -> R) -> R {
        f(&mut self.inner.borrow_mut().core)
    }

    pub fn display_frame(
        &self,
        time: Ms,
        _target_time: Ms,
        forward: bool,
        ctx: &Rc<EngineShared>,
    ) -> Result<()> {
        let (duration, ds, wrapped, speed, back_speed, d1, d2, reload) = {
            let mut e = self.inner.borrow_mut();
            let reload = e.core.duration.is_none()
                && e.last_outer_forward.map_or(false, |last| last != forward);
            e.last_outer_forward = Some(forward);
            (
                e.core.duration,
                e.core.delayed_start_time,
                e.wrapped.clone(),
                e.speed,
                e.back_speed,
                e.d1,
                e.d2,
                reload,
            )
        };
        match duration {
            None => {
                // Discovery: run the wrapped timeline forward at `speed`
                // until it reports completion.
                if reload {
                    wrapped.reload_entities()?;
                }
                let rel = (time - ds).max(0);
                wrapped.move_to(scale(rel, speed))?;
                if let Some(tl_duration) = wrapped.done_at() {
                    self.inner.borrow_mut().finalize_duration(tl_duration);
                    ctx.pipe.bump();
                }
            }
            Some(0) => {}
            Some(total) => {
                let rel = time - ds;
                let cycle = d1 + d2;
                if rel >= 0 && rel <= total && cycle > 0 {
                    let mut t = rel.rem_euclid(cycle);
                    // A cycle boundary renders the final backward frame of
                    // the finished cycle, not the first frame of the next.
                    if t == 0 && rel != 0 {
                        t = cycle;
                    }
                    let child_time = if t <= d1 {
                        scale(t, speed)
                    } else {
                        scale(cycle - t, back_speed)
                    };
                    wrapped.move_to(child_time)?;
                }
            }
        }
        if self
            .inner
            .borrow_mut()
            .core
            .check_done_and_release(time, forward)
        {
            ctx.pipe.bump();
        }
        Ok(())
    }

    /// Map the wrapped timeline's markers onto the outer axis and reconcile
    /// with the entity's own window candidates.
    pub fn next_marker_position(&self, time: Ms, forward: bool) -> Option<Ms> {
        let (base, duration, ds, wrapped, speed, back_speed, d1, d2) = {
            let e = self.inner.borrow();
            (
                e.core.next_candidate(time, forward),
                e.core.duration,
                e.core.delayed_start_time,
                e.wrapped.clone(),
                e.speed,
                e.back_speed,
                e.d1,
                e.d2,
            )
        };
        let mapped: Option<Ms> = match duration {
            None => {
                let rel = time - ds;
                if rel < 0 && !forward {
                    None
                } else {
                    wrapped
                        .next_marker_position(scale(rel.max(0), speed), forward)
                        .map(|m| ds + unscale(m, speed))
                        .filter(|c| if forward { *c > time } else { *c < time })
                }
            }
            Some(0) => None,
            Some(total) => {
                let cycle = d1 + d2;
                let rel = time - ds;
                if cycle <= 0 || (forward && rel >= total) || (!forward && rel <= 0) {
                    None
                } else {
                    let rel = rel.clamp(0, total);
                    let (leg_start, leg_end, forward_leg) = current_leg(rel, cycle, d1, forward);
                    let (child_time, child_forward) = if forward_leg {
                        (scale(rel - leg_start, speed), forward)
                    } else {
                        (scale(leg_end - rel, back_speed), !forward)
                    };
                    let within_leg = wrapped
                        .next_marker_position(child_time, child_forward)
                        .map(|m| {
                            if forward_leg {
                                leg_start + unscale(m, speed)
                            } else {
                                leg_end - unscale(m, back_speed)
                            }
                        })
                        .filter(|c| {
                            *c >= leg_start
                                && *c <= leg_end
                                && (if forward { *c > rel } else { *c < rel })
                        });
                    within_leg
                        .or_else(|| next_boundary(rel, cycle, d1, total, forward))
                        .map(|c| ds + c)
                        .filter(|c| if forward { *c > time } else { *c < time })
                }
            }
        };
        match (base, mapped) {
            (Some(a), Some(b)) => Some(if forward { a.min(b) } else { a.max(b) }),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_leg_forward() {
        // cycle 48 = 32 forward + 16 backward
        assert_eq!(current_leg(0, 48, 32, true), (0, 32, true));
        assert_eq!(current_leg(31, 48, 32, true), (0, 32, true));
        assert_eq!(current_leg(32, 48, 32, true), (32, 48, false));
        assert_eq!(current_leg(47, 48, 32, true), (32, 48, false));
        assert_eq!(current_leg(48, 48, 32, true), (48, 80, true));
    }

    #[test]
    fn test_current_leg_backward() {
        assert_eq!(current_leg(48, 48, 32, false), (32, 48, false));
        assert_eq!(current_leg(32, 48, 32, false), (0, 32, true));
        assert_eq!(current_leg(40, 48, 32, false), (32, 48, false));
    }

    #[test]
    fn test_current_leg_without_alternation() {
        assert_eq!(current_leg(0, 32, 32, true), (0, 32, true));
        assert_eq!(current_leg(33, 32, 32, true), (32, 64, true));
    }

    #[test]
    fn test_next_boundary() {
        // boundaries of a 48-cycle with d1 = 32, total 96
        assert_eq!(next_boundary(0, 48, 32, 96, true), Some(32));
        assert_eq!(next_boundary(32, 48, 32, 96, true), Some(48));
        assert_eq!(next_boundary(80, 48, 32, 96, true), Some(96));
        assert_eq!(next_boundary(96, 48, 32, 96, true), None);
        assert_eq!(next_boundary(48, 48, 32, 96, false), Some(32));
        assert_eq!(next_boundary(0, 48, 32, 96, false), None);
    }

    #[test]
    fn test_scaling() {
        assert_eq!(scale(16, 2.0), 32);
        assert_eq!(scale(16, 0.5), 8);
        assert_eq!(unscale(32, 2.0), 16);
        assert_eq!(unscale(0, 0.0), 0);
    }
}
