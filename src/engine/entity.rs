//! Time-bounded participants of a timeline.
//!
//! Every entity carries an [`EntityCore`]: the delay/duration/release window,
//! derived time points, and the registration/running/done/released flags. A
//! timeline's running list holds [`Child`] handles; the enum keeps leaf
//! entities, nested timelines and sub-players behind one dispatch surface
//! without downcasting.

use crate::engine::pipe::EngineShared;
use crate::engine::player_entity::PlayerEntityHandle;
use crate::engine::timeline::{Timeline, TimelineInner};
use crate::time::Ms;
use crate::Result;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub(crate) type ParentRef = Weak<RefCell<TimelineInner>>;

/// Shared timing state of one entity.
pub(crate) struct EntityCore {
    pub name: String,
    pub delay: Ms,
    pub release: Ms,
    /// `None` until discovered (nested sub-players learn theirs from the
    /// wrapped timeline's first complete run).
    pub duration: Option<Ms>,
    pub start_time: Ms,
    pub delayed_start_time: Ms,
    pub done_time: Ms,
    pub delayed_end_time: Ms,
    pub end_time: Ms,
    pub start_registered: bool,
    pub end_registered: bool,
    pub is_running: bool,
    pub done: bool,
    pub released: bool,
    /// Set when the entity wants its parent to unlink it; the parent sweeps
    /// this right after the entity's frame and on every drain pass.
    pub removal_requested: bool,
    pub parent: Option<ParentRef>,
    release_flag: Rc<Cell<bool>>,
}

impl EntityCore {
    pub fn new(name: String, delay: Ms, release: Ms, duration: Option<Ms>) -> Self {
        Self {
            name,
            delay,
            release,
            duration,
            start_time: 0,
            delayed_start_time: 0,
            done_time: 0,
            delayed_end_time: 0,
            end_time: 0,
            start_registered: false,
            end_registered: false,
            is_running: false,
            done: false,
            released: false,
            removal_requested: false,
            parent: None,
            release_flag: Rc::new(Cell::new(false)),
        }
    }

    /// Bind the entity to its start time and derive the remaining time
    /// points. With an unknown duration only `start_time` and
    /// `delayed_start_time` are meaningful; the rest follow once the duration
    /// is discovered.
    pub fn init(&mut self, start_time: Ms) {
        if self.delay < 0 {
            self.delay = 0;
        }
        self.start_time = start_time;
        self.delayed_start_time = start_time + self.delay;
        if let Some(d) = self.duration {
            self.finalize_window(d);
        }
    }

    /// Late duration discovery: re-derive the window at the recorded start.
    pub fn set_duration(&mut self, duration: Ms) {
        self.duration = Some(duration);
        self.init(self.start_time);
    }

    fn finalize_window(&mut self, duration: Ms) {
        // A release below -duration would put the release point before the
        // delayed start; clamp it.
        if self.release < -duration {
            self.release = -duration;
        }
        self.done_time = self.delayed_start_time + duration;
        self.delayed_end_time = self.done_time + self.release;
        self.end_time = self.done_time.max(self.delayed_end_time);
    }

    /// The next interesting time strictly past `time` in the traversal
    /// direction, or `None`.
    ///
    /// While the release has not fired, the forward candidates visit the
    /// release point in window order; once consumed, only the start and done
    /// points remain. Backward traversal never revisits the release.
    pub fn next_candidate(&self, time: Ms, forward: bool) -> Option<Ms> {
        let past = |c: &Ms| if forward { *c > time } else { *c < time };
        if self.duration.is_none() {
            return Some(self.delayed_start_time).filter(past);
        }
        let candidates: Vec<Ms> = if !self.released {
            if forward {
                if self.release <= 0 {
                    vec![
                        self.delayed_start_time,
                        self.delayed_end_time,
                        self.done_time,
                    ]
                } else {
                    vec![
                        self.delayed_start_time,
                        self.done_time,
                        self.delayed_end_time,
                    ]
                }
            } else {
                vec![self.done_time, self.delayed_start_time]
            }
        } else if forward {
            vec![self.delayed_start_time, self.done_time]
        } else {
            vec![self.done_time, self.delayed_start_time]
        };
        candidates.into_iter().find(|c| past(c))
    }

    /// Track done/released transitions and removal. Returns true when a flag
    /// changed (the caller bumps the async pipe).
    pub fn check_done_and_release(&mut self, time: Ms, forward: bool) -> bool {
        if self.duration.is_none() {
            return false;
        }
        let mut changed = false;
        if time == self.done_time && !self.done {
            self.done = true;
            changed = true;
        }
        if self.done
            && ((forward && time == self.end_time) || (!forward && time == self.start_time))
            && self.is_running
            && !self.removal_requested
        {
            self.removal_requested = true;
            changed = true;
        }
        if time == self.delayed_end_time && self.mark_released() {
            changed = true;
        }
        changed
    }

    /// One-shot release. Returns true on the transition.
    pub fn mark_released(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.release_flag.set(true);
        true
    }

    pub fn release_flag(&self) -> Rc<Cell<bool>> {
        self.release_flag.clone()
    }

    #[inline]
    pub fn active_window_contains(&self, time: Ms) -> bool {
        self.duration.is_some() && time >= self.delayed_start_time && time <= self.end_time
    }
}

/// A leaf entity: tween groups and delays implement this directly.
pub(crate) trait Entity {
    fn core(&self) -> &EntityCore;
    fn core_mut(&mut self) -> &mut EntityCore;

    fn display_frame(
        &mut self,
        time: Ms,
        target_time: Ms,
        forward: bool,
        ctx: &EngineShared,
    ) -> Result<()>;

    fn next_marker_position(&self, time: Ms, forward: bool) -> Option<Ms> {
        self.core().next_candidate(time, forward)
    }
}

/// Pure time filler.
pub(crate) struct Delay {
    core: EntityCore,
}

impl Delay {
    pub fn new(name: String, duration: Ms) -> Self {
        Self {
            core: EntityCore::new(name, 0, 0, Some(duration)),
        }
    }
}

impl Entity for Delay {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn display_frame(
        &mut self,
        time: Ms,
        _target_time: Ms,
        forward: bool,
        ctx: &EngineShared,
    ) -> Result<()> {
        if self.core.check_done_and_release(time, forward) {
            ctx.pipe.bump();
        }
        Ok(())
    }
}

/// A running-list member.
#[derive(Clone)]
pub(crate) enum Child {
    Leaf(Rc<RefCell<dyn Entity>>),
    Timeline(Timeline),
    Player(PlayerEntityHandle),
}

impl Child {
    pub fn leaf(entity: impl Entity + 'static) -> Self {
        Child::Leaf(Rc::new(RefCell::new(entity)))
    }

    pub fn with_core<R>(&self, f: impl FnOnce(&EntityCore) -> R) -> R {
        match self {
            Child::Leaf(e) => f(e.borrow().core()),
            Child::Timeline(t) => t.with_core(f),
            Child::Player(p) => p.with_core(f),
        }
    }

    pub fn with_core_mut<R>(&self, f: impl FnOnce(&mut EntityCore) -> R) -> R {
        match self {
            Child::Leaf(e) => f(e.borrow_mut().core_mut()),
            Child::Timeline(t) => t.with_core_mut(f),
            Child::Player(p) => p.with_core_mut(f),
        }
    }

    pub fn display_frame(
        &self,
        time: Ms,
        target_time: Ms,
        forward: bool,
        ctx: &Rc<EngineShared>,
    ) -> Result<()> {
        match self {
            Child::Leaf(e) => e
                .borrow_mut()
                .display_frame(time, target_time, forward, ctx),
            Child::Timeline(t) => t.display_frame(time, target_time, forward),
            Child::Player(p) => p.display_frame(time, target_time, forward, ctx),
        }
    }

    pub fn next_marker_position(&self, time: Ms, forward: bool) -> Option<Ms> {
        match self {
            Child::Leaf(e) => e.borrow().next_marker_position(time, forward),
            Child::Timeline(t) => t.next_marker_position(time, forward),
            Child::Player(p) => p.next_marker_position(time, forward),
        }
    }

    pub fn ptr_eq(&self, other: &Child) -> bool {
        match (self, other) {
            (Child::Leaf(a), Child::Leaf(b)) => Rc::ptr_eq(a, b),
            (Child::Timeline(a), Child::Timeline(b)) => a.ptr_eq(b),
            (Child::Player(a), Child::Player(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn name(&self) -> String {
        self.with_core(|c| c.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core(delay: Ms, release: Ms, duration: Ms) -> EntityCore {
        let mut c = EntityCore::new("e".to_string(), delay, release, Some(duration));
        c.init(0);
        c
    }

    #[test]
    fn test_window_derivation() {
        let c = core(16, 0, 32);
        assert_eq!(c.delayed_start_time, 16);
        assert_eq!(c.done_time, 48);
        assert_eq!(c.delayed_end_time, 48);
        assert_eq!(c.end_time, 48);
    }

    #[test]
    fn test_negative_delay_is_clamped() {
        let c = core(-16, 0, 32);
        assert_eq!(c.delay, 0);
        assert_eq!(c.delayed_start_time, 0);
    }

    #[test]
    fn test_release_clamp() {
        // release below -duration would put the release point before the
        // delayed start
        let c = core(0, -100, 32);
        assert_eq!(c.release, -32);
        assert_eq!(c.delayed_end_time, 0);
        assert_eq!(c.end_time, 32);
    }

    #[test]
    fn test_window_invariants() {
        for (delay, release, duration) in [(0, 0, 32), (16, 16, 32), (0, -16, 32), (8, -64, 16)] {
            let c = core(delay, release, duration);
            assert!(c.delayed_start_time <= c.delayed_end_time);
            assert!(c.delayed_end_time <= c.end_time);
            assert!(c.delayed_start_time <= c.done_time);
            assert!(c.done_time <= c.end_time);
        }
    }

    #[test]
    fn test_forward_candidates_zero_release() {
        let c = core(16, 0, 32);
        assert_eq!(c.next_candidate(0, true), Some(16));
        assert_eq!(c.next_candidate(16, true), Some(48));
        assert_eq!(c.next_candidate(48, true), None);
    }

    #[test]
    fn test_forward_candidates_positive_release() {
        let c = core(0, 16, 32);
        // order: delayed start, done, delayed end
        assert_eq!(c.next_candidate(-1, true), Some(0));
        assert_eq!(c.next_candidate(0, true), Some(32));
        assert_eq!(c.next_candidate(32, true), Some(48));
    }

    #[test]
    fn test_forward_candidates_negative_release() {
        let c = core(0, -16, 32);
        // order: delayed start, delayed end, done
        assert_eq!(c.next_candidate(0, true), Some(16));
        assert_eq!(c.next_candidate(16, true), Some(32));
    }

    #[test]
    fn test_candidates_after_release_consumed() {
        let mut c = core(0, 16, 32);
        assert!(c.mark_released());
        // the release point is no longer visited
        assert_eq!(c.next_candidate(0, true), Some(32));
        assert_eq!(c.next_candidate(32, true), None);
    }

    #[test]
    fn test_backward_candidates() {
        let c = core(16, 0, 32);
        assert_eq!(c.next_candidate(100, false), Some(48));
        assert_eq!(c.next_candidate(48, false), Some(16));
        assert_eq!(c.next_candidate(16, false), None);
    }

    #[test]
    fn test_done_and_release_transitions() {
        let mut c = core(0, 0, 32);
        c.is_running = true;
        assert!(!c.check_done_and_release(16, true));
        // done and released fire together at 32 (release is 0), and the
        // entity asks for removal at its end time
        assert!(c.check_done_and_release(32, true));
        assert!(c.done);
        assert!(c.released);
        assert!(c.removal_requested);
    }

    #[test]
    fn test_release_is_one_shot() {
        let mut c = core(0, 0, 32);
        assert!(c.mark_released());
        assert!(!c.mark_released());
        assert!(c.release_flag().get());
    }

    #[test]
    fn test_unknown_duration_only_exposes_start() {
        let mut c = EntityCore::new("p".to_string(), 16, 0, None);
        c.init(0);
        assert_eq!(c.next_candidate(0, true), Some(16));
        assert_eq!(c.next_candidate(16, true), None);
        assert!(!c.check_done_and_release(16, true));
    }
}
