//! Timelines and the instruction DSL.
//!
//! A timeline discovers its structure by running an async instruction
//! closure. Each structural change (entity attached, entity removed,
//! completion) lands in the marker index; seeking walks markers in either
//! direction, draining the async pipe between frames so instructions queued
//! by the frame just rendered register their own markers before the next
//! step.

use crate::config::FRAME_MS;
use crate::dom::{Element, Scope};
use crate::engine::entity::{Child, Delay, EntityCore};
use crate::engine::marker::MarkerIndex;
use crate::engine::pipe::EngineShared;
use crate::engine::player_entity::{PlayerEntity, PlayerEntityHandle};
use crate::engine::tween::TweenGroup;
use crate::params::{AnimateParams, IterParams, PlayParams};
use crate::settings::{Settings, SettingsPatch};
use crate::time::{adjust_duration, Ms};
use crate::Result;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// A boxed instruction body, as stored by sequences and parallel tracks.
pub type Instruction = Box<dyn FnOnce(Anim) -> LocalBoxFuture<'static, ()>>;

/// Box an async closure into an [`Instruction`].
pub fn instruction<F, Fut>(f: F) -> Instruction
where
    F: FnOnce(Anim) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Box::new(move |anim| f(anim).boxed_local())
}

/// Resolves when the associated entity releases. Progress is driven by the
/// engine's drain passes, so no waker bookkeeping is needed.
pub struct ReleaseFuture {
    flag: Rc<Cell<bool>>,
}

impl ReleaseFuture {
    pub(crate) fn new(flag: Rc<Cell<bool>>) -> Self {
        Self { flag }
    }

    /// An already-resolved future, used when nothing was attached.
    pub(crate) fn ready() -> Self {
        Self {
            flag: Rc::new(Cell::new(true)),
        }
    }
}

impl Future for ReleaseFuture {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.flag.get() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

pub(crate) struct TimelineInner {
    pub core: EntityCore,
    pub ctx: Rc<EngineShared>,
    pub settings: Settings,
    pub scope: Rc<dyn Scope>,
    pub markers: MarkerIndex,
    pub running: Vec<Child>,
    instruction: Option<Instruction>,
    tl_future: Option<LocalBoxFuture<'static, ()>>,
    pub tl_function_called: bool,
    pub tl_function_complete: bool,
    /// -1 until the first frame is displayed.
    pub current_time: Ms,
    pub last_target_time: Ms,
    pub last_target_forward: bool,
    pub move_target: Ms,
    /// Set when a forward walk runs out of markers.
    pub end_time: Option<Ms>,
    /// The clamped end recorded when the running list first emptied; nested
    /// sub-players read their wrapped timeline's total duration from here.
    pub done_at: Option<Ms>,
}

impl TimelineInner {
    pub fn drop_future(&mut self) {
        self.tl_future = None;
        self.instruction = None;
    }
}

/// Cloneable handle to a timeline. All container operations live on the
/// handle so that no borrow is held while child entities run their frames.
#[derive(Clone)]
pub(crate) struct Timeline {
    inner: Rc<RefCell<TimelineInner>>,
}

impl Timeline {
    pub fn new(
        ctx: &Rc<EngineShared>,
        settings: Settings,
        scope: Rc<dyn Scope>,
        name: String,
        instruction: Option<Instruction>,
    ) -> Self {
        let inner = Rc::new(RefCell::new(TimelineInner {
            core: EntityCore::new(name, 0, 0, None),
            ctx: ctx.clone(),
            settings,
            scope,
            markers: MarkerIndex::new(),
            running: Vec::new(),
            instruction,
            tl_future: None,
            tl_function_called: false,
            tl_function_complete: false,
            current_time: -1,
            last_target_time: -1,
            last_target_forward: true,
            move_target: -1,
            end_time: None,
            done_at: None,
        }));
        ctx.register_timeline(&inner);
        Self { inner }
    }

    pub fn from_inner(inner: Rc<RefCell<TimelineInner>>) -> Self {
        Self { inner }
    }

    pub fn ptr_eq(&self, other: &Timeline) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn with_core<R>(&self, f: impl FnOnce(&EntityCore) -> R) -> R {
        f(&self.inner.borrow().core)
    }

    pub fn with_core_mut<R>(&self, f: impl FnOnce(&mut EntityCore) -> R) -> R {
        f(&mut self.inner.borrow_mut().core)
    }

    fn ctx(&self) -> Rc<EngineShared> {
        self.inner.borrow().ctx.clone()
    }

    pub fn current_time(&self) -> Ms {
        self.inner.borrow().current_time
    }

    pub fn end_time(&self) -> Option<Ms> {
        self.inner.borrow().end_time
    }

    pub fn done_at(&self) -> Option<Ms> {
        self.inner.borrow().done_at
    }

    pub fn marker_times(&self) -> Vec<Ms> {
        self.inner.borrow().markers.times()
    }

    /// Seek to `time_target`, rendering every crossed marker frame.
    /// Idempotent when already there.
    pub fn move_to(&self, time_target: Ms) -> Result<Ms> {
        let time_target = time_target.max(0);
        let (current, last_forward, started) = {
            let i = self.inner.borrow();
            (i.current_time, i.last_target_forward, i.current_time >= 0)
        };
        if started && current == time_target {
            return Ok(current);
        }
        let forward = time_target > current;
        let ctx = self.ctx();

        // A direction reversal replays the current frame with the new
        // direction first, so markers at the current instant re-load the
        // entities the opposite walk unloaded. Value commits are unaffected:
        // intermediate frames only commit on exact start/done boundaries.
        if started && forward != last_forward {
            self.display_frame(current, time_target, forward)?;
            ctx.exhaust()?;
        }

        {
            let mut i = self.inner.borrow_mut();
            i.move_target = time_target;
            i.last_target_time = time_target;
            i.last_target_forward = forward;
        }

        loop {
            let (current, move_target, start_time) = {
                let i = self.inner.borrow();
                (i.current_time, i.move_target, i.core.start_time)
            };
            if current == move_target {
                break;
            }
            let next_target = if current < 0 {
                start_time.max(0)
            } else {
                match self.next_marker_position(current, forward) {
                    Some(n) if n != current => n,
                    _ => {
                        let mut i = self.inner.borrow_mut();
                        if forward {
                            i.end_time = Some(current);
                        }
                        i.move_target = current;
                        break;
                    }
                }
            };
            let next_target = if forward {
                next_target.min(move_target)
            } else {
                next_target.max(move_target)
            };
            self.display_frame(next_target, time_target, forward)?;
            ctx.exhaust()?;
        }
        Ok(self.inner.borrow().current_time)
    }

    /// Render one frame at `time`. The first call runs the instruction
    /// closure; later calls advance the running children and load the marker
    /// recorded at this instant.
    pub fn display_frame(&self, time: Ms, target_time: Ms, forward: bool) -> Result<()> {
        let (first_call, ctx) = {
            let mut i = self.inner.borrow_mut();
            i.current_time = time;
            i.last_target_time = target_time;
            i.last_target_forward = forward;
            let first = !i.tl_function_called;
            if first {
                i.tl_function_called = true;
            }
            (first, i.ctx.clone())
        };
        if first_call {
            self.spawn_instruction();
            ctx.pipe.bump();
        } else {
            let children: Vec<Child> = self.inner.borrow().running.clone();
            for child in children {
                if !child.with_core(|c| c.is_running) {
                    // unlinked earlier in this same frame
                    continue;
                }
                child.display_frame(time, target_time, forward, &ctx)?;
                if child.with_core(|c| c.removal_requested && c.is_running) {
                    self.remove_entity(&child);
                }
            }
            self.load_entities(time, forward)?;
        }
        self.check_state();
        Ok(())
    }

    /// Apply the marker recorded at `time`: forward traversal starts its
    /// start entities and ends its end entities; backward swaps the roles.
    /// Lists are walked in reverse index order.
    fn load_entities(&self, time: Ms, forward: bool) -> Result<()> {
        let (starts, ends) = {
            let i = self.inner.borrow();
            match i.markers.get(time) {
                Some(marker) => {
                    if forward {
                        (marker.start_entities.clone(), marker.end_entities.clone())
                    } else {
                        (marker.end_entities.clone(), marker.start_entities.clone())
                    }
                }
                None => return Ok(()),
            }
        };
        for child in starts.iter().rev() {
            if !child.with_core(|c| c.is_running) {
                self.add_entity(child.clone())?;
            }
        }
        for child in ends.iter().rev() {
            if child.with_core(|c| c.is_running) {
                self.remove_entity(child);
            }
        }
        Ok(())
    }

    /// Attach an entity at the current time. First registration initializes
    /// the entity and records its start marker; the entity then renders a
    /// frame immediately so it can build its own structure within this tick.
    pub fn add_entity(&self, child: Child) -> Result<()> {
        let (current, last_target, last_forward, ctx) = {
            let mut i = self.inner.borrow_mut();
            let current = i.current_time;
            if !child.with_core(|c| c.start_registered) {
                child.with_core_mut(|c| {
                    c.parent = Some(Rc::downgrade(&self.inner));
                    c.init(current);
                    c.start_registered = true;
                });
                i.markers.register_start(current, child.clone());
            }
            i.running.push(child.clone());
            child.with_core_mut(|c| {
                c.is_running = true;
                c.removal_requested = false;
            });
            (current, i.last_target_time, i.last_target_forward, i.ctx.clone())
        };
        ctx.pipe.bump();
        log::trace!(
            "{}: attached {} at {}",
            self.with_core(|c| c.name.clone()),
            child.name(),
            current
        );
        child.display_frame(current, last_target, last_forward, &ctx)?;
        if child.with_core(|c| c.removal_requested && c.is_running) {
            self.remove_entity(&child);
        }
        Ok(())
    }

    /// Unlink an entity from the running list. End markers are only
    /// registered on forward traversal.
    pub fn remove_entity(&self, child: &Child) {
        let ctx = {
            let mut i = self.inner.borrow_mut();
            if i.last_target_forward && !child.with_core(|c| c.end_registered) {
                let current = i.current_time;
                i.markers.register_end(current, child.clone());
                child.with_core_mut(|c| c.end_registered = true);
            }
            i.running.retain(|c| !c.ptr_eq(child));
            child.with_core_mut(|c| {
                c.is_running = false;
                c.removal_requested = false;
            });
            i.ctx.clone()
        };
        ctx.pipe.bump();
        log::trace!(
            "{}: unlinked {}",
            self.with_core(|c| c.name.clone()),
            child.name()
        );
    }

    /// Completion tracking. Once the instruction closure has finished and we
    /// are on a forward target: the timeline releases when every running
    /// child has released, and is done when the running list is empty.
    pub fn check_state(&self) {
        let (bump, ctx) = {
            let mut i = self.inner.borrow_mut();
            let mut bump = false;
            if i.tl_function_complete && i.last_target_forward {
                let all_released = i
                    .running
                    .iter()
                    .all(|child| child.with_core(|c| c.released));
                let count = i.running.len();
                if all_released && i.core.mark_released() {
                    bump = true;
                }
                if count == 0 && !i.core.done {
                    i.core.done = true;
                    i.done_at = Some(i.current_time);
                    bump = true;
                }
                if i.core.done
                    && i.core.released
                    && i.core.parent.is_some()
                    && i.core.is_running
                    && !i.core.removal_requested
                {
                    i.core.removal_requested = true;
                    bump = true;
                }
            }
            (bump, i.ctx.clone())
        };
        if bump {
            ctx.pipe.bump();
        }
    }

    /// Next interesting time strictly past `time`: the minimum (forward) or
    /// maximum (backward) over the running children's recursive positions and
    /// the nearest own marker.
    pub fn next_marker_position(&self, time: Ms, forward: bool) -> Option<Ms> {
        let (children, own) = {
            let i = self.inner.borrow();
            // One-frame steps always render: skip the recursive scan. This
            // leans on frame-quantized times at the move boundary.
            if (time - i.current_time).abs() == FRAME_MS {
                return Some(time);
            }
            (i.running.clone(), i.markers.next_after(time, forward))
        };
        let mut best = own;
        for child in children {
            if let Some(candidate) = child.next_marker_position(time, forward) {
                best = Some(match best {
                    None => candidate,
                    Some(b) => {
                        if forward {
                            b.min(candidate)
                        } else {
                            b.max(candidate)
                        }
                    }
                });
            }
        }
        best
    }

    /// Re-run the current frame to repopulate the running list (used by
    /// sub-players when the traversal direction flips before their first
    /// cycle completes).
    pub fn reload_entities(&self) -> Result<()> {
        let (current, last_target, last_forward, started) = {
            let i = self.inner.borrow();
            (
                i.current_time,
                i.last_target_time,
                i.last_target_forward,
                i.current_time >= 0 && i.tl_function_called,
            )
        };
        if started {
            self.display_frame(current, last_target, last_forward)?;
        }
        Ok(())
    }

    /// One drain pass over this timeline: poll the pending instruction
    /// future, sweep removal requests, re-evaluate completion.
    pub fn drive(&self) {
        if self.inner.borrow().tl_function_called {
            self.poll_future();
        }
        let children: Vec<Child> = self.inner.borrow().running.clone();
        for child in children {
            if child.with_core(|c| c.removal_requested && c.is_running) {
                self.remove_entity(&child);
            }
        }
        self.check_state();
    }

    fn spawn_instruction(&self) {
        let instruction = self.inner.borrow_mut().instruction.take();
        match instruction {
            Some(f) => {
                let future = f(Anim {
                    timeline: self.clone(),
                });
                self.inner.borrow_mut().tl_future = Some(future);
                self.poll_future();
            }
            None => {
                self.inner.borrow_mut().tl_function_complete = true;
            }
        }
    }

    /// Poll the instruction future once. The future is taken out first so
    /// its body can re-borrow this timeline through the DSL handle.
    fn poll_future(&self) {
        let future = self.inner.borrow_mut().tl_future.take();
        let Some(mut future) = future else {
            return;
        };
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                let mut i = self.inner.borrow_mut();
                i.tl_function_complete = true;
                i.ctx.pipe.bump();
            }
            Poll::Pending => {
                self.inner.borrow_mut().tl_future = Some(future);
            }
        }
    }
}

/// The DSL handle instruction closures receive. Cloneable; every method
/// attaches entities to (or reads from) the timeline that ran the closure.
#[derive(Clone)]
pub struct Anim {
    pub(crate) timeline: Timeline,
}

impl Anim {
    fn parts(&self) -> (Settings, Rc<dyn Scope>, Rc<EngineShared>) {
        let i = self.timeline.inner.borrow();
        (i.settings.clone(), i.scope.clone(), i.ctx.clone())
    }

    /// Animate properties on one target. Resolves when the tween group
    /// releases. An unresolvable target logs and resolves immediately.
    pub fn animate(&self, params: AnimateParams) -> ReleaseFuture {
        let (settings, scope, ctx) = self.parts();
        match TweenGroup::build(params, &settings, &scope, &ctx) {
            Some(group) => {
                let child = Child::leaf(group);
                let flag = child.with_core(|c| c.release_flag());
                if let Err(err) = self.timeline.add_entity(child) {
                    ctx.record_failure(err);
                }
                ReleaseFuture::new(flag)
            }
            None => ReleaseFuture::ready(),
        }
    }

    /// `animate` with a zero duration: commit the destination values at once.
    pub fn set(&self, mut params: AnimateParams) -> ReleaseFuture {
        params.duration = Some(0);
        self.animate(params)
    }

    /// Pure time filler.
    pub fn delay(&self, ms: Ms) -> ReleaseFuture {
        let (settings, _, ctx) = self.parts();
        let duration = adjust_duration(ms, settings.speed());
        let child = Child::leaf(Delay::new(ctx.next_name("delay"), duration));
        let flag = child.with_core(|c| c.release_flag());
        if let Err(err) = self.timeline.add_entity(child) {
            ctx.record_failure(err);
        }
        ReleaseFuture::new(flag)
    }

    /// Attach a sub-timeline running `f`. Resolves when it releases.
    pub fn group<F, Fut>(&self, f: F) -> ReleaseFuture
    where
        F: FnOnce(Anim) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.attach_group(None, instruction(f))
    }

    /// Like [`group`](Anim::group), with a name that shows up in diagnostics.
    pub fn named_group<F, Fut>(&self, name: &str, f: F) -> ReleaseFuture
    where
        F: FnOnce(Anim) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.attach_group(Some(name.to_string()), instruction(f))
    }

    /// Attach a boxed instruction as a sub-timeline.
    pub fn run(&self, block: Instruction) -> ReleaseFuture {
        self.attach_group(None, block)
    }

    fn attach_group(&self, name: Option<String>, block: Instruction) -> ReleaseFuture {
        let (settings, scope, ctx) = self.parts();
        let name = name.unwrap_or_else(|| ctx.next_name("group"));
        let timeline = Timeline::new(&ctx, settings, scope, name, Some(block));
        let child = Child::Timeline(timeline);
        let flag = child.with_core(|c| c.release_flag());
        if let Err(err) = self.timeline.add_entity(child) {
            ctx.record_failure(err);
        }
        ReleaseFuture::new(flag)
    }

    /// Run blocks one after another, each as its own group.
    pub fn sequence(&self, blocks: Vec<Instruction>) -> ReleaseFuture {
        self.group(move |a| async move {
            for block in blocks {
                a.run(block).await;
            }
        })
    }

    /// Run tracks simultaneously; resolves when the slowest releases.
    pub fn parallelize(&self, tracks: Vec<Instruction>) -> ReleaseFuture {
        self.group(move |a| async move {
            let running: Vec<ReleaseFuture> = tracks.into_iter().map(|t| a.run(t)).collect();
            futures::future::join_all(running).await;
        })
    }

    /// Run `f` once per selected element.
    pub fn iterate<F, Fut>(&self, params: impl Into<IterParams>, f: F) -> ReleaseFuture
    where
        F: Fn(Anim, Element, usize) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let params = params.into();
        let targets = self.select_all(&params.targets);
        if targets.is_empty() {
            log::warn!("iterate(): selector '{}' matched no elements", params.targets);
        }
        let f = Rc::new(f);
        let parallel = params.parallel;
        self.group(move |a| async move {
            if parallel {
                let groups: Vec<ReleaseFuture> = targets
                    .into_iter()
                    .enumerate()
                    .map(|(index, el)| {
                        let body = f.clone();
                        a.group(move |ga| body(ga, el, index))
                    })
                    .collect();
                futures::future::join_all(groups).await;
            } else {
                for (index, el) in targets.into_iter().enumerate() {
                    let body = f.clone();
                    a.group(move |ga| body(ga, el, index)).await;
                }
            }
        })
    }

    /// Run `f` `times` times, sequentially.
    pub fn repeat<F, Fut>(&self, times: u32, f: F) -> ReleaseFuture
    where
        F: Fn(Anim, u32) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let f = Rc::new(f);
        self.group(move |a| async move {
            for index in 0..times {
                let body = f.clone();
                a.group(move |ga| body(ga, index)).await;
            }
        })
    }

    /// Attach a nested sub-player around a fresh sub-timeline running `f`.
    pub fn play<F, Fut>(&self, params: PlayParams, f: F) -> ReleaseFuture
    where
        F: FnOnce(Anim) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let (settings, scope, ctx) = self.parts();
        let name = ctx.next_name("player");
        let wrapped = Timeline::new(
            &ctx,
            settings,
            scope,
            format!("{}.timeline", name),
            Some(instruction(f)),
        );
        let child = Child::Player(PlayerEntityHandle::new(PlayerEntity::new(
            name, params, wrapped,
        )));
        let flag = child.with_core(|c| c.release_flag());
        if let Err(err) = self.timeline.add_entity(child) {
            ctx.record_failure(err);
        }
        ReleaseFuture::new(flag)
    }

    /// Scoped settings override for this timeline and children attached
    /// afterwards.
    pub fn defaults(&self, patch: SettingsPatch) {
        let mut i = self.timeline.inner.borrow_mut();
        i.settings = i.settings.derive(patch);
    }

    /// First element matching the selector.
    pub fn select(&self, selector: &str) -> Option<Element> {
        self.select_all(selector).into_iter().next()
    }

    /// Every element matching the selector.
    pub fn select_all(&self, selector: &str) -> Vec<Element> {
        self.timeline.inner.borrow().scope.query(selector)
    }

    /// Uniform random number in `[min, max)`.
    pub fn random(&self, min: f64, max: f64) -> f64 {
        self.timeline.inner.borrow().ctx.random(min, max)
    }
}
