//! The top-level driver.
//!
//! A player owns the root timeline and converts the host's frame callback
//! into seeks. The host arms playback with [`play`](Player::play) and calls
//! [`step`](Player::step) once per frame tick; `pause`/`stop` invalidate the
//! current play token so an armed playback cannot outlive them.

use crate::config::{EngineConfig, FRAME_MS};
use crate::engine::pipe::EngineShared;
use crate::engine::timeline::{instruction, Anim, Timeline};
use crate::settings::Settings;
use crate::time::Ms;
use crate::dom::Scope;
use crate::Result;
use std::future::Future;
use std::rc::Rc;

/// Arguments accepted by [`Player::play`].
pub struct PlayArguments {
    pub forward: bool,
    pub speed: f64,
    /// Invoked after every paint whose time differs from the previous one.
    pub on_update: Option<Box<dyn FnMut(Ms)>>,
}

impl Default for PlayArguments {
    fn default() -> Self {
        Self {
            forward: true,
            speed: 1.0,
            on_update: None,
        }
    }
}

impl PlayArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(mut self, forward: bool) -> Self {
        self.forward = forward;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn on_update(mut self, f: impl FnMut(Ms) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }
}

/// Result of one paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Schedule another frame.
    Continue,
    /// Playback ran to its boundary; the value is the final time.
    Finished(Ms),
    /// The play token was invalidated (pause/stop/new play).
    Interrupted(Ms),
}

struct PlayState {
    id: u64,
    forward: bool,
    speed: f64,
    on_update: Option<Box<dyn FnMut(Ms)>>,
}

/// Top-level animation player.
pub struct Player {
    ctx: Rc<EngineShared>,
    root: Timeline,
    play_id: u64,
    next_play_id: u64,
    state: Option<PlayState>,
    length: Option<Ms>,
    current_tick: Ms,
}

impl Player {
    /// Create a player over a document scope with a root instruction body.
    pub fn new<F, Fut>(scope: Rc<dyn Scope>, instructions: F) -> Self
    where
        F: FnOnce(Anim) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        Self::build(scope, EngineConfig::default(), instructions)
    }

    /// Create a player with an explicit configuration.
    pub fn with_config<F, Fut>(
        scope: Rc<dyn Scope>,
        config: EngineConfig,
        instructions: F,
    ) -> Result<Self>
    where
        F: FnOnce(Anim) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        config.validate()?;
        Ok(Self::build(scope, config, instructions))
    }

    fn build<F, Fut>(scope: Rc<dyn Scope>, config: EngineConfig, instructions: F) -> Self
    where
        F: FnOnce(Anim) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let ctx = EngineShared::new(config);
        let root = Timeline::new(
            &ctx,
            Settings::root(),
            scope,
            "root".to_string(),
            Some(instruction(instructions)),
        );
        Self {
            ctx,
            root,
            play_id: 0,
            next_play_id: 0,
            state: None,
            length: None,
            current_tick: 0,
        }
    }

    /// Arm playback and return the play token. The host then calls
    /// [`step`](Player::step) from its frame callback until it stops
    /// returning [`StepOutcome::Continue`].
    pub fn play(&mut self, args: PlayArguments) -> u64 {
        self.next_play_id += 1;
        self.play_id = self.next_play_id;
        self.state = Some(PlayState {
            id: self.play_id,
            forward: args.forward,
            speed: if args.speed > 0.0 { args.speed } else { 1.0 },
            on_update: args.on_update,
        });
        self.play_id
    }

    /// One paint: advance by one frame at the armed speed and render.
    pub fn step(&mut self) -> Result<StepOutcome> {
        let Some(state) = self.state.as_ref() else {
            return Ok(StepOutcome::Interrupted(self.position()));
        };
        let id = state.id;
        let forward = state.forward;
        let speed = state.speed;

        let t1 = self.root.current_time();
        let delta = ((FRAME_MS as f64) * speed).round() as Ms;
        let t2 = if !forward {
            (t1 - delta).max(0)
        } else if t1 < 0 {
            // first paint renders frame zero
            0
        } else {
            t1 + delta
        };
        let before = t1;
        let current = self.root.move_to(t2)?;

        if self.play_id != id {
            return Ok(StepOutcome::Interrupted(current));
        }
        if current != before {
            if let Some(state) = self.state.as_mut() {
                if let Some(on_update) = state.on_update.as_mut() {
                    on_update(current);
                }
            }
        }
        let finished = if forward {
            self.root.end_time() == Some(current)
        } else {
            current == 0
        };
        if finished {
            self.state = None;
            Ok(StepOutcome::Finished(current))
        } else {
            Ok(StepOutcome::Continue)
        }
    }

    /// Drive [`step`](Player::step) to completion; the headless equivalent of
    /// a frame-callback loop. Returns the final time.
    pub fn run_until_done(&mut self) -> Result<Ms> {
        let max_steps = self.ctx.config.max_duration / FRAME_MS + 2;
        for _ in 0..max_steps {
            match self.step()? {
                StepOutcome::Continue => {}
                StepOutcome::Finished(t) | StepOutcome::Interrupted(t) => return Ok(t),
            }
        }
        Ok(self.position())
    }

    /// Invalidate the current play token.
    pub fn pause(&mut self) {
        self.play_id = 0;
        self.state = None;
    }

    /// Invalidate the current play token and seek back to zero.
    pub fn stop(&mut self) -> Result<Ms> {
        self.play_id = 0;
        self.state = None;
        self.root.move_to(0)?;
        Ok(0)
    }

    /// Seek to an absolute time.
    pub fn seek(&mut self, time: Ms) -> Result<Ms> {
        self.root.move_to(time)
    }

    /// Total duration, probed by ticking forward frame by frame until the
    /// marker walk runs dry (bounded by the configured `max_duration`).
    /// Memoized; the playhead is restored afterwards.
    pub fn duration(&mut self) -> Result<Ms> {
        if let Some(length) = self.length {
            return Ok(length);
        }
        let restore = self.position();
        let max_ticks = self.ctx.config.max_duration / FRAME_MS;
        self.current_tick = 0;
        let mut length = restore;
        while self.current_tick <= max_ticks {
            let t = self.current_tick * FRAME_MS;
            let current = self.root.move_to(t)?;
            length = current;
            if self.root.end_time() == Some(current) {
                break;
            }
            self.current_tick += 1;
        }
        self.root.move_to(restore)?;
        self.length = Some(length);
        Ok(length)
    }

    /// Current playhead position.
    pub fn position(&self) -> Ms {
        self.root.current_time().max(0)
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_some()
    }

    /// Marker times recorded so far on the root timeline (diagnostic).
    pub fn markers(&self) -> Vec<Ms> {
        self.root.marker_times()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        // Pending instruction futures hold handles to their own timelines;
        // clearing them breaks the reference cycles.
        self.ctx.clear_futures();
    }
}
