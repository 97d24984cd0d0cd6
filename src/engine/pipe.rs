//! The async pipe: a structural-mutation counter plus the drain that polls
//! pending instruction futures until the structure settles.
//!
//! Scheduling is single-threaded and cooperative. Instructions are async
//! closures; whenever one suspends (awaiting a release, or any hand-written
//! future), progress resumes on the next drain pass. A drain keeps polling
//! until the counter is unchanged for two consecutive passes, so every
//! structural mutation queued by the latest frame has run before the move
//! loop takes its next step.

use crate::config::{EngineConfig, MAX_ASYNC};
use crate::engine::timeline::{Timeline, TimelineInner};
use crate::error::AnimError;
use crate::interpolation::ParseCache;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Counter of structural mutations (entity added/removed, completion,
/// instruction finished).
pub(crate) struct AsyncPipe {
    counter: Cell<u64>,
}

impl AsyncPipe {
    fn new() -> Self {
        Self {
            counter: Cell::new(0),
        }
    }

    #[inline]
    pub fn bump(&self) {
        self.counter.set(self.counter.get().wrapping_add(1));
    }

    #[inline]
    pub fn reading(&self) -> u64 {
        self.counter.get()
    }
}

/// State shared by every timeline of one engine instance. Scoping the pipe
/// here (instead of a process-wide singleton) lets independent players
/// coexist.
pub(crate) struct EngineShared {
    pub pipe: AsyncPipe,
    pub config: EngineConfig,
    pub parse_cache: RefCell<ParseCache>,
    timelines: RefCell<Vec<Weak<RefCell<TimelineInner>>>>,
    names: Cell<u64>,
    rng: Cell<u64>,
    failure: RefCell<Option<AnimError>>,
}

impl EngineShared {
    pub fn new(config: EngineConfig) -> Rc<Self> {
        let parse_cache = ParseCache::new(config.parse_cache_size);
        Rc::new(Self {
            pipe: AsyncPipe::new(),
            config,
            parse_cache: RefCell::new(parse_cache),
            timelines: RefCell::new(Vec::new()),
            names: Cell::new(0),
            rng: Cell::new(0x9E37_79B9_7F4A_7C15),
            failure: RefCell::new(None),
        })
    }

    pub fn register_timeline(&self, inner: &Rc<RefCell<TimelineInner>>) {
        self.timelines.borrow_mut().push(Rc::downgrade(inner));
    }

    /// Deterministic name for an anonymous entity.
    pub fn next_name(&self, prefix: &str) -> String {
        let n = self.names.get() + 1;
        self.names.set(n);
        format!("{}#{}", prefix, n)
    }

    /// Seeded xorshift; good enough for jittered animation parameters.
    pub fn random(&self, min: f64, max: f64) -> f64 {
        let mut x = self.rng.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng.set(x);
        let unit = (x >> 11) as f64 / (1u64 << 53) as f64;
        min + unit * (max - min)
    }

    /// Record an error raised inside an instruction future; the surrounding
    /// drain surfaces the first one.
    pub fn record_failure(&self, err: AnimError) {
        let mut slot = self.failure.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    /// Drain the async pipe: poll pending instruction futures, sweep removal
    /// requests and re-evaluate completion until the counter is stable for
    /// two consecutive passes.
    pub fn exhaust(&self) -> Result<(), AnimError> {
        let mut last = self.pipe.reading();
        let mut stable = 0u32;
        for _ in 0..MAX_ASYNC {
            self.drive_all();
            if let Some(err) = self.failure.borrow_mut().take() {
                return Err(err);
            }
            let now = self.pipe.reading();
            if now == last {
                stable += 1;
                if stable >= 2 {
                    return Ok(());
                }
            } else {
                stable = 0;
                last = now;
            }
        }
        Err(AnimError::MaxAsyncLoop {
            iterations: MAX_ASYNC,
        })
    }

    fn drive_all(&self) {
        // Index loop: a pass may register new timelines while it runs.
        let mut i = 0;
        loop {
            let weak = {
                let timelines = self.timelines.borrow();
                match timelines.get(i) {
                    Some(w) => w.clone(),
                    None => break,
                }
            };
            if let Some(inner) = weak.upgrade() {
                Timeline::from_inner(inner).drive();
            }
            i += 1;
        }
    }

    /// Drop every pending instruction future. Instruction futures hold a
    /// handle to their own timeline, so they must be cleared explicitly to
    /// break the reference cycle when the engine shuts down.
    pub fn clear_futures(&self) {
        let timelines = self.timelines.borrow();
        for weak in timelines.iter() {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().drop_future();
            }
        }
    }
}
