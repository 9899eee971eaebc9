//! Debounce and throttle for high-frequency editor events.
//!
//! Scrolling and fold toggles arrive in bursts. A [`RateLimiter`] collapses a
//! burst into at most one leading and one trailing invocation per window,
//! always with the most recent arguments.
//!
//! Timers run on the tokio runtime, so [`RateLimiter::call`] must be invoked
//! from within one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Window configuration for a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOptions {
    /// Quiet period after the last call.
    pub wait: Duration,
    /// Invoke on the first call of a burst.
    pub leading: bool,
    /// Invoke once the burst is over, if calls arrived after the leading edge.
    pub trailing: bool,
    /// Upper bound on the delay between invocations during a steady stream.
    pub max_wait: Option<Duration>,
}

impl RateLimitOptions {
    /// Debounce on both edges, no forced invocation.
    pub const fn debounce(wait: Duration) -> Self {
        Self {
            wait,
            leading: true,
            trailing: true,
            max_wait: None,
        }
    }

    /// At most one invocation per `wait`, on both edges.
    pub const fn throttle(wait: Duration) -> Self {
        Self {
            wait,
            leading: true,
            trailing: true,
            max_wait: Some(wait),
        }
    }

    #[must_use]
    pub const fn leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    #[must_use]
    pub const fn trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    #[must_use]
    pub const fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

struct State<A> {
    last_args: Option<A>,
    last_call: Option<Instant>,
    last_invoke: Option<Instant>,
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the timer is replaced; stale timer tasks bail out.
    epoch: u64,
}

type Callback<A> = Box<dyn Fn(A) + Send + Sync>;

struct Shared<A> {
    options: RateLimitOptions,
    callback: Callback<A>,
    state: Mutex<State<A>>,
}

/// Debounced/throttled wrapper around a callback.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
/// use svg_fold_core::rate_limit::{RateLimitOptions, RateLimiter};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let limiter = RateLimiter::new(RateLimitOptions::throttle(Duration::from_millis(100)), move |n| {
///     sink.lock().unwrap().push(n);
/// });
///
/// limiter.call(1);
/// limiter.call(2);
/// limiter.call(3);
/// assert_eq!(*seen.lock().unwrap(), vec![1]);
///
/// assert!(limiter.flush());
/// assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
/// # }
/// ```
pub struct RateLimiter<A: Send + 'static> {
    shared: Arc<Shared<A>>,
}

impl<A: Send + 'static> RateLimiter<A> {
    /// `max_wait`, when set, is raised to at least `wait`.
    pub fn new(
        mut options: RateLimitOptions,
        callback: impl Fn(A) + Send + Sync + 'static,
    ) -> Self {
        if let Some(max_wait) = options.max_wait {
            options.max_wait = Some(max_wait.max(options.wait));
        }
        Self {
            shared: Arc::new(Shared {
                options,
                callback: Box::new(callback),
                state: Mutex::new(State {
                    last_args: None,
                    last_call: None,
                    last_invoke: None,
                    timer: None,
                    epoch: 0,
                }),
            }),
        }
    }

    pub fn options(&self) -> RateLimitOptions {
        self.shared.options
    }

    /// Records a call. The callback runs now (leading edge, or `max_wait`
    /// elapsed) or later from the timer.
    pub fn call(&self, args: A) {
        let shared = &self.shared;
        let options = shared.options;
        let now = Instant::now();

        let fire = {
            let mut state = shared.lock();
            let invoking = shared.should_invoke(&state, now);
            state.last_args = Some(args);
            state.last_call = Some(now);

            if !invoking {
                if state.timer.is_none() {
                    Shared::start_timer(shared, &mut state, options.wait);
                }
                None
            } else if state.timer.is_none() {
                state.last_invoke = Some(now);
                Shared::start_timer(shared, &mut state, options.wait);
                if options.leading {
                    state.last_args.take()
                } else {
                    None
                }
            } else if options.max_wait.is_some() {
                Shared::start_timer(shared, &mut state, options.wait);
                state.last_invoke = Some(now);
                state.last_args.take()
            } else {
                None
            }
        };

        if let Some(args) = fire {
            (shared.callback)(args);
        }
    }

    /// Drops any pending trailing invocation.
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.epoch += 1;
        state.last_args = None;
        state.last_call = None;
        state.last_invoke = None;
    }

    /// Runs a pending trailing invocation immediately. Returns whether the
    /// callback ran.
    pub fn flush(&self) -> bool {
        let fire = {
            let mut state = self.shared.lock();
            let Some(timer) = state.timer.take() else {
                return false;
            };
            timer.abort();
            state.epoch += 1;
            self.shared.trailing_edge(&mut state, Instant::now())
        };
        match fire {
            Some(args) => {
                (self.shared.callback)(args);
                true
            }
            None => false,
        }
    }

    /// True while a timer is armed.
    pub fn is_pending(&self) -> bool {
        self.shared.lock().timer.is_some()
    }
}

impl<A: Send + 'static> Drop for RateLimiter<A> {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.lock().timer.take() {
            timer.abort();
        }
    }
}

impl<A: Send + 'static> Shared<A> {
    fn lock(&self) -> MutexGuard<'_, State<A>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn should_invoke(&self, state: &State<A>, now: Instant) -> bool {
        let Some(last_call) = state.last_call else {
            return true;
        };
        if now.saturating_duration_since(last_call) >= self.options.wait {
            return true;
        }
        self.options.max_wait.is_some_and(|max_wait| {
            state
                .last_invoke
                .is_none_or(|at| now.saturating_duration_since(at) >= max_wait)
        })
    }

    fn remaining_wait(&self, state: &State<A>, now: Instant) -> Duration {
        let since_call = state
            .last_call
            .map_or(Duration::ZERO, |at| now.saturating_duration_since(at));
        let wait_left = self.options.wait.saturating_sub(since_call);

        match (self.options.max_wait, state.last_invoke) {
            (Some(max_wait), Some(at)) => {
                wait_left.min(max_wait.saturating_sub(now.saturating_duration_since(at)))
            }
            _ => wait_left,
        }
    }

    fn trailing_edge(&self, state: &mut State<A>, now: Instant) -> Option<A> {
        let args = state.last_args.take();
        if self.options.trailing && args.is_some() {
            state.last_invoke = Some(now);
            args
        } else {
            None
        }
    }

    fn start_timer(this: &Arc<Self>, state: &mut State<A>, delay: Duration) {
        if let Some(old) = state.timer.take() {
            old.abort();
        }
        state.epoch += 1;
        let epoch = state.epoch;
        let weak: Weak<Self> = Arc::downgrade(this);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                Self::timer_expired(&shared, epoch);
            }
        }));
    }

    fn timer_expired(this: &Arc<Self>, epoch: u64) {
        let now = Instant::now();
        let fire = {
            let mut state = this.lock();
            if state.epoch != epoch {
                return;
            }
            // Detach rather than abort: this is the handle of the running task.
            drop(state.timer.take());

            if this.should_invoke(&state, now) {
                this.trailing_edge(&mut state, now)
            } else {
                let remaining = this.remaining_wait(&state, now);
                Self::start_timer(this, &mut state, remaining);
                None
            }
        };

        if let Some(args) = fire {
            (this.callback)(args);
        }
    }
}
