//! Cancellation Tokens
//!
//! Cooperative cancellation: a shared flag plus an optional deadline.
//! Long-running operations poll [`CancellationToken::is_cancelled`] at their
//! own suspension points, block on [`CancellationToken::wait`], or select on
//! [`CancellationToken::done`] and [`CancellationToken::expired`]. Nothing is
//! ever force-terminated.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

/// Why a token stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// `cancel()` was called on the token or one of its ancestors
    Cancelled,
    /// The token's deadline passed
    DeadlineExceeded,
}

impl CancelReason {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline exceeded",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct State {
    reason: Option<CancelReason>,
    /// Dropped on cancellation so every `done()` receiver disconnects
    done_tx: Option<Sender<()>>,
    children: Vec<Weak<Inner>>,
}

struct Inner {
    /// Set once `reason` has been recorded
    fired: AtomicBool,
    deadline: Option<Instant>,
    state: Mutex<State>,
    condvar: Condvar,
    done_rx: Receiver<()>,
}

impl Inner {
    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn fire(&self, reason: CancelReason) {
        let (reason, children) = {
            let mut state = self.state.lock();
            if state.reason.is_some() {
                return;
            }
            // First cause wins, including a deadline nobody has observed yet
            let reason = if self.deadline_passed() {
                CancelReason::DeadlineExceeded
            } else {
                reason
            };
            state.reason = Some(reason);
            state.done_tx.take();
            self.fired.store(true, Ordering::Release);
            self.condvar.notify_all();
            (reason, std::mem::take(&mut state.children))
        };

        for child in children.iter().filter_map(Weak::upgrade) {
            child.fire(reason);
        }
    }
}

/// Caller-owned cancellation signal.
///
/// Clones share the same state. Derived tokens created with
/// [`child`](Self::child) are cancelled together with their parent, never
/// the other way round.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Token with no deadline; stops only on `cancel()`
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Token that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Instant::now().checked_add(timeout))
    }

    /// Token that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    fn build(deadline: Option<Instant>) -> Self {
        let (done_tx, done_rx) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(Inner {
                fired: AtomicBool::new(false),
                deadline,
                state: Mutex::new(State {
                    reason: None,
                    done_tx: Some(done_tx),
                    children: Vec::new(),
                }),
                condvar: Condvar::new(),
                done_rx,
            }),
        }
    }

    /// Derived token sharing this token's deadline
    pub fn child(&self) -> Self {
        self.derive(None)
    }

    /// Derived token expiring after `timeout` or at this token's deadline,
    /// whichever comes first
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        self.derive(Instant::now().checked_add(timeout))
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        let child = Self::build(deadline);

        let mut state = self.inner.state.lock();
        let parent_reason = state.reason;
        match parent_reason {
            Some(reason) => {
                drop(state);
                child.inner.fire(reason);
            }
            None => {
                state.children.retain(|c| c.strong_count() > 0);
                state.children.push(Arc::downgrade(&child.inner));
            }
        }
        child
    }

    /// Cancel this token and every token derived from it. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.fired.load(Ordering::Acquire) {
            tracing::debug!("cancellation requested");
        }
        self.inner.fire(CancelReason::Cancelled);
    }

    /// Whether the token has been cancelled or its deadline has passed
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire) || self.inner.deadline_passed()
    }

    /// Why the token stopped, or `None` while it is still live
    pub fn reason(&self) -> Option<CancelReason> {
        if self.inner.fired.load(Ordering::Acquire) {
            return self.inner.state.lock().reason;
        }
        self.inner
            .deadline_passed()
            .then_some(CancelReason::DeadlineExceeded)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline (zero once it has passed)
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Block until the token is cancelled or its deadline passes
    pub fn wait(&self) -> CancelReason {
        let mut state = self.inner.state.lock();
        loop {
            if let Some(reason) = state.reason {
                return reason;
            }
            match self.inner.deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return CancelReason::DeadlineExceeded;
                    }
                    self.inner.condvar.wait_until(&mut state, deadline);
                }
                None => self.inner.condvar.wait(&mut state),
            }
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`, returning
    /// `None` if the token is still live
    pub fn wait_timeout(&self, timeout: Duration) -> Option<CancelReason> {
        let limit = Instant::now().checked_add(timeout);
        let mut state = self.inner.state.lock();
        loop {
            if let Some(reason) = state.reason {
                return Some(reason);
            }
            let now = Instant::now();
            if self.inner.deadline.is_some_and(|d| now >= d) {
                return Some(CancelReason::DeadlineExceeded);
            }
            if limit.is_some_and(|l| now >= l) {
                return None;
            }
            let until = match (self.inner.deadline, limit) {
                (Some(d), Some(l)) => Some(d.min(l)),
                (d, l) => d.or(l),
            };
            match until {
                Some(until) => {
                    self.inner.condvar.wait_until(&mut state, until);
                }
                None => self.inner.condvar.wait(&mut state),
            }
        }
    }

    /// Receiver that disconnects when the token is cancelled.
    ///
    /// Nothing is ever sent on it; a `recv` completing with an error is the
    /// signal. Deadlines are reported separately through
    /// [`expired`](Self::expired).
    pub fn done(&self) -> Receiver<()> {
        self.inner.done_rx.clone()
    }

    /// Receiver that delivers one message at the deadline, or never
    pub fn expired(&self) -> Receiver<Instant> {
        match self.inner.deadline {
            Some(deadline) => crossbeam_channel::at(deadline),
            None => crossbeam_channel::never(),
        }
    }

    /// Wrap the token so that it is cancelled when the guard is dropped
    pub fn drop_guard(self) -> CancelGuard {
        CancelGuard {
            token: self,
            armed: true,
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("reason", &self.reason())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

/// Cancels its token on drop
#[must_use = "dropping the guard cancels the token immediately"]
#[derive(Debug)]
pub struct CancelGuard {
    token: CancellationToken,
    armed: bool,
}

impl CancelGuard {
    /// Give the token back without cancelling it
    pub fn disarm(mut self) -> CancellationToken {
        self.armed = false;
        self.token.clone()
    }
}

impl Deref for CancelGuard {
    type Target = CancellationToken;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.token.cancel();
        }
    }
}
