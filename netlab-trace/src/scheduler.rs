//! Autoplay scheduler.
//!
//! ```text
//!   host ──start()──▶ Autoplay ──spawn──▶ ticker task
//!                        │                   │ every `cadence`
//!                        │                   ▼
//!                        │        lock session, advance(), snapshot
//!                        │                   │
//!                        │                   ▼
//!                        │            Surface::redraw(&snapshot)
//!                        │
//!   host ──cancel()────▶ abort pending task, clear `running`
//! ```
//!
//! The scheduler owns at most one pending task.  `start` cancels the prior
//! one before spawning, so repeated starts never double the step rate.
//! Each run also carries an id issued by the session; a ticker whose id is
//! no longer current exits without stepping, even if its abort was missed.
//! Simulations themselves know nothing about time; the manual
//! [`Autoplay::step_manual`] path goes through the same
//! [`TraceSession::advance`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::engine::{Simulation, Snapshot, TraceSession};

/// Session shared between the host and the ticker task.
pub type SharedSession<S> = Arc<Mutex<TraceSession<S>>>;

/// Rendering surface fed by autoplay.
pub trait Surface<S>: Send {
    fn redraw(&mut self, snapshot: &Snapshot<S>);
}

impl<S, F> Surface<S> for F
where
    F: FnMut(&Snapshot<S>) + Send,
{
    fn redraw(&mut self, snapshot: &Snapshot<S>) {
        self(snapshot)
    }
}

/// A step that panicked mid-way leaves the session consistent (state and
/// log are swapped in together), so a poisoned lock is still usable.
fn lock<S: Simulation>(session: &Mutex<TraceSession<S>>) -> MutexGuard<'_, TraceSession<S>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Autoplay
// ---------------------------------------------------------------------------

pub struct Autoplay<S: Simulation> {
    session: SharedSession<S>,
    cadence: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<S> Autoplay<S>
where
    S: Simulation + Send + 'static,
{
    pub fn new(session: SharedSession<S>, cadence: Duration) -> Self {
        Self {
            session,
            cadence,
            pending: None,
        }
    }

    /// Wrap a freshly started session.
    pub fn with_session(session: TraceSession<S>, cadence: Duration) -> Self {
        Self::new(Arc::new(Mutex::new(session)), cadence)
    }

    pub fn session(&self) -> &SharedSession<S> {
        &self.session
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Takes effect on the next `start`.
    pub fn set_cadence(&mut self, cadence: Duration) {
        self.cadence = cadence;
    }

    /// Begin ticking.  Any previously spawned run is cancelled first.
    ///
    /// Must be called from within a Tokio runtime.  Starting a terminal
    /// session does nothing.
    pub fn start(&mut self, mut surface: impl Surface<S> + 'static) {
        self.abort_pending();

        let run = {
            let mut session = lock(&self.session);
            if session.is_terminal() {
                log::debug!("[autoplay] session already terminal; not starting");
                return;
            }
            session.begin_run()
        };

        let session = Arc::clone(&self.session);
        let cadence = self.cadence;
        log::debug!("[autoplay] start run {run}, cadence {cadence:?}");

        self.pending = Some(tokio::spawn(async move {
            let mut ticker = interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the first step waits a
            // full cadence like every later one.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let snapshot = {
                    let mut guard = lock(&session);
                    if !guard.is_current_run(run) {
                        break;
                    }
                    guard.advance();
                    guard.snapshot()
                };
                surface.redraw(&snapshot);
                if snapshot.terminal {
                    log::debug!("[autoplay] terminal after {} step(s)", snapshot.steps);
                    break;
                }
            }
        }));
    }

    /// Stop ticking and clear `running`.  Progress is kept.
    pub fn cancel(&mut self) {
        self.abort_pending();
        lock(&self.session).end_run();
        log::debug!("[autoplay] cancelled");
    }

    /// Cancel autoplay and restore the initial state.
    pub fn reset(&mut self) -> Snapshot<S> {
        self.abort_pending();
        let mut session = lock(&self.session);
        session.reset();
        session.snapshot()
    }

    /// Apply one event by hand.  A running autoplay keeps running.
    pub fn step_manual(&self) -> Snapshot<S> {
        let mut session = lock(&self.session);
        session.advance();
        session.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        lock(&self.session).snapshot()
    }

    /// `true` while a spawned run has not finished or been cancelled.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the pending run to stop on its own.
    ///
    /// Cancel-safe: dropping this future early leaves the run pending, so a
    /// later `start` or `cancel` still aborts it.
    pub async fn join(&mut self) {
        if let Some(handle) = self.pending.as_mut() {
            // A cancelled task reports JoinError::Cancelled; nothing to do.
            let _ = handle.await;
            self.pending = None;
        }
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<S: Simulation> Drop for Autoplay<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
