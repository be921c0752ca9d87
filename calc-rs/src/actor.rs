//! Invoking actor and the call-scoped slot that exposes it to symbols.
//!
//! The host hands the session an [`Actor`] for the duration of one call.
//! Host symbols (`$x`, `$y`, `$z`, `p`) are installed once per calculator and
//! read the actor through a shared [`ActorSlot`], so they always see whoever
//! is invoking *right now*.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::calc::domain::Domain;
use crate::calc::env::Environment;
use crate::calc::symbol::{Arity, FixedSymbol, VariadicSymbol};
use crate::error::{CalcError, Result};

/// Integer block coordinates of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Position { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// Whoever issued the current command.
pub trait Actor: Send + Sync {
    /// Current position; may change between calls.
    fn position(&self) -> Position;

    /// Deliver one display line.
    fn send_message(&self, message: &str);
}

// ── Slot ──────────────────────────────────────────────────────────────────────

/// Shared, single-holder binding of the current actor.
#[derive(Clone, Default)]
pub struct ActorSlot {
    inner: Arc<Mutex<Option<Arc<dyn Actor>>>>,
}

impl fmt::Debug for ActorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSlot").field("bound", &self.is_bound()).finish()
    }
}

impl ActorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `actor` until the returned guard is dropped.
    pub fn bind(&self, actor: Arc<dyn Actor>) -> ActorBinding<'_> {
        *self.inner.lock() = Some(actor);
        ActorBinding { slot: self }
    }

    pub fn current(&self) -> Result<Arc<dyn Actor>> {
        self.inner.lock().clone().ok_or(CalcError::NoInvokingActor)
    }

    pub fn is_bound(&self) -> bool {
        self.inner.lock().is_some()
    }

    fn clear(&self) {
        *self.inner.lock() = None;
    }
}

/// Clears the slot on every exit path, including unwinding.
#[must_use = "the actor is unbound as soon as the binding is dropped"]
pub struct ActorBinding<'a> {
    slot: &'a ActorSlot,
}

impl Drop for ActorBinding<'_> {
    fn drop(&mut self) {
        self.slot.clear();
        trace!("actor unbound");
    }
}

// ── Host symbols ──────────────────────────────────────────────────────────────

fn coordinate<D: Domain>(slot: &ActorSlot, axis: fn(Position) -> i32) -> FixedSymbol<D> {
    let slot = slot.clone();
    FixedSymbol::<D>::new(0, 1, move |frame| {
        let position = slot.current()?.position();
        frame.stack_mut().push(D::from_i64(i64::from(axis(position))));
        Ok(())
    })
}

/// Install `$x`, `$y`, `$z` and the print symbol `p` into `env`.
///
/// `p` pops N values (default 1), prints them top first separated by single
/// spaces and sends `": " + text` to the actor.  It returns nothing; asking
/// it for results is an arity error.
pub fn install_host_symbols<D: Domain>(env: &mut Environment<D>, slot: &ActorSlot) {
    env.define("$x", coordinate::<D>(slot, |p| p.x));
    env.define("$y", coordinate::<D>(slot, |p| p.y));
    env.define("$z", coordinate::<D>(slot, |p| p.z));

    let slot = slot.clone();
    env.define("p", VariadicSymbol::<D>::new(Arity::new(1, 0), move |frame, inputs, outputs| {
        if outputs != 0 {
            return Err(CalcError::arity("p does not return any values"));
        }
        let actor = slot.current()?;
        let mut parts = Vec::with_capacity(inputs);
        for _ in 0..inputs {
            let value = frame.stack_mut().pop()?;
            parts.push(D::print(&value));
        }
        actor.send_message(&format!(": {}", parts.join(" ")));
        Ok(())
    }));
}

// ── Tests ─────────────────────────────────────────────────────────────────────
