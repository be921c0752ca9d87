//! Session manager: which calculator is current for one command-driven user.
//!
//! State (all behind one mutex, so every transition and every evaluation is
//! serialized per session):
//!
//! | Slot | Contents |
//! |------|----------|
//! | active | the calculator commands run against (never empty) |
//! | previous | the calculator active before the last switch |
//! | saved | LIFO stack of checkpoints (`push` / `pop`) |
//! | registry | name → calculator (`name` / `load`) |
//!
//! Calculators are shared by reference: the same calculator may be active,
//! saved several times and registered under several names at once.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::actor::{install_host_symbols, Actor, ActorSlot};
use crate::calc::calculator::{AnyCalculator, CalculatorType};
use crate::calc::compiler::Notation;
use crate::error::{CalcError, Result};

/// Shared handle to one calculator; identity is the allocation.
pub type CalculatorRef = Arc<Mutex<AnyCalculator>>;

struct SessionState {
    active: CalculatorRef,
    previous: Option<CalculatorRef>,
    saved: Vec<CalculatorRef>,
    registry: HashMap<String, CalculatorRef>,
    notation: Notation,
}

impl SessionState {
    fn set_active(&mut self, calculator: CalculatorRef) {
        let old = std::mem::replace(&mut self.active, calculator);
        self.previous = Some(old);
    }
}

pub struct Session {
    state: Mutex<SessionState>,
    actor: ActorSlot,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// New session seeded with a double calculator.
    pub fn new() -> Self {
        Self::with_type(CalculatorType::Double)
    }

    pub fn with_type(kind: CalculatorType) -> Self {
        let actor = ActorSlot::new();
        let active = build_calculator(kind, &actor);
        Session {
            state: Mutex::new(SessionState {
                active,
                previous: None,
                saved: Vec::new(),
                registry: HashMap::new(),
                notation: Notation::default(),
            }),
            actor,
        }
    }

    pub fn active(&self) -> CalculatorRef {
        Arc::clone(&self.state.lock().active)
    }

    pub fn previous(&self) -> Option<CalculatorRef> {
        self.state.lock().previous.clone()
    }

    pub fn active_type(&self) -> CalculatorType {
        self.state.lock().active.lock().kind()
    }

    pub fn notation(&self) -> Notation {
        self.state.lock().notation
    }

    pub fn set_notation(&self, notation: Notation) {
        self.state.lock().notation = notation;
        debug!(%notation, "notation changed");
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Build a new calculator with host symbols and make it active.
    pub fn create_calculator(&self, kind: CalculatorType) {
        let calculator = build_calculator(kind, &self.actor);
        self.state.lock().set_active(calculator);
        info!(calculator = %kind, "created calculator");
    }

    /// Swap active and previous.  Returns `false` (and changes nothing) when
    /// there is no previous calculator yet.
    pub fn restore_previous_calculator(&self) -> bool {
        let mut state = self.state.lock();
        let state = &mut *state;
        match state.previous.as_mut() {
            Some(previous) => {
                std::mem::swap(&mut state.active, previous);
                info!("restored previous calculator");
                true
            }
            None => false,
        }
    }

    /// Save the active calculator as a checkpoint; returns the new depth.
    pub fn push_calculator(&self) -> usize {
        let mut state = self.state.lock();
        let active = Arc::clone(&state.active);
        state.saved.push(active);
        let depth = state.saved.len();
        info!(depth, "pushed calculator");
        depth
    }

    /// Make the most recent checkpoint active; returns the remaining depth.
    pub fn pop_calculator(&self) -> Result<usize> {
        let mut state = self.state.lock();
        let calculator = state.saved.pop().ok_or(CalcError::EmptyStack)?;
        state.set_active(calculator);
        let depth = state.saved.len();
        info!(depth, "popped calculator");
        Ok(depth)
    }

    pub fn name_calculator(&self, name: &str) {
        let mut state = self.state.lock();
        let active = Arc::clone(&state.active);
        state.registry.insert(name.to_owned(), active);
        info!(name, "named calculator");
    }

    pub fn load_calculator(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        let calculator = state
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| CalcError::NoSuchName(name.to_owned()))?;
        state.set_active(calculator);
        info!(name, "loaded calculator");
        Ok(())
    }

    /// Snapshot of registered names.
    pub fn calculator_names(&self) -> BTreeSet<String> {
        self.state.lock().registry.keys().cloned().collect()
    }

    pub fn saved_depth(&self) -> usize {
        self.state.lock().saved.len()
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Run `body` against the active calculator with `actor` bound.
    ///
    /// Only one body runs per session at a time; the actor is unbound before
    /// the session lock is released, whether `body` succeeds or fails.
    pub fn with_invoking_actor<T>(
        &self,
        actor: Arc<dyn Actor>,
        body: impl FnOnce(&mut AnyCalculator, Notation) -> Result<T>,
    ) -> Result<T> {
        let state = self.state.lock();
        let _binding = self.actor.bind(actor);
        let notation = state.notation;
        let mut calculator = state.active.lock();
        body(&mut calculator, notation)
    }

    pub fn compile_and_execute(&self, actor: Arc<dyn Actor>, src: &str) -> Result<()> {
        self.with_invoking_actor(actor, |calc, notation| calc.compile_and_execute(notation, src))
    }

    pub fn compile_execute_and_print(&self, actor: Arc<dyn Actor>, src: &str) -> Result<String> {
        self.with_invoking_actor(actor, |calc, notation| calc.compile_execute_and_print(notation, src))
    }

    pub fn compile_and_set_global_symbol(&self, actor: Arc<dyn Actor>, name: &str, src: &str) -> Result<String> {
        self.with_invoking_actor(actor, |calc, notation| calc.compile_and_set_global_symbol(notation, name, src))
    }

    pub fn compile_and_define_global_function(
        &self,
        actor: Arc<dyn Actor>,
        name: &str,
        arg_count: usize,
        src: &str,
    ) -> Result<()> {
        self.with_invoking_actor(actor, |calc, notation| {
            calc.compile_and_define_global_function(notation, name, arg_count, src)
        })
    }

    /// Names visible in the active calculator.
    pub fn symbol_names(&self) -> BTreeSet<String> {
        self.state.lock().active.lock().symbol_names()
    }
}

/// One construction path for every backend: the tag's routine plus host
/// symbols bound to this session's actor slot.
fn build_calculator(kind: CalculatorType, actor: &ActorSlot) -> CalculatorRef {
    let mut calculator = kind.new_calculator();
    match &mut calculator {
        AnyCalculator::Double(c) => install_host_symbols(c.environment_mut(), actor),
        AnyCalculator::Fraction(c) => install_host_symbols(c.environment_mut(), actor),
        AnyCalculator::BigInt(c) => install_host_symbols(c.environment_mut(), actor),
    }
    Arc::new(Mutex::new(calculator))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Position;

    struct Quiet;

    impl Actor for Quiet {
        fn position(&self) -> Position {
            Position::default()
        }

        fn send_message(&self, _message: &str) {}
    }

    #[test]
    fn starts_with_double() {
        let session = Session::new();
        assert_eq!(session.active_type(), CalculatorType::Double);
        assert!(session.previous().is_none());
        assert_eq!(session.notation(), Notation::Infix);
    }

    #[test]
    fn create_moves_active_to_previous() {
        let session = Session::new();
        let first = session.active();
        session.create_calculator(CalculatorType::BigInt);
        assert_eq!(session.active_type(), CalculatorType::BigInt);
        assert!(Arc::ptr_eq(&session.previous().unwrap(), &first));
    }

    #[test]
    fn restore_without_previous_is_noop() {
        let session = Session::new();
        let first = session.active();
        assert!(!session.restore_previous_calculator());
        assert!(Arc::ptr_eq(&session.active(), &first));
    }

    #[test]
    fn actor_unbound_after_failure() {
        let session = Session::new();
        let err = session.compile_execute_and_print(Arc::new(Quiet), "1 +").unwrap_err();
        assert!(matches!(err, CalcError::Syntax { .. }));
        assert!(!session.actor.is_bound());
    }

    #[test]
    fn notation_applies_to_evaluation() {
        let session = Session::with_type(CalculatorType::BigInt);
        session.set_notation(Notation::Postfix);
        assert_eq!(session.compile_execute_and_print(Arc::new(Quiet), "2 3 *").unwrap(), "6");
    }
}
