//! The once-only injection trigger.
//!
//! A trigger owns an [`Implant`] and a three-valued atomic state:
//!
//! ```text
//! Unarmed --CAS--> Arming --implant ok--> Armed
//!                     \
//!                      --implant err--> Unarmed   (a later activation may retry)
//! ```
//!
//! Only the caller that wins the `Unarmed → Arming` compare-and-swap touches
//! the live tables, so concurrent first activations perform the mutation
//! exactly once. The guard is independent of the tables' own writer locks.

use crate::{admin::AdminHandle, context::ComponentContext};
use graft_core::RegistrationError;
use std::sync::atomic::{AtomicU8, Ordering};

const UNARMED: u8 = 0;
const ARMING: u8 = 1;
const ARMED: u8 = 2;

/// Lifecycle state of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// The implant has not been applied.
    Unarmed,
    /// An activation is applying the implant right now.
    Arming,
    /// The implant has been applied. Terminal.
    Armed,
}

impl TriggerState {
    fn from_u8(value: u8) -> Self {
        match value {
            UNARMED => TriggerState::Unarmed,
            ARMING => TriggerState::Arming,
            _ => TriggerState::Armed,
        }
    }
}

/// Result of a successful call to [`InjectionTrigger::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// This call applied the implant.
    Armed,
    /// An earlier call already applied it; nothing was done.
    AlreadyArmed,
    /// Another call is applying it concurrently; nothing was done.
    InProgress,
}

/// A mutation of the live tables applied by a trigger.
pub trait Implant: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Apply the mutation.
    fn implant(&self, admin: &AdminHandle) -> Result<(), RegistrationError>;

    /// Human-readable lines describing what became reachable.
    fn describe(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Applies an [`Implant`] at most once.
#[derive(Debug)]
pub struct InjectionTrigger<I> {
    implant: I,
    state: AtomicU8,
}

impl<I: Implant> InjectionTrigger<I> {
    /// A new, unarmed trigger.
    pub fn new(implant: I) -> Self {
        Self {
            implant,
            state: AtomicU8::new(UNARMED),
        }
    }

    /// The current state.
    pub fn state(&self) -> TriggerState {
        TriggerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the implant has been applied.
    pub fn is_armed(&self) -> bool {
        self.state() == TriggerState::Armed
    }

    /// The wrapped implant.
    pub fn implant(&self) -> &I {
        &self.implant
    }

    /// Attempt the `Unarmed → Armed` transition.
    ///
    /// Resolves the live tables from `context` and applies the implant. On
    /// failure the trigger returns to `Unarmed` and the error is returned.
    pub fn activate(&self, context: &ComponentContext) -> Result<Activation, RegistrationError> {
        if let Err(observed) =
            self.state
                .compare_exchange(UNARMED, ARMING, Ordering::AcqRel, Ordering::Acquire)
        {
            let activation = match TriggerState::from_u8(observed) {
                TriggerState::Armed => Activation::AlreadyArmed,
                _ => Activation::InProgress,
            };
            tracing::debug!(implant = %self.implant.name(), ?activation, "Trigger not re-armed");
            return Ok(activation);
        }

        let applied = AdminHandle::from_context(context).and_then(|admin| self.implant.implant(&admin));
        match applied {
            Ok(()) => {
                self.state.store(ARMED, Ordering::Release);
                tracing::info!(implant = %self.implant.name(), "Trigger armed");
                Ok(Activation::Armed)
            }
            Err(err) => {
                self.state.store(UNARMED, Ordering::Release);
                tracing::error!(implant = %self.implant.name(), error = %err, "Trigger failed, remaining unarmed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingImplant {
        applied: AtomicUsize,
    }

    impl Implant for CountingImplant {
        fn name(&self) -> &str {
            "counting"
        }

        fn implant(&self, _admin: &AdminHandle) -> Result<(), RegistrationError> {
            self.applied.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_arms_once() {
        let server = Server::new();
        let trigger = InjectionTrigger::new(CountingImplant::default());
        assert_eq!(trigger.state(), TriggerState::Unarmed);

        assert_eq!(trigger.activate(server.context()).unwrap(), Activation::Armed);
        assert_eq!(trigger.activate(server.context()).unwrap(), Activation::AlreadyArmed);
        assert!(trigger.is_armed());
        assert_eq!(trigger.implant().applied.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_leaves_unarmed_for_retry() {
        let trigger = InjectionTrigger::new(CountingImplant::default());

        let err = trigger.activate(&ComponentContext::default()).unwrap_err();
        assert!(matches!(err, RegistrationError::ComponentMissing(_)));
        assert_eq!(trigger.state(), TriggerState::Unarmed);
        assert_eq!(trigger.implant().applied.load(Ordering::SeqCst), 0);

        let server = Server::new();
        assert_eq!(trigger.activate(server.context()).unwrap(), Activation::Armed);
        assert_eq!(trigger.implant().applied.load(Ordering::SeqCst), 1);
    }
}
