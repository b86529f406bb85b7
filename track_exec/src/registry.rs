//! # Shared state registry
//!
//! All data exchanged between the control loop and the I/O workers goes through the [`Registry`].
//! The registry holds exactly one value for each [`kind`] of state, each behind its own lock, so
//! unrelated kinds never contend with each other.
//!
//! Kinds are types rather than runtime keys, so asking for a kind the registry doesn't hold or
//! getting back the wrong type is a compile error:
//!
//! ```ignore
//! let mode = registry.read::<kind::Mode>();
//!
//! {
//!     let mut output = registry.acquire::<kind::RegOutput>();
//!     output.speed = 0.0;
//! } // lock released here
//! ```
//!
//! Every acquisition returns a [`Guard`] which releases the lock when dropped, on every exit path.
//! Guards should be held only long enough to copy a value in or out.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, TryLockError};

// Internal
use crate::mission_ctrl::MissionData;
use crate::path_engine::Path;
use crate::regulator::{RegParams, RegSamples};
use comms_if::{
    eqpt::{
        act::ActDems,
        sens::{SensorData, Telemetry},
    },
    tc::{CtrlChange, Mode},
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A kind of state held by the registry.
///
/// This trait is sealed, the set of kinds is fixed by the registry.
pub trait Kind: private::Sealed {
    /// The type of the value stored for this kind
    type Value: Send;

    /// Identifier used in logs
    const ID: KindId;

    #[doc(hidden)]
    fn slot(registry: &Registry) -> &Mutex<Self::Value>;
}

mod private {
    pub trait Sealed {}
}

// ---------------------------------------------------------------------------
// KINDS
// ---------------------------------------------------------------------------

macro_rules! registry_kinds {
    ($( $(#[$doc:meta])* $kind:ident => $field:ident : $ty:ty ),+ $(,)?) => {
        /// Identifies a kind of state held by the registry.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum KindId {
            $($kind),+
        }

        impl KindId {
            /// Every kind held by the registry.
            pub const ALL: &'static [KindId] = &[$(KindId::$kind),+];
        }

        /// Marker types naming each kind of state, used as `registry.acquire::<kind::Mode>()`.
        pub mod kind {
            $(
                $(#[$doc])*
                #[derive(Debug, Clone, Copy)]
                pub struct $kind;
            )+
        }

        #[derive(Debug)]
        struct Slots {
            $($field: Mutex<$ty>),+
        }

        $(
            impl private::Sealed for kind::$kind {}

            impl Kind for kind::$kind {
                type Value = $ty;
                const ID: KindId = KindId::$kind;

                fn slot(registry: &Registry) -> &Mutex<$ty> {
                    &registry.slots.$field
                }
            }
        )+
    };
}

registry_kinds! {
    /// Latest readings from the sensor board
    SensorData => sensor_data: SensorData,

    /// Latest operator request, used in manual mode
    CtrlChange => ctrl_change: CtrlChange,

    /// Latest lane telemetry
    Telemetry => telemetry: Telemetry,

    /// Angle and speed demands sent to the actuators
    RegOutput => reg_output: ActDems,

    /// Tunable regulator parameters
    RegParams => reg_params: RegParams,

    /// Regulator measurement history
    RegSamples => reg_samples: RegSamples,

    /// Manual or autonomous driving
    Mode => mode: Mode,

    /// Mission queue and vehicle position
    Mission => mission: MissionData,

    /// The path currently being followed
    Path => path: Path,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The shared state registry.
///
/// Construct one per process and share it between workers with an `Arc`.
#[derive(Debug)]
pub struct Registry {
    slots: Slots,
}

/// Exclusive access to the value of one kind, released when dropped.
pub struct Guard<'r, K: Kind> {
    inner: MutexGuard<'r, K::Value>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Registry {
    /// Create a registry holding every kind.
    ///
    /// Values without a meaningful default (the mission state, the regulator parameters and
    /// samples) must be provided, everything else starts at its default: manual mode, a zero
    /// request and output, an empty path.
    pub fn new(mission: MissionData, reg_params: RegParams, reg_samples: RegSamples) -> Self {
        Self {
            slots: Slots {
                sensor_data: Mutex::new(SensorData::default()),
                ctrl_change: Mutex::new(CtrlChange::default()),
                telemetry: Mutex::new(Telemetry::default()),
                reg_output: Mutex::new(ActDems::default()),
                reg_params: Mutex::new(reg_params),
                reg_samples: Mutex::new(reg_samples),
                mode: Mutex::new(Mode::default()),
                mission: Mutex::new(mission),
                path: Mutex::new(Path::default()),
            },
        }
    }

    /// Acquire the given kind, blocking until no other context holds it.
    ///
    /// If a previous holder panicked the value is recovered as it was left.
    pub fn acquire<K: Kind>(&self) -> Guard<'_, K> {
        let inner = K::slot(self).lock().unwrap_or_else(|e| {
            warn!("{:?} was poisoned by a panicking holder, recovering", K::ID);
            e.into_inner()
        });

        Guard { inner }
    }

    /// Acquire the given kind if no other context currently holds it.
    pub fn try_acquire<K: Kind>(&self) -> Option<Guard<'_, K>> {
        match K::slot(self).try_lock() {
            Ok(inner) => Some(Guard { inner }),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(e)) => {
                warn!("{:?} was poisoned by a panicking holder, recovering", K::ID);
                Some(Guard {
                    inner: e.into_inner(),
                })
            }
        }
    }

    /// Copy the current value of a kind out of the registry.
    pub fn read<K: Kind>(&self) -> K::Value
    where
        K::Value: Clone,
    {
        (*self.acquire::<K>()).clone()
    }

    /// Replace the value of a kind.
    pub fn write<K: Kind>(&self, value: K::Value) {
        *self.acquire::<K>() = value;
    }

    /// Modify the value of a kind in place, returning the result of `f`.
    pub fn update<K, F, R>(&self, f: F) -> R
    where
        K: Kind,
        F: FnOnce(&mut K::Value) -> R,
    {
        let mut guard = self.acquire::<K>();
        f(&mut *guard)
    }
}

impl<'r, K: Kind> Guard<'r, K> {
    /// The kind this guard gives access to.
    pub fn kind(&self) -> KindId {
        K::ID
    }
}

impl<'r, K: Kind> Deref for Guard<'r, K> {
    type Target = K::Value;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'r, K: Kind> DerefMut for Guard<'r, K> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
