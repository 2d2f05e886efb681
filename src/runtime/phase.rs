//! Frame-cycle phases
//!
//! A cycle is a fixed, ordered sequence of phases. The host invokes the
//! runner once per phase, in [`Phase::ALL`] order; routines only choose which
//! phase they resume at.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One slot of the repeating frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// First phase of a cycle; pending submissions are folded in here.
    Initialization,
    EarlyUpdate,
    FixedUpdate,
    PreUpdate,
    /// Resumption phase of a record that has never been advanced.
    #[default]
    Update,
    PreLateUpdate,
    PostLateUpdate,
}

impl Phase {
    /// Number of phases in a cycle.
    pub const COUNT: usize = 7;

    /// Every phase, in driver order.
    pub const ALL: [Phase; Phase::COUNT] = [
        Phase::Initialization,
        Phase::EarlyUpdate,
        Phase::FixedUpdate,
        Phase::PreUpdate,
        Phase::Update,
        Phase::PreLateUpdate,
        Phase::PostLateUpdate,
    ];

    /// Position of this phase within a cycle.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Phase::Initialization => 0,
            Phase::EarlyUpdate => 1,
            Phase::FixedUpdate => 2,
            Phase::PreUpdate => 3,
            Phase::Update => 4,
            Phase::PreLateUpdate => 5,
            Phase::PostLateUpdate => 6,
        }
    }

    /// Phase at the given cycle position.
    #[inline]
    pub fn from_index(index: usize) -> Option<Phase> {
        Phase::ALL.get(index).copied()
    }

    /// Stable lowercase name, as used in config files and logs.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Initialization => "initialization",
            Phase::EarlyUpdate => "early_update",
            Phase::FixedUpdate => "fixed_update",
            Phase::PreUpdate => "pre_update",
            Phase::Update => "update",
            Phase::PreLateUpdate => "pre_late_update",
            Phase::PostLateUpdate => "post_late_update",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown phase name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown phase: {0}")]
pub struct ParsePhaseError(pub String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .iter()
            .copied()
            .find(|phase| phase.name() == s)
            .ok_or_else(|| ParsePhaseError(s.to_string()))
    }
}

/// Fixed-size table holding one value per phase.
#[derive(Debug, Clone, Default)]
pub struct PhaseTable<T> {
    slots: [T; Phase::COUNT],
}

impl<T> PhaseTable<T> {
    /// Build a table by calling `init` once per phase.
    pub fn from_fn(mut init: impl FnMut(Phase) -> T) -> Self {
        Self {
            slots: std::array::from_fn(|i| init(Phase::ALL[i])),
        }
    }

    /// Iterate `(phase, value)` pairs in driver order.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &T)> {
        Phase::ALL.iter().copied().zip(self.slots.iter())
    }

    /// Mutable variant of [`PhaseTable::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Phase, &mut T)> {
        Phase::ALL.iter().copied().zip(self.slots.iter_mut())
    }
}

impl<T> std::ops::Index<Phase> for PhaseTable<T> {
    type Output = T;

    fn index(
        &self,
        phase: Phase,
    ) -> &T {
        &self.slots[phase.index()]
    }
}

impl<T> std::ops::IndexMut<Phase> for PhaseTable<T> {
    fn index_mut(
        &mut self,
        phase: Phase,
    ) -> &mut T {
        &mut self.slots[phase.index()]
    }
}
