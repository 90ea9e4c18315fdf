//! Assignment engine: computes who gives to whom.
//!
//! The draw shuffles the participant list uniformly and then connects each
//! name to its successor in the shuffled order, wrapping the last back to
//! the first. Adjacency in one shuffled ordering forms a single ring, so
//! the result is a derangement made of exactly one N-cycle by construction:
//! nobody maps to themselves and the mapping cannot split into smaller
//! disjoint cycles. The shuffle only decides *which* ring forms; not every
//! derangement is reachable this way.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use rand::{Rng, seq::SliceRandom};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::lifecycle::MIN_PARTICIPANTS;

/// Mapping from giver to receiver, in cycle order.
pub type Assignment = IndexMap<String, String>;

/// Error raised while computing or validating a draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    /// Fewer than [`MIN_PARTICIPANTS`] names were provided.
    #[error("at least {MIN_PARTICIPANTS} participants are required for a draw, got {got}")]
    InsufficientParticipants {
        /// Number of names provided.
        got: usize,
    },
    /// The same name appeared more than once in the input.
    #[error("duplicate participant name `{0}`")]
    DuplicateParticipant(String),
    /// Post-generation validation rejected the computed result.
    #[error("assignment integrity check failed: {0}")]
    Integrity(String),
}

/// Read-only diagnostic of an assignment's mathematical properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawProperties {
    /// No giver is their own receiver.
    pub no_self_assignment: bool,
    /// Givers and receivers are the same set, each appearing exactly once.
    pub is_permutation: bool,
    /// Following giver → receiver from any node visits every node exactly
    /// once before returning to the start.
    pub is_cyclic: bool,
}

impl DrawProperties {
    /// True when every property holds.
    pub fn all_hold(&self) -> bool {
        self.no_self_assignment && self.is_permutation && self.is_cyclic
    }
}

/// Aggregate outcome of [`simulate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawStatistics {
    /// Number of draws attempted.
    pub iterations: usize,
    /// Draws that completed and passed validation.
    pub successful_draws: usize,
    /// Draws that failed with an error.
    pub failed_draws: usize,
    /// Successful draws containing a giver == receiver pair (always zero
    /// unless the engine is broken).
    pub self_assignments_detected: usize,
    /// Count of distinct assignment maps seen across all draws.
    pub unique_results: usize,
    /// Messages of the failures encountered, in order.
    pub errors: Vec<String>,
}

/// Compute a randomized assignment for the given participant names using
/// the thread-local RNG.
pub fn compute_assignment(names: &[String]) -> Result<Assignment, DrawError> {
    compute_assignment_with(names, &mut rand::rng())
}

/// Compute a randomized assignment using the provided RNG (the seam tests
/// use for deterministic draws).
pub fn compute_assignment_with<R: Rng + ?Sized>(
    names: &[String],
    rng: &mut R,
) -> Result<Assignment, DrawError> {
    if names.len() < MIN_PARTICIPANTS {
        return Err(DrawError::InsufficientParticipants { got: names.len() });
    }

    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(DrawError::DuplicateParticipant(name.clone()));
        }
    }

    debug!(participants = names.len(), "starting draw");

    let mut shuffled = names.to_vec();
    shuffled.shuffle(rng);

    let assignment = ring_assignment(&shuffled);
    validate(&assignment, names)?;

    info!(pairs = assignment.len(), "draw completed and validated");
    Ok(assignment)
}

/// Connect each name to its successor in the given order, wrapping the last
/// back to the first.
fn ring_assignment(ordered: &[String]) -> Assignment {
    let n = ordered.len();
    (0..n)
        .map(|i| (ordered[i].clone(), ordered[(i + 1) % n].clone()))
        .collect()
}

/// Recheck every property the construction guarantees; a result that fails
/// here is rejected instead of persisted.
fn validate(assignment: &Assignment, original: &[String]) -> Result<(), DrawError> {
    if assignment.len() != original.len() {
        return Err(DrawError::Integrity(format!(
            "expected {} pairs, found {}",
            original.len(),
            assignment.len()
        )));
    }

    let expected: HashSet<&str> = original.iter().map(String::as_str).collect();
    let givers: HashSet<&str> = assignment.keys().map(String::as_str).collect();
    if givers != expected {
        return Err(DrawError::Integrity("giver set mismatch".into()));
    }
    let receivers: HashSet<&str> = assignment.values().map(String::as_str).collect();
    if receivers != expected {
        return Err(DrawError::Integrity("receiver set mismatch".into()));
    }

    for (giver, receiver) in assignment {
        if giver == receiver {
            return Err(DrawError::Integrity(format!(
                "self-assignment detected: {giver} → {receiver}"
            )));
        }
    }

    if !is_single_cycle(assignment) {
        return Err(DrawError::Integrity(
            "assignment decomposes into disjoint cycles".into(),
        ));
    }

    Ok(())
}

/// Verify the mathematical properties of an assignment without failing.
/// Usable by tests and operational tooling against arbitrary maps.
pub fn verify_properties(assignment: &Assignment) -> DrawProperties {
    let no_self_assignment = assignment.iter().all(|(giver, receiver)| giver != receiver);

    let givers: HashSet<&str> = assignment.keys().map(String::as_str).collect();
    let receivers: HashSet<&str> = assignment.values().map(String::as_str).collect();
    let is_permutation = receivers.len() == assignment.len() && givers == receivers;

    let is_cyclic = is_permutation && is_single_cycle(assignment);

    DrawProperties {
        no_self_assignment,
        is_permutation,
        is_cyclic,
    }
}

/// Walk giver → receiver from the first key; a single covering cycle comes
/// back to the start only after visiting every node.
fn is_single_cycle(assignment: &Assignment) -> bool {
    let Some(start) = assignment.keys().next() else {
        return false;
    };

    let mut current = start;
    let mut visited = 0usize;
    loop {
        let Some(next) = assignment.get(current) else {
            return false;
        };
        visited += 1;
        if next == start {
            return visited == assignment.len();
        }
        if visited > assignment.len() {
            return false;
        }
        current = next;
    }
}

/// Run the engine repeatedly and report aggregate statistics, for
/// statistical validation of randomness and correctness. Not part of the
/// interactive path.
pub fn simulate(names: &[String], iterations: usize) -> DrawStatistics {
    let mut stats = DrawStatistics {
        iterations,
        successful_draws: 0,
        failed_draws: 0,
        self_assignments_detected: 0,
        unique_results: 0,
        errors: Vec::new(),
    };

    let mut unique = BTreeSet::new();

    for iteration in 0..iterations {
        match compute_assignment(names) {
            Ok(assignment) => {
                stats.successful_draws += 1;
                if assignment.iter().any(|(giver, receiver)| giver == receiver) {
                    stats.self_assignments_detected += 1;
                }
                let mut pairs: Vec<(String, String)> = assignment.into_iter().collect();
                pairs.sort();
                unique.insert(pairs);
            }
            Err(err) => {
                stats.failed_draws += 1;
                warn!(iteration, error = %err, "draw failed during simulation");
                stats.errors.push(err.to_string());
            }
        }
    }

    stats.unique_results = unique.len();
    info!(
        successful = stats.successful_draws,
        unique = stats.unique_results,
        iterations,
        "simulation complete"
    );
    stats
}
