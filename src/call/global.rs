use std::marker::PhantomData;

use crate::call::evidence::DataStates;
use crate::call::origin::{Absence, Direction, OriginOfLine, Presence};
use crate::condition::{Condition, GeneCondition};

/// A call built under presence propagation
pub type PresenceCall = GlobalCall<Presence>;

/// A call built under absence propagation
pub type AbsenceCall = GlobalCall<Absence>;

/// The evidence of one gene in one condition, including evidence
/// inherited through the ontology
///
/// The direction `D` fixes which evidence was used (presence or absence)
/// and which provenance tags are possible. A `GlobalCall` is never changed
/// after construction and is safe to cache per scope and [`GeneCondition`].
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalCall<D: Direction> {
    key: GeneCondition,
    states: DataStates,
    origin: D::Origin,
    propagated: bool,
    contributors: Vec<Condition>,
    direction: PhantomData<D>,
}

impl<D: Direction> GlobalCall<D> {
    pub(crate) fn new(
        key: GeneCondition,
        states: DataStates,
        origin: D::Origin,
        propagated: bool,
        mut contributors: Vec<Condition>,
    ) -> Self {
        contributors.sort();
        Self {
            key,
            states,
            origin,
            propagated,
            contributors,
            direction: PhantomData,
        }
    }

    /// The [`GeneCondition`] of the call
    pub fn key(&self) -> &GeneCondition {
        &self.key
    }

    /// The merged evidence of the call and all contributing conditions
    pub fn states(&self) -> &DataStates {
        &self.states
    }

    /// The direction specific provenance tag
    pub fn origin(&self) -> D::Origin {
        self.origin
    }

    /// The general provenance tag
    pub fn origin_of_line(&self) -> OriginOfLine {
        self.origin.into()
    }

    /// Returns `true` if propagation was requested when building the call
    ///
    /// This is independent of whether any evidence was actually inherited.
    pub fn propagated(&self) -> bool {
        self.propagated
    }

    /// The conditions whose evidence was merged into this call, sorted
    ///
    /// Contains the call's own condition if it was observed directly.
    pub fn contributors(&self) -> &[Condition] {
        &self.contributors
    }

    /// The count-weighted mean rank of all contributing evidence
    pub fn rank(&self) -> Option<f64> {
        self.states.weighted_rank()
    }

    /// The sum of the evidence counts of all contributing evidence
    pub fn evidence_count(&self) -> u32 {
        self.states.evidence_count()
    }
}
