//! Merges gene expression evidence, propagates it through the anatomical
//! and developmental ontologies and resolves it into expression calls.
//!
//! The building blocks, from the leaves up:
//!
//! - [`Evidence`] records of several technologies ([`DataType`]) are merged
//!   into a [`BasicCall`] per gene and [`Condition`]
//! - a [`source::CallSource`] provides the basic calls,
//!   an [`ontology::ConditionOntology`] the related conditions
//! - the [`propagation::Propagator`] builds [`GlobalCall`]s. Presence of
//!   expression is inherited from descendant conditions, absence of
//!   expression from ancestor conditions.
//! - the [`summary::SummaryResolver`] turns the global calls into a final
//!   verdict with quality, rank and score
//! - [`filter::aggregate`] batches the queries to the call source
//!
//! The crate does not perform any I/O itself.
use std::num::ParseIntError;
use thiserror::Error;

mod call;
mod condition;
mod config;
mod data;
pub mod filter;
pub mod ontology;
pub mod propagation;
pub mod source;
pub mod summary;

pub use call::{
    Absence, AbsenceCall, AbsenceOrigin, BasicCall, Closure, DataStates, DataTypeCall, Direction,
    Evidence, GlobalCall, OriginOfLine, Presence, PresenceCall, PresenceOrigin,
};
pub use condition::{AnatEntityId, Condition, GeneCondition, GeneId, SpeciesId, StageId};
pub use config::EngineConfig;
pub use data::{CallType, DataState, DataType};

const DEFAULT_NUM_PARENTS: usize = 10;
const DEFAULT_NUM_DATA_TYPES: usize = 4;
const DEFAULT_SCORE_BOUND: f64 = 100.0;

/// Errors of the engine
///
/// Missing evidence is never an error, it is reported as `None`.
#[derive(Error, Debug)]
pub enum CallError {
    /// A data type that is not known or not enabled
    #[error("unknown data type: {0}")]
    UnknownDataType(String),
    /// A condition or term that is part of its own closure
    #[error("cycle in ontology at {0}")]
    CyclicOntology(String),
    /// A condition or term that is not part of the ontology
    #[error("{0} does not exist")]
    DoesNotExist(String),
    /// Evidence of different gene-conditions can not be merged
    #[error("evidence belongs to different gene-conditions")]
    MismatchedGeneCondition,
    /// A quality policy that would not be monotonic
    #[error("invalid quality policy: {0}")]
    InvalidPolicy(String),
    /// The batch was cancelled
    #[error("cancelled")]
    Cancelled,
    /// An id is not a valid integer
    #[error("unable to parse Integer")]
    ParseIntError,
}

impl From<ParseIntError> for CallError {
    fn from(_: ParseIntError) -> Self {
        CallError::ParseIntError
    }
}

/// Shortcut for `Result<T, CallError>`
pub type CallResult<T> = Result<T, CallError>;
