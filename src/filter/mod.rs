//! Query filters and their aggregation into batches
//!
//! Callers often need the same kind of calls for many entities (e.g. many
//! genes in many conditions). Each entity comes with its own set of
//! [`CallFilter`]s. Sending every filter separately to the evidence store is
//! wasteful, so [`aggregate`] merges them into as few distinct filters as
//! possible, remembering which entities need which filter.
use std::collections::BTreeSet;

use crate::call::BasicCall;
use crate::condition::GeneId;
use crate::data::{CallType, DataState, DataType};

mod aggregate;

pub use aggregate::aggregate;

/// A filter that can be combined with other filters of the same kind
///
/// Both methods return `None` if the filters cannot be combined. This is
/// expected and frequent, it only means that both filters must be sent
/// separately.
pub trait MergeableFilter: Sized {
    /// Combines two filters that are used for the same entity
    ///
    /// The result must retrieve everything that either filter retrieves.
    fn merge_same_entity(&self, other: &Self) -> Option<Self>;

    /// Combines two filters that are used for different entities
    ///
    /// The result is used for the entities of both filters, so it should
    /// not retrieve data that neither entity asked for.
    fn merge_different_entities(&self, other: &Self) -> Option<Self>;
}

/// A requirement on the evidence of one polarity
///
/// It is satisfied if any of its data types (or any data type at all, if
/// none are given) has at least `min_state`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StateRequirement {
    call_type: CallType,
    data_types: BTreeSet<DataType>,
    min_state: DataState,
}

impl StateRequirement {
    /// Constructs a new `StateRequirement`
    ///
    /// An empty list of data types means "any data type".
    pub fn new(call_type: CallType, data_types: &[DataType], min_state: DataState) -> Self {
        Self {
            call_type,
            data_types: data_types.iter().copied().collect(),
            min_state,
        }
    }

    /// The polarity of the required evidence
    pub fn call_type(&self) -> CallType {
        self.call_type
    }

    /// The data types that can satisfy the requirement, empty for all
    pub fn data_types(&self) -> &BTreeSet<DataType> {
        &self.data_types
    }

    /// The minimal state
    pub fn min_state(&self) -> DataState {
        self.min_state
    }

    fn covers_data_type(&self, data_type: DataType) -> bool {
        self.data_types.is_empty() || self.data_types.contains(&data_type)
    }

    /// Returns `true` if every call satisfying `other` also satisfies `self`
    pub fn implied_by(&self, other: &StateRequirement) -> bool {
        if self.call_type != other.call_type || self.min_state > other.min_state {
            return false;
        }
        if self.data_types.is_empty() {
            return true;
        }
        !other.data_types.is_empty() && other.data_types.is_subset(&self.data_types)
    }

    /// Returns `true` if the call satisfies the requirement
    pub fn accepts(&self, call: &BasicCall) -> bool {
        call.states(self.call_type)
            .iter()
            .any(|(data_type, dt_call)| {
                self.covers_data_type(*data_type) && dt_call.state() >= self.min_state
            })
    }
}

/// Selects basic calls from the evidence store
///
/// A call is selected if its gene is one of the filter's genes and it
/// satisfies any of the [`StateRequirement`]s. A filter without requirements
/// selects every call of its genes.
///
/// # Examples
///
/// ```
/// use exprcalls::filter::{CallFilter, MergeableFilter, StateRequirement};
/// use exprcalls::{CallType, DataState, DataType};
///
/// let high_rna_seq =
///     StateRequirement::new(CallType::Expression, &[DataType::RnaSeq], DataState::HighQuality);
///
/// let a = CallFilter::new(&["ID1".into()], &[high_rna_seq.clone()]);
/// let b = CallFilter::new(&["ID2".into()], &[high_rna_seq]);
///
/// // same requirements for one entity: both genes can be fetched at once
/// let merged = a.merge_same_entity(&b).unwrap();
/// assert_eq!(merged.genes().len(), 2);
/// assert!(merged.subsumes(&a) && merged.subsumes(&b));
///
/// // but not for different entities
/// assert!(a.merge_different_entities(&b).is_none());
/// ```
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CallFilter {
    genes: BTreeSet<GeneId>,
    requirements: BTreeSet<StateRequirement>,
}

impl CallFilter {
    /// Constructs a new `CallFilter`
    pub fn new(genes: &[GeneId], requirements: &[StateRequirement]) -> Self {
        Self {
            genes: genes.iter().cloned().collect(),
            requirements: requirements.iter().cloned().collect(),
        }
    }

    /// A filter selecting every call of the gene
    pub fn for_gene<G: Into<GeneId>>(gene: G) -> Self {
        Self {
            genes: BTreeSet::from([gene.into()]),
            requirements: BTreeSet::new(),
        }
    }

    /// The genes of the filter
    pub fn genes(&self) -> &BTreeSet<GeneId> {
        &self.genes
    }

    /// The requirements of the filter, any of which must be satisfied
    pub fn requirements(&self) -> &BTreeSet<StateRequirement> {
        &self.requirements
    }

    /// Returns `true` if the filter selects every call of its genes
    pub fn accepts_any(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Returns `true` if the filter selects the call
    pub fn accepts(&self, call: &BasicCall) -> bool {
        self.genes.contains(call.key().gene())
            && (self.accepts_any() || self.requirements.iter().any(|req| req.accepts(call)))
    }

    /// Returns `true` if every call selected by `other` is selected by `self`
    pub fn subsumes(&self, other: &CallFilter) -> bool {
        if !other.genes.is_subset(&self.genes) {
            return false;
        }
        if self.accepts_any() {
            return true;
        }
        if other.accepts_any() {
            return false;
        }
        other
            .requirements
            .iter()
            .all(|theirs| self.requirements.iter().any(|ours| ours.implied_by(theirs)))
    }
}

impl MergeableFilter for CallFilter {
    fn merge_same_entity(&self, other: &Self) -> Option<Self> {
        if self.subsumes(other) {
            return Some(self.clone());
        }
        if other.subsumes(self) {
            return Some(other.clone());
        }
        if self.requirements == other.requirements {
            return Some(Self {
                genes: self.genes.union(&other.genes).cloned().collect(),
                requirements: self.requirements.clone(),
            });
        }
        // the requirements differ, so neither of them accepts any call
        if self.genes == other.genes {
            return Some(Self {
                genes: self.genes.clone(),
                requirements: self
                    .requirements
                    .union(&other.requirements)
                    .cloned()
                    .collect(),
            });
        }
        None
    }

    fn merge_different_entities(&self, other: &Self) -> Option<Self> {
        if self == other {
            Some(self.clone())
        } else {
            None
        }
    }
}
