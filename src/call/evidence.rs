use smallvec::SmallVec;

use crate::condition::GeneCondition;
use crate::data::{CallType, DataState, DataType};
use crate::DEFAULT_NUM_DATA_TYPES;

/// A single evidence record of one data type for one [`GeneCondition`]
///
/// This is what the evidence store delivers: e.g. the result of all
/// RNA-Seq libraries of one experiment for a gene in a condition.
/// Several records of the same data type can exist for the same
/// `GeneCondition` and are merged into a [`crate::BasicCall`].
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    key: GeneCondition,
    data_type: DataType,
    call_type: CallType,
    state: DataState,
    rank: Option<f64>,
    evidence_count: u32,
}

impl Evidence {
    /// Constructs a new evidence record
    ///
    /// The `rank` is optional, since absence evidence is not ranked.
    /// Lower ranks mean higher expression.
    pub fn new(
        key: GeneCondition,
        data_type: DataType,
        call_type: CallType,
        state: DataState,
        rank: Option<f64>,
        evidence_count: u32,
    ) -> Self {
        Self {
            key,
            data_type,
            call_type,
            state,
            rank,
            evidence_count,
        }
    }

    /// The [`GeneCondition`] the evidence was observed in
    pub fn key(&self) -> &GeneCondition {
        &self.key
    }

    /// The technology that produced the evidence
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Presence or absence evidence
    pub fn call_type(&self) -> CallType {
        self.call_type
    }

    /// The confidence of the evidence
    pub fn state(&self) -> DataState {
        self.state
    }

    /// The expression rank, if any
    pub fn rank(&self) -> Option<f64> {
        self.rank
    }

    /// The number of independent experiments that contributed
    pub fn evidence_count(&self) -> u32 {
        self.evidence_count
    }

    pub(crate) fn to_data_type_call(&self) -> DataTypeCall {
        DataTypeCall::new(self.state, self.rank, self.evidence_count)
    }
}

/// The merged evidence of one data type
///
/// Merging keeps the highest [`DataState`], sums up the evidence counts
/// and calculates the mean rank, weighted by the evidence count of each
/// ranked contribution. Counts and weights saturate at `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataTypeCall {
    state: DataState,
    rank: Option<f64>,
    rank_weight: u32,
    evidence_count: u32,
}

impl DataTypeCall {
    /// Constructs a new [`DataTypeCall`]
    pub fn new(state: DataState, rank: Option<f64>, evidence_count: u32) -> Self {
        // a ranked record always has a weight, even if the count was not reported
        let rank_weight = match rank {
            Some(_) => evidence_count.max(1),
            None => 0,
        };
        Self {
            state,
            rank,
            rank_weight,
            evidence_count,
        }
    }

    /// The confidence tier
    pub fn state(&self) -> DataState {
        self.state
    }

    /// The weighted mean rank of all ranked contributions
    pub fn rank(&self) -> Option<f64> {
        self.rank
    }

    /// The weight of [`DataTypeCall::rank`]
    pub fn rank_weight(&self) -> u32 {
        self.rank_weight
    }

    /// The number of independent experiments that contributed
    pub fn evidence_count(&self) -> u32 {
        self.evidence_count
    }

    /// Merges `other` into a new [`DataTypeCall`]
    #[must_use]
    pub fn merge(&self, other: &DataTypeCall) -> DataTypeCall {
        let rank = match (self.rank, other.rank) {
            (Some(a), Some(b)) => {
                let weight_a = f64::from(self.rank_weight);
                let weight_b = f64::from(other.rank_weight);
                Some((a * weight_a + b * weight_b) / (weight_a + weight_b))
            }
            (Some(a), None) => Some(a),
            (None, b) => b,
        };
        DataTypeCall {
            state: self.state.join(other.state),
            rank,
            rank_weight: self.rank_weight.saturating_add(other.rank_weight),
            evidence_count: self.evidence_count.saturating_add(other.evidence_count),
        }
    }
}

/// The merged evidence of all data types of one polarity
///
/// Each [`DataType`] occurs at most once, in canonical order. Only data types
/// with a [`DataState`] above `NoData` are stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStates {
    inner: SmallVec<[(DataType, DataTypeCall); DEFAULT_NUM_DATA_TYPES]>,
}

impl DataStates {
    /// Constructs a new, empty [`DataStates`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no data type carries any information
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of data types that carry information
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Adds the evidence of one data type, merging it with existing evidence
    /// of the same data type
    ///
    /// Evidence with [`DataState::NoData`] is ignored.
    pub fn insert(&mut self, data_type: DataType, call: DataTypeCall) {
        if !call.state().is_observed() {
            return;
        }
        match self.inner.binary_search_by(|(dt, _)| dt.cmp(&data_type)) {
            Ok(idx) => {
                let merged = self.inner[idx].1.merge(&call);
                self.inner[idx].1 = merged;
            }
            Err(idx) => self.inner.insert(idx, (data_type, call)),
        }
    }

    /// Returns the merged evidence of the data type
    pub fn get(&self, data_type: DataType) -> Option<&DataTypeCall> {
        self.inner
            .binary_search_by(|(dt, _)| dt.cmp(&data_type))
            .ok()
            .map(|idx| &self.inner[idx].1)
    }

    /// Returns the [`DataState`] of the data type, `NoData` if absent
    pub fn state(&self, data_type: DataType) -> DataState {
        self.get(data_type)
            .map_or(DataState::NoData, DataTypeCall::state)
    }

    /// Returns the states of the given data types, in the given order
    ///
    /// This is mostly useful for comparing calls in tests and reports.
    pub fn states_of(&self, data_types: &[DataType]) -> Vec<DataState> {
        data_types.iter().map(|dt| self.state(*dt)).collect()
    }

    /// Joins both [`DataStates`] into a new one
    #[must_use]
    pub fn join(&self, other: &DataStates) -> DataStates {
        let mut res = self.clone();
        res.join_mut(other);
        res
    }

    /// Joins `other` into `self`
    pub fn join_mut(&mut self, other: &DataStates) {
        for (data_type, call) in other {
            self.insert(*data_type, *call);
        }
    }

    /// Iterates the data types and their merged evidence
    pub fn iter(&self) -> std::slice::Iter<'_, (DataType, DataTypeCall)> {
        self.inner.iter()
    }

    /// Returns the data types that carry information
    pub fn data_types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.inner.iter().map(|(dt, _)| *dt)
    }

    /// The number of data types with at least `LowQuality` evidence
    pub fn supporting_count(&self) -> usize {
        self.inner
            .iter()
            .filter(|(_, call)| call.state() >= DataState::LowQuality)
            .count()
    }

    /// The number of data types with `HighQuality` evidence
    pub fn high_quality_count(&self) -> usize {
        self.inner
            .iter()
            .filter(|(_, call)| call.state() == DataState::HighQuality)
            .count()
    }

    /// The highest [`DataState`] of all data types
    pub fn best_state(&self) -> DataState {
        self.inner
            .iter()
            .map(|(_, call)| call.state())
            .max()
            .unwrap_or_default()
    }

    /// The sum of the evidence counts of all data types, saturating at `u32::MAX`
    pub fn evidence_count(&self) -> u32 {
        self.inner
            .iter()
            .fold(0u32, |sum, (_, call)| sum.saturating_add(call.evidence_count()))
    }

    /// The mean rank of all ranked data types, weighted by their evidence
    ///
    /// Returns `None` if no data type is ranked.
    pub fn weighted_rank(&self) -> Option<f64> {
        let mut weight = 0.0;
        let mut sum = 0.0;
        for (_, call) in &self.inner {
            if let Some(rank) = call.rank() {
                weight += f64::from(call.rank_weight());
                sum += rank * f64::from(call.rank_weight());
            }
        }
        if weight == 0.0 {
            None
        } else {
            Some(sum / weight)
        }
    }
}

impl<'a> IntoIterator for &'a DataStates {
    type Item = &'a (DataType, DataTypeCall);
    type IntoIter = std::slice::Iter<'a, (DataType, DataTypeCall)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl FromIterator<(DataType, DataTypeCall)> for DataStates {
    fn from_iter<T: IntoIterator<Item = (DataType, DataTypeCall)>>(iter: T) -> Self {
        let mut states = DataStates::new();
        for (data_type, call) in iter {
            states.insert(data_type, call);
        }
        states
    }
}
