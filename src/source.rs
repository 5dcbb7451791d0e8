//! Access to the directly observed evidence
//!
//! The engine never reads from a database itself. All basic calls are
//! provided through the [`CallSource`] trait. [`InMemoryCallSource`] is a
//! simple implementation that holds all calls in memory.
use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::call::{BasicCall, Evidence};
use crate::condition::{Condition, GeneCondition, GeneId};
use crate::config::EngineConfig;
use crate::filter::CallFilter;
use crate::CallResult;

/// Provides the [`BasicCall`]s of genes in conditions
pub trait CallSource {
    /// Returns the basic calls of `gene` in each of the `conditions`
    ///
    /// Conditions without any observed evidence are not part of the result.
    ///
    /// # Errors
    ///
    /// Implementation specific, e.g. if the evidence store is not reachable
    fn basic_calls_for(
        &self,
        gene: &GeneId,
        conditions: &HashSet<Condition>,
    ) -> CallResult<HashMap<Condition, BasicCall>>;

    /// Returns the basic calls selected by `filter` in each of the `conditions`
    ///
    /// The default implementation queries every gene of the filter separately.
    /// Sources that can fetch many genes at once should override it.
    ///
    /// # Errors
    ///
    /// Any error of [`CallSource::basic_calls_for`]
    fn basic_calls_for_filter(
        &self,
        filter: &CallFilter,
        conditions: &HashSet<Condition>,
    ) -> CallResult<HashMap<GeneCondition, BasicCall>> {
        let mut res = HashMap::new();
        for gene in filter.genes() {
            for (condition, call) in self.basic_calls_for(gene, conditions)? {
                if filter.accepts(&call) {
                    res.insert(GeneCondition::new(gene.clone(), condition), call);
                }
            }
        }
        Ok(res)
    }
}

/// A [`CallSource`] that keeps all basic calls in memory
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use exprcalls::source::{CallSource, InMemoryCallSource};
/// use exprcalls::{
///     CallType, Condition, DataState, DataType, EngineConfig, Evidence, GeneCondition, GeneId,
/// };
///
/// let liver = Condition::new("liver", "adult", 9606u32);
/// let key = GeneCondition::new("ID1", liver.clone());
/// let expressed = |data_type, state, rank, count| {
///     Evidence::new(key.clone(), data_type, CallType::Expression, state, rank, count)
/// };
/// let records = vec![
///     expressed(DataType::RnaSeq, DataState::HighQuality, Some(2.0), 3),
///     expressed(DataType::Est, DataState::LowQuality, None, 1),
/// ];
///
/// let source = InMemoryCallSource::from_evidence(&records, &EngineConfig::default()).unwrap();
/// assert_eq!(source.len(), 1);
///
/// let conditions = HashSet::from([liver.clone()]);
/// let calls = source.basic_calls_for(&GeneId::from("ID1"), &conditions).unwrap();
/// assert_eq!(calls[&liver].expression().len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryCallSource {
    calls: HashMap<GeneId, HashMap<Condition, BasicCall>>,
}

impl InMemoryCallSource {
    /// Constructs a new, empty `InMemoryCallSource`
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges evidence records into basic calls
    ///
    /// All records of the same [`GeneCondition`] are merged into one
    /// [`BasicCall`]. Records without information are dropped.
    ///
    /// # Errors
    ///
    /// [`crate::CallError::UnknownDataType`] if a record uses a data type
    /// that is not enabled in `config`
    pub fn from_evidence<'a, I>(records: I, config: &EngineConfig) -> CallResult<Self>
    where
        I: IntoIterator<Item = &'a Evidence>,
    {
        let mut grouped: HashMap<&GeneCondition, Vec<&Evidence>> = HashMap::new();
        let mut n_records = 0usize;
        for record in records {
            config.check_data_type(record.data_type())?;
            grouped.entry(record.key()).or_default().push(record);
            n_records += 1;
        }

        let mut source = Self::new();
        for records in grouped.into_values() {
            if let Some(call) = BasicCall::merge(records)? {
                source.insert(call)?;
            }
        }
        debug!(
            "Merged {} evidence records into {} basic calls",
            n_records,
            source.len()
        );
        Ok(source)
    }

    /// Adds a basic call, joining it with an existing call of the same key
    ///
    /// # Errors
    ///
    /// Only if the existing call has a different key, which can not happen
    pub fn insert(&mut self, call: BasicCall) -> CallResult<()> {
        let by_condition = self.calls.entry(call.key().gene().clone()).or_default();
        match by_condition.get_mut(call.condition()) {
            Some(existing) => {
                trace!("Joining duplicate call for {}", call.key());
                *existing = existing.join(&call)?;
            }
            None => {
                by_condition.insert(call.condition().clone(), call);
            }
        }
        Ok(())
    }

    /// Returns the basic call of the `GeneCondition`, if any
    pub fn get(&self, key: &GeneCondition) -> Option<&BasicCall> {
        self.calls
            .get(key.gene())
            .and_then(|by_condition| by_condition.get(key.condition()))
    }

    /// The number of basic calls
    pub fn len(&self) -> usize {
        self.calls.values().map(HashMap::len).sum()
    }

    /// Returns `true` if there are no basic calls
    pub fn is_empty(&self) -> bool {
        self.calls.values().all(HashMap::is_empty)
    }

    /// Iterates all basic calls, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &BasicCall> {
        self.calls.values().flat_map(HashMap::values)
    }
}

impl CallSource for InMemoryCallSource {
    fn basic_calls_for(
        &self,
        gene: &GeneId,
        conditions: &HashSet<Condition>,
    ) -> CallResult<HashMap<Condition, BasicCall>> {
        let Some(by_condition) = self.calls.get(gene) else {
            trace!("No calls for {}", gene);
            return Ok(HashMap::new());
        };
        Ok(conditions
            .iter()
            .filter_map(|condition| {
                by_condition
                    .get(condition)
                    .map(|call| (condition.clone(), call.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::CallType::{Expression, NoExpression};
    use crate::data::DataState::{HighQuality, LowQuality, NoData};
    use crate::data::{CallType, DataState, DataType};
    use crate::filter::StateRequirement;
    use crate::CallError;

    fn cond(anat: &str) -> Condition {
        Condition::new(anat, "Stage_id1", 1u32)
    }

    fn evidence(
        gene: &str,
        anat: &str,
        data_type: DataType,
        call_type: CallType,
        state: DataState,
    ) -> Evidence {
        Evidence::new(
            GeneCondition::new(gene, cond(anat)),
            data_type,
            call_type,
            state,
            None,
            1,
        )
    }

    fn records() -> Vec<Evidence> {
        vec![
            evidence("ID1", "liver", DataType::RnaSeq, Expression, HighQuality),
            evidence("ID1", "liver", DataType::RnaSeq, Expression, LowQuality),
            evidence("ID1", "brain", DataType::InSitu, NoExpression, LowQuality),
            evidence("ID2", "liver", DataType::Est, Expression, LowQuality),
            evidence("ID2", "heart", DataType::Est, Expression, NoData),
        ]
    }

    #[test]
    fn from_evidence_merges_records() {
        let source = InMemoryCallSource::from_evidence(&records(), &EngineConfig::default())
            .unwrap();
        assert_eq!(source.len(), 3);
        assert!(!source.is_empty());

        let call = source.get(&GeneCondition::new("ID1", cond("liver"))).unwrap();
        assert_eq!(call.expression().state(DataType::RnaSeq), DataState::HighQuality);
        assert_eq!(call.expression().evidence_count(), 2);
        assert!(source.get(&GeneCondition::new("ID2", cond("heart"))).is_none());
    }

    #[test]
    fn from_evidence_rejects_disabled_data_types() {
        let config = EngineConfig::default().with_data_types(&[DataType::RnaSeq, DataType::Est]);
        assert!(matches!(
            InMemoryCallSource::from_evidence(&records(), &config),
            Err(CallError::UnknownDataType(name)) if name == "in_situ"
        ));
    }

    #[test]
    fn insert_joins_calls() {
        let mut source = InMemoryCallSource::new();
        assert!(source.is_empty());
        let first = [evidence("ID1", "liver", DataType::Est, Expression, LowQuality)];
        let second = [evidence("ID1", "liver", DataType::Est, Expression, HighQuality)];
        source.insert(BasicCall::merge(&first).unwrap().unwrap()).unwrap();
        source.insert(BasicCall::merge(&second).unwrap().unwrap()).unwrap();

        assert_eq!(source.len(), 1);
        let call = source.get(&GeneCondition::new("ID1", cond("liver"))).unwrap();
        assert_eq!(call.expression().state(DataType::Est), DataState::HighQuality);
    }

    #[test]
    fn basic_calls_for_conditions() {
        let source = InMemoryCallSource::from_evidence(&records(), &EngineConfig::default())
            .unwrap();
        let conditions = HashSet::from([cond("liver"), cond("heart")]);

        let calls = source.basic_calls_for(&GeneId::from("ID1"), &conditions).unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls.contains_key(&cond("liver")));

        let calls = source.basic_calls_for(&GeneId::from("ID9"), &conditions).unwrap();
        assert!(calls.is_empty());
    }

    #[test]
    fn basic_calls_for_filter() {
        let source = InMemoryCallSource::from_evidence(&records(), &EngineConfig::default())
            .unwrap();
        let conditions = HashSet::from([cond("liver"), cond("brain")]);
        let genes = [GeneId::from("ID1"), GeneId::from("ID2")];

        let everything = CallFilter::new(&genes, &[]);
        assert_eq!(source.basic_calls_for_filter(&everything, &conditions).unwrap().len(), 3);

        let expressed_high = CallFilter::new(
            &genes,
            &[StateRequirement::new(CallType::Expression, &[], DataState::HighQuality)],
        );
        let calls = source.basic_calls_for_filter(&expressed_high, &conditions).unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls.contains_key(&GeneCondition::new("ID1", cond("liver"))));
    }
}
