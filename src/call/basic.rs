use tracing::{error, trace};

use crate::call::evidence::{DataStates, Evidence};
use crate::condition::{Condition, GeneCondition};
use crate::data::{CallType, DataType};
use crate::{CallError, CallResult};

/// The directly observed evidence of one gene in one condition
///
/// A `BasicCall` holds the merged evidence of every data type, separately
/// for presence ([`CallType::Expression`]) and absence
/// ([`CallType::NoExpression`]) of expression. It only contains evidence
/// of the exact condition, nothing is inherited through the ontology.
///
/// A `BasicCall` always carries information: a call without any
/// evidence above `NoData` is never constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicCall {
    key: GeneCondition,
    expression: DataStates,
    no_expression: DataStates,
}

impl BasicCall {
    /// Merges all evidence records of one [`GeneCondition`] into a `BasicCall`
    ///
    /// Records of the same data type and polarity are merged by keeping the
    /// highest `DataState`, the count-weighted mean rank and the sum of the
    /// evidence counts.
    ///
    /// Returns `Ok(None)` if no record carries evidence above `NoData`.
    ///
    /// # Errors
    ///
    /// [`CallError::MismatchedGeneCondition`] if the records belong to
    /// different `GeneCondition`s
    ///
    /// # Examples
    ///
    /// ```
    /// use exprcalls::{
    ///     BasicCall, CallType, Condition, DataState, DataType, Evidence, GeneCondition,
    /// };
    ///
    /// let key = GeneCondition::new("ID1", Condition::new("Anat_id1", "Stage_id1", 1u32));
    /// let rna_seq = |state, rank| {
    ///     Evidence::new(key.clone(), DataType::RnaSeq, CallType::Expression, state, rank, 1)
    /// };
    /// let records = vec![
    ///     rna_seq(DataState::LowQuality, Some(20.0)),
    ///     rna_seq(DataState::HighQuality, Some(10.0)),
    /// ];
    ///
    /// let call = BasicCall::merge(&records).unwrap().unwrap();
    /// assert_eq!(call.expression().state(DataType::RnaSeq), DataState::HighQuality);
    /// assert_eq!(call.expression().get(DataType::RnaSeq).unwrap().rank(), Some(15.0));
    ///
    /// // nothing observed, no call
    /// let empty: Vec<Evidence> = Vec::new();
    /// assert!(BasicCall::merge(&empty).unwrap().is_none());
    /// ```
    pub fn merge<'a, I>(records: I) -> CallResult<Option<BasicCall>>
    where
        I: IntoIterator<Item = &'a Evidence>,
    {
        let mut key: Option<&GeneCondition> = None;
        let mut expression = DataStates::new();
        let mut no_expression = DataStates::new();

        for record in records {
            match key {
                None => key = Some(record.key()),
                Some(k) if k != record.key() => {
                    error!("Cannot merge evidence of {} and {}", k, record.key());
                    return Err(CallError::MismatchedGeneCondition);
                }
                Some(_) => {}
            }
            let states = match record.call_type() {
                CallType::Expression => &mut expression,
                CallType::NoExpression => &mut no_expression,
            };
            states.insert(record.data_type(), record.to_data_type_call());
        }

        let Some(key) = key else {
            trace!("No evidence records to merge");
            return Ok(None);
        };

        Ok(BasicCall::from_parts(key.clone(), expression, no_expression))
    }

    /// Constructs a `BasicCall` from already merged [`DataStates`]
    ///
    /// Returns `None` if neither polarity carries any evidence.
    pub fn from_parts(
        key: GeneCondition,
        expression: DataStates,
        no_expression: DataStates,
    ) -> Option<BasicCall> {
        if expression.is_empty() && no_expression.is_empty() {
            trace!("No informative evidence for {}", key);
            return None;
        }
        Some(BasicCall {
            key,
            expression,
            no_expression,
        })
    }

    /// Joins the evidence of `other` into a new `BasicCall`
    ///
    /// Only the [`DataState`](crate::DataState) of each data type is idempotent.
    /// Evidence counts and rank weights are summed, so joining a call with
    /// itself doubles them.
    ///
    /// # Errors
    ///
    /// [`CallError::MismatchedGeneCondition`] if both calls have different keys
    pub fn join(&self, other: &BasicCall) -> CallResult<BasicCall> {
        if self.key != other.key {
            error!("Cannot join calls of {} and {}", self.key, other.key);
            return Err(CallError::MismatchedGeneCondition);
        }
        Ok(BasicCall {
            key: self.key.clone(),
            expression: self.expression.join(&other.expression),
            no_expression: self.no_expression.join(&other.no_expression),
        })
    }

    /// The [`GeneCondition`] of the call
    pub fn key(&self) -> &GeneCondition {
        &self.key
    }

    /// The condition of the call
    pub fn condition(&self) -> &Condition {
        self.key.condition()
    }

    /// Evidence for expression of the gene
    pub fn expression(&self) -> &DataStates {
        &self.expression
    }

    /// Evidence for absence of expression
    pub fn no_expression(&self) -> &DataStates {
        &self.no_expression
    }

    /// Evidence of the given polarity
    pub fn states(&self, call_type: CallType) -> &DataStates {
        match call_type {
            CallType::Expression => &self.expression,
            CallType::NoExpression => &self.no_expression,
        }
    }

    /// Iterates all data types referenced by the call, of both polarities
    pub fn data_types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.expression
            .data_types()
            .chain(self.no_expression.data_types())
    }
}
