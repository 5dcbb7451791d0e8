//! Builds global calls by propagating evidence through the ontology
//!
//! Evidence only ever propagates in one direction per polarity:
//!
//! - presence of expression in a condition supports presence in all of its
//!   ancestors, so a [`PresenceCall`] inherits from the descendants
//! - absence of expression in a condition supports absence in all of its
//!   descendants, so an [`AbsenceCall`] inherits from the ancestors
//!
//! The direction is a type parameter of [`Propagator::propagate`], the
//! [`Scope`] decides at runtime whether anything is inherited at all.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace, warn};

use crate::call::{
    Absence, AbsenceCall, BasicCall, Closure, Direction, GlobalCall, Presence, PresenceCall,
};
use crate::condition::{Condition, GeneCondition, GeneId};
use crate::config::EngineConfig;
use crate::filter::{aggregate, CallFilter};
use crate::ontology::{validate_closure, ConditionOntology};
use crate::source::CallSource;
use crate::summary::{max_rank_of, ResolvedCall, SummaryResolver};
use crate::{CallError, CallResult};

/// Whether evidence of related conditions is taken into account
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Scope {
    /// Only evidence observed in the condition itself
    SelfOnly,
    /// Evidence of the condition and of all related conditions in the
    /// legal direction
    Propagated,
}

impl Scope {
    fn is_propagated(self) -> bool {
        self == Scope::Propagated
    }
}

/// The ancestors and descendants of one condition
#[derive(Debug, Default)]
struct Closures {
    ancestors: HashSet<Condition>,
    descendants: HashSet<Condition>,
}

impl Closures {
    fn get(&self, closure: Closure) -> &HashSet<Condition> {
        match closure {
            Closure::Ancestors => &self.ancestors,
            Closure::Descendants => &self.descendants,
        }
    }

    fn all(&self) -> impl Iterator<Item = &Condition> {
        self.ancestors.iter().chain(self.descendants.iter())
    }
}

type BatchItem = (GeneCondition, Option<PresenceCall>, Option<AbsenceCall>);

/// Builds global calls from an ontology and a source of basic calls
///
/// ```mermaid
/// flowchart LR
///     R[requests] --> A[aggregate filters]
///     A --> S[(CallSource)]
///     O[(ConditionOntology)] --> P
///     S --> P[propagate per gene]
///     P --> Res[SummaryResolver]
///     Res --> Out[ResolvedCall]
/// ```
///
/// # Examples
///
/// ```
/// use std::sync::atomic::AtomicBool;
///
/// use exprcalls::ontology::{ConditionGraph, HierarchyBuilder, Relation};
/// use exprcalls::propagation::{Propagator, Scope};
/// use exprcalls::source::InMemoryCallSource;
/// use exprcalls::summary::SummaryCallType;
/// use exprcalls::{
///     AnatEntityId, CallType, Condition, DataState, DataType, EngineConfig, Evidence,
///     GeneCondition, GeneId, Presence, PresenceOrigin, StageId,
/// };
///
/// let mut anatomy = HierarchyBuilder::<AnatEntityId>::new();
/// anatomy.add_term("brain");
/// anatomy.add_term("forebrain");
/// let mut anatomy = anatomy.terms_complete();
/// anatomy.add_parent("forebrain", "brain", Relation::PartOf).unwrap();
///
/// let mut stages = HierarchyBuilder::<StageId>::new();
/// stages.add_term("adult");
///
/// let brain = Condition::new("brain", "adult", 9606u32);
/// let forebrain = Condition::new("forebrain", "adult", 9606u32);
/// let ontology = ConditionGraph::new(
///     anatomy.build().unwrap(),
///     stages.terms_complete().build().unwrap(),
///     vec![brain.clone(), forebrain.clone()],
/// ).unwrap();
///
/// let records = vec![Evidence::new(
///     GeneCondition::new("ID1", forebrain.clone()),
///     DataType::RnaSeq,
///     CallType::Expression,
///     DataState::HighQuality,
///     Some(12.0),
///     2,
/// )];
/// let config = EngineConfig::default();
/// let source = InMemoryCallSource::from_evidence(&records, &config).unwrap();
///
/// let propagator = Propagator::new(&ontology, &source).with_config(config);
///
/// // expression in the forebrain means expression in the brain
/// let call = propagator
///     .propagate::<Presence>(&GeneId::from("ID1"), &brain, Scope::Propagated)
///     .unwrap()
///     .unwrap();
/// assert_eq!(call.origin(), PresenceOrigin::Descendant);
///
/// // but nothing was observed in the brain itself
/// assert!(propagator
///     .propagate::<Presence>(&GeneId::from("ID1"), &brain, Scope::SelfOnly)
///     .unwrap()
///     .is_none());
///
/// let requests = [GeneCondition::new("ID1", brain)];
/// let results = propagator
///     .resolve_batch(&requests, Scope::Propagated, &AtomicBool::new(false))
///     .unwrap();
/// assert_eq!(results[0].summary().call_type(), SummaryCallType::Expressed);
/// ```
#[cfg_attr(doc, aquamarine::aquamarine)]
pub struct Propagator<'a, O, S> {
    ontology: &'a O,
    source: &'a S,
    config: EngineConfig,
    pool: Option<ThreadPool>,
}

/// Builds the dedicated worker pool, if the configuration asks for one
fn worker_pool(config: &EngineConfig) -> Option<ThreadPool> {
    let n = config.num_threads()?;
    match ThreadPoolBuilder::new().num_threads(n).build() {
        Ok(pool) => Some(pool),
        Err(err) => {
            warn!("Unable to build a pool of {} threads: {}", n, err);
            None
        }
    }
}

impl<'a, O, S> Propagator<'a, O, S>
where
    O: ConditionOntology,
    S: CallSource,
{
    /// Constructs a new `Propagator` with the default [`EngineConfig`]
    pub fn new(ontology: &'a O, source: &'a S) -> Self {
        Self {
            ontology,
            source,
            config: EngineConfig::default(),
            pool: None,
        }
    }

    /// Uses the given configuration
    ///
    /// If the configuration sets [`EngineConfig::num_threads`], the worker
    /// pool for [`Propagator::resolve_batch`] is built here and reused for
    /// every batch. If it cannot be built, batches run on the global pool.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.pool = worker_pool(&config);
        self.config = config;
        self
    }

    /// The configuration of the `Propagator`
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the global call of `gene` in `condition` in the direction `D`
    ///
    /// Returns `Ok(None)` if neither the condition itself nor any condition
    /// of the closure has evidence of the direction's polarity.
    ///
    /// # Errors
    ///
    /// - [`CallError::CyclicOntology`] if the closure contains the condition itself
    /// - [`CallError::UnknownDataType`] if a basic call uses a disabled data type
    /// - any error of the ontology or the call source
    pub fn propagate<D: Direction>(
        &self,
        gene: &GeneId,
        condition: &Condition,
        scope: Scope,
    ) -> CallResult<Option<GlobalCall<D>>> {
        let closure = if scope.is_propagated() {
            self.ontology.closure(condition, D::CLOSURE)?
        } else {
            HashSet::new()
        };

        let mut conditions = closure.clone();
        conditions.insert(condition.clone());
        let calls = self.source.basic_calls_for(gene, &conditions)?;

        global_call::<D>(
            GeneCondition::new(gene.clone(), condition.clone()),
            &closure,
            scope,
            &calls,
            &self.config,
        )
    }

    fn closures_of(&self, condition: &Condition, scope: Scope) -> CallResult<Closures> {
        if !scope.is_propagated() {
            return Ok(Closures::default());
        }
        let closures = Closures {
            ancestors: self.ontology.closure(condition, Closure::Ancestors)?,
            descendants: self.ontology.closure(condition, Closure::Descendants)?,
        };
        validate_closure(condition, &closures.ancestors, &closures.descendants)?;
        Ok(closures)
    }

    /// Fetches all basic calls needed for the requests, batched through [`aggregate`]
    fn prefetch(
        &self,
        requests: &[GeneCondition],
        closures: &HashMap<Condition, Closures>,
        cancel: &AtomicBool,
    ) -> CallResult<HashMap<GeneId, HashMap<Condition, BasicCall>>> {
        let mut wanted: HashMap<Condition, HashSet<CallFilter>> = HashMap::new();
        for request in requests {
            let related = closures
                .get(request.condition())
                .into_iter()
                .flat_map(Closures::all);
            for condition in std::iter::once(request.condition()).chain(related) {
                wanted
                    .entry(condition.clone())
                    .or_default()
                    .insert(CallFilter::for_gene(request.gene().clone()));
            }
        }

        let batches = aggregate(wanted);
        debug!("Fetching basic calls in {} batches", batches.len());

        let mut calls: HashMap<GeneId, HashMap<Condition, BasicCall>> = HashMap::new();
        for (filter, conditions) in &batches {
            if cancel.load(Ordering::Relaxed) {
                warn!("Batch cancelled while fetching basic calls");
                return Err(CallError::Cancelled);
            }
            for (key, call) in self.source.basic_calls_for_filter(filter, conditions)? {
                calls
                    .entry(key.gene().clone())
                    .or_default()
                    .insert(key.condition().clone(), call);
            }
        }
        Ok(calls)
    }

    /// Resolves many `GeneCondition`s at once
    ///
    /// All basic calls are fetched up front, then the presence and absence
    /// calls of each gene are built on a rayon worker pool. The expression
    /// scores are normalized against the highest rank of the whole batch.
    ///
    /// Requests without any evidence in scope are not part of the result.
    /// Duplicate requests are resolved once. The result is sorted by gene
    /// and condition.
    ///
    /// `cancel` is checked before every gene. Once it is set, the remaining
    /// work is abandoned.
    ///
    /// # Errors
    ///
    /// - [`CallError::Cancelled`] if the batch was cancelled
    /// - any error of [`Propagator::propagate`]
    pub fn resolve_batch(
        &self,
        requests: &[GeneCondition],
        scope: Scope,
        cancel: &AtomicBool,
    ) -> CallResult<Vec<ResolvedCall>>
    where
        O: Sync,
        S: Sync,
    {
        let mut closures: HashMap<Condition, Closures> = HashMap::new();
        for request in requests {
            if !closures.contains_key(request.condition()) {
                let closure = self.closures_of(request.condition(), scope)?;
                closures.insert(request.condition().clone(), closure);
            }
        }

        let calls = self.prefetch(requests, &closures, cancel)?;

        let mut by_gene: BTreeMap<&GeneId, BTreeMap<&Condition, &GeneCondition>> =
            BTreeMap::new();
        for request in requests {
            by_gene
                .entry(request.gene())
                .or_default()
                .insert(request.condition(), request);
        }
        let units: Vec<_> = by_gene.into_iter().collect();
        debug!(
            "Resolving {} requests of {} genes",
            requests.len(),
            units.len()
        );

        let no_calls = HashMap::new();
        let run = || {
            units
                .par_iter()
                .map(|(gene, keys)| {
                    if cancel.load(Ordering::Relaxed) {
                        return Err(CallError::Cancelled);
                    }
                    let calls = calls.get(*gene).unwrap_or(&no_calls);
                    keys.values()
                        .map(|key| self.resolve_unit(key, &closures, scope, calls))
                        .collect::<CallResult<Vec<BatchItem>>>()
                })
                .collect::<CallResult<Vec<Vec<BatchItem>>>>()
        };

        let computed = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };
        let computed: Vec<BatchItem> = match computed {
            Ok(units) => units.into_iter().flatten().collect(),
            Err(CallError::Cancelled) => {
                warn!("Batch cancelled");
                return Err(CallError::Cancelled);
            }
            Err(err) => return Err(err),
        };

        let max_rank = max_rank_of(
            computed
                .iter()
                .filter_map(|(_, presence, _)| presence.as_ref()),
        );
        let resolver =
            SummaryResolver::new(*self.config.quality_policy(), self.config.score_bound());

        let mut res: Vec<ResolvedCall> = computed
            .into_iter()
            .filter_map(|(key, presence, absence)| {
                let summary = resolver.resolve(presence.as_ref(), absence.as_ref(), max_rank)?;
                Some(ResolvedCall::new(key, presence, absence, summary))
            })
            .collect();
        res.sort_by(|a, b| a.key().cmp(b.key()));
        debug!("Resolved {} of {} requests", res.len(), requests.len());
        Ok(res)
    }

    fn resolve_unit(
        &self,
        key: &GeneCondition,
        closures: &HashMap<Condition, Closures>,
        scope: Scope,
        calls: &HashMap<Condition, BasicCall>,
    ) -> CallResult<BatchItem> {
        let empty = Closures::default();
        let closure = closures.get(key.condition()).unwrap_or(&empty);
        let presence = global_call::<Presence>(
            key.clone(),
            closure.get(Presence::CLOSURE),
            scope,
            calls,
            &self.config,
        )?;
        let absence = global_call::<Absence>(
            key.clone(),
            closure.get(Absence::CLOSURE),
            scope,
            calls,
            &self.config,
        )?;
        Ok((key.clone(), presence, absence))
    }
}

/// Joins the evidence of the condition and its closure into a [`GlobalCall`]
fn global_call<D: Direction>(
    key: GeneCondition,
    closure: &HashSet<Condition>,
    scope: Scope,
    calls: &HashMap<Condition, BasicCall>,
    config: &EngineConfig,
) -> CallResult<Option<GlobalCall<D>>> {
    let mut contributors = Vec::new();

    let mut states = match calls.get(key.condition()) {
        Some(call) => {
            config.check_call(call)?;
            call.states(D::CALL_TYPE).clone()
        }
        None => Default::default(),
    };
    let observed = !states.is_empty();
    if observed {
        contributors.push(key.condition().clone());
    }

    let mut inherited = false;
    for condition in closure {
        let Some(call) = calls.get(condition) else {
            continue;
        };
        config.check_call(call)?;
        let related = call.states(D::CALL_TYPE);
        if !related.is_empty() {
            states.join_mut(related);
            contributors.push(condition.clone());
            inherited = true;
        }
    }

    let Some(origin) = D::origin(observed, inherited) else {
        trace!("No {:?} evidence in scope for {}", D::CALL_TYPE, key);
        return Ok(None);
    };
    Ok(Some(GlobalCall::new(
        key,
        states,
        origin,
        scope.is_propagated(),
        contributors,
    )))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use crate::call::{AbsenceOrigin, Evidence, OriginOfLine, PresenceOrigin};
    use crate::condition::{AnatEntityId, StageId};
    use crate::data::CallType::{Expression, NoExpression};
    use crate::data::{CallType, DataState, DataType};
    use crate::ontology::{ConditionGraph, HierarchyBuilder, Relation};
    use crate::source::InMemoryCallSource;

    // body > organ > tissue, all in the same stage
    fn ontology() -> ConditionGraph {
        let mut anatomy = HierarchyBuilder::<AnatEntityId>::new();
        for term in ["body", "organ", "tissue"] {
            anatomy.add_term(term);
        }
        let mut anatomy = anatomy.terms_complete();
        anatomy.add_parent("organ", "body", Relation::PartOf).unwrap();
        anatomy.add_parent("tissue", "organ", Relation::IsA).unwrap();

        let mut stages = HierarchyBuilder::<StageId>::new();
        stages.add_term("adult");

        ConditionGraph::new(
            anatomy.build().unwrap(),
            stages.terms_complete().build().unwrap(),
            vec![cond("body"), cond("organ"), cond("tissue")],
        )
        .unwrap()
    }

    fn cond(anat: &str) -> Condition {
        Condition::new(anat, "adult", 1u32)
    }

    fn evidence(
        gene: &str,
        anat: &str,
        data_type: DataType,
        call_type: CallType,
        rank: f64,
    ) -> Evidence {
        Evidence::new(
            GeneCondition::new(gene, cond(anat)),
            data_type,
            call_type,
            DataState::HighQuality,
            Some(rank),
            1,
        )
    }

    fn source(records: &[Evidence]) -> InMemoryCallSource {
        InMemoryCallSource::from_evidence(records, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn presence_inherits_from_descendants() {
        let ontology = ontology();
        let source = source(&[
            evidence("ID1", "tissue", DataType::RnaSeq, Expression, 10.0),
            evidence("ID1", "organ", DataType::Est, Expression, 20.0),
        ]);
        let propagator = Propagator::new(&ontology, &source);
        let gene = GeneId::from("ID1");

        let body = propagator
            .propagate::<Presence>(&gene, &cond("body"), Scope::Propagated)
            .unwrap()
            .unwrap();
        assert_eq!(body.origin(), PresenceOrigin::Descendant);
        assert_eq!(body.states().len(), 2);
        assert_eq!(body.contributors(), &[cond("organ"), cond("tissue")]);
        assert!(body.propagated());

        let organ = propagator
            .propagate::<Presence>(&gene, &cond("organ"), Scope::Propagated)
            .unwrap()
            .unwrap();
        assert_eq!(organ.origin(), PresenceOrigin::Both);
        assert_eq!(organ.rank(), Some(15.0));

        let tissue = propagator
            .propagate::<Presence>(&gene, &cond("tissue"), Scope::Propagated)
            .unwrap()
            .unwrap();
        assert_eq!(tissue.origin(), PresenceOrigin::SelfOnly);
        assert_eq!(tissue.states().len(), 1);
    }

    #[test]
    fn absence_inherits_from_ancestors() {
        let ontology = ontology();
        let source = source(&[evidence(
            "ID1",
            "organ",
            DataType::InSitu,
            NoExpression,
            1.0,
        )]);
        let propagator = Propagator::new(&ontology, &source);
        let gene = GeneId::from("ID1");

        let tissue = propagator
            .propagate::<Absence>(&gene, &cond("tissue"), Scope::Propagated)
            .unwrap()
            .unwrap();
        assert_eq!(tissue.origin(), AbsenceOrigin::Parent);
        assert_eq!(tissue.origin_of_line(), OriginOfLine::Parent);

        // absence never flows up
        assert!(propagator
            .propagate::<Absence>(&gene, &cond("body"), Scope::Propagated)
            .unwrap()
            .is_none());
        // and the absence evidence is no presence evidence
        assert!(propagator
            .propagate::<Presence>(&gene, &cond("body"), Scope::Propagated)
            .unwrap()
            .is_none());
    }

    #[test]
    fn self_only_scope_never_inherits() {
        let ontology = ontology();
        let source = source(&[
            evidence("ID1", "tissue", DataType::RnaSeq, Expression, 10.0),
            evidence("ID1", "organ", DataType::Est, Expression, 20.0),
        ]);
        let propagator = Propagator::new(&ontology, &source);
        let gene = GeneId::from("ID1");

        for anat in ["body", "organ", "tissue"] {
            if let Some(call) = propagator
                .propagate::<Presence>(&gene, &cond(anat), Scope::SelfOnly)
                .unwrap()
            {
                assert_eq!(call.origin(), PresenceOrigin::SelfOnly);
                assert!(!call.propagated());
            }
        }
        let organ = propagator
            .propagate::<Presence>(&gene, &cond("organ"), Scope::SelfOnly)
            .unwrap()
            .unwrap();
        assert_eq!(organ.states().len(), 1);
    }

    #[test]
    fn disabled_data_types_are_rejected() {
        let ontology = ontology();
        let source = source(&[evidence("ID1", "tissue", DataType::Est, Expression, 1.0)]);
        let config = EngineConfig::default().with_data_types(&[DataType::RnaSeq]);
        let propagator = Propagator::new(&ontology, &source).with_config(config);

        assert!(matches!(
            propagator.propagate::<Presence>(
                &GeneId::from("ID1"),
                &cond("body"),
                Scope::Propagated,
            ),
            Err(CallError::UnknownDataType(_))
        ));
    }

    #[test]
    fn batch_resolution() {
        let ontology = ontology();
        let source = source(&[
            evidence("ID1", "tissue", DataType::RnaSeq, Expression, 10.0),
            evidence("ID1", "body", DataType::InSitu, NoExpression, 1.0),
            evidence("ID2", "organ", DataType::RnaSeq, Expression, 30.0),
        ]);
        let propagator = Propagator::new(&ontology, &source);
        let requests = vec![
            GeneCondition::new("ID2", cond("body")),
            GeneCondition::new("ID1", cond("organ")),
            GeneCondition::new("ID1", cond("organ")),
            GeneCondition::new("ID2", cond("tissue")),
        ];

        let results = propagator
            .resolve_batch(&requests, Scope::Propagated, &AtomicBool::new(false))
            .unwrap();
        // ID2 has nothing in scope in the tissue, since presence never flows down
        assert_eq!(results.len(), 2);
        let keys: Vec<&GeneCondition> = results.iter().map(ResolvedCall::key).collect();
        assert_eq!(
            keys,
            vec![
                &GeneCondition::new("ID1", cond("organ")),
                &GeneCondition::new("ID2", cond("body")),
            ]
        );

        // presence from the tissue, absence from the body
        let organ = &results[0];
        assert_eq!(organ.presence().unwrap().origin(), PresenceOrigin::Descendant);
        assert_eq!(organ.absence().unwrap().origin(), AbsenceOrigin::Parent);
        assert!(organ.summary().has_conflict());

        // ID2 in the body has the highest rank of the batch
        let body = &results[1];
        assert_eq!(body.summary().rank(), Some(30.0));
        assert!(body.summary().score().unwrap() < organ.summary().score().unwrap());
    }

    #[test]
    fn batch_with_dedicated_pool() {
        let ontology = ontology();
        let source = source(&[evidence("ID1", "tissue", DataType::RnaSeq, Expression, 10.0)]);
        let config = EngineConfig::default().with_num_threads(2);
        let propagator = Propagator::new(&ontology, &source).with_config(config);
        // the pool is built once and reused by every batch
        assert_eq!(
            propagator.pool.as_ref().map(ThreadPool::current_num_threads),
            Some(2)
        );
        let requests: Vec<GeneCondition> = ["body", "organ", "tissue"]
            .iter()
            .map(|anat| GeneCondition::new("ID1", cond(anat)))
            .collect();

        let results = propagator
            .resolve_batch(&requests, Scope::Propagated, &AtomicBool::new(false))
            .unwrap();
        assert_eq!(results.len(), 3);

        let results = propagator
            .resolve_batch(&requests, Scope::SelfOnly, &AtomicBool::new(false))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key().condition(), &cond("tissue"));
    }

    #[test]
    fn cancelled_batch() {
        let ontology = ontology();
        let source = source(&[evidence("ID1", "tissue", DataType::RnaSeq, Expression, 10.0)]);
        let propagator = Propagator::new(&ontology, &source);
        let requests = vec![GeneCondition::new("ID1", cond("body"))];

        assert!(matches!(
            propagator.resolve_batch(&requests, Scope::Propagated, &AtomicBool::new(true)),
            Err(CallError::Cancelled)
        ));
    }

    /// Raises the cancel flag while the basic calls are fetched
    struct CancellingSource<'a> {
        inner: InMemoryCallSource,
        cancel: &'a AtomicBool,
        queries: AtomicUsize,
    }

    impl CallSource for CancellingSource<'_> {
        fn basic_calls_for(
            &self,
            gene: &GeneId,
            conditions: &HashSet<Condition>,
        ) -> CallResult<HashMap<Condition, BasicCall>> {
            self.inner.basic_calls_for(gene, conditions)
        }

        fn basic_calls_for_filter(
            &self,
            filter: &CallFilter,
            conditions: &HashSet<Condition>,
        ) -> CallResult<HashMap<GeneCondition, BasicCall>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.cancel.store(true, Ordering::SeqCst);
            self.inner.basic_calls_for_filter(filter, conditions)
        }
    }

    #[test]
    fn batch_cancelled_between_genes() {
        let ontology = ontology();
        let cancel = AtomicBool::new(false);
        let source = CancellingSource {
            inner: source(&[evidence("ID1", "tissue", DataType::RnaSeq, Expression, 10.0)]),
            cancel: &cancel,
            queries: AtomicUsize::new(0),
        };
        let propagator = Propagator::new(&ontology, &source);
        // a single gene in a single condition is fetched in a single batch
        let requests = vec![GeneCondition::new("ID1", cond("tissue"))];

        assert!(matches!(
            propagator.resolve_batch(&requests, Scope::SelfOnly, &cancel),
            Err(CallError::Cancelled)
        ));
        assert_eq!(source.queries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_batch() {
        let ontology = ontology();
        let source = InMemoryCallSource::new();
        let propagator = Propagator::new(&ontology, &source);
        let results = propagator
            .resolve_batch(&[], Scope::Propagated, &AtomicBool::new(false))
            .unwrap();
        assert!(results.is_empty());
    }
}
