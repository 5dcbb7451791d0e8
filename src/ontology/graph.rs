use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::condition::{AnatEntityId, Condition, SpeciesId, StageId};
use crate::ontology::{ConditionOntology, Hierarchy};
use crate::{CallError, CallResult};

/// An in-memory [`ConditionOntology`]
///
/// The graph knows a fixed set of conditions. A condition `a` is an ancestor
/// of condition `b` if both are of the same species, the anatomical entity of
/// `a` is the same as or an ancestor of the entity of `b`, the stage of `a` is
/// the same as or an ancestor of the stage of `b`, and `a != b`.
///
/// # Examples
///
/// ```
/// use exprcalls::ontology::{ConditionGraph, ConditionOntology, HierarchyBuilder, Relation};
/// use exprcalls::{AnatEntityId, Condition, StageId};
///
/// let mut anatomy = HierarchyBuilder::<AnatEntityId>::new();
/// anatomy.add_term("brain");
/// anatomy.add_term("forebrain");
/// let mut anatomy = anatomy.terms_complete();
/// anatomy.add_parent("forebrain", "brain", Relation::PartOf).unwrap();
///
/// let mut stages = HierarchyBuilder::<StageId>::new();
/// stages.add_term("adult");
/// let stages = stages.terms_complete();
///
/// let brain = Condition::new("brain", "adult", 9606u32);
/// let forebrain = Condition::new("forebrain", "adult", 9606u32);
///
/// let graph = ConditionGraph::new(
///     anatomy.build().unwrap(),
///     stages.build().unwrap(),
///     vec![brain.clone(), forebrain.clone()],
/// ).unwrap();
///
/// assert!(graph.ancestors_of(&forebrain).unwrap().contains(&brain));
/// assert!(graph.descendants_of(&brain).unwrap().contains(&forebrain));
/// ```
#[derive(Debug)]
pub struct ConditionGraph {
    anatomy: Hierarchy<AnatEntityId>,
    stages: Hierarchy<StageId>,
    conditions: HashMap<SpeciesId, Vec<Condition>>,
    known: HashSet<Condition>,
}

impl ConditionGraph {
    /// Constructs a new `ConditionGraph` from both hierarchies and all known conditions
    ///
    /// # Errors
    ///
    /// [`CallError::DoesNotExist`] if a condition references an anatomical
    /// entity or stage that is not part of the hierarchies
    pub fn new<I: IntoIterator<Item = Condition>>(
        anatomy: Hierarchy<AnatEntityId>,
        stages: Hierarchy<StageId>,
        conditions: I,
    ) -> CallResult<Self> {
        let mut by_species: HashMap<SpeciesId, Vec<Condition>> = HashMap::new();
        let mut known = HashSet::new();
        for condition in conditions {
            if !anatomy.contains(condition.anat_entity()) {
                return Err(CallError::DoesNotExist(condition.anat_entity().to_string()));
            }
            if !stages.contains(condition.stage()) {
                return Err(CallError::DoesNotExist(condition.stage().to_string()));
            }
            if known.insert(condition.clone()) {
                by_species
                    .entry(condition.species())
                    .or_default()
                    .push(condition);
            }
        }
        Ok(Self {
            anatomy,
            stages,
            conditions: by_species,
            known,
        })
    }

    /// The anatomical hierarchy
    pub fn anatomy(&self) -> &Hierarchy<AnatEntityId> {
        &self.anatomy
    }

    /// The developmental stage hierarchy
    pub fn stages(&self) -> &Hierarchy<StageId> {
        &self.stages
    }

    /// Returns `true` if the condition is known to the graph
    pub fn contains(&self, condition: &Condition) -> bool {
        self.known.contains(condition)
    }

    /// Iterates all known conditions
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.values().flatten()
    }

    fn known(&self, condition: &Condition) -> CallResult<&[Condition]> {
        match self.conditions.get(&condition.species()) {
            Some(conditions) if self.known.contains(condition) => Ok(conditions),
            _ => Err(CallError::DoesNotExist(condition.to_string())),
        }
    }

    /// Collects all known conditions of the same species whose anatomical entity
    /// and stage are part of the given closures (or equal to the condition's own)
    fn related(
        &self,
        condition: &Condition,
        anat_entities: &HashSet<AnatEntityId>,
        stages: &HashSet<StageId>,
    ) -> CallResult<HashSet<Condition>> {
        let res: HashSet<Condition> = self
            .known(condition)?
            .iter()
            .filter(|other| *other != condition)
            .filter(|other| {
                other.anat_entity() == condition.anat_entity()
                    || anat_entities.contains(other.anat_entity())
            })
            .filter(|other| {
                other.stage() == condition.stage() || stages.contains(other.stage())
            })
            .cloned()
            .collect();
        trace!("{} related conditions of {}", res.len(), condition);
        Ok(res)
    }
}

impl ConditionOntology for ConditionGraph {
    fn ancestors_of(&self, condition: &Condition) -> CallResult<HashSet<Condition>> {
        let anat_entities = self.anatomy.ancestors(condition.anat_entity())?;
        let stages = self.stages.ancestors(condition.stage())?;
        self.related(condition, anat_entities, stages)
    }

    fn descendants_of(&self, condition: &Condition) -> CallResult<HashSet<Condition>> {
        let anat_entities = self.anatomy.descendants(condition.anat_entity())?;
        let stages = self.stages.descendants(condition.stage())?;
        self.related(condition, &anat_entities, &stages)
    }
}
