use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::marker::PhantomData;

use tracing::{debug, error, trace};

use crate::{CallError, CallResult, DEFAULT_NUM_PARENTS};

/// The type of an edge between a term and its parent
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Relation {
    /// The term is a subtype of the parent
    IsA,
    /// The term is a part of the parent
    PartOf,
    /// The term develops from the parent
    ///
    /// Stored, but not used for propagation
    DevelopsFrom,
}

impl Relation {
    /// Returns `true` if evidence can propagate along the relation
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, Relation::IsA | Relation::PartOf)
    }
}

/// Builder state: terms can be added
pub struct LooseTerms;
/// Builder state: all terms are added, terms can be connected
pub struct AllTerms;

#[derive(Debug)]
struct TermInternal<T> {
    parents: Vec<(T, Relation)>,
}

impl<T> Default for TermInternal<T> {
    fn default() -> Self {
        Self {
            parents: Vec::with_capacity(DEFAULT_NUM_PARENTS),
        }
    }
}

/// Builds a [`Hierarchy`]
///
/// All terms must be added first, only then can they be connected
/// to their parents:
///
/// ```
/// use exprcalls::ontology::{HierarchyBuilder, Relation};
/// use exprcalls::AnatEntityId;
///
/// let mut builder = HierarchyBuilder::<AnatEntityId>::new();
/// builder.add_term("UBERON:0000955");
/// builder.add_term("UBERON:0001893");
///
/// let mut builder = builder.terms_complete();
/// builder.add_parent("UBERON:0001893", "UBERON:0000955", Relation::PartOf).unwrap();
///
/// let anatomy = builder.build().unwrap();
/// let brain = AnatEntityId::from("UBERON:0000955");
/// let ancestors = anatomy.ancestors(&"UBERON:0001893".into()).unwrap();
/// assert!(ancestors.contains(&brain));
/// ```
pub struct HierarchyBuilder<T, S = LooseTerms> {
    terms: HashMap<T, TermInternal<T>>,
    state: PhantomData<S>,
}

impl<T: Clone + Eq + Hash + Display> HierarchyBuilder<T, LooseTerms> {
    /// Constructs a new, empty builder
    pub fn new() -> Self {
        Self {
            terms: HashMap::new(),
            state: PhantomData,
        }
    }

    /// Adds a term to the hierarchy
    ///
    /// Adding a term twice has no effect.
    pub fn add_term<I: Into<T>>(&mut self, id: I) {
        if let Entry::Vacant(entry) = self.terms.entry(id.into()) {
            entry.insert(TermInternal::default());
        }
    }

    /// Ends adding terms and allows connecting them
    #[must_use]
    pub fn terms_complete(self) -> HierarchyBuilder<T, AllTerms> {
        HierarchyBuilder {
            terms: self.terms,
            state: PhantomData,
        }
    }
}

impl<T: Clone + Eq + Hash + Display> Default for HierarchyBuilder<T, LooseTerms> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash + Display> HierarchyBuilder<T, AllTerms> {
    /// Connects a term to its parent term
    ///
    /// # Errors
    ///
    /// [`CallError::DoesNotExist`] if one of the terms was not added before
    pub fn add_parent<I: Into<T>, J: Into<T>>(
        &mut self,
        child_id: I,
        parent_id: J,
        relation: Relation,
    ) -> CallResult<()> {
        let parent_id = parent_id.into();
        if !self.terms.contains_key(&parent_id) {
            return Err(CallError::DoesNotExist(parent_id.to_string()));
        }
        let child_id = child_id.into();
        let child = self
            .terms
            .get_mut(&child_id)
            .ok_or_else(|| CallError::DoesNotExist(child_id.to_string()))?;
        child.parents.push((parent_id, relation));
        Ok(())
    }

    /// Caches the direct and indirect parents and children of every term
    ///
    /// Only [hierarchical](`Relation::is_hierarchical`) relations are followed.
    ///
    /// # Errors
    ///
    /// [`CallError::CyclicOntology`] if a term is its own ancestor
    pub fn build(self) -> CallResult<Hierarchy<T>> {
        let mut cache = AncestorCache {
            terms: &self.terms,
            all_parents: HashMap::with_capacity(self.terms.len()),
            in_progress: HashSet::new(),
        };
        for id in self.terms.keys() {
            cache.all_parents_of(id)?;
        }
        let all_parents = cache.all_parents;

        let mut all_children: HashMap<T, HashSet<T>> = HashMap::with_capacity(self.terms.len());
        for (id, parents) in &all_parents {
            for parent in parents {
                all_children
                    .entry(parent.clone())
                    .or_default()
                    .insert(id.clone());
            }
        }
        debug!("Built hierarchy of {} terms", self.terms.len());

        let parents = self
            .terms
            .into_iter()
            .map(|(id, term)| (id, term.parents))
            .collect();

        Ok(Hierarchy {
            parents,
            all_parents,
            all_children,
        })
    }
}

/// Recursively collects and caches the transitive parents of terms
///
/// The recursion bubbles up to the root terms and caches the parents of every
/// term on the way back down. A term that is reached again while its own
/// parents are still being collected is part of a cycle.
struct AncestorCache<'a, T> {
    terms: &'a HashMap<T, TermInternal<T>>,
    all_parents: HashMap<T, HashSet<T>>,
    in_progress: HashSet<T>,
}

impl<T: Clone + Eq + Hash + Display> AncestorCache<'_, T> {
    fn all_parents_of(&mut self, id: &T) -> CallResult<&HashSet<T>> {
        if !self.all_parents.contains_key(id) {
            self.create_cache(id)?;
        }
        self.all_parents
            .get(id)
            .ok_or_else(|| CallError::DoesNotExist(id.to_string()))
    }

    fn create_cache(&mut self, id: &T) -> CallResult<()> {
        if !self.in_progress.insert(id.clone()) {
            error!("Cycle in hierarchy at {}", id);
            return Err(CallError::CyclicOntology(id.to_string()));
        }
        let terms = self.terms;
        let term = terms
            .get(id)
            .ok_or_else(|| CallError::DoesNotExist(id.to_string()))?;

        let mut res = HashSet::new();
        for (parent, relation) in &term.parents {
            if !relation.is_hierarchical() {
                trace!("Skipping {:?} relation of {} to {}", relation, id, parent);
                continue;
            }
            res.insert(parent.clone());
            for grandparent in self.all_parents_of(parent)? {
                res.insert(grandparent.clone());
            }
        }
        if res.contains(id) {
            error!("{} is its own ancestor", id);
            return Err(CallError::CyclicOntology(id.to_string()));
        }

        self.in_progress.remove(id);
        self.all_parents.insert(id.clone(), res);
        Ok(())
    }
}

/// An immutable, acyclic hierarchy of terms, e.g. anatomical entities
/// or developmental stages
///
/// The transitive closure of every term is cached on construction.
#[derive(Debug)]
pub struct Hierarchy<T> {
    parents: HashMap<T, Vec<(T, Relation)>>,
    all_parents: HashMap<T, HashSet<T>>,
    all_children: HashMap<T, HashSet<T>>,
}

impl<T: Clone + Eq + Hash + Display> Hierarchy<T> {
    /// Returns the number of terms
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns `true` if the hierarchy has no terms
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns `true` if the term is part of the hierarchy
    pub fn contains(&self, id: &T) -> bool {
        self.parents.contains_key(id)
    }

    /// Returns the direct parents of the term, with their relation
    ///
    /// # Errors
    ///
    /// [`CallError::DoesNotExist`] if the term is not part of the hierarchy
    pub fn parents(&self, id: &T) -> CallResult<&[(T, Relation)]> {
        self.parents
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| CallError::DoesNotExist(id.to_string()))
    }

    /// Returns all direct and indirect parents of the term
    ///
    /// # Errors
    ///
    /// [`CallError::DoesNotExist`] if the term is not part of the hierarchy
    pub fn ancestors(&self, id: &T) -> CallResult<&HashSet<T>> {
        self.all_parents
            .get(id)
            .ok_or_else(|| CallError::DoesNotExist(id.to_string()))
    }

    /// Returns all direct and indirect children of the term
    ///
    /// # Errors
    ///
    /// [`CallError::DoesNotExist`] if the term is not part of the hierarchy
    pub fn descendants(&self, id: &T) -> CallResult<HashSet<T>> {
        if !self.contains(id) {
            return Err(CallError::DoesNotExist(id.to_string()));
        }
        Ok(self.all_children.get(id).cloned().unwrap_or_default())
    }
}
