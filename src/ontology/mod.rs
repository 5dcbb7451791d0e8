//! The ontology closure of conditions
//!
//! Evidence propagates between conditions that are connected in the
//! anatomical and developmental hierarchies. The engine only needs the
//! transitive closure of a condition, provided through the
//! [`ConditionOntology`] trait.
//!
//! [`ConditionGraph`] is an in-memory implementation, built from an anatomy
//! [`Hierarchy`] and a developmental stage [`Hierarchy`].
use std::collections::HashSet;

use tracing::error;

use crate::call::Closure;
use crate::condition::Condition;
use crate::{CallError, CallResult};

mod graph;
mod hierarchy;

pub use graph::ConditionGraph;
pub use hierarchy::{AllTerms, Hierarchy, HierarchyBuilder, LooseTerms, Relation};

/// Provides the transitive closure of conditions in the ontology
///
/// Implementations must only return the closure along hierarchical relations
/// and must never report cycles. The engine rejects closures that contain the
/// queried condition itself.
pub trait ConditionOntology {
    /// Returns all conditions that are less specific than `condition`
    ///
    /// # Errors
    ///
    /// Implementation specific, e.g. if the condition is not known
    fn ancestors_of(&self, condition: &Condition) -> CallResult<HashSet<Condition>>;

    /// Returns all conditions that are more specific than `condition`
    ///
    /// # Errors
    ///
    /// Implementation specific, e.g. if the condition is not known
    fn descendants_of(&self, condition: &Condition) -> CallResult<HashSet<Condition>>;

    /// Returns the requested closure of `condition`
    ///
    /// # Errors
    ///
    /// - [`CallError::CyclicOntology`] if the closure contains `condition` itself
    /// - any error of [`ConditionOntology::ancestors_of`] or [`ConditionOntology::descendants_of`]
    fn closure(&self, condition: &Condition, closure: Closure) -> CallResult<HashSet<Condition>> {
        let conditions = match closure {
            Closure::Ancestors => self.ancestors_of(condition)?,
            Closure::Descendants => self.descendants_of(condition)?,
        };
        if conditions.contains(condition) {
            error!("{} is part of its own {:?} closure", condition, closure);
            return Err(CallError::CyclicOntology(condition.to_string()));
        }
        Ok(conditions)
    }
}

/// Checks that the ancestor and descendant closures of a condition are consistent
///
/// # Errors
///
/// [`CallError::CyclicOntology`] if the condition is part of its own closure
/// or if a condition is both ancestor and descendant
pub fn validate_closure(
    condition: &Condition,
    ancestors: &HashSet<Condition>,
    descendants: &HashSet<Condition>,
) -> CallResult<()> {
    if ancestors.contains(condition) || descendants.contains(condition) {
        error!("{} is part of its own closure", condition);
        return Err(CallError::CyclicOntology(condition.to_string()));
    }
    if let Some(both) = ancestors.intersection(descendants).next() {
        error!("{} is both ancestor and descendant of {}", both, condition);
        return Err(CallError::CyclicOntology(both.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn cond(anat: &str) -> Condition {
        Condition::new(anat, "Stage_id1", 1u32)
    }

    #[test]
    fn valid_closure() {
        let ancestors = HashSet::from([cond("root")]);
        let descendants = HashSet::from([cond("leaf")]);
        assert!(validate_closure(&cond("mid"), &ancestors, &descendants).is_ok());
        assert!(validate_closure(&cond("mid"), &HashSet::new(), &HashSet::new()).is_ok());
    }

    #[test]
    fn closure_with_itself() {
        let ancestors = HashSet::from([cond("mid")]);
        assert!(matches!(
            validate_closure(&cond("mid"), &ancestors, &HashSet::new()),
            Err(CallError::CyclicOntology(_))
        ));
    }

    #[test]
    fn closure_overlap() {
        let ancestors = HashSet::from([cond("root"), cond("other")]);
        let descendants = HashSet::from([cond("leaf"), cond("other")]);
        assert!(matches!(
            validate_closure(&cond("mid"), &ancestors, &descendants),
            Err(CallError::CyclicOntology(_))
        ));
    }

    struct SelfReferencing;

    impl ConditionOntology for SelfReferencing {
        fn ancestors_of(&self, condition: &Condition) -> CallResult<HashSet<Condition>> {
            Ok(HashSet::from([condition.clone()]))
        }
        fn descendants_of(&self, _: &Condition) -> CallResult<HashSet<Condition>> {
            Ok(HashSet::new())
        }
    }

    #[test]
    fn closure_rejects_self_reference() {
        let ontology = SelfReferencing;
        assert!(ontology.closure(&cond("a"), Closure::Descendants).unwrap().is_empty());
        assert!(matches!(
            ontology.closure(&cond("a"), Closure::Ancestors),
            Err(CallError::CyclicOntology(_))
        ));
    }
}
