use std::fmt::Display;
use std::hash::Hash;

use crate::data::CallType;

/// How a [`crate::GlobalCall`] was derived
///
/// This is the general provenance tag, used when calls of both directions
/// are reported together. Propagation itself only ever produces the
/// direction specific [`PresenceOrigin`] and [`AbsenceOrigin`], so a
/// `Parent` presence call or a `Descendant` absence call cannot be built.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum OriginOfLine {
    /// Only observed directly in the condition
    SelfOnly,
    /// Only inferred from more specific conditions
    Descendant,
    /// Only inferred from less specific conditions
    Parent,
    /// Observed directly and inferred through propagation
    Both,
}

impl Display for OriginOfLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginOfLine::SelfOnly => write!(f, "SELF"),
            OriginOfLine::Descendant => write!(f, "DESCENDANT"),
            OriginOfLine::Parent => write!(f, "PARENT"),
            OriginOfLine::Both => write!(f, "BOTH"),
        }
    }
}

/// Provenance of a presence call
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum PresenceOrigin {
    /// Only observed directly in the condition
    SelfOnly,
    /// Only inferred from descendant conditions
    Descendant,
    /// Observed directly and inferred from descendant conditions
    Both,
}

impl From<PresenceOrigin> for OriginOfLine {
    fn from(origin: PresenceOrigin) -> Self {
        match origin {
            PresenceOrigin::SelfOnly => OriginOfLine::SelfOnly,
            PresenceOrigin::Descendant => OriginOfLine::Descendant,
            PresenceOrigin::Both => OriginOfLine::Both,
        }
    }
}

/// Provenance of an absence call
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum AbsenceOrigin {
    /// Only observed directly in the condition
    SelfOnly,
    /// Only inferred from ancestor conditions
    Parent,
    /// Observed directly and inferred from ancestor conditions
    Both,
}

impl From<AbsenceOrigin> for OriginOfLine {
    fn from(origin: AbsenceOrigin) -> Self {
        match origin {
            AbsenceOrigin::SelfOnly => OriginOfLine::SelfOnly,
            AbsenceOrigin::Parent => OriginOfLine::Parent,
            AbsenceOrigin::Both => OriginOfLine::Both,
        }
    }
}

/// The closure of a condition that evidence may be inherited from
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Closure {
    /// All more specific conditions
    Descendants,
    /// All less specific conditions
    Ancestors,
}

/// The direction in which evidence propagates through the ontology
///
/// There are exactly two implementations, [`Presence`] and [`Absence`].
/// Each one fixes the polarity of the evidence it consumes, the closure
/// it inherits from and the provenance tags it can produce.
pub trait Direction: private::Sealed + Copy + Send + Sync + 'static {
    /// The provenance tag of calls built in this direction
    type Origin: Copy + Eq + Hash + std::fmt::Debug + Into<OriginOfLine> + Send + Sync;

    /// The polarity of the evidence that propagates
    const CALL_TYPE: CallType;

    /// The conditions evidence is inherited from
    const CLOSURE: Closure;

    /// Returns the provenance tag for the given contributions
    ///
    /// Returns `None` if nothing contributed.
    fn origin(observed: bool, inherited: bool) -> Option<Self::Origin>;
}

/// Presence of expression propagates from descendants to ancestors
///
/// "Expressed in a substructure" supports "expressed in the containing structure".
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Presence;

/// Absence of expression propagates from ancestors to descendants
///
/// "Not expressed in a structure" supports "not expressed in its substructures".
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Absence;

impl Direction for Presence {
    type Origin = PresenceOrigin;
    const CALL_TYPE: CallType = CallType::Expression;
    const CLOSURE: Closure = Closure::Descendants;

    fn origin(observed: bool, inherited: bool) -> Option<PresenceOrigin> {
        match (observed, inherited) {
            (true, false) => Some(PresenceOrigin::SelfOnly),
            (false, true) => Some(PresenceOrigin::Descendant),
            (true, true) => Some(PresenceOrigin::Both),
            (false, false) => None,
        }
    }
}

impl Direction for Absence {
    type Origin = AbsenceOrigin;
    const CALL_TYPE: CallType = CallType::NoExpression;
    const CLOSURE: Closure = Closure::Ancestors;

    fn origin(observed: bool, inherited: bool) -> Option<AbsenceOrigin> {
        match (observed, inherited) {
            (true, false) => Some(AbsenceOrigin::SelfOnly),
            (false, true) => Some(AbsenceOrigin::Parent),
            (true, true) => Some(AbsenceOrigin::Both),
            (false, false) => None,
        }
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Presence {}
    impl Sealed for super::Absence {}
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn presence_never_has_parent_origin() {
        for observed in [true, false] {
            for inherited in [true, false] {
                if let Some(origin) = Presence::origin(observed, inherited) {
                    assert_ne!(OriginOfLine::from(origin), OriginOfLine::Parent);
                }
            }
        }
    }

    #[test]
    fn absence_never_has_descendant_origin() {
        for observed in [true, false] {
            for inherited in [true, false] {
                if let Some(origin) = Absence::origin(observed, inherited) {
                    assert_ne!(OriginOfLine::from(origin), OriginOfLine::Descendant);
                }
            }
        }
    }

    #[test]
    fn origin_tags() {
        assert_eq!(Presence::origin(false, true), Some(PresenceOrigin::Descendant));
        assert_eq!(Absence::origin(false, true), Some(AbsenceOrigin::Parent));
        assert_eq!(Absence::origin(true, true), Some(AbsenceOrigin::Both));
        assert!(Presence::origin(false, false).is_none());
        assert_eq!(OriginOfLine::Parent.to_string(), "PARENT");
    }
}
