//! Identifiers of genes and of the conditions in which they are observed
//!
//! A [`Condition`] describes *where and when* a gene is observed: an anatomical
//! entity, a developmental stage and the species. Together with the gene it
//! forms the [`GeneCondition`], the unit of every call in this crate.
use core::fmt::Debug;
use std::fmt::Display;
use std::sync::Arc;

use crate::{CallError, CallResult};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name {
            inner: Arc<str>,
        }

        impl $name {
            /// Returns the identifier as `&str`
            pub fn as_str(&self) -> &str {
                &self.inner
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self { inner: Arc::from(s) }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self { inner: Arc::from(s) }
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", $label, self.inner)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.inner)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.inner == other
            }
        }
    };
}

string_id!(
    /// A unique identifier of a gene, e.g. an Ensembl gene id
    GeneId,
    "GeneId"
);

string_id!(
    /// A unique identifier of an anatomical entity, e.g. `UBERON:0000955`
    AnatEntityId,
    "AnatEntityId"
);

string_id!(
    /// A unique identifier of a developmental stage, e.g. `HsapDv:0000087`
    StageId,
    "StageId"
);

/// The NCBI taxonomy id of a species
#[derive(Clone, Copy, Default, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpeciesId {
    inner: u32,
}

impl SpeciesId {
    /// Returns the integer representation of the species id
    pub fn as_u32(&self) -> u32 {
        self.inner
    }
}

impl From<u32> for SpeciesId {
    fn from(inner: u32) -> Self {
        Self { inner }
    }
}

impl TryFrom<&str> for SpeciesId {
    type Error = CallError;
    fn try_from(value: &str) -> CallResult<Self> {
        Ok(Self {
            inner: value.parse::<u32>()?,
        })
    }
}

impl Display for SpeciesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NCBITaxon:{}", self.inner)
    }
}

/// The anatomical entity, developmental stage and species in which
/// a gene is observed
///
/// Two conditions are equal if and only if all three parts are equal.
///
/// # Examples
///
/// ```
/// use exprcalls::Condition;
///
/// let brain = Condition::new("UBERON:0000955", "HsapDv:0000087", 9606u32);
/// let same = Condition::new("UBERON:0000955", "HsapDv:0000087", 9606u32);
/// let mouse = Condition::new("UBERON:0000955", "HsapDv:0000087", 10090u32);
///
/// assert_eq!(brain, same);
/// assert_ne!(brain, mouse);
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Condition {
    anat_entity: AnatEntityId,
    stage: StageId,
    species: SpeciesId,
}

impl Condition {
    /// Constructs a new [`Condition`]
    pub fn new<A, S, T>(anat_entity: A, stage: S, species: T) -> Self
    where
        A: Into<AnatEntityId>,
        S: Into<StageId>,
        T: Into<SpeciesId>,
    {
        Self {
            anat_entity: anat_entity.into(),
            stage: stage.into(),
            species: species.into(),
        }
    }

    /// The anatomical entity of the condition
    pub fn anat_entity(&self) -> &AnatEntityId {
        &self.anat_entity
    }

    /// The developmental stage of the condition
    pub fn stage(&self) -> &StageId {
        &self.stage
    }

    /// The species of the condition
    pub fn species(&self) -> SpeciesId {
        self.species
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}|{}", self.anat_entity, self.stage, self.species)
    }
}

/// A gene in one [`Condition`]
///
/// This is the key of every `BasicCall` and `GlobalCall`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GeneCondition {
    gene: GeneId,
    condition: Condition,
}

impl GeneCondition {
    /// Constructs a new [`GeneCondition`]
    pub fn new<G: Into<GeneId>>(gene: G, condition: Condition) -> Self {
        Self {
            gene: gene.into(),
            condition,
        }
    }

    /// The gene
    pub fn gene(&self) -> &GeneId {
        &self.gene
    }

    /// The condition
    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

impl Display for GeneCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in {}", self.gene, self.condition)
    }
}
