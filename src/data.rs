//! The closed vocabularies of the evidence model
//!
//! - [`DataType`]: the measurement technology that produced the evidence
//! - [`DataState`]: the confidence of the evidence of one data type
//! - [`CallType`]: whether the evidence supports presence or absence of expression
use std::fmt::Display;

use tracing::error;

use crate::{CallError, CallResult};

/// The measurement technology of an evidence record
///
/// The set of data types is closed within one deployment. Use
/// [`crate::EngineConfig`] to restrict it further.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataType {
    /// Affymetrix microarrays
    Affymetrix,
    /// Expressed sequence tags
    Est,
    /// In situ hybridization
    InSitu,
    /// RNA sequencing
    RnaSeq,
}

impl DataType {
    /// All data types, in their canonical order
    pub const ALL: [DataType; 4] = [
        DataType::Affymetrix,
        DataType::Est,
        DataType::InSitu,
        DataType::RnaSeq,
    ];

    /// Returns the canonical name of the data type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Affymetrix => "affymetrix",
            DataType::Est => "est",
            DataType::InSitu => "in_situ",
            DataType::RnaSeq => "rna_seq",
        }
    }
}

impl TryFrom<&str> for DataType {
    type Error = CallError;
    /// Parses the canonical name of a data type
    ///
    /// # Errors
    ///
    /// Returns [`CallError::UnknownDataType`] if the name is not known
    ///
    /// # Examples
    ///
    /// ```
    /// use exprcalls::DataType;
    ///
    /// assert_eq!(DataType::try_from("rna_seq").unwrap(), DataType::RnaSeq);
    /// assert!(DataType::try_from("proteomics").is_err());
    /// ```
    fn try_from(value: &str) -> CallResult<Self> {
        match value {
            "affymetrix" => Ok(DataType::Affymetrix),
            "est" => Ok(DataType::Est),
            "in_situ" => Ok(DataType::InSitu),
            "rna_seq" => Ok(DataType::RnaSeq),
            _ => {
                error!("Unknown data type: {}", value);
                Err(CallError::UnknownDataType(value.to_string()))
            }
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The confidence tier of the evidence of one data type
///
/// `NoData < LowQuality < HighQuality`. Merging two states keeps the higher one,
/// so the states form a join-semilattice with [`DataState::join`].
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataState {
    /// Nothing was observed
    #[default]
    NoData,
    /// Observed with low confidence
    LowQuality,
    /// Observed with high confidence
    HighQuality,
}

impl DataState {
    /// Returns the higher of both states
    #[must_use]
    pub fn join(self, other: DataState) -> DataState {
        std::cmp::max(self, other)
    }

    /// Returns `true` if the state carries any information
    pub fn is_observed(&self) -> bool {
        *self > DataState::NoData
    }
}

impl Display for DataState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataState::NoData => write!(f, "no data"),
            DataState::LowQuality => write!(f, "low quality"),
            DataState::HighQuality => write!(f, "high quality"),
        }
    }
}

/// The polarity of an evidence record
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum CallType {
    /// The evidence supports expression of the gene
    Expression,
    /// The evidence supports absence of expression
    NoExpression,
}
