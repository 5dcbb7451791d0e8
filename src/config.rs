//! Settings of one deployment of the engine
use tracing::error;

use crate::call::BasicCall;
use crate::data::DataType;
use crate::summary::QualityPolicy;
use crate::{CallError, CallResult, DEFAULT_SCORE_BOUND};

/// Configures the data types, quality tiers and parallelism of the engine
///
/// # Examples
///
/// ```
/// use exprcalls::{DataType, EngineConfig};
///
/// let config = EngineConfig::default()
///     .with_data_types(&[DataType::RnaSeq, DataType::Affymetrix])
///     .with_num_threads(4);
///
/// assert!(config.is_enabled(DataType::RnaSeq));
/// assert!(!config.is_enabled(DataType::Est));
/// assert_eq!(config.num_threads(), Some(4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    data_types: Vec<DataType>,
    quality_policy: QualityPolicy,
    score_bound: f64,
    num_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_types: DataType::ALL.to_vec(),
            quality_policy: QualityPolicy::default(),
            score_bound: DEFAULT_SCORE_BOUND,
            num_threads: None,
        }
    }
}

impl EngineConfig {
    /// Restricts the engine to the given data types
    #[must_use]
    pub fn with_data_types(mut self, data_types: &[DataType]) -> Self {
        let mut data_types = data_types.to_vec();
        data_types.sort();
        data_types.dedup();
        self.data_types = data_types;
        self
    }

    /// Sets the policy to derive the summary quality
    #[must_use]
    pub fn with_quality_policy(mut self, policy: QualityPolicy) -> Self {
        self.quality_policy = policy;
        self
    }

    /// Sets the upper bound of the expression score
    ///
    /// Values that are not finite and positive are ignored.
    #[must_use]
    pub fn with_score_bound(mut self, bound: f64) -> Self {
        if bound.is_finite() && bound > 0.0 {
            self.score_bound = bound;
        }
        self
    }

    /// Uses a dedicated pool of `n` worker threads for batches
    ///
    /// By default, the global rayon pool is used.
    #[must_use]
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n.max(1));
        self
    }

    /// The enabled data types
    pub fn data_types(&self) -> &[DataType] {
        &self.data_types
    }

    /// Returns `true` if the data type is enabled
    pub fn is_enabled(&self, data_type: DataType) -> bool {
        self.data_types.binary_search(&data_type).is_ok()
    }

    /// The policy to derive the summary quality
    pub fn quality_policy(&self) -> &QualityPolicy {
        &self.quality_policy
    }

    /// The upper bound of the expression score
    pub fn score_bound(&self) -> f64 {
        self.score_bound
    }

    /// The number of worker threads for batches, `None` for the global pool
    pub fn num_threads(&self) -> Option<usize> {
        self.num_threads
    }

    /// Checks that the data type is enabled
    ///
    /// # Errors
    ///
    /// [`CallError::UnknownDataType`] if it is not
    pub fn check_data_type(&self, data_type: DataType) -> CallResult<()> {
        if self.is_enabled(data_type) {
            Ok(())
        } else {
            error!("Data type {} is not enabled", data_type);
            Err(CallError::UnknownDataType(data_type.to_string()))
        }
    }

    /// Checks that the call only references enabled data types
    ///
    /// # Errors
    ///
    /// [`CallError::UnknownDataType`] for the first data type that is not enabled
    pub fn check_call(&self, call: &BasicCall) -> CallResult<()> {
        for data_type in call.data_types() {
            self.check_data_type(data_type)?;
        }
        Ok(())
    }
}
