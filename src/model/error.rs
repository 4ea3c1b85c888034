use crate::model::sarima::SarimaOrder;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Empty input series")]
    EmptyData,

    #[error("Insufficient data for {order}: need at least {needed}, got {got}")]
    InsufficientData {
        order: SarimaOrder,
        needed: usize,
        got: usize,
    },

    #[error("Regressor length mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Expected {expected} regressors, got {got}")]
    RegressorCount { expected: usize, got: usize },

    #[error("Input contains missing or non-finite values")]
    NonFinite,

    #[error("Regression normal equations are not positive definite")]
    SingularDesign,

    #[error("Fit of {0} produced a non-finite likelihood")]
    NonFiniteFit(SarimaOrder),

    #[error("None of the {0} SARIMA candidates could be fitted")]
    NoCandidate(usize),

    #[error("Hold-out of {horizon} months needs a longer history than {observed} observed months")]
    HoldoutTooLong { horizon: usize, observed: usize },

    #[error("Frame has no observed target values")]
    NoObservations,

    #[error("Unknown feature column '{0}'")]
    UnknownFeature(String),
}
