use thiserror::Error;

/// Internal failures of the classification pipeline.
///
/// These never cross the public `train`/`predict` boundary: insufficient
/// data degrades to a `false` return or the neutral fallback payload, and
/// only genuine caller bugs (feature arity mismatches) escalate to
/// assertions.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("classifier has not been trained")]
    NotTrained,

    #[error("insufficient data: {got} rows available, {need} required")]
    InsufficientData { need: usize, got: usize },

    #[error("latest bar has no complete feature vector")]
    IncompleteFeatures,

    #[error("indicator computation produced no rows")]
    EmptyIndicators,
}
