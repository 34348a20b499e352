// Market data domain
pub mod market;

// Feature catalog, labels and evaluation metrics
pub mod ml;

// Domain-specific error types
pub mod errors;
