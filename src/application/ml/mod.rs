pub mod classifier;
pub mod forest;
pub mod scaler;

pub use classifier::MovementClassifier;
