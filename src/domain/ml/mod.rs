pub mod feature_registry;
pub mod metrics;
pub mod movement;
