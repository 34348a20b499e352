// Movement classification pipeline
pub mod ml;
