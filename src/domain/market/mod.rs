pub mod bar;
pub mod indicators;
