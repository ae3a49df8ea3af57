//! Command implementations for each file format

pub mod generate;
pub mod lz;
pub mod narc;
pub mod patch;
pub mod rom;
