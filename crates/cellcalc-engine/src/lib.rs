//! cellcalc_engine - Formula scanning, compilation, evaluation and dependency tracking.

pub mod engine;
