//! Domain types for Trustgate.
//!
//! This module contains the core value objects flowing through the pipeline.

mod check;
mod decision;
mod run;
mod score;

pub use check::*;
pub use decision::*;
pub use run::*;
pub use score::*;
