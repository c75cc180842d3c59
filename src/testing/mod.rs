//! Testing utilities
//!
//! Mock agents and observers for exercising the pipeline without real
//! capability implementations.

pub mod mocks;
