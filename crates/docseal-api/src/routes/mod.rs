//! Route modules, one per API surface.

pub mod certificates;
pub mod documents;
