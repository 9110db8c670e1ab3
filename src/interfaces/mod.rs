//! Adapters between files and the domain.

pub mod csv;
