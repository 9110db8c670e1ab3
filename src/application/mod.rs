//! Orchestration over the domain: importing a batch and reporting on what was
//! persisted.

pub mod report;
pub mod service;
