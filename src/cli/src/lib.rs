//! Conduct CLI - client for the ConductR control API and bundle tooling.

pub mod commands;
pub mod control;
pub mod output;
