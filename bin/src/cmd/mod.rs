//! CLI subcommand modules.
//!
//! This module contains the implementations for all hsi CLI subcommands.

pub(crate) mod panel;
pub(crate) mod run;
pub(crate) mod schemas;
