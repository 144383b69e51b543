//! End-to-end autofill harness for a password-manager browser extension.
//!
//! Pages are described as [`spec::spec_model::PageTest`] descriptors, the
//! vault is seeded from them, and [`spec::runner::PageTestRunner`] drives each
//! test kind through a [`browser::driver::PageDriver`].

pub mod artifacts;
pub mod browser;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod extension;
pub mod flags;
pub mod report;
pub mod spec;
pub mod vault;
