//! qmlbridge-lib: CommonJS to QML JavaScript build engine.
//!
//! This crate rewrites trees of CommonJS-style sources into `.pragma library`
//! files that QML's static `.import` mechanism can load:
//! - `resolve`: classifies `require()` specifiers (sibling files, `node_modules`
//!   packages, registered QML modules)
//! - `rewrite`: rewrites require/export forms and emits the module wrapper
//! - `graph`: project-wide dependency graph with cycle detection
//! - `cache`: persisted per-file dependency and global data
//! - `build`: build units and the session that orchestrates them

pub mod build;
pub mod cache;
pub mod config;
pub mod consts;
pub mod error;
pub mod graph;
pub mod lower;
pub mod manifest;
pub mod resolve;
pub mod rewrite;
pub mod util;

pub use build::{BuildReport, Session};
pub use config::BuildOptions;
pub use error::BuildError;
