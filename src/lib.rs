//! Core library for the export-docs command line application.
//!
//! The library renders documentation for a data model described by three
//! tabular relations (objects, fields, enum values). IO adapters live under
//! [`io`], the typed schema inside [`model`], the containment tree in
//! [`graph`], the HTML views in [`render`], and the page orchestration in
//! [`bootstrap`]. Fixture validation and workbook sync reuse the same schema.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod graph;
pub mod io;
pub mod logging;
pub mod model;
pub mod render;
pub mod sync;
pub mod validate;

pub use error::{GraphError, LoadError, Result, ToolError};
