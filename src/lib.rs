//! nodedocs: build a cross-referenced documentation site for a visual
//! scripting node library.
//!
//! The pipeline runs in three phases:
//!
//! - **generate**: walk a [`source::catalog::SourceCatalog`] and write one
//!   intermediate document per node, class, struct, enum and delegate, plus
//!   an index ([`generate::Generator`]).
//! - **consolidate**: resolve the index and the intermediate documents into
//!   one aggregate ([`consolidate::consolidate`]).
//! - **build**: hand the aggregate to the external converter and site
//!   builder ([`toolchain::Toolchain`]).

pub mod config;
pub mod consolidate;
pub mod entity;
pub mod error;
pub mod generate;
pub mod render;
pub mod serialize;
pub mod source;
pub mod toolchain;
pub mod tree;
