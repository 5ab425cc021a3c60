//! storebind-lib: Core types and logic for storebind
//!
//! This crate provides the building blocks for binding application state to a
//! namespaced key-value store:
//! - `Binding`: a declarative link between one JSON value and its store entry
//! - `StorageBackend`: the store contract, with in-memory and file-backed impls
//! - `path`: dotted-path splitting, nesting, and extraction
//! - `WrapRegistry`: named conversion strategies applied to values on read

pub mod binding;
pub mod path;
pub mod store;
pub mod wrap;
