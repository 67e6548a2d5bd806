//! # oxide-repo
//!
//! Entity repositories on top of `oxide-repo-core`.
//!
//! A [`Repository`] binds a dialect and its type mappings. From it you
//! obtain typed builders for queries, bulk updates and deletes, per-entity
//! [`EntitySet`]s, and schema creation and upgrade. Statements run through
//! a [`StatementExecutor`] the backend provides, so the same repository
//! works over a pooled connection or an open transaction.
//!
//! ## Features
//!
//! - **Typed queries**: conditions are built from an entity's `const`
//!   fields and only accept operands of the field's type
//! - **Prepared queries**: compile once, run as list, count, first or
//!   single
//! - **Schema upgrades**: introspect, plan and apply, with destructive
//!   steps logged as warnings

pub mod entity;
pub mod entity_set;
pub mod error;
pub mod executor;
pub mod query;
pub mod repository;
pub mod row;
pub mod update;

pub use entity::Entity;
pub use entity_set::EntitySet;
pub use error::{RepoError, Result};
pub use executor::{SchemaIntrospector, StatementExecutor};
pub use query::{EntityIter, MapQuery, Query, QueryBuilder};
pub use repository::Repository;
pub use row::Row;
pub use update::{DeleteBuilder, DeleteQuery, UpdateBuilder, UpdateQuery};
