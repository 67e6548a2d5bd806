//! # oxide-repo-core
//!
//! Backend-neutral core of the oxide-repo object mapper.
//!
//! This crate provides:
//! - Static entity metadata and typed field handles
//! - Immutable condition trees with a visitor for backend translation
//! - Query specifications and a SQL compiler with pluggable dialects
//! - A type mapping registry shared by compilation and DDL
//! - A schema model, differ and migration planner
//!
//! Nothing here talks to a database; executors live in backend crates.
//!
//! ## Compiling a query
//!
//! ```rust
//! use oxide_repo_core::compiler::SqlCompiler;
//! use oxide_repo_core::dialect::GenericDialect;
//! use oxide_repo_core::field::{EntityType, Field};
//! use oxide_repo_core::meta::{EntityMeta, FieldMeta, FieldType};
//! use oxide_repo_core::query::QuerySpec;
//!
//! struct User;
//!
//! const NAME: FieldMeta = FieldMeta::new("name", FieldType::Text);
//! const USER: EntityMeta = EntityMeta::new("User", "users", &[NAME]);
//!
//! impl EntityType for User {
//!     const META: &'static EntityMeta = &USER;
//! }
//!
//! const USER_NAME: Field<User, String> = Field::new(&NAME);
//!
//! let mut spec = QuerySpec::new(User::META);
//! spec.add_predicate(USER_NAME.contains("John").into_condition());
//! spec.set_limit(10).unwrap();
//!
//! let dialect = GenericDialect::new();
//! let stmt = SqlCompiler::new(&dialect).select(&spec).unwrap();
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT \"name\" FROM \"users\" WHERE \"name\" LIKE ? FETCH FIRST 10 ROWS ONLY"
//! );
//! ```

pub mod compiler;
pub mod condition;
pub mod dialect;
pub mod error;
pub mod field;
pub mod meta;
pub mod query;
pub mod schema;
pub mod types;
pub mod value;
pub mod visitor;

pub use compiler::{CompiledStatement, Param, SqlCompiler};
pub use condition::{and, or, Condition, Predicate};
pub use dialect::{Dialect, GenericDialect};
pub use error::{Error, Result};
pub use field::{EntityType, Field, FieldOf, FieldRef, FieldValue, RelationField};
pub use meta::{EntityMeta, FieldMeta, FieldType};
pub use query::{Direction, Pagination, QuerySpec};
pub use types::{TypeMapping, TypeMappingRegistry, TypeMappings};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
pub use visitor::ConditionVisitor;
