//! Schema model, differ and migration planning.

mod diff;
mod model;
mod plan;

pub use diff::{MigrationPlanner, PlannerOptions};
pub use model::{ColumnSchema, ForeignKey, SchemaModel, TableSchema};
pub use plan::{ColumnCopy, ColumnSource, MigrationPlan, MigrationStep};
