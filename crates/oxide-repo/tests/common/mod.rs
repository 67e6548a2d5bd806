#![allow(dead_code)]

use std::collections::VecDeque;

use oxide_repo::{Entity, Repository, Row, SchemaIntrospector, StatementExecutor};
use oxide_repo_core::compiler::CompiledStatement;
use oxide_repo_core::dialect::GenericDialect;
use oxide_repo_core::field::{EntityType, Field, RelationField};
use oxide_repo_core::meta::{EntityMeta, FieldMeta, FieldType};
use oxide_repo_core::schema::SchemaModel;
use oxide_repo_core::value::{FromSqlValue, SqlValue, ToSqlValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: i64,
    pub description: String,
}

const ROLE_ID: FieldMeta = FieldMeta::new("id", FieldType::Integer)
    .primary_key()
    .generated();
const ROLE_DESCRIPTION: FieldMeta = FieldMeta::new("description", FieldType::Text);
pub const ROLE: EntityMeta = EntityMeta::new("Role", "roles", &[ROLE_ID, ROLE_DESCRIPTION]);

impl EntityType for Role {
    const META: &'static EntityMeta = &ROLE;
}

impl Role {
    pub const ID: Field<Self, i64> = Field::new(&ROLE_ID);
    pub const DESCRIPTION: Field<Self, String> = Field::new(&ROLE_DESCRIPTION);

    pub fn new(description: &str) -> Self {
        Self {
            id: 0,
            description: String::from(description),
        }
    }
}

impl Entity for Role {
    fn from_row(row: &Row) -> oxide_repo::Result<Self> {
        Ok(Self {
            id: row.field(&Self::ID)?,
            description: row.field(&Self::DESCRIPTION)?,
        })
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.id.to_sql_value(), self.description.clone().to_sql_value()]
    }

    fn set_generated_key(&mut self, key: &SqlValue) -> oxide_repo::Result<()> {
        self.id = i64::from_sql_value(key)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub age: i32,
    pub role: Option<i64>,
}

const USER_ID: FieldMeta = FieldMeta::new("id", FieldType::Text).primary_key();
const USER_FIRST_NAME: FieldMeta = FieldMeta::new("first_name", FieldType::Text);
const USER_LAST_NAME: FieldMeta = FieldMeta::new("last_name", FieldType::Text).nullable();
const USER_AGE: FieldMeta = FieldMeta::new("age", FieldType::Integer);
const USER_ROLE: FieldMeta = FieldMeta::new("role", FieldType::Integer)
    .column("role_id")
    .nullable()
    .references(&ROLE);

pub const USER: EntityMeta = EntityMeta::new(
    "User",
    "users",
    &[USER_ID, USER_FIRST_NAME, USER_LAST_NAME, USER_AGE, USER_ROLE],
);

impl EntityType for User {
    const META: &'static EntityMeta = &USER;
}

impl User {
    pub const ID: Field<Self, String> = Field::new(&USER_ID);
    pub const FIRST_NAME: Field<Self, String> = Field::new(&USER_FIRST_NAME);
    pub const LAST_NAME: Field<Self, Option<String>> = Field::new(&USER_LAST_NAME);
    pub const AGE: Field<Self, i32> = Field::new(&USER_AGE);
    pub const ROLE: RelationField<Self, Role> = RelationField::new(&USER_ROLE);

    pub fn new(id: &str, first_name: &str, age: i32) -> Self {
        Self {
            id: String::from(id),
            first_name: String::from(first_name),
            last_name: None,
            age,
            role: None,
        }
    }
}

impl Entity for User {
    fn from_row(row: &Row) -> oxide_repo::Result<Self> {
        Ok(Self {
            id: row.field(&Self::ID)?,
            first_name: row.field(&Self::FIRST_NAME)?,
            last_name: row.field(&Self::LAST_NAME)?,
            age: row.field(&Self::AGE)?,
            role: row.get("role_id")?,
        })
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.clone().to_sql_value(),
            self.first_name.clone().to_sql_value(),
            self.last_name.clone().to_sql_value(),
            self.age.to_sql_value(),
            self.role.to_sql_value(),
        ]
    }
}

/// Generated key without a place to store it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub label: String,
}

const TAG_ID: FieldMeta = FieldMeta::new("id", FieldType::Integer)
    .primary_key()
    .generated();
const TAG_LABEL: FieldMeta = FieldMeta::new("label", FieldType::Text);
pub const TAG: EntityMeta = EntityMeta::new("Tag", "tags", &[TAG_ID, TAG_LABEL]);

impl EntityType for Tag {
    const META: &'static EntityMeta = &TAG;
}

impl Entity for Tag {
    fn from_row(row: &Row) -> oxide_repo::Result<Self> {
        Ok(Self {
            label: row.get("label")?,
        })
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Null, self.label.clone().to_sql_value()]
    }
}

pub fn user_row(id: &str, first_name: &str, age: i64) -> Row {
    Row::new()
        .with("id", SqlValue::Text(String::from(id)))
        .with("first_name", SqlValue::Text(String::from(first_name)))
        .with("last_name", SqlValue::Null)
        .with("age", SqlValue::Int(age))
        .with("role_id", SqlValue::Null)
}

pub fn repository() -> Repository {
    Repository::new(GenericDialect::new())
}

#[derive(Debug, thiserror::Error)]
#[error("statement rejected: {0}")]
pub struct Rejected(pub String);

/// Executor that records every statement and replays canned results.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub statements: Vec<CompiledStatement>,
    pub results: VecDeque<Vec<Row>>,
    pub count: u64,
    pub affected: u64,
    /// Key rows returned by successive inserts.
    pub keys: VecDeque<Vec<Row>>,
    pub fail_on: Option<String>,
    pub schema: SchemaModel,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(mut self, rows: Vec<Row>) -> Self {
        self.results.push_back(rows);
        self
    }

    pub fn returning_keys(mut self, keys: Vec<Row>) -> Self {
        self.keys.push_back(keys);
        self
    }

    pub fn with_schema(mut self, schema: SchemaModel) -> Self {
        self.schema = schema;
        self
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(String::from(fragment));
        self
    }

    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|s| s.sql.as_str()).collect()
    }

    fn record(&mut self, statement: &CompiledStatement) -> Result<(), Rejected> {
        if let Some(fragment) = &self.fail_on {
            if statement.sql.contains(fragment.as_str()) {
                return Err(Rejected(statement.sql.clone()));
            }
        }
        self.statements.push(statement.clone());
        Ok(())
    }
}

impl StatementExecutor for RecordingExecutor {
    type Error = Rejected;

    async fn select(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>, Rejected> {
        self.record(statement)?;
        Ok(self.results.pop_front().unwrap_or_default())
    }

    async fn count(&mut self, statement: &CompiledStatement) -> Result<u64, Rejected> {
        self.record(statement)?;
        Ok(self.count)
    }

    async fn insert(&mut self, statement: &CompiledStatement) -> Result<Vec<Row>, Rejected> {
        self.record(statement)?;
        Ok(self.keys.pop_front().unwrap_or_default())
    }

    async fn execute(&mut self, statement: &CompiledStatement) -> Result<u64, Rejected> {
        self.record(statement)?;
        Ok(self.affected)
    }
}

impl SchemaIntrospector for RecordingExecutor {
    type Error = Rejected;

    async fn introspect(&mut self) -> Result<SchemaModel, Rejected> {
        Ok(self.schema.clone())
    }
}
