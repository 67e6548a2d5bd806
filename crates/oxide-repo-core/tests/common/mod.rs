#![allow(dead_code)]

use oxide_repo_core::compiler::{CompiledStatement, SqlCompiler};
use oxide_repo_core::dialect::{Dialect, GenericDialect};
use oxide_repo_core::field::{EntityType, Field, FieldValue, RelationField};
use oxide_repo_core::meta::{EntityMeta, FieldMeta, FieldType};
use oxide_repo_core::query::{Pagination, QuerySpec};
use oxide_repo_core::value::{SqlValue, ToSqlValue};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Suspended,
}

impl ToSqlValue for AccountStatus {
    fn to_sql_value(self) -> SqlValue {
        let name = match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
        };
        SqlValue::Text(String::from(name))
    }
}

impl FieldValue for AccountStatus {
    type Operand = Self;
}

pub struct Role;

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
}

pub struct User;

const USER_ID: FieldMeta = FieldMeta::new("id", FieldType::Text).primary_key();
const USER_FIRST_NAME: FieldMeta = FieldMeta::new("first_name", FieldType::Text);
const USER_LAST_NAME: FieldMeta = FieldMeta::new("last_name", FieldType::Text).nullable();
const USER_AGE: FieldMeta = FieldMeta::new("age", FieldType::Integer);
const USER_STATUS: FieldMeta = FieldMeta::new("status", FieldType::Enum);
const USER_LAST_VISIT: FieldMeta = FieldMeta::new("last_visit", FieldType::Date).nullable();
const USER_ROLE: FieldMeta = FieldMeta::new("role", FieldType::Integer)
    .column("role_id")
    .nullable()
    .references(&ROLE);
const USER_COMMENTS: FieldMeta = FieldMeta::new("comments", FieldType::Text).nullable();

pub const USER: EntityMeta = EntityMeta::new(
    "User",
    "users",
    &[
        USER_ID,
        USER_FIRST_NAME,
        USER_LAST_NAME,
        USER_AGE,
        USER_STATUS,
        USER_LAST_VISIT,
        USER_ROLE,
        USER_COMMENTS,
    ],
);

impl EntityType for User {
    const META: &'static EntityMeta = &USER;
}

impl User {
    pub const ID: Field<Self, String> = Field::new(&USER_ID);
    pub const FIRST_NAME: Field<Self, String> = Field::new(&USER_FIRST_NAME);
    pub const LAST_NAME: Field<Self, Option<String>> = Field::new(&USER_LAST_NAME);
    pub const AGE: Field<Self, i32> = Field::new(&USER_AGE);
    pub const STATUS: Field<Self, AccountStatus> = Field::new(&USER_STATUS);
    pub const LAST_VISIT: Field<Self, Option<DateTime<Utc>>> = Field::new(&USER_LAST_VISIT);
    pub const ROLE: RelationField<Self, Role> = RelationField::new(&USER_ROLE);
    pub const COMMENTS: Field<Self, Option<String>> = Field::new(&USER_COMMENTS);
}

/// Two relations to the same table.
pub struct Ticket;

const TICKET_ID: FieldMeta = FieldMeta::new("id", FieldType::Integer).primary_key();
const TICKET_OWNER: FieldMeta = FieldMeta::new("owner", FieldType::Integer).references(&ROLE);
const TICKET_REVIEWER: FieldMeta = FieldMeta::new("reviewer", FieldType::Integer)
    .nullable()
    .references(&ROLE);
pub const TICKET: EntityMeta = EntityMeta::new(
    "Ticket",
    "tickets",
    &[TICKET_ID, TICKET_OWNER, TICKET_REVIEWER],
);

impl EntityType for Ticket {
    const META: &'static EntityMeta = &TICKET;
}

impl Ticket {
    pub const ID: Field<Self, i64> = Field::new(&TICKET_ID);
    pub const OWNER: RelationField<Self, Role> = RelationField::new(&TICKET_OWNER);
    pub const REVIEWER: RelationField<Self, Role> = RelationField::new(&TICKET_REVIEWER);
}

pub const USER_COLUMNS: &str =
    "\"id\", \"first_name\", \"last_name\", \"age\", \"status\", \"last_visit\", \"role_id\", \"comments\"";

pub const USER_COLUMNS_QUALIFIED: &str = "\"users\".\"id\", \"users\".\"first_name\", \"users\".\"last_name\", \"users\".\"age\", \"users\".\"status\", \"users\".\"last_visit\", \"users\".\"role_id\", \"users\".\"comments\"";

/// Numbered placeholders with RETURNING support.
#[derive(Debug)]
pub struct NumberedDialect;

impl Dialect for NumberedDialect {
    fn name(&self) -> &'static str {
        "numbered"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn pagination_clause(&self, pagination: &Pagination) -> Option<String> {
        GenericDialect::new().pagination_clause(pagination)
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

pub fn users() -> QuerySpec {
    QuerySpec::new(User::META)
}

pub fn select(spec: &QuerySpec) -> CompiledStatement {
    SqlCompiler::new(&GenericDialect::new())
        .select(spec)
        .unwrap_or_else(|e| panic!("select failed: {e}"))
}

pub fn count(spec: &QuerySpec) -> CompiledStatement {
    SqlCompiler::new(&GenericDialect::new())
        .count(spec)
        .unwrap_or_else(|e| panic!("count failed: {e}"))
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(String::from(value))
}

pub fn placeholder_count(sql: &str) -> usize {
    sql.matches('?').count()
}
