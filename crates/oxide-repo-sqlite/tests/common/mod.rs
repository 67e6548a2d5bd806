#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use oxide_repo::{Entity, Row};
use oxide_repo_core::error::Error as CoreError;
use oxide_repo_core::field::{EntityType, Field, FieldValue, RelationField};
use oxide_repo_core::meta::{EntityMeta, FieldMeta, FieldType};
use oxide_repo_core::value::{FromSqlValue, SqlValue, ToSqlValue};
use oxide_repo_sqlite::{SqliteConfig, SqliteRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Suspended,
}

impl ToSqlValue for Status {
    fn to_sql_value(self) -> SqlValue {
        let name = match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
        };
        SqlValue::Text(String::from(name))
    }
}

impl FromSqlValue for Status {
    fn from_sql_value(value: &SqlValue) -> oxide_repo_core::Result<Self> {
        match String::from_sql_value(value)?.as_str() {
            "Active" => Ok(Self::Active),
            "Suspended" => Ok(Self::Suspended),
            other => Err(CoreError::invalid_argument(format!("unknown status {other}"))),
        }
    }
}

impl FieldValue for Status {
    type Operand = Self;
}

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
    pub status: Status,
    pub active: bool,
    pub last_visit: Option<DateTime<Utc>>,
    pub role: Option<i64>,
    pub comments: Option<String>,
}

const USER_ID: FieldMeta = FieldMeta::new("id", FieldType::Text).primary_key();
const USER_FIRST_NAME: FieldMeta = FieldMeta::new("first_name", FieldType::Text);
const USER_LAST_NAME: FieldMeta = FieldMeta::new("last_name", FieldType::Text).nullable();
const USER_AGE: FieldMeta = FieldMeta::new("age", FieldType::Integer);
const USER_STATUS: FieldMeta = FieldMeta::new("status", FieldType::Enum);
const USER_ACTIVE: FieldMeta = FieldMeta::new("active", FieldType::Boolean);
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
        USER_ACTIVE,
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
    pub const STATUS: Field<Self, Status> = Field::new(&USER_STATUS);
    pub const ACTIVE: Field<Self, bool> = Field::new(&USER_ACTIVE);
    pub const LAST_VISIT: Field<Self, Option<DateTime<Utc>>> = Field::new(&USER_LAST_VISIT);
    pub const ROLE: RelationField<Self, Role> = RelationField::new(&USER_ROLE);
    pub const COMMENTS: Field<Self, Option<String>> = Field::new(&USER_COMMENTS);

    pub fn new(id: &str, first_name: &str, age: i32) -> Self {
        Self {
            id: String::from(id),
            first_name: String::from(first_name),
            last_name: None,
            age,
            status: Status::Active,
            active: true,
            last_visit: None,
            role: None,
            comments: None,
        }
    }

    pub fn with_role(mut self, role: &Role) -> Self {
        self.role = Some(role.id);
        self
    }
}

impl Entity for User {
    fn from_row(row: &Row) -> oxide_repo::Result<Self> {
        Ok(Self {
            id: row.field(&Self::ID)?,
            first_name: row.field(&Self::FIRST_NAME)?,
            last_name: row.field(&Self::LAST_NAME)?,
            age: row.field(&Self::AGE)?,
            status: row.field(&Self::STATUS)?,
            active: row.field(&Self::ACTIVE)?,
            last_visit: row.field(&Self::LAST_VISIT)?,
            role: row.get("role_id")?,
            comments: row.field(&Self::COMMENTS)?,
        })
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.clone().to_sql_value(),
            self.first_name.clone().to_sql_value(),
            self.last_name.clone().to_sql_value(),
            self.age.to_sql_value(),
            self.status.to_sql_value(),
            self.active.to_sql_value(),
            self.last_visit.to_sql_value(),
            self.role.to_sql_value(),
            self.comments.clone().to_sql_value(),
        ]
    }
}

/// Ticket with two relations to `roles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: i64,
    pub owner: i64,
    pub reviewer: Option<i64>,
}

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

    pub fn new(id: i64, owner: &Role, reviewer: Option<&Role>) -> Self {
        Self {
            id,
            owner: owner.id,
            reviewer: reviewer.map(|role| role.id),
        }
    }
}

impl Entity for Ticket {
    fn from_row(row: &Row) -> oxide_repo::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            owner: row.get("owner")?,
            reviewer: row.get("reviewer")?,
        })
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.to_sql_value(),
            self.owner.to_sql_value(),
            self.reviewer.to_sql_value(),
        ]
    }
}

/// Earlier shapes of the `users` table, used as upgrade starting points.
pub mod previous {
    use super::*;

    /// Without the nullable `comments` column.
    pub const USER_WITHOUT_COMMENTS: EntityMeta = EntityMeta::new(
        "User",
        "users",
        &[
            USER_ID,
            USER_FIRST_NAME,
            USER_LAST_NAME,
            USER_AGE,
            USER_STATUS,
            USER_ACTIVE,
            USER_LAST_VISIT,
            USER_ROLE,
        ],
    );

    /// Without the required `age` column.
    pub const USER_WITHOUT_AGE: EntityMeta = EntityMeta::new(
        "User",
        "users",
        &[
            USER_ID,
            USER_FIRST_NAME,
            USER_LAST_NAME,
            USER_STATUS,
            USER_ACTIVE,
            USER_LAST_VISIT,
            USER_ROLE,
            USER_COMMENTS,
        ],
    );

    const USER_NICKNAME: FieldMeta = FieldMeta::new("nickname", FieldType::Text).nullable();

    /// With an extra `nickname` column.
    pub const USER_WITH_NICKNAME: EntityMeta = EntityMeta::new(
        "User",
        "users",
        &[
            USER_ID,
            USER_FIRST_NAME,
            USER_LAST_NAME,
            USER_AGE,
            USER_STATUS,
            USER_ACTIVE,
            USER_LAST_VISIT,
            USER_ROLE,
            USER_COMMENTS,
            USER_NICKNAME,
        ],
    );

    const USER_ROLE_UNCHECKED: FieldMeta = FieldMeta::new("role", FieldType::Integer)
        .column("role_id")
        .nullable();

    /// `role_id` without a foreign key.
    pub const USER_WITHOUT_ROLE_KEY: EntityMeta = EntityMeta::new(
        "User",
        "users",
        &[
            USER_ID,
            USER_FIRST_NAME,
            USER_LAST_NAME,
            USER_AGE,
            USER_STATUS,
            USER_ACTIVE,
            USER_LAST_VISIT,
            USER_ROLE_UNCHECKED,
            USER_COMMENTS,
        ],
    );

    const AUDIT_ID: FieldMeta = FieldMeta::new("id", FieldType::Integer)
        .primary_key()
        .generated();
    const AUDIT_MESSAGE: FieldMeta = FieldMeta::new("message", FieldType::Text);

    /// A table no current entity maps.
    pub const AUDIT: EntityMeta = EntityMeta::new("Audit", "audit", &[AUDIT_ID, AUDIT_MESSAGE]);
}

pub fn visit_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 4, 15, 10, 30, 0).unwrap()
}

pub async fn memory_repository() -> SqliteRepository {
    SqliteRepository::connect(&SqliteConfig::default())
        .await
        .expect("Failed to create in-memory SQLite pool")
}
