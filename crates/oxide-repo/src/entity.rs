//! Entity trait.

use oxide_repo_core::error::Error as CoreError;
use oxide_repo_core::field::EntityType;
use oxide_repo_core::value::SqlValue;

use crate::error::Result;
use crate::row::Row;

/// A persisted type with static metadata.
///
/// # Example
///
/// ```rust
/// use oxide_repo::{Entity, Row};
/// use oxide_repo_core::field::{EntityType, Field};
/// use oxide_repo_core::meta::{EntityMeta, FieldMeta, FieldType};
/// use oxide_repo_core::value::{SqlValue, ToSqlValue};
///
/// const ID: FieldMeta = FieldMeta::new("id", FieldType::Integer).primary_key().generated();
/// const TITLE: FieldMeta = FieldMeta::new("title", FieldType::Text);
/// const NOTE: EntityMeta = EntityMeta::new("Note", "notes", &[ID, TITLE]);
///
/// struct Note {
///     id: i64,
///     title: String,
/// }
///
/// impl EntityType for Note {
///     const META: &'static EntityMeta = &NOTE;
/// }
///
/// impl Note {
///     const ID: Field<Self, i64> = Field::new(&ID);
///     const TITLE: Field<Self, String> = Field::new(&TITLE);
/// }
///
/// impl Entity for Note {
///     fn from_row(row: &Row) -> oxide_repo::Result<Self> {
///         Ok(Self {
///             id: row.field(&Self::ID)?,
///             title: row.field(&Self::TITLE)?,
///         })
///     }
///
///     fn values(&self) -> Vec<SqlValue> {
///         vec![self.id.to_sql_value(), self.title.clone().to_sql_value()]
///     }
///
///     fn set_generated_key(&mut self, key: &SqlValue) -> oxide_repo::Result<()> {
///         self.id = oxide_repo_core::FromSqlValue::from_sql_value(key)?;
///         Ok(())
///     }
/// }
/// ```
pub trait Entity: EntityType + Sized {
    /// Decodes an entity from a row holding every field's column.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::Decode`](crate::RepoError::Decode) for missing
    /// or malformed columns.
    fn from_row(row: &Row) -> Result<Self>;

    /// One value per field of [`EntityType::META`], in declaration order.
    fn values(&self) -> Vec<SqlValue>;

    /// Stores a key the database generated on insert.
    ///
    /// Entities whose key field is `generated` must override this; the
    /// default only accepts entities without a generated key.
    ///
    /// # Errors
    ///
    /// Returns an error when `key` cannot be converted, and a schema
    /// mismatch from the default when the key is generated.
    fn set_generated_key(&mut self, _key: &SqlValue) -> Result<()> {
        let meta = Self::META;
        if meta.key().is_some_and(|key| key.generated) {
            return Err(CoreError::schema_mismatch(format!(
                "entity {} has a generated key but does not store it",
                meta.name
            ))
            .into());
        }
        Ok(())
    }

    /// Value of the key field.
    ///
    /// # Errors
    ///
    /// Returns a schema mismatch when the entity has no key field.
    fn key_value(&self) -> Result<SqlValue> {
        let meta = Self::META;
        let index = meta
            .fields
            .iter()
            .position(|field| field.primary_key)
            .ok_or_else(|| CoreError::schema_mismatch(format!("entity {} has no key field", meta.name)))?;
        self.values().into_iter().nth(index).ok_or_else(|| {
            CoreError::invalid_argument(format!("{} values are missing the key", meta.name)).into()
        })
    }
}
