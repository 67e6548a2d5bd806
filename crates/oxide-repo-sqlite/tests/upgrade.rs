mod common;

use common::previous::{
    AUDIT, USER_WITHOUT_AGE, USER_WITHOUT_COMMENTS, USER_WITHOUT_ROLE_KEY, USER_WITH_NICKNAME,
};
use common::{memory_repository, Role, User, ROLE, USER};
use oxide_repo::{Row, SchemaIntrospector, StatementExecutor};
use oxide_repo_core::compiler::CompiledStatement;
use oxide_repo_core::schema::{MigrationStep, SchemaModel};
use oxide_repo_core::value::SqlValue;
use oxide_repo_sqlite::{SqliteError, SqliteRepository};

async fn introspect(repo: &SqliteRepository) -> SchemaModel {
    let mut executor = repo.executor().await.unwrap();
    executor.introspect().await.unwrap()
}

/// Inserts a row through raw SQL, for tables whose entity shape is gone.
async fn insert_raw(repo: &SqliteRepository, sql: &str) {
    let mut executor = repo.executor().await.unwrap();
    executor.execute(&CompiledStatement::raw(sql)).await.unwrap();
}

async fn select_raw(repo: &SqliteRepository, sql: &str) -> Vec<Row> {
    let mut executor = repo.executor().await.unwrap();
    executor.select(&CompiledStatement::raw(sql)).await.unwrap()
}

async fn users(repo: &SqliteRepository) -> Vec<User> {
    let mut executor = repo.executor().await.unwrap();
    repo.query::<User>()
        .order_asc(&[&User::ID])
        .prepare()
        .unwrap()
        .to_list(&mut executor)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_created_schema_needs_no_upgrade() {
    let repo = memory_repository().await;
    repo.create_repository(&[&USER, &ROLE]).await.unwrap();

    let plan = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();
    assert!(plan.is_empty(), "unexpected steps: {:?}", plan.steps());

    let schema = introspect(&repo).await;
    let role_id = schema.get_table("users").unwrap().get_column("role_id").unwrap();
    assert!(role_id.nullable);
    assert_eq!(role_id.references.as_ref().unwrap().table, "roles");
    let key = schema.get_table("roles").unwrap().get_column("id").unwrap();
    assert!(key.primary_key && key.auto_increment && !key.nullable);
}

#[tokio::test]
async fn test_upgrade_from_empty_database_creates_everything() {
    let repo = memory_repository().await;
    let plan = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();

    let created: Vec<&str> = plan.steps().iter().map(MigrationStep::table_name).collect();
    assert_eq!(created, ["roles", "users"]);
    assert_eq!(
        introspect(&repo).await.table_names().collect::<Vec<_>>(),
        ["roles", "users"]
    );
}

#[tokio::test]
async fn test_nullable_field_added() {
    let repo = memory_repository().await;
    repo.create_repository(&[&USER_WITHOUT_COMMENTS, &ROLE])
        .await
        .unwrap();
    insert_raw(
        &repo,
        "INSERT INTO users (id, first_name, age, status, active) VALUES ('u1', 'Ann', 30, 'Active', 1)",
    )
    .await;

    let plan = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();
    assert!(matches!(
        plan.steps(),
        [MigrationStep::AddColumn { column, .. }] if column.name == "comments"
    ));

    let users = users(&repo).await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].comments, None);
    assert_eq!(users[0].first_name, "Ann");
}

#[tokio::test]
async fn test_required_field_added_rebuilds_and_keeps_rows() {
    let repo = memory_repository().await;
    repo.create_repository(&[&USER_WITHOUT_AGE, &ROLE]).await.unwrap();
    insert_raw(
        &repo,
        "INSERT INTO users (id, first_name, status, active, comments) \
         VALUES ('u1', 'Ann', 'Active', 1, 'kept')",
    )
    .await;

    let plan = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();
    assert!(matches!(plan.steps(), [MigrationStep::RebuildTable { .. }]));

    let users = users(&repo).await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].age, 0);
    assert_eq!(users[0].comments.as_deref(), Some("kept"));

    let names: Vec<String> = introspect(&repo).await.table_names().map(String::from).collect();
    assert_eq!(names, ["roles", "users"]);
}

#[tokio::test]
async fn test_field_deleted_rebuilds_without_it() {
    let repo = memory_repository().await;
    repo.create_repository(&[&USER_WITH_NICKNAME, &ROLE])
        .await
        .unwrap();
    insert_raw(
        &repo,
        "INSERT INTO users (id, first_name, age, status, active, nickname) \
         VALUES ('u1', 'Ann', 30, 'Active', 0, 'annie')",
    )
    .await;

    let plan = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();
    assert!(matches!(plan.steps(), [MigrationStep::RebuildTable { .. }]));

    let schema = introspect(&repo).await;
    assert!(schema.get_table("users").unwrap().get_column("nickname").is_none());
    let users = users(&repo).await;
    assert_eq!(users.len(), 1);
    assert!(!users[0].active);
}

#[tokio::test]
async fn test_table_added_and_deleted() {
    let repo = memory_repository().await;
    repo.create_repository(&[&ROLE, &AUDIT]).await.unwrap();

    let plan = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();
    assert_eq!(
        plan.steps()[0],
        MigrationStep::DropTable(String::from("audit"))
    );
    assert!(matches!(&plan.steps()[1], MigrationStep::CreateTable(t) if t.name == "users"));
    assert_eq!(
        introspect(&repo).await.table_names().collect::<Vec<_>>(),
        ["roles", "users"]
    );
}

#[tokio::test]
async fn test_upgrade_is_idempotent() {
    let repo = memory_repository().await;
    repo.create_repository(&[&USER_WITHOUT_AGE, &ROLE]).await.unwrap();

    let first = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();
    assert!(!first.is_empty());
    let second = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();
    assert!(second.is_empty(), "unexpected steps: {:?}", second.steps());
}

#[tokio::test]
async fn test_failed_upgrade_leaves_database_unchanged() {
    let repo = memory_repository().await;
    repo.create_repository(&[&USER_WITHOUT_ROLE_KEY, &ROLE])
        .await
        .unwrap();
    insert_raw(
        &repo,
        "INSERT INTO users (id, first_name, age, status, active, role_id) \
         VALUES ('u1', 'Ann', 30, 'Active', 1, 99)",
    )
    .await;
    let before = introspect(&repo).await;

    let err = repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap_err();
    assert!(matches!(err, SqliteError::ForeignKeyViolation(1)));

    assert_eq!(introspect(&repo).await, before);
    let rows = select_raw(&repo, "SELECT role_id FROM users").await;
    assert_eq!(rows[0].value("role_id"), Some(&SqlValue::Int(99)));
}

#[tokio::test]
async fn test_foreign_keys_restored_after_upgrade() {
    let repo = memory_repository().await;
    repo.create_repository(&[&USER_WITHOUT_AGE, &ROLE]).await.unwrap();
    repo.upgrade_repository(&[&USER, &ROLE]).await.unwrap();

    let rows = select_raw(&repo, "PRAGMA foreign_keys").await;
    assert_eq!(rows[0].value_at(0), Some(&SqlValue::Int(1)));

    let mut executor = repo.executor().await.unwrap();
    let mut orphan = User::new("u1", "Ann", 30);
    orphan.role = Some(7);
    assert!(repo
        .entities::<User>()
        .add(&mut executor, &mut orphan)
        .await
        .is_err());
    let mut role = Role::new("admin");
    repo.entities::<Role>().add(&mut executor, &mut role).await.unwrap();
    assert_eq!(role.id, 1);
}
