use portico::db::{Fields, Mutation, SelectQuery};
use portico::models::{create_user, get_user, list_users};
use portico::{CrudError, PorticoError};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;
use tokio::fs;

#[tokio::test]
async fn test_user_model_through_db_actor() {
    let tmp_dir = std::env::temp_dir();
    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    let db_file_name = format!("test_portico_db_{}.sqlite", hasher.finish());
    let db_path = tmp_dir.join(db_file_name);
    let database_url = format!("sqlite:{}", db_path.to_str().unwrap());

    // Spawn DbActor
    let db = portico::db::spawn(&database_url).await.unwrap();

    // 1. Fresh database has no users
    assert!(list_users(&db).await.unwrap().is_empty());

    // 2. create_user hashes the password and returns the generated id
    let id = create_user(&db, "a", "b@x.com", "hunter2").await.unwrap();
    assert!(id > 0, "Expected a valid ID after creation");

    let user = get_user(&db, id).await.unwrap().expect("user exists");
    assert_eq!(user.id, id);
    assert_eq!(user.username, "a");
    assert_eq!(user.email, "b@x.com");
    assert_eq!(user.role, "user");
    assert_ne!(user.password, "hunter2");
    assert!(user.verify_password("hunter2"));
    assert!(!user.verify_password("hunter3"));

    // 3. Unknown id reads as None
    assert!(get_user(&db, id + 100).await.unwrap().is_none());

    // 4. Generic accessor calls go through the same actor
    let promoted = db
        .update(
            "users",
            Fields::new().with("role", "admin"),
            Fields::new().with("id", id),
        )
        .await
        .unwrap();
    assert_eq!(promoted, Mutation::Applied(1));
    assert_eq!(get_user(&db, id).await.unwrap().unwrap().role, "admin");

    let second = create_user(&db, "c", "d@x.com", "pw").await.unwrap();
    let users = list_users(&db).await.unwrap();
    assert_eq!(
        users.iter().map(|u| u.id).collect::<Vec<_>>(),
        vec![id, second]
    );

    let admins = db
        .select_all("users", SelectQuery::new().filter("role", "admin"))
        .await
        .unwrap();
    assert_eq!(admins.len(), 1);

    // 5. Unconditional delete is refused before reaching the database
    let err = db.delete("users", Fields::new()).await.unwrap_err();
    assert!(matches!(
        err,
        PorticoError::Crud(CrudError::MissingConditions { .. })
    ));
    assert_eq!(list_users(&db).await.unwrap().len(), 2);

    let deleted = db
        .delete("users", Fields::new().with("id", second))
        .await
        .unwrap();
    assert_eq!(deleted, Mutation::Applied(1));

    // 6. Raw escape hatch
    let count = db
        .query("SELECT COUNT(*) AS n FROM users", Vec::new())
        .await
        .unwrap();
    assert_eq!(count[0]["n"], serde_json::json!(1));

    // Clean up the temporary database file
    let wal_path = std::path::PathBuf::from(format!("{}-wal", db_path.to_string_lossy()));
    let shm_path = std::path::PathBuf::from(format!("{}-shm", db_path.to_string_lossy()));
    let _ = fs::remove_file(&wal_path).await;
    let _ = fs::remove_file(&shm_path).await;
    let _ = fs::remove_file(&db_path).await;
}
