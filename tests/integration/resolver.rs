//! Resolution through the public registry API.

use statement_registry::test_utils::{MapperDir, MapperFixture};
use statement_registry::{MapperRequest, ParamValue, Params, RegistryError, StatementKind, StatementRegistry};

fn user_params() -> Params {
    let mut params = Params::new();
    params.insert("name".to_string(), ParamValue::from("ann"));
    params.insert("age".to_string(), ParamValue::from(5));
    params.insert("id".to_string(), ParamValue::from(42));
    params
}

#[tokio::test]
async fn test_cached_and_on_demand_agree_for_unique_ids() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();
    let registry = StatementRegistry::new(dir.config()).unwrap();
    registry.preload().await.unwrap();

    let params = user_params();
    let cases = [
        (StatementKind::Select, "findUser", "SELECT * FROM users WHERE name = 'ann' AND age = 5"),
        (StatementKind::Insert, "addUser", "INSERT INTO users (name, age) VALUES ('ann', 5)"),
        (StatementKind::Update, "renameUser", "UPDATE users SET name = 'ann' WHERE id = 42"),
        (StatementKind::Delete, "removeUser", "DELETE FROM users WHERE id = 42"),
    ];

    for (kind, id, expected) in cases {
        let on_demand = registry.get_kind_statement(kind, "users", id, Some(&params)).await.unwrap();
        let cached = registry.get_statement("users", id, Some(&params)).unwrap();
        assert_eq!(on_demand, expected, "{kind} {id}");
        assert_eq!(cached, on_demand, "{kind} {id}");
    }
}

#[tokio::test]
async fn test_duplicates_and_missing_ids() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::duplicates()).unwrap();
    let registry = StatementRegistry::new(dir.config()).unwrap();

    let err = registry.get_select_statement("dupes", "x", None).await.unwrap_err();
    assert!(matches!(err, RegistryError::StatementDuplicate { count: 2, .. }));

    // Unique within its own kind
    assert_eq!(registry.get_delete_statement("dupes", "x", None).await.unwrap(), "DELETE FROM t");

    let err = registry.get_update_statement("dupes", "x", None).await.unwrap_err();
    assert_eq!(err.to_string(), "No SQL statement: dupes.update.x");
}

#[tokio::test]
async fn test_flattened_index_last_write_wins_across_kinds() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::duplicates()).unwrap();
    let registry = StatementRegistry::new(dir.config()).unwrap();
    registry.preload().await.unwrap();

    // delete is merged after select, so its body wins for the shared id
    assert_eq!(registry.get_statement("dupes", "x", None).unwrap(), "DELETE FROM t");
}

#[tokio::test]
async fn test_never_observed_mapper_is_not_found() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();
    let registry = StatementRegistry::new(dir.config()).unwrap();

    let request = MapperRequest::new("users", "findUser");
    let err = registry.get_statement_for(&request).unwrap_err();
    assert!(matches!(err, RegistryError::StatementNotFound { kind: None, .. }));
    assert_eq!(err.to_string(), "No SQL statement: users.findUser");

    // The same file still resolves from disk
    assert!(registry.get_kind_statement_for(StatementKind::Select, &request).await.is_ok());
}

#[tokio::test]
async fn test_case_insensitive_placeholders() {
    let dir = MapperDir::new().unwrap();
    dir.write(
        "mixed",
        r#"<mapper><select id="q">SELECT #{Name}, #{NAME}, #{name}, #{other}</select></mapper>"#,
    )
    .unwrap();
    let registry = StatementRegistry::new(dir.config()).unwrap();

    let mut params = Params::new();
    params.insert("name".to_string(), "ann".into());

    assert_eq!(
        registry.get_select_statement("mixed", "q", Some(&params)).await.unwrap(),
        "SELECT 'ann', 'ann', 'ann', #{other}"
    );
    assert_eq!(
        registry.get_select_statement("mixed", "q", Some(&Params::new())).await.unwrap(),
        "SELECT #{Name}, #{NAME}, #{name}, #{other}"
    );
}

#[tokio::test]
async fn test_malformed_mapper_is_decode_error() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::malformed()).unwrap();
    let registry = StatementRegistry::new(dir.config()).unwrap();

    let err = registry.get_select_statement("broken", "findUser", None).await.unwrap_err();
    assert!(matches!(err, RegistryError::Decode { .. }));
}

#[tokio::test]
async fn test_independent_registries() {
    let first = MapperDir::new().unwrap();
    let second = MapperDir::new().unwrap();
    first.write("users", r#"<mapper><select id="q">SELECT 'first'</select></mapper>"#).unwrap();
    second.write("users", r#"<mapper><select id="q">SELECT 'second'</select></mapper>"#).unwrap();

    let a = StatementRegistry::new(first.config()).unwrap();
    let b = StatementRegistry::new(second.config()).unwrap();
    a.preload().await.unwrap();
    b.preload().await.unwrap();

    assert_eq!(a.get_statement("users", "q", None).unwrap(), "SELECT 'first'");
    assert_eq!(b.get_statement("users", "q", None).unwrap(), "SELECT 'second'");
}
