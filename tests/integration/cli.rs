//! End-to-end tests for the `stmtreg` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use statement_registry::test_utils::{MapperDir, MapperFixture};

fn stmtreg(dir: &MapperDir) -> Command {
    let mut cmd = Command::cargo_bin("stmtreg").unwrap();
    cmd.current_dir(dir.root())
        .env_remove("STMTREG_ROOT")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--root")
        .arg(dir.root());
    cmd
}

#[test]
fn test_get_cached_with_params() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();

    stmtreg(&dir)
        .args(["get", "users", "findUser", "--param", "name=ann", "--param", "age=5"])
        .assert()
        .success()
        .stdout("SELECT * FROM users WHERE name = 'ann' AND age = 5\n");
}

#[test]
fn test_get_with_kind_reports_duplicates() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::duplicates()).unwrap();

    stmtreg(&dir)
        .args(["get", "dupes", "x", "--kind", "select"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SQL statement is duplicated: dupes.select.x (2 definitions)"));

    stmtreg(&dir)
        .args(["get", "dupes", "x", "--kind", "delete"])
        .assert()
        .success()
        .stdout("DELETE FROM t\n");
}

#[test]
fn test_get_unknown_id_suggests_similar() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();

    stmtreg(&dir)
        .args(["get", "users", "findUsr", "--kind", "select"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No SQL statement: users.select.findUsr"))
        .stderr(predicate::str::contains("findUser"));
}

#[test]
fn test_get_warns_about_unbound_placeholders() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();

    stmtreg(&dir)
        .args(["get", "users", "findUser", "-p", "name=ann"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#{age}"))
        .stderr(predicate::str::contains("unbound placeholder(s): age"));
}

#[test]
fn test_list_mappers_and_statements() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();
    dir.add(&MapperFixture::empty().named("nested/orders")).unwrap();

    stmtreg(&dir).arg("list").assert().success().stdout("orders\nusers\n");

    stmtreg(&dir)
        .args(["list", "users"])
        .assert()
        .success()
        .stdout("select findUser\ninsert addUser\nupdate renameUser\ndelete removeUser\n");

    let output = stmtreg(&dir).args(["list", "--format", "json"]).output().unwrap();
    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names, vec!["orders", "users"]);
}

#[test]
fn test_check_passes_and_fails() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();

    stmtreg(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 mapper file(s) valid"));

    dir.add(&MapperFixture::duplicates()).unwrap();
    dir.add(&MapperFixture::malformed()).unwrap();

    stmtreg(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("duplicate select id 'x' (2 definitions)"))
        .stderr(predicate::str::contains("2 of 3 mapper file(s) failed validation"));

    stmtreg(&dir).args(["check", "users"]).assert().success();
}

#[test]
fn test_config_file_in_working_directory() {
    let dir = MapperDir::new().unwrap();
    dir.write("sql/users", &MapperFixture::users().content).unwrap();
    std::fs::write(dir.root().join("statement-registry.toml"), "root = \"sql\"\n").unwrap();

    Command::cargo_bin("stmtreg")
        .unwrap()
        .current_dir(dir.root())
        .env_remove("STMTREG_ROOT")
        .args(["get", "users", "removeUser", "--kind", "delete", "--param", "id=3"])
        .assert()
        .success()
        .stdout("DELETE FROM users WHERE id = 3\n");
}

#[test]
fn test_missing_root_is_reported() {
    let dir = MapperDir::new().unwrap();

    Command::cargo_bin("stmtreg")
        .unwrap()
        .current_dir(dir.root())
        .env_remove("STMTREG_ROOT")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no mapper directory configured"));
}
