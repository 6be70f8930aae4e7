use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Matcher, Server};
use tempfile::tempdir;

fn tokenflow(server_url: &str, storage_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("tokenflow"));
    cmd.env_remove("TOKENFLOW_LOGIN_CODE")
        .env("TOKENFLOW_RETRY_DELAY_MS", "0")
        .arg("--base-url")
        .arg(server_url)
        .arg("--storage-dir")
        .arg(storage_dir);
    cmd
}

#[test]
fn test_request_logs_in_and_persists_token() {
    let mut server = Server::new();
    let url = server.url();

    let login = server
        .mock("POST", "/auth/login")
        .match_header("Authorization", Matcher::Missing)
        .match_body(Matcher::Json(serde_json::json!({"code": "one-time"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":200,"data":{"token":"T1-abcdefgh"}}"#)
        .expect(1)
        .create();

    let user = server
        .mock("GET", "/user/info")
        .match_header("Authorization", "Bearer T1-abcdefgh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":200,"data":{"id":"1","name":"A"},"message":"ok"}"#)
        .expect(1)
        .create();

    let storage = tempdir().unwrap();

    tokenflow(&url, storage.path())
        .env("TOKENFLOW_LOGIN_CODE", "one-time")
        .arg("request")
        .arg("/user/info")
        .assert()
        .success()
        .stdout(predicates::str::contains(r#""name": "A""#));

    login.assert();
    user.assert();
    assert_eq!(
        std::fs::read_to_string(storage.path().join("token")).unwrap(),
        "T1-abcdefgh"
    );
}

#[test]
fn test_request_refreshes_expired_token() {
    let mut server = Server::new();
    let url = server.url();

    let _expired = server
        .mock("GET", "/orders")
        .match_header("Authorization", "Bearer T1")
        .with_status(200)
        .with_body(r#"{"code":401,"message":"token expired"}"#)
        .create();

    let refresh = server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::Json(serde_json::json!({"oldToken": "T1"})))
        .with_status(200)
        .with_body(r#"{"code":200,"data":{"token":"T2"}}"#)
        .expect(1)
        .create();

    let fresh = server
        .mock("GET", "/orders")
        .match_header("Authorization", "Bearer T2")
        .with_status(200)
        .with_body(r#"{"code":200,"data":[{"id":7}]}"#)
        .expect(1)
        .create();

    let storage = tempdir().unwrap();
    std::fs::write(storage.path().join("token"), "T1").unwrap();

    tokenflow(&url, storage.path())
        .arg("request")
        .arg("/orders")
        .assert()
        .success()
        .stdout(predicates::str::contains(r#""id": 7"#));

    refresh.assert();
    fresh.assert();
    assert_eq!(
        std::fs::read_to_string(storage.path().join("token")).unwrap(),
        "T2"
    );
}

#[test]
fn test_request_failure_exits_non_zero_after_retries() {
    let mut server = Server::new();
    let url = server.url();

    let busy = server
        .mock("POST", "/orders")
        .with_status(200)
        .with_body(r#"{"code":500,"message":"server busy"}"#)
        .expect(2)
        .create();

    let storage = tempdir().unwrap();

    tokenflow(&url, storage.path())
        .arg("request")
        .arg("/orders")
        .arg("--method")
        .arg("POST")
        .arg("--data")
        .arg(r#"{"sku":"a"}"#)
        .arg("--no-auth")
        .arg("--retry")
        .arg("1")
        .assert()
        .failure()
        .stderr(predicates::str::contains("server busy"));

    busy.assert();
    assert!(!storage.path().join("token").exists());
}

#[test]
fn test_token_show_and_clear() {
    let server = Server::new();
    let url = server.url();
    let storage = tempdir().unwrap();
    std::fs::write(storage.path().join("token"), "abcdefghijklmnop").unwrap();

    tokenflow(&url, storage.path())
        .arg("token")
        .arg("show")
        .assert()
        .success()
        .stdout(predicates::str::contains("abcd*********mnop"));

    tokenflow(&url, storage.path())
        .arg("token")
        .arg("clear")
        .assert()
        .success()
        .stdout(predicates::str::contains("Token cleared"));

    assert!(!storage.path().join("token").exists());

    tokenflow(&url, storage.path())
        .arg("token")
        .arg("show")
        .assert()
        .success()
        .stdout(predicates::str::contains("No token stored"));
}

#[test]
fn test_login_command_fails_without_code() {
    let mut server = Server::new();
    let url = server.url();

    let login = server.mock("POST", "/auth/login").expect(0).create();
    let storage = tempdir().unwrap();

    // stdin is empty, so the prompt gets no input
    tokenflow(&url, storage.path())
        .arg("login")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicates::str::contains("Login failed"));

    login.assert();
}
