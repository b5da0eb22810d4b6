use std::fs;
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command};
use std::thread::sleep;
use std::time::Duration;

use mealplan::client::{FileStorage, HttpRemote, MemoryStorage, PersistenceClient};
use mealplan::config::ClientConfig;
use mealplan::server::{build_router, AppState};
use mealplan::{Document, JsonFileStore, Outcome, Tier};
use tempfile::TempDir;

// Nothing listens on the discard port.
const OFFLINE_SERVER: &str = "http://127.0.0.1:9";

fn mealplan_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mealplan"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn offline_args(cache_dir: &Path) -> Vec<String> {
    vec![
        "--server".to_string(),
        OFFLINE_SERVER.to_string(),
        "--cache-dir".to_string(),
        cache_dir.display().to_string(),
        "--timeout".to_string(),
        "2".to_string(),
    ]
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

struct ServerGuard(Child);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn spawn_server(port: u16, data_file: &Path) -> ServerGuard {
    let child = mealplan_cmd()
        .args([
            "serve",
            "--port",
            &port.to_string(),
            "--data-file",
            &data_file.display().to_string(),
        ])
        .spawn()
        .unwrap();
    let guard = ServerGuard(child);

    for _ in 0..100 {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return guard;
        }
        sleep(Duration::from_millis(50));
    }
    panic!("server did not start on port {port}");
}

#[test]
fn test_fields_lists_page_bindings() {
    let output = mealplan_cmd().args(["fields"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("day1-where\n"));
    assert!(stdout.contains("day3-meal1-ingredients (multi-line)"));
    assert!(stdout.contains("Keyboard shortcuts"));
}

#[test]
fn test_show_offline_first_run_uses_default_plan() {
    let tmp = TempDir::new().unwrap();

    let output = mealplan_cmd()
        .args(["show"])
        .args(offline_args(&tmp.path().join("cache")))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("day1-where: Fazio house"));
    assert!(stdout.contains("day6-where: [Eem on N. Williams](https://www.eempdx.com/)"));
}

#[test]
fn test_show_json_matches_default_document() {
    let tmp = TempDir::new().unwrap();

    let output = mealplan_cmd()
        .args(["show", "--json"])
        .args(offline_args(&tmp.path().join("cache")))
        .output()
        .unwrap();

    assert!(output.status.success());
    let doc = Document::from_json(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(doc, Document::builtin_default());
}

#[test]
fn test_offline_set_is_degraded_and_survives_next_session() {
    let tmp = TempDir::new().unwrap();
    let cache = tmp.path().join("cache");

    let output = mealplan_cmd()
        .args(["set", "day8-where", "Pho Oregon", "--json"])
        .args(offline_args(&cache))
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["outcome"], "degraded");
    assert_eq!(result["value"], "Pho Oregon");
    assert!(cache.join("mealPlanData.json").exists());

    let output = mealplan_cmd()
        .args(["get", "day8-where"])
        .args(offline_args(&cache))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Pho Oregon");
}

#[test]
fn test_set_unknown_field_fails() {
    let tmp = TempDir::new().unwrap();

    let output = mealplan_cmd()
        .args(["set", "day10-where", "Nowhere"])
        .args(offline_args(&tmp.path().join("cache")))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown field: day10-where"));
}

#[test]
fn test_set_with_no_storage_available_fails() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("cache");
    fs::write(&blocker, "not a directory").unwrap();

    let output = mealplan_cmd()
        .args(["set", "day1-where", "Paul's house"])
        .args(offline_args(&blocker))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("(failed)"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to save changes"));
}

#[test]
fn test_serve_then_set_writes_data_file() {
    let tmp = TempDir::new().unwrap();
    let data_file = tmp.path().join("data.json");
    let port = free_port();
    let _server = spawn_server(port, &data_file);
    let server_url = format!("http://127.0.0.1:{port}");

    assert!(data_file.exists());

    let updated = "Black olives, mushrooms, onions, green bell peppers, chicken, pineapple, olives";
    let output = mealplan_cmd()
        .args([
            "set",
            "day3-meal1-ingredients",
            updated,
            "--server",
            &server_url,
            "--cache-dir",
            &tmp.path().join("cache").display().to_string(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("(ok)"));

    let saved = Document::from_json(&fs::read_to_string(&data_file).unwrap()).unwrap();
    let mut expected = Document::builtin_default();
    expected.set("day3-meal1-ingredients", updated);
    assert_eq!(saved, expected);
    assert!(!tmp.path().join("cache/mealPlanData.json").exists());
}

#[tokio::test]
async fn test_commit_then_load_through_http() {
    let tmp = TempDir::new().unwrap();
    let store = JsonFileStore::open_or_init(tmp.path().join("data.json")).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(AppState::new(store, None)))
            .await
            .unwrap();
    });

    let config = ClientConfig {
        server_url: format!("http://{addr}"),
        cache_dir: tmp.path().join("cache"),
        ..ClientConfig::default()
    };

    let mut doc = Document::builtin_default();
    doc.set("day4-where", "[Salt](https://salt.example)");

    let writer = PersistenceClient::new(
        HttpRemote::new(&config).unwrap(),
        FileStorage::new(&config.cache_dir),
    );
    assert_eq!(writer.commit(&doc).await, Outcome::Ok);

    let reader = PersistenceClient::new(HttpRemote::new(&config).unwrap(), MemoryStorage::new());
    let (loaded, tier) = reader.load_with_source().await;
    assert_eq!(tier, Tier::Remote);
    assert_eq!(loaded, doc);
}
