use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityRow {
    id: String,
    owner_id: String,
    book_id: String,
    progress_fraction: f64,
    last_read_at: Option<String>,
    owner_display_name: String,
    book_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepairReport {
    records_scanned: u64,
    total_fixed: u64,
    total_errors: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Detail {
    owner_name: String,
    progress_percent: f64,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn seeded_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("reading_admin_http_{}_{}.json", std::process::id(), nanos));

    let seed = serde_json::json!({
        "users": {
            "a": { "full_name": "Ada" },
            "b": { "name": "Bob" }
        },
        "books": [ { "id": "b-1", "title": "Dune" } ],
        "readingStates": {
            "a": {
                "r1": { "bookId": "b-1", "progress": 0.5, "lastReadAt": "2026-01-01T08:00:00Z" },
                "r2": { "readingProgress": 0.8, "lastReadAt": "2026-01-02T08:00:00Z" }
            },
            "b": {
                "r3": { "progress": 0.9 },
                "r4": { "progress": 1.4, "lastReadAt": "2025-12-01T00:00:00Z" }
            }
        }
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&seed).unwrap()).expect("write seed data");
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/stats")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = seeded_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_reading_admin"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_recent_activity_is_merged_and_ordered() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let rows: Vec<ActivityRow> = client
        .get(format!("{}/api/reading/recent", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<_> = rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r1", "r4"]);
    assert!(rows.iter().all(|row| row.last_read_at.is_some()));
    assert!(rows.iter().all(|row| (0.0..=1.0).contains(&row.progress_fraction)));

    assert_eq!(rows[0].book_id, "r2");
    assert_eq!(rows[0].progress_fraction, 0.8);
    assert_eq!(rows[0].owner_display_name, "Ada");
    assert_eq!(rows[0].book_title, "Unknown Book (r2)");
    assert_eq!(rows[1].book_title, "Dune");
    assert_eq!(rows[1].progress_fraction, 0.5);
    assert_eq!(rows[2].owner_id, "b");
}

#[tokio::test]
async fn http_repair_is_idempotent() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let url = format!("{}/api/reading/repair", server.base_url);

    let first: RepairReport = client.post(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(first.records_scanned, 4);
    assert_eq!(first.total_errors, 0);

    let second: RepairReport = client.post(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(second.total_fixed, 0);
    assert_eq!(second.total_errors, 0);
}

#[tokio::test]
async fn http_progress_update_validates_and_applies() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = format!("{}/api/reading/b/r4", server.base_url);

    let rejected = client
        .post(format!("{base}/progress"))
        .json(&serde_json::json!({ "percent": 140 }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let accepted = client
        .post(format!("{base}/progress"))
        .json(&serde_json::json!({ "percent": 50 }))
        .send()
        .await
        .unwrap();
    assert!(accepted.status().is_success());

    let detail: Detail = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(detail.owner_name, "Bob");
    assert!((detail.progress_percent - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn http_unknown_reading_state_is_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/reading/a/missing", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let deleted = client
        .delete(format!("{}/api/reading/a/missing", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NOT_FOUND);
}
