use std::process::Output;

use tokio::process::Command;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn page_ingest(args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_page_ingest"));
    for (name, _) in std::env::vars() {
        if name.starts_with("INGEST_") || name.starts_with("SUPABASE_") {
            cmd.env_remove(name);
        }
    }
    cmd.env("RUST_LOG", "warn").args(args).output().await.unwrap()
}

#[tokio::test]
async fn run_without_table_exits_nonzero_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<body>hello</body>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("docs.sqlite");
    let url = format!("{}/page", server.uri());
    let out = page_ingest(&["--sqlite", db.to_str().unwrap(), "run", "--url", &url]).await;

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Scraping failed: Table 'documents' doesn't exist"), "{}", stderr);
    assert!(stderr.contains("CREATE TABLE documents"), "{}", stderr);
}

#[tokio::test]
async fn run_after_init_stores_the_page() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<body>hello world</body>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("docs.sqlite");
    let db = db.to_str().unwrap();
    let init = page_ingest(&["--sqlite", db, "init"]).await;
    assert!(init.status.success());

    let url = format!("{}/page", server.uri());
    let out = page_ingest(&["--sqlite", db, "run", "--url", &url]).await;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Stored 11 chars"));
}

#[tokio::test]
async fn schedule_prints_daily_cron() {
    let out = page_ingest(&["schedule"]).await;
    assert!(out.status.success());
    let manifest: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(manifest["crons"][0]["path"], "/api/scrape");
    assert_eq!(manifest["crons"][0]["schedule"], "0 0 * * *");
}
