//! Full pipeline: tail a real file, detect, deliver, shut down.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use alert_watcher::lifecycle::{startup, Shutdown};

mod common;

use common::{line, start_mock_webhook, test_config};

fn append(path: &Path, lines: &[String]) {
    let mut file = OpenOptions::new().create(true).append(true).open(path).unwrap();
    for l in lines {
        writeln!(file, "{}", l).unwrap();
    }
    file.flush().unwrap();
}

#[tokio::test]
async fn test_tails_log_and_alerts_until_shutdown() {
    let webhook = start_mock_webhook().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&webhook.url(), dir.path());
    let log_path = dir.path().join("access.log");

    // History before startup must not be replayed.
    append(&log_path, &[line(200, "blue"), line(200, "green")]);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(startup::run(config, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(200)).await;

    append(
        &log_path,
        &[
            line(200, "blue"),
            "garbage".to_string(),
            line(502, "green"),
            line(200, "green"),
        ],
    );
    webhook.wait_for_hits(1).await;

    shutdown.trigger();
    let stats = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("watcher did not stop")
        .unwrap()
        .unwrap();

    assert_eq!(webhook.types(), vec!["failover"]);
    assert_eq!(stats.lines, 4);
    assert_eq!(stats.records, 3);
    assert_eq!(stats.parse_failures, 1);
    assert_eq!(stats.delivered, 1);
}
