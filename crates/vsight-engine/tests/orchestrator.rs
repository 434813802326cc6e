//! End-to-end orchestrator tests against stub analyzer scripts.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use vsight_engine::{EngineConfig, EngineError, Orchestrator};
use vsight_models::{ExecutionTarget, UploadedFile};

fn write_stub(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("stub-analyzer.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn config_for(tmp: &TempDir, analyzer: &Path) -> EngineConfig {
    EngineConfig {
        analyzer_bin: analyzer.to_string_lossy().into_owned(),
        work_dir: tmp.path().join("work"),
        job_timeout: Duration::from_secs(10),
        max_concurrent_jobs: 4,
        execution_target: ExecutionTarget::Cpu,
        stderr_limit: 16 * 1024,
    }
}

async fn orchestrator_for(tmp: &TempDir, stub_body: &str) -> Orchestrator {
    let stub = write_stub(tmp.path(), stub_body);
    Orchestrator::new(config_for(tmp, &stub)).await.unwrap()
}

fn upload(name: &str) -> UploadedFile {
    UploadedFile::new(Some(name.to_string()), b"fake video bytes".to_vec())
}

fn workspace_count(work_dir: &Path) -> usize {
    std::fs::read_dir(work_dir).map(|d| d.count()).unwrap_or(0)
}

/// True once the pid no longer names a live process (zombies count as dead).
fn process_gone(pid: i32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .and_then(|rest| rest.split_whitespace().next())
            .map(|state| state == "Z")
            .unwrap_or(true),
    }
}

#[tokio::test]
async fn submit_returns_stub_result_and_removes_workspace() {
    let tmp = TempDir::new().unwrap();
    let orchestrator = orchestrator_for(
        &tmp,
        r#"printf '%s' '{"summary":"A person walks.","transcript":"","frameNotes":["frame 1: person"]}' > "$2""#,
    )
    .await;

    let result = orchestrator.submit(upload("clip.mp4")).await.unwrap();

    assert_eq!(result.summary.as_deref(), Some("A person walks."));
    assert_eq!(result.transcript.as_deref(), Some(""));
    assert_eq!(result.frame_notes, vec!["frame 1: person".to_string()]);
    assert_eq!(workspace_count(orchestrator.work_dir()), 0);
}

#[tokio::test]
async fn input_bytes_are_persisted_before_launch() {
    let tmp = TempDir::new().unwrap();
    // Stub reports the size of the input it was handed
    let orchestrator = orchestrator_for(
        &tmp,
        r#"printf '{"summary":"%s"}' "$(wc -c < "$1" | tr -d ' ')" > "$2""#,
    )
    .await;

    let result = orchestrator.submit(upload("clip.mp4")).await.unwrap();
    assert_eq!(result.summary.as_deref(), Some("16"));
}

#[tokio::test]
async fn execution_target_is_passed_as_third_argument() {
    let tmp = TempDir::new().unwrap();
    let orchestrator =
        orchestrator_for(&tmp, r#"printf '{"summary":"%s"}' "$3" > "$2""#).await;

    let result = orchestrator.submit(upload("clip.mp4")).await.unwrap();
    assert_eq!(result.summary.as_deref(), Some("cpu"));
}

#[tokio::test]
async fn nonzero_exit_is_analyzer_failed_with_stderr() {
    let tmp = TempDir::new().unwrap();
    let orchestrator = orchestrator_for(
        &tmp,
        "echo 'model load failed' >&2\nexit 3",
    )
    .await;

    let err = orchestrator.submit(upload("clip.mp4")).await.unwrap_err();
    match err {
        EngineError::AnalyzerFailed { exit_code, stderr } => {
            assert_eq!(exit_code, Some(3));
            assert!(stderr.contains("model load failed"));
        }
        other => panic!("expected AnalyzerFailed, got {other:?}"),
    }
    assert_eq!(workspace_count(orchestrator.work_dir()), 0);
}

#[tokio::test]
async fn hung_analyzer_times_out_and_leaves_no_process() {
    let tmp = TempDir::new().unwrap();
    let stub = write_stub(
        tmp.path(),
        r#"sleep 30 &
echo $! > "$(dirname "$0")/sleeper.pid"
wait"#,
    );
    let mut config = config_for(&tmp, &stub);
    config.job_timeout = Duration::from_secs(1);
    let orchestrator = Orchestrator::new(config).await.unwrap();

    let started = Instant::now();
    let err = orchestrator.submit(upload("clip.mp4")).await.unwrap_err();

    assert!(matches!(err, EngineError::AnalyzerTimedOut(1)));
    assert!(started.elapsed() < Duration::from_secs(8));
    assert_eq!(workspace_count(orchestrator.work_dir()), 0);

    // The whole process tree is gone, including the background sleeper
    let pid: i32 = std::fs::read_to_string(tmp.path().join("sleeper.pid"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    let deadline = Instant::now() + Duration::from_secs(3);
    while !process_gone(pid) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(process_gone(pid), "sleeper pid {pid} still running");
}

#[tokio::test]
async fn invalid_json_output_is_malformed() {
    let tmp = TempDir::new().unwrap();
    let orchestrator = orchestrator_for(&tmp, r#"printf 'not json' > "$2""#).await;

    let err = orchestrator.submit(upload("clip.mp4")).await.unwrap_err();
    assert!(matches!(err, EngineError::MalformedOutput(_)));
    assert_eq!(workspace_count(orchestrator.work_dir()), 0);
}

#[tokio::test]
async fn missing_output_file_is_malformed() {
    let tmp = TempDir::new().unwrap();
    let orchestrator = orchestrator_for(&tmp, "exit 0").await;

    let err = orchestrator.submit(upload("clip.mp4")).await.unwrap_err();
    assert!(matches!(err, EngineError::MalformedOutput(_)));
}

#[tokio::test]
async fn wrong_field_type_is_malformed() {
    let tmp = TempDir::new().unwrap();
    let orchestrator =
        orchestrator_for(&tmp, r#"printf '{"frameNotes": 42}' > "$2""#).await;

    let err = orchestrator.submit(upload("clip.mp4")).await.unwrap_err();
    assert!(matches!(err, EngineError::MalformedOutput(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn identical_client_filenames_never_collide() {
    let tmp = TempDir::new().unwrap();
    // Stub reports which workspace it ran in
    let orchestrator = Arc::new(
        orchestrator_for(
            &tmp,
            r#"printf '{"summary":"%s"}' "$(basename "$(dirname "$2")")" > "$2""#,
        )
        .await,
    );

    let a = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.submit(upload("clip.mp4")).await }
    });
    let b = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.submit(upload("clip.mp4")).await }
    });

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    assert!(a.summary.is_some());
    assert!(b.summary.is_some());
    assert_ne!(a.summary, b.summary, "jobs shared a workspace");
    assert_eq!(workspace_count(orchestrator.work_dir()), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_jobs_are_bounded_by_slot_limit() {
    let tmp = TempDir::new().unwrap();
    // Each run marks itself, waits, then records how many marks it can see
    let stub = write_stub(
        tmp.path(),
        r#"d="$(dirname "$0")"
touch "$d/running.$$"
sleep 1
ls "$d" | grep -c '^running\.' >> "$d/observed"
rm -f "$d/running.$$"
printf '{}' > "$2""#,
    );
    let mut config = config_for(&tmp, &stub);
    config.max_concurrent_jobs = 2;
    let orchestrator = Arc::new(Orchestrator::new(config).await.unwrap());

    let mut handles = Vec::new();
    for _ in 0..6 {
        let orchestrator = Arc::clone(&orchestrator);
        handles.push(tokio::spawn(async move {
            orchestrator.submit(upload("clip.mp4")).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let observed = std::fs::read_to_string(tmp.path().join("observed")).unwrap();
    let max_running = observed
        .lines()
        .filter_map(|l| l.trim().parse::<usize>().ok())
        .max()
        .unwrap();
    assert!(
        max_running <= 2,
        "observed {max_running} analyzers running simultaneously"
    );
    assert_eq!(workspace_count(orchestrator.work_dir()), 0);
}

#[tokio::test]
async fn missing_analyzer_binary_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = EngineConfig {
        analyzer_bin: "no-such-analyzer-binary-90d1".to_string(),
        work_dir: tmp.path().join("work"),
        ..EngineConfig::default()
    };
    let orchestrator = Orchestrator::new(config).await.unwrap();

    let err = orchestrator.submit(upload("clip.mp4")).await.unwrap_err();
    assert!(matches!(err, EngineError::AnalyzerNotFound(_)));
    // Workspace cleanup still ran
    assert_eq!(workspace_count(orchestrator.work_dir()), 0);
}

#[tokio::test]
async fn cancelled_submit_still_removes_workspace() {
    let tmp = TempDir::new().unwrap();
    let stub = write_stub(tmp.path(), "sleep 30");
    let orchestrator = Arc::new(Orchestrator::new(config_for(&tmp, &stub)).await.unwrap());

    let handle = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.submit(upload("clip.mp4")).await }
    });

    // Let the job reach the analyzer, then abort the caller
    let deadline = Instant::now() + Duration::from_secs(5);
    while workspace_count(orchestrator.work_dir()) == 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(workspace_count(orchestrator.work_dir()), 1);
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.abort();
    let _ = handle.await;

    let deadline = Instant::now() + Duration::from_secs(3);
    while workspace_count(orchestrator.work_dir()) != 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(workspace_count(orchestrator.work_dir()), 0);
}
