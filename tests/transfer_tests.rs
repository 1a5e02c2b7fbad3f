mod utils;

use pandrive::engine::flatten::FlattenedFile;
use pandrive::engine::progress::FileStatus;
use pandrive::engine::transfer::{BatchState, TransferOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use utils::MockDrive;

fn plan(paths: &[&str]) -> Vec<FlattenedFile> {
    paths
        .iter()
        .map(|p| FlattenedFile {
            relative_path: p.to_string(),
            payload: PathBuf::from(format!("/fake/{p}")),
            size: 100,
        })
        .collect()
}

fn orchestrator(drive: Arc<MockDrive>) -> TransferOrchestrator {
    TransferOrchestrator::new(drive, Duration::ZERO)
}

#[tokio::test]
async fn batch_counts_add_up_with_forced_failures() {
    let drive = Arc::new(MockDrive::new());
    drive.fail_upload_of("b.txt");
    drive.fail_upload_of("d.txt");
    let mut orch = orchestrator(drive.clone());

    let files = plan(&["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]);
    let report = orch.upload_batch(&files, "0").await;

    assert_eq!(report.total, 5);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 2);
    assert_eq!(report.succeeded + report.failed, report.total);
    assert_eq!(report.failed_names, vec!["b.txt", "d.txt"]);
    assert!(!report.is_fatal());
}

#[tokio::test]
async fn one_failure_never_aborts_the_rest() {
    let drive = Arc::new(MockDrive::new());
    drive.fail_upload_of("a.txt");
    let mut orch = orchestrator(drive.clone());

    orch.upload_batch(&plan(&["a.txt", "b.txt", "c.txt"]), "0").await;

    let uploads = drive.uploads.lock().unwrap().clone();
    let names: Vec<&str> = uploads.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["b.txt", "c.txt"]);
}

#[tokio::test]
async fn all_failed_batch_is_fatal() {
    let drive = Arc::new(MockDrive::new());
    drive.fail_upload_of("a.txt");
    drive.fail_upload_of("b.txt");
    let mut orch = orchestrator(drive);

    let report = orch.upload_batch(&plan(&["a.txt", "b.txt"]), "0").await;
    assert!(report.is_fatal());
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 2);
}

#[tokio::test]
async fn batch_state_reaches_completed() {
    let drive = Arc::new(MockDrive::new());
    let mut orch = orchestrator(drive);
    assert_eq!(*orch.state(), BatchState::Idle);

    orch.upload_batch(&plan(&["a.txt", "b.txt"]), "0").await;
    assert_eq!(
        *orch.state(),
        BatchState::Completed {
            succeeded: 2,
            failed: 0
        }
    );
}

#[tokio::test]
async fn counters_reset_between_batches() {
    let drive = Arc::new(MockDrive::new());
    drive.fail_upload_of("bad.txt");
    let mut orch = orchestrator(drive);

    let first = orch.upload_batch(&plan(&["a.txt", "bad.txt"]), "0").await;
    assert_eq!((first.succeeded, first.failed), (1, 1));

    let second = orch.upload_batch(&plan(&["c.txt"]), "0").await;
    assert_eq!(second.total, 1);
    assert_eq!(second.succeeded, 1);
    assert_eq!(second.failed, 0);
    assert!(second.failed_names.is_empty());
}

#[tokio::test]
async fn nested_paths_materialize_containers_once() {
    let drive = Arc::new(MockDrive::new());
    let mut orch = orchestrator(drive.clone());

    let files = plan(&["dir/a.txt", "dir/b.txt", "dir/sub/c.txt"]);
    let report = orch.upload_batch(&files, "root").await;
    assert_eq!(report.succeeded, 3);

    // "dir" under root, "sub" under dir, each created exactly once.
    let created = drive.created.lock().unwrap().clone();
    assert_eq!(
        created,
        vec![
            ("dir".to_string(), "root".to_string()),
            ("sub".to_string(), "c0".to_string())
        ]
    );

    // Files landed in the containers of their own directory component.
    let uploads = drive.uploads.lock().unwrap().clone();
    assert_eq!(uploads[0], ("a.txt".to_string(), "c0".to_string()));
    assert_eq!(uploads[1], ("b.txt".to_string(), "c0".to_string()));
    assert_eq!(uploads[2], ("c.txt".to_string(), "c1".to_string()));
}

#[tokio::test]
async fn single_upload_reports_byte_progress_and_fid() {
    let drive = Arc::new(MockDrive::new());
    let mut orch = orchestrator(drive);

    let file = FlattenedFile {
        relative_path: "movie.mkv".to_string(),
        payload: PathBuf::from("/fake/movie.mkv"),
        size: 200,
    };
    let fid = orch.upload_one(&file, "0").await.expect("upload ok");
    assert_eq!(fid, "f-movie.mkv");

    let snapshot = orch.tracker().snapshot();
    assert_eq!(snapshot.files.len(), 1);
    assert_eq!(snapshot.files[0].status, FileStatus::Done);
}

#[tokio::test]
async fn single_upload_failure_is_an_error_not_a_report() {
    let drive = Arc::new(MockDrive::new());
    drive.fail_upload_of("movie.mkv");
    let mut orch = orchestrator(drive);

    let file = FlattenedFile {
        relative_path: "movie.mkv".to_string(),
        payload: PathBuf::from("/fake/movie.mkv"),
        size: 200,
    };
    let err = orch.upload_one(&file, "0").await.expect_err("forced failure");
    assert!(err.to_string().contains("rejected"));

    let snapshot = orch.tracker().snapshot();
    assert!(matches!(snapshot.files[0].status, FileStatus::Failed(_)));
}

#[tokio::test]
async fn cumulative_progress_is_settled_over_total() {
    let drive = Arc::new(MockDrive::new());
    drive.fail_upload_of("b.txt");
    let mut orch = orchestrator(drive);

    orch.upload_batch(&plan(&["a.txt", "b.txt", "c.txt", "d.txt"]), "0").await;

    let snapshot = orch.tracker().snapshot();
    assert_eq!(snapshot.completed, 4);
    assert_eq!(snapshot.total, 4);
    assert!(snapshot.is_complete());
    assert_eq!(snapshot.percent(), 100.0);
}
