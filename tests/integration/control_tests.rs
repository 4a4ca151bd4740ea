use cleanup_lite::control::ScanControl;
use cleanup_lite::duplicates::{build_hash_pool, DuplicateFinder, FinderConfig};
use cleanup_lite::jobs::{spawn_duplicate_search, spawn_large_file_scan, ScanEvent};
use cleanup_lite::scanner::{big_files, HashError, Hasher, WalkerConfig};
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

fn populated(files: usize) -> TempDir {
    let dir = tempdir().unwrap();
    for i in 0..files {
        fs::write(dir.path().join(format!("f{i:03}.bin")), vec![b'q'; 64]).unwrap();
    }
    dir
}

#[test]
fn test_stop_before_scan_yields_nothing() {
    let dir = populated(20);
    let control = ScanControl::new();
    control.request_stop();

    assert_eq!(big_files(dir.path(), 0, &control).count(), 0);

    let finder = DuplicateFinder::new(FinderConfig::default(), control).unwrap();
    let mut groups = finder.find(dir.path());
    assert!(groups.next().is_none());
    assert!(groups.stats().interrupted);
}

#[test]
fn test_stop_mid_scan_ends_early() {
    let dir = populated(50);
    let control = ScanControl::new();

    let mut scan = big_files(dir.path(), 0, &control);
    let first: Vec<_> = scan.by_ref().take(5).collect();
    control.request_stop();

    assert_eq!(first.len(), 5);
    assert!(scan.next().is_none());
    assert!(scan.scanned() < 50);
}

#[test]
fn test_stopped_hash_reports_interrupted() {
    let dir = populated(1);
    let control = ScanControl::new();
    control.request_stop();

    let hasher = Hasher::new().with_control(control);
    let result = hasher.full_hash(&dir.path().join("f000.bin"));
    assert!(matches!(result, Err(HashError::Interrupted(_))));
}

#[test]
fn test_paused_scan_waits_for_resume() {
    let dir = populated(10);
    let control = ScanControl::new();
    control.pause();

    let worker_control = control.clone();
    let root = dir.path().to_path_buf();
    let worker = thread::spawn(move || big_files(&root, 0, &worker_control).count());

    thread::sleep(Duration::from_millis(100));
    assert!(!worker.is_finished());

    control.resume();
    assert_eq!(worker.join().unwrap(), 10);
}

#[test]
fn test_stop_releases_paused_scan() {
    let dir = populated(10);
    let control = ScanControl::new();
    control.pause();

    let worker_control = control.clone();
    let root = dir.path().to_path_buf();
    let worker = thread::spawn(move || big_files(&root, 0, &worker_control).count());

    thread::sleep(Duration::from_millis(50));
    control.request_stop();
    assert_eq!(worker.join().unwrap(), 0);
}

#[test]
fn test_stopped_job_still_sends_finished() {
    let dir = populated(30);
    let control = ScanControl::new();
    control.request_stop();

    let job =
        spawn_large_file_scan(dir.path(), 0, WalkerConfig::default(), control).unwrap();
    let events: Vec<ScanEvent> = job.receiver().iter().collect();
    job.join().unwrap();

    assert!(!events.iter().any(|e| matches!(e, ScanEvent::LargeFile(_))));
    assert!(matches!(
        events.last(),
        Some(ScanEvent::Finished { interrupted: true })
    ));
}

#[test]
fn test_duplicate_job_streams_groups_with_ids() {
    let dir = tempdir().unwrap();
    for (name, content) in [("a1", "AA"), ("a2", "AA"), ("b1", "BBB"), ("b2", "BBB")] {
        fs::write(dir.path().join(name), content).unwrap();
    }

    let pool = Arc::new(build_hash_pool(2).unwrap());
    let job = spawn_duplicate_search(
        dir.path(),
        FinderConfig::default(),
        pool,
        ScanControl::new(),
    )
    .unwrap();
    let events: Vec<ScanEvent> = job.receiver().iter().collect();
    job.join().unwrap();

    let ids: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::DuplicateGroup { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec![1, 2]);

    let stats = events.iter().find_map(|e| match e {
        ScanEvent::Stats(s) => Some(s.clone()),
        _ => None,
    });
    assert_eq!(stats.unwrap().groups, 2);
    assert!(matches!(
        events.last(),
        Some(ScanEvent::Finished { interrupted: false })
    ));
}
