use cleanup_lite::control::ScanControl;
use cleanup_lite::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig};
use cleanup_lite::recycle::RecycleStore;
use cleanup_lite::scanner::{HashAlgorithm, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn search(root: &Path, config: FinderConfig) -> Vec<DuplicateGroup> {
    let finder = DuplicateFinder::new(config, ScanControl::new()).unwrap();
    finder.find(root).collect()
}

fn sorted_names(group: &DuplicateGroup) -> Vec<String> {
    let mut names: Vec<String> = group
        .paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_empty_directory_has_no_groups() {
    let dir = tempdir().unwrap();
    assert!(search(dir.path(), FinderConfig::default()).is_empty());
}

#[test]
fn test_duplicates_across_directories() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("photos/a.jpg"), b"same bytes");
    write(&dir.path().join("backup/2024/a-copy.jpg"), b"same bytes");
    write(&dir.path().join("other.jpg"), b"diff bytes");

    let groups = search(dir.path(), FinderConfig::default());

    assert_eq!(groups.len(), 1);
    assert_eq!(sorted_names(&groups[0]), vec!["a-copy.jpg", "a.jpg"]);
    assert_eq!(groups[0].size, 10);
    assert_eq!(groups[0].wasted_space(), 10);
}

#[test]
fn test_same_size_different_content_is_not_grouped() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"aaaa");
    write(&dir.path().join("b"), b"bbbb");
    write(&dir.path().join("c"), b"cccc");

    assert!(search(dir.path(), FinderConfig::default()).is_empty());
}

#[test]
fn test_min_size_excludes_small_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("s1"), b"tiny");
    write(&dir.path().join("s2"), b"tiny");
    write(&dir.path().join("b1"), &[7u8; 2048]);
    write(&dir.path().join("b2"), &[7u8; 2048]);

    let groups = search(dir.path(), FinderConfig::default().with_min_size(1024));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 2048);
}

#[test]
fn test_multiple_groups_within_one_size() {
    let dir = tempdir().unwrap();
    for i in 0..3 {
        write(&dir.path().join(format!("x{i}")), b"XXXX");
        write(&dir.path().join(format!("y{i}")), b"YYYY");
    }
    write(&dir.path().join("z"), b"ZZZZ");

    let groups = search(dir.path(), FinderConfig::default());

    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.len() == 3));
    let total: usize = groups.iter().map(DuplicateGroup::len).sum();
    assert_eq!(total, 6);
}

#[test]
fn test_bucket_cap_never_splits_a_group() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        write(&dir.path().join(format!("copy{i}.bin")), b"identical");
    }
    write(&dir.path().join("odd.bin"), b"different");

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_bucket_cap(3),
        ScanControl::new(),
    )
    .unwrap();
    let mut groups = finder.find(dir.path());
    let found: Vec<_> = groups.by_ref().collect();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].len(), 10);
    assert_eq!(groups.stats().early_flushes, 3);
    assert_eq!(groups.stats().files_hashed, 11);
}

#[test]
fn test_groups_are_emitted_by_ascending_size() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("big1"), &[1u8; 300]);
    write(&dir.path().join("big2"), &[1u8; 300]);
    write(&dir.path().join("mid1"), &[2u8; 200]);
    write(&dir.path().join("mid2"), &[2u8; 200]);
    write(&dir.path().join("small1"), &[3u8; 100]);
    write(&dir.path().join("small2"), &[3u8; 100]);

    let sizes: Vec<u64> = search(dir.path(), FinderConfig::default())
        .iter()
        .map(|g| g.size)
        .collect();
    assert_eq!(sizes, vec![100, 200, 300]);
}

#[test]
fn test_blake3_and_sha256_agree_on_grouping() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"payload");
    write(&dir.path().join("b"), b"payload");

    let sha = search(dir.path(), FinderConfig::default());
    let blake = search(
        dir.path(),
        FinderConfig::default().with_algorithm(HashAlgorithm::Blake3),
    );

    assert_eq!(sha.len(), 1);
    assert_eq!(blake.len(), 1);
    assert_ne!(sha[0].hash, blake[0].hash);
    assert_eq!(sorted_names(&sha[0]), sorted_names(&blake[0]));
}

#[test]
fn test_small_chunk_size_gives_same_groups() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    write(&dir.path().join("a"), &content);
    write(&dir.path().join("b"), &content);

    let default = search(dir.path(), FinderConfig::default());
    let chunked = search(dir.path(), FinderConfig::default().with_chunk_size(7));

    assert_eq!(default.len(), 1);
    assert_eq!(default[0].hash, chunked[0].hash);
}

#[test]
fn test_recycling_extras_removes_group_on_rescan() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a/one.txt"), b"dup dup");
    write(&dir.path().join("b/one.txt"), b"dup dup");
    write(&dir.path().join("c/one.txt"), b"dup dup");

    let groups = search(dir.path(), FinderConfig::default());
    assert_eq!(groups.len(), 1);

    let store = RecycleStore::open(dir.path()).unwrap();
    let outcome = store.move_batch(groups[0].extras());
    assert!(outcome.all_succeeded());
    assert_eq!(outcome.success_count(), 2);

    assert!(search(dir.path(), FinderConfig::default()).is_empty());
    assert_eq!(store.entries().len(), 2);

    // The recycled copies are visible again when the recycle area is walked.
    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_include_recycle_dir(true));
    let groups = search(dir.path(), config);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
}

#[test]
fn test_missing_root_yields_nothing() {
    let dir = tempdir().unwrap();
    let missing: PathBuf = dir.path().join("missing");
    assert!(search(&missing, FinderConfig::default()).is_empty());
}

#[test]
#[cfg(unix)]
fn test_recycling_extras_leaves_symlinked_file_in_place() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("z_real.bin");
    write(&real, &[9; 1000]);
    std::os::unix::fs::symlink(&real, dir.path().join("a_link.bin")).unwrap();

    let groups = search(dir.path(), FinderConfig::default().with_min_size(0));
    assert!(groups.is_empty());

    let store = RecycleStore::open(dir.path()).unwrap();
    for group in &groups {
        store.move_batch(group.extras());
    }
    assert_eq!(fs::read(&real).unwrap(), vec![9; 1000]);
    assert!(store.entries().is_empty());
}
