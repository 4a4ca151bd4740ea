use cleanup_lite::control::ScanControl;
use cleanup_lite::recycle::move_to_recycle;
use cleanup_lite::scanner::{big_files, LargeFiles, Walker, WalkerConfig};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn write(path: &std::path::Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'z'; len]).unwrap();
}

#[test]
fn test_walk_finds_nested_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), 1);
    write(&dir.path().join("x/b.txt"), 1);
    write(&dir.path().join("x/y/z/c.txt"), 1);
    fs::create_dir_all(dir.path().join("empty")).unwrap();

    let walker = Walker::new(dir.path(), WalkerConfig::default());
    let names: BTreeSet<String> = walker
        .walk()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(
        names,
        ["a.txt", "b.txt", "c.txt"].iter().map(|s| s.to_string()).collect()
    );
}

#[test]
fn test_walk_yields_absolute_paths() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), 1);

    for path in Walker::new(dir.path(), WalkerConfig::default()).walk() {
        assert!(path.is_absolute());
    }
}

#[test]
fn test_big_files_threshold_is_inclusive() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("small.bin"), 99);
    write(&dir.path().join("exact.bin"), 100);
    write(&dir.path().join("deep/large.bin"), 250);

    let control = ScanControl::new();
    let mut found: Vec<(String, u64)> = big_files(dir.path(), 100, &control)
        .map(|f| (f.path.file_name().unwrap().to_string_lossy().into_owned(), f.size))
        .collect();
    found.sort();

    assert_eq!(
        found,
        vec![("exact.bin".to_string(), 100), ("large.bin".to_string(), 250)]
    );
}

#[test]
fn test_big_files_missing_root_is_empty() {
    let dir = tempdir().unwrap();
    let control = ScanControl::new();
    assert_eq!(big_files(&dir.path().join("nope"), 0, &control).count(), 0);
}

#[test]
fn test_recycled_files_are_not_scanned() {
    let dir = tempdir().unwrap();
    let keep = dir.path().join("keep.bin");
    let gone = dir.path().join("gone.bin");
    write(&keep, 10);
    write(&gone, 10);
    move_to_recycle(dir.path(), &gone).unwrap();

    let control = ScanControl::new();
    let found: Vec<PathBuf> = big_files(dir.path(), 0, &control).map(|f| f.path).collect();
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("keep.bin"));

    let config = WalkerConfig::default().with_include_recycle_dir(true);
    let all = Walker::new(dir.path(), config).walk().count();
    // keep.bin, the recycled file and manifest.json
    assert_eq!(all, 3);
}

#[test]
fn test_scanned_counter_counts_every_file() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        write(&dir.path().join(format!("f{i}")), i);
    }

    let walker = Walker::new(dir.path(), WalkerConfig::default());
    let mut large = LargeFiles::new(walker, 3, ScanControl::new());
    let found = large.by_ref().count();

    assert_eq!(found, 2);
    assert_eq!(large.scanned(), 5);
}

#[cfg(unix)]
#[test]
fn test_follow_symlinks_descends_into_linked_dirs() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    write(&outside.path().join("target.bin"), 10);
    std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

    let control = ScanControl::new();
    assert_eq!(big_files(dir.path(), 0, &control).count(), 0);

    let walker = Walker::new(dir.path(), WalkerConfig::default().with_follow_symlinks(true));
    let found: Vec<_> = LargeFiles::new(walker, 0, control).collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].size, 10);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(&dir.path().join("ok.bin"), 10);
    let locked = dir.path().join("locked");
    write(&locked.join("hidden.bin"), 10);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let control = ScanControl::new();
    let found: Vec<_> = big_files(dir.path(), 0, &control).collect();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    // Root may read the directory anyway; the scan must simply not fail.
    assert!(found.iter().any(|f| f.path.ends_with("ok.bin")));
}
