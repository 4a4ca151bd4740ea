use cleanup_lite::recycle::{
    delete_permanently, ensure_recycle, load_manifest, move_to_recycle, restore_from_recycle,
    RecycleError, RecycleStore, MANIFEST_FILE, RECYCLE_DIR_NAME,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_full_lifecycle() {
    let root = tempdir().unwrap();
    let original = root.path().join("docs/report.pdf");
    write(&original, "report");

    let recycled = move_to_recycle(root.path(), &original).unwrap();
    assert!(!original.exists());
    assert_eq!(fs::read_to_string(&recycled).unwrap(), "report");
    assert_eq!(
        recycled.parent().unwrap().file_name().unwrap(),
        RECYCLE_DIR_NAME
    );

    let dir = ensure_recycle(root.path()).unwrap();
    assert!(restore_from_recycle(&dir, &recycled));
    assert_eq!(fs::read_to_string(&original).unwrap(), "report");

    let recycled = move_to_recycle(root.path(), &original).unwrap();
    assert!(delete_permanently(&dir, &recycled));
    assert!(!recycled.exists());
    assert!(!original.exists());
    assert!(load_manifest(&dir).is_empty());
}

#[test]
fn test_manifest_is_a_json_object_of_paths() {
    let root = tempdir().unwrap();
    let a = root.path().join("a.txt");
    let b = root.path().join("sub/b.txt");
    write(&a, "a");
    write(&b, "b");

    let ra = move_to_recycle(root.path(), &a).unwrap();
    let rb = move_to_recycle(root.path(), &b).unwrap();

    let dir = root.path().join(RECYCLE_DIR_NAME);
    let raw = fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap();
    let map: HashMap<String, String> = serde_json::from_str(&raw).unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(map[&ra.to_string_lossy().into_owned()], a.to_string_lossy());
    assert_eq!(map[&rb.to_string_lossy().into_owned()], b.to_string_lossy());
}

#[test]
fn test_name_collisions_get_numbered() {
    let root = tempdir().unwrap();
    let mut recycled = Vec::new();
    for dir in ["one", "two", "three"] {
        let path = root.path().join(dir).join("photo.jpg");
        write(&path, dir);
        recycled.push(move_to_recycle(root.path(), &path).unwrap());
    }

    let names: Vec<String> = recycled
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["photo.jpg", "photo (1).jpg", "photo (2).jpg"]);

    let dir = ensure_recycle(root.path()).unwrap();
    for r in &recycled {
        assert!(restore_from_recycle(&dir, r));
    }
    for dir in ["one", "two", "three"] {
        let content = fs::read_to_string(root.path().join(dir).join("photo.jpg")).unwrap();
        assert_eq!(content, dir);
    }
}

#[test]
fn test_directory_can_be_recycled_and_restored() {
    let root = tempdir().unwrap();
    let folder = root.path().join("old-project");
    write(&folder.join("src/main.c"), "int main;");
    write(&folder.join("README"), "hi");

    let store = RecycleStore::open(root.path()).unwrap();
    let recycled = store.move_in(&folder).unwrap();
    assert!(recycled.join("src/main.c").is_file());
    assert!(!folder.exists());

    store.restore(&recycled).unwrap();
    assert_eq!(fs::read_to_string(folder.join("README")).unwrap(), "hi");
}

#[test]
fn test_restore_never_overwrites() {
    let root = tempdir().unwrap();
    let path = root.path().join("a.txt");
    write(&path, "old");

    let store = RecycleStore::open(root.path()).unwrap();
    let recycled = store.move_in(&path).unwrap();
    write(&path, "new");

    assert!(matches!(
        store.restore(&recycled),
        Err(RecycleError::OriginalOccupied(_))
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    assert!(recycled.exists());
    assert_eq!(store.entries().len(), 1);
}

#[test]
fn test_restore_recreates_missing_parents() {
    let root = tempdir().unwrap();
    let path = root.path().join("deep/nested/dir/file.txt");
    write(&path, "x");

    let store = RecycleStore::open(root.path()).unwrap();
    let recycled = store.move_in(&path).unwrap();
    fs::remove_dir_all(root.path().join("deep")).unwrap();

    assert_eq!(store.restore(&recycled).unwrap(), path);
    assert!(path.is_file());
}

#[test]
fn test_restore_by_bare_name() {
    let root = tempdir().unwrap();
    let path = root.path().join("notes.txt");
    write(&path, "x");

    let store = RecycleStore::open(root.path()).unwrap();
    store.move_in(&path).unwrap();

    assert_eq!(store.restore(Path::new("notes.txt")).unwrap(), path);
}

#[test]
fn test_restore_all_and_purge_all() {
    let root = tempdir().unwrap();
    let store = RecycleStore::open(root.path()).unwrap();
    let paths: Vec<_> = (0..4).map(|i| root.path().join(format!("f{i}.txt"))).collect();
    for p in &paths {
        write(p, "x");
    }

    assert!(store.move_batch(&paths).all_succeeded());
    let outcome = store.restore_all();
    assert_eq!(outcome.success_count(), 4);
    assert!(paths.iter().all(|p| p.exists()));
    assert!(store.entries().is_empty());

    store.move_batch(&paths);
    let outcome = store.purge_all();
    assert_eq!(outcome.success_count(), 4);
    assert!(paths.iter().all(|p| !p.exists()));
    assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
}

#[test]
fn test_batch_reports_partial_failure() {
    let root = tempdir().unwrap();
    let real = root.path().join("real.txt");
    write(&real, "x");

    let store = RecycleStore::open(root.path()).unwrap();
    let outcome = store.move_batch([real.clone(), root.path().join("ghost.txt")]);

    assert_eq!(outcome.success_count(), 1);
    assert_eq!(outcome.failure_count(), 1);
    assert!(matches!(outcome.failed[0].1, RecycleError::SourceMissing(_)));
    assert_eq!(outcome.summary("Moved"), "Moved 1 item(s), 1 failed");
}

#[test]
fn test_corrupt_manifest_reads_as_empty() {
    let root = tempdir().unwrap();
    let dir = ensure_recycle(root.path()).unwrap();
    fs::write(dir.join(MANIFEST_FILE), "{ not json").unwrap();

    assert!(load_manifest(&dir).is_empty());

    // A new move still succeeds and rewrites a valid manifest.
    let path = root.path().join("a.txt");
    write(&path, "a");
    move_to_recycle(root.path(), &path).unwrap();
    assert_eq!(load_manifest(&dir).len(), 1);
}

#[test]
fn test_recycling_the_recycle_area_is_refused() {
    let root = tempdir().unwrap();
    let store = RecycleStore::open(root.path()).unwrap();

    assert!(matches!(
        store.move_in(store.dir()),
        Err(RecycleError::InsideRecycle(_))
    ));
    assert!(matches!(
        store.move_in(&store.dir().join(MANIFEST_FILE)),
        Err(RecycleError::InsideRecycle(_))
    ));
}
