use super::*;
use tempfile::TempDir;

#[test]
fn parse_skips_blank_lines_and_whitespace() {
    let set = IgnoreSet::parse("/srv/data/private\n\n   /srv/data/notes.txt  \n\t\n");

    assert_eq!(set.len(), 2);
    assert!(set.contains(Path::new("/srv/data/private")));
    assert!(set.contains(Path::new("/srv/data/notes.txt")));
    assert!(!set.contains(Path::new("/srv/data")));
}

#[test]
fn trailing_separator_matches_same_directory() {
    let set = IgnoreSet::parse("/srv/data/private/\n");
    assert!(set.contains(Path::new("/srv/data/private")));
}

#[test]
fn relative_entries_resolve_against_current_dir() {
    let set = IgnoreSet::parse("build\n");
    let expected = std::env::current_dir()
        .expect("should have a current dir")
        .join("build");
    assert!(set.contains(&expected));
}

#[test]
fn empty_content_gives_empty_set() {
    let set = IgnoreSet::parse("");
    assert!(set.is_empty());
    assert_eq!(set, IgnoreSet::new());
}

#[test]
fn load_reads_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let list = temp_dir.path().join("ignore.txt");
    std::fs::write(&list, "/a/b\n/c/d.txt\n").expect("should write ignore list");

    let set = IgnoreSet::load(&list)
        .expect("should read ignore list")
        .expect("ignore list should exist");
    assert_eq!(set.len(), 2);
    assert_eq!(set.iter().count(), 2);
}

#[test]
fn load_missing_file_is_none() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let result = IgnoreSet::load(&temp_dir.path().join("missing.txt"))
        .expect("missing file is not an error");
    assert!(result.is_none());
}

#[test]
fn parent_components_are_collapsed() {
    let set = IgnoreSet::parse("/srv/data/sub/../private\n/srv/./data/notes.txt\n");

    assert!(set.contains(Path::new("/srv/data/private")));
    assert!(set.contains(Path::new("/srv/data/notes.txt")));
    assert!(!set.contains(Path::new("/srv/data/sub/../private")));
}
