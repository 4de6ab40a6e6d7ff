//! Integration tests for shared handles and liveness.

use h5file_core::{Container, CoreError};
use std::collections::HashSet;
use tempfile::tempdir;

#[test]
fn owner_lookup_yields_equal_container() {
    let dir = tempdir().unwrap();
    let file = Container::open(dir.path().join("alias.h5"), "w").unwrap();
    let group = file.create_group("foo").unwrap();

    let via_group = group.file();
    let via_root = file.root().file();
    assert_eq!(via_group, file);
    assert_eq!(via_root, file);
    assert_eq!(via_group.mode(), file.mode());
    assert_eq!(via_group.id(), file.id());

    let set: HashSet<Container> = [file.clone(), via_group, via_root].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn close_through_alias_closes_all() {
    let dir = tempdir().unwrap();
    let file = Container::open(dir.path().join("alias.h5"), "w").unwrap();
    let group = file.create_group("foo").unwrap();
    let alias = group.file();

    assert!(file.is_open());
    assert!(alias.is_open());

    alias.close().unwrap();
    assert!(!file.is_open());
    assert!(!alias.is_open());
    assert!(!group.file().is_open());
    assert!(matches!(file.create_group("bar"), Err(CoreError::Closed)));
}

#[test]
fn close_through_root_owner() {
    let dir = tempdir().unwrap();
    let file = Container::open(dir.path().join("alias.h5"), "w").unwrap();
    file.root().file().close().unwrap();
    assert!(!file.is_open());
}

#[test]
fn separate_opens_are_distinct_handles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("two.h5");
    Container::open(&path, "w").unwrap().close().unwrap();

    let first = Container::open(&path, "r").unwrap();
    let second = Container::open(&path, "r").unwrap();
    assert_ne!(first, second);
    assert_ne!(first.id(), second.id());

    first.close().unwrap();
    assert!(second.is_open());
}

#[test]
fn liveness_follows_open_and_close() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("live.h5");

    let file = Container::open(&path, "w").unwrap();
    assert!(file.is_open());
    file.close().unwrap();
    assert!(!file.is_open());

    assert!(Container::open(dir.path().join("nope.h5"), "r").is_err());
}

#[test]
fn dropping_every_handle_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drop.h5");
    {
        let file = Container::open(&path, "w").unwrap();
        let group = file.create_group("kept").unwrap();
        drop(file);
        group.create_group("inner").unwrap_err();
    }
    let file = Container::open(&path, "r").unwrap();
    assert!(file.contains("kept"));
}

#[test]
fn unicode_filename_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("α β γ.h5");

    let file = Container::open(&path, "w").unwrap();
    assert_eq!(file.filename(), path);
    assert!(file.to_string().contains("α β γ.h5"));
    file.close().unwrap();

    let file = Container::open(&path, "r").unwrap();
    assert_eq!(file.filename(), path);
}

#[test]
fn filename_is_verbatim() {
    let dir = tempdir().unwrap();
    let relative = dir.path().join("sub").join("..").join("verbatim.h5");
    std::fs::create_dir(dir.path().join("sub")).unwrap();

    let file = Container::open(&relative, "w").unwrap();
    assert_eq!(file.filename(), relative);
}

#[test]
fn display_reports_state() {
    let dir = tempdir().unwrap();
    let file = Container::open(dir.path().join("repr.h5"), "w").unwrap();
    assert!(file.to_string().starts_with("<h5file container"));
    file.close().unwrap();
    assert_eq!(file.to_string(), "<closed h5file container>");
}

#[test]
#[allow(deprecated)]
fn legacy_identifier_matches() {
    let dir = tempdir().unwrap();
    let file = Container::open(dir.path().join("fid.h5"), "w").unwrap();
    assert_eq!(file.fid(), file.id());
}

#[test]
fn flush_persists_without_close() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("flush.h5");

    let file = Container::open(&path, "w").unwrap();
    file.create_group("early").unwrap();
    file.flush().unwrap();

    let reader = Container::open(&path, "r").unwrap();
    assert!(reader.contains("early"));

    file.close().unwrap();
    assert!(matches!(file.flush(), Err(CoreError::Closed)));
}

#[test]
fn handles_cross_threads() {
    let dir = tempdir().unwrap();
    let file = Container::open(dir.path().join("threads.h5"), "w").unwrap();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let file = file.clone();
            std::thread::spawn(move || file.create_group(&format!("t{i}")).map(|_| ()))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap().unwrap();
    }
    assert_eq!(file.root().len().unwrap(), 4);
}
