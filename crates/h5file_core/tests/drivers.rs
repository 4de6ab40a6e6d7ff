//! Integration tests for drivers and compatibility bounds.

use h5file_core::{
    open, Config, Container, CoreError, DriverOptions, DriverSpec, VersionBounds, VersionTag,
};
use tempfile::tempdir;

#[test]
fn default_driver_reports_platform_name() {
    let dir = tempdir().unwrap();
    let file = open(
        dir.path().join("d.h5"),
        "w",
        None,
        &DriverOptions::new(),
        None,
    )
    .unwrap();
    assert_eq!(file.driver(), "sec2");
    assert_eq!(file.driver_spec(), DriverSpec::Sec2);
}

#[test]
fn named_drivers_report_their_name() {
    let dir = tempdir().unwrap();
    for name in ["sec2", "stdio", "core"] {
        let path = dir.path().join(format!("{name}.h5"));
        let file = open(&path, "w", Some(name), &DriverOptions::new(), None).unwrap();
        assert_eq!(file.driver(), name);
        file.create_group("g").unwrap();
        file.close().unwrap();
    }
}

#[test]
fn stdio_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stdio.h5");
    let file = open(&path, "w", Some("stdio"), &DriverOptions::new(), None).unwrap();
    file.create_group("buffered").unwrap();
    file.close().unwrap();

    let file = open(&path, "r", Some("stdio"), &DriverOptions::new(), None).unwrap();
    assert!(file.contains("buffered"));
}

#[test]
fn unknown_driver_touches_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("none.h5");
    let err = open(&path, "w", Some("mpio"), &DriverOptions::new(), None).unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedDriver { .. }));
    assert!(!path.exists());
}

#[test]
fn core_without_backing_store_leaves_no_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("core.h5");
    let options = DriverOptions::new().with("backing_store", false);

    let file = open(&path, "w", Some("core"), &options, None).unwrap();
    file.create_group("lost").unwrap();
    assert!(file.contains("lost"));
    file.close().unwrap();

    assert!(!path.exists());
}

#[test]
fn core_with_backing_store_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("core.h5");
    let options = DriverOptions::new().with("backing_store", true);

    let file = open(&path, "w", Some("core"), &options, None).unwrap();
    file.create_group("kept").unwrap();
    file.close().unwrap();
    assert!(path.exists());

    let file = Container::open(&path, "r").unwrap();
    assert!(file.contains("kept"));
}

#[test]
fn core_rejects_bad_options() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("core.h5");

    let options = DriverOptions::new().with("block_size", 0);
    let err = open(&path, "w", Some("core"), &options, None).unwrap_err();
    assert!(matches!(err, CoreError::InvalidOption { .. }));

    let options = DriverOptions::new().with("colour", "blue");
    let err = open(&path, "w", Some("core"), &options, None).unwrap_err();
    assert!(matches!(err, CoreError::InvalidOption { .. }));
    assert!(!path.exists());
}

#[test]
fn family_spans_members() {
    let dir = tempdir().unwrap();
    let pattern = dir.path().join("fam-%d.h5");
    let options = DriverOptions::new().with("member_size", 64);

    let file = open(&pattern, "w", Some("family"), &options, None).unwrap();
    for i in 0..8 {
        file.create_group(&format!("group-{i}")).unwrap();
    }
    file.close().unwrap();

    assert_eq!(file.filename(), pattern);
    assert!(dir.path().join("fam-0.h5").exists());
    assert!(dir.path().join("fam-1.h5").exists());

    let file = open(&pattern, "r", Some("family"), &options, None).unwrap();
    assert_eq!(file.root().len().unwrap(), 8);
}

#[test]
fn family_append_probes_first_member() {
    let dir = tempdir().unwrap();
    let pattern = dir.path().join("fam-%d.h5");
    let options = DriverOptions::new().with("member_size", 1024);

    let file = open(&pattern, "a", Some("family"), &options, None).unwrap();
    file.create_group("x").unwrap();
    file.close().unwrap();

    let file = open(&pattern, "a", Some("family"), &options, None).unwrap();
    assert!(file.contains("x"));
}

#[test]
fn family_requires_placeholder() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plain.h5");
    let err = open(&path, "w", Some("family"), &DriverOptions::new(), None).unwrap_err();
    assert!(matches!(err, CoreError::Io { .. }));
}

#[test]
fn libver_defaults_to_widest() {
    let dir = tempdir().unwrap();
    let file = open(
        dir.path().join("v.h5"),
        "w",
        None,
        &DriverOptions::new(),
        None,
    )
    .unwrap();
    assert_eq!(file.libver().as_strs(), ("earliest", "latest"));
}

#[test]
fn libver_single_and_pair() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("v.h5");

    let file = open(&path, "w", None, &DriverOptions::new(), Some("latest".into())).unwrap();
    assert_eq!(file.libver().as_strs(), ("latest", "latest"));
    file.close().unwrap();

    let file = open(
        &path,
        "w",
        None,
        &DriverOptions::new(),
        Some(("earliest", "v110").into()),
    )
    .unwrap();
    assert_eq!(file.libver().as_strs(), ("earliest", "v110"));
    assert_eq!(file.stored_libver().unwrap(), file.libver());
}

#[test]
fn libver_rejects_inverted_pair() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("v.h5");
    let err = open(
        &path,
        "w",
        None,
        &DriverOptions::new(),
        Some(("latest", "earliest").into()),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidBounds { .. }));
    assert!(!path.exists());
}

#[test]
fn stored_bounds_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("v.h5");
    let pinned = VersionBounds::single(VersionTag::V18);

    let config = Config::new()
        .mode(h5file_core::Mode::CreateTruncate)
        .libver(pinned);
    Container::open_with_config(&path, config).unwrap().close().unwrap();

    let file = Container::open(&path, "r").unwrap();
    assert_eq!(file.libver(), VersionBounds::WIDEST);
    assert_eq!(file.stored_libver().unwrap(), pinned);
}
