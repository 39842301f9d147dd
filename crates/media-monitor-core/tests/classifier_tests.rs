mod common;

use common::{root_path, FakeFilesystem, ROOT};
use media_monitor_core::classifier::{prepare_event, Observation};
use media_monitor_core::{
    Action, Catalog, Error, Event, EventInfo, MatchFlags, MediaDraft, MediaRecord, Pattern,
    Probed, SharedCatalog,
};
use std::path::Path;

fn empty_catalog() -> SharedCatalog {
    SharedCatalog::new(Catalog::with_root(ROOT))
}

fn catalog_with(file: &str, hash: Probed<String>) -> SharedCatalog {
    let catalog = empty_catalog();
    catalog
        .add(MediaDraft::new(file).hash(hash), &FakeFilesystem::new())
        .unwrap();
    catalog
}

fn classify(catalog: &SharedCatalog, fs: &FakeFilesystem, observation: Observation) -> Event {
    prepare_event(catalog, fs, Path::new(ROOT), &observation).unwrap()
}

fn expected(action: Action, info: EventInfo, is_in_catalog: bool) -> Event {
    let mut event = Event::new("filename", "", false, ROOT);
    event.action = action;
    event.info = info;
    event.is_in_catalog = is_in_catalog;
    event
}

fn stored(catalog: &SharedCatalog, file: &str) -> Vec<MediaRecord> {
    catalog
        .find(&Pattern::path(file, ""), MatchFlags::exact())
        .unwrap()
}

#[test]
fn test_new_file_not_in_catalog_not_exists() {
    let event = classify(
        &empty_catalog(),
        &FakeFilesystem::new(),
        Observation::new(root_path("filename"), Action::New),
    );
    assert_eq!(event.action, Action::NotProcessing);
    assert!(!event.is_in_catalog);
}

#[test]
fn test_new_file_not_in_catalog_exists() {
    let fs = FakeFilesystem::new().with_file(root_path("filename"), "h1");
    let event = classify(
        &empty_catalog(),
        &fs,
        Observation::new(root_path("filename"), Action::New),
    );
    assert_eq!(
        event,
        expected(Action::New, EventInfo::Hash("h1".into()), false)
    );
}

#[test]
fn test_new_file_in_catalog_not_exists() {
    let catalog = catalog_with("filename", "xxx".into());
    let event = classify(
        &catalog,
        &FakeFilesystem::new(),
        Observation::new(root_path("filename"), Action::New),
    );
    assert_eq!(event, expected(Action::Missing, EventInfo::None, true));
}

#[test]
fn test_new_file_in_catalog_exists_bad_hash() {
    let catalog = catalog_with("filename", "xxx".into());
    let fs = FakeFilesystem::new().with_file(root_path("filename"), "yyy");
    let event = classify(
        &catalog,
        &fs,
        Observation::new(root_path("filename"), Action::New),
    );
    assert_eq!(
        event,
        expected(
            Action::BadHash,
            EventInfo::Records(stored(&catalog, "filename")),
            true
        )
    );
}

#[test]
fn test_new_file_in_catalog_exists_good_hash() {
    let catalog = catalog_with("filename", Probed::Unknown);
    let fs = FakeFilesystem::new().with_unhashable_file(root_path("filename"));
    let event = classify(
        &catalog,
        &fs,
        Observation::new(root_path("filename"), Action::New),
    );
    assert_eq!(event.action, Action::NotProcessing);
    assert!(event.is_in_catalog);
}

#[test]
fn test_new_file_not_in_catalog_another_record_with_same_hash() {
    let catalog = catalog_with("duplicate", "xxx".into());
    let fs = FakeFilesystem::new().with_file(root_path("filename"), "xxx");
    let event = classify(
        &catalog,
        &fs,
        Observation::new(root_path("filename"), Action::New),
    );
    assert_eq!(event.action, Action::Duplicate);
    assert!(event.is_in_catalog);
    assert_eq!(
        event.info,
        EventInfo::Records(stored(&catalog, "duplicate"))
    );
}

#[test]
fn test_unhashable_file_is_never_a_duplicate() {
    let catalog = catalog_with("other", Probed::Unknown);
    let fs = FakeFilesystem::new().with_unhashable_file(root_path("filename"));
    let event = classify(
        &catalog,
        &fs,
        Observation::new(root_path("filename"), Action::New),
    );
    assert_eq!(
        event,
        expected(Action::New, EventInfo::Hash(Probed::Unknown), false)
    );
}

#[test]
fn test_missing_file_not_in_catalog_not_exists() {
    let event = classify(
        &empty_catalog(),
        &FakeFilesystem::new(),
        Observation::new(root_path("filename"), Action::Missing),
    );
    assert_eq!(event.action, Action::NotProcessing);
}

#[test]
fn test_missing_file_not_in_catalog_exists() {
    let fs = FakeFilesystem::new().with_file(root_path("filename"), "h1");
    let event = classify(
        &empty_catalog(),
        &fs,
        Observation::new(root_path("filename"), Action::Missing),
    );
    assert_eq!(
        event,
        expected(Action::New, EventInfo::Hash("h1".into()), false)
    );
}

#[test]
fn test_missing_file_in_catalog_not_exists() {
    let catalog = catalog_with("filename", Probed::Unknown);
    let event = classify(
        &catalog,
        &FakeFilesystem::new(),
        Observation::new(root_path("filename"), Action::Missing),
    );
    assert_eq!(event, expected(Action::Missing, EventInfo::None, true));
}

#[test]
fn test_missing_file_in_catalog_exists_bad_hash() {
    let catalog = catalog_with("filename", "xxx".into());
    let fs = FakeFilesystem::new().with_unhashable_file(root_path("filename"));
    let event = classify(
        &catalog,
        &fs,
        Observation::new(root_path("filename"), Action::Missing),
    );
    assert_eq!(
        event,
        expected(
            Action::BadHash,
            EventInfo::Records(stored(&catalog, "filename")),
            true
        )
    );
}

#[test]
fn test_missing_file_in_catalog_exists_good_hash() {
    let catalog = catalog_with("filename", "xxx".into());
    let fs = FakeFilesystem::new().with_file(root_path("filename"), "xxx");
    let event = classify(
        &catalog,
        &fs,
        Observation::new(root_path("filename"), Action::Missing),
    );
    assert_eq!(event.action, Action::NotProcessing);
}

#[test]
fn test_updated_file_with_new_content() {
    let catalog = catalog_with("filename", "old".into());
    let fs = FakeFilesystem::new().with_file(root_path("filename"), "new");
    let event = classify(
        &catalog,
        &fs,
        Observation::new(root_path("filename"), Action::Updated),
    );
    assert_eq!(
        event,
        expected(Action::Updated, EventInfo::Hash("new".into()), true)
    );
}

#[test]
fn test_updated_file_with_same_content() {
    let catalog = catalog_with("filename", "same".into());
    let fs = FakeFilesystem::new().with_file(root_path("filename"), "same");
    let event = classify(
        &catalog,
        &fs,
        Observation::new(root_path("filename"), Action::Updated),
    );
    assert_eq!(event.action, Action::NotProcessing);
}

#[test]
fn test_double_item_in_catalog_is_integrity_error() {
    let twin = MediaRecord {
        file: "filename".to_string(),
        dir: String::new(),
        size: Probed::Unknown,
        created: Probed::Unknown,
        hash: Probed::Unknown,
        tags: Default::default(),
        url: Probed::Unknown,
        google: Probed::Unknown,
    };
    let catalog = SharedCatalog::new(Catalog::from_records(ROOT, vec![twin.clone(), twin]));

    let result = prepare_event(
        &catalog,
        &FakeFilesystem::new(),
        Path::new(ROOT),
        &Observation::new(root_path("filename"), Action::New),
    );
    assert!(matches!(result, Err(Error::Integrity { count: 2, .. })));
}

#[test]
fn test_renamed_file_not_in_catalog() {
    let fs = FakeFilesystem::new().with_file(root_path("new_filename"), "h1");
    let event = classify(
        &empty_catalog(),
        &fs,
        Observation::renamed(root_path("filename"), root_path("new_filename")),
    );
    assert_eq!(event.action, Action::New);
    assert_eq!(event.file_name, "new_filename");
    assert_eq!(event.directory, "");
    assert_eq!(event.path(), root_path("new_filename"));
    assert_eq!(event.info, EventInfo::Hash("h1".into()));
}

#[test]
fn test_renamed_file_in_catalog() {
    let catalog = catalog_with("filename", "h1".into());
    let fs = FakeFilesystem::new().with_file(root_path("new_filename"), "h1");
    let event = classify(
        &catalog,
        &fs,
        Observation::renamed(root_path("filename"), root_path("new_filename")),
    );
    assert_eq!(event.action, Action::Renamed);
    assert!(event.is_in_catalog);
    assert_eq!(
        event.info,
        EventInfo::Target {
            file: "new_filename".to_string(),
            dir: String::new(),
        }
    );
}

#[test]
fn test_renamed_file_into_subdirectory() {
    let catalog = catalog_with("filename", "h1".into());
    let fs = FakeFilesystem::new().with_file(root_path("album/filename"), "h1");
    let event = classify(
        &catalog,
        &fs,
        Observation::renamed(root_path("filename"), root_path("album/filename")),
    );
    assert_eq!(
        event.info,
        EventInfo::Target {
            file: "filename".to_string(),
            dir: "album".to_string(),
        }
    );
}

#[test]
fn test_renamed_onto_duplicate_targets_new_location() {
    let catalog = catalog_with("original", "xxx".into());
    let fs = FakeFilesystem::new().with_file(root_path("album/new_filename"), "xxx");
    let event = classify(
        &catalog,
        &fs,
        Observation::renamed(root_path("filename"), root_path("album/new_filename")),
    );
    assert_eq!(event.action, Action::Duplicate);
    assert_eq!(event.file_name, "new_filename");
    assert_eq!(event.directory, "album");
    assert_eq!(event.path(), root_path("album/new_filename"));
    assert_eq!(event.info, EventInfo::Records(stored(&catalog, "original")));
}

#[test]
fn test_renamed_onto_cataloged_target_is_not_a_duplicate() {
    let catalog = catalog_with("new_filename", "h1".into());
    let fs = FakeFilesystem::new().with_file(root_path("new_filename"), "h1");
    let event = classify(
        &catalog,
        &fs,
        Observation::renamed(root_path("filename"), root_path("new_filename")),
    );
    assert_eq!(event.action, Action::NotProcessing);
    assert!(event.is_in_catalog);
    assert_eq!(event.file_name, "new_filename");
    assert_eq!(event.info, EventInfo::None);
}

#[test]
fn test_renamed_onto_cataloged_target_with_other_content() {
    let catalog = catalog_with("new_filename", "old".into());
    let fs = FakeFilesystem::new().with_file(root_path("new_filename"), "new");
    let event = classify(
        &catalog,
        &fs,
        Observation::renamed(root_path("filename"), root_path("new_filename")),
    );
    assert_eq!(event.action, Action::BadHash);
    assert_eq!(event.file_name, "new_filename");
    assert_eq!(
        event.info,
        EventInfo::Records(stored(&catalog, "new_filename"))
    );
}

#[test]
fn test_renamed_without_target_is_error() {
    let catalog = catalog_with("filename", "h1".into());
    let fs = FakeFilesystem::new().with_file(root_path("filename"), "h1");
    let result = prepare_event(
        &catalog,
        &fs,
        Path::new(ROOT),
        &Observation::new(root_path("filename"), Action::Renamed),
    );
    assert!(matches!(result, Err(Error::MissingRenameTarget(_))));
}

#[test]
fn test_renamed_directory() {
    let fs = FakeFilesystem::new().with_dir(root_path("new_album"));
    let event = classify(
        &empty_catalog(),
        &fs,
        Observation::renamed(root_path("album"), root_path("new_album")),
    );
    assert!(event.is_dir);
    assert_eq!(event.action, Action::Renamed);
    assert_eq!(event.file_name, "");
    assert_eq!(event.directory, "album");
    assert_eq!(
        event.info,
        EventInfo::Target {
            file: String::new(),
            dir: "new_album".to_string(),
        }
    );
}

#[test]
fn test_broken_structure_passes_through() {
    let fs = FakeFilesystem::new().with_dir(root_path("album/nested"));
    let event = classify(
        &empty_catalog(),
        &fs,
        Observation::new(root_path("album/nested"), Action::BrokenStructure),
    );
    assert_eq!(event.action, Action::BrokenStructure);
    assert!(event.is_dir);
    assert_eq!(event.directory, "nested");
}

#[test]
fn test_file_in_subdirectory() {
    let fs = FakeFilesystem::new().with_file(root_path("album/cat.png"), "c");
    let event = classify(
        &empty_catalog(),
        &fs,
        Observation::new(root_path("album/cat.png"), Action::New),
    );
    assert_eq!(event.file_name, "cat.png");
    assert_eq!(event.directory, "album");
    assert_eq!(event.path(), root_path("album/cat.png"));
}

#[test]
fn test_path_outside_root_is_error() {
    let result = prepare_event(
        &empty_catalog(),
        &FakeFilesystem::new(),
        Path::new(ROOT),
        &Observation::new("/elsewhere/filename", Action::New),
    );
    assert!(matches!(result, Err(Error::OutsideRoot { .. })));
}

#[test]
fn test_classification_does_not_mutate() {
    let catalog = catalog_with("filename", "xxx".into());
    let fs = FakeFilesystem::new()
        .with_file(root_path("filename"), "yyy")
        .with_file(root_path("other"), "xxx");
    let before = catalog.snapshot().unwrap();

    for observation in [
        Observation::new(root_path("filename"), Action::New),
        Observation::new(root_path("other"), Action::New),
        Observation::new(root_path("gone"), Action::Missing),
    ] {
        let first = classify(&catalog, &fs, observation.clone());
        let second = classify(&catalog, &fs, observation);
        assert_eq!(first, second);
    }

    assert_eq!(catalog.snapshot().unwrap(), before);
    assert!(fs.removed().is_empty());
}
