use super::*;
use crate::autosave::SaveState;
use crate::clock::ManualClock;
use crate::errors::AppError;
use chrono::{Duration, TimeZone, Utc};
use std::fs;
use std::time::Instant;
use tempfile::{tempdir, TempDir};

fn open_journal() -> (TempDir, ManualClock, Journal) {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap());
    let config = Config::for_dir(dir.path().join("entries"));
    let journal = Journal::open_with_clock(config, Arc::new(clock.clone())).unwrap();
    (dir, clock, journal)
}

fn recent_ids(journal: &mut Journal, k: usize) -> Vec<String> {
    journal.recent(k).into_iter().map(|m| m.id).collect()
}

#[test]
fn test_open_rejects_invalid_config() {
    let result = Journal::open(Config::for_dir("not/absolute"));
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn test_second_open_is_refused_while_locked() {
    let (dir, _clock, journal) = open_journal();
    let config = Config::for_dir(dir.path().join("entries"));

    match Journal::open(config.clone()) {
        Err(AppError::Lock(LockError::StoreBusy { path })) => {
            assert!(path.ends_with(LOCK_FILE_NAME));
        }
        Err(e) => panic!("Expected StoreBusy, got {}", e),
        Ok(_) => panic!("Expected StoreBusy, got an open journal"),
    }

    drop(journal);
    assert!(Journal::open(config).is_ok());
}

#[test]
fn test_saved_entry_is_searchable_and_recent() {
    let (_dir, clock, mut journal) = open_journal();
    let entry = journal.create("Team meeting notes\nAgenda first.").unwrap();
    clock.advance(Duration::seconds(1));
    journal.create("Grocery list").unwrap();

    let results = journal.search("meeting");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, entry.id());

    let recent = recent_ids(&mut journal, 2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1], entry.id());
}

#[test]
fn test_recency_follows_saves() {
    let (_dir, clock, mut journal) = open_journal();
    clock.advance(Duration::seconds(1));
    let mut a = journal.create("Entry A").unwrap();
    clock.advance(Duration::seconds(1));
    let b = journal.create("Entry B").unwrap();
    clock.advance(Duration::seconds(1));
    let c = journal.create("Entry C").unwrap();

    assert_eq!(recent_ids(&mut journal, 2), vec![c.id(), b.id()]);

    clock.advance(Duration::seconds(1));
    a.set_content("Entry A, revised");
    journal.save(&mut a).unwrap();
    assert_eq!(recent_ids(&mut journal, 2), vec![a.id(), c.id()]);
}

#[test]
fn test_delete_and_restore_update_projections() {
    let (_dir, clock, mut journal) = open_journal();
    let x = journal.create("Holiday plans").unwrap();

    journal.delete(x.id()).unwrap();
    assert!(journal.search("holiday").is_empty());
    assert!(recent_ids(&mut journal, 5).is_empty());
    assert_eq!(journal.store().list_all().count(), 0);
    assert_eq!(journal.pending_deletions().len(), 1);

    clock.advance(Duration::seconds(3));
    let restored = journal.restore(x.id()).unwrap();
    assert_eq!(restored.content, "Holiday plans");
    assert_eq!(journal.search("holiday").len(), 1);
    assert_eq!(recent_ids(&mut journal, 5), vec![x.id().to_string()]);
    assert_eq!(journal.deletion_state(x.id()), DeletionState::Restored);
}

#[test]
fn test_restore_after_window_is_refused() {
    let (_dir, clock, mut journal) = open_journal();
    let x = journal.create("Short-lived").unwrap();
    journal.delete(x.id()).unwrap();

    clock.advance(Duration::seconds(11));
    let err = journal.restore(x.id()).unwrap_err();
    assert!(err.is_deletion_expired());
    assert!(journal.search("short").is_empty());
    assert_eq!(journal.store().list_all().count(), 0);
}

#[test]
fn test_delete_refills_recent_list() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap());
    let mut config = Config::for_dir(dir.path().join("entries"));
    config.recent_limit = 2;
    let mut journal = Journal::open_with_clock(config, Arc::new(clock.clone())).unwrap();

    let mut ids = Vec::new();
    for name in ["One", "Two", "Three"] {
        clock.advance(Duration::seconds(1));
        ids.push(journal.create(name).unwrap().metadata.id);
    }
    assert_eq!(recent_ids(&mut journal, 2), vec![ids[2].clone(), ids[1].clone()]);

    journal.delete(&ids[2]).unwrap();
    assert_eq!(recent_ids(&mut journal, 2), vec![ids[1].clone(), ids[0].clone()]);

    // Beyond the view's capacity the list comes straight from the store.
    assert_eq!(recent_ids(&mut journal, 5), vec![ids[1].clone(), ids[0].clone()]);
}

#[test]
fn test_invalidate_picks_up_external_changes() {
    let (_dir, clock, mut journal) = open_journal();
    let entry = journal.create("Original words").unwrap();

    // Rewrite the file behind the journal's back.
    let mut changed = entry.clone();
    changed.set_content("Rewritten elsewhere");
    changed.refresh_derived();
    let text = crate::store::render(&changed).unwrap();
    fs::write(&entry.metadata.path, text).unwrap();

    assert_eq!(journal.search("original").len(), 1);
    journal.invalidate();
    assert!(journal.search("original").is_empty());
    assert_eq!(journal.search("rewritten").len(), 1);

    clock.advance(Duration::seconds(1));
    assert_eq!(journal.refresh(), 1);
}

#[test]
fn test_corrupt_files_are_reported_through_journal() {
    let (_dir, _clock, mut journal) = open_journal();
    journal.create("Fine entry").unwrap();
    let bad = journal.store().root().join("bad.md");
    fs::write(&bad, "garbage without header").unwrap();

    assert_eq!(journal.refresh(), 1);
    assert_eq!(journal.search("entry").len(), 1);
    assert_eq!(journal.search("garbage").len(), 0);

    let warnings = journal.take_warnings();
    assert_eq!(warnings.len(), 1);
    journal.refresh();
    assert!(journal.take_warnings().is_empty());
}

#[test]
fn test_autosave_through_journal() {
    let (_dir, _clock, mut journal) = open_journal();
    let mut autosave = journal.autosave();
    let t0 = Instant::now();

    autosave.edit("Draft", t0);
    autosave.edit("Draft about the meeting", t0 + std::time::Duration::from_millis(200));
    assert!(journal.search("meeting").is_empty());

    let deadline = autosave.next_deadline().unwrap();
    assert!(autosave.tick(deadline, &mut journal).unwrap());
    assert_eq!(autosave.state(), SaveState::Saved);

    let results = journal.search("meeting");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, autosave.entry().unwrap().id());

    autosave.shutdown(&mut journal).unwrap();
    assert_eq!(journal.store().list_all().count(), 1);
}

#[test]
fn test_edit_existing_entry() {
    let (_dir, _clock, mut journal) = open_journal();
    let entry = journal.create("Started here").unwrap();

    let mut autosave = journal.edit(entry.id()).unwrap();
    assert_eq!(autosave.state(), SaveState::Saved);
    autosave.edit("Started here and kept going", Instant::now());
    autosave.focus_lost(&mut journal).unwrap();

    let reloaded = journal.get(entry.id()).unwrap();
    assert_eq!(reloaded.content, "Started here and kept going");
    assert_eq!(journal.store().list_all().count(), 1);
}

#[test]
fn test_duplicate_creates_independent_copy() {
    let (_dir, clock, mut journal) = open_journal();
    let mut original = journal.create("Recipe\nTwo eggs.").unwrap();
    original.metadata.tags.insert("food".to_string());
    journal.save(&mut original).unwrap();

    clock.advance(Duration::seconds(5));
    let copy = journal.duplicate(original.id()).unwrap();

    assert_ne!(copy.id(), original.id());
    assert_eq!(copy.content, original.content);
    assert!(copy.metadata.tags.contains("food"));
    assert_ne!(copy.metadata.path, original.metadata.path);
    assert_eq!(journal.search("recipe").len(), 2);
}

#[test]
fn test_export_formats() {
    let (dir, _clock, mut journal) = open_journal();
    let entry = journal.create("Exported text\nsecond line").unwrap();

    let md = dir.path().join("out").join("entry.md");
    journal.export(entry.id(), &md, ExportFormat::Markdown).unwrap();
    let exported = fs::read_to_string(&md).unwrap();
    assert!(exported.starts_with("---\n"));
    assert!(exported.contains(&format!("id: {}", entry.id())));
    assert!(exported.ends_with("Exported text\nsecond line"));

    let txt = dir.path().join("entry.txt");
    journal.export(entry.id(), &txt, ExportFormat::Text).unwrap();
    assert_eq!(fs::read_to_string(&txt).unwrap(), "Exported text\nsecond line");

    let missing = journal.export("nope", &txt, ExportFormat::Text);
    assert!(missing.is_err());
}

#[test]
fn test_cleanup_removes_only_blank_entries() {
    let (_dir, _clock, mut journal) = open_journal();
    let keep = journal.create("Real words").unwrap();
    let blank = journal.create("  \n\n ").unwrap();

    let removed = journal.cleanup_empty().unwrap();
    assert_eq!(removed, vec![blank.id().to_string()]);
    assert!(!blank.metadata.path.exists());
    assert!(keep.metadata.path.exists());
    assert_eq!(recent_ids(&mut journal, 10), vec![keep.id().to_string()]);

    assert!(journal.cleanup_empty().unwrap().is_empty());
}

#[test]
fn test_reopen_purges_expired_deletions() {
    let (dir, clock, mut journal) = open_journal();
    let x = journal.create("Old deletion").unwrap();
    let tombstone = journal.delete(x.id()).unwrap();
    drop(journal);

    clock.advance(Duration::seconds(60));
    let config = Config::for_dir(dir.path().join("entries"));
    let reopened = Journal::open_with_clock(config, Arc::new(clock)).unwrap();

    assert!(reopened.pending_deletions().is_empty());
    assert!(!tombstone.held_path.exists());
}

#[test]
fn test_resolve_id_prefixes() {
    let (_dir, _clock, mut journal) = open_journal();
    let entry = journal.create("Prefix target").unwrap();
    let id = entry.id().to_string();

    assert_eq!(journal.resolve_id(&id).unwrap(), id);
    assert_eq!(journal.resolve_id(&id[..6]).unwrap(), id);
    assert!(matches!(
        journal.resolve_id("zzzz"),
        Err(AppError::Entry(EntryError::NotFound(_)))
    ));
    assert!(journal.resolve_id("").is_err());

    journal.delete(&id).unwrap();
    assert!(journal.resolve_id(&id[..6]).is_err());
    assert_eq!(journal.resolve_deleted_id(&id[..6]).unwrap(), id);
}

#[test]
fn test_restore_id_falls_back_only_when_nothing_matches() {
    let (_dir, _clock, mut journal) = open_journal();
    // Seventeen hex-leading ids guarantee two share a first character.
    let mut ids = Vec::new();
    for i in 0..17 {
        let entry = journal.create(&format!("Entry {}", i)).unwrap();
        ids.push(entry.id().to_string());
    }
    for id in &ids {
        journal.delete(id).unwrap();
    }
    let shared = ids
        .iter()
        .map(|id| &id[..1])
        .find(|p| ids.iter().filter(|id| id.starts_with(*p)).count() > 1)
        .unwrap()
        .to_string();

    match journal.resolve_restore_id(&shared) {
        Err(AppError::Journal(msg)) => assert!(msg.contains("use more characters")),
        other => panic!("Expected ambiguity error, got {:?}", other),
    }
    assert!(journal.restore(&shared).is_err());

    assert_eq!(journal.resolve_restore_id(&ids[0][..8]).unwrap(), ids[0]);
    assert_eq!(journal.resolve_restore_id("zzzz").unwrap(), "zzzz");
}

#[test]
fn test_ambiguous_prefix_is_refused() {
    let ids = vec!["abc1".to_string(), "abc2".to_string()];
    match unique_match("abc", ids.clone().into_iter()) {
        Err(AppError::Journal(msg)) => assert!(msg.contains("matches 2 entries")),
        other => panic!("Expected ambiguity error, got {:?}", other),
    }
    assert_eq!(unique_match("abc2", ids.into_iter()).unwrap(), "abc2");
}
