use communote_core::db::open_db_in_memory;
use communote_core::{
    EngineError, NoteDraft, NoteSearchFilter, NoteService, NoteUpdate, Principal, ProfileService,
    SqliteGrantRepository, SqliteNoteRepository, SqliteProfileRepository,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn seed_user(conn: &Connection, username: &str) -> Principal {
    let service = ProfileService::new(SqliteProfileRepository::try_new(conn).unwrap());
    let profile = service
        .create_profile(Uuid::new_v4(), username, None, false)
        .unwrap();
    Principal::new(profile.id)
}

fn note_service(conn: &Connection) -> NoteService<SqliteNoteRepository<'_>, SqliteGrantRepository<'_>> {
    NoteService::new(
        SqliteNoteRepository::try_new(conn).unwrap(),
        SqliteGrantRepository::try_new(conn).unwrap(),
    )
}

fn set_updated_at(conn: &Connection, note_id: Uuid, timestamp: i64) {
    conn.execute(
        "UPDATE notes SET updated_at = ?2 WHERE id = ?1;",
        params![note_id.to_string(), timestamp],
    )
    .unwrap();
}

#[test]
fn create_normalizes_and_stores_tags() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let notes = note_service(&conn);

    let created = notes
        .create_note(
            &alice,
            NoteDraft {
                title: "trip".to_string(),
                content: "pack light".to_string(),
                category: Some("travel".to_string()),
                tags: vec![
                    "Summer".to_string(),
                    " summer ".to_string(),
                    "BEACH".to_string(),
                    "".to_string(),
                ],
                ..NoteDraft::default()
            },
        )
        .unwrap();

    assert_eq!(created.tags, vec!["beach".to_string(), "summer".to_string()]);
    assert_eq!(created.category.as_deref(), Some("travel"));
    assert!(!created.is_public);
    assert!(created.created_at > 0);
}

#[test]
fn blank_title_is_rejected_on_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let notes = note_service(&conn);

    assert!(matches!(
        notes.create_note(
            &alice,
            NoteDraft {
                title: "   ".to_string(),
                content: "body".to_string(),
                ..NoteDraft::default()
            },
        ),
        Err(EngineError::InvalidArgument(_))
    ));

    let created = notes
        .create_note(
            &alice,
            NoteDraft {
                title: "valid".to_string(),
                content: "body".to_string(),
                ..NoteDraft::default()
            },
        )
        .unwrap();
    assert!(matches!(
        notes.update_note(
            &alice,
            created.id,
            NoteUpdate {
                title: "".to_string(),
                content: "body".to_string(),
                ..NoteUpdate::default()
            },
        ),
        Err(EngineError::InvalidArgument(_))
    ));
}

#[test]
fn update_replaces_all_fields_including_the_tag_set() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let notes = note_service(&conn);

    let created = notes
        .create_note(
            &alice,
            NoteDraft {
                title: "before".to_string(),
                content: "v1".to_string(),
                category: Some("work".to_string()),
                tags: vec!["draft".to_string(), "urgent".to_string()],
                ..NoteDraft::default()
            },
        )
        .unwrap();

    let updated = notes
        .update_note(
            &alice,
            created.id,
            NoteUpdate {
                title: "after".to_string(),
                content: "v2".to_string(),
                is_public: true,
                category: None,
                tags: vec!["Final".to_string()],
            },
        )
        .unwrap();

    assert_eq!(updated.title, "after");
    assert_eq!(updated.content, "v2");
    assert!(updated.is_public);
    assert_eq!(updated.category, None);
    assert_eq!(updated.tags, vec!["final".to_string()]);
}

#[test]
fn owned_listing_is_newest_first_and_skips_deleted() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let notes = note_service(&conn);

    let draft = |title: &str| NoteDraft {
        title: title.to_string(),
        content: "body".to_string(),
        ..NoteDraft::default()
    };
    let old = notes.create_note(&alice, draft("old")).unwrap();
    let gone = notes.create_note(&alice, draft("gone")).unwrap();
    let fresh = notes.create_note(&alice, draft("fresh")).unwrap();

    set_updated_at(&conn, old.id, 1000);
    set_updated_at(&conn, gone.id, 2000);
    set_updated_at(&conn, fresh.id, 3000);
    notes.delete_note(&alice, gone.id).unwrap();

    let listed = notes.list_notes(&alice).unwrap();
    let titles: Vec<_> = listed.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["fresh", "old"]);
}

#[test]
fn public_listing_excludes_own_private_and_deleted_notes() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let notes = note_service(&conn);

    let public = |owner: &Principal, title: &str| {
        notes
            .create_note(
                owner,
                NoteDraft {
                    title: title.to_string(),
                    content: "body".to_string(),
                    is_public: true,
                    ..NoteDraft::default()
                },
            )
            .unwrap()
    };

    public(&alice, "from alice");
    let doomed = public(&alice, "deleted one");
    notes.delete_note(&alice, doomed.id).unwrap();
    public(&bob, "from bob himself");
    notes
        .create_note(
            &alice,
            NoteDraft {
                title: "private".to_string(),
                content: "body".to_string(),
                ..NoteDraft::default()
            },
        )
        .unwrap();

    let listed = notes.list_public(&bob, None).unwrap();
    let titles: Vec<_> = listed.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["from alice"]);
}

#[test]
fn public_listing_applies_the_default_limit() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let notes = note_service(&conn);

    for index in 0..25 {
        let created = notes
            .create_note(
                &alice,
                NoteDraft {
                    title: format!("post {index}"),
                    content: "body".to_string(),
                    is_public: true,
                    ..NoteDraft::default()
                },
            )
            .unwrap();
        set_updated_at(&conn, created.id, 1000 + index);
    }

    assert_eq!(notes.list_public(&bob, None).unwrap().len(), 20);
    assert_eq!(notes.list_public(&bob, Some(3)).unwrap().len(), 3);
}

#[test]
fn search_filters_by_text_category_and_tags() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let notes = note_service(&conn);

    let seed = |title: &str, content: &str, category: Option<&str>, tags: &[&str]| {
        notes
            .create_note(
                &alice,
                NoteDraft {
                    title: title.to_string(),
                    content: content.to_string(),
                    category: category.map(str::to_string),
                    tags: tags.iter().map(|tag| tag.to_string()).collect(),
                    ..NoteDraft::default()
                },
            )
            .unwrap()
    };
    seed("meeting notes", "quarterly planning", Some("work"), &["planning"]);
    seed("grocery list", "milk and planning snacks", Some("home"), &["errands"]);
    seed("workout plan", "leg day", Some("work"), &["planning", "health"]);

    let by_text = notes
        .search_notes(
            &alice,
            NoteSearchFilter {
                text: Some("planning".to_string()),
                ..NoteSearchFilter::default()
            },
        )
        .unwrap();
    assert_eq!(by_text.len(), 2);

    let by_category = notes
        .search_notes(
            &alice,
            NoteSearchFilter {
                category: Some("work".to_string()),
                ..NoteSearchFilter::default()
            },
        )
        .unwrap();
    assert_eq!(by_category.len(), 2);

    let by_tags = notes
        .search_notes(
            &alice,
            NoteSearchFilter {
                tags: vec!["Planning".to_string(), "health".to_string()],
                ..NoteSearchFilter::default()
            },
        )
        .unwrap();
    assert_eq!(by_tags.len(), 1);
    assert_eq!(by_tags[0].title, "workout plan");

    let combined = notes
        .search_notes(
            &alice,
            NoteSearchFilter {
                text: Some("planning".to_string()),
                category: Some("work".to_string()),
                tags: vec!["planning".to_string()],
            },
        )
        .unwrap();
    assert_eq!(combined.len(), 1);
    assert_eq!(combined[0].title, "meeting notes");
}

#[test]
fn search_treats_like_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let notes = note_service(&conn);

    let seed = |title: &str| {
        notes
            .create_note(
                &alice,
                NoteDraft {
                    title: title.to_string(),
                    content: "body".to_string(),
                    ..NoteDraft::default()
                },
            )
            .unwrap()
    };
    seed("progress: 100% done");
    seed("progress: 100x done");

    let found = notes
        .search_notes(
            &alice,
            NoteSearchFilter {
                text: Some("100%".to_string()),
                ..NoteSearchFilter::default()
            },
        )
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "progress: 100% done");
}

#[test]
fn search_is_scoped_to_the_caller_and_skips_deleted() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let notes = note_service(&conn);

    let mine = notes
        .create_note(
            &alice,
            NoteDraft {
                title: "shared keyword".to_string(),
                content: "body".to_string(),
                ..NoteDraft::default()
            },
        )
        .unwrap();
    notes
        .create_note(
            &bob,
            NoteDraft {
                title: "shared keyword too".to_string(),
                content: "body".to_string(),
                is_public: true,
                ..NoteDraft::default()
            },
        )
        .unwrap();

    let filter = NoteSearchFilter {
        text: Some("keyword".to_string()),
        ..NoteSearchFilter::default()
    };
    let found = notes.search_notes(&alice, filter.clone()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, mine.id);

    notes.delete_note(&alice, mine.id).unwrap();
    assert!(notes.search_notes(&alice, filter).unwrap().is_empty());
}

#[test]
fn updating_or_deleting_a_missing_note_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let notes = note_service(&conn);

    assert!(matches!(
        notes.update_note(
            &alice,
            Uuid::new_v4(),
            NoteUpdate {
                title: "anything".to_string(),
                content: "body".to_string(),
                ..NoteUpdate::default()
            },
        ),
        Err(EngineError::NotFound)
    ));
    assert!(matches!(
        notes.delete_note(&alice, Uuid::new_v4()),
        Err(EngineError::NotFound)
    ));
}
