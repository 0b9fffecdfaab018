use communote_core::db::open_db_in_memory;
use communote_core::{
    CommentService, EngineError, ModerationService, NoteDraft, NoteService, Principal,
    ProfileService, ReportOutcome, SqliteCommentRepository, SqliteGrantRepository,
    SqliteNoteRepository, SqliteProfileRepository, SqliteReportRepository, TargetKind,
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

fn seed_admin(conn: &Connection, username: &str) -> Principal {
    let service = ProfileService::new(SqliteProfileRepository::try_new(conn).unwrap());
    let profile = service
        .create_profile(Uuid::new_v4(), username, None, true)
        .unwrap();
    Principal::admin(profile.id)
}

fn note_service(conn: &Connection) -> NoteService<SqliteNoteRepository<'_>, SqliteGrantRepository<'_>> {
    NoteService::new(
        SqliteNoteRepository::try_new(conn).unwrap(),
        SqliteGrantRepository::try_new(conn).unwrap(),
    )
}

fn comment_service(
    conn: &Connection,
) -> CommentService<SqliteNoteRepository<'_>, SqliteGrantRepository<'_>, SqliteCommentRepository<'_>>
{
    CommentService::new(
        SqliteNoteRepository::try_new(conn).unwrap(),
        SqliteGrantRepository::try_new(conn).unwrap(),
        SqliteCommentRepository::try_new(conn).unwrap(),
    )
}

fn moderation_service(conn: &Connection) -> ModerationService<SqliteReportRepository<'_>> {
    ModerationService::new(SqliteReportRepository::try_new(conn).unwrap())
}

fn public_draft(title: &str) -> NoteDraft {
    NoteDraft {
        title: title.to_string(),
        content: "body".to_string(),
        is_public: true,
        ..NoteDraft::default()
    }
}

#[test]
fn filing_a_report_records_an_open_entry() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("spammy")).unwrap();
    let report = moderation
        .file_report(&bob, TargetKind::Note, created.id, "  looks like spam  ")
        .unwrap();

    assert!(report.is_open());
    assert_eq!(report.reason, "looks like spam");
    assert_eq!(report.reported_by, bob.id);
    assert_eq!(report.target.kind, TargetKind::Note);
    assert_eq!(report.target.id, created.id);
    assert!(report.resolved_by.is_none());
    assert!(report.resolved_at.is_none());
}

#[test]
fn reporting_own_content_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("mine")).unwrap();

    assert!(matches!(
        moderation.file_report(&alice, TargetKind::Note, created.id, "reason"),
        Err(EngineError::InvalidArgument(_))
    ));
}

#[test]
fn reporting_a_missing_or_deleted_target_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    assert!(matches!(
        moderation.file_report(&bob, TargetKind::Note, Uuid::new_v4(), "ghost"),
        Err(EngineError::NotFound)
    ));

    let created = notes.create_note(&alice, public_draft("short lived")).unwrap();
    notes.delete_note(&alice, created.id).unwrap();
    assert!(matches!(
        moderation.file_report(&bob, TargetKind::Note, created.id, "already gone"),
        Err(EngineError::NotFound)
    ));
}

#[test]
fn blank_report_reason_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("fine")).unwrap();

    assert!(matches!(
        moderation.file_report(&bob, TargetKind::Note, created.id, "   "),
        Err(EngineError::InvalidArgument(_))
    ));
}

#[test]
fn queue_and_resolution_are_admin_only() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("flagged")).unwrap();
    let report = moderation
        .file_report(&bob, TargetKind::Note, created.id, "offensive")
        .unwrap();

    assert!(matches!(
        moderation.list_open_reports(&bob),
        Err(EngineError::PermissionDenied)
    ));
    assert!(matches!(
        moderation.review_target(&bob, TargetKind::Note, created.id),
        Err(EngineError::PermissionDenied)
    ));
    assert!(matches!(
        moderation.resolve_report(&bob, report.id, ReportOutcome::Remove),
        Err(EngineError::PermissionDenied)
    ));
}

#[test]
fn approve_closes_the_report_and_leaves_content_untouched() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let admin = seed_admin(&conn, "root");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("borderline")).unwrap();
    let report = moderation
        .file_report(&bob, TargetKind::Note, created.id, "maybe spam")
        .unwrap();

    let resolved = moderation
        .resolve_report(&admin, report.id, ReportOutcome::Approve)
        .unwrap();

    assert!(resolved.resolved);
    assert_eq!(resolved.resolved_by, Some(admin.id));
    assert!(resolved.resolved_at.is_some());
    assert_eq!(notes.get_note(&bob, created.id).unwrap().title, "borderline");
}

#[test]
fn remove_tombstones_the_reported_note() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let admin = seed_admin(&conn, "root");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("abusive")).unwrap();
    let report = moderation
        .file_report(&bob, TargetKind::Note, created.id, "abuse")
        .unwrap();

    moderation
        .resolve_report(&admin, report.id, ReportOutcome::Remove)
        .unwrap();

    assert!(matches!(
        notes.get_note(&alice, created.id),
        Err(EngineError::NotFound)
    ));
    // The row stays behind as a tombstone, not a deletion.
    let is_deleted: i64 = conn
        .query_row(
            "SELECT is_deleted FROM notes WHERE id = ?1;",
            [created.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(is_deleted, 1);
}

#[test]
fn remove_tombstones_the_reported_comment() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let admin = seed_admin(&conn, "root");
    let notes = note_service(&conn);
    let comments = comment_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("thread")).unwrap();
    let comment = comments.add_comment(&bob, created.id, "rude remark").unwrap();
    let report = moderation
        .file_report(&alice, TargetKind::Comment, comment.id, "rudeness")
        .unwrap();

    moderation
        .resolve_report(&admin, report.id, ReportOutcome::Remove)
        .unwrap();

    assert!(comments.list_comments(&alice, created.id).unwrap().is_empty());
}

#[test]
fn second_resolution_reports_already_resolved() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let admin = seed_admin(&conn, "root");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("contested")).unwrap();
    let report = moderation
        .file_report(&bob, TargetKind::Note, created.id, "dispute")
        .unwrap();

    moderation
        .resolve_report(&admin, report.id, ReportOutcome::Approve)
        .unwrap();
    match moderation.resolve_report(&admin, report.id, ReportOutcome::Remove) {
        Err(EngineError::AlreadyResolved(id)) => assert_eq!(id, report.id),
        other => panic!("unexpected result: {other:?}"),
    }

    // The losing verdict must not have touched the content.
    assert_eq!(notes.get_note(&bob, created.id).unwrap().title, "contested");
}

#[test]
fn resolving_a_missing_report_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let admin = seed_admin(&conn, "root");
    let moderation = moderation_service(&conn);

    assert!(matches!(
        moderation.resolve_report(&admin, Uuid::new_v4(), ReportOutcome::Approve),
        Err(EngineError::NotFound)
    ));
}

#[test]
fn review_target_shows_tombstoned_content() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let admin = seed_admin(&conn, "root");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("evidence")).unwrap();
    let report = moderation
        .file_report(&bob, TargetKind::Note, created.id, "evidence needed")
        .unwrap();
    moderation
        .resolve_report(&admin, report.id, ReportOutcome::Remove)
        .unwrap();

    let content = moderation
        .review_target(&admin, TargetKind::Note, created.id)
        .unwrap();
    assert!(content.is_deleted);
    assert_eq!(content.author, alice.id);
    assert_eq!(content.title.as_deref(), Some("evidence"));
    assert_eq!(content.body, "body");
}

#[test]
fn review_target_on_a_comment_carries_no_title() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let admin = seed_admin(&conn, "root");
    let notes = note_service(&conn);
    let comments = comment_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("thread")).unwrap();
    let comment = comments.add_comment(&bob, created.id, "a remark").unwrap();

    let content = moderation
        .review_target(&admin, TargetKind::Comment, comment.id)
        .unwrap();
    assert_eq!(content.title, None);
    assert_eq!(content.body, "a remark");
    assert_eq!(content.author, bob.id);
    assert!(!content.is_deleted);
}

#[test]
fn open_queue_lists_newest_first_and_hides_resolved_reports() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let admin = seed_admin(&conn, "root");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let first_note = notes.create_note(&alice, public_draft("first")).unwrap();
    let second_note = notes.create_note(&alice, public_draft("second")).unwrap();
    let third_note = notes.create_note(&alice, public_draft("third")).unwrap();

    let first = moderation
        .file_report(&bob, TargetKind::Note, first_note.id, "r1")
        .unwrap();
    let second = moderation
        .file_report(&bob, TargetKind::Note, second_note.id, "r2")
        .unwrap();
    let third = moderation
        .file_report(&bob, TargetKind::Note, third_note.id, "r3")
        .unwrap();

    conn.execute(
        "UPDATE flagged_content SET created_at = 1000 WHERE id = ?1;",
        params![first.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE flagged_content SET created_at = 2000 WHERE id = ?1;",
        params![second.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE flagged_content SET created_at = 3000 WHERE id = ?1;",
        params![third.id.to_string()],
    )
    .unwrap();

    moderation
        .resolve_report(&admin, second.id, ReportOutcome::Approve)
        .unwrap();

    let open = moderation.list_open_reports(&admin).unwrap();
    let ids: Vec<_> = open.iter().map(|report| report.id).collect();
    assert_eq!(ids, vec![third.id, first.id]);
}

#[test]
fn independent_reports_on_one_target_resolve_separately() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let carol = seed_user(&conn, "carol");
    let admin = seed_admin(&conn, "root");
    let notes = note_service(&conn);
    let moderation = moderation_service(&conn);

    let created = notes.create_note(&alice, public_draft("popular")).unwrap();
    let from_bob = moderation
        .file_report(&bob, TargetKind::Note, created.id, "from bob")
        .unwrap();
    let from_carol = moderation
        .file_report(&carol, TargetKind::Note, created.id, "from carol")
        .unwrap();

    moderation
        .resolve_report(&admin, from_bob.id, ReportOutcome::Approve)
        .unwrap();

    let open = moderation.list_open_reports(&admin).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, from_carol.id);
}
