//! Integration tests for volume indexing against a real directory tree.

mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use helpers::{TestApp, unique};
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::job::JobRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_entity::file::{File, FileKind};
use rpidrive_entity::job::{JobKind, JobStatus};
use rpidrive_worker::{IndexOutcome, Indexer};

struct Harness {
    indexer: Indexer,
    volumes: Arc<VolumeRepository>,
}

fn harness(app: &TestApp) -> Harness {
    let files = Arc::new(FileRepository::new(app.db_pool.clone()));
    let volumes = Arc::new(VolumeRepository::new(app.db_pool.clone()));
    let jobs = Arc::new(JobRepository::new(app.db_pool.clone()));
    Harness {
        indexer: Indexer::new(files, Arc::clone(&volumes), jobs),
        volumes,
    }
}

async fn rows(app: &TestApp, volume_id: Uuid) -> Vec<File> {
    sqlx::query_as::<_, File>("SELECT * FROM files WHERE volume_id = $1 ORDER BY name")
        .bind(volume_id)
        .fetch_all(&app.db_pool)
        .await
        .unwrap()
}

fn by_name<'a>(rows: &'a [File], name: &str) -> &'a File {
    rows.iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no row named {name:?}"))
}

async fn index(harness: &Harness, volume_id: Uuid) {
    let volume = harness.volumes.find_by_id(volume_id).await.unwrap().unwrap();
    let outcome = harness.indexer.index_volume(&volume).await.unwrap();
    assert!(matches!(outcome, IndexOutcome::Completed(_)));
}

#[tokio::test]
async fn test_index_reconciles_with_disk() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("indexed");
    let dir = app.volume_dir(&name);
    std::fs::write(dir.join("a.txt"), b"hi").unwrap();
    std::fs::create_dir(dir.join("sub")).unwrap();
    std::fs::write(dir.join("sub/b.txt"), b"nested content").unwrap();

    let (volume_id, root_id) = app.create_volume(&admin, &name, &dir).await;
    let harness = harness(&app);

    index(&harness, volume_id).await;
    let files = rows(&app, volume_id).await;
    assert_eq!(files.len(), 4);

    let root = by_name(&files, "");
    assert_eq!(root.id, root_id);
    assert!(root.parent_id.is_none());

    let a = by_name(&files, "a.txt");
    assert_eq!((a.kind, a.size, a.parent_id), (FileKind::File, 2, Some(root_id)));
    assert_eq!(a.media_type, "text/plain");

    let sub = by_name(&files, "sub");
    assert_eq!((sub.kind, sub.size, sub.parent_id), (FileKind::Folder, 0, Some(root_id)));

    let b = by_name(&files, "b.txt");
    assert_eq!(b.size, 14);
    assert_eq!(b.parent_id, Some(sub.id));

    let first_pass = harness
        .volumes
        .find_by_id(volume_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!first_pass.indexing);
    let first_indexed = first_pass.last_indexed.unwrap();

    std::fs::remove_file(dir.join("a.txt")).unwrap();
    index(&harness, volume_id).await;

    let files = rows(&app, volume_id).await;
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.name != "a.txt"));
    // Surviving rows keep their ids.
    assert_eq!(by_name(&files, "sub").id, sub.id);

    let second_pass = harness
        .volumes
        .find_by_id(volume_id)
        .await
        .unwrap()
        .unwrap();
    assert!(second_pass.last_indexed.unwrap() > first_indexed);

    let (kind, status): (JobKind, JobStatus) = sqlx::query_as(
        "SELECT kind, status FROM jobs WHERE volume_id = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(volume_id)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!((kind, status), (JobKind::Index, JobStatus::Done));
}

#[tokio::test]
async fn test_index_picks_up_size_changes() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("growing");
    let dir = app.volume_dir(&name);
    std::fs::write(dir.join("log.txt"), b"1").unwrap();

    let (volume_id, _) = app.create_volume(&admin, &name, &dir).await;
    let harness = harness(&app);
    index(&harness, volume_id).await;
    let before = by_name(&rows(&app, volume_id).await, "log.txt").clone();

    std::fs::write(dir.join("log.txt"), b"12345").unwrap();
    index(&harness, volume_id).await;
    let after = by_name(&rows(&app, volume_id).await, "log.txt").clone();

    assert_eq!(after.id, before.id);
    assert_eq!(after.size, 5);
}

#[tokio::test]
async fn test_index_endpoint_flags_volume() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("flagged");
    let (volume_id, _) = app
        .create_volume(&admin, &name, &app.volume_dir(&name))
        .await;
    let harness = harness(&app);
    index(&harness, volume_id).await;

    let response = app
        .request(
            "POST",
            &format!("/ui-api/volumes/{volume_id}/index"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let volume = harness.volumes.find_by_id(volume_id).await.unwrap().unwrap();
    assert!(volume.indexing);
}

#[tokio::test]
async fn test_failing_volume_is_not_retried_every_tick() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("vanished");
    let dir = app.volume_dir(&name);
    let (volume_id, _) = app.create_volume(&admin, &name, &dir).await;
    std::fs::remove_dir_all(&dir).unwrap();

    let harness = harness(&app);
    for _ in 0..5 {
        let volume = harness.volumes.find_by_id(volume_id).await.unwrap().unwrap();
        let _ = harness.indexer.index_if_due(&volume, Utc::now(), 180).await;
    }

    let jobs: Vec<(JobStatus,)> = sqlx::query_as(
        "SELECT status FROM jobs WHERE volume_id = $1 AND kind = 'INDEX' ORDER BY id",
    )
    .bind(volume_id)
    .fetch_all(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(jobs, vec![(JobStatus::Error,)]);

    // an explicit request gets one more attempt
    let response = app
        .request(
            "POST",
            &format!("/ui-api/volumes/{volume_id}/index"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    for _ in 0..2 {
        let volume = harness.volumes.find_by_id(volume_id).await.unwrap().unwrap();
        let _ = harness.indexer.index_if_due(&volume, Utc::now(), 180).await;
    }

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE volume_id = $1 AND kind = 'INDEX'")
            .bind(volume_id)
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_request_made_during_pass_is_kept() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("requested");
    let (volume_id, _) = app
        .create_volume(&admin, &name, &app.volume_dir(&name))
        .await;
    let harness = harness(&app);
    index(&harness, volume_id).await;

    // a request lands while a pass is finishing
    harness.volumes.set_indexing(volume_id, true).await.unwrap();
    harness.volumes.mark_indexed(volume_id, Utc::now()).await.unwrap();

    let volume = harness.volumes.find_by_id(volume_id).await.unwrap().unwrap();
    assert!(volume.indexing);
    assert!(volume.needs_indexing(Utc::now(), 180));
}

#[tokio::test]
async fn test_path_change_requests_index() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("relocated");
    let (volume_id, _) = app
        .create_volume(&admin, &name, &app.volume_dir(&name))
        .await;
    let harness = harness(&app);
    index(&harness, volume_id).await;

    let moved = app.volume_dir(&unique("relocated-new"));
    let response = app
        .request(
            "PUT",
            &format!("/ui-api/volumes/{volume_id}"),
            Some(serde_json::json!({ "path": moved.to_string_lossy() })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let details = app
        .request("GET", &format!("/ui-api/volumes/{volume_id}"), None, Some(&admin))
        .await;
    assert_eq!(details.body["indexing"], true);

    // renaming alone leaves the flag as it was
    index(&harness, volume_id).await;
    let response = app
        .request(
            "PUT",
            &format!("/ui-api/volumes/{volume_id}"),
            Some(serde_json::json!({ "name": unique("renamed") })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let volume = harness.volumes.find_by_id(volume_id).await.unwrap().unwrap();
    assert!(!volume.indexing);
}
