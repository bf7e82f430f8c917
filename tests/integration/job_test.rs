//! Integration tests for zip jobs and job cancellation.
//!
//! Only this file drives the zip handler, and it does so from a single test
//! so that `run_pending` never claims a job another test is still staging.

mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use helpers::{TestApp, TestResponse, unique};
use rpidrive_database::repositories::file::FileRepository;
use rpidrive_database::repositories::job::JobRepository;
use rpidrive_database::repositories::volume::VolumeRepository;
use rpidrive_entity::job::JobStatus;
use rpidrive_worker::ZipJobHandler;

fn zip_handler(app: &TestApp) -> (ZipJobHandler, Arc<JobRepository>) {
    let jobs = Arc::new(JobRepository::new(app.db_pool.clone()));
    let handler = ZipJobHandler::new(
        Arc::clone(&jobs),
        Arc::new(FileRepository::new(app.db_pool.clone())),
        Arc::new(VolumeRepository::new(app.db_pool.clone())),
    );
    (handler, jobs)
}

async fn compress(app: &TestApp, cookie: &str, files: &[Uuid], dir: Uuid, name: &str) {
    let response = app
        .request(
            "POST",
            "/ui-api/files/compress",
            Some(json!({ "files": files, "compress_dir": dir, "compress_name": name })),
            Some(cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

/// The listed job for the archive `<name>.zip`.
async fn job_for(app: &TestApp, cookie: &str, name: &str) -> Value {
    let response = app.request("GET", "/ui-api/jobs", None, Some(cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let description = format!("Compressing {name}.zip");
    response.body["values"]
        .as_array()
        .unwrap()
        .iter()
        .find(|job| job["description"] == description)
        .cloned()
        .unwrap_or_else(|| panic!("no job {description:?}"))
}

async fn cancel(app: &TestApp, cookie: &str, job: &Value) -> TestResponse {
    app.request("POST", &format!("/ui-api/jobs/{}/cancel", job["id"]), None, Some(cookie))
        .await
}

fn job_id(job: &Value) -> i32 {
    job["id"].as_i64().unwrap() as i32
}

#[tokio::test]
async fn test_zip_jobs_complete_and_cancel() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("zipped");
    let dir = app.volume_dir(&name);
    let (_, root) = app.create_volume(&admin, &name, &dir).await;

    let a = app.upload(&admin, root, "a.txt", b"alpha").await;
    let docs = app.new_folder(&admin, root, "docs").await;
    app.upload(&admin, docs, "b.txt", b"beta").await;

    let bundle = unique("bundle");
    let stopped = unique("stopped");
    let interrupted = unique("interrupted");
    compress(&app, &admin, &[a, docs], root, &bundle).await;
    compress(&app, &admin, &[a], root, &stopped).await;
    compress(&app, &admin, &[a], root, &interrupted).await;

    // stopped while still queued
    let response = cancel(&app, &admin, &job_for(&app, &admin, &stopped).await).await;
    assert_eq!(response.status, StatusCode::OK);

    // stopped after the worker picked it up
    let (handler, jobs) = zip_handler(&app);
    let interrupted_id = job_id(&job_for(&app, &admin, &interrupted).await);
    assert!(
        jobs.transition(interrupted_id, JobStatus::InQueue, JobStatus::Running)
            .await
            .unwrap()
    );
    let response = cancel(&app, &admin, &job_for(&app, &admin, &interrupted).await).await;
    assert_eq!(response.status, StatusCode::OK);
    let job = jobs.find_by_id(interrupted_id).await.unwrap().unwrap();
    assert!(job.to_stop);
    handler.process(&job).await;

    handler.run_pending().await.unwrap();

    let done = job_for(&app, &admin, &bundle).await;
    assert_eq!(done["status"], "DONE");
    assert_eq!(done["progress"], 100);
    assert_eq!(job_for(&app, &admin, &stopped).await["status"], "CANCELLED");
    assert_eq!(job_for(&app, &admin, &interrupted).await["status"], "CANCELLED");

    let archive = format!("{bundle}.zip");
    assert!(app.child_id(&admin, root, &archive).await.is_some());
    let mut zip = zip::ZipArchive::new(std::fs::File::open(dir.join(&archive)).unwrap()).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    assert!(names.contains(&"a.txt".to_string()), "{names:?}");
    assert!(names.contains(&"docs/b.txt".to_string()), "{names:?}");
    assert_eq!(zip.by_name("a.txt").unwrap().size(), 5);

    let on_disk: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(on_disk.iter().all(|n| !n.ends_with(".part")), "{on_disk:?}");
    assert!(!on_disk.contains(&format!("{stopped}.zip")));
    assert!(!on_disk.contains(&format!("{interrupted}.zip")));

    // terminal jobs cannot be cancelled
    let response = cancel(&app, &admin, &done).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_requires_write_access() {
    let Some(app) = TestApp::new().await else { return };
    let admin = app.admin_session().await;
    let name = unique("guarded");
    let (volume_id, _) = app
        .create_volume(&admin, &name, &app.volume_dir(&name))
        .await;

    let reader = unique("reader");
    let user = app.create_user(&reader, "reader-password", false).await;
    let response = app
        .request(
            "PUT",
            &format!("/ui-api/volumes/{volume_id}"),
            Some(json!({ "users": [{ "user": user.id, "permission": 10 }] })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // an index job is enough here; zip handling belongs to the test above
    let jobs = JobRepository::new(app.db_pool.clone());
    let job = jobs
        .create(&rpidrive_entity::job::CreateJob {
            kind: rpidrive_entity::job::JobKind::Index,
            description: format!("Indexing {name}"),
            data: json!({ "volume_id": volume_id }),
            status: JobStatus::Running,
            volume_id: Some(volume_id),
        })
        .await
        .unwrap();

    let cookie = app.login(&reader, "reader-password").await;
    let response = app.request("GET", "/ui-api/jobs", None, Some(&cookie)).await;
    assert!(
        response.body["values"]
            .as_array()
            .unwrap()
            .iter()
            .any(|j| j["id"] == job.id)
    );

    let response = app
        .request("POST", &format!("/ui-api/jobs/{}/cancel", job.id), None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(!jobs.find_by_id(job.id).await.unwrap().unwrap().to_stop);

    jobs.transition(job.id, JobStatus::Running, JobStatus::Done)
        .await
        .unwrap();
}
