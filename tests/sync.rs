use std::path::Path;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gdrive_dl::{CommitMode, Downloader, DriveClient, Error, NoProgress, SyncConfig, sync_folder};

const FOLDER: &str = "folder-xyz";

fn config(mode: CommitMode) -> SyncConfig {
    SyncConfig::default()
        .with_retry_delay(Duration::from_millis(10))
        .with_network_timeout(Duration::from_secs(10))
        .with_commit_mode(mode)
}

fn downloader(server: &MockServer, mode: CommitMode) -> Downloader<DriveClient> {
    let client = DriveClient::with_base_url(reqwest::Client::new(), &server.uri(), "token");
    Downloader::new(client, config(mode))
}

async fn mount_listing(server: &MockServer, files: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", format!("'{FOLDER}' in parents")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": files })))
        .mount(server)
        .await;
}

async fn mount_media(server: &MockServer, id: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/drive/v3/files/{id}")))
        .and(query_param("alt", "media"))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

#[tokio::test]
async fn mirrors_folder_and_second_run_is_a_no_op() {
    let server = MockServer::start().await;
    let target = TempDir::new().unwrap();
    let photos = target.path().join("Photos");

    mount_listing(
        &server,
        json!([
            { "id": "a", "name": "IMG_0001.jpg", "mimeType": "image/jpeg" },
            { "id": "b", "name": "IMG_0002.jpg", "mimeType": "image/jpeg" },
            {
                "id": "doc",
                "name": "Trip notes",
                "mimeType": "application/vnd.google-apps.document"
            },
            { "id": "c", "name": "clip.mp4", "mimeType": "video/mp4" }
        ]),
    )
    .await;
    mount_media(&server, "a", ResponseTemplate::new(200).set_body_string("aaa"), 1).await;
    mount_media(&server, "b", ResponseTemplate::new(200).set_body_string("bbbb"), 1).await;
    mount_media(&server, "c", ResponseTemplate::new(200).set_body_string("c"), 1).await;
    mount_media(&server, "doc", ResponseTemplate::new(200), 0).await;

    let dl = downloader(&server, CommitMode::Atomic);

    let first = sync_folder(&dl, FOLDER, &photos, &NoProgress).await.unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.already_done, 0);
    assert_eq!(first.files_downloaded, 3);
    assert_eq!(first.total_bytes, 8);
    assert!(first.is_success());

    assert_eq!(read(&photos, "IMG_0001.jpg"), "aaa");
    assert_eq!(read(&photos, "IMG_0002.jpg"), "bbbb");
    assert_eq!(read(&photos, "clip.mp4"), "c");
    assert!(!photos.join("Trip notes").exists());
    assert!(!photos.join("IMG_0001.jpg.part").exists());

    let second = sync_folder(&dl, FOLDER, &photos, &NoProgress).await.unwrap();
    assert_eq!(second.total, 3);
    assert_eq!(second.already_done, 3);
    assert_eq!(second.files_downloaded, 0);
    assert!(second.is_success());
}

#[tokio::test]
async fn existing_files_are_left_untouched() {
    let server = MockServer::start().await;
    let target = TempDir::new().unwrap();
    std::fs::write(target.path().join("IMG_0001.jpg"), "local copy").unwrap();

    mount_listing(
        &server,
        json!([
            { "id": "a", "name": "IMG_0001.jpg", "mimeType": "image/jpeg" },
            { "id": "b", "name": "IMG_0002.jpg", "mimeType": "image/jpeg" }
        ]),
    )
    .await;
    mount_media(&server, "a", ResponseTemplate::new(200).set_body_string("remote"), 0).await;
    mount_media(&server, "b", ResponseTemplate::new(200).set_body_string("new"), 1).await;

    let dl = downloader(&server, CommitMode::Atomic);
    let summary = sync_folder(&dl, FOLDER, target.path(), &NoProgress).await.unwrap();

    assert_eq!(summary.already_done, 1);
    assert_eq!(summary.files_downloaded, 1);
    assert_eq!(read(target.path(), "IMG_0001.jpg"), "local copy");
    assert_eq!(read(target.path(), "IMG_0002.jpg"), "new");
}

#[tokio::test]
async fn failing_item_is_retried_three_times_and_others_continue() {
    let server = MockServer::start().await;
    let target = TempDir::new().unwrap();

    mount_listing(
        &server,
        json!([
            { "id": "a", "name": "a.jpg", "mimeType": "image/jpeg" },
            { "id": "bad", "name": "bad.jpg", "mimeType": "image/jpeg" },
            { "id": "c", "name": "c.jpg", "mimeType": "image/jpeg" }
        ]),
    )
    .await;
    mount_media(&server, "a", ResponseTemplate::new(200).set_body_string("a"), 1).await;
    mount_media(&server, "bad", ResponseTemplate::new(503), 3).await;
    mount_media(&server, "c", ResponseTemplate::new(200).set_body_string("c"), 1).await;

    let dl = downloader(&server, CommitMode::Atomic);
    let summary = sync_folder(&dl, FOLDER, target.path(), &NoProgress).await.unwrap();

    assert_eq!(summary.files_downloaded, 2);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].name, "bad.jpg");
    assert!(!summary.is_success());
    assert!(target.path().join("c.jpg").exists());
    assert!(!target.path().join("bad.jpg").exists());
    assert!(!target.path().join("bad.jpg.part").exists());
}

#[tokio::test]
async fn atomic_commit_retries_failed_item_on_next_run() {
    let server = MockServer::start().await;
    let target = TempDir::new().unwrap();

    mount_listing(
        &server,
        json!([{ "id": "bad", "name": "bad.jpg", "mimeType": "image/jpeg" }]),
    )
    .await;
    mount_media(&server, "bad", ResponseTemplate::new(500), 6).await;

    let dl = downloader(&server, CommitMode::Atomic);
    let first = sync_folder(&dl, FOLDER, target.path(), &NoProgress).await.unwrap();
    let second = sync_folder(&dl, FOLDER, target.path(), &NoProgress).await.unwrap();

    assert_eq!(first.failed.len(), 1);
    assert_eq!(second.already_done, 0);
    assert_eq!(second.failed.len(), 1);
}

#[tokio::test]
async fn in_place_commit_treats_leftover_file_as_done() {
    let server = MockServer::start().await;
    let target = TempDir::new().unwrap();

    mount_listing(
        &server,
        json!([{ "id": "bad", "name": "bad.jpg", "mimeType": "image/jpeg" }]),
    )
    .await;
    mount_media(&server, "bad", ResponseTemplate::new(500), 3).await;

    let dl = downloader(&server, CommitMode::InPlace);
    let first = sync_folder(&dl, FOLDER, target.path(), &NoProgress).await.unwrap();
    assert_eq!(first.failed.len(), 1);
    assert!(target.path().join("bad.jpg").exists());

    let second = sync_folder(&dl, FOLDER, target.path(), &NoProgress).await.unwrap();
    assert_eq!(second.already_done, 1);
    assert_eq!(second.files_downloaded, 0);
    assert!(second.is_success());
}

#[tokio::test]
async fn listing_failure_aborts_before_any_transfer() {
    let server = MockServer::start().await;
    let target = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(403).set_body_string("insufficient permissions"))
        .expect(1)
        .mount(&server)
        .await;

    let dl = downloader(&server, CommitMode::Atomic);
    let err = sync_folder(&dl, FOLDER, target.path(), &NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RemoteList { ref folder_id, .. } if folder_id == FOLDER));
    assert!(err.is_fatal());
    assert_eq!(std::fs::read_dir(target.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn target_that_is_a_file_is_a_setup_error() {
    let server = MockServer::start().await;
    let target = TempDir::new().unwrap();
    let blocker = target.path().join("Photos");
    std::fs::write(&blocker, "not a directory").unwrap();

    let dl = downloader(&server, CommitMode::Atomic);
    let err = sync_folder(&dl, FOLDER, &blocker, &NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DirectoryCreate { .. }));
}
