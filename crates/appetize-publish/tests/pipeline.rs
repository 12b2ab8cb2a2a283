//! End-to-end tests for PublishPipeline.
//!
//! Uses wiremock to stand in for the Appetize.io API and the presigned
//! storage URLs.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use appetize_publish::{
    derive_job_id, AppetizeApi, BuildLog, CancellationToken, CredentialStore, NoProxy,
    PublishOutcome, PublishPipeline, PublishRequest, Result, Stage, StoredCredential,
    TransportClient, TransportConfig, PLACEHOLDER_API_TOKEN,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_bytes, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct MemoryLog(Mutex<Vec<String>>);

impl MemoryLog {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl BuildLog for MemoryLog {
    fn println(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

#[derive(Default)]
struct MemoryStore(Vec<StoredCredential>);

impl CredentialStore for MemoryStore {
    fn list_credentials(&self, _kind: &str) -> Result<Vec<StoredCredential>> {
        Ok(self.0.clone())
    }
}

struct Harness {
    server: MockServer,
    workspace: TempDir,
    scratch: TempDir,
    log: Arc<MemoryLog>,
}

impl Harness {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            workspace: TempDir::new().unwrap(),
            scratch: TempDir::new().unwrap(),
            log: Arc::new(MemoryLog::default()),
        }
    }

    fn pipeline(&self, store: MemoryStore) -> PublishPipeline {
        let transport =
            TransportClient::new(&TransportConfig::default(), Arc::new(NoProxy)).unwrap();
        let api = AppetizeApi::with_base_url(transport, self.server.uri(), self.log.clone());
        PublishPipeline::new(api, Arc::new(store), self.log.clone())
            .with_temp_dir(self.scratch.path())
    }

    fn request(&self, platform: &str, app_path: &str) -> PublishRequest {
        PublishRequest {
            platform: platform.to_string(),
            app_path: app_path.to_string(),
            credential_ref: None,
            build_number: 42,
            project_name: "sample-app".to_string(),
            instance_id: "0c7d5f3e-8a3b-4c55-9d2e-6f1a2b3c4d5e".to_string(),
            workspace: self.workspace.path().to_path_buf(),
        }
    }

    fn write_apk(&self) {
        std::fs::write(self.workspace.path().join("app-debug.apk"), b"apk-bytes").unwrap();
    }

    fn write_bundle(&self) {
        let app = self.workspace.path().join("build/Sample.app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("Info.plist"), "<plist/>").unwrap();
        std::fs::write(app.join("Sample"), vec![1u8; 2048]).unwrap();
    }

    async fn mount_presign(&self) {
        let uri = self.server.uri();
        Mock::given(method("GET"))
            .and(path("/v1/jenkins/presigned"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iosUrl": format!("{}/storage/ios?X-Amz-Signature=abc", uri),
                "androidUrl": format!("{}/storage/android?X-Amz-Signature=def", uri),
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    async fn expect_no_upload(&self) {
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    async fn expect_no_update(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/app/update"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    fn scratch_is_empty(&self) -> bool {
        is_empty_dir(self.scratch.path())
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

fn update_response() -> serde_json::Value {
    json!({
        "publicKey": "pub_abc",
        "privateKey": "priv_xyz",
        "publicURL": "https://appetize.io/app/pub_abc",
        "appURL": "https://appetize.io/app/pub_abc",
        "manageURL": "https://appetize.io/manage/priv_xyz"
    })
}

#[tokio::test]
async fn test_android_publish_succeeds() {
    let h = Harness::start().await;
    h.write_apk();
    h.mount_presign().await;

    Mock::given(method("PUT"))
        .and(path("/storage/android"))
        .and(body_bytes(b"apk-bytes".to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;

    let request = h.request("android", "app-debug.apk");
    let job_id = derive_job_id(&request.instance_id, &request.project_name);

    Mock::given(method("POST"))
        .and(path("/v1/app/update"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "url": format!("{}/storage/android?X-Amz-Signature=def", h.server.uri()),
            "platform": "android",
            "token": PLACEHOLDER_API_TOKEN,
            "privateKey": null,
            "source": "appetize-jenkins-plugin",
            "jenkinsUUID": request.instance_id,
            "jobUUID": job_id,
            "buildNumber": 42
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(update_response()))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h.pipeline(MemoryStore::default()).run(&request).await;

    match outcome {
        PublishOutcome::Success { platform, result } => {
            assert_eq!(platform.as_str(), "android");
            assert_eq!(result.public_key, "pub_abc");
            assert_eq!(result.private_key.as_deref(), Some("priv_xyz"));
            assert_eq!(result.public_url, "https://appetize.io/app/pub_abc");
            assert_eq!(result.manage_url, "https://appetize.io/manage/priv_xyz");
        }
        other => panic!("expected success, got {other:?}"),
    }

    let lines = h.log.lines();
    assert!(lines.contains(&"Success uploading to Appetize.io".to_string()));
    assert!(lines.contains(&"You can view your app at https://appetize.io/app/pub_abc".to_string()));
    assert!(
        h.workspace.path().join("app-debug.apk").exists(),
        "the build artifact itself is never removed"
    );
}

#[tokio::test]
async fn test_ios_publish_uploads_archive_and_cleans_up() {
    let h = Harness::start().await;
    h.write_bundle();
    h.mount_presign().await;

    Mock::given(method("PUT"))
        .and(path("/storage/ios"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/app/update"))
        .and(body_partial_json(json!({ "platform": "ios" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(update_response()))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .pipeline(MemoryStore::default())
        .run(&h.request("iOS", "build/Sample.app"))
        .await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert!(h.scratch_is_empty(), "temporary archive should be removed");

    let requests = h.server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("upload request");
    assert_eq!(&upload.body[..2], b"PK", "upload body should be a zip archive");
}

#[tokio::test]
async fn test_presign_failure_stops_before_upload() {
    let h = Harness::start().await;
    h.write_bundle();

    Mock::given(method("GET"))
        .and(path("/v1/jenkins/presigned"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .expect(1)
        .mount(&h.server)
        .await;
    h.expect_no_upload().await;
    h.expect_no_update().await;

    let outcome = h
        .pipeline(MemoryStore::default())
        .run(&h.request("ios", "build/Sample.app"))
        .await;

    assert_eq!(
        outcome,
        PublishOutcome::Failure {
            stage: Stage::FetchingPresignedUrls,
            reason: "Status 503: down for maintenance".to_string(),
        }
    );
    assert!(h
        .log
        .lines()
        .iter()
        .any(|l| l.starts_with("Error getting Appetize.io upload URLs")));
}

#[tokio::test]
async fn test_unknown_credential_fails_before_network() {
    let h = Harness::start().await;
    h.write_apk();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;
    h.expect_no_upload().await;
    h.expect_no_update().await;

    let store = MemoryStore(vec![StoredCredential {
        id: "someone-else".to_string(),
        description: None,
        secret: "tok_other".to_string(),
    }]);

    let mut request = h.request("android", "app-debug.apk");
    request.credential_ref = Some("my-token".to_string());

    let outcome = h.pipeline(store).run(&request).await;

    match outcome {
        PublishOutcome::Failure { stage, reason } => {
            assert_eq!(stage, Stage::ResolvingCredentials);
            assert!(reason.contains("Credential not found: my-token"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stored_credential_is_sent_as_token() {
    let h = Harness::start().await;
    h.write_apk();
    h.mount_presign().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/app/update"))
        .and(body_partial_json(json!({ "token": "tok_real" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(update_response()))
        .expect(1)
        .mount(&h.server)
        .await;

    let store = MemoryStore(vec![StoredCredential {
        id: "my-token".to_string(),
        description: Some("CI".to_string()),
        secret: "tok_real".to_string(),
    }]);
    let mut request = h.request("android", "app-debug.apk");
    request.credential_ref = Some("my-token".to_string());

    assert!(h.pipeline(store).run(&request).await.is_success());
}

#[tokio::test]
async fn test_rejected_upload_removes_archive() {
    let h = Harness::start().await;
    h.write_bundle();
    h.mount_presign().await;

    Mock::given(method("PUT"))
        .and(path("/storage/ios"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<Error>AccessDenied</Error>"))
        .expect(1)
        .mount(&h.server)
        .await;
    h.expect_no_update().await;

    let outcome = h
        .pipeline(MemoryStore::default())
        .run(&h.request("ios", "build/Sample.app"))
        .await;

    assert_eq!(
        outcome,
        PublishOutcome::Failure {
            stage: Stage::Uploading,
            reason: "Status 403".to_string(),
        }
    );
    assert!(h.scratch_is_empty(), "temporary archive should be removed");

    let lines = h.log.lines();
    let upload_error = lines
        .iter()
        .find(|l| l.starts_with("Error uploading to"))
        .expect("upload diagnostic");
    assert!(!upload_error.contains("X-Amz-Signature"));
}

#[tokio::test]
async fn test_update_failure_is_reported() {
    let h = Harness::start().await;
    h.write_apk();
    h.mount_presign().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/app/update"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .pipeline(MemoryStore::default())
        .run(&h.request("android", "app-debug.apk"))
        .await;

    assert_eq!(
        outcome,
        PublishOutcome::Failure {
            stage: Stage::UpdatingRecord,
            reason: "Status 401: invalid token".to_string(),
        }
    );
}

#[tokio::test]
async fn test_invalid_platform_rejected_before_network() {
    let h = Harness::start().await;
    h.write_apk();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let outcome = h
        .pipeline(MemoryStore::default())
        .run(&h.request("windows", "app-debug.apk"))
        .await;

    assert_eq!(
        outcome,
        PublishOutcome::Failure {
            stage: Stage::Validating,
            reason: "Invalid platform windows".to_string(),
        }
    );
}

#[tokio::test]
async fn test_wrong_artifact_shape_rejected() {
    let h = Harness::start().await;
    h.write_apk();
    h.write_bundle();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let pipeline = h.pipeline(MemoryStore::default());

    for (platform, app_path) in [
        ("ios", "app-debug.apk"),
        ("android", "build/Sample.app"),
        ("android", "missing.apk"),
        ("ios", ""),
    ] {
        match pipeline.run(&h.request(platform, app_path)).await {
            PublishOutcome::Failure { stage, .. } => assert_eq!(stage, Stage::Validating),
            other => panic!("{platform} {app_path}: expected failure, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_cancelled_build_stops_pipeline() {
    let h = Harness::start().await;
    h.write_apk();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = h
        .pipeline(MemoryStore::default())
        .with_cancellation(cancel)
        .run(&h.request("android", "app-debug.apk"))
        .await;

    assert_eq!(
        outcome,
        PublishOutcome::Failure {
            stage: Stage::Validating,
            reason: "Cancelled".to_string(),
        }
    );
}

/// Cancel `token` after a short delay, while a stage is in flight
fn cancel_soon(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
    });
}

#[tokio::test]
async fn test_cancel_during_upload_releases_archive() {
    let h = Harness::start().await;
    h.write_bundle();
    h.mount_presign().await;

    Mock::given(method("PUT"))
        .and(path("/storage/ios"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .expect(0..=1)
        .mount(&h.server)
        .await;
    h.expect_no_update().await;

    let cancel = CancellationToken::new();
    let pipeline = h
        .pipeline(MemoryStore::default())
        .with_cancellation(cancel.clone());
    cancel_soon(&cancel);

    let started = Instant::now();
    let outcome = pipeline.run(&h.request("ios", "build/Sample.app")).await;

    assert!(started.elapsed() < Duration::from_secs(3), "upload was not interrupted");
    assert_eq!(
        outcome,
        PublishOutcome::Failure {
            stage: Stage::Uploading,
            reason: "Cancelled".to_string(),
        }
    );
    assert!(h.scratch_is_empty(), "temporary archive should be removed");
}

#[tokio::test]
async fn test_cancel_during_presign() {
    let h = Harness::start().await;
    h.write_apk();

    Mock::given(method("GET"))
        .and(path("/v1/jenkins/presigned"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .expect(0..=1)
        .mount(&h.server)
        .await;
    h.expect_no_upload().await;
    h.expect_no_update().await;

    let cancel = CancellationToken::new();
    let pipeline = h
        .pipeline(MemoryStore::default())
        .with_cancellation(cancel.clone());
    cancel_soon(&cancel);

    let started = Instant::now();
    let outcome = pipeline.run(&h.request("android", "app-debug.apk")).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(
        outcome,
        PublishOutcome::Failure {
            stage: Stage::FetchingPresignedUrls,
            reason: "Cancelled".to_string(),
        }
    );
}

#[tokio::test]
async fn test_archive_failure_stops_at_packaging() {
    let h = Harness::start().await;
    h.write_bundle();
    h.mount_presign().await;
    h.expect_no_upload().await;
    h.expect_no_update().await;

    let outcome = h
        .pipeline(MemoryStore::default())
        .with_temp_dir(h.scratch.path().join("missing"))
        .run(&h.request("ios", "build/Sample.app"))
        .await;

    match outcome {
        PublishOutcome::Failure { stage, reason } => {
            assert_eq!(stage, Stage::Packaging);
            assert!(reason.starts_with("Error creating zip file"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let workspace = TempDir::new().unwrap();
    std::fs::write(workspace.path().join("app.apk"), b"apk").unwrap();

    let log = Arc::new(MemoryLog::default());
    let transport = TransportClient::new(&TransportConfig::default(), Arc::new(NoProxy)).unwrap();
    let api = AppetizeApi::with_base_url(transport, "http://127.0.0.1:1", log.clone());
    let pipeline = PublishPipeline::new(api, Arc::new(MemoryStore::default()), log);

    let request = PublishRequest {
        platform: "android".to_string(),
        app_path: "app.apk".to_string(),
        credential_ref: None,
        build_number: 1,
        project_name: "p".to_string(),
        instance_id: "i".to_string(),
        workspace: workspace.path().to_path_buf(),
    };

    match pipeline.run(&request).await {
        PublishOutcome::Failure { stage, reason } => {
            assert_eq!(stage, Stage::FetchingPresignedUrls);
            assert!(reason.starts_with("Transport error"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}
