use std::fs;
use std::time::Duration;

use converter_engine::{
    ConversionService, FailureKind, JobStatus, ReqwestService, ServiceEndpoint, ServiceSettings,
    VideoInfo,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> ReqwestService {
    service_with(server, ServiceSettings::default())
}

fn service_with(server: &MockServer, settings: ServiceSettings) -> ReqwestService {
    let endpoint = ServiceEndpoint::parse(&format!("{}/", server.uri())).expect("endpoint");
    ReqwestService::new(endpoint, &settings).expect("client")
}

#[tokio::test]
async fn validate_returns_video_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "url": "https://youtu.be/abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "info": {
                "title": "Clip",
                "uploader": "Someone",
                "duration": 3725,
                "view_count": 15400,
                "thumbnail": "https://i.ytimg.com/abc.jpg",
                "id": "abc"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = service_for(&server)
        .validate("https://youtu.be/abc")
        .await
        .expect("valid");

    assert_eq!(
        info,
        VideoInfo {
            title: Some("Clip".to_string()),
            uploader: Some("Someone".to_string()),
            duration_secs: Some(3725),
            view_count: Some(15400),
            thumbnail: Some("https://i.ytimg.com/abc.jpg".to_string()),
        }
    );
}

#[tokio::test]
async fn validate_rejection_carries_service_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid YouTube URL" })),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .validate("https://example.com")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Rejected);
    assert_eq!(err.message, "Invalid YouTube URL");
    assert!(err.is_rejection());
}

#[tokio::test]
async fn validate_with_valid_false_and_no_reason_uses_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": false })))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .validate("https://youtu.be/abc")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Rejected);
    assert_eq!(err.message, "Invalid URL");
}

#[tokio::test]
async fn non_json_error_page_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .validate("https://youtu.be/abc")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(502));
    assert!(!err.is_rejection());
}

#[tokio::test]
async fn validate_times_out_on_slow_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "valid": true })),
        )
        .mount(&server)
        .await;

    let settings = ServiceSettings {
        request_timeout: Duration::from_millis(50),
        ..ServiceSettings::default()
    };
    let err = service_with(&server, settings)
        .validate("https://youtu.be/abc")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn validate_accepts_float_view_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "info": { "title": "Clip", "duration": 61.5, "view_count": 1234.0 }
        })))
        .mount(&server)
        .await;

    let info = service_for(&server)
        .validate("https://youtu.be/abc")
        .await
        .expect("valid");

    assert_eq!(info.view_count, Some(1234));
    assert_eq!(info.duration_secs, Some(61));
}

#[tokio::test]
async fn oversized_json_answer_is_refused() {
    let server = MockServer::start().await;
    let padding = "x".repeat(4096);
    Mock::given(method("POST"))
        .and(path("/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "info": { "title": padding }
        })))
        .mount(&server)
        .await;

    let settings = ServiceSettings {
        max_response_bytes: 1024,
        ..ServiceSettings::default()
    };
    let err = service_with(&server, settings)
        .validate("https://youtu.be/abc")
        .await
        .unwrap_err();

    assert!(matches!(
        err.kind,
        FailureKind::TooLarge { max_bytes: 1024, .. }
    ));
    assert!(!err.is_rejection());
}

#[tokio::test]
async fn start_conversion_returns_progress_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .and(body_json(json!({ "url": "https://youtu.be/abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "progress_id": "p1",
            "message": "Conversion started"
        })))
        .mount(&server)
        .await;

    let id = service_for(&server)
        .start_conversion("https://youtu.be/abc")
        .await
        .expect("started");
    assert_eq!(id, "p1");
}

#[tokio::test]
async fn start_conversion_refusal_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Error while starting the conversion"
        })))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .start_conversion("https://youtu.be/abc")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Rejected);
    assert_eq!(err.message, "Error while starting the conversion");
}

#[tokio::test]
async fn start_conversion_without_id_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "?" })))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .start_conversion("https://youtu.be/abc")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn progress_maps_backend_statuses() {
    let server = MockServer::start().await;
    for (id, status) in [
        ("a", "starting"),
        ("b", "downloading"),
        ("c", "processing"),
        ("d", "completed"),
        ("e", "error"),
        ("f", "not_found"),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/progress/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": status,
                "percent": 12.5,
                "message": "msg"
            })))
            .mount(&server)
            .await;
    }

    let service = service_for(&server);
    let mut statuses = Vec::new();
    for id in ["a", "b", "c", "d", "e", "f"] {
        let snapshot = service.progress(id).await.expect("progress");
        assert_eq!(snapshot.percent, 13);
        assert_eq!(snapshot.message.as_deref(), Some("msg"));
        statuses.push(snapshot.status);
    }

    assert_eq!(
        statuses,
        vec![
            JobStatus::Pending,
            JobStatus::Converting,
            JobStatus::Converting,
            JobStatus::Completed,
            JobStatus::Error,
            JobStatus::Error,
        ]
    );
}

#[tokio::test]
async fn progress_http_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/progress/p1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = service_for(&server).progress("p1").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn download_streams_file_under_disposition_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"Clip.mp3\"")
                .set_body_raw(b"ID3-fake-audio".to_vec(), "audio/mpeg"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let saved = service_for(&server)
        .download("p1", dir.path())
        .await
        .expect("saved");

    assert_eq!(saved, dir.path().join("Clip.mp3"));
    assert_eq!(fs::read(&saved).unwrap(), b"ID3-fake-audio");
}

#[tokio::test]
async fn download_without_disposition_uses_progress_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"abc".to_vec(), "audio/mpeg"))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let target = dir.path().join("nested");
    let saved = service_for(&server)
        .download("p2", &target)
        .await
        .expect("saved");

    assert_eq!(saved, target.join("p2.mp3"));
    assert_eq!(fs::read(&saved).unwrap(), b"abc");
}

#[tokio::test]
async fn download_refusal_reports_reason_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/p3"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "File not found" })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let err = service_for(&server)
        .download("p3", dir.path())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Rejected);
    assert_eq!(err.message, "File not found");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn stalled_download_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/p4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_raw(b"late".to_vec(), "audio/mpeg"),
        )
        .mount(&server)
        .await;

    let settings = ServiceSettings {
        request_timeout: Duration::from_millis(200),
        ..ServiceSettings::default()
    };
    let dir = tempfile::TempDir::new().unwrap();
    let service = service_with(&server, settings);
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        service.download("p4", dir.path()),
    )
    .await
    .expect("download gives up before the stall ends");

    let err = result.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
