use std::sync::Arc;
use std::time::Duration;

use autolab_client::types::{AttachmentFormat, AuthLevel, EnrollmentOptions};
use autolab_client::{Client, Config, Error, FileTokenStore, TokenPair, TokenStore};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COURSE: &str = "/api/v1/courses/15-213";

fn config(server: &MockServer) -> Config {
    Config::from_values(server.uri(), "cli", "secret", "urn:ietf:wg:oauth:2.0:oob")
        .with_poll_interval(Duration::from_millis(10))
}

fn client(server: &MockServer) -> Client {
    let mut client = Client::new(config(server)).expect("client");
    client.set_tokens(TokenPair::new("access", "refresh"));
    client
}

#[tokio::test]
async fn courses_and_assessments_map_into_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .and(query_param("state", "current"))
        .and(query_param("access_token", "access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "name": "15-213",
                "display_name": "Intro to Computer Systems",
                "semester": "S19",
                "late_slack": 0,
                "grace_days": 5,
                "auth_level": "instructor"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/assessments/malloclab", COURSE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "malloclab",
            "display_name": "Malloc Lab",
            "start_at": "2019-02-01T12:00:00-05:00",
            "due_at": "2019-02-14T23:59:00-05:00",
            "end_at": "2019-02-17T23:59:00-05:00",
            "category_name": "Labs",
            "max_submissions": 20,
            "handout_format": "file",
            "writeup_format": "url"
        })))
        .mount(&server)
        .await;

    let mut client = client(&server);
    let courses = client.courses().await.expect("courses");
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].name, "15-213");
    assert_eq!(courses[0].grace_days, 5);
    assert_eq!(courses[0].auth_level, AuthLevel::Instructor);

    let details = client
        .assessment_details("15-213", "malloclab")
        .await
        .expect("details");
    assert_eq!(details.assessment.name, "malloclab");
    assert_eq!(details.max_submissions, 20);
    assert_eq!(details.max_grace_days, -1);
    assert_eq!(details.group_size, 1);
    assert_eq!(details.handout_format, AttachmentFormat::File);
    assert_eq!(details.writeup_format, AttachmentFormat::Url);
    assert!(details.assessment.due_at > details.assessment.start_at);
    assert!(details.assessment.grading_deadline.is_none());
}

#[tokio::test]
async fn feedback_returns_the_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "{}/assessments/malloclab/submissions/3/feedback",
            COURSE
        )))
        .and(query_param("problem", "Correctness"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "feedback": "All tests passed" })),
        )
        .mount(&server)
        .await;

    let mut client = client(&server);
    let text = client
        .feedback("15-213", "malloclab", 3, "Correctness")
        .await
        .expect("feedback");
    assert_eq!(text, "All tests passed");
}

#[tokio::test]
async fn enrollment_changes_send_only_set_fields() {
    let server = MockServer::start().await;
    let enrollment = serde_json::json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.edu",
        "section": "B",
        "dropped": false,
        "auth_level": "course_assistant"
    });
    Mock::given(method("POST"))
        .and(path(format!("{}/course_user_data", COURSE)))
        .and(body_string_contains("email=ada%40example.edu"))
        .and(body_string_contains("section=B"))
        .and(body_string_contains("auth_level=course_assistant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(enrollment.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/course_user_data/ada%40example.edu", COURSE)))
        .and(query_param("dropped", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(enrollment.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let created = client
        .create_enrollment(
            "15-213",
            "ada@example.edu",
            &EnrollmentOptions {
                section: Some("B".into()),
                auth_level: Some(AuthLevel::CourseAssistant),
                ..EnrollmentOptions::default()
            },
        )
        .await
        .expect("create");
    assert_eq!(created.user.email, "ada@example.edu");
    assert_eq!(created.auth_level, AuthLevel::CourseAssistant);

    client
        .update_enrollment(
            "15-213",
            "ada@example.edu",
            &EnrollmentOptions {
                dropped: Some(true),
                ..EnrollmentOptions::default()
            },
        )
        .await
        .expect("update");
}

#[tokio::test]
async fn submit_uploads_multipart_and_returns_version() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/assessments/malloclab/submit", COURSE)))
        .and(query_param("access_token", "access"))
        .and(body_string_contains("name=\"submission[file]\""))
        .and(body_string_contains("int main(void)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "version": 4,
            "filename": "mm.c"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("mm.c");
    std::fs::write(&file, "int main(void) { return 0; }\n").expect("write");

    let mut client = client(&server);
    let version = client
        .submit("15-213", "malloclab", &file)
        .await
        .expect("submit");
    assert_eq!(version, 4);
}

#[tokio::test]
async fn server_error_field_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(serde_json::json!({ "error": "User does not have access" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = client(&server);
    match client.user_info().await {
        Err(Error::ServerRejected(msg)) => assert_eq!(msg, "User does not have access"),
        other => panic!("expected ServerRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn unexpected_shape_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/assessments", COURSE)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "not a list" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let mut client = client(&server);
    let res = client.assessments("15-213").await;
    assert!(matches!(res, Err(Error::InvalidResponse(_))), "{:?}", res);

    let res = client.user_info().await;
    assert!(matches!(res, Err(Error::InvalidResponse(_))), "{:?}", res);
}

#[tokio::test]
async fn dot_identifier_never_reaches_the_server() {
    let server = MockServer::start().await;
    let mut client = client(&server);

    match client.assessments("..").await {
        Err(Error::InvalidPath(segment)) => assert_eq!(segment, ".."),
        other => panic!("expected InvalidPath, got {:?}", other),
    }
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "unexpected requests: {:?}", requests);
}

#[test]
fn invalid_base_url_is_a_config_error() {
    let config = Config::from_values("http://exa mple.edu", "cli", "secret", "uri");
    match Client::new(config) {
        Err(Error::Config(msg)) => assert!(msg.contains("Invalid base URL"), "{}", msg),
        Err(other) => panic!("expected Config error, got {:?}", other),
        Ok(_) => panic!("expected Config error"),
    }
}

#[tokio::test]
async fn stored_tokens_are_used_for_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user"))
        .and(query_param("access_token", "from-disk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.edu"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileTokenStore::new(dir.path().join("tokens.json")));
    store
        .store_tokens(&TokenPair::new("from-disk", "refresh"))
        .expect("seed store");

    let mut client = Client::new(config(&server))
        .expect("client")
        .with_token_store(store);
    assert!(client.load_tokens().expect("load"));
    let user = client.user_info().await.expect("user");
    assert_eq!(user.first_name, "Ada");
    assert!(user.school.is_none());
}
