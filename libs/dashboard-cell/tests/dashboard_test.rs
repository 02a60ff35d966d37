use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashboard_cell::{ClientError, Dashboard, NotificationKind, Outcome, PatientApiClient, PatientForm, UiMode};
use shared_models::{Field, PatientStatus};
use shared_utils::test_utils::PatientFixtures;

fn dashboard_for(server: &MockServer) -> Dashboard {
    Dashboard::new(PatientApiClient::new(&server.uri()))
}

async fn mount_list(server: &MockServer, patients: serde_json::Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(PatientFixtures::envelope(patients)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_client_reads_list_envelope() {
    let mock_server = MockServer::start().await;
    let jane = PatientFixtures::jane();
    mount_list(&mock_server, json!([jane]), 1).await;

    let client = PatientApiClient::new(&mock_server.uri());
    let patients = client.list_patients().await.unwrap();

    assert_eq!(patients, vec![jane]);
}

#[tokio::test]
async fn test_client_surfaces_server_validation_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/patients"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Validation failed",
            "errors": [{ "field": "postalCode", "message": "Postal code must be a valid US ZIP (12345 or 12345-6789) or Canadian postal code (A1A 1A1)" }]
        })))
        .mount(&mock_server)
        .await;

    let client = PatientApiClient::new(&mock_server.uri());
    let err = client.create_patient(PatientFixtures::jane_body()).await.unwrap_err();

    assert_matches!(err, ClientError::Server { status: 400, .. });
    assert_eq!(err.field_errors()[0].field, "postalCode");
}

#[tokio::test]
async fn test_client_fetches_one_patient() {
    let mock_server = MockServer::start().await;
    let jane = PatientFixtures::jane();
    let missing = PatientFixtures::patient("Ann", PatientStatus::Active, "Springfield", "IL");

    Mock::given(method("GET"))
        .and(path(format!("/patients/{}", jane.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(PatientFixtures::envelope(json!(jane))))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/patients/{}", missing.id)))
        .respond_with(ResponseTemplate::new(404).set_body_json(PatientFixtures::failure("Patient not found")))
        .mount(&mock_server)
        .await;

    let client = PatientApiClient::new(&mock_server.uri());

    assert_eq!(client.get_patient(&jane.id).await.unwrap(), jane);

    let err = client.get_patient(&missing.id).await.unwrap_err();
    assert_matches!(err, ClientError::Server { status: 404, .. });
    assert_eq!(err.user_message("Failed to load patient."), "Patient not found");
}

#[tokio::test]
async fn test_client_delete_returns_confirmation() {
    let mock_server = MockServer::start().await;
    let jane = PatientFixtures::jane();

    Mock::given(method("DELETE"))
        .and(path(format!("/patients/{}", jane.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Patient deleted successfully"
        })))
        .mount(&mock_server)
        .await;

    let client = PatientApiClient::new(&mock_server.uri());
    let message = client.delete_patient(&jane.id).await.unwrap();

    assert_eq!(message, "Patient deleted successfully");
}

#[tokio::test]
async fn test_load_populates_list() {
    let mock_server = MockServer::start().await;
    let ann = PatientFixtures::patient("Ann", PatientStatus::Active, "Springfield", "IL");
    let ben = PatientFixtures::patient("Ben", PatientStatus::Churned, "Toronto", "ON");
    mount_list(&mock_server, json!([ann, ben]), 1).await;

    let dashboard = dashboard_for(&mock_server);
    dashboard.load().await;
    dashboard.set_search("toronto").await;

    let state = dashboard.snapshot().await;
    assert!(!state.loading);
    assert_eq!(state.load_error, None);
    assert_eq!(state.patients.len(), 2);
    assert_eq!(state.visible_patients()[0].first_name, "Ben");
}

#[tokio::test]
async fn test_load_errors_are_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/patients"))
        .respond_with(ResponseTemplate::new(404).set_body_json(PatientFixtures::failure("Not found")))
        .mount(&mock_server)
        .await;

    let dashboard = dashboard_for(&mock_server);
    dashboard.load().await;
    assert_eq!(
        dashboard.snapshot().await.load_error.as_deref(),
        Some("Patients endpoint not found. Please check the server.")
    );

    let offline = Dashboard::new(PatientApiClient::new("http://127.0.0.1:1"));
    offline.load().await;
    let state = offline.snapshot().await;
    assert!(!state.loading);
    assert_eq!(state.load_error.as_deref(), Some("Network error. Please check your connection."));
}

#[tokio::test]
async fn test_add_patient_refetches_and_notifies() {
    let mock_server = MockServer::start().await;
    let jane = PatientFixtures::jane();

    Mock::given(method("POST"))
        .and(path("/patients"))
        .and(body_partial_json(json!({ "firstName": "Jane", "dob": "01-02-1990" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(PatientFixtures::envelope(json!(jane))))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_list(&mock_server, json!([jane]), 1).await;

    let dashboard = dashboard_for(&mock_server);
    let mut form = dashboard.open_add().await;
    for (key, value) in PatientFixtures::jane_body().as_object().unwrap() {
        form.set(Field::from_key(key).unwrap(), value.as_str().unwrap());
    }

    let outcome = dashboard.submit(&mut form).await;

    assert_eq!(outcome, Outcome::Saved);
    let state = dashboard.snapshot().await;
    assert_eq!(state.mode, UiMode::Idle);
    assert!(!state.submitting);
    assert_eq!(state.patients.len(), 1);
    let notification = state.notification.unwrap();
    assert_eq!(notification.kind, NotificationKind::Success);
    assert_eq!(notification.message, "Patient added successfully!");
}

#[tokio::test]
async fn test_invalid_form_is_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dashboard = dashboard_for(&mock_server);
    let mut form = dashboard.open_add().await;
    form.set(Field::FirstName, "J");

    assert_eq!(dashboard.submit(&mut form).await, Outcome::Invalid);
    assert_eq!(form.error(Field::FirstName), Some("First name must be at least 2 characters"));
    assert_eq!(dashboard.snapshot().await.mode, UiMode::Adding);
}

#[tokio::test]
async fn test_failed_update_keeps_form_open_with_server_errors() {
    let mock_server = MockServer::start().await;
    let jane = PatientFixtures::jane();

    Mock::given(method("PUT"))
        .and(path(format!("/patients/{}", jane.id)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Validation failed",
            "errors": [{ "field": "city", "message": "City is required" }]
        })))
        .mount(&mock_server)
        .await;
    mount_list(&mock_server, json!([]), 0).await;

    let dashboard = dashboard_for(&mock_server);
    let mut form = dashboard.open_edit(&jane).await;

    assert_eq!(dashboard.submit(&mut form).await, Outcome::Failed);
    assert_eq!(form.error(Field::City), Some("City is required"));

    let state = dashboard.snapshot().await;
    assert_eq!(state.mode, UiMode::Editing(jane));
    let notification = state.notification.unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(notification.message, "Validation failed");
}

#[tokio::test]
async fn test_second_submit_is_refused_while_first_is_in_flight() {
    let mock_server = MockServer::start().await;
    let jane = PatientFixtures::jane();

    Mock::given(method("POST"))
        .and(path("/patients"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(PatientFixtures::envelope(json!(jane)))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_list(&mock_server, json!([jane]), 1).await;

    let dashboard = dashboard_for(&mock_server);
    dashboard.open_add().await;
    let mut first = PatientForm::from_patient(&jane);
    let mut second = PatientForm::from_patient(&jane);

    let (a, b) = tokio::join!(dashboard.submit(&mut first), dashboard.submit(&mut second));

    assert_eq!(a, Outcome::Saved);
    assert_eq!(b, Outcome::Busy);
}

#[tokio::test]
async fn test_confirm_delete_removes_and_refetches() {
    let mock_server = MockServer::start().await;
    let jane = PatientFixtures::jane();

    Mock::given(method("DELETE"))
        .and(path(format!("/patients/{}", jane.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Patient deleted successfully"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_list(&mock_server, json!([]), 1).await;

    let dashboard = dashboard_for(&mock_server);
    assert_eq!(dashboard.confirm_delete().await, Outcome::Ignored);

    dashboard.request_delete(&jane).await;
    assert_eq!(dashboard.confirm_delete().await, Outcome::Saved);

    let state = dashboard.snapshot().await;
    assert_eq!(state.mode, UiMode::Idle);
    assert!(state.patients.is_empty());
    assert_eq!(state.notification.unwrap().message, "Patient deleted successfully!");
}

#[tokio::test]
async fn test_delete_failure_shows_fallback_banner() {
    let mock_server = MockServer::start().await;
    let jane = PatientFixtures::jane();

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let dashboard = dashboard_for(&mock_server);
    dashboard.request_delete(&jane).await;

    assert_eq!(dashboard.confirm_delete().await, Outcome::Failed);
    let state = dashboard.snapshot().await;
    assert_eq!(state.mode, UiMode::ConfirmingDelete(jane));
    assert_eq!(
        state.notification.unwrap().message,
        "Failed to delete patient. Please try again."
    );
}
