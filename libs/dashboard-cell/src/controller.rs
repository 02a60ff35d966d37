use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use shared_models::Patient;

use crate::client::PatientApiClient;
use crate::filter::StatusFilter;
use crate::form::PatientForm;
use crate::state::{DashboardState, Notification, UiMode};

/// Result of a user action that talks to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server accepted the change and the list was refetched.
    Saved,
    /// The form failed local validation; nothing was sent.
    Invalid,
    /// Another submission is still in flight.
    Busy,
    /// The server or network rejected the change; an error banner is showing.
    Failed,
    /// No modal that accepts this action is open.
    Ignored,
}

enum Submission {
    Create,
    Update(Patient),
}

/// Drives the patient list screen.
///
/// Every mutation is followed by a full refetch of the list. State lives
/// behind a lock so overlapping UI events see one consistent value; the lock
/// is never held across a request.
#[derive(Clone)]
pub struct Dashboard {
    client: PatientApiClient,
    state: Arc<RwLock<DashboardState>>,
}

impl Dashboard {
    pub fn new(client: PatientApiClient) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(DashboardState::new())),
        }
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub async fn load(&self) {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.load_error = None;
        }

        let result = self.client.list_patients().await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(patients) => {
                debug!("Loaded {} patients", patients.len());
                state.patients = patients;
            }
            Err(e) => {
                warn!("Failed to load patients: {}", e);
                state.load_error = Some(e.load_message());
            }
        }
    }

    pub async fn set_search(&self, search: impl Into<String>) {
        self.state.write().await.search = search.into();
    }

    pub async fn set_status_filter(&self, filter: StatusFilter) {
        self.state.write().await.status_filter = filter;
    }

    pub async fn open_add(&self) -> PatientForm {
        self.state.write().await.open_add();
        PatientForm::new()
    }

    pub async fn open_edit(&self, patient: &Patient) -> PatientForm {
        self.state.write().await.open_edit(patient.clone());
        PatientForm::from_patient(patient)
    }

    pub async fn view(&self, patient: &Patient) {
        self.state.write().await.view(patient.clone());
    }

    pub async fn request_delete(&self, patient: &Patient) {
        self.state.write().await.request_delete(patient.clone());
    }

    pub async fn close(&self) {
        self.state.write().await.close();
    }

    /// Drops an expired notification.
    pub async fn tick(&self) {
        self.state.write().await.tick(Utc::now());
    }

    /// Sends the open add/edit form.
    ///
    /// On success the modal closes and the list is refetched. On failure the
    /// modal stays open and any per-field errors from the server are shown on
    /// `form`.
    pub async fn submit(&self, form: &mut PatientForm) -> Outcome {
        if !form.validate() {
            return Outcome::Invalid;
        }

        let submission = {
            let mut state = self.state.write().await;
            if state.submitting {
                return Outcome::Busy;
            }
            let submission = match &state.mode {
                UiMode::Adding => Submission::Create,
                UiMode::Editing(patient) => Submission::Update(patient.clone()),
                _ => return Outcome::Ignored,
            };
            state.submitting = true;
            submission
        };

        let body = form.body();
        let (result, success, fallback) = match &submission {
            Submission::Create => (
                self.client.create_patient(body).await,
                "Patient added successfully!",
                "Failed to add patient. Please try again.",
            ),
            Submission::Update(patient) => (
                self.client.update_patient(&patient.id, body).await,
                "Patient updated successfully!",
                "Failed to update patient. Please try again.",
            ),
        };

        {
            let mut state = self.state.write().await;
            state.submitting = false;
            match &result {
                Ok(patient) => {
                    info!("Saved patient {}", patient.id);
                    state.close();
                    state.notify(Notification::success(success, Utc::now()));
                }
                Err(e) => {
                    warn!("Failed to save patient: {}", e);
                    form.apply_server_errors(e.field_errors());
                    state.notify(Notification::error(e.user_message(fallback), Utc::now()));
                }
            }
        }

        match result {
            Ok(_) => {
                self.load().await;
                Outcome::Saved
            }
            Err(_) => Outcome::Failed,
        }
    }

    /// Deletes the patient awaiting confirmation.
    pub async fn confirm_delete(&self) -> Outcome {
        let patient = {
            let mut state = self.state.write().await;
            if state.submitting {
                return Outcome::Busy;
            }
            let UiMode::ConfirmingDelete(patient) = &state.mode else {
                return Outcome::Ignored;
            };
            let patient = patient.clone();
            state.submitting = true;
            patient
        };

        let result = self.client.delete_patient(&patient.id).await;

        {
            let mut state = self.state.write().await;
            state.submitting = false;
            match &result {
                Ok(_) => {
                    info!("Deleted patient {}", patient.id);
                    state.close();
                    state.notify(Notification::success("Patient deleted successfully!", Utc::now()));
                }
                Err(e) => {
                    warn!("Failed to delete patient {}: {}", patient.id, e);
                    state.notify(Notification::error(
                        e.user_message("Failed to delete patient. Please try again."),
                        Utc::now(),
                    ));
                }
            }
        }

        match result {
            Ok(_) => {
                self.load().await;
                Outcome::Saved
            }
            Err(_) => Outcome::Failed,
        }
    }
}
