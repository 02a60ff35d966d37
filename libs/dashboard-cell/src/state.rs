use chrono::{DateTime, TimeDelta, Utc};

use shared_models::Patient;

use crate::filter::{filter_patients, StatusFilter};

/// The one modal that may be open.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UiMode {
    #[default]
    Idle,
    Adding,
    Editing(Patient),
    Viewing(Patient),
    ConfirmingDelete(Patient),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    pub fn lifetime(&self) -> TimeDelta {
        match self {
            NotificationKind::Success => TimeDelta::seconds(3),
            NotificationKind::Error => TimeDelta::seconds(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            message: message.into(),
            expires_at: now + kind.lifetime(),
        }
    }

    pub fn success(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(NotificationKind::Success, message, now)
    }

    pub fn error(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(NotificationKind::Error, message, now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Last list fetched from the server, unfiltered.
    pub patients: Vec<Patient>,
    pub search: String,
    pub status_filter: StatusFilter,
    pub mode: UiMode,
    pub notification: Option<Notification>,
    pub loading: bool,
    pub load_error: Option<String>,
    pub submitting: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_patients(&self) -> Vec<&Patient> {
        filter_patients(&self.patients, &self.search, self.status_filter)
    }

    pub fn open_add(&mut self) {
        self.mode = UiMode::Adding;
    }

    pub fn open_edit(&mut self, patient: Patient) {
        self.mode = UiMode::Editing(patient);
    }

    pub fn view(&mut self, patient: Patient) {
        self.mode = UiMode::Viewing(patient);
    }

    pub fn request_delete(&mut self, patient: Patient) {
        self.mode = UiMode::ConfirmingDelete(patient);
    }

    pub fn close(&mut self) {
        self.mode = UiMode::Idle;
    }

    /// Replaces whatever notification is showing.
    pub fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    /// Drops the notification once its lifetime has passed.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self
            .notification
            .as_ref()
            .is_some_and(|notification| notification.is_expired(now))
        {
            self.notification = None;
        }
    }
}
