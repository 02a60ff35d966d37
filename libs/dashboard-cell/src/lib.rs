pub mod client;
pub mod controller;
pub mod filter;
pub mod form;
pub mod state;

pub use client::{ClientError, PatientApiClient};
pub use controller::{Dashboard, Outcome};
pub use filter::{filter_patients, StatusFilter};
pub use form::{FieldDescriptor, InputKind, PatientForm, FORM_FIELDS};
pub use state::{DashboardState, Notification, NotificationKind, UiMode};
