use shared_models::{Patient, PatientStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PatientStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: PatientStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

/// Patients whose full name, city or state contains `search` (ignoring case)
/// and whose status passes `status`. An empty search matches everyone.
pub fn filter_patients<'a>(patients: &'a [Patient], search: &str, status: StatusFilter) -> Vec<&'a Patient> {
    let needle = search.to_lowercase();

    patients
        .iter()
        .filter(|patient| needle.is_empty() || matches_search(patient, &needle))
        .filter(|patient| status.matches(patient.status))
        .collect()
}

fn matches_search(patient: &Patient, needle: &str) -> bool {
    patient.full_name().to_lowercase().contains(needle)
        || patient.city.to_lowercase().contains(needle)
        || patient.state.to_lowercase().contains(needle)
}
