pub mod academic_status;
pub mod account_balance;
pub mod account_transactions;
pub mod class_schedule;
pub mod classification;
pub mod degrees;
pub mod dual_enrollment;
pub mod emergency_contacts;
pub mod gpa;
pub mod grades;
pub mod holds;
pub mod work_study;

// Re-export handler functions for use in routing
pub use academic_status::get as academic_status_get;
pub use account_balance::get as account_balance_get;
pub use account_transactions::get as account_transactions_get;
pub use class_schedule::get as class_schedule_get;
pub use classification::get as classification_get;
pub use degrees::get as degrees_get;
pub use dual_enrollment::get as dual_enrollment_get;
pub use emergency_contacts::get as emergency_contacts_get;
pub use gpa::get as gpa_get;
pub use grades::get as grades_get;
pub use holds::get as holds_get;
pub use work_study::get as work_study_get;

use crate::error::ApiError;
use crate::types::QueryParams;

/// Student identifiers are 9-digit strings
pub fn validate_osu_id(osu_id: &str) -> Result<(), ApiError> {
    if osu_id.len() == 9 && osu_id.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    Err(ApiError::bad_request("osuId must be a 9-digit identifier"))
}

/// Terms are 6-digit year+quarter codes, or the `current` sentinel resolved
/// by the DAO
pub fn validate_term(params: &QueryParams) -> Result<(), ApiError> {
    match params.term.as_deref() {
        None | Some("current") => Ok(()),
        Some(term) if term.len() == 6 && term.chars().all(|c| c.is_ascii_digit()) => Ok(()),
        Some(_) => Err(ApiError::bad_request(
            "term must be a 6-digit term code or 'current'",
        )),
    }
}
