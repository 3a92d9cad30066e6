//! Query descriptors for the student records database.
//!
//! Each descriptor is a pure function from filter parameters to SQL text, so
//! the same logical query can vary its WHERE clauses by which filters are
//! present. Bind placeholders use `:name` form and are rewritten to
//! positional parameters by the connection layer. Column aliases are quoted
//! camelCase so raw rows arrive keyed the way the serializers expect.

use crate::types::QueryParams;

/// Signature shared by every resource query descriptor.
pub type QueryDescriptor = fn(&QueryParams) -> String;

/// Distinguished lookup used to resolve the `current` term sentinel.
/// Returns a single row with a `currentTerm` column.
pub fn current_term() -> &'static str {
    "SELECT t.code AS \"currentTerm\"\n\
     FROM academic_terms t\n\
     WHERE CURRENT_DATE BETWEEN t.start_date AND t.end_date"
}

pub fn gpa_levels_by_id(_params: &QueryParams) -> String {
    "SELECT g.level_code AS \"levelCode\",\n\
            g.level_description AS \"level\",\n\
            g.gpa_type AS \"gpaType\",\n\
            g.gpa AS \"gpa\",\n\
            g.gpa_credit_hours AS \"gpaCreditHours\",\n\
            g.credit_hours_attempted AS \"creditHoursAttempted\",\n\
            g.credit_hours_earned AS \"creditHoursEarned\",\n\
            g.credit_hours_passed AS \"creditHoursPassed\",\n\
            g.quality_points AS \"qualityPoints\"\n\
     FROM gpa_levels g\n\
     WHERE g.osu_id = :osuId\n\
     ORDER BY g.level_code"
        .to_string()
}

pub fn account_balance_by_id(_params: &QueryParams) -> String {
    "SELECT b.current_balance AS \"currentBalance\"\n\
     FROM account_balances b\n\
     WHERE b.osu_id = :osuId"
        .to_string()
}

pub fn transactions_by_id(params: &QueryParams) -> String {
    let mut sql = String::from(
        "SELECT t.amount AS \"amount\",\n\
                t.description AS \"description\",\n\
                t.entry_date AS \"entryDate\",\n\
                t.transaction_type AS \"transactionType\",\n\
                t.term AS \"term\"\n\
         FROM account_transactions t\n\
         WHERE t.osu_id = :osuId",
    );
    if params.term.is_some() {
        sql.push_str("\n  AND t.term = :term");
    }
    if params.transaction_type.is_some() {
        sql.push_str("\n  AND t.transaction_type = :transactionType");
    }
    if let Some(categories) = &params.categories {
        sql.push_str(&format!(
            "\n  AND t.category_code IN ({})",
            bind_list("category", categories.len())
        ));
    }
    sql.push_str("\nORDER BY t.entry_date DESC");
    sql
}

pub fn academic_status_by_id(params: &QueryParams) -> String {
    let mut sql = String::from(
        "SELECT s.academic_standing AS \"academicStanding\",\n\
                s.term AS \"term\",\n\
                s.term_description AS \"termDescription\",\n\
                g.gpa AS \"gpa\",\n\
                g.gpa_type AS \"gpaType\",\n\
                g.gpa_credit_hours AS \"gpaCreditHours\",\n\
                g.credit_hours_attempted AS \"creditHoursAttempted\",\n\
                g.credit_hours_earned AS \"creditHoursEarned\",\n\
                g.credit_hours_passed AS \"creditHoursPassed\",\n\
                g.level_code AS \"levelCode\",\n\
                g.level_description AS \"level\",\n\
                g.quality_points AS \"qualityPoints\"\n\
         FROM academic_standings s\n\
         LEFT JOIN term_gpa_levels g\n\
           ON g.osu_id = s.osu_id AND g.term = s.term\n\
         WHERE s.osu_id = :osuId",
    );
    if params.term.is_some() {
        sql.push_str("\n  AND s.term = :term");
    }
    sql.push_str("\nORDER BY s.term, g.level_code");
    sql
}

pub fn classification_by_id(_params: &QueryParams) -> String {
    "SELECT c.level AS \"level\",\n\
            c.classification AS \"classification\",\n\
            c.is_international AS \"isInternational\"\n\
     FROM student_classifications c\n\
     WHERE c.osu_id = :osuId"
        .to_string()
}

pub fn grades_by_id(params: &QueryParams) -> String {
    let mut sql = String::from(
        "SELECT r.term AS \"term\",\n\
                r.term_description AS \"termDescription\",\n\
                r.course_reference_number AS \"courseReferenceNumber\",\n\
                r.course_subject AS \"courseSubject\",\n\
                r.course_subject_description AS \"courseSubjectDescription\",\n\
                r.course_number AS \"courseNumber\",\n\
                r.course_title AS \"courseTitle\",\n\
                r.section_number AS \"sectionNumber\",\n\
                r.credit_hours AS \"creditHours\",\n\
                r.registration_status AS \"registrationStatus\",\n\
                r.grade_final AS \"gradeFinal\",\n\
                r.grade_mode AS \"gradeMode\",\n\
                r.registration_course_level AS \"sfrstcrCourseLevel\",\n\
                r.transcript_course_level AS \"tcknCourseLevel\"\n\
         FROM course_grades r\n\
         WHERE r.osu_id = :osuId",
    );
    if params.term.is_some() {
        sql.push_str("\n  AND r.term = :term");
    }
    sql.push_str("\nORDER BY r.term, r.course_reference_number");
    sql
}

pub fn class_schedule_by_id(params: &QueryParams) -> String {
    let mut sql = String::from(
        "SELECT r.academic_year AS \"academicYear\",\n\
                r.academic_year_description AS \"academicYearDescription\",\n\
                r.course_reference_number AS \"courseReferenceNumber\",\n\
                r.course_subject AS \"courseSubject\",\n\
                r.course_subject_description AS \"courseSubjectDescription\",\n\
                r.course_number AS \"courseNumber\",\n\
                r.course_title_long AS \"courseTitleLong\",\n\
                r.course_title_short AS \"courseTitleShort\",\n\
                r.section_number AS \"sectionNumber\",\n\
                r.term AS \"term\",\n\
                r.term_description AS \"termDescription\",\n\
                r.schedule_description AS \"scheduleDescription\",\n\
                r.schedule_type AS \"scheduleType\",\n\
                r.credit_hours AS \"creditHours\",\n\
                r.registration_status AS \"registrationStatus\",\n\
                r.grading_mode AS \"gradingMode\",\n\
                r.continuing_education AS \"continuingEducation\",\n\
                r.repeated_course_ind AS \"repeatedCourseInd\",\n\
                f.faculty_osu_id AS \"facultyOsuId\",\n\
                f.faculty_name AS \"facultyName\",\n\
                f.faculty_email AS \"facultyEmail\",\n\
                f.faculty_primary AS \"facultyPrimary\",\n\
                m.begin_date AS \"beginDate\",\n\
                m.begin_time AS \"beginTime\",\n\
                m.end_date AS \"endDate\",\n\
                m.end_time AS \"endTime\",\n\
                m.room AS \"room\",\n\
                m.building AS \"building\",\n\
                m.building_description AS \"buildingDescription\",\n\
                m.campus_code AS \"campusCode\",\n\
                m.campus AS \"campus\",\n\
                m.hours_per_week AS \"hoursPerWeek\",\n\
                m.credit_hour_session AS \"creditHourSession\",\n\
                m.schedule_type AS \"meetingScheduleType\",\n\
                m.schedule_description AS \"meetingScheduleDescription\",\n\
                m.monday AS \"monday\",\n\
                m.tuesday AS \"tuesday\",\n\
                m.wednesday AS \"wednesday\",\n\
                m.thursday AS \"thursday\",\n\
                m.friday AS \"friday\",\n\
                m.saturday AS \"saturday\",\n\
                m.sunday AS \"sunday\"\n\
         FROM registrations r\n\
         LEFT JOIN section_faculty f\n\
           ON f.term = r.term AND f.course_reference_number = r.course_reference_number\n\
         LEFT JOIN section_meeting_times m\n\
           ON m.term = r.term AND m.course_reference_number = r.course_reference_number\n\
         WHERE r.osu_id = :osuId",
    );
    if params.term.is_some() {
        sql.push_str("\n  AND r.term = :term");
    }
    sql.push_str("\nORDER BY r.term, r.course_reference_number");
    sql
}

pub fn holds_by_id(params: &QueryParams) -> String {
    let mut sql = String::from(
        "SELECT h.from_date AS \"fromDate\",\n\
                h.to_date AS \"toDate\",\n\
                h.description AS \"description\",\n\
                h.reason AS \"reason\",\n\
                h.web_display AS \"webDisplay\",\n\
                h.released_ind AS \"releasedInd\",\n\
                CASE WHEN h.affects_registration = 'Y' THEN 'Registration' END AS \"registration\",\n\
                CASE WHEN h.affects_transcript = 'Y' THEN 'Transcript' END AS \"transcript\",\n\
                CASE WHEN h.affects_graduation = 'Y' THEN 'Graduation' END AS \"graduation\",\n\
                CASE WHEN h.affects_grades = 'Y' THEN 'Grades' END AS \"grades\",\n\
                CASE WHEN h.affects_accounts_receivable = 'Y' THEN 'Accounts Receivable' END AS \"accountsReceivable\",\n\
                CASE WHEN h.affects_enrollment_verification = 'Y' THEN 'Enrollment Verification' END AS \"enrollmentVerification\",\n\
                CASE WHEN h.affects_application = 'Y' THEN 'Application' END AS \"application\",\n\
                CASE WHEN h.affects_compliance = 'Y' THEN 'Compliance' END AS \"compliance\"\n\
         FROM student_holds h\n\
         WHERE h.osu_id = :osuId",
    );
    if let Some(codes) = &params.codes {
        sql.push_str(&format!(
            "\n  AND h.hold_code IN ({})",
            bind_list("code", codes.len())
        ));
    }
    sql.push_str("\nORDER BY h.from_date");
    sql
}

pub fn awards_by_id(_params: &QueryParams) -> String {
    "SELECT a.effective_start_date AS \"effectiveStartDate\",\n\
            a.effective_end_date AS \"effectiveEndDate\",\n\
            a.offer_amount AS \"offerAmount\",\n\
            a.offer_expiration_date AS \"offerExpirationDate\",\n\
            a.accepted_amount AS \"acceptedAmount\",\n\
            a.accepted_date AS \"acceptedDate\",\n\
            a.paid_amount AS \"paidAmount\",\n\
            a.award_status AS \"awardStatus\"\n\
     FROM financial_aid_awards a\n\
     WHERE a.osu_id = :osuId\n\
       AND a.fund_category = 'WKST'\n\
     ORDER BY a.effective_start_date"
        .to_string()
}

pub fn dual_enrollment_by_id(params: &QueryParams) -> String {
    let mut sql = String::from(
        "SELECT e.term AS \"term\",\n\
                e.term_description AS \"termDescription\",\n\
                e.credit_hours AS \"creditHours\"\n\
         FROM dual_enrollments e\n\
         WHERE e.osu_id = :osuId",
    );
    if params.term.is_some() {
        sql.push_str("\n  AND e.term = :term");
    }
    sql.push_str("\nORDER BY e.term");
    sql
}

pub fn degrees_by_id(params: &QueryParams) -> String {
    let mut sql = String::from(
        "SELECT d.term AS \"term\",\n\
                d.term_description AS \"termDescription\",\n\
                d.program_number AS \"programNumber\",\n\
                d.primary_degree AS \"primaryDegree\",\n\
                d.degree AS \"degree\",\n\
                d.level AS \"level\",\n\
                d.college AS \"college\",\n\
                d.honor_ind AS \"honorInd\",\n\
                d.first_major AS \"firstMajor\",\n\
                d.first_program_classification AS \"firstProgramClassification\",\n\
                d.first_department AS \"firstDepartment\",\n\
                d.first_major_first_concentration AS \"firstMajorFirstConcentration\",\n\
                d.first_major_second_concentration AS \"firstMajorSecondConcentration\",\n\
                d.first_major_third_concentration AS \"firstMajorThirdConcentration\",\n\
                d.second_major AS \"secondMajor\",\n\
                d.second_program_classification AS \"secondProgramClassification\",\n\
                d.second_department AS \"secondDepartment\",\n\
                d.second_major_first_concentration AS \"secondMajorFirstConcentration\",\n\
                d.second_major_second_concentration AS \"secondMajorSecondConcentration\",\n\
                d.second_major_third_concentration AS \"secondMajorThirdConcentration\",\n\
                d.third_major AS \"thirdMajor\",\n\
                d.third_program_classification AS \"thirdProgramClassification\",\n\
                d.third_department AS \"thirdDepartment\",\n\
                d.third_major_first_concentration AS \"thirdMajorFirstConcentration\",\n\
                d.third_major_second_concentration AS \"thirdMajorSecondConcentration\",\n\
                d.third_major_third_concentration AS \"thirdMajorThirdConcentration\",\n\
                d.fourth_major AS \"fourthMajor\",\n\
                d.fourth_program_classification AS \"fourthProgramClassification\",\n\
                d.fourth_department AS \"fourthDepartment\",\n\
                d.fourth_major_first_concentration AS \"fourthMajorFirstConcentration\",\n\
                d.fourth_major_second_concentration AS \"fourthMajorSecondConcentration\",\n\
                d.fourth_major_third_concentration AS \"fourthMajorThirdConcentration\",\n\
                d.first_minor AS \"firstMinor\",\n\
                d.second_minor AS \"secondMinor\",\n\
                d.third_minor AS \"thirdMinor\",\n\
                d.fourth_minor AS \"fourthMinor\",\n\
                d.dual_degree AS \"dualDegree\",\n\
                d.dual_degree_level AS \"dualDegreeLevel\",\n\
                d.dual_degree_college AS \"dualDegreeCollege\",\n\
                d.dual_degree_major AS \"dualDegreeMajor\",\n\
                d.dual_degree_program_classification AS \"dualDegreeProgramClassification\"\n\
         FROM student_degrees d\n\
         WHERE d.osu_id = :osuId",
    );
    if params.term.is_some() {
        sql.push_str("\n  AND d.term = :term");
    }
    sql.push_str("\nORDER BY d.term, d.program_number");
    sql
}

pub fn emergency_contacts_by_id(_params: &QueryParams) -> String {
    "SELECT e.priority AS \"priority\",\n\
            e.contact_name AS \"name\",\n\
            e.relationship AS \"relationship\",\n\
            e.phone_number AS \"phoneNumber\",\n\
            e.email AS \"email\",\n\
            e.address_line1 AS \"addressLine1\",\n\
            e.address_line2 AS \"addressLine2\",\n\
            e.city AS \"city\",\n\
            e.state_code AS \"stateCode\",\n\
            e.postal_code AS \"postalCode\"\n\
     FROM emergency_contacts e\n\
     WHERE e.osu_id = :osuId\n\
     ORDER BY e.priority"
        .to_string()
}

/// Comma-separated `:prefix_N` placeholders for an IN-list sized to the
/// supplied filter values.
fn bind_list(prefix: &str, count: usize) -> String {
    (0..count)
        .map(|i| format!(":{prefix}_{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}
