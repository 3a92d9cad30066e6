//! Per-resource serializers for student records.
//!
//! Each serializer normalizes raw rows (type coercion, derived fields,
//! grouping, deduplication) and wraps the result in the JSON:API envelope.

use chrono::{NaiveDateTime, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::api::jsonapi::{
    build_serializer_args, serialize_collection, serialize_single, SerializeContext,
    SerializeError, ShapedResource,
};
use crate::serializers::ResourceSerializer;
use crate::types::{QueryParams, RawRow, ShapedRows};

const GPA_FLOAT_FIELDS: &[&str] = &[
    "gpaCreditHours",
    "creditHoursAttempted",
    "creditHoursEarned",
    "creditHoursPassed",
];

/// Convert a four digit string to time format, e.g. "0900" -> "09:00:00".
/// Null stays null; anything that is not exactly four digits produces the
/// literal error marker.
pub fn four_digit_to_time(input: Option<&str>) -> Option<String> {
    let raw = input?;
    if raw.len() != 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Some("Incorrect time format".to_string());
    }
    Some(format!("{}:{}:00", &raw[..2], &raw[2..4]))
}

/// Parse a numeric-looking value to a JSON number. Numbers pass through;
/// anything unparsable becomes the JSON not-a-number sentinel (null), the
/// same value the original service put on the wire.
fn parse_float(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Number(n)) => Value::Number(n.clone()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn parse_float_fields(row: &mut RawRow, fields: &[&str]) {
    for field in fields {
        let parsed = parse_float(row.get(*field));
        row.insert((*field).to_string(), parsed);
    }
}

/// Boolean derived from the database's "Y"/other sentinel columns.
fn yes(value: Option<&Value>) -> Value {
    Value::Bool(matches!(value, Some(Value::String(s)) if s == "Y"))
}

/// Truthiness in the source data's sense: null, empty string, false and
/// zero all count as absent.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

fn cloned(value: Option<&Value>) -> Value {
    value.cloned().unwrap_or(Value::Null)
}

/// First present of two alternate source columns.
fn first_present(row: &RawRow, primary: &str, fallback: &str) -> Value {
    if is_present(row.get(primary)) {
        cloned(row.get(primary))
    } else {
        cloned(row.get(fallback))
    }
}

/// Scalar rendered for use inside a composite identifier.
fn raw_str(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Convert a source timestamp recorded in Pacific time to a UTC ISO-8601
/// string. Values that do not parse pass through unchanged.
fn pacific_to_utc(value: Option<&Value>) -> Value {
    let Some(Value::String(raw)) = value else {
        return cloned(value);
    };
    let parsed = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"));
    match parsed {
        Ok(naive) => match chrono_tz::PST8PDT.from_local_datetime(&naive).earliest() {
            Some(local) => Value::String(
                local
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            None => cloned(value),
        },
        Err(_) => cloned(value),
    }
}

/// `four_digit_to_time` over a raw column value, preserving null.
fn time_value(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(s)) => four_digit_to_time(Some(s.as_str()))
            .map(Value::String)
            .unwrap_or(Value::Null),
        Some(Value::Number(n)) => {
            let digits = n.to_string();
            four_digit_to_time(Some(digits.as_str()))
                .map(Value::String)
                .unwrap_or(Value::Null)
        }
        Some(_) => Value::String("Incorrect time format".to_string()),
    }
}

/// Weekly schedule day codes derived from the seven boolean-ish day columns.
fn weekly_schedule(row: &RawRow) -> Value {
    const DAYS: &[(&str, &str)] = &[
        ("monday", "M"),
        ("tuesday", "T"),
        ("wednesday", "W"),
        ("thursday", "Th"),
        ("friday", "F"),
        ("saturday", "Sa"),
        ("sunday", "Su"),
    ];
    Value::Array(
        DAYS.iter()
            .filter(|(column, _)| is_present(row.get(*column)))
            .map(|(_, code)| Value::String((*code).to_string()))
            .collect(),
    )
}

fn wrap_list(subject_id: &str, key: &str, rows: Vec<RawRow>) -> ShapedResource {
    let mut attributes = RawRow::new();
    attributes.insert(
        key.to_string(),
        Value::Array(rows.into_iter().map(Value::Object).collect()),
    );
    ShapedResource::new(subject_id, attributes)
}

pub struct GpaSerializer;

impl ResourceSerializer for GpaSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args =
            build_serializer_args(ctx, subject_id, "GradePointAverageResult", "gpa", true, params)?;

        let mut levels = rows.into_rows();
        for level in &mut levels {
            parse_float_fields(level, GPA_FLOAT_FIELDS);
        }

        let shaped = wrap_list(subject_id, "gpaLevels", levels);
        Ok(serialize_single(&args, Some(&shaped)))
    }
}

pub struct AccountBalanceSerializer;

impl ResourceSerializer for AccountBalanceSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(
            ctx,
            subject_id,
            "AccountBalanceResult",
            "account-balance",
            true,
            params,
        )?;

        let shaped = rows.into_singleton().map(|mut row| {
            let balance = parse_float(row.get("currentBalance"));
            row.insert("currentBalance".to_string(), balance);
            ShapedResource::new(subject_id, row)
        });

        Ok(serialize_single(&args, shaped.as_ref()))
    }
}

pub struct AccountTransactionsSerializer;

impl ResourceSerializer for AccountTransactionsSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(
            ctx,
            subject_id,
            "AccountTransactionsResult",
            "account-transactions",
            true,
            params,
        )?;

        let mut transactions = rows.into_rows();
        for transaction in &mut transactions {
            let amount = parse_float(transaction.get("amount"));
            transaction.insert("amount".to_string(), amount);
            let entry_date = pacific_to_utc(transaction.get("entryDate"));
            transaction.insert("entryDate".to_string(), entry_date);
        }

        let shaped = wrap_list(subject_id, "transactions", transactions);
        Ok(serialize_single(&args, Some(&shaped)))
    }
}

pub struct AcademicStatusSerializer;

impl AcademicStatusSerializer {
    fn gpa_sub_record(row: &RawRow) -> Value {
        json!({
            "gpa": cloned(row.get("gpa")),
            "gpaCreditHours": parse_float(row.get("gpaCreditHours")),
            "gpaType": cloned(row.get("gpaType")),
            "creditHoursAttempted": parse_float(row.get("creditHoursAttempted")),
            "creditHoursEarned": parse_float(row.get("creditHoursEarned")),
            "creditHoursPassed": parse_float(row.get("creditHoursPassed")),
            "levelCode": cloned(row.get("levelCode")),
            "level": cloned(row.get("level")),
            "qualityPoints": cloned(row.get("qualityPoints")),
        })
    }
}

impl ResourceSerializer for AcademicStatusSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(
            ctx,
            subject_id,
            "AcademicStatusResult",
            "academic-status",
            false,
            params,
        )?;

        let rows = rows.into_rows();

        // Collect GPA sub-records per term first; only rows that actually
        // carry a GPA value contribute one.
        let mut terms_gpa: IndexMap<String, Vec<Value>> = IndexMap::new();
        for row in &rows {
            let term = raw_str(row.get("term"));
            let records = terms_gpa.entry(term).or_default();
            if is_present(row.get("gpa")) {
                records.push(Self::gpa_sub_record(row));
            }
        }

        // One logical resource per distinct term, first-seen order.
        let mut by_term: IndexMap<String, ShapedResource> = IndexMap::new();
        for row in &rows {
            let term = raw_str(row.get("term"));
            let mut attributes = RawRow::new();
            attributes.insert("academicStanding".to_string(), cloned(row.get("academicStanding")));
            attributes.insert("term".to_string(), cloned(row.get("term")));
            attributes.insert("termDescription".to_string(), cloned(row.get("termDescription")));
            attributes.insert(
                "gpa".to_string(),
                Value::Array(terms_gpa.get(&term).cloned().unwrap_or_default()),
            );
            by_term.insert(
                term.clone(),
                ShapedResource::new(format!("{subject_id}-{term}"), attributes),
            );
        }

        let shaped: Vec<ShapedResource> = by_term.into_values().collect();
        Ok(serialize_collection(&args, &shaped))
    }
}

pub struct ClassificationSerializer;

impl ResourceSerializer for ClassificationSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(
            ctx,
            subject_id,
            "ClassificationResult",
            "classification",
            true,
            params,
        )?;

        let shaped = rows.into_singleton().map(|mut row| {
            let international = yes(row.get("isInternational"));
            row.insert("isInternational".to_string(), international);
            ShapedResource::new(subject_id, row)
        });

        Ok(serialize_single(&args, shaped.as_ref()))
    }
}

pub struct GradesSerializer;

impl ResourceSerializer for GradesSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(ctx, subject_id, "GradesResult", "grades", false, params)?;

        let mut shaped = Vec::new();
        for mut row in rows.into_rows() {
            let credit_hours = parse_float(row.get("creditHours"));
            row.insert("creditHours".to_string(), credit_hours);
            let course_level = first_present(&row, "sfrstcrCourseLevel", "tcknCourseLevel");
            row.insert("courseLevel".to_string(), course_level);

            let id = format!(
                "{}-{}-{}",
                subject_id,
                raw_str(row.get("term")),
                raw_str(row.get("courseReferenceNumber"))
            );
            shaped.push(ShapedResource::new(id, row));
        }

        Ok(serialize_collection(&args, &shaped))
    }
}

pub struct ClassScheduleSerializer;

struct CourseGroup {
    attributes: RawRow,
    faculty: Vec<Value>,
    meeting_times: Vec<Value>,
}

impl ResourceSerializer for ClassScheduleSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(
            ctx,
            subject_id,
            "ClassScheduleResult",
            "class-schedule",
            false,
            params,
        )?;

        // Rows are denormalized by (term, CRN) with one row per faculty
        // member / meeting time combination. Accumulate de-duplicated
        // faculty and meeting-time entries per course, first-seen order.
        let mut by_course: IndexMap<String, CourseGroup> = IndexMap::new();
        for row in rows.into_rows() {
            let id = format!(
                "{}-{}-{}",
                subject_id,
                raw_str(row.get("term")),
                raw_str(row.get("courseReferenceNumber"))
            );
            let group = by_course.entry(id).or_insert_with(|| CourseGroup {
                attributes: RawRow::new(),
                faculty: Vec::new(),
                meeting_times: Vec::new(),
            });

            let faculty = json!({
                "osuID": cloned(row.get("facultyOsuId")),
                "name": cloned(row.get("facultyName")),
                "email": cloned(row.get("facultyEmail")),
                "primary": yes(row.get("facultyPrimary")),
            });
            let meeting_time = json!({
                "beginDate": cloned(row.get("beginDate")),
                "beginTime": time_value(row.get("beginTime")),
                "endDate": cloned(row.get("endDate")),
                "endTime": time_value(row.get("endTime")),
                "room": cloned(row.get("room")),
                "building": cloned(row.get("building")),
                "buildingDescription": cloned(row.get("buildingDescription")),
                "campusCode": cloned(row.get("campusCode")),
                "campus": cloned(row.get("campus")),
                "hoursPerWeek": parse_float(row.get("hoursPerWeek")),
                "creditHourSession": parse_float(row.get("creditHourSession")),
                "scheduleType": cloned(row.get("meetingScheduleType")),
                "scheduleDescription": cloned(row.get("meetingScheduleDescription")),
                "weeklySchedule": weekly_schedule(&row),
            });
            if !group.faculty.contains(&faculty) {
                group.faculty.push(faculty);
            }
            if !group.meeting_times.contains(&meeting_time) {
                group.meeting_times.push(meeting_time);
            }

            let mut attributes = RawRow::new();
            for key in [
                "academicYear",
                "academicYearDescription",
                "courseReferenceNumber",
                "courseSubject",
                "courseSubjectDescription",
                "courseNumber",
                "sectionNumber",
                "term",
                "termDescription",
                "scheduleDescription",
                "scheduleType",
                "registrationStatus",
                "gradingMode",
                "repeatedCourseInd",
            ] {
                attributes.insert(key.to_string(), cloned(row.get(key)));
            }
            attributes.insert(
                "courseTitle".to_string(),
                first_present(&row, "courseTitleLong", "courseTitleShort"),
            );
            attributes.insert("creditHours".to_string(), parse_float(row.get("creditHours")));
            attributes.insert("continuingEducation".to_string(), yes(row.get("continuingEducation")));
            group.attributes = attributes;
        }

        let shaped: Vec<ShapedResource> = by_course
            .into_iter()
            .map(|(id, mut group)| {
                group
                    .attributes
                    .insert("faculty".to_string(), Value::Array(group.faculty));
                group
                    .attributes
                    .insert("meetingTimes".to_string(), Value::Array(group.meeting_times));
                ShapedResource::new(id, group.attributes)
            })
            .collect();

        Ok(serialize_collection(&args, &shaped))
    }
}

pub struct HoldsSerializer;

const PROCESSES_AFFECTED_KEYS: &[&str] = &[
    "registration",
    "transcript",
    "graduation",
    "grades",
    "accountsReceivable",
    "enrollmentVerification",
    "application",
    "compliance",
];

impl ResourceSerializer for HoldsSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(ctx, subject_id, "HoldsResult", "holds", true, params)?;

        let mut holds = rows.into_rows();
        for hold in &mut holds {
            let web_display = yes(hold.get("webDisplay"));
            hold.insert("webDisplay".to_string(), web_display);
            let released = yes(hold.get("releasedInd"));
            hold.insert("releasedInd".to_string(), released);

            // Collapse the per-process label columns into one array and
            // drop the raw columns from the row.
            let mut processes = Vec::new();
            for key in PROCESSES_AFFECTED_KEYS {
                if let Some(value) = hold.remove(*key) {
                    if !value.is_null() {
                        processes.push(value);
                    }
                }
            }
            hold.insert("processesAffected".to_string(), Value::Array(processes));
        }

        let shaped = wrap_list(subject_id, "holds", holds);
        Ok(serialize_single(&args, Some(&shaped)))
    }
}

pub struct WorkStudySerializer;

impl ResourceSerializer for WorkStudySerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args =
            build_serializer_args(ctx, subject_id, "WorkStudyResult", "work-study", true, params)?;

        let mut awards = rows.into_rows();
        for award in &mut awards {
            parse_float_fields(award, &["offerAmount", "acceptedAmount", "paidAmount"]);
        }

        let shaped = wrap_list(subject_id, "awards", awards);
        Ok(serialize_single(&args, Some(&shaped)))
    }
}

pub struct DualEnrollmentSerializer;

impl ResourceSerializer for DualEnrollmentSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(
            ctx,
            subject_id,
            "DualEnrollmentResult",
            "dual-enrollment",
            false,
            params,
        )?;

        let mut shaped = Vec::new();
        for mut row in rows.into_rows() {
            let credit_hours = parse_float(row.get("creditHours"));
            row.insert("creditHours".to_string(), credit_hours);
            let id = format!("{}-{}", subject_id, raw_str(row.get("term")));
            shaped.push(ShapedResource::new(id, row));
        }

        Ok(serialize_collection(&args, &shaped))
    }
}

pub struct DegreesSerializer;

impl DegreesSerializer {
    fn major_slot(
        row: &RawRow,
        major: &str,
        classification: &str,
        department: &str,
        first: &str,
        second: &str,
        third: &str,
    ) -> Value {
        if !is_present(row.get(major)) {
            return Value::Null;
        }
        json!({
            "major": cloned(row.get(major)),
            "programClassification": cloned(row.get(classification)),
            "department": cloned(row.get(department)),
            "firstConcentration": cloned(row.get(first)),
            "secondConcentration": cloned(row.get(second)),
            "thirdConcentration": cloned(row.get(third)),
        })
    }
}

impl ResourceSerializer for DegreesSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(ctx, subject_id, "DegreesResult", "degrees", false, params)?;

        let mut shaped = Vec::new();
        for mut row in rows.into_rows() {
            let id = format!(
                "{}-{}-{}",
                subject_id,
                raw_str(row.get("term")),
                raw_str(row.get("programNumber"))
            );

            let majors = json!({
                "first": Self::major_slot(
                    &row,
                    "firstMajor",
                    "firstProgramClassification",
                    "firstDepartment",
                    "firstMajorFirstConcentration",
                    "firstMajorSecondConcentration",
                    "firstMajorThirdConcentration",
                ),
                "second": Self::major_slot(
                    &row,
                    "secondMajor",
                    "secondProgramClassification",
                    "secondDepartment",
                    "secondMajorFirstConcentration",
                    "secondMajorSecondConcentration",
                    "secondMajorThirdConcentration",
                ),
                "third": Self::major_slot(
                    &row,
                    "thirdMajor",
                    "thirdProgramClassification",
                    "thirdDepartment",
                    "thirdMajorFirstConcentration",
                    "thirdMajorSecondConcentration",
                    "thirdMajorThirdConcentration",
                ),
                "fourth": Self::major_slot(
                    &row,
                    "fourthMajor",
                    "fourthProgramClassification",
                    "fourthDepartment",
                    "fourthMajorFirstConcentration",
                    "fourthMajorSecondConcentration",
                    "fourthMajorThirdConcentration",
                ),
            });
            let minors = json!({
                "first": cloned(row.get("firstMinor")),
                "second": cloned(row.get("secondMinor")),
                "third": cloned(row.get("thirdMinor")),
                "fourth": cloned(row.get("fourthMinor")),
            });
            let dual_degree = if is_present(row.get("dualDegree")) {
                json!({
                    "degree": cloned(row.get("dualDegree")),
                    "level": cloned(row.get("dualDegreeLevel")),
                    "college": cloned(row.get("dualDegreeCollege")),
                    "major": cloned(row.get("dualDegreeMajor")),
                    "programClassification": cloned(row.get("dualDegreeProgramClassification")),
                })
            } else {
                Value::Null
            };

            let program_number = parse_float(row.get("programNumber"));
            row.insert("programNumber".to_string(), program_number);
            let primary = yes(row.get("primaryDegree"));
            row.insert("primaryDegree".to_string(), primary);
            let honor = yes(row.get("honorInd"));
            row.insert("honorInd".to_string(), honor);
            row.insert("majors".to_string(), majors);
            row.insert("minors".to_string(), minors);
            row.insert("dualDegree".to_string(), dual_degree);

            shaped.push(ShapedResource::new(id, row));
        }

        Ok(serialize_collection(&args, &shaped))
    }
}

pub struct EmergencyContactsSerializer;

impl ResourceSerializer for EmergencyContactsSerializer {
    fn serialize(
        &self,
        ctx: &SerializeContext<'_>,
        rows: ShapedRows,
        subject_id: &str,
        params: &QueryParams,
    ) -> Result<Value, SerializeError> {
        let args = build_serializer_args(
            ctx,
            subject_id,
            "EmergencyContactsResult",
            "emergency-contacts",
            true,
            params,
        )?;

        let mut contacts = rows.into_rows();
        for contact in &mut contacts {
            let priority = parse_float(contact.get("priority"));
            contact.insert("priority".to_string(), priority);
        }

        let shaped = wrap_list(subject_id, "emergencyContacts", contacts);
        Ok(serialize_single(&args, Some(&shaped)))
    }
}
