//! Per-row validation for the three importable entity kinds.
//!
//! Validation never fails outright: every problem becomes a human-readable
//! error string next to a best-effort populated record, so callers can show
//! exactly what would have been imported. A row with any errors must never
//! reach the persistence writer.

use crate::config::Import;
use crate::model::{
    EntityKind, ImportRecord, Mode, OpportunityRecord, OrganizerRecord, OrganizerType, RawRow,
    SchoolRecord, Status, ValidationOutcome, Visibility,
};
use crate::store::DocumentStore;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Case-insensitive lookup from lowercased segment key to its canonical form.
#[derive(Debug, Clone, Default)]
pub struct SegmentContext {
    map: HashMap<String, String>,
}

impl SegmentContext {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ctx = Self::default();
        for key in keys {
            ctx.insert_key(key.as_ref());
        }
        ctx
    }

    /// Register a canonical segment key; later insertions win on collision.
    pub fn insert_key(&mut self, raw: &str) {
        let key = raw.trim();
        if !key.is_empty() {
            self.map.insert(key.to_lowercase(), key.to_string());
        }
    }

    pub fn canonical(&self, segment: &str) -> Option<&str> {
        self.map.get(&segment.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Allow-list of Indian states and union territories for school rows.
#[derive(Debug, Clone, Default)]
pub struct RegionContext {
    states: HashSet<String>,
}

impl RegionContext {
    pub fn from_states<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            states: states
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, state: &str) -> bool {
        self.states.contains(state)
    }
}

/// Kind-specific auxiliary state needed to validate rows beyond their own
/// content. Built once per import run, read-only thereafter.
#[derive(Debug, Clone)]
pub enum ValidationContext {
    Opportunities(SegmentContext),
    Schools(RegionContext),
    Organizers,
}

impl ValidationContext {
    /// Validate one raw row against this context's entity kind.
    pub fn validate_row(&self, raw: &RawRow) -> ValidationOutcome {
        match self {
            ValidationContext::Opportunities(segments) => validate_opportunity_row(raw, segments),
            ValidationContext::Schools(regions) => validate_school_row(raw, regions),
            ValidationContext::Organizers => validate_organizer_row(raw),
        }
    }
}

/// Build the context for one import run. Opportunities merge the configured
/// fallback segment keys with whatever the store's `homeSegments` collection
/// currently holds (store values win on key collision); a store failure
/// degrades to fallback-only data since segment mismatches surface per-row
/// as non-fatal validation errors anyway.
pub async fn build_validation_context(
    entity: EntityKind,
    store: &dyn DocumentStore,
    import_cfg: &Import,
) -> ValidationContext {
    match entity {
        EntityKind::Opportunities => {
            let mut segments = SegmentContext::from_keys(&import_cfg.fallback_segments);
            match store.scan("homeSegments").await {
                Ok(docs) => {
                    for doc in docs {
                        if let Some(key) = doc.get("segmentKey").and_then(|v| v.as_str()) {
                            segments.insert_key(key);
                        }
                    }
                }
                Err(err) => {
                    warn!(?err, "failed to load home segment definitions for bulk upload validation");
                }
            }
            ValidationContext::Opportunities(segments)
        }
        EntityKind::Schools => {
            ValidationContext::Schools(RegionContext::from_states(&import_cfg.indian_states))
        }
        EntityKind::Organizers => ValidationContext::Organizers,
    }
}

fn cell<'a>(raw: &'a RawRow, key: &str) -> &'a str {
    raw.get(key).map(String::as_str).unwrap_or("")
}

fn required_string(raw: &RawRow, key: &str, field: &str, errors: &mut Vec<String>) -> String {
    let value = cell(raw, key).trim();
    if value.is_empty() {
        errors.push(format!("{field} is required."));
    }
    value.to_string()
}

fn optional_string(raw: &RawRow, key: &str) -> Option<String> {
    let value = cell(raw, key).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn sanitize_id(raw: &RawRow) -> Option<String> {
    optional_string(raw, "id")
}

/// Permissive boolean: true / 1 / yes / y (any case) is true, everything
/// else — including absent — is false.
fn parse_boolean(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

/// Empty input or a non-finite parse both yield `None`; callers decide
/// whether that is itself an error.
fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Split a delimiter-joined cell on `;`, `,` or `|` into trimmed non-empty
/// pieces, first-occurrence order preserved.
fn split_list(value: &str) -> Vec<String> {
    value
        .split([';', ',', '|'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a date cell into a concrete instant. Accepted formats: RFC3339,
/// `YYYY-MM-DD`, `YYYY/MM/DD` (dates become midnight UTC).
pub fn parse_date_value(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            let midnight = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&midnight));
        }
    }
    None
}

/// Validate a date cell. The value is kept as the original trimmed string so
/// downstream storage can re-parse consistently.
fn normalize_date(value: &str, errors: &mut Vec<String>, field: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if parse_date_value(trimmed).is_none() {
        errors.push(format!("{field} must be a valid date (use YYYY-MM-DD)."));
        return None;
    }
    Some(trimmed.to_string())
}

/// Advisory email check: a value without `@` is flagged but still returned.
fn normalize_email(value: &str, errors: &mut Vec<String>, field: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.contains('@') {
        errors.push(format!("{field} appears to be invalid."));
    }
    Some(trimmed.to_string())
}

pub fn validate_opportunity_row(raw: &RawRow, context: &SegmentContext) -> ValidationOutcome {
    let mut errors = Vec::new();

    let title = required_string(raw, "title", "Title", &mut errors);

    let mode_raw = cell(raw, "mode").trim().to_lowercase();
    let mode = if mode_raw.is_empty() {
        Mode::default()
    } else {
        match Mode::parse_opt(&mode_raw) {
            Some(mode) => mode,
            None => {
                errors.push("Mode must be one of: online, offline, hybrid.".to_string());
                Mode::default()
            }
        }
    };

    let status_raw = cell(raw, "status").trim().to_lowercase();
    let status = if status_raw.is_empty() {
        Status::default()
    } else {
        match Status::parse_opt(&status_raw) {
            Some(status) => status,
            None => {
                errors.push("Status must be one of: draft, approved, published.".to_string());
                Status::default()
            }
        }
    };

    let registration_deadline = normalize_date(
        cell(raw, "registrationDeadline"),
        &mut errors,
        "Registration deadline",
    );
    let start_date = normalize_date(cell(raw, "startDate"), &mut errors, "Start date");
    let end_date = normalize_date(cell(raw, "endDate"), &mut errors, "End date");

    let mut segments = Vec::new();
    let mut seen_segments = HashSet::new();
    for segment in split_list(cell(raw, "segments")) {
        let Some(canonical) = context.canonical(&segment) else {
            errors.push(format!(
                "Segment \"{segment}\" is not recognised. Update the home layout first if this is a new segment."
            ));
            continue;
        };
        if seen_segments.insert(canonical.to_string()) {
            segments.push(canonical.to_string());
        }
    }

    let contact_email = normalize_email(cell(raw, "contactEmail"), &mut errors, "Contact email");

    let data = OpportunityRecord {
        id: sanitize_id(raw),
        title,
        organizer_id: optional_string(raw, "organizerId"),
        organizer_name: optional_string(raw, "organizerName"),
        organizer_logo: optional_string(raw, "organizerLogo"),
        category_id: optional_string(raw, "categoryId"),
        category_name: optional_string(raw, "categoryName"),
        mode,
        status,
        grade_eligibility: optional_string(raw, "gradeEligibility"),
        registration_deadline,
        start_date,
        end_date,
        fee: optional_string(raw, "fee"),
        currency: optional_string(raw, "currency").map(|c| c.to_uppercase()),
        segments,
        description: optional_string(raw, "description"),
        eligibility: split_list(cell(raw, "eligibility")),
        benefits: split_list(cell(raw, "benefits")),
        registration_process: split_list(cell(raw, "registrationProcess")),
        image: optional_string(raw, "image"),
        contact_email,
        contact_phone: optional_string(raw, "contactPhone"),
        contact_website: optional_string(raw, "contactWebsite"),
    };

    ValidationOutcome {
        data: ImportRecord::Opportunity(data),
        errors,
    }
}

pub fn validate_school_row(raw: &RawRow, regions: &RegionContext) -> ValidationOutcome {
    let mut errors = Vec::new();
    let name = required_string(raw, "name", "Name", &mut errors);

    // Region check happens here rather than silently at write time, so the
    // caller sees why a state was not stored.
    let state = match optional_string(raw, "state") {
        Some(state) if regions.contains(&state) => Some(state),
        Some(state) => {
            errors.push(format!(
                "State \"{state}\" is not a recognised Indian state or union territory."
            ));
            None
        }
        None => None,
    };

    let data = SchoolRecord {
        id: sanitize_id(raw),
        name,
        city: optional_string(raw, "city"),
        state,
        country: optional_string(raw, "country"),
        is_verified: parse_boolean(cell(raw, "isVerified")),
    };

    ValidationOutcome {
        data: ImportRecord::School(data),
        errors,
    }
}

pub fn validate_organizer_row(raw: &RawRow) -> ValidationOutcome {
    let mut errors = Vec::new();
    let name = required_string(raw, "name", "Name", &mut errors);

    let type_raw = cell(raw, "type").trim().to_lowercase();
    let kind = if type_raw.is_empty() {
        OrganizerType::default()
    } else {
        match OrganizerType::parse_opt(&type_raw) {
            Some(kind) => kind,
            None => {
                errors.push("Type must be one of: government, private, other.".to_string());
                OrganizerType::default()
            }
        }
    };

    let visibility_raw = cell(raw, "visibility").trim().to_lowercase();
    let visibility = if visibility_raw.is_empty() {
        Visibility::default()
    } else {
        match Visibility::parse_opt(&visibility_raw) {
            Some(visibility) => visibility,
            None => {
                errors.push("Visibility must be either public or private.".to_string());
                Visibility::default()
            }
        }
    };

    let foundation_year = match optional_string(raw, "foundationYear") {
        Some(year_raw) => {
            let parsed = parse_number(&year_raw);
            if parsed.is_none() {
                errors.push("Foundation year must be a number.".to_string());
            }
            parsed
        }
        None => None,
    };

    let data = OrganizerRecord {
        id: sanitize_id(raw),
        name,
        address: optional_string(raw, "address"),
        website: optional_string(raw, "website"),
        foundation_year,
        kind,
        visibility,
        is_verified: parse_boolean(cell(raw, "isVerified")),
    };

    ValidationOutcome {
        data: ImportRecord::Organizer(data),
        errors,
    }
}
