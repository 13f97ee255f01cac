use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One CSV row after header zipping: trimmed header -> trimmed cell value.
pub type RawRow = HashMap<String, String>;

/// The three importable record types. Selects template, validation rules and
/// target collection for one import run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Opportunities,
    Schools,
    Organizers,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Opportunities => "opportunities",
            EntityKind::Schools => "schools",
            EntityKind::Organizers => "organizers",
        }
    }

    /// Target collection in the document store.
    pub fn collection(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Online,
    Offline,
    Hybrid,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Online => "online",
            Mode::Offline => "offline",
            Mode::Hybrid => "hybrid",
        }
    }

    pub fn parse_opt(value: &str) -> Option<Self> {
        match value {
            "online" => Some(Mode::Online),
            "offline" => Some(Mode::Offline),
            "hybrid" => Some(Mode::Hybrid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Approved,
    Published,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Approved => "approved",
            Status::Published => "published",
        }
    }

    pub fn parse_opt(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Status::Draft),
            "approved" => Some(Status::Approved),
            "published" => Some(Status::Published),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrganizerType {
    Government,
    Private,
    #[default]
    Other,
}

impl OrganizerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizerType::Government => "government",
            OrganizerType::Private => "private",
            OrganizerType::Other => "other",
        }
    }

    pub fn parse_opt(value: &str) -> Option<Self> {
        match value {
            "government" => Some(OrganizerType::Government),
            "private" => Some(OrganizerType::Private),
            "other" => Some(OrganizerType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn parse_opt(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Typed, normalized opportunity row ready for persistence.
///
/// Date fields keep the original trimmed strings; the persistence writer
/// re-parses them so storage stays consistent with what was validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OpportunityRecord {
    pub id: Option<String>,
    pub title: String,
    pub organizer_id: Option<String>,
    pub organizer_name: Option<String>,
    pub organizer_logo: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub mode: Mode,
    pub status: Status,
    pub grade_eligibility: Option<String>,
    pub registration_deadline: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub fee: Option<String>,
    pub currency: Option<String>,
    pub segments: Vec<String>,
    pub description: Option<String>,
    pub eligibility: Vec<String>,
    pub benefits: Vec<String>,
    pub registration_process: Vec<String>,
    pub image: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SchoolRecord {
    pub id: Option<String>,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrganizerRecord {
    pub id: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub website: Option<String>,
    pub foundation_year: Option<f64>,
    pub kind: OrganizerType,
    pub visibility: Visibility,
    pub is_verified: bool,
}

/// Tagged union over the per-kind record shapes, used wherever the pipeline
/// dispatches on entity kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum ImportRecord {
    Opportunity(OpportunityRecord),
    School(SchoolRecord),
    Organizer(OrganizerRecord),
}

impl ImportRecord {
    /// Explicit id supplied by the caller, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            ImportRecord::Opportunity(r) => r.id.as_deref(),
            ImportRecord::School(r) => r.id.as_deref(),
            ImportRecord::Organizer(r) => r.id.as_deref(),
        }
    }
}

/// Best-effort record plus every problem found while validating it. A row
/// with a non-empty error list must never be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub data: ImportRecord,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RowOutcome {
    Created,
    Updated,
}

impl RowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowOutcome::Created => "created",
            RowOutcome::Updated => "updated",
        }
    }
}

/// One previewed row: source line index, raw cells, typed record, errors.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewRow {
    pub index: usize,
    pub raw: RawRow,
    pub data: ImportRecord,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PreviewTotals {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub headers: Vec<String>,
    pub rows: Vec<PreviewRow>,
    pub totals: PreviewTotals,
}

/// A row that was not persisted, with its user-facing error strings.
#[derive(Debug, Clone, Serialize)]
pub struct FailedRow {
    pub index: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: Vec<FailedRow>,
}
