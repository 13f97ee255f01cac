//! Persistence writer: turns validated records into full store documents and
//! upserts them one at a time.
//!
//! Upsert contract: an explicit id overwrites the whole document (no merge)
//! while preserving the original `createdAt`; a missing document under that
//! id is created there; no id means a store-generated id. `updatedAt` is
//! refreshed on every write. Store errors propagate — the orchestrator is
//! responsible for catching them per row so one bad row never aborts a batch.

use crate::model::{
    ImportRecord, OpportunityRecord, OrganizerRecord, RowOutcome, SchoolRecord,
};
use crate::store::{Document, DocumentStore};
use crate::validate::parse_date_value;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

fn text_or_empty(value: &Option<String>) -> Value {
    json!(value.as_deref().unwrap_or(""))
}

fn id_or_null(value: &Option<String>) -> Value {
    match value {
        Some(v) => json!(v),
        None => Value::Null,
    }
}

/// Re-parse a validated date string into a concrete timestamp for storage;
/// unparseable or absent dates are stored as null.
fn date_or_null(value: &Option<String>) -> Value {
    value
        .as_deref()
        .and_then(parse_date_value)
        .map(|dt| json!(dt))
        .unwrap_or(Value::Null)
}

fn opportunity_payload(record: &OpportunityRecord, now: DateTime<Utc>) -> Document {
    let doc = json!({
        "title": record.title,
        "categoryId": id_or_null(&record.category_id),
        "categoryName": text_or_empty(&record.category_name),
        "category": text_or_empty(&record.category_name),
        "organizerId": id_or_null(&record.organizer_id),
        "organizerName": text_or_empty(&record.organizer_name),
        "organizer": text_or_empty(&record.organizer_name),
        "organizerLogo": text_or_empty(&record.organizer_logo),
        "gradeEligibility": text_or_empty(&record.grade_eligibility),
        "mode": record.mode.as_str(),
        "status": record.status.as_str(),
        "fee": text_or_empty(&record.fee),
        "currency": text_or_empty(&record.currency),
        "registrationDeadline": date_or_null(&record.registration_deadline),
        "startDate": date_or_null(&record.start_date),
        "endDate": date_or_null(&record.end_date),
        "segments": record.segments,
        "image": text_or_empty(&record.image),
        "description": text_or_empty(&record.description),
        "eligibility": record.eligibility,
        "benefits": record.benefits,
        "registrationProcess": record.registration_process,
        "timeline": [],
        "contactInfo": {
            "email": text_or_empty(&record.contact_email),
            "phone": text_or_empty(&record.contact_phone),
            "website": text_or_empty(&record.contact_website),
        },
        "createdAt": now,
        "updatedAt": now,
    });
    doc.as_object().cloned().unwrap_or_default()
}

fn school_payload(record: &SchoolRecord, now: DateTime<Utc>) -> Document {
    let doc = json!({
        "name": record.name,
        "city": text_or_empty(&record.city),
        "state": text_or_empty(&record.state),
        "country": text_or_empty(&record.country),
        "isVerified": record.is_verified,
        "createdAt": now,
        "updatedAt": now,
    });
    doc.as_object().cloned().unwrap_or_default()
}

fn organizer_payload(record: &OrganizerRecord, now: DateTime<Utc>) -> Document {
    let doc = json!({
        "name": record.name,
        "address": text_or_empty(&record.address),
        "website": text_or_empty(&record.website),
        "foundationYear": record.foundation_year,
        "type": record.kind.as_str(),
        "visibility": record.visibility.as_str(),
        "isVerified": record.is_verified,
        "createdAt": now,
        "updatedAt": now,
    });
    doc.as_object().cloned().unwrap_or_default()
}

async fn upsert(
    store: &dyn DocumentStore,
    collection: &str,
    id: Option<&str>,
    mut doc: Document,
    now: DateTime<Utc>,
) -> Result<RowOutcome> {
    let Some(id) = id else {
        store.add(collection, &doc).await?;
        return Ok(RowOutcome::Created);
    };

    let existing = store.get(collection, id).await?;
    let created_at = existing
        .as_ref()
        .and_then(|d| d.get("createdAt").cloned())
        .unwrap_or_else(|| json!(now));
    doc.insert("createdAt".to_string(), created_at);
    store.set(collection, id, &doc).await?;

    Ok(if existing.is_some() {
        RowOutcome::Updated
    } else {
        RowOutcome::Created
    })
}

/// Upsert one validated record into its kind's collection.
pub async fn persist_import_record(
    store: &dyn DocumentStore,
    record: &ImportRecord,
) -> Result<RowOutcome> {
    let now = Utc::now();
    match record {
        ImportRecord::Opportunity(r) => {
            upsert(
                store,
                "opportunities",
                r.id.as_deref(),
                opportunity_payload(r, now),
                now,
            )
            .await
        }
        ImportRecord::School(r) => {
            upsert(store, "schools", r.id.as_deref(), school_payload(r, now), now).await
        }
        ImportRecord::Organizer(r) => {
            upsert(
                store,
                "organizers",
                r.id.as_deref(),
                organizer_payload(r, now),
                now,
            )
            .await
        }
    }
}
