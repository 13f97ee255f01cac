//! Per-entity CSV templates offered for download: the canonical header list
//! plus one example row.

use crate::csv;
use crate::model::EntityKind;
use once_cell::sync::Lazy;

#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    pub headers: Vec<String>,
    pub sample: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

static OPPORTUNITIES: Lazy<TemplateDefinition> = Lazy::new(|| TemplateDefinition {
    headers: strings(&[
        "id",
        "title",
        "organizerId",
        "organizerName",
        "organizerLogo",
        "categoryId",
        "categoryName",
        "mode",
        "status",
        "gradeEligibility",
        "registrationDeadline",
        "startDate",
        "endDate",
        "fee",
        "state",
        "currency",
        "segments",
        "description",
        "eligibility",
        "benefits",
        "registrationProcess",
        "image",
        "contactEmail",
        "contactPhone",
        "contactWebsite",
    ]),
    sample: strings(&[
        "",
        "National Science Olympiad",
        "",
        "Science Foundation",
        "https://example.org/logo.png",
        "",
        "Science & STEM",
        "online",
        "published",
        "Grades 6-10",
        "2025-01-15",
        "2025-02-01",
        "2025-02-05",
        "50",
        "Karnataka",
        "INR",
        "featured;scholarships",
        "Explore science concepts and compete nationwide.",
        "Grade 6;Grade 7;Grade 8",
        "Cash awards;Certificates",
        "Register online;Prepare documents",
        "https://example.org/hero.png",
        "contact@example.org",
        "+1-555-1234",
        "https://example.org",
    ]),
});

static SCHOOLS: Lazy<TemplateDefinition> = Lazy::new(|| TemplateDefinition {
    headers: strings(&["id", "name", "city", "state", "country", "isVerified"]),
    sample: strings(&[
        "",
        "Springfield High School",
        "Springfield",
        "Illinois",
        "USA",
        "true",
    ]),
});

static ORGANIZERS: Lazy<TemplateDefinition> = Lazy::new(|| TemplateDefinition {
    headers: strings(&[
        "id",
        "name",
        "address",
        "website",
        "foundationYear",
        "type",
        "visibility",
        "isVerified",
    ]),
    sample: strings(&[
        "",
        "STEM Foundation",
        "123 Main Street, Springfield",
        "https://stem.org",
        "2001",
        "private",
        "public",
        "true",
    ]),
});

pub fn definition(entity: EntityKind) -> &'static TemplateDefinition {
    match entity {
        EntityKind::Opportunities => &OPPORTUNITIES,
        EntityKind::Schools => &SCHOOLS,
        EntityKind::Organizers => &ORGANIZERS,
    }
}

/// CSV template for one entity kind: header line plus one example data line.
pub fn create_template_csv(entity: EntityKind) -> String {
    let def = definition(entity);
    csv::encode(&def.headers, std::slice::from_ref(&def.sample))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::decode;

    #[test]
    fn templates_have_exactly_two_lines() {
        for kind in [
            EntityKind::Opportunities,
            EntityKind::Schools,
            EntityKind::Organizers,
        ] {
            let text = create_template_csv(kind);
            let rows = decode(&text);
            assert_eq!(rows.len(), 2, "{kind} template");
            assert_eq!(rows[0].len(), rows[1].len(), "{kind} sample width");
        }
    }

    #[test]
    fn opportunity_template_headers_start_with_id_title() {
        let def = definition(EntityKind::Opportunities);
        assert_eq!(def.headers[0], "id");
        assert_eq!(def.headers[1], "title");
        assert_eq!(def.headers.len(), 25);
    }

    #[test]
    fn organizer_sample_address_stays_quoted() {
        let text = create_template_csv(EntityKind::Organizers);
        assert!(text.contains("\"123 Main Street, Springfield\""));
    }
}
