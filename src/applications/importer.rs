// src/applications/importer.rs
//! Heuristic tabular import pipeline for job applications.
//!
//! Converts human-produced spreadsheets (CSV text or worksheet cells) into
//! validated application records, tolerating missing, renamed, and reordered
//! columns. Header matching runs exact-then-substring over an ordered list of
//! match terms per field, with a positional column fallback for legacy
//! exports. Rows missing a mandatory field are dropped and counted, never
//! raised as errors.

use chrono::{Duration, NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import data contains no data rows")]
    EmptyInput,
}

/// A single cell as decoded from CSV or a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// The cell as trimmed text, or None when blank.
    fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(trim_float(*n)),
            CellValue::Empty => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Empty => None,
        }
    }
}

/// Render a float without a trailing ".0" for whole numbers, the way
/// spreadsheet tools display integer cells.
fn trim_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Value kind of a target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Enum,
}

/// Describes one target field of the imported record.
///
/// `match_terms` are tried in order, exact header match first, then header
/// substring match. `fallback_index` is a fixed positional column used as a
/// last resort for legacy exports with no recognizable headers.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub match_terms: Vec<&'static str>,
    pub kind: FieldKind,
    /// Normalized input variant -> canonical output value (Enum kind only).
    pub variants: Vec<(&'static str, &'static str)>,
    pub fallback_index: Option<usize>,
    /// Default for absent Enum values (e.g. "No Response", "Other").
    pub default: Option<&'static str>,
    pub mandatory: bool,
}

impl FieldSpec {
    pub fn text(name: &'static str, match_terms: &[&'static str]) -> Self {
        Self {
            name,
            match_terms: match_terms.to_vec(),
            kind: FieldKind::Text,
            variants: Vec::new(),
            fallback_index: None,
            default: None,
            mandatory: false,
        }
    }

    pub fn date(name: &'static str, match_terms: &[&'static str]) -> Self {
        Self {
            kind: FieldKind::Date,
            ..Self::text(name, match_terms)
        }
    }

    pub fn enumeration(
        name: &'static str,
        match_terms: &[&'static str],
        variants: &[(&'static str, &'static str)],
        default: &'static str,
    ) -> Self {
        Self {
            kind: FieldKind::Enum,
            variants: variants.to_vec(),
            default: Some(default),
            ..Self::text(name, match_terms)
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn with_fallback(mut self, index: usize) -> Self {
        self.fallback_index = Some(index);
        self
    }
}

/// One accepted record: canonical field name -> resolved value.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRecord {
    fields: Vec<(&'static str, Option<String>)>,
}

impl ImportedRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Resolved values in field-spec order, used for deduplication.
    fn tuple(&self) -> Vec<Option<String>> {
        self.fields.iter().map(|(_, v)| v.clone()).collect()
    }
}

/// Result of one import batch. Rejected rows are counted, not returned.
#[derive(Debug)]
pub struct ImportOutcome {
    pub records: Vec<ImportedRecord>,
    pub imported: usize,
    pub skipped: usize,
}

/// Canonical application status values.
pub const STATUS_VARIANTS: &[(&str, &str)] = &[
    ("no response", "No Response"),
    ("noresponse", "No Response"),
    ("open", "Open"),
    ("applied", "Open"),
    ("under interview", "Under Interview"),
    ("interviewing", "Under Interview"),
    ("interview", "Interview"),
    ("offer", "Offer"),
    ("offered", "Offer"),
    ("rejected", "Rejected"),
    ("declined", "Rejected"),
    ("withdrawn", "WithDrawn"),
];

/// Known submission channels. Anything else passes through verbatim so
/// user-entered free text ("Site Nike") is preserved rather than bucketed.
pub const VIA_VARIANTS: &[(&str, &str)] = &[
    ("linkedin", "LinkedIn"),
    ("indeed", "Indeed"),
    ("referral", "Referral"),
    ("company site", "Company Site"),
    ("company website", "Company Site"),
    ("recruiter", "Recruiter"),
];

/// Field specs for the job-application import schema.
///
/// Positional fallbacks mirror the column order of the legacy export format:
/// role, company, date, via, status, notes, link.
pub fn application_field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text("role", &["applied roles", "role", "title", "position"])
            .mandatory()
            .with_fallback(0),
        FieldSpec::text("company", &["company", "employer", "organisation", "organization"])
            .mandatory()
            .with_fallback(1),
        FieldSpec::date("applied_at", &["applied date", "date", "applied"]).with_fallback(2),
        FieldSpec::enumeration(
            "via",
            &["via", "where", "source", "site", "platform"],
            VIA_VARIANTS,
            "Other",
        )
        .with_fallback(3),
        FieldSpec::enumeration(
            "status",
            &["status", "stage", "response"],
            STATUS_VARIANTS,
            "No Response",
        )
        .with_fallback(4),
        FieldSpec::text("notes", &["notes", "note", "comments", "remarks"]),
        FieldSpec::text("link", &["link", "url", "posting"]),
    ]
}

/// Import a batch of rows. The first row is the header; all subsequent rows
/// are data rows aligned by column index.
///
/// Pure function: no I/O, no shared state, safe to call concurrently.
pub fn import_rows(
    rows: &[Vec<CellValue>],
    specs: &[FieldSpec],
) -> Result<ImportOutcome, ImportError> {
    if rows.len() < 2 {
        return Err(ImportError::EmptyInput);
    }

    // Normalized headers keep their original column index.
    let headers: Vec<String> = rows[0]
        .iter()
        .map(|cell| {
            cell.as_text()
                .map(|s| s.to_lowercase())
                .unwrap_or_default()
        })
        .collect();

    let mut records: Vec<ImportedRecord> = Vec::new();
    let mut seen: std::collections::HashSet<Vec<Option<String>>> = std::collections::HashSet::new();
    let mut skipped = 0usize;

    for row in &rows[1..] {
        match resolve_row(row, &headers, specs) {
            Some(record) => {
                // Whole-tuple dedup, first occurrence wins.
                if seen.insert(record.tuple()) {
                    records.push(record);
                }
            }
            None => skipped += 1,
        }
    }

    let imported = records.len();
    Ok(ImportOutcome {
        records,
        imported,
        skipped,
    })
}

/// Resolve one data row against the field specs, or None when a mandatory
/// field comes up empty.
fn resolve_row(
    row: &[CellValue],
    headers: &[String],
    specs: &[FieldSpec],
) -> Option<ImportedRecord> {
    let mut fields = Vec::with_capacity(specs.len());

    for spec in specs {
        let raw = resolve_cell(row, headers, spec);

        if raw.is_none() && spec.mandatory {
            return None;
        }

        let value = match spec.kind {
            FieldKind::Text => raw.as_ref().and_then(|c| c.as_text()),
            FieldKind::Date => raw.as_ref().map(coerce_date),
            FieldKind::Enum => Some(normalize_enum(raw.as_ref(), spec)),
        };

        fields.push((spec.name, value));
    }

    Some(ImportedRecord { fields })
}

/// The header-matching chain: exact match, substring match, positional
/// fallback. At each stage only a non-empty cell resolves the field.
fn resolve_cell(row: &[CellValue], headers: &[String], spec: &FieldSpec) -> Option<CellValue> {
    let cell_at = |index: usize| -> Option<CellValue> {
        let cell = row.get(index)?;
        if cell.as_text().is_some() {
            Some(cell.clone())
        } else {
            None
        }
    };

    for term in &spec.match_terms {
        if let Some(index) = headers.iter().position(|h| h == term) {
            if let Some(cell) = cell_at(index) {
                return Some(cell);
            }
        }
    }

    for term in &spec.match_terms {
        if let Some(index) = headers
            .iter()
            .position(|h| !h.is_empty() && h.contains(term))
        {
            if let Some(cell) = cell_at(index) {
                return Some(cell);
            }
        }
    }

    spec.fallback_index.and_then(cell_at)
}

/// Spreadsheet serial-date epoch: 1899-12-30, i.e. 1900-01-01 adjusted by the
/// well-known two-day 1900 leap-year offset. Applied to any numeric date
/// value regardless of source format, matching observed exporter behavior.
const SERIAL_DATE_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Coerce a raw cell into an ISO calendar date string.
fn coerce_date(raw: &CellValue) -> String {
    if let CellValue::Text(s) = raw {
        let trimmed = s.trim();
        // ISO-like values are kept verbatim.
        if trimmed.contains('-') {
            return trimmed.to_string();
        }
    }

    if let Some(serial) = raw.as_number() {
        let (y, m, d) = SERIAL_DATE_EPOCH;
        if let Some(epoch) = NaiveDate::from_ymd_opt(y, m, d) {
            // Time-of-day fraction is discarded.
            if let Some(date) = epoch.checked_add_signed(Duration::days(serial.trunc() as i64)) {
                return date.format("%Y-%m-%d").to_string();
            }
        }
    }

    if let Some(text) = raw.as_text() {
        for format in ["%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
                return date.format("%Y-%m-%d").to_string();
            }
        }
    }

    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Enum resolution: normalized lookup in the variant map, verbatim
/// passthrough for unmapped non-empty values, field default when absent.
fn normalize_enum(raw: Option<&CellValue>, spec: &FieldSpec) -> String {
    match raw.and_then(|c| c.as_text()) {
        Some(text) => {
            let normalized = text.to_lowercase();
            spec.variants
                .iter()
                .find(|(input, _)| *input == normalized)
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or(text)
        }
        None => spec.default.unwrap_or("").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|s| text(s)).collect()
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let specs = application_field_specs();

        let no_rows: Vec<Vec<CellValue>> = Vec::new();
        assert!(matches!(
            import_rows(&no_rows, &specs),
            Err(ImportError::EmptyInput)
        ));

        // A lone header row has no data rows either.
        let header_only = vec![row(&["Role", "Company"])];
        assert!(matches!(
            import_rows(&header_only, &specs),
            Err(ImportError::EmptyInput)
        ));
    }

    #[test]
    fn test_basic_import_with_canonical_headers() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Applied Roles", "Company", "Date", "Via", "Status"]),
            row(&["Backend Engineer", "Acme", "2024-03-01", "LinkedIn", "Open"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped, 0);

        let record = &outcome.records[0];
        assert_eq!(record.get("role"), Some("Backend Engineer"));
        assert_eq!(record.get("company"), Some("Acme"));
        assert_eq!(record.get("applied_at"), Some("2024-03-01"));
        assert_eq!(record.get("via"), Some("LinkedIn"));
        assert_eq!(record.get("status"), Some("Open"));
    }

    #[test]
    fn test_mandatory_field_rejection_is_counted() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company"]),
            row(&["Backend Engineer", ""]),
            row(&["Data Engineer", "Acme"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.records[0].get("role"), Some("Data Engineer"));
    }

    #[test]
    fn test_header_substring_fallback() {
        // "Job Title" is neither "applied roles" nor "role", but contains
        // the match term "title".
        let specs = application_field_specs();
        let rows = vec![
            row(&["Job Title", "Company"]),
            row(&["Platform Engineer", "Acme"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.records[0].get("role"), Some("Platform Engineer"));
    }

    #[test]
    fn test_positional_fallback_for_unrecognized_headers() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Kolom A", "Kolom B", "Kolom C"]),
            row(&["Frontend Engineer", "Nike", "2023-11-20"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.imported, 1);
        let record = &outcome.records[0];
        assert_eq!(record.get("role"), Some("Frontend Engineer"));
        assert_eq!(record.get("company"), Some("Nike"));
        assert_eq!(record.get("applied_at"), Some("2023-11-20"));
    }

    #[test]
    fn test_headers_are_case_insensitive_and_trimmed() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["  ROLE  ", " COMPANY "]),
            row(&["SRE", "Acme"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.records[0].get("role"), Some("SRE"));
        assert_eq!(outcome.records[0].get("company"), Some("Acme"));
    }

    #[test]
    fn test_serial_date_coercion_regression_anchor() {
        // 44562 days past 1899-12-30 is 2022-01-01. Pins the two-day
        // 1900 leap-bug epoch adjustment.
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Date"]),
            vec![text("Engineer"), text("Acme"), CellValue::Number(44562.0)],
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.records[0].get("applied_at"), Some("2022-01-01"));
    }

    #[test]
    fn test_serial_date_as_text_and_with_time_fraction() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Date"]),
            row(&["Engineer", "Acme", "44562"]),
            vec![text("Analyst"), text("Acme"), CellValue::Number(44562.75)],
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.records[0].get("applied_at"), Some("2022-01-01"));
        assert_eq!(outcome.records[1].get("applied_at"), Some("2022-01-01"));
    }

    #[test]
    fn test_iso_like_dates_kept_verbatim() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Date"]),
            row(&["Engineer", "Acme", "2024-02-30"]),
        ];

        // Kept as-is even when not a real calendar date; the importer does
        // not re-validate ISO-like values.
        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.records[0].get("applied_at"), Some("2024-02-30"));
    }

    #[test]
    fn test_slash_date_formats_are_parsed() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Date"]),
            row(&["Engineer", "Acme", "2024/03/05"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.records[0].get("applied_at"), Some("2024-03-05"));
    }

    #[test]
    fn test_unparseable_date_defaults_to_today() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Date"]),
            row(&["Engineer", "Acme", "soonish"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(outcome.records[0].get("applied_at"), Some(today.as_str()));
    }

    #[test]
    fn test_status_variants_are_canonicalized() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Status"]),
            row(&["Engineer", "Acme", "  INTERVIEWING "]),
            row(&["Analyst", "Acme", "withdrawn"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.records[0].get("status"), Some("Under Interview"));
        assert_eq!(outcome.records[1].get("status"), Some("WithDrawn"));
    }

    #[test]
    fn test_absent_enum_takes_field_default() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company"]),
            row(&["Engineer", "Acme"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.records[0].get("status"), Some("No Response"));
        assert_eq!(outcome.records[0].get("via"), Some("Other"));
    }

    #[test]
    fn test_unmapped_enum_value_passes_through_verbatim() {
        // Free text in the "where submitted" column is user data, not a
        // bucketing mistake.
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Via"]),
            row(&["Engineer", "Nike", "Site Nike"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.records[0].get("via"), Some("Site Nike"));
    }

    #[test]
    fn test_exact_duplicates_collapse_to_one() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Date", "Status"]),
            row(&["Engineer", "Acme", "2024-01-05", "Open"]),
            row(&["Engineer", "Acme", "2024-01-05", "Open"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_near_duplicates_differing_in_notes_are_kept() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Date", "Status", "Notes"]),
            row(&["Engineer", "Acme", "2024-01-05", "Open", "first round"]),
            row(&["Engineer", "Acme", "2024-01-05", "Open", "second round"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.imported, 2);
    }

    #[test]
    fn test_output_preserves_first_seen_order() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company"]),
            row(&["Third", "C"]),
            row(&["First", "A"]),
            row(&["Third", "C"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        let roles: Vec<_> = outcome
            .records
            .iter()
            .map(|r| r.get("role").unwrap())
            .collect();
        assert_eq!(roles, vec!["Third", "First"]);
    }

    #[test]
    fn test_all_rows_rejected_is_not_an_error() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company"]),
            row(&["", ""]),
            row(&["Engineer", ""]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.imported, 0);
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let specs = application_field_specs();
        let rows = vec![
            row(&["Role", "Company", "Date", "Via", "Status"]),
            row(&["Engineer", "Acme"]),
        ];

        let outcome = import_rows(&rows, &specs).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.records[0].get("status"), Some("No Response"));
    }
}
