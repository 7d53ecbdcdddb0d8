// src/profile/merger.rs
//! Merge policy for profile auto-population.
//!
//! Combines freshly-extracted CV fields with the stored profile without
//! regressing known-good data: a non-empty extracted value always wins, an
//! empty one never clobbers what is already stored. Skills and experience are
//! replaced outright by any new extraction, and languages are re-rendered on
//! every extraction run. One table-driven merge function replaces the
//! existing-or-new conditionals scattered through the original save path.

use serde::{Deserialize, Serialize};

/// Sentinel for "extraction ran and found no languages", distinct from the
/// empty string which means "never extracted".
pub const LANGUAGES_NOT_FOUND: &str = "not found";

/// Fields produced by the structured-extraction service. Everything is
/// optional; malformed shapes deserialize permissively and are treated as
/// absent rather than failing the merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedProfileFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub languages: Option<LanguagesField>,
}

/// The extraction service returns languages either as a single string or as
/// a list of {language, proficiency} pairs; anything else is tolerated and
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguagesField {
    Text(String),
    Entries(Vec<LanguageEntry>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageEntry {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub proficiency: Option<String>,
}

/// The scalar field set of a stored profile. Always fully present once
/// created; fields default to the empty string, never to absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub skills: String,
    pub experience: String,
    pub languages: String,
}

/// Per-field merge rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeRule {
    /// Non-empty extracted value overwrites; otherwise the stored value is
    /// kept. Applies to name, email, phone, position.
    OverwriteIfPresent,
    /// Any non-empty extraction replaces the stored value outright; stored
    /// data never accumulates into it. Applies to skills and experience.
    ReplaceOnNewData,
}

/// The merge policy table. Languages are special-cased below because they
/// are recomputed on every extraction run rather than merged.
const MERGE_POLICY: &[(&str, MergeRule)] = &[
    ("name", MergeRule::OverwriteIfPresent),
    ("email", MergeRule::OverwriteIfPresent),
    ("phone", MergeRule::OverwriteIfPresent),
    ("position", MergeRule::OverwriteIfPresent),
    ("skills", MergeRule::ReplaceOnNewData),
    ("experience", MergeRule::ReplaceOnNewData),
];

/// Merge newly-extracted fields into the stored profile (if any) and return
/// the profile to persist.
///
/// Pure function: no I/O, no shared state, safe to call concurrently.
pub fn merge_profile(
    existing: Option<&ProfileFields>,
    extracted: &ExtractedProfileFields,
) -> ProfileFields {
    let empty = ProfileFields::default();
    let stored = existing.unwrap_or(&empty);

    let mut merged = ProfileFields::default();

    for (field, rule) in MERGE_POLICY {
        let new_value = extracted_scalar(extracted, field);
        let stored_value = stored_scalar(stored, field);
        let value = merge_scalar(*rule, new_value, stored_value);
        set_scalar(&mut merged, field, value);
    }

    // Languages are always recomputed from the extraction when it ran.
    merged.languages = render_languages(extracted.languages.as_ref());

    merged
}

/// Both rules collapse to the same arithmetic for a single merge: a clean
/// non-empty extracted value wins, otherwise the stored value survives. The
/// tags stay separate because they are distinct policies (skills/experience
/// never keep stored data once any new extraction exists) and tests pin each
/// one independently.
fn merge_scalar(_rule: MergeRule, extracted: Option<&str>, stored: &str) -> String {
    match clean(extracted) {
        Some(value) => value.to_string(),
        None => stored.to_string(),
    }
}

/// A value counts only when it is a clearly non-empty string.
fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Render the languages field from the extraction result.
///
/// A non-empty string is used verbatim. A list of pairs is filtered of
/// entries where either side is missing, blank, or the literal "undefined"
/// (a common artifact of the extraction model), then rendered as
/// "Language (Proficiency)" joined by ", ". An empty result yields the
/// "not found" sentinel.
pub fn render_languages(field: Option<&LanguagesField>) -> String {
    match field {
        Some(LanguagesField::Text(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(LanguagesField::Entries(entries)) => {
            let rendered: Vec<String> = entries
                .iter()
                .filter_map(|entry| {
                    let language = clean_entry_part(entry.language.as_deref())?;
                    let proficiency = clean_entry_part(entry.proficiency.as_deref())?;
                    Some(format!("{} ({})", language, proficiency))
                })
                .collect();

            if rendered.is_empty() {
                LANGUAGES_NOT_FOUND.to_string()
            } else {
                rendered.join(", ")
            }
        }
        _ => LANGUAGES_NOT_FOUND.to_string(),
    }
}

fn clean_entry_part(part: Option<&str>) -> Option<&str> {
    clean(part).filter(|v| !v.eq_ignore_ascii_case("undefined"))
}

fn extracted_scalar<'a>(extracted: &'a ExtractedProfileFields, field: &str) -> Option<&'a str> {
    match field {
        "name" => extracted.name.as_deref(),
        "email" => extracted.email.as_deref(),
        "phone" => extracted.phone.as_deref(),
        "position" => extracted.position.as_deref(),
        "skills" => extracted.skills.as_deref(),
        "experience" => extracted.experience.as_deref(),
        _ => None,
    }
}

fn stored_scalar<'a>(stored: &'a ProfileFields, field: &str) -> &'a str {
    match field {
        "name" => &stored.name,
        "email" => &stored.email,
        "phone" => &stored.phone,
        "position" => &stored.position,
        "skills" => &stored.skills,
        "experience" => &stored.experience,
        _ => "",
    }
}

fn set_scalar(profile: &mut ProfileFields, field: &str, value: String) {
    match field {
        "name" => profile.name = value,
        "email" => profile.email = value,
        "phone" => profile.phone = value,
        "position" => profile.position = value,
        "skills" => profile.skills = value,
        "experience" => profile.experience = value,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_with(phone: &str, skills: &str) -> ProfileFields {
        ProfileFields {
            name: "Jan de Vries".to_string(),
            email: "jan@example.com".to_string(),
            phone: phone.to_string(),
            position: "Backend Developer".to_string(),
            skills: skills.to_string(),
            experience: "5 years at Acme".to_string(),
            languages: "Dutch (Native)".to_string(),
        }
    }

    fn entry(language: &str, proficiency: &str) -> LanguageEntry {
        LanguageEntry {
            language: Some(language.to_string()),
            proficiency: Some(proficiency.to_string()),
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let stored = stored_with("+31600000000", "Python");
        let extracted = ExtractedProfileFields {
            name: Some("Jan de Vries".to_string()),
            email: Some("jan@newmail.com".to_string()),
            skills: Some("Go, Rust".to_string()),
            languages: Some(LanguagesField::Entries(vec![entry("English", "C1")])),
            ..Default::default()
        };

        let once = merge_profile(Some(&stored), &extracted);
        let twice = merge_profile(Some(&once), &extracted);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_extraction_never_regresses_stored_scalars() {
        let stored = stored_with("+31600000000", "Python");
        let extracted = ExtractedProfileFields {
            phone: Some("".to_string()),
            ..Default::default()
        };

        let merged = merge_profile(Some(&stored), &extracted);
        assert_eq!(merged.phone, "+31600000000");
        assert_eq!(merged.name, "Jan de Vries");
        assert_eq!(merged.email, "jan@example.com");
        assert_eq!(merged.position, "Backend Developer");
    }

    #[test]
    fn test_non_empty_extraction_refreshes_contact_fields() {
        // Re-uploading a CV always refreshes populated contact fields,
        // even when they differ from stored values.
        let stored = stored_with("+31600000000", "Python");
        let extracted = ExtractedProfileFields {
            phone: Some("+31699999999".to_string()),
            ..Default::default()
        };

        let merged = merge_profile(Some(&stored), &extracted);
        assert_eq!(merged.phone, "+31699999999");
    }

    #[test]
    fn test_skills_replaced_unconditionally() {
        let stored = stored_with("+31600000000", "Python");
        let extracted = ExtractedProfileFields {
            skills: Some("Go, Rust".to_string()),
            ..Default::default()
        };

        let merged = merge_profile(Some(&stored), &extracted);
        assert_eq!(merged.skills, "Go, Rust");
    }

    #[test]
    fn test_experience_replaced_unconditionally() {
        let stored = stored_with("+31600000000", "Python");
        let extracted = ExtractedProfileFields {
            experience: Some("2 years at Globex".to_string()),
            ..Default::default()
        };

        let merged = merge_profile(Some(&stored), &extracted);
        assert_eq!(merged.experience, "2 years at Globex");
    }

    #[test]
    fn test_empty_skills_extraction_keeps_stored_skills() {
        let stored = stored_with("+31600000000", "Python");
        let merged = merge_profile(Some(&stored), &ExtractedProfileFields::default());
        assert_eq!(merged.skills, "Python");
        assert_eq!(merged.experience, "5 years at Acme");
    }

    #[test]
    fn test_no_stored_profile_defaults_to_empty_strings() {
        let extracted = ExtractedProfileFields {
            name: Some("Jan".to_string()),
            ..Default::default()
        };

        let merged = merge_profile(None, &extracted);
        assert_eq!(merged.name, "Jan");
        assert_eq!(merged.email, "");
        assert_eq!(merged.phone, "");
    }

    #[test]
    fn test_languages_rendering() {
        let extracted = ExtractedProfileFields {
            languages: Some(LanguagesField::Entries(vec![
                entry("English", "Native"),
                entry("Dutch", "B2"),
            ])),
            ..Default::default()
        };

        let merged = merge_profile(None, &extracted);
        assert_eq!(merged.languages, "English (Native), Dutch (B2)");
    }

    #[test]
    fn test_languages_undefined_entries_yield_sentinel() {
        let extracted = ExtractedProfileFields {
            languages: Some(LanguagesField::Entries(vec![entry(
                "English",
                "undefined",
            )])),
            ..Default::default()
        };

        let merged = merge_profile(None, &extracted);
        assert_eq!(merged.languages, LANGUAGES_NOT_FOUND);
    }

    #[test]
    fn test_languages_filter_keeps_valid_entries() {
        let extracted = ExtractedProfileFields {
            languages: Some(LanguagesField::Entries(vec![
                entry("English", "undefined"),
                entry("Dutch", "B2"),
                LanguageEntry {
                    language: None,
                    proficiency: Some("A1".to_string()),
                },
            ])),
            ..Default::default()
        };

        let merged = merge_profile(None, &extracted);
        assert_eq!(merged.languages, "Dutch (B2)");
    }

    #[test]
    fn test_languages_string_form_used_verbatim() {
        let extracted = ExtractedProfileFields {
            languages: Some(LanguagesField::Text("English, Dutch".to_string())),
            ..Default::default()
        };

        let merged = merge_profile(None, &extracted);
        assert_eq!(merged.languages, "English, Dutch");
    }

    #[test]
    fn test_languages_absent_or_malformed_yield_sentinel() {
        let merged = merge_profile(None, &ExtractedProfileFields::default());
        assert_eq!(merged.languages, LANGUAGES_NOT_FOUND);

        let extracted = ExtractedProfileFields {
            languages: Some(LanguagesField::Other(serde_json::json!({"en": true}))),
            ..Default::default()
        };
        let merged = merge_profile(None, &extracted);
        assert_eq!(merged.languages, LANGUAGES_NOT_FOUND);
    }

    #[test]
    fn test_languages_recomputed_even_when_stored_value_exists() {
        // Extraction ran and found nothing: the stored rendering is
        // replaced by the sentinel, not preserved.
        let stored = stored_with("+31600000000", "Python");
        let merged = merge_profile(Some(&stored), &ExtractedProfileFields::default());
        assert_eq!(merged.languages, LANGUAGES_NOT_FOUND);
    }

    #[test]
    fn test_whitespace_only_values_count_as_empty() {
        let stored = stored_with("+31600000000", "Python");
        let extracted = ExtractedProfileFields {
            phone: Some("   ".to_string()),
            skills: Some("\t".to_string()),
            ..Default::default()
        };

        let merged = merge_profile(Some(&stored), &extracted);
        assert_eq!(merged.phone, "+31600000000");
        assert_eq!(merged.skills, "Python");
    }

    #[test]
    fn test_extraction_payload_deserializes_both_language_shapes() {
        let as_list: ExtractedProfileFields = serde_json::from_str(
            r#"{"name":"Jan","languages":[{"language":"English","proficiency":"C1"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            as_list.languages,
            Some(LanguagesField::Entries(_))
        ));

        let as_string: ExtractedProfileFields =
            serde_json::from_str(r#"{"languages":"English, Dutch"}"#).unwrap();
        assert!(matches!(as_string.languages, Some(LanguagesField::Text(_))));

        // Unknown shapes must not fail deserialization.
        let malformed: ExtractedProfileFields =
            serde_json::from_str(r#"{"languages":{"en":true}}"#).unwrap();
        assert!(matches!(malformed.languages, Some(LanguagesField::Other(_))));
    }
}
