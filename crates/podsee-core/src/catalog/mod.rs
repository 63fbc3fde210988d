//! Centre catalog: normalization, aggregation and filtering.
//!
//! Levels and subjects from the spreadsheet are folded through fixed
//! synonym tables and ordered by fixed priority lists. Filtering applies
//! the Science umbrella rule: selecting "Science" matches any of Science,
//! Biology, Chemistry or Physics.

pub mod loader;

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::models::{Centre, CentreRow, Offering, OfferingRow};
use crate::utils::cmp_ignore_case;

/// Curated subject order used for every subject list.
pub const SUBJECT_ORDER: &[&str] = &[
    "Biology",
    "Chemistry",
    "Physics",
    "Science",
    "Mathematics",
    "Higher Chinese",
    "Chinese",
    "English",
    "Economics",
    "History",
    "Social Studies",
    "Literature",
    "Geography",
    "General Paper",
    "POA",
    "Malay",
    "English Language & Linguistics",
    "English Language & Literature",
    "China Studies in English",
];

/// Level order, primary through IB.
pub const LEVEL_ORDER: &[&str] = &[
    "P1", "P2", "P3", "P4", "P5", "P6",
    "S1", "S2", "S3", "S4", "S5",
    "JC1", "JC2",
    "IB", "Y5 (IB)", "Y6 (IB)",
];

/// Subjects that "Science" stands for when filtering.
const SCIENCE_UMBRELLA: &[&str] = &["Science", "Biology", "Chemistry", "Physics"];

/// Specialised sciences are not offered as choices at lower secondary.
const SPECIALISED_SCIENCES: &[&str] = &["Biology", "Chemistry", "Physics"];
const LOWER_SECONDARY_LEVELS: &[&str] = &["S1", "S2"];

/// Fold subject synonyms onto their canonical name.
pub fn normalize_subject(subject: &str) -> String {
    match subject {
        "Math" | "Mathematics" => "Mathematics".to_string(),
        "POA" | "Principle of Accounts (POA)" => "POA".to_string(),
        other => other.to_string(),
    }
}

/// Normalize a level. Returns `None` for levels that are dropped (J1/J2).
pub fn normalize_level(level: &str) -> Option<String> {
    match level {
        "J1" | "J2" => None,
        other => Some(other.to_string()),
    }
}

/// Position in a priority list; unknown values rank after every known one.
fn priority(order: &[&str], value: &str) -> usize {
    order
        .iter()
        .position(|known| *known == value)
        .unwrap_or(order.len())
}

/// Stable sort by priority list, keeping unknown values in insertion order.
fn sort_by_priority(values: &mut [String], order: &[&str]) {
    values.sort_by_key(|v| priority(order, v));
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// Whether an offering satisfies a (level, subject) selection.
pub fn offering_matches(offering: &Offering, level: &str, subject: &str) -> bool {
    if offering.level != level {
        return false;
    }
    if subject == "Science" {
        return SCIENCE_UMBRELLA.contains(&offering.subject.as_str());
    }
    offering.subject == subject
}

/// Levels and subjects available across the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub levels: Vec<String>,
    pub subjects: Vec<String>,
}

/// All levels and subjects present, restricted to the priority lists and in
/// their order.
pub fn filter_options(centres: &[Centre]) -> FilterOptions {
    fn present(order: &[&str], centres: &[Centre], pick: fn(&Centre) -> &[String]) -> Vec<String> {
        order
            .iter()
            .copied()
            .filter(|known| {
                centres
                    .iter()
                    .any(|c| pick(c).iter().any(|v| v.as_str() == *known))
            })
            .map(str::to_string)
            .collect()
    }

    FilterOptions {
        levels: present(LEVEL_ORDER, centres, |c| c.levels.as_slice()),
        subjects: present(SUBJECT_ORDER, centres, |c| c.subjects.as_slice()),
    }
}

/// Subjects offered at `level` by any centre, in subject order with unknown
/// subjects appended. Specialised sciences are hidden for S1 and S2, where
/// only "Science" is a valid choice.
pub fn subjects_for_level(level: &str, centres: &[Centre]) -> Vec<String> {
    if level.is_empty() {
        return Vec::new();
    }

    let mut subjects = Vec::new();
    for offering in centres.iter().flat_map(|c| c.offerings.iter()) {
        if offering.level == level && !offering.subject.is_empty() {
            push_unique(&mut subjects, &offering.subject);
        }
    }

    if LOWER_SECONDARY_LEVELS.contains(&level) {
        subjects.retain(|s| !SPECIALISED_SCIENCES.contains(&s.as_str()));
    }

    sort_by_priority(&mut subjects, SUBJECT_ORDER);
    subjects
}

/// Centres with at least one offering matching the selection, sorted by name.
pub fn filter_centres<'a>(centres: &'a [Centre], level: &str, subject: &str) -> Vec<&'a Centre> {
    let mut matched: Vec<&Centre> = centres
        .iter()
        .filter(|centre| {
            centre
                .offerings
                .iter()
                .any(|offering| offering_matches(offering, level, subject))
        })
        .collect();

    matched.sort_by(|a, b| compare_names(&a.name, &b.name));
    matched
}

/// Name ordering: case-insensitive first, then exact as a tie-breaker.
fn compare_names(a: &str, b: &str) -> Ordering {
    cmp_ignore_case(a, b).then_with(|| a.cmp(b))
}

/// Distinct subjects a centre teaches at `level`, in subject order.
pub fn subjects_for_centre_at_level(centre: &Centre, level: &str) -> Vec<String> {
    let mut subjects = Vec::new();
    for offering in &centre.offerings {
        if offering.level == level && !offering.subject.is_empty() {
            push_unique(&mut subjects, &offering.subject);
        }
    }
    sort_by_priority(&mut subjects, SUBJECT_ORDER);
    subjects
}

/// First non-empty note among the centre's offerings matching the selection.
pub fn matching_note<'a>(centre: &'a Centre, level: &str, subject: &str) -> Option<&'a str> {
    centre
        .offerings
        .iter()
        .filter(|offering| offering_matches(offering, level, subject))
        .filter_map(|offering| offering.notes.as_deref())
        .find(|note| !note.trim().is_empty())
}

/// The aggregated centre list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    centres: Vec<Centre>,
}

impl Catalog {
    /// Aggregate sheet rows into centres.
    ///
    /// Offerings for unknown centre names are ignored, as are offerings at
    /// dropped levels. A repeated centre row replaces the earlier row's
    /// details but keeps its position.
    pub fn from_rows(centre_rows: Vec<CentreRow>, offering_rows: Vec<OfferingRow>) -> Self {
        let mut centres: Vec<Centre> = Vec::with_capacity(centre_rows.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in centre_rows {
            let existing = index.get(&row.centre_name).copied();
            match existing {
                Some(i) => centres[i] = Centre::from_row(row),
                None => {
                    index.insert(row.centre_name.clone(), centres.len());
                    centres.push(Centre::from_row(row));
                }
            }
        }

        let mut skipped = 0usize;
        for row in offering_rows {
            let Some(&i) = index.get(&row.centre_name) else {
                skipped += 1;
                continue;
            };

            let Some(level) = normalize_level(row.level.as_deref().unwrap_or("")) else {
                continue;
            };
            let subject = normalize_subject(row.subject.as_deref().unwrap_or(""));

            let centre = &mut centres[i];
            if !level.is_empty() {
                push_unique(&mut centre.levels, &level);
            }
            if !subject.is_empty() {
                push_unique(&mut centre.subjects, &subject);
            }
            centre.offerings.push(Offering {
                level,
                subject,
                notes: row.notes.filter(|n| !n.trim().is_empty()),
            });
        }

        if skipped > 0 {
            debug!(skipped, "Ignored offerings for unknown centres");
        }

        for centre in &mut centres {
            sort_by_priority(&mut centre.levels, LEVEL_ORDER);
            sort_by_priority(&mut centre.subjects, SUBJECT_ORDER);
        }

        Self { centres }
    }

    pub fn centres(&self) -> &[Centre] {
        &self.centres
    }

    pub fn is_empty(&self) -> bool {
        self.centres.is_empty()
    }

    pub fn len(&self) -> usize {
        self.centres.len()
    }

    pub fn filter_options(&self) -> FilterOptions {
        filter_options(&self.centres)
    }

    pub fn subjects_for_level(&self, level: &str) -> Vec<String> {
        subjects_for_level(level, &self.centres)
    }

    /// Owned copies of the matching centres, sorted by name.
    pub fn filter(&self, level: &str, subject: &str) -> Vec<Centre> {
        filter_centres(&self.centres, level, subject)
            .into_iter()
            .cloned()
            .collect()
    }
}
