//! Category codec: fixed label to code tables for every categorical survey field
//!
//! One table per field drives both encoding and the inverse lookup used for
//! display, so the two directions cannot drift apart.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// The eleven logical features the model was trained on, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    Gender,
    AgeProfile,
    JobLevel,
    MonthlyIncome,
    BusinessTravel,
    OverTime,
    WorkLifeBalance,
    JobSatisfaction,
    EnvironmentSatisfaction,
    TrainingTimesLastYear,
    YearsAtCompany,
}

/// How a feature's raw answer is turned into a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Two labels collapsed to {0, 1}
    Binary,
    /// Ordered labels mapped to consecutive integers
    Ordinal,
    /// Passed through unchanged
    Numeric,
}

impl Feature {
    pub const COUNT: usize = 11;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::Gender,
        Feature::AgeProfile,
        Feature::JobLevel,
        Feature::MonthlyIncome,
        Feature::BusinessTravel,
        Feature::OverTime,
        Feature::WorkLifeBalance,
        Feature::JobSatisfaction,
        Feature::EnvironmentSatisfaction,
        Feature::TrainingTimesLastYear,
        Feature::YearsAtCompany,
    ];

    /// Column name used by the training data
    pub fn name(self) -> &'static str {
        match self {
            Feature::Gender => "Gender",
            Feature::AgeProfile => "Age_Profile",
            Feature::JobLevel => "JobLevel",
            Feature::MonthlyIncome => "MonthlyIncome",
            Feature::BusinessTravel => "BusinessTravel",
            Feature::OverTime => "OverTime",
            Feature::WorkLifeBalance => "WorkLifeBalance",
            Feature::JobSatisfaction => "JobSatisfaction",
            Feature::EnvironmentSatisfaction => "EnvironmentSatisfaction",
            Feature::TrainingTimesLastYear => "TrainingTimesLastYear",
            Feature::YearsAtCompany => "YearsAtCompany",
        }
    }

    /// Look up a feature by its exact column name
    pub fn from_name(name: &str) -> Result<Feature> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Feature::Gender | Feature::OverTime => FieldKind::Binary,
            Feature::MonthlyIncome | Feature::YearsAtCompany => FieldKind::Numeric,
            _ => FieldKind::Ordinal,
        }
    }

    pub fn is_categorical(self) -> bool {
        self.kind() != FieldKind::Numeric
    }

    /// Position in canonical order
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const STANDARD_VOCABULARY: &[(Feature, &[(&str, i64)])] = &[
    (Feature::Gender, &[("Female", 0), ("Male", 1)]),
    (
        Feature::AgeProfile,
        &[
            ("Young Adult (18-25)", 1),
            ("Adult (26-44)", 2),
            ("Middle-age (45-59)", 3),
            ("Old age (60+)", 4),
        ],
    ),
    (
        Feature::JobLevel,
        &[
            ("Entry-Level", 1),
            ("Junior", 2),
            ("Middle", 3),
            ("Senior", 4),
            ("Executive", 5),
        ],
    ),
    (
        Feature::BusinessTravel,
        &[("Rarely", 1), ("Frequently", 2), ("Non-Travel", 3)],
    ),
    (Feature::OverTime, &[("No", 0), ("Yes", 1)]),
    (
        Feature::WorkLifeBalance,
        &[("Bad", 1), ("Good", 2), ("Better", 3), ("Best", 4)],
    ),
    (
        Feature::JobSatisfaction,
        &[("Low", 1), ("Medium", 2), ("High", 3), ("Very High", 4)],
    ),
    (
        Feature::EnvironmentSatisfaction,
        &[("Low", 1), ("Medium", 2), ("High", 3), ("Very High", 4)],
    ),
    (
        Feature::TrainingTimesLastYear,
        &[
            ("None", 0),
            ("1-2", 1),
            ("3-4", 2),
            ("5-6", 3),
            ("7-8", 4),
            ("9-10", 5),
            ("More than 10", 6),
        ],
    ),
];

/// Ordered label/code pairs for a single field
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    entries: Vec<(String, i64)>,
}

impl Vocabulary {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(label, code)| (label.into(), code))
                .collect(),
        }
    }

    pub fn code(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, code)| *code)
    }

    pub fn label(&self, code: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, candidate)| *candidate == code)
            .map(|(label, _)| label.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(label, code)| (label.as_str(), *code))
    }

    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|(_, code)| *code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps human-readable answers to the integer codes the model was trained on
#[derive(Debug, Clone)]
pub struct CategoryCodec {
    tables: BTreeMap<Feature, Vocabulary>,
}

impl CategoryCodec {
    /// Build a codec from explicit tables.
    ///
    /// Every categorical feature needs a table and every table must be a
    /// bijection: no repeated labels and no repeated codes.
    pub fn new(tables: BTreeMap<Feature, Vocabulary>) -> Result<Self> {
        for feature in Feature::ALL {
            let table = tables.get(&feature);
            match (feature.is_categorical(), table) {
                (true, None) => {
                    return Err(Error::ModelLoad(format!("no vocabulary for {feature}")));
                }
                (false, Some(_)) => {
                    return Err(Error::ModelLoad(format!(
                        "{feature} is numeric and cannot carry a vocabulary"
                    )));
                }
                _ => {}
            }
        }

        for (feature, table) in &tables {
            if table.is_empty() {
                return Err(Error::ModelLoad(format!("empty vocabulary for {feature}")));
            }
            let mut labels: Vec<&str> = table.entries().map(|(label, _)| label).collect();
            let mut codes: Vec<i64> = table.codes().collect();
            labels.sort_unstable();
            labels.dedup();
            codes.sort_unstable();
            codes.dedup();
            if labels.len() != table.len() || codes.len() != table.len() {
                return Err(Error::ModelLoad(format!(
                    "vocabulary for {feature} is not one-to-one"
                )));
            }
            if feature.kind() == FieldKind::Binary && codes != [0, 1] {
                return Err(Error::ModelLoad(format!(
                    "binary field {feature} must use codes 0 and 1"
                )));
            }
        }

        Ok(Self { tables })
    }

    /// The survey vocabulary the attrition model was trained with
    pub fn standard() -> Self {
        let tables = STANDARD_VOCABULARY
            .iter()
            .map(|(feature, entries)| (*feature, Vocabulary::new(entries.iter().copied())))
            .collect();
        Self { tables }
    }

    /// Encode `raw_label` for the field named `field_name`.
    ///
    /// Labels must match exactly; no trimming or case folding is done.
    pub fn encode(&self, field_name: &str, raw_label: &str) -> Result<i64> {
        self.encode_feature(Feature::from_name(field_name)?, raw_label)
    }

    pub fn encode_feature(&self, feature: Feature, raw_label: &str) -> Result<i64> {
        let table = self.vocabulary(feature)?;
        table
            .code(raw_label)
            .ok_or_else(|| Error::InvalidCategoryLabel {
                field: feature.name().to_string(),
                label: raw_label.to_string(),
            })
    }

    /// Reverse lookup for display
    pub fn decode(&self, feature: Feature, code: i64) -> Option<&str> {
        self.tables.get(&feature).and_then(|table| table.label(code))
    }

    pub fn vocabulary(&self, feature: Feature) -> Result<&Vocabulary> {
        self.tables
            .get(&feature)
            .ok_or_else(|| Error::NotCategorical(feature.name().to_string()))
    }

    /// Categorical features with their tables, in canonical order
    pub fn tables(&self) -> impl Iterator<Item = (Feature, &Vocabulary)> {
        self.tables.iter().map(|(feature, table)| (*feature, table))
    }
}

impl Default for CategoryCodec {
    fn default() -> Self {
        Self::standard()
    }
}
