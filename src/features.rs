//! Raw answers, numeric bounds and the fixed-schema encoded record

use crate::codec::{CategoryCodec, Feature, FieldKind};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One answer as supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Label(String),
    Number(f64),
}

/// Answers to the survey questions, keyed by feature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    answers: BTreeMap<Feature, Answer>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, feature: Feature, label: impl Into<String>) -> Self {
        self.answers.insert(feature, Answer::Label(label.into()));
        self
    }

    pub fn with_number(mut self, feature: Feature, value: f64) -> Self {
        self.answers.insert(feature, Answer::Number(value));
        self
    }

    /// Record an answer for the field with the given column name
    pub fn set(&mut self, field_name: &str, answer: Answer) -> Result<()> {
        let feature = Feature::from_name(field_name)?;
        self.answers.insert(feature, answer);
        Ok(())
    }

    pub fn get(&self, feature: Feature) -> Option<&Answer> {
        self.answers.get(&feature)
    }

    pub fn remove(&mut self, feature: Feature) -> Option<Answer> {
        self.answers.remove(&feature)
    }

    pub fn answers(&self) -> impl Iterator<Item = (Feature, &Answer)> {
        self.answers.iter().map(|(feature, answer)| (*feature, answer))
    }
}

/// Inclusive range accepted for a numeric answer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Bounds enforced on the numeric answers at the input boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputBounds {
    pub monthly_income: NumericRange,
    pub years_at_company: NumericRange,
}

impl Default for InputBounds {
    fn default() -> Self {
        Self {
            monthly_income: NumericRange::new(1009.0, 19999.0),
            years_at_company: NumericRange::new(0.0, 40.0),
        }
    }
}

impl InputBounds {
    pub fn range(&self, feature: Feature) -> Option<NumericRange> {
        match feature {
            Feature::MonthlyIncome => Some(self.monthly_income),
            Feature::YearsAtCompany => Some(self.years_at_company),
            _ => None,
        }
    }

    /// NaN is let through so the imputer can deal with it
    pub fn check(&self, feature: Feature, value: f64) -> Result<()> {
        match self.range(feature) {
            Some(range) if !value.is_nan() && !range.contains(value) => Err(Error::OutOfRange {
                field: feature.name().to_string(),
                value,
                min: range.min,
                max: range.max,
            }),
            _ => Ok(()),
        }
    }
}

/// Every logical feature with its encoded value, before one-hot expansion
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    values: [f64; Feature::COUNT],
}

impl EncodedRecord {
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Integer code of a categorical feature
    pub fn code(&self, feature: Feature) -> Option<i64> {
        feature
            .is_categorical()
            .then(|| self.values[feature.index()] as i64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL
            .into_iter()
            .map(move |feature| (feature, self.values[feature.index()]))
    }
}

/// Assembles codec outputs and pass-through numbers into an [`EncodedRecord`]
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Fails with [`Error::MissingField`] when any canonical feature is absent
    pub fn build(
        &self,
        encoded_fields: &BTreeMap<Feature, i64>,
        numeric_fields: &BTreeMap<Feature, f64>,
    ) -> Result<EncodedRecord> {
        let mut values = [0.0; Feature::COUNT];
        for feature in Feature::ALL {
            let value = if feature.is_categorical() {
                encoded_fields.get(&feature).map(|code| *code as f64)
            } else {
                numeric_fields.get(&feature).copied()
            };
            values[feature.index()] =
                value.ok_or_else(|| Error::MissingField(feature.name().to_string()))?;
        }
        Ok(EncodedRecord { values })
    }
}

/// Validate and encode a full set of answers
pub fn encode_input(
    codec: &CategoryCodec,
    bounds: &InputBounds,
    input: &RawInput,
) -> Result<EncodedRecord> {
    let mut encoded = BTreeMap::new();
    let mut numeric = BTreeMap::new();

    for (feature, answer) in input.answers() {
        match (feature.kind(), answer) {
            (FieldKind::Numeric, Answer::Number(value)) => {
                bounds.check(feature, *value)?;
                numeric.insert(feature, *value);
            }
            (FieldKind::Numeric, Answer::Label(text)) => {
                let value: f64 = text.parse().map_err(|_| Error::InvalidCategoryLabel {
                    field: feature.name().to_string(),
                    label: text.clone(),
                })?;
                bounds.check(feature, value)?;
                numeric.insert(feature, value);
            }
            (_, Answer::Label(label)) => {
                encoded.insert(feature, codec.encode_feature(feature, label)?);
            }
            (_, Answer::Number(value)) => {
                return Err(Error::InvalidCategoryLabel {
                    field: feature.name().to_string(),
                    label: value.to_string(),
                });
            }
        }
    }

    let record = FeatureVectorBuilder.build(&encoded, &numeric)?;
    debug!(?record, "encoded answers");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_input;

    #[test]
    fn test_regression_fixture() {
        let record = encode_input(
            &CategoryCodec::standard(),
            &InputBounds::default(),
            &sample_input(),
        )
        .unwrap();

        let expected = [
            (Feature::Gender, 1.0),
            (Feature::AgeProfile, 2.0),
            (Feature::JobLevel, 1.0),
            (Feature::MonthlyIncome, 2500.0),
            (Feature::BusinessTravel, 1.0),
            (Feature::OverTime, 1.0),
            (Feature::WorkLifeBalance, 1.0),
            (Feature::JobSatisfaction, 1.0),
            (Feature::EnvironmentSatisfaction, 1.0),
            (Feature::TrainingTimesLastYear, 0.0),
            (Feature::YearsAtCompany, 1.0),
        ];
        for (feature, value) in expected {
            assert_eq!(record.get(feature), value, "{feature}");
        }
        assert_eq!(record.iter().count(), Feature::COUNT);
    }

    #[test]
    fn test_missing_field() {
        let mut input = sample_input();
        input.remove(Feature::Gender);
        let err = encode_input(&CategoryCodec::standard(), &InputBounds::default(), &input)
            .unwrap_err();
        assert!(matches!(err, Error::MissingField(ref name) if name == "Gender"));
    }

    #[test]
    fn test_builder_requires_every_feature() {
        let encoded = BTreeMap::new();
        let numeric = BTreeMap::from([(Feature::MonthlyIncome, 3000.0)]);
        let err = FeatureVectorBuilder.build(&encoded, &numeric).unwrap_err();
        assert!(matches!(err, Error::MissingField(ref name) if name == "Gender"));
    }

    #[test]
    fn test_zero_code_is_not_missing() {
        let input = sample_input()
            .with_label(Feature::Gender, "Female")
            .with_label(Feature::OverTime, "No");
        let record =
            encode_input(&CategoryCodec::standard(), &InputBounds::default(), &input).unwrap();
        assert_eq!(record.code(Feature::Gender), Some(0));
        assert_eq!(record.code(Feature::OverTime), Some(0));
        assert_eq!(record.code(Feature::MonthlyIncome), None);
    }

    #[test]
    fn test_income_bounds() {
        let codec = CategoryCodec::standard();
        let bounds = InputBounds::default();
        for income in [1009.0, 19999.0] {
            let input = sample_input().with_number(Feature::MonthlyIncome, income);
            assert!(encode_input(&codec, &bounds, &input).is_ok());
        }
        for income in [1008.0, 20000.0] {
            let input = sample_input().with_number(Feature::MonthlyIncome, income);
            let err = encode_input(&codec, &bounds, &input).unwrap_err();
            assert!(matches!(err, Error::OutOfRange { .. }));
        }
    }

    #[test]
    fn test_numeric_text_is_parsed() {
        let input = sample_input().with_label(Feature::YearsAtCompany, "12");
        let record =
            encode_input(&CategoryCodec::standard(), &InputBounds::default(), &input).unwrap();
        assert_eq!(record.get(Feature::YearsAtCompany), 12.0);

        let input = sample_input().with_label(Feature::YearsAtCompany, "a dozen");
        assert!(encode_input(&CategoryCodec::standard(), &InputBounds::default(), &input).is_err());
    }

    #[test]
    fn test_nan_passes_bounds() {
        let bounds = InputBounds::default();
        assert!(bounds.check(Feature::MonthlyIncome, f64::NAN).is_ok());
        assert!(bounds.check(Feature::Gender, -5.0).is_ok());
    }

    #[test]
    fn test_set_by_name() {
        let mut input = RawInput::new();
        input
            .set("OverTime", Answer::Label("Yes".to_string()))
            .unwrap();
        assert_eq!(
            input.get(Feature::OverTime),
            Some(&Answer::Label("Yes".to_string()))
        );
        assert!(input.set("Department", Answer::Number(1.0)).is_err());
    }
}
