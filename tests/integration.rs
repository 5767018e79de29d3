//! Integration tests for the attrition pipeline

use attrition::{
    load_answers_csv, write_results_csv, Attrition, Error, Feature, PipelineConfig,
    PredictionContext, RawInput,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Two trees: overtime, then tenure and income
const MODEL_JSON: &str = r#"{
  "n_features": 16,
  "learning_rate": 1.0,
  "init_score": -0.5,
  "trees": [
    {"nodes": [
      {"feature": 3, "threshold": 0.5, "left": 1, "right": 2},
      {"value": -1.0},
      {"value": 1.5}
    ]},
    {"nodes": [
      {"feature": 8, "threshold": 2.5, "left": 1, "right": 4},
      {"feature": 2, "threshold": 3000.0, "left": 2, "right": 3},
      {"value": 1.2},
      {"value": 0.2},
      {"value": -1.4}
    ]}
  ]
}"#;

const COLUMNS: [&str; 16] = [
    "Gender",
    "JobLevel",
    "MonthlyIncome",
    "OverTime",
    "WorkLifeBalance",
    "JobSatisfaction",
    "EnvironmentSatisfaction",
    "TrainingTimesLastYear",
    "YearsAtCompany",
    "Age_Profile_1",
    "Age_Profile_2",
    "Age_Profile_3",
    "Age_Profile_4",
    "BusinessTravel_1",
    "BusinessTravel_2",
    "BusinessTravel_3",
];

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

/// Manifest in the shape pandas writes a Series: an unnamed index plus column `0`
fn create_manifest(columns: &[&str]) -> NamedTempFile {
    let mut contents = String::from(",0\n");
    for (idx, column) in columns.iter().enumerate() {
        contents.push_str(&format!("{idx},{column}\n"));
    }
    write_temp(&contents)
}

struct Fixture {
    _model: NamedTempFile,
    _columns: NamedTempFile,
    config: PipelineConfig,
}

fn fixture_with_columns(columns: &[&str], model_json: &str) -> Fixture {
    let model = write_temp(model_json);
    let manifest = create_manifest(columns);
    let config = PipelineConfig {
        model_path: model.path().to_path_buf(),
        columns_path: manifest.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    Fixture {
        _model: model,
        _columns: manifest,
        config,
    }
}

fn fixture() -> Fixture {
    fixture_with_columns(&COLUMNS, MODEL_JSON)
}

fn scenario_input() -> RawInput {
    RawInput::new()
        .with_label(Feature::Gender, "Male")
        .with_label(Feature::AgeProfile, "Adult (26-44)")
        .with_label(Feature::JobLevel, "Entry-Level")
        .with_number(Feature::MonthlyIncome, 2500.0)
        .with_label(Feature::BusinessTravel, "Rarely")
        .with_label(Feature::OverTime, "Yes")
        .with_label(Feature::WorkLifeBalance, "Bad")
        .with_label(Feature::TrainingTimesLastYear, "None")
        .with_number(Feature::YearsAtCompany, 1.0)
        .with_label(Feature::JobSatisfaction, "Low")
        .with_label(Feature::EnvironmentSatisfaction, "Low")
}

#[test]
fn test_end_to_end_prediction() {
    let fixture = fixture();
    let context = PredictionContext::load(&fixture.config).unwrap();

    assert_eq!(context.columns().len(), 16);
    assert!(context.schema_report().is_consistent());

    let vector = context.prepare(&scenario_input()).unwrap();
    assert_eq!(vector.columns(), context.columns().names());
    assert_eq!(
        vector.values().to_vec(),
        vec![1.0, 1.0, 2500.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
    );

    let outcome = context.predict(&scenario_input()).unwrap();
    assert_eq!(outcome.label, Attrition::Leave);
    // -0.5 + 1.5 + 1.2
    let expected = 1.0 / (1.0 + (-2.2f64).exp());
    assert!((outcome.probability - expected).abs() < 1e-12);
}

#[test]
fn test_regression_fixture_encoding() {
    let fixture = fixture();
    let context = PredictionContext::load(&fixture.config).unwrap();
    let record = context.encode(&scenario_input()).unwrap();

    let encoded: Vec<(&str, f64)> = record
        .iter()
        .map(|(feature, value)| (feature.name(), value))
        .collect();
    assert_eq!(
        encoded,
        vec![
            ("Gender", 1.0),
            ("Age_Profile", 2.0),
            ("JobLevel", 1.0),
            ("MonthlyIncome", 2500.0),
            ("BusinessTravel", 1.0),
            ("OverTime", 1.0),
            ("WorkLifeBalance", 1.0),
            ("JobSatisfaction", 1.0),
            ("EnvironmentSatisfaction", 1.0),
            ("TrainingTimesLastYear", 0.0),
            ("YearsAtCompany", 1.0),
        ]
    );
}

#[test]
fn test_context_shared_across_threads() {
    let fixture = fixture();
    let context = PredictionContext::load(&fixture.config).unwrap();
    let expected = context.predict(&scenario_input()).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| context.predict(&scenario_input()).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_missing_artifacts_are_fatal() {
    let config = PipelineConfig {
        model_path: "/nonexistent/model.json".into(),
        columns_path: "/nonexistent/training_cols.csv".into(),
        ..PipelineConfig::default()
    };
    let err = PredictionContext::load(&config).unwrap_err();
    assert!(matches!(err, Error::ModelLoad(_)));
    assert!(!err.is_validation());
}

#[test]
fn test_manifest_and_model_width_disagree() {
    let fixture = fixture_with_columns(&COLUMNS[..10], MODEL_JSON);
    assert!(matches!(
        PredictionContext::load(&fixture.config),
        Err(Error::ModelLoad(_))
    ));
}

#[test]
fn test_schema_drift_is_reported_not_fatal() {
    let mut columns = COLUMNS.to_vec();
    columns[15] = "DistanceFromHome";
    let fixture = fixture_with_columns(&columns, MODEL_JSON);

    let context = PredictionContext::load(&fixture.config).unwrap();
    let report = context.schema_report();
    assert_eq!(report.unreachable, vec!["DistanceFromHome".to_string()]);
    assert_eq!(report.unused, vec!["BusinessTravel_3".to_string()]);

    let input = scenario_input().with_label(Feature::BusinessTravel, "Non-Travel");
    let vector = context.prepare(&input).unwrap();
    assert_eq!(vector.get("DistanceFromHome"), Some(0.0));
    assert_eq!(vector.len(), 16);
    assert!(context.predict(&input).is_ok());
}

#[test]
fn test_validation_errors() {
    let fixture = fixture();
    let context = PredictionContext::load(&fixture.config).unwrap();

    let mut missing = scenario_input();
    missing.remove(Feature::Gender);
    assert!(matches!(
        context.predict(&missing),
        Err(Error::MissingField(ref field)) if field == "Gender"
    ));

    let bad_label = scenario_input().with_label(Feature::WorkLifeBalance, "Excellent");
    assert!(matches!(
        context.predict(&bad_label),
        Err(Error::InvalidCategoryLabel { .. })
    ));

    let too_long = scenario_input().with_number(Feature::YearsAtCompany, 41.0);
    assert!(matches!(
        context.predict(&too_long),
        Err(Error::OutOfRange { .. })
    ));
}

#[test]
fn test_batch_csv_round() {
    let fixture = fixture();
    let context = PredictionContext::load(&fixture.config).unwrap();

    let answers = write_temp(
        "Gender,Age_Profile,JobLevel,MonthlyIncome,BusinessTravel,OverTime,WorkLifeBalance,\
         JobSatisfaction,EnvironmentSatisfaction,TrainingTimesLastYear,YearsAtCompany\n\
         Male,Adult (26-44),Entry-Level,2500,Rarely,Yes,Bad,Low,Low,None,1\n\
         Female,Middle-age (45-59),Senior,12000,Non-Travel,No,Best,Very High,High,3-4,15\n\
         ,Adult (26-44),Junior,3000,Rarely,Yes,Good,Medium,Low,1-2,2\n",
    );
    let inputs = load_answers_csv(answers.path()).unwrap();
    assert_eq!(inputs.len(), 3);

    let results = context.predict_batch(&inputs);
    assert_eq!(results[0].as_ref().unwrap().label, Attrition::Leave);
    assert_eq!(results[1].as_ref().unwrap().label, Attrition::Stay);
    assert!(matches!(results[2], Err(Error::MissingField(_))));

    let output = NamedTempFile::new().unwrap();
    write_results_csv(output.path(), &results).unwrap();
    let written = std::fs::read_to_string(output.path()).unwrap();
    assert_eq!(written.lines().count(), 4);
}

#[test]
fn test_reference_medians_from_manifest() {
    let mut contents = String::from("0,median\n");
    for column in COLUMNS {
        let median = if column == "MonthlyIncome" { 4919.0 } else { 0.0 };
        contents.push_str(&format!("{column},{median}\n"));
    }
    let manifest = write_temp(&contents);
    let model = write_temp(MODEL_JSON);
    let config = PipelineConfig {
        model_path: model.path().to_path_buf(),
        columns_path: manifest.path().to_path_buf(),
        ..PipelineConfig::default()
    };

    let context = PredictionContext::load(&config).unwrap();
    let input = scenario_input().with_number(Feature::MonthlyIncome, f64::NAN);
    let vector = context.prepare(&input).unwrap();
    assert_eq!(vector.get("MonthlyIncome"), Some(4919.0));
}
