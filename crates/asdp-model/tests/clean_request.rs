//! Wire shape of `/clean` requests.

use asdp_model::{
    CleanRequest, ConfigPatch, DatasetId, OutlierConfig, ProcessingConfig, WeightsConfig,
};

#[test]
fn test_default_request_snapshot() {
    let request = CleanRequest::new(&ProcessingConfig::default(), Some(DatasetId::from("ds1")));

    insta::assert_json_snapshot!(request, @r#"
    {
      "config": {
        "imputation": {
          "method": "mean",
          "columns": null
        },
        "outliers": {
          "detection_method": "iqr",
          "handling_method": "winsorize",
          "columns": null
        },
        "weights": {
          "column": null
        },
        "estimate_columns": null
      },
      "dataset_id": "ds1"
    }
    "#);
}

#[test]
fn test_edited_request_snapshot() {
    let mut config = ProcessingConfig::default();
    config.apply(ConfigPatch::outliers(OutlierConfig {
        columns: vec!["age".to_string(), "score".to_string()],
        ..Default::default()
    }));
    config.apply(ConfigPatch::weights(WeightsConfig {
        column: Some("  ".to_string()),
    }));
    let request = CleanRequest::new(&config, Some(DatasetId::from(12)));

    insta::assert_json_snapshot!(request, @r#"
    {
      "config": {
        "imputation": {
          "method": "mean",
          "columns": null
        },
        "outliers": {
          "detection_method": "iqr",
          "handling_method": "winsorize",
          "columns": [
            "age",
            "score"
          ]
        },
        "weights": {
          "column": null
        },
        "estimate_columns": null
      },
      "dataset_id": 12
    }
    "#);
}
