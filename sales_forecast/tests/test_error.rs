use sales_forecast::error::ForecastError;
use sales_forecast::service::ServiceError;
use sales_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    // Test IO error conversion
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    // Test JSON error conversion
    let json_error = serde_json::from_str::<u32>("not json").unwrap_err();
    let forecast_error = ForecastError::from(json_error);
    assert!(matches!(forecast_error, ForecastError::FormatError(_)));
}

#[test]
fn test_math_error_mapping() {
    let unit = ForecastError::from(MathError::UnsupportedUnit("year".to_string()));
    assert!(matches!(unit, ForecastError::ConfigError(_)));
    assert!(unit.to_string().contains("Cyclical encoding is not available for year"));

    let data = ForecastError::from(MathError::InsufficientData("empty window".to_string()));
    assert!(matches!(data, ForecastError::DataError(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::EncodingError("Unseen label 'x'".to_string());
    assert!(error.to_string().contains("Unseen label 'x'"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = ForecastError::from(io_error).to_string();

    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_service_error_from_forecast_error() {
    let error = ServiceError::from(ForecastError::ModelError("not fitted".to_string()));

    match error {
        ServiceError::Internal(msg) => assert!(msg.contains("not fitted")),
        other => panic!("Expected Internal, got {:?}", other),
    }
}
