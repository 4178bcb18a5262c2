use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate};
use sales_forecast::data::{CatalogEntry, SaleName, SalesData, SalesRecord};
use sales_forecast::features::encode_data;
use sales_forecast::forecast::{ForecastConfig, Forecaster};
use sales_forecast::models::BoosterParams;
use sales_forecast::PredictionService;
use std::sync::Arc;
use tower::ServiceExt;

const STORE: &str = "c8c368f0311ea25b581cb3c704fe3a70";
const PRODUCTS: [(&str, &str); 2] = [("3f1e7c", "Whole Milk 1L"), ("9a02bd", "Sourdough Loaf")];

fn sample_data() -> SalesData {
    let start = NaiveDate::from_ymd_opt(2023, 10, 1).unwrap();
    let mut data = SalesData::default();

    for (p, (sale_id, sale_name)) in PRODUCTS.into_iter().enumerate() {
        data.catalog.push(CatalogEntry {
            sale_id: sale_id.to_string(),
            sale_name: sale_name.to_string(),
            sub_family_name: "Staples".to_string(),
            family_name: "Grocery".to_string(),
        });
        data.sale_id_to_name.push(SaleName {
            sale_id: sale_id.to_string(),
            sale_name: sale_name.to_string(),
        });
        for offset in 0..92 {
            data.sales.push(SalesRecord {
                sale_date: start + Duration::days(offset),
                sale_id: sale_id.to_string(),
                store_id: STORE.to_string(),
                sale_amount: (4 + p as i64 * 3 + offset % 7) as f64,
            });
        }
    }
    data
}

fn app() -> Router {
    let data = sample_data();
    let (encoder, encoded) = encode_data(&data.sales).unwrap();
    let config = ForecastConfig {
        num_threads: 2,
        booster: BoosterParams {
            n_estimators: 10,
            ..BoosterParams::default()
        },
        ..ForecastConfig::default()
    };
    let forecaster = Forecaster::new(config).unwrap();
    let (train, _) = forecaster.split(&encoded);
    let model = forecaster.fit(encoder, &train).unwrap();

    sales_api::app(Arc::new(PredictionService::new(model, data).unwrap()))
}

fn predict_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_predict_known_product() {
    let response = app()
        .oneshot(predict_request(serde_json::json!({
            "store_id": STORE,
            "sale_date": "2023-12-10",
            "sale_id": PRODUCTS[1].0,
            "horizon": 5
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    let records = body[0].as_array().unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["sale_date"], "2023-12-10");
    assert_eq!(records[0]["store_id"], STORE);
    assert_eq!(body[1], PRODUCTS[1].1);
}

#[tokio::test]
async fn test_unknown_sale_id_is_not_found() {
    let response = app()
        .oneshot(predict_request(serde_json::json!({
            "store_id": STORE,
            "sale_date": "2023-12-10",
            "sale_id": "unknown",
            "horizon": 5
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("unknown"));
}

#[tokio::test]
async fn test_invalid_requests() {
    let app = app();

    let bad_horizon = predict_request(serde_json::json!({
        "store_id": STORE,
        "sale_date": "2023-12-10",
        "sale_id": PRODUCTS[0].0,
        "horizon": 0
    }));
    let response = app.clone().oneshot(bad_horizon).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("horizon"));

    let bad_date = predict_request(serde_json::json!({
        "store_id": STORE,
        "sale_date": "December 10th",
        "sale_id": PRODUCTS[0].0,
        "horizon": 3
    }));
    let response = app.clone().oneshot(bad_date).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing_field = predict_request(serde_json::json!({ "store_id": STORE }));
    let response = app.oneshot(missing_field).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_huge_horizon_is_rejected() {
    let app = app();

    let response = app
        .clone()
        .oneshot(predict_request(serde_json::json!({
            "store_id": STORE,
            "sale_date": "2023-12-10",
            "sale_id": PRODUCTS[0].0,
            "horizon": 1_000_000_000_000_i64
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("horizon"));

    // The service keeps answering afterwards
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
