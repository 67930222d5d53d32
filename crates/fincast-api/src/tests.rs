//! Router tests against an in-memory SQLite store.

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use fincast_model::ForecastDefaults;
use fincast_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, api_router};

fn rows() -> Value {
  json!([
    {"record_type": "observation", "record_id": "REC_0001", "indicator_code": "ACC_OWNERSHIP",
     "observation_date": "2021-12-31", "value_numeric": 46, "location": "national", "gender": "all"},
    {"record_type": "observation", "record_id": "REC_0002", "indicator_code": "ACC_OWNERSHIP",
     "observation_date": "2024-11-29", "value_numeric": "48", "location": "national", "gender": "all"},
    {"record_type": "event", "record_id": "EVT_0001", "observation_date": "2024-07-01",
     "category": "product_launch", "indicator": "M-Pesa launch"},
    {"record_type": "impact_link", "parent_id": "EVT_0001", "related_indicator": "ACC_OWNERSHIP",
     "impact_estimate": 5, "impact_direction": "increase", "lag_months": 6},
    {"record_type": "target", "indicator_code": "ACC_OWNERSHIP",
     "observation_date": "2025-12-31", "value_numeric": 60},
    {"record_type": "impact_link", "lag_months": 3}
  ])
}

async fn state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(store, ForecastDefaults::default())
}

async fn send(
  state: AppState<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(b) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(b.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = api_router(state).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

async fn seeded() -> AppState<SqliteStore> {
  let s = state().await;
  let (status, _) = send(s.clone(), "POST", "/records", Some(rows())).await;
  assert_eq!(status, StatusCode::CREATED);
  s
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_stores_valid_rows_and_reports_rejects() {
  let s = state().await;
  let (status, body) = send(s.clone(), "POST", "/records", Some(rows())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["inserted"], 5);
  assert_eq!(body["rejected"][0]["row"], 6);
  assert!(
    body["rejected"][0]["error"]
      .as_str()
      .unwrap()
      .contains("parent_id")
  );

  let (_, counts) = send(s, "GET", "/records/counts", None).await;
  assert_eq!(counts["observation"], 2);
  assert_eq!(counts["impact_link"], 1);
}

#[tokio::test]
async fn list_filters_by_type() {
  let s = seeded().await;
  let (status, body) = send(s, "GET", "/records?record_type=event", None).await;
  assert_eq!(status, StatusCode::OK);
  let list = body.as_array().unwrap();
  assert_eq!(list.len(), 1);
  assert_eq!(list[0]["record_type"], "event");
  assert_eq!(list[0]["data"]["record_id"], "EVT_0001");
}

// ─── Forecasts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn forecast_applies_events_and_reports_target_gap() {
  let s = seeded().await;
  let (status, body) = send(s, "GET", "/forecast/ACC_OWNERSHIP?method=last&ci=false", None).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["indicator_code"], "ACC_OWNERSHIP");

  let rows = body["rows"].as_array().unwrap();
  assert_eq!(rows.len(), 3);
  assert_eq!(rows[0]["year"], 2025);
  assert_eq!(rows[0]["value_baseline"], 48.0);
  assert_eq!(rows[0]["value_adjusted"], 53.0);
  assert!(rows[0].get("ci_lower").is_none());
  assert_eq!(rows[1]["value_adjusted"], 48.0);

  assert_eq!(body["targets"]["2025"]["target"], 60.0);
  assert_eq!(body["targets"]["2025"]["gap"], 7.0);
}

#[tokio::test]
async fn forecast_without_history_is_null_not_an_error() {
  let s = seeded().await;
  let (status, body) = send(s, "GET", "/forecast/USG_DIGITAL_PAY?years=2026", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["history_points"], 0);
  assert!(body["rows"][0]["value_baseline"].is_null());
}

#[tokio::test]
async fn forecast_rejects_bad_parameters() {
  let s = seeded().await;
  for uri in [
    "/forecast/ACC_OWNERSHIP?years=1800",
    "/forecast/ACC_OWNERSHIP?years=2025,soon",
    "/forecast/ACC_OWNERSHIP?method=spline",
    "/forecast/ACC_OWNERSHIP?confidence=1.5",
  ] {
    let (status, body) = send(s.clone(), "GET", uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    assert!(body["error"].is_string());
  }
}

#[tokio::test]
async fn forecast_on_empty_store_is_a_bad_request() {
  let (status, body) = send(state().await, "GET", "/forecast/ACC_OWNERSHIP", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn access_usage_pairs_both_forecasts() {
  let s = seeded().await;
  let (status, body) = send(s, "GET", "/access-usage?method=last&years=2025", None).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["access"]["rows"][0]["value_adjusted"], 53.0);
  assert_eq!(body["usage"]["indicator_code"], "USG_DIGITAL_PAY");
  assert_eq!(body["usage"]["history_code"], "USG_ACTIVE_RATE");
}

#[tokio::test]
async fn access_usage_with_other_usage_code_skips_fallback() {
  let s = seeded().await;
  let (status, body) =
    send(s, "GET", "/access-usage?usage=USG_MOBILE_MONEY&method=last&years=2025", None).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["usage"]["history_code"], "USG_MOBILE_MONEY");
  assert_eq!(body["usage"]["rows"][0]["value_baseline"], Value::Null);
}

#[tokio::test]
async fn series_returns_points_and_annual_means() {
  let s = seeded().await;
  let (_, body) = send(s, "GET", "/series/ACC_OWNERSHIP?location=national", None).await;
  assert_eq!(body["points"].as_array().unwrap().len(), 2);
  assert_eq!(body["annual"]["2024"], 48.0);
}

// ─── Analysis ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn impact_matrix_has_stable_columns() {
  let (_, body) = send(state().await, "GET", "/impact-matrix", None).await;
  assert_eq!(body["columns"].as_array().unwrap().len(), 6);
  assert!(body["rows"].as_array().unwrap().is_empty());

  let (_, body) = send(seeded().await, "GET", "/impact-matrix", None).await;
  assert_eq!(body["rows"][0]["event_id"], "EVT_0001");
  assert_eq!(body["rows"][0]["lag_months"], 6);
}

#[tokio::test]
async fn associations_use_event_labels() {
  let s = seeded().await;
  let (status, body) =
    send(s, "GET", "/associations?indicators=ACC_OWNERSHIP,USG_DIGITAL_PAY", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["indicators"], json!(["ACC_OWNERSHIP", "USG_DIGITAL_PAY"]));
  assert_eq!(body["rows"][0]["label"], "M-Pesa launch");
  assert_eq!(body["rows"][0]["effects"], json!([5.0, null]));
}

#[tokio::test]
async fn associations_reject_unknown_aggregate() {
  let (status, _) = send(seeded().await, "GET", "/associations?aggregate=mean", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overview_endpoints() {
  let s = seeded().await;

  let (_, indicators) = send(s.clone(), "GET", "/indicators", None).await;
  assert_eq!(indicators, json!(["ACC_OWNERSHIP"]));

  let (_, events) = send(s.clone(), "GET", "/events", None).await;
  assert_eq!(events[0]["name"], "M-Pesa launch");

  let (_, summary) = send(s.clone(), "GET", "/explore", None).await;
  assert_eq!(summary["years_present"], json!([2021, 2024]));

  let (_, coverage) = send(s, "GET", "/coverage", None).await;
  assert_eq!(coverage["links"]["parent_id_links_valid"], true);
  assert_eq!(coverage["temporal_coverage"]["ACC_OWNERSHIP"], json!([2021, 2024]));
}
