use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    BatchResult, SimulationParameters, run_batch, validate_simulation_count,
};
use crate::viewer::{INVALID_FILE_MESSAGE, ViewerEntry, ViewerSession, ViewerState};

const DEFAULT_SIMULATIONS: u32 = 1_000;
const DEFAULT_SEED: u64 = 42;
// Every balance of every trajectory goes into the response body.
const MAX_RESPONSE_BALANCES: u64 = 2_000_000;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    annual_spend: Option<f64>,
    inflation_rate: Option<f64>,
    inflation_change: Option<f64>,
    savings_balance: Option<f64>,
    interest_rate: Option<f64>,
    interest_change: Option<f64>,
    num_years: Option<u32>,
    simulations: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
struct ApiRequest {
    params: SimulationParameters,
    simulations: u32,
    seed: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    seed: u64,
    #[serde(flatten)]
    batch: BatchResult,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
enum SummarizeResponse {
    Empty,
    Loaded { simulations: Vec<ViewerEntry> },
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/summarize", post(summarize_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("fisim HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let seed = request.seed;
    let outcome = tokio::task::spawn_blocking(move || {
        run_batch(&request.params, request.simulations, request.seed)
    })
    .await;

    match outcome {
        Ok(Ok(batch)) => json_response(StatusCode::OK, SimulateResponse { seed, batch }),
        Ok(Err(e)) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            warn!("simulation task failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

async fn summarize_handler(body: String) -> Response {
    let mut session = ViewerSession::new();
    match session.load_str(&body) {
        ViewerState::Empty | ViewerState::NoData => {
            json_response(StatusCode::OK, SummarizeResponse::Empty)
        }
        ViewerState::Invalid => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, INVALID_FILE_MESSAGE)
        }
        ViewerState::Loaded { entries, .. } => json_response(
            StatusCode::OK,
            SummarizeResponse::Loaded {
                simulations: entries.clone(),
            },
        ),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let params = SimulationParameters {
        annual_spend: payload.annual_spend.unwrap_or(40_000.0),
        inflation_rate: payload.inflation_rate.unwrap_or(0.02),
        interest_rate: payload.interest_rate.unwrap_or(0.04),
        savings_balance: payload.savings_balance.unwrap_or(1_000_000.0),
        num_years: payload.num_years.unwrap_or(30),
        inflation_change: payload.inflation_change.unwrap_or(0.0025),
        interest_change: payload.interest_change.unwrap_or(0.01),
    };
    params.validate().map_err(|e| e.to_string())?;

    let simulations = payload.simulations.unwrap_or(DEFAULT_SIMULATIONS);
    validate_simulation_count(simulations).map_err(|e| e.to_string())?;
    if params.num_years as u64 * simulations as u64 > MAX_RESPONSE_BALANCES {
        return Err(format!(
            "numYears x simulations must not exceed {MAX_RESPONSE_BALANCES}"
        ));
    }

    Ok(ApiRequest {
        params,
        simulations,
        seed: payload.seed.unwrap_or(DEFAULT_SEED),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be json")
    }

    #[test]
    fn api_request_defaults_fill_missing_fields() {
        let request = api_request_from_json("{}").expect("defaults are valid");
        assert_eq!(request.simulations, 1_000);
        assert_eq!(request.seed, 42);
        assert_eq!(request.params.num_years, 30);
        assert_eq!(request.params.annual_spend, 40_000.0);
    }

    #[test]
    fn api_request_parses_camel_case_keys() {
        let request = api_request_from_json(
            r#"{"annualSpend": 25000, "inflationRate": 0.03, "savingsBalance": -100,
                "numYears": 5, "simulations": 7, "seed": 9, "interestChange": 0}"#,
        )
        .expect("valid payload");
        assert_eq!(request.params.annual_spend, 25_000.0);
        assert_eq!(request.params.inflation_rate, 0.03);
        assert_eq!(request.params.savings_balance, -100.0);
        assert_eq!(request.params.num_years, 5);
        assert_eq!(request.params.interest_change, 0.0);
        assert_eq!(request.simulations, 7);
        assert_eq!(request.seed, 9);
    }

    #[test]
    fn api_request_rejects_out_of_range_values() {
        let err = api_request_from_json(r#"{"numYears": 0}"#).expect_err("zero years");
        assert!(err.contains("number of years"));

        let err = api_request_from_json(r#"{"simulations": 10000}"#).expect_err("too many");
        assert!(err.contains("number of simulations"));

        let err = api_request_from_json(r#"{"interestChange": -0.1}"#).expect_err("negative");
        assert!(err.contains("interest change"));

        let err = api_request_from_json(r#"{"numYears": 9999, "simulations": 9999}"#)
            .expect_err("response too large");
        assert!(err.contains("must not exceed 2000000"));

        let request = api_request_from_json(r#"{"numYears": 200, "simulations": 9999}"#)
            .expect("within the response cap");
        assert_eq!(request.simulations, 9999);

        let err = api_request_from_json(r#"{"annualSpend": "lots"}"#).expect_err("bad json");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[tokio::test]
    async fn simulate_handler_returns_batch_json() {
        let payload = SimulatePayload {
            num_years: Some(3),
            simulations: Some(4),
            inflation_change: Some(0.0),
            interest_change: Some(0.0),
            ..SimulatePayload::default()
        };
        let response = simulate_handler_impl(payload).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        let json = body_json(response).await;
        assert_eq!(json["seed"], 42);
        assert_eq!(json["successCount"], 4);
        assert_eq!(json["totalRuns"], 4);
        assert_eq!(json["successPercent"], 100.0);
        let trajectories = json["trajectories"].as_array().expect("array");
        assert_eq!(trajectories.len(), 4);
        assert_eq!(trajectories[0]["outcome"], "successful");
        let first = trajectories[0]["balances"][0].as_f64().expect("number");
        assert!((first - 997_568.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn simulate_handler_rejects_invalid_payload() {
        let payload = SimulatePayload {
            simulations: Some(0),
            ..SimulatePayload::default()
        };
        let response = simulate_handler_impl(payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().expect("message").contains("simulations"));
    }

    #[tokio::test]
    async fn summarize_handler_reports_each_state() {
        let response = summarize_handler(String::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["state"], "empty");

        let response = summarize_handler("1.00 abc successful\n".to_string()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "Invalid file...");

        let response =
            summarize_handler("1.00 3.00 successful\n-2.00 -4.00 unsuccessful\n".to_string())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["state"], "loaded");
        let sims = json["simulations"].as_array().expect("array");
        assert_eq!(sims.len(), 2);
        assert_eq!(sims[0]["label"], "Simulation #001");
        assert_eq!(sims[0]["maximum"], 3.0);
        assert_eq!(sims[1]["minimum"], -4.0);
        assert_eq!(sims[1]["average"], -3.0);
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
