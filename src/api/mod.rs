use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    MonthlyRecord, SwpInput, SwpResult, WithdrawalSolveConfig, WithdrawalSolveResult,
    run_swp_projection, solve_sustainable_withdrawal,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DEFAULT_SOLVE_TOLERANCE: f64 = 0.01;
const DEFAULT_SOLVE_MAX_ITERATIONS: u32 = 64;

#[derive(Parser, Debug)]
#[command(
    name = "swp",
    about = "Systematic Withdrawal Plan calculator (lump sum + fixed monthly withdrawals + monthly interest accrual)"
)]
pub struct Cli {
    #[arg(long, help = "Invested principal at the start of the plan")]
    pub total_investment: f64,
    #[arg(long, help = "Fixed amount withdrawn at each monthly step")]
    pub monthly_withdrawal: f64,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Nominal annual interest rate in percent, e.g. 8"
    )]
    pub annual_rate: f64,
    #[arg(long, default_value_t = 10, help = "Number of years to project")]
    pub period_years: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    total_investment: Option<f64>,
    monthly_withdrawal: Option<f64>,
    annual_rate: Option<f64>,
    period_years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolvePayload {
    total_investment: Option<f64>,
    annual_rate: Option<f64>,
    period_years: Option<u32>,
    target_final_value: Option<f64>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    total_investment: f64,
    monthly_withdrawal: f64,
    annual_rate: f64,
    period_years: u32,
    months_executed: usize,
    final_value: f64,
    total_interest_earned: f64,
    total_withdrawn: f64,
    schedule: Vec<MonthlyRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveResponse {
    total_investment: f64,
    annual_rate: f64,
    period_years: u32,
    target_final_value: f64,
    solved_withdrawal: Option<f64>,
    achieved_final_value: Option<f64>,
    iterations_used: usize,
    converged: bool,
    feasible: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_inputs(cli: Cli) -> Result<SwpInput, String> {
    if !cli.total_investment.is_finite() || cli.total_investment <= 0.0 {
        return Err("--total-investment must be > 0".to_string());
    }

    if !cli.monthly_withdrawal.is_finite() || cli.monthly_withdrawal < 0.0 {
        return Err("--monthly-withdrawal must be >= 0".to_string());
    }

    if !cli.annual_rate.is_finite() || cli.annual_rate < 0.0 {
        return Err("--annual-rate must be >= 0".to_string());
    }

    if cli.period_years == 0 {
        return Err("--period-years must be >= 1".to_string());
    }

    Ok(SwpInput {
        total_investment: cli.total_investment,
        monthly_withdrawal: cli.monthly_withdrawal,
        annual_rate_percent: cli.annual_rate,
        period_years: cli.period_years,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/swp", get(swp_get_handler).post(swp_post_handler))
        .route(
            "/api/sustainable-withdrawal",
            get(solve_get_handler).post(solve_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("SWP HTTP API listening on http://{addr}");
    println!("SWP calculator at http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn swp_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    swp_handler_impl(payload)
}

async fn swp_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    swp_handler_impl(payload)
}

fn swp_handler_impl(payload: ProjectionPayload) -> Response {
    let inputs = match projection_request_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => {
            log::warn!("rejected projection request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match run_swp_projection(&inputs) {
        Ok(result) => json_response(StatusCode::OK, build_projection_response(&inputs, result)),
        Err(msg) => {
            log::warn!("rejected projection request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

async fn solve_get_handler(Query(payload): Query<SolvePayload>) -> Response {
    solve_handler_impl(payload)
}

async fn solve_post_handler(Json(payload): Json<SolvePayload>) -> Response {
    solve_handler_impl(payload)
}

fn solve_handler_impl(payload: SolvePayload) -> Response {
    let (inputs, config) = match solve_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            log::warn!("rejected solve request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match solve_sustainable_withdrawal(&inputs, config) {
        Ok(result) => json_response(StatusCode::OK, build_solve_response(&inputs, result)),
        Err(msg) => {
            log::warn!("rejected solve request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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
fn projection_request_from_json(json: &str) -> Result<SwpInput, String> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    projection_request_from_payload(payload)
}

#[cfg(test)]
fn solve_request_from_json(json: &str) -> Result<(SwpInput, WithdrawalSolveConfig), String> {
    let payload = serde_json::from_str::<SolvePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    solve_request_from_payload(payload)
}

fn projection_request_from_payload(payload: ProjectionPayload) -> Result<SwpInput, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.total_investment {
        cli.total_investment = v;
    }
    if let Some(v) = payload.monthly_withdrawal {
        cli.monthly_withdrawal = v;
    }
    if let Some(v) = payload.annual_rate {
        cli.annual_rate = v;
    }
    if let Some(v) = payload.period_years {
        cli.period_years = v;
    }

    build_inputs(cli)
}

fn solve_request_from_payload(
    payload: SolvePayload,
) -> Result<(SwpInput, WithdrawalSolveConfig), String> {
    let mut cli = default_cli_for_api();
    // The solver searches over the withdrawal, so the payload carries none.
    cli.monthly_withdrawal = 0.0;

    if let Some(v) = payload.total_investment {
        cli.total_investment = v;
    }
    if let Some(v) = payload.annual_rate {
        cli.annual_rate = v;
    }
    if let Some(v) = payload.period_years {
        cli.period_years = v;
    }

    let inputs = build_inputs(cli)?;
    let config = WithdrawalSolveConfig {
        target_final_value: payload.target_final_value.unwrap_or(0.0),
        search_min: payload.search_min.unwrap_or(0.0),
        search_max: payload.search_max.unwrap_or(inputs.total_investment),
        tolerance: payload.tolerance.unwrap_or(DEFAULT_SOLVE_TOLERANCE),
        max_iterations: payload
            .max_iterations
            .unwrap_or(DEFAULT_SOLVE_MAX_ITERATIONS),
    };

    Ok((inputs, config))
}

fn default_cli_for_api() -> Cli {
    Cli {
        total_investment: 100_000.0,
        monthly_withdrawal: 1_000.0,
        annual_rate: 8.0,
        period_years: 10,
    }
}

fn build_projection_response(inputs: &SwpInput, result: SwpResult) -> ProjectionResponse {
    ProjectionResponse {
        total_investment: inputs.total_investment,
        monthly_withdrawal: inputs.monthly_withdrawal,
        annual_rate: inputs.annual_rate_percent,
        period_years: inputs.period_years,
        months_executed: result.schedule.len(),
        final_value: result.final_value,
        total_interest_earned: result.total_interest_earned,
        total_withdrawn: result.total_withdrawn,
        schedule: result.schedule,
    }
}

fn build_solve_response(inputs: &SwpInput, result: WithdrawalSolveResult) -> SolveResponse {
    SolveResponse {
        total_investment: inputs.total_investment,
        annual_rate: inputs.annual_rate_percent,
        period_years: inputs.period_years,
        target_final_value: result.target_final_value,
        solved_withdrawal: result.solved_withdrawal,
        achieved_final_value: result.achieved_final_value,
        iterations_used: result.iterations.len(),
        converged: result.converged,
        feasible: result.feasible,
        message: result.message,
    }
}
