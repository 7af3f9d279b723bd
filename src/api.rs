use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{info, warn};

use crate::error::UpdateError;
use crate::response::{self, DynDnsToken, ResponseMode, UpdateReport};
use crate::updater::{AddressRequest, DnsRecordUpdater};

pub struct AppState {
    pub hostnames: Vec<String>,
    pub mode: ResponseMode,
    pub updater: DnsRecordUpdater,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/update", get(update_dns))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(access_log))
        .with_state(Arc::new(state))
}

async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let uri = request.uri();
    let path = match uri.query() {
        Some(q) => format!("{}?{}", uri.path(), q),
        None => uri.path().to_string(),
    };
    // Router firmware identifies itself here; useful when a box misbehaves.
    let user_agent = header_str(request.headers(), "user-agent")
        .unwrap_or("-")
        .to_string();
    let ip = client_ip(request.headers());

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let length = header_str(response.headers(), "content-length")
        .unwrap_or("-")
        .to_string();
    let duration = start.elapsed();

    info!(
        target: "access",
        "{} {} \"{}\" {} {} {} {:.3}ms",
        method, path, user_agent, ip, status, length, duration.as_secs_f64() * 1000.0
    );

    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn client_ip(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| header_str(headers, "x-real-ip").map(str::to_string))
        .unwrap_or_else(|| "-".to_string())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn update_dns(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AddressRequest>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Rejections still get answered in the configured response format.
    let query = query
        .map(|Query(query)| query)
        .map_err(|rejection| UpdateError::InvalidRequest(rejection.body_text()));

    let request = match read_request(query, &headers, &body) {
        Ok(request) => request.normalized(),
        Err(err) => {
            warn!("Update request rejected: {}", err);
            return match state.mode {
                ResponseMode::Json => {
                    let (status, report) = UpdateReport::rejected(&err);
                    (status, Json(report)).into_response()
                }
                ResponseMode::Dyndns => {
                    (StatusCode::OK, DynDnsToken::ServerError.as_str()).into_response()
                }
            };
        }
    };

    info!(
        "Received update request: ipv4={:?}, ipv6={:?}, ipv6lanprefix={:?}",
        request.ipv4, request.ipv6, request.ipv6_lan_prefix
    );

    match state.mode {
        ResponseMode::Json => {
            let (status, report) =
                response::structured(&state.updater, &state.hostnames, &request).await;
            info!(
                "DNS update finished: {} updated, {} failed",
                report.results.len(),
                report.errors.len()
            );
            (status, Json(report)).into_response()
        }
        ResponseMode::Dyndns => {
            let token = response::legacy(&state.updater, &state.hostnames, &request).await;
            info!("DNS update finished: {}", token.as_str());
            (StatusCode::OK, token.as_str()).into_response()
        }
    }
}

enum BodyFormat {
    Json,
    Form,
}

fn body_format(headers: &HeaderMap) -> Option<BodyFormat> {
    let content_type: mime::Mime = header_str(headers, header::CONTENT_TYPE.as_str())?
        .parse()
        .ok()?;
    if content_type.type_() != mime::APPLICATION {
        return None;
    }

    if content_type.subtype() == mime::JSON || content_type.suffix() == Some(mime::JSON) {
        Some(BodyFormat::Json)
    } else if content_type.subtype() == mime::WWW_FORM_URLENCODED {
        Some(BodyFormat::Form)
    } else {
        None
    }
}

/// A JSON or form body, when sent, replaces the query string.
fn read_request(
    query: Result<AddressRequest, UpdateError>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<AddressRequest, UpdateError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return query;
    }

    match body_format(headers) {
        Some(BodyFormat::Json) => serde_json::from_slice(body)
            .map_err(|e| UpdateError::InvalidRequest(format!("Invalid JSON body: {}", e))),
        Some(BodyFormat::Form) => serde_urlencoded::from_bytes(body)
            .map_err(|e| UpdateError::InvalidRequest(format!("Invalid form body: {}", e))),
        None => query,
    }
}
