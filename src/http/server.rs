//! HTTP server setup and the gateway pipeline.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (tracing, request ID,
//!   security headers, CORS, panic recovery)
//! - Run the request pipeline: general limiter → route limiter → auth →
//!   rewrite + forward
//! - Serve the health endpoint outside the pipeline
//! - Synthesize 502/504 when an upstream is unreachable or slow
//!
//! # Pipeline Order
//! The order is load-bearing: auth runs after the limiters so brute-force
//! traffic is throttled before signature checks, and the auth service's own
//! routes skip verification so a first token can be issued at all.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{CorsConfig, GatewayConfig};
use crate::http::request::{request_id, RequestIdLayer, X_REQUEST_ID};
use crate::http::response::{
    bad_gateway, classify_upstream_error, error_response, gateway_timeout, internal_error,
    route_not_found,
};
use crate::observability::metrics;
use crate::routing::{LimiterClass, RouteTable, ServiceRoute};
use crate::security::headers::{client_ip, security_headers_middleware};
use crate::security::rate_limit::{apply_rate_limit_headers, RateLimitDecision};
use crate::security::{AuthVerifier, FixedWindowLimiter};

/// Application state injected into the gateway handler.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub verifier: Arc<AuthVerifier>,
    pub general_limiter: Arc<FixedWindowLimiter>,
    pub auth_limiter: Arc<FixedWindowLimiter>,
    pub upload_limiter: Arc<FixedWindowLimiter>,
    pub client: Client<HttpConnector, Body>,
    pub trust_proxy: bool,
    pub upstream_timeout: Duration,
}

impl AppState {
    fn limiter_for(&self, class: LimiterClass) -> &FixedWindowLimiter {
        match class {
            LimiterClass::Auth => &self.auth_limiter,
            LimiterClass::Upload => &self.upload_limiter,
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    routes: Arc<RouteTable>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let routes = Arc::new(RouteTable::from_services(&config.services));

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            routes: routes.clone(),
            verifier: Arc::new(AuthVerifier::new(config.auth.jwt_secret.as_bytes())),
            general_limiter: Arc::new(FixedWindowLimiter::new(
                "general",
                &config.rate_limit.general,
            )),
            auth_limiter: Arc::new(FixedWindowLimiter::new("auth", &config.rate_limit.auth)),
            upload_limiter: Arc::new(FixedWindowLimiter::new("upload", &config.rate_limit.upload)),
            client,
            trust_proxy: config.listener.trust_proxy,
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `/health` sits outside the proxied sub-router so CORS, limiters, and
    /// auth never touch it; security headers wrap everything, once.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let proxied = Router::new()
            .fallback(gateway_handler)
            .layer(cors_layer(&config.cors))
            .with_state(state);

        Router::new()
            .route("/health", get(health_handler))
            .merge(proxied)
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The route table, for startup logging.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    service: &'static str,
}

/// Health endpoint. Fixed payload, no dependency on downstream services.
async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        service: "api-gateway",
    })
}

/// Main gateway handler: the ordered pipeline for every proxied request.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let path = request.uri().path().to_string();
    let method = request.method().to_string();
    let ip = client_ip(request.headers(), peer, state.trust_proxy);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        client = %ip,
        "Gateway request"
    );

    // Decisions accumulate so rate-limit headers reach every response,
    // allowed or rejected.
    let mut decisions: Vec<RateLimitDecision> = Vec::new();

    // 1. General limiter, all routes.
    if let Some(decision) = state.general_limiter.evaluate(ip, &path) {
        let allowed = decision.allowed;
        decisions.push(decision);
        if !allowed {
            tracing::warn!(client = %ip, path = %path, "General rate limit exceeded");
            metrics::record_rate_limited("general");
            metrics::record_request(&method, 429, "none", start_time);
            let response = error_response(
                StatusCode::TOO_MANY_REQUESTS,
                state.general_limiter.message(),
            );
            return finalize(response, &decisions);
        }
    }

    // 2. Route lookup.
    let Some(route) = state.routes.match_path(&path) else {
        tracing::debug!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request(&method, 404, "none", start_time);
        return finalize(route_not_found(), &decisions);
    };

    // 3. Route-specific limiter, if the route declares one.
    if let Some(class) = route.limiter {
        let limiter = state.limiter_for(class);
        if let Some(decision) = limiter.evaluate(ip, &path) {
            let allowed = decision.allowed;
            decisions.push(decision);
            if !allowed {
                tracing::warn!(
                    client = %ip,
                    path = %path,
                    limiter = limiter.name(),
                    "Rate limit exceeded"
                );
                metrics::record_rate_limited(limiter.name());
                metrics::record_request(&method, 429, route.name, start_time);
                let response =
                    error_response(StatusCode::TOO_MANY_REQUESTS, limiter.message());
                return finalize(response, &decisions);
            }
        }
    }

    // 4. Token verification. The auth service's own routes are exempt.
    if route.auth_required {
        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        match state.verifier.verify(authorization) {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
            }
            Err(err) => {
                tracing::debug!(request_id = %request_id, path = %path, error = %err, "Rejected token");
                metrics::record_request(&method, 401, route.name, start_time);
                return finalize(error_response(err.status(), &err.to_string()), &decisions);
            }
        }
    }

    // 5. Rewrite and forward.
    let response = forward(&state, route, request, &request_id).await;
    metrics::record_request(&method, response.status().as_u16(), route.name, start_time);
    finalize(response, &decisions)
}

/// Forward a request to the route's upstream. One attempt, no retries.
async fn forward(
    state: &AppState,
    route: &ServiceRoute,
    request: Request<Body>,
    request_id: &str,
) -> Response {
    let (parts, body) = request.into_parts();

    let rewritten = route.rewrite_path(parts.uri.path());
    let uri = match route.upstream_uri(&rewritten, parts.uri.query()) {
        Ok(uri) => uri,
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                service = route.name,
                error = %err,
                "Upstream URI construction failed"
            );
            return internal_error();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        service = route.name,
        upstream_uri = %uri,
        "Forwarding request"
    );

    let mut builder = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .version(parts.version);
    if let Some(headers) = builder.headers_mut() {
        for (key, value) in parts.headers.iter() {
            headers.insert(key.clone(), value.clone());
        }
        // The upstream authority replaces the original host.
        headers.remove(header::HOST);
        if let Ok(value) = HeaderValue::from_str(request_id) {
            headers.insert(&X_REQUEST_ID, value);
        }
    }
    let upstream_request = match builder.body(body) {
        Ok(request) => request,
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "Upstream request build failed");
            return internal_error();
        }
    };

    match tokio::time::timeout(state.upstream_timeout, state.client.request(upstream_request)).await
    {
        Ok(Ok(response)) => {
            // Relay the upstream response verbatim, 4xx/5xx included.
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Ok(Err(err)) => {
            tracing::error!(
                request_id = %request_id,
                service = route.name,
                error = %err,
                "Upstream request failed"
            );
            match classify_upstream_error(&err) {
                StatusCode::GATEWAY_TIMEOUT => gateway_timeout(),
                _ => bad_gateway(),
            }
        }
        Err(_) => {
            tracing::error!(
                request_id = %request_id,
                service = route.name,
                timeout_secs = state.upstream_timeout.as_secs(),
                "Upstream exceeded time budget"
            );
            gateway_timeout()
        }
    }
}

/// Attach accumulated rate-limit headers; later limiters win on conflict.
fn finalize(mut response: Response, decisions: &[RateLimitDecision]) -> Response {
    for decision in decisions {
        apply_rate_limit_headers(response.headers_mut(), decision);
    }
    response
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origin == "*" {
        AllowOrigin::any()
    } else {
        match config.allowed_origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(
                    origin = %config.allowed_origin,
                    "Unparseable CORS origin, falling back to any"
                );
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Convert a pipeline panic into a generic 500. Detail stays in the log.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Request pipeline panicked");
    internal_error()
}
