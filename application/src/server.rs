//! HTTP server definitions.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    extract::MatchedPath,
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Extension, Json, Router,
};
use axum_client_ip::InsecureClientIp;
use derive_more::Debug;
use juniper::{
    http::GraphQLBatchResponse, DefaultScalarValue, EmptySubscription,
    ScalarValue,
};
use juniper_axum::extract::JuniperRequest;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;

use crate::{api, config, Context, Service};

/// Path the GraphQL API is served on.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Builds the [`Router`] serving the GraphQL API of the provided [`Service`].
///
/// # Errors
///
/// If any of the configured [CORS] origins is not a valid header value.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
pub fn router(
    service: Service,
    cors: &config::Cors,
) -> Result<Router, http::header::InvalidHeaderValue> {
    let schema =
        api::Schema::new(api::Query, api::Mutation, EmptySubscription::new());

    Ok(Router::new()
        .route(
            GRAPHQL_PATH,
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors_layer(cors)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(record_response),
        ))
}

/// Builds a [`CorsLayer`] allowing the configured origins.
///
/// A `*` origin allows any.
fn cors_layer(
    cors: &config::Cors,
) -> Result<CorsLayer, http::header::InvalidHeaderValue> {
    let origin = if cors.origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cors.origins
                .iter()
                .map(|o| o.parse::<http::HeaderValue>())
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_origin(origin))
}

/// Creates a [`tracing::Span`] of the provided HTTP request.
fn request_span(r: &http::Request<Body>) -> tracing::Span {
    log::info_span!(
        "HTTP request",
        http.client_ip = InsecureClientIp::from(r.headers(), r.extensions())
            .map(|ip| ip.0.to_string())
            .ok(),
        http.flavor = ?r.version(),
        http.method = r.method().as_str(),
        http.route = r
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str),
        http.target = r
            .uri()
            .path_and_query()
            .map(http::uri::PathAndQuery::as_str),
        http.user_agent = r
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok()),
        http.status_code = tracing::field::Empty,
    )
}

/// Records the status code and duration of the provided HTTP response.
fn record_response(
    r: &http::Response<Body>,
    dur: Duration,
    span: &tracing::Span,
) {
    _ = span.record(
        "http.status_code",
        tracing::field::display(r.status().as_u16()),
    );

    let duration = format!("{}ms", dur.as_millis());
    if r.status().is_server_error() {
        log::error!(duration = %duration);
    } else if r.status().is_client_error() {
        log::warn!(duration = %duration);
    } else {
        log::info!(duration = %duration);
    }
}

/// [`juniper`] GraphQL response.
#[derive(Debug)]
pub struct JuniperResponse<S = DefaultScalarValue>
where
    S: ScalarValue,
{
    /// Status code of the response.
    pub status_code: http::StatusCode,

    /// Underlying GraphQL response.
    #[debug(skip)]
    pub response: GraphQLBatchResponse<S>,
}

impl<S> IntoResponse for JuniperResponse<S>
where
    S: ScalarValue,
{
    fn into_response(self) -> Response {
        let Self {
            status_code,
            response,
        } = self;

        if response.is_ok() {
            Json(response).into_response()
        } else {
            (status_code, Json(response)).into_response()
        }
    }
}

/// GraphQL API handler.
///
/// Failed responses carry the status code of the last error raised while
/// executing the request.
pub async fn graphql(
    Extension(schema): Extension<Arc<api::Schema>>,
    context: Context,
    JuniperRequest(gql_request): JuniperRequest,
) -> JuniperResponse {
    JuniperResponse {
        status_code: context.error_status_code(),
        response: gql_request.execute(&*schema, &context).await,
    }
}

#[cfg(test)]
mod spec {
    use crate::config;

    use super::cors_layer;

    #[test]
    fn accepts_wildcard_and_listed_origins() {
        assert!(cors_layer(&config::Cors::default()).is_ok());
        assert!(cors_layer(&config::Cors {
            origins: vec![
                "https://pos.example.com".into(),
                "http://localhost:3000".into(),
            ],
        })
        .is_ok());
    }

    #[test]
    fn rejects_invalid_origin() {
        assert!(cors_layer(&config::Cors {
            origins: vec!["https://pos.example.com\n".into()],
        })
        .is_err());
    }
}
