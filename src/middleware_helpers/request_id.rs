use crate::tracing::RequestId;
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Header name for the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuses the caller's `x-request-id` when it is a usable header value,
/// otherwise mints a UUID. The id is exposed to handlers as an extension and
/// through [`crate::tracing::current_request_id`], and echoed on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(RequestId::new);

    let (request_id, header_value) = match incoming
        .and_then(|rid| HeaderValue::from_str(rid.as_str()).ok().map(|hv| (rid, hv)))
    {
        Some(pair) => pair,
        None => {
            let rid = RequestId::default();
            // UUIDs are always valid header values
            let hv = HeaderValue::from_str(rid.as_str()).unwrap_or(HeaderValue::from_static("-"));
            (rid, hv)
        }
    };

    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);
    request
        .headers_mut()
        .insert(header_name.clone(), header_value.clone());
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::debug_span!("request_id", request_id = %request_id);
    let mut response = crate::tracing::scope_request_id(
        request_id,
        async move { next.run(request).await }.instrument(span),
    )
    .await;

    response.headers_mut().insert(header_name, header_value);
    response
}
