use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

/// The mobile client is often reached through an ngrok tunnel, which
/// interposes a browser warning page unless this header is present.
pub async fn tunnel_bypass(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    response.headers_mut().insert(
        "ngrok-skip-browser-warning",
        HeaderValue::from_static("true"),
    );
    response
}
