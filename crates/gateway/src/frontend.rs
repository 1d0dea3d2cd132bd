//! Embedded frontend assets.
//!
//! The HTML, CSS, and JS files from `frontend/` are compiled into the binary
//! with `include_str!`, so the server ships as a single file.

use axum::{
    Router,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");
const LOGIN_HTML: &str = include_str!("../../../frontend/login.html");
const STYLE_CSS: &str = include_str!("../../../frontend/style.css");
const APP_JS: &str = include_str!("../../../frontend/app.js");

/// Marker in `login.html` replaced by the error banner.
const LOGIN_ERROR_SLOT: &str = "<!--login-error-->";

/// Public assets: stylesheet and script.
pub fn static_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/static/style.css", get(css_handler))
        .route("/static/app.js", get(js_handler))
}

/// The application page. Callers put this behind the session check.
pub fn app_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(index_handler))
}

/// Render the login page, optionally with an error message.
pub fn login_page(error: Option<&str>) -> String {
    let banner = match error {
        Some(message) => format!(r#"<p class="error" role="alert">{}</p>"#, escape(message)),
        None => String::new(),
    };
    LOGIN_HTML.replace(LOGIN_ERROR_SLOT, &banner)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn css_handler() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLE_CSS,
    )
        .into_response()
}

async fn js_handler() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn public_router() -> Router {
        static_router().merge(app_router())
    }

    #[tokio::test]
    async fn serves_index_html() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = public_router().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("Shoplist"));
        assert!(text.contains("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn serves_assets_with_content_types() {
        for (uri, content_type) in [
            ("/static/style.css", "text/css; charset=utf-8"),
            ("/static/app.js", "application/javascript; charset=utf-8"),
        ] {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = public_router().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert_eq!(
                response.headers().get(header::CONTENT_TYPE).unwrap(),
                content_type
            );
        }
    }

    #[test]
    fn login_page_error_banner() {
        let plain = login_page(None);
        assert!(plain.contains("<form"));
        assert!(!plain.contains("class=\"error\""));

        let failed = login_page(Some("Incorrect PIN"));
        assert!(failed.contains("Incorrect PIN"));
        assert!(failed.contains("class=\"error\""));
    }

    #[test]
    fn login_error_is_escaped() {
        let page = login_page(Some("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
