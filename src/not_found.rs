//! The 404 page and response helpers.

use axum::{http::StatusCode, response::Response};

use crate::{html::error_view, shared_templates::render};

/// Route handler for unknown paths.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Get a 404 response with the not-found page.
pub fn get_404_not_found_response() -> Response {
    render(
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Sorry, we could not find that page.",
            "Check the address, or head back to the dashboard.",
        ),
    )
}
