//! Page shell for every navigation the edge gate let through.
//!
//! Rendering is client-side; the shell only boots the app, which then runs
//! its own route guard against the same route table.

use axum::{extract::State, http::Uri, response::Html};

use crate::app::AppState;

pub async fn shell(State(state): State<AppState>, uri: Uri) -> Html<String> {
    let path = uri.path();
    let required = state
        .routes
        .required_capability(path)
        .map(|c| c.as_str())
        .unwrap_or("");

    Html(format!(
        concat!(
            "<!doctype html>\n",
            "<html><head><meta charset=\"utf-8\"><title>HRMS</title></head>\n",
            "<body><div id=\"app\" data-path=\"{path}\" data-sign-in=\"{sign_in}\" data-capability=\"{required}\"></div>",
            "<script type=\"module\" src=\"/assets/app.js\"></script></body></html>\n"
        ),
        path = escape_attr(path),
        sign_in = escape_attr(state.routes.sign_in_path()),
        required = required,
    ))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
