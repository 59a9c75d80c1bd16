//! Fixed markup documents.

use axum::{http::header, response::IntoResponse};

pub const HTML_CONTENT: &str = r#"<!DOCTYPE html>
<html>
<body>
<h1>Hello, World!</h1>
</body>
</html>"#;

pub const XML_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
    <message>Hello, World!</message>
</root>"#;

pub async fn html() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], HTML_CONTENT)
}

pub async fn xml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], XML_CONTENT)
}
