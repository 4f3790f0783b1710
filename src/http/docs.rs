//! API documentation endpoints: a Swagger UI page and the raw OpenAPI document.

use axum::{http::header, response::IntoResponse, routing::get, Router};

pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_PATH: &str = "/docs/openapi.yml";

const OPENAPI_DOCUMENT: &str = include_str!("openapi.yml");

const SWAGGER_UI_VERSION: &str = "5.29.3";

/// Routes for `/docs` and `/docs/openapi.yml`.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(DOCS_PATH, get(swagger_ui))
        .route(OPENAPI_PATH, get(openapi_document))
}

async fn swagger_ui() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        swagger_html(OPENAPI_PATH),
    )
}

async fn openapi_document() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/yaml")], OPENAPI_DOCUMENT)
}

fn swagger_html(spec_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <meta name="description" content="SwaggerUI" />
  <title>Swagger UI</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui.css" />
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-bundle.js" crossorigin></script>
<script>
  window.onload = () => {{
    window.ui = SwaggerUIBundle({{
      url: '{spec_url}',
      dom_id: '#swagger-ui',
      deepLinking: true,
      showExtensions: true,
      showCommonExtensions: true,
    }});
  }};
</script>
</body>
</html>
"#,
        version = SWAGGER_UI_VERSION,
    )
}
