// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::middleware::auth::SESSION_COOKIE;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Vendedores ---
        handlers::dashboard::rep_trend,
    ),
    components(
        schemas(
            models::sales::MonthlyTrendEntry,
        )
    ),
    tags(
        (name = "Vendedores", description = "Evolução mensal de vendas por vendedor")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            SESSION_COOKIE,
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_trend_endpoint_with_cookie_security() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/vendedor-dados/{codigo}"));

        let components = doc.components.expect("components");
        assert!(components.schemas.contains_key("MonthlyTrendEntry"));
        assert!(components.security_schemes.contains_key(SESSION_COOKIE));
    }
}
