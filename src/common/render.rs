// src/common/render.rs

use std::{collections::HashMap, sync::Arc};

use axum::response::Html;
use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::{common::{error::AppError, flash::FlashView}, models::auth::SystemUser};

// Templates embutidos no binário: o deploy é um único executável.
const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("config.html", include_str!("../../templates/config.html")),
    ("vendedor.html", include_str!("../../templates/vendedor.html")),
    ("admin.html", include_str!("../../templates/admin.html")),
    ("usuarios.html", include_str!("../../templates/usuarios.html")),
];

#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        tera.register_filter("json_script", json_script);
        Ok(Self { tera: Arc::new(tera) })
    }

    pub fn render(&self, name: &str, page: &Page) -> Result<Html<String>, AppError> {
        let html = self.tera.render(name, &page.context)?;
        Ok(Html(html))
    }
}

/// JSON para dentro de `<script>`: `<`, `>` e `&` viram escapes unicode,
/// então um `</script>` vindo dos dados não fecha o bloco.
fn json_script(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let json = serde_json::to_string(value).map_err(|e| tera::Error::msg(e.to_string()))?;
    let escaped = json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026");
    Ok(Value::String(escaped))
}

/// Contexto de uma página: usuário logado, mensagem flash e dados da tela.
pub struct Page {
    context: Context,
}

impl Page {
    pub fn new(user: Option<&SystemUser>, flash: Option<FlashView>) -> Self {
        let mut context = Context::new();
        context.insert("current_user", &user);
        context.insert("flash", &flash);
        Self { context }
    }

    pub fn with<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }
}
