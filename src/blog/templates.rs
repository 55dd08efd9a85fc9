//! Embedded minijinja templates.
//!
//! Every page template is compiled into the binary and registered once at
//! start-up, so a missing or broken template fails `Templates::new` instead
//! of a request. `.html` templates auto-escape.

use std::collections::BTreeMap;

use minijinja::{Environment, Value};
use serde::Serialize;

use super::session::Auth;

const SOURCES: &[(&str, &str)] = &[
    ("base.html", include_str!("templates/base.html")),
    ("error.html", include_str!("templates/error.html")),
    ("login.html", include_str!("templates/login.html")),
    ("blog/index.html", include_str!("templates/index.html")),
    ("blog/post_fields.html", include_str!("templates/post_fields.html")),
    ("blog/post_detail.html", include_str!("templates/post_detail.html")),
    ("blog/post_create_form.html", include_str!("templates/post_create_form.html")),
    ("blog/post_update_form.html", include_str!("templates/post_update_form.html")),
    ("blog/post_delete_form.html", include_str!("templates/post_delete_form.html")),
    ("blog/tags_list.html", include_str!("templates/tags_list.html")),
    ("blog/tag_fields.html", include_str!("templates/tag_fields.html")),
    ("blog/tag_detail.html", include_str!("templates/tag_detail.html")),
    ("blog/tag_create.html", include_str!("templates/tag_create.html")),
    ("blog/tag_update_form.html", include_str!("templates/tag_update_form.html")),
    ("blog/tag_delete_form.html", include_str!("templates/tag_delete_form.html")),
];

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in SOURCES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: &Context) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(&ctx.0)
    }
}

/// Template variables for one page. Always carries `user`.
#[derive(Debug, Default)]
pub struct Context(BTreeMap<&'static str, Value>);

impl Context {
    pub fn new(auth: &Auth) -> Self {
        Self::default().with("user", auth)
    }

    pub fn insert(&mut self, key: &'static str, value: impl Serialize) -> &mut Self {
        self.0.insert(key, Value::from_serialize(&value));
        self
    }

    pub fn with(mut self, key: &'static str, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }
}
