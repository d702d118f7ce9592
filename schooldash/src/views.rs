//! Page templates.
//!
//! All templates are compiled into the binary and registered once at startup. Template names end
//! in `.html`, which turns on HTML auto-escaping for every interpolated value.

use minijinja::Environment;
use serde::Serialize;

use crate::errors::{Error, Result};

const TEMPLATES: [(&str, &str); 6] = [
    ("layout.html", include_str!("../templates/layout.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("students.html", include_str!("../templates/students.html")),
    ("teachers.html", include_str!("../templates/teachers.html")),
    ("classes.html", include_str!("../templates/classes.html")),
    ("announcements.html", include_str!("../templates/announcements.html")),
];

#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    /// Register every page template. Fails if one does not parse.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source).map_err(template_error)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String> {
        let template = self.env.get_template(name).map_err(template_error)?;
        template.render(context).map_err(template_error)
    }
}

fn template_error(err: minijinja::Error) -> Error {
    Error::Other(anyhow::Error::new(err).context("template rendering failed"))
}
