//! `{{ name }}` templates for file-sourced message bodies.

use crate::errors::{FileNotFoundError, MailerError};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Variables available to a template.
pub type TemplateVars = HashMap<String, String>;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Substitutes every `{{ name }}` with a variable of that name. Placeholders
/// without a matching variable are left as written.
pub fn render(source: &str, vars: &TemplateVars) -> String {
    placeholder()
        .replace_all(source, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Reads and renders a template file.
pub fn render_file(path: &Path, vars: &TemplateVars) -> Result<String, MailerError> {
    if !path.is_file() {
        return Err(FileNotFoundError::new(path).into());
    }
    let source = std::fs::read(path)?;
    Ok(render(&String::from_utf8_lossy(&source), vars))
}

/// Names of the placeholders in `source`, in order of first appearance.
pub fn placeholders(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder().captures_iter(source) {
        if !names.iter().any(|n| n == &caps[1]) {
            names.push(caps[1].to_string());
        }
    }
    names
}
