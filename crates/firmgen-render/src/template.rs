//! Generated-fragment marker substitution.
//!
//! A marker is any line containing `BEGIN-OF-GENERATED <name>`; the
//! surrounding comment syntax is free:
//! ```c
//! /* BEGIN-OF-GENERATED handles */
//! // BEGIN-OF-GENERATED irq_enable
//! ```
//! Rendering replaces the whole line with the bound text. There is no
//! recursion and no conditional logic; callers decide what to bind.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{RenderError, Result};

/// Sentinel introducing a generated-fragment marker.
pub const GENERATED_MARKER: &str = "BEGIN-OF-GENERATED";

/// Marker name to replacement text.
pub type Bindings = BTreeMap<String, String>;

/// Substitute bound markers in `text`.
///
/// A bound marker line becomes the bound text followed by the line's
/// original line break; binding the empty string removes the line.
/// Unbound markers are left untouched.
pub fn render(text: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        let bound = marker_name(body).and_then(|name| bindings.get(name));
        match bound {
            Some(replacement) => {
                let replacement = replacement.strip_suffix('\n').unwrap_or(replacement);
                let replacement = replacement.strip_suffix('\r').unwrap_or(replacement);
                if !replacement.is_empty() {
                    out.push_str(replacement);
                    out.push_str(ending);
                }
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Names of all generated-fragment markers in `text`, in order of appearance.
pub fn markers(text: &str) -> Vec<&str> {
    text.lines().filter_map(marker_name).collect()
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// The marker name of a sentinel line: `BEGIN-OF-GENERATED`, whitespace,
/// then the name, with nothing else on the line but comment punctuation.
fn marker_name(line: &str) -> Option<&str> {
    let start = line.find(GENERATED_MARKER)?;
    if !line[..start].chars().all(is_comment_syntax) {
        return None;
    }
    let rest = &line[start + GENERATED_MARKER.len()..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(rest.len());
    let (name, tail) = rest.split_at(end);
    (!name.is_empty() && tail.chars().all(is_comment_syntax)).then_some(name)
}

fn is_comment_syntax(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | '*' | '#' | '-' | ';' | '!' | '<' | '>' | '%')
}

/// Reads templates from a materialized template directory.
///
/// Template ids are paths relative to the root; contents are cached for
/// the lifetime of the store.
#[derive(Debug)]
pub struct TemplateStore {
    root: PathBuf,
    cache: HashMap<String, String>,
}

impl TemplateStore {
    /// Open a template directory.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(RenderError::TemplateRoot {
                root: root.to_path_buf(),
            });
        }
        Ok(TemplateStore {
            root: root.to_path_buf(),
            cache: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Template text by id.
    pub fn load(&mut self, id: &str) -> Result<&str> {
        if !self.cache.contains_key(id) {
            let path = self.root.join(id);
            let text = std::fs::read_to_string(&path)
                .map_err(|source| RenderError::TemplateRead { path, source })?;
            log::debug!("Loaded template {id} ({} bytes)", text.len());
            self.cache.insert(id.to_string(), text);
        }
        Ok(self.cache.get(id).map(String::as_str).unwrap_or_default())
    }

    /// Load template `id` and substitute `bindings` into it.
    pub fn render(&mut self, id: &str, bindings: &Bindings) -> Result<String> {
        let text = self.load(id)?;
        Ok(render(text, bindings))
    }
}
