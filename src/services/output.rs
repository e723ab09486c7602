use crate::domain::models::{ErrorBody, JsonErr, JsonOut};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

pub fn print_json<T: Serialize>(ok: bool, data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&JsonOut { ok, data })?);
    Ok(())
}

pub fn print_json_error(code: &str, message: &str) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&JsonErr {
            ok: false,
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
        })?
    );
    Ok(())
}

/// Human-facing renderer. Every write records a tag so callers and tests can
/// tell what kind of line was produced without matching on text.
pub struct Prompt<W: Write> {
    out: W,
    tags: Vec<String>,
}

impl<W: Write> Prompt<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tags: Vec::new(),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write(&mut self, msg: &str, tag: &str) -> io::Result<()> {
        self.tags.push(tag.to_string());
        writeln!(self.out, "{}", msg)
    }

    pub fn render_success_message(&mut self, msg: &str) -> io::Result<()> {
        self.tags.push("success".to_string());
        writeln!(self.out, "{}", msg)?;
        writeln!(self.out)
    }

    pub fn render_failure_message(&mut self, msg: &str) -> io::Result<()> {
        self.tags.push("failure".to_string());
        writeln!(self.out, "{}", msg)?;
        writeln!(self.out)
    }

    pub fn render_paragraph(&mut self, msg: &str) -> io::Result<()> {
        self.tags.push("paragraph".to_string());
        writeln!(self.out, "{}", msg)?;
        writeln!(self.out)
    }

    pub fn render_title(&mut self, title: &str) -> io::Result<()> {
        self.tags.push("title".to_string());
        writeln!(self.out, "{}", title)?;
        writeln!(self.out, "{}", "-".repeat(title.chars().count()))?;
        writeln!(self.out)
    }

    /// Render each document as aligned `Label: value` lines, showing only
    /// `fields` and in that order. Keys absent from a document are skipped.
    pub fn render_document_list(&mut self, docs: &[Value], fields: &[&str]) -> io::Result<()> {
        let width = fields
            .iter()
            .map(|f| display_label(f).chars().count())
            .max()
            .unwrap_or(0)
            + 2;
        for doc in docs {
            self.tags.push("document".to_string());
            for field in fields {
                let Some(value) = doc.get(*field) else {
                    continue;
                };
                let label = format!("{}:", display_label(field));
                writeln!(
                    self.out,
                    "{:<width$}{}",
                    label,
                    display_value(value),
                    width = width
                )?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }
}

/// `repo_id` -> `Repo id`
fn display_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
