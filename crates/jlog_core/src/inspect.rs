//! Bounded textual inspector
//!
//! Renders any [`Value`] on a single line, whatever its shape. Self-references
//! are marked instead of followed: the node re-entered on the current path is
//! printed as `[Circular *N]` and its first occurrence gets a `<ref *N>`
//! prefix. Nesting deeper than `depth` collapses to `[Object]`, `[Array]`,
//! `[Map]` or `[Set]`.

use crate::value::{iso_timestamp, number_text, ErrorValue, Value};
use jlog_config::InspectOptions;
use std::collections::HashMap;

/// Buffers longer than this show a `... N more bytes` suffix
const MAX_BUFFER_BYTES: usize = 50;

/// Render a value with the given options
pub fn inspect(value: &Value, options: &InspectOptions) -> String {
    let mut inspector = Inspector {
        options,
        path: Vec::new(),
        refs: HashMap::new(),
    };
    inspector.render(value, 0, true)
}

/// True when the text carries a `[Circular *N]` marker
pub fn has_circular_marker(text: &str) -> bool {
    let mut rest = text;
    while let Some(pos) = rest.find("[Circular *") {
        let tail = &rest[pos + "[Circular *".len()..];
        let digits = tail.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 && tail[digits..].starts_with(']') {
            return true;
        }
        rest = tail;
    }
    false
}

#[derive(Clone, Copy)]
enum Style {
    Number,
    String,
    Null,
    Date,
    Special,
}

impl Style {
    fn codes(self) -> (u8, u8) {
        match self {
            Style::Number => (33, 39),
            Style::String => (32, 39),
            Style::Null => (1, 22),
            Style::Date => (35, 39),
            Style::Special => (36, 39),
        }
    }
}

struct Inspector<'a> {
    options: &'a InspectOptions,
    /// Nodes on the current rendering path
    path: Vec<usize>,
    /// Node id -> reference number, in discovery order
    refs: HashMap<usize, usize>,
}

impl Inspector<'_> {
    fn stylize(&self, text: String, style: Style) -> String {
        if !self.options.colors {
            return text;
        }
        let (open, close) = style.codes();
        format!("\x1b[{}m{}\x1b[{}m", open, text, close)
    }

    fn ref_number(&mut self, id: usize) -> usize {
        let next = self.refs.len() + 1;
        *self.refs.entry(id).or_insert(next)
    }

    fn beyond_depth(&self, level: usize) -> bool {
        matches!(self.options.depth, Some(max) if level > max)
    }

    fn render(&mut self, value: &Value, level: usize, top: bool) -> String {
        match value {
            Value::Null => self.stylize("null".to_string(), Style::Null),
            Value::Bool(b) => self.stylize(b.to_string(), Style::Number),
            Value::Number(n) => self.stylize(number_text(n), Style::Number),
            Value::BigInt(n) => self.stylize(format!("{}n", n), Style::Number),
            Value::String(s) if top => s.clone(),
            Value::String(s) => self.stylize(quote(s), Style::String),
            Value::Date(d) => self.stylize(iso_timestamp(d), Style::Date),
            Value::Error(e) => self.render_error(e),
            Value::Bytes(b) => {
                if self.beyond_depth(level) {
                    return self.stylize("[Buffer]".to_string(), Style::Special);
                }
                render_buffer(b)
            }
            Value::Array(_) | Value::Map(_) | Value::Set(_) | Value::Object(_) => {
                self.render_node(value, level)
            }
        }
    }

    fn render_node(&mut self, value: &Value, level: usize) -> String {
        let Some(id) = value.node_id() else {
            return String::new();
        };

        if self.path.contains(&id) {
            let n = self.ref_number(id);
            return self.stylize(format!("[Circular *{}]", n), Style::Special);
        }

        if self.beyond_depth(level) {
            let collapsed = match value {
                Value::Array(_) => "[Array]",
                Value::Map(_) => "[Map]",
                Value::Set(_) => "[Set]",
                _ => "[Object]",
            };
            return self.stylize(collapsed.to_string(), Style::Special);
        }

        self.path.push(id);
        let body = match value {
            Value::Array(a) => {
                let mut parts: Vec<String> = a
                    .entries()
                    .iter()
                    .map(|v| self.render(v, level + 1, false))
                    .collect();
                if self.options.show_hidden {
                    let len = self.stylize(a.len().to_string(), Style::Number);
                    parts.push(format!("[length]: {}", len));
                }
                wrap("[", &parts, "]")
            }
            Value::Object(o) => {
                let parts: Vec<String> = o
                    .entries()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", property_key(k), self.render(v, level + 1, false)))
                    .collect();
                wrap("{", &parts, "}")
            }
            Value::Map(m) => {
                let parts: Vec<String> = m
                    .entries()
                    .iter()
                    .map(|(k, v)| {
                        let key = self.render(k, level + 1, false);
                        format!("{} => {}", key, self.render(v, level + 1, false))
                    })
                    .collect();
                format!("Map({}) {}", m.len(), wrap("{", &parts, "}"))
            }
            Value::Set(s) => {
                let parts: Vec<String> = s
                    .entries()
                    .iter()
                    .map(|v| self.render(v, level + 1, false))
                    .collect();
                format!("Set({}) {}", s.len(), wrap("{", &parts, "}"))
            }
            _ => String::new(),
        };
        self.path.pop();

        match self.refs.get(&id) {
            Some(n) => {
                let marker = self.stylize(format!("<ref *{}>", n), Style::Special);
                format!("{} {}", marker, body)
            }
            None => body,
        }
    }

    fn render_error(&self, err: &ErrorValue) -> String {
        let mut text = if err.stack().is_empty() {
            format!("[{}: {}]", err.name(), err.message())
        } else {
            err.stack().to_string()
        };
        if self.options.show_hidden {
            let message = self.stylize(quote(err.message()), Style::String);
            text.push_str(&format!(" {{ [message]: {} }}", message));
        }
        text
    }
}

fn wrap(open: &str, parts: &[String], close: &str) -> String {
    if parts.is_empty() {
        format!("{}{}", open, close)
    } else {
        format!("{} {} {}", open, parts.join(", "), close)
    }
}

fn render_buffer(bytes: &[u8]) -> String {
    let shown: Vec<String> = bytes
        .iter()
        .take(MAX_BUFFER_BYTES)
        .map(|b| format!("{:02x}", b))
        .collect();
    let mut text = String::from("<Buffer");
    if !shown.is_empty() {
        text.push(' ');
        text.push_str(&shown.join(" "));
    }
    if bytes.len() > MAX_BUFFER_BYTES {
        text.push_str(&format!(" ... {} more bytes", bytes.len() - MAX_BUFFER_BYTES));
    }
    text.push('>');
    text
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn property_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_identifier = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if is_identifier {
        key.to_string()
    } else {
        quote(key)
    }
}
