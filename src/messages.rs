//! # Message Resolver
//!
//! Maps a message code and positional arguments to a human-readable string.
//!
//! The table is built once at startup: English defaults for every code the
//! dispatcher emits, overlaid by an optional resource file. After that it is
//! read-only and shared behind an `Arc` by every request.
//!
//! ## Resource formats
//!
//! Chosen by file extension:
//!
//! - `.yaml` / `.yml` and `.toml`: either flat (`code: template`) or sectioned
//!   by language (`en: { code: template }`). Entries of the `default` section
//!   are overridden by flat keys, and both by the section matching the
//!   configured language.
//!   TOML keys containing dots must be quoted.
//! - `.properties`: read like `java.util.Properties`. Keys end at the first
//!   unescaped `=`, `:` or blank. `#` and `!` start comments, a trailing `\`
//!   continues the line, and `\uXXXX` escapes carry non-ASCII text.
//!
//! Templates use `{0}`, `{1}`, ... placeholders.
//!
//! ## Unknown codes
//!
//! Resolving a code that is not in the table never fails. It returns the code
//! itself, followed by the arguments in brackets when there are any:
//! `some.code [a, b]`.

use crate::error::codes;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

const DEFAULT_MESSAGES: [(&str, &str); 13] = [
    (codes::PATH, "Requested service {0} is not available"),
    (
        codes::HTTP_METHOD,
        "Service {0} does not accept method {1}, expected {2}",
    ),
    (codes::UNAUTHORIZED, "Access to {0} requires a valid session"),
    (codes::CONTENT, "Request content for {0} could not be read: {1}"),
    (
        codes::RESPONSE_TYPE,
        "Service {0} declares an unsupported parameter list",
    ),
    (
        codes::METHOD_PARAMETER,
        "Service {0} did not produce a supported result",
    ),
    (
        codes::CONTENT_SIZE,
        "Request content for {0} exceeds the limit of {1} bytes",
    ),
    (
        codes::FILE_SIZE,
        "Uploaded file {1} for {0} exceeds the limit of {2} bytes",
    ),
    (codes::PARAMETER_MISSING, "Required parameter {0} is missing"),
    (
        codes::PARAMETER_INVALID,
        "Parameter {0} has invalid value {1}, expected {2}",
    ),
    (codes::BODY_INVALID, "Request body is not a valid {0}: {1}"),
    (codes::SERVICE, "Service {0} is not available"),
    (codes::HANDLER_PANIC, "Service {0} failed unexpectedly: {1}"),
];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageNode {
    Template(String),
    Section(BTreeMap<String, String>),
}

/// Localized message table.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    language: String,
    table: HashMap<String, String>,
}

impl Messages {
    /// A table pre-filled with the dispatcher's English defaults.
    pub fn new(language: impl Into<String>) -> Self {
        let mut messages = Self::empty(language);
        for (code, template) in DEFAULT_MESSAGES {
            messages.table.insert(code.to_string(), template.to_string());
        }
        messages
    }

    /// A table with no entries at all.
    pub fn empty(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            table: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, code: impl Into<String>, template: impl Into<String>) -> Self {
        self.table.insert(code.into(), template.into());
        self
    }

    /// Load defaults overlaid by the resource at `path`.
    pub fn load(path: &Path, language: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message resource {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let messages = match extension.as_str() {
            "yaml" | "yml" => Self::new(language).merge_yaml(&content),
            "toml" => Self::new(language).merge_toml(&content),
            "properties" => Self::new(language).merge_properties(&content),
            other => bail!(
                "Unsupported message resource format '{}' for {}",
                other,
                path.display()
            ),
        }
        .with_context(|| format!("Failed to parse message resource {}", path.display()))?;
        debug!(
            path = %path.display(),
            language = %language,
            entries = messages.len(),
            "Message table loaded"
        );
        Ok(messages)
    }

    pub fn merge_yaml(self, content: &str) -> Result<Self> {
        let nodes: BTreeMap<String, MessageNode> = serde_yaml::from_str(content)?;
        Ok(self.merge_nodes(nodes))
    }

    pub fn merge_toml(self, content: &str) -> Result<Self> {
        let nodes: BTreeMap<String, MessageNode> = toml::from_str(content)?;
        Ok(self.merge_nodes(nodes))
    }

    /// Overlay entries read with `java.util.Properties` rules.
    pub fn merge_properties(mut self, content: &str) -> Result<Self> {
        self.table.extend(parse_properties(content)?);
        Ok(self)
    }

    /// Layers, lowest first: the `default` section, flat keys, then the
    /// section named after the language.
    fn merge_nodes(mut self, nodes: BTreeMap<String, MessageNode>) -> Self {
        let mut flat = Vec::new();
        let mut fallback = None;
        let mut localized = None;
        for (key, node) in nodes {
            match node {
                MessageNode::Template(template) => flat.push((key, template)),
                MessageNode::Section(section) if key == self.language => localized = Some(section),
                MessageNode::Section(section) if key == "default" => fallback = Some(section),
                MessageNode::Section(_) => {}
            }
        }
        self.table.extend(fallback.unwrap_or_default());
        self.table.extend(flat);
        self.table.extend(localized.unwrap_or_default());
        self
    }

    /// Resolve `code` with positional `args`.
    pub fn resolve<S: AsRef<str>>(&self, code: &str, args: &[S]) -> String {
        match self.table.get(code) {
            Some(template) => format_template(template, args),
            None => {
                warn!(code = %code, language = %self.language, "Unknown message code");
                if args.is_empty() {
                    code.to_string()
                } else {
                    let joined: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
                    format!("{code} [{}]", joined.join(", "))
                }
            }
        }
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.table.contains_key(code)
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// An odd run of trailing backslashes joins the next line.
fn continues(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

fn parse_properties(content: &str) -> Result<Vec<(String, String)>> {
    let mut entries = Vec::new();
    let mut lines = content
        .lines()
        .flat_map(|line| line.split('\r'))
        .enumerate();
    while let Some((number, line)) = lines.next() {
        let mut natural = line.trim_start_matches(is_blank);
        if natural.is_empty() || natural.starts_with(['#', '!']) {
            continue;
        }
        let mut logical = String::new();
        while continues(natural) {
            logical.push_str(&natural[..natural.len() - 1]);
            natural = match lines.next() {
                Some((_, next)) => next.trim_start_matches(is_blank),
                None => "",
            };
        }
        logical.push_str(natural);
        let entry = split_entry(&logical)
            .with_context(|| format!("Invalid properties entry on line {}", number + 1))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn split_entry(line: &str) -> Result<(String, String)> {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }
    let mut value = line[key_end..].trim_start_matches(is_blank);
    if let Some(rest) = value.strip_prefix(['=', ':']) {
        value = rest.trim_start_matches(is_blank);
    }
    Ok((unescape(&line[..key_end])?, unescape(value)?))
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut units: Vec<u16> = Vec::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_units(&mut out, &mut units);
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    bail!("Malformed \\uXXXX escape '\\u{hex}'");
                }
                units.push(u16::from_str_radix(&hex, 16)?);
                continue;
            }
            Some('t') => '\t',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('f') => '\x0c',
            Some(other) => other,
            None => break,
        };
        flush_units(&mut out, &mut units);
        out.push(escaped);
    }
    flush_units(&mut out, &mut units);
    Ok(out)
}

/// Decode pending UTF-16 units, so surrogate pairs written as two escapes
/// form one character.
fn flush_units(out: &mut String, units: &mut Vec<u16>) {
    out.extend(
        char::decode_utf16(units.drain(..)).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

/// Substitute `{n}` placeholders. Placeholders without a matching argument
/// are left in place.
#[must_use]
pub fn format_template<S: AsRef<str>>(template: &str, args: &[S]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].trim().parse().ok()?;
            let arg = args.get(index)?;
            Some((arg.as_ref(), close))
        });
        match substituted {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
