//! HTML views of a loaded schema.
//!
//! Every view is a pure function of the schema and its containment graph and
//! returns one markup fragment. Anchor ids (`obj-<slug>`, `csv-<slug>`) are
//! linked to from other pages and must stay stable.

pub mod csv_table;
pub mod fields;
pub mod hierarchy;
pub mod outline;

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::ContainmentGraph;
use crate::model::{EnumValue, FieldKind, FieldType, Primitive, Schema, SchemaField};

/// Which view to render.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ViewMode {
    /// CSV column reference.
    Csv,
    /// Indented JSON outline.
    Tree,
    /// Per-object JSON field reference.
    Fields,
    /// Nested box diagram.
    Hierarchy,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Csv => write!(f, "csv"),
            ViewMode::Tree => write!(f, "tree"),
            ViewMode::Fields => write!(f, "fields"),
            ViewMode::Hierarchy => write!(f, "hierarchy"),
        }
    }
}

/// Presentation settings shared by the views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Link target of the JSON format page in the CSV navigation bar.
    pub json_format_href: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            json_format_href: "/json-export-format/".to_string(),
        }
    }
}

/// Everything a view reads.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub schema: &'a Schema,
    pub graph: &'a ContainmentGraph,
    pub options: &'a RenderOptions,
}

impl<'a> RenderContext<'a> {
    pub fn new(schema: &'a Schema, graph: &'a ContainmentGraph, options: &'a RenderOptions) -> Self {
        Self {
            schema,
            graph,
            options,
        }
    }

    /// JSON-visible fields of `object`, with the fields of root aliases
    /// folded into the canonical root, in declaration order.
    pub fn json_fields(&self, object: &str) -> Vec<&'a SchemaField> {
        let roots = &self.graph.roots;
        self.schema
            .fields
            .iter()
            .filter(|field| field.json_name.is_some())
            .filter(|field| roots.canonicalize(&field.object) == object)
            .collect()
    }

    /// JSON-visible fields of `object` that are not containment edges.
    pub fn scalar_fields(&self, object: &str) -> Vec<&'a SchemaField> {
        self.json_fields(object)
            .into_iter()
            .filter(|field| field.field_type.object_ref().is_none())
            .collect()
    }

    pub fn object_description(&self, name: &str) -> &'a str {
        self.schema
            .object(name)
            .and_then(|obj| obj.description.as_deref())
            .unwrap_or_default()
    }
}

/// Renders the view selected by `mode` with the defaults used by the
/// documentation pages.
pub fn render(mode: ViewMode, ctx: &RenderContext<'_>) -> Result<String, GraphError> {
    match mode {
        ViewMode::Csv => Ok(csv_table::render_csv_docs(
            ctx,
            &csv_table::CsvDocsOptions { show_overview: false },
        )),
        ViewMode::Tree => outline::render_json_tree(ctx, &outline::OutlineOptions::minimal()),
        ViewMode::Fields => fields::render_json_fields(ctx),
        ViewMode::Hierarchy => hierarchy::render_hierarchy(ctx),
    }
}

/// How a field type is documented in the JSON-oriented views.
#[derive(Debug, PartialEq)]
pub(crate) enum JsonTypeDisplay<'a> {
    Enum(Vec<&'a EnumValue>),
    Boolean,
    DateTime,
    Object(&'a str),
    Raw(&'a str),
}

impl<'a> JsonTypeDisplay<'a> {
    pub(crate) fn of(schema: &'a Schema, field_type: &'a FieldType) -> Self {
        match &field_type.kind {
            FieldKind::EnumRef(name) => JsonTypeDisplay::Enum(schema.enum_members(name)),
            FieldKind::Primitive(Primitive::Boolean) => JsonTypeDisplay::Boolean,
            FieldKind::Primitive(Primitive::DateTime) => JsonTypeDisplay::DateTime,
            FieldKind::ObjectRef(name) => JsonTypeDisplay::Object(name),
            FieldKind::Primitive(Primitive::Other(_)) => JsonTypeDisplay::Raw(&field_type.base),
        }
    }

    /// Plain text form; object references render as their name.
    pub(crate) fn to_text(&self) -> String {
        match self {
            JsonTypeDisplay::Enum(values) => values
                .iter()
                .map(|value| match value.description.as_deref() {
                    Some(desc) => format!("{} ({desc})", value.value),
                    None => value.value.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            JsonTypeDisplay::Boolean => "true, false".to_string(),
            JsonTypeDisplay::DateTime => "ISO 8601 DateTime".to_string(),
            JsonTypeDisplay::Object(name) | JsonTypeDisplay::Raw(name) => name.to_string(),
        }
    }

    /// Escaped markup; object references link to their field reference section.
    pub(crate) fn to_html(&self) -> String {
        match self {
            JsonTypeDisplay::Object(name) => {
                format!("<a href=\"#{}\">{}</a>", object_anchor(name), escape_html(name))
            }
            other => escape_html(&other.to_text()),
        }
    }
}

/// Escapes the characters that are significant in HTML text and attributes.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Lower-cases `name` and folds every run of whitespace into one hyphen.
pub fn to_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }
    slug
}

/// Anchor id of an object's JSON field reference section.
pub fn object_anchor(name: &str) -> String {
    format!("obj-{}", to_slug(name))
}

/// Anchor id of a CSV section.
pub fn csv_anchor(name: &str) -> String {
    format!("csv-{}", to_slug(name))
}
