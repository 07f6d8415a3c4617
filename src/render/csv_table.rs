use crate::model::{FieldKind, Primitive, SchemaField};
use crate::render::{RenderContext, csv_anchor, escape_html};

/// Options of the CSV column reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDocsOptions {
    pub show_overview: bool,
}

impl Default for CsvDocsOptions {
    fn default() -> Self {
        Self { show_overview: true }
    }
}

/// CSV-visible fields grouped by section key, sections in order of first
/// appearance.
#[derive(Debug)]
pub struct CsvSection<'a> {
    pub key: &'a str,
    pub fields: Vec<&'a SchemaField>,
}

/// Groups the fields that have a CSV column by their section key.
pub fn csv_sections<'a>(ctx: &RenderContext<'a>) -> Vec<CsvSection<'a>> {
    let mut sections: Vec<CsvSection<'a>> = Vec::new();
    for field in ctx.schema.fields.iter().filter(|f| f.csv_column.is_some()) {
        let key = field.section_key();
        match sections.iter_mut().find(|section| section.key == key) {
            Some(section) => section.fields.push(field),
            None => sections.push(CsvSection {
                key,
                fields: vec![field],
            }),
        }
    }
    sections
}

/// Renders the navigation bar linking to every CSV section.
pub fn render_csv_nav(ctx: &RenderContext<'_>) -> String {
    let mut html = String::from("<a href=\"#overview\">Overview</a> ");
    for section in csv_sections(ctx) {
        html.push_str(&format!(
            "<a href=\"#{}\">{}</a> ",
            csv_anchor(section.key),
            escape_html(section_title(ctx, section.key))
        ));
    }
    html.push_str(&format!(
        "<span class=\"muted\" style=\"margin-left: 1em;\">See also: <a href=\"{}\">JSON Format</a></span>",
        escape_html(&ctx.options.json_format_href)
    ));
    html
}

/// Renders one table per CSV section with column, type and description.
pub fn render_csv_docs(ctx: &RenderContext<'_>, options: &CsvDocsOptions) -> String {
    let mut html = String::new();
    if options.show_overview {
        html.push_str(
            "<div class=\"section\" id=\"overview\">\n\
             <h2>Overview</h2>\n\
             <p>The CSV export produces <strong>one row per depth interval per site</strong>. \
             Site-level fields repeat on each row.</p>\n\
             </div>\n",
        );
    }

    for section in csv_sections(ctx) {
        let rows: String = section
            .fields
            .iter()
            .map(|field| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(field.csv_column.as_deref().unwrap_or_default()),
                    csv_type_cell(ctx, field),
                    escape_html(field.description())
                )
            })
            .collect();

        let description = ctx
            .schema
            .object(section.key)
            .and_then(|obj| obj.description.as_deref())
            .map(|desc| format!("<p class=\"description\">{}</p>\n", escape_html(desc)))
            .unwrap_or_default();

        html.push_str(&format!(
            "<div class=\"section\" id=\"{}\">\n<h2>{}</h2>\n{description}<table>\n\
             <thead><tr><th>Column</th><th>Type</th><th>Description</th></tr></thead>\n\
             <tbody>{rows}</tbody>\n</table>\n</div>\n",
            csv_anchor(section.key),
            escape_html(section_title(ctx, section.key)),
        ));
    }
    html
}

fn section_title<'a>(ctx: &RenderContext<'a>, key: &'a str) -> &'a str {
    ctx.schema
        .object(key)
        .map(|obj| obj.display_name())
        .unwrap_or(key)
}

fn csv_type_cell(ctx: &RenderContext<'_>, field: &SchemaField) -> String {
    match &field.field_type.kind {
        FieldKind::EnumRef(name) => ctx
            .schema
            .enum_members(name)
            .iter()
            .map(|value| escape_html(value.csv_label()))
            .collect::<Vec<_>>()
            .join(", "),
        FieldKind::Primitive(Primitive::Boolean) => "TRUE, FALSE".to_string(),
        _ => escape_html(&field.field_type.raw),
    }
}
