use crate::error::GraphError;
use crate::render::{JsonTypeDisplay, RenderContext, escape_html, object_anchor};

/// Renders one field reference section per object with JSON-visible fields.
///
/// Root aliases get no section of their own; their fields are listed under
/// the canonical root.
pub fn render_json_fields(ctx: &RenderContext<'_>) -> Result<String, GraphError> {
    let roots = &ctx.graph.roots;
    let mut html = String::new();

    for object in &ctx.schema.objects {
        if roots.is_alias(&object.name) {
            continue;
        }
        let fields = ctx.json_fields(&object.name);
        if fields.is_empty() {
            continue;
        }

        let rows: String = fields
            .iter()
            .map(|field| {
                let marker = if field.field_type.repeated { "[]" } else { "" };
                format!(
                    "<tr><td><code>{}{marker}</code></td><td>{}</td><td>{}</td></tr>",
                    escape_html(field.json_name().unwrap_or_default()),
                    JsonTypeDisplay::of(ctx.schema, &field.field_type).to_html(),
                    escape_html(field.description())
                )
            })
            .collect();

        let description = object
            .description
            .as_deref()
            .map(|desc| format!("<p class=\"description\">{}</p>\n", escape_html(desc)))
            .unwrap_or_default();
        let path = ctx.graph.json_path(&object.name)?;
        let path_line = if path.is_empty() {
            String::new()
        } else {
            format!(
                "<p class=\"muted\">JSON path: <code>{}</code></p>\n",
                escape_html(&path)
            )
        };

        html.push_str(&format!(
            "<div class=\"section\" id=\"{}\">\n<h2>{}</h2>\n{description}{path_line}<table>\n\
             <thead><tr><th>Field</th><th>Type</th><th>Description</th></tr></thead>\n\
             <tbody>{rows}</tbody>\n</table>\n</div>\n",
            object_anchor(&object.name),
            escape_html(&object.name),
        ));
    }

    Ok(html)
}
