use crate::error::GraphError;
use crate::graph::DescentGuard;
use crate::model::REPEATED_MARKER;
use crate::render::{RenderContext, escape_html, object_anchor};

/// Options of the JSON outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineOptions {
    /// Bare outline without heading and explanatory prose.
    pub minimal: bool,
    /// List non-object fields as unlinked leaves under their object.
    pub scalars: bool,
}

impl OutlineOptions {
    pub fn minimal() -> Self {
        Self {
            minimal: true,
            scalars: true,
        }
    }

    pub fn annotated() -> Self {
        Self {
            minimal: false,
            scalars: true,
        }
    }
}

/// Renders the containment tree as an indented outline starting at the root
/// collection. Object nodes link to their field reference sections.
pub fn render_json_tree(ctx: &RenderContext<'_>, options: &OutlineOptions) -> Result<String, GraphError> {
    let roots = &ctx.graph.roots;
    let mut lines = Vec::new();
    let mut guard = DescentGuard::default();
    render_node(
        ctx,
        options,
        &roots.canonical,
        &roots.root_field,
        true,
        0,
        &mut guard,
        &mut lines,
    )?;
    let structure = lines.join("\n");

    if options.minimal {
        return Ok(format!("<pre><code>{structure}</code></pre>"));
    }
    Ok(format!(
        "<h2>JSON Structure</h2>\n\
         <p>The export API returns site data with the following structure. \
         Click field names to jump to documentation.</p>\n\
         <pre><code>{structure}</code></pre>\n\
         <p>Fields starting with <code>_</code> are derived fields expanded by the export.</p>\n"
    ))
}

#[allow(clippy::too_many_arguments)]
fn render_node(
    ctx: &RenderContext<'_>,
    options: &OutlineOptions,
    object: &str,
    field: &str,
    is_array: bool,
    depth: usize,
    guard: &mut DescentGuard,
    lines: &mut Vec<String>,
) -> Result<(), GraphError> {
    guard.enter(object)?;

    let indent = "  ".repeat(depth);
    lines.push(format!(
        "{indent}<a href=\"#{}\">{}{}</a>",
        object_anchor(object),
        escape_html(field),
        marker(is_array)
    ));

    if options.scalars {
        let child_indent = "  ".repeat(depth + 1);
        for scalar in ctx.scalar_fields(object) {
            lines.push(format!(
                "{child_indent}{}{}",
                escape_html(scalar.json_name().unwrap_or_default()),
                marker(scalar.field_type.repeated)
            ));
        }
    }

    for child in ctx.graph.children.children(object) {
        render_node(
            ctx,
            options,
            &child.child_type,
            &child.field,
            child.is_array,
            depth + 1,
            guard,
            lines,
        )?;
    }

    guard.leave();
    Ok(())
}

fn marker(is_array: bool) -> &'static str {
    if is_array { REPEATED_MARKER } else { "" }
}
