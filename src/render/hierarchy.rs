use crate::error::GraphError;
use crate::graph::DescentGuard;
use crate::model::REPEATED_MARKER;
use crate::render::{JsonTypeDisplay, RenderContext, escape_html};

/// Box backgrounds by nesting depth.
pub const BACKGROUNDS: [&str; 8] = [
    "#e8f5e9", "#fff3e0", "#e3f2fd", "#fce4ec", "#f3e5f5", "#e0f7fa", "#fff8e1", "#efebe9",
];

/// Box borders by nesting depth.
pub const BORDERS: [&str; 8] = [
    "#4caf50", "#ff9800", "#2196f3", "#e91e63", "#9c27b0", "#00bcd4", "#ffc107", "#795548",
];

/// Background and border color of a box at `depth`.
pub fn depth_colors(depth: usize) -> (&'static str, &'static str) {
    (
        BACKGROUNDS[depth % BACKGROUNDS.len()],
        BORDERS[depth % BORDERS.len()],
    )
}

/// Renders the containment tree as nested boxes, each listing the object's
/// scalar fields before its child objects.
pub fn render_hierarchy(ctx: &RenderContext<'_>) -> Result<String, GraphError> {
    let roots = &ctx.graph.roots;
    let mut guard = DescentGuard::default();
    let label = format!("{}{REPEATED_MARKER}", roots.root_field);
    render_node(ctx, &roots.canonical, &label, 0, &mut guard)
}

fn render_node(
    ctx: &RenderContext<'_>,
    object: &str,
    label: &str,
    depth: usize,
    guard: &mut DescentGuard,
) -> Result<String, GraphError> {
    guard.enter(object)?;
    let (background, border) = depth_colors(depth);

    let description = ctx.object_description(object);
    let description = if description.is_empty() {
        String::new()
    } else {
        format!("<div class=\"desc\">{}</div>\n", escape_html(description))
    };

    let scalars = ctx.scalar_fields(object);
    let fields = if scalars.is_empty() {
        String::new()
    } else {
        let rows: String = scalars
            .iter()
            .map(|field| {
                format!(
                    "<tr><td class=\"pfield-name\">{}</td><td class=\"pfield-type\">{}</td>\
                     <td class=\"pfield-desc\">{}</td></tr>",
                    escape_html(field.json_name().unwrap_or_default()),
                    escape_html(&JsonTypeDisplay::of(ctx.schema, &field.field_type).to_text()),
                    escape_html(field.description())
                )
            })
            .collect();
        format!("<table class=\"fields\">{rows}</table>\n")
    };

    let children = ctx.graph.children.children(object);
    let nested = if children.is_empty() {
        String::new()
    } else {
        let mut items = String::new();
        for child in children {
            let child_label = if child.is_array {
                format!("{}{REPEATED_MARKER}", child.field)
            } else {
                child.field.clone()
            };
            items.push_str(&render_node(
                ctx,
                &child.child_type,
                &child_label,
                depth + 1,
                guard,
            )?);
        }
        format!("<div class=\"children\">{items}</div>\n")
    };

    guard.leave();
    Ok(format!(
        "<div class=\"node\" style=\"background: {background}; border-color: {border};\">\n\
         <div class=\"header\"><span class=\"field-name\">{}</span>\
         <span class=\"type-name\">{}</span></div>\n\
         {description}{fields}{nested}</div>\n",
        escape_html(label),
        escape_html(object),
    ))
}
