//! Drives one documentation render: load, build the graph, render, write.

use tracing::{info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::graph::{ContainmentGraph, RootAliases};
use crate::io::source::{LoadOptions, ResourceFetcher, SourceSpec, load_schema};
use crate::render::{self, RenderContext, RenderOptions, ViewMode, escape_html};

/// One output element of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub inner_html: String,
    pub hidden: bool,
}

/// In-memory document holding the output elements by id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    elements: Vec<(String, Element)>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page with the `<prefix>-loading` and `<prefix>-content` elements a
    /// documentation page declares.
    pub fn with_anchors(prefix: &str) -> Self {
        let anchors = OutputAnchors::new(prefix);
        let mut page = Self::new();
        page.insert(
            &anchors.loading,
            Element {
                inner_html: "Loading...".to_string(),
                hidden: false,
            },
        );
        page.insert(&anchors.content, Element::default());
        page
    }

    /// Inserts or replaces the element with `id`.
    pub fn insert(&mut self, id: &str, element: Element) {
        match self.element_mut(id) {
            Some(existing) => *existing = element,
            None => self.elements.push((id.to_string(), element)),
        }
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, element)| element)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements
            .iter_mut()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, element)| element)
    }

    /// Serialises the page into a standalone HTML document.
    pub fn to_html(&self, title: &str) -> String {
        let mut body = String::new();
        for (id, element) in &self.elements {
            let style = if element.hidden {
                " style=\"display: none;\""
            } else {
                ""
            };
            body.push_str(&format!(
                "<div id=\"{}\"{style}>{}</div>\n",
                escape_html(id),
                element.inner_html
            ));
        }
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
             </head>\n<body>\n{body}</body>\n</html>\n",
            escape_html(title)
        )
    }
}

/// Ids of the two elements a render writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAnchors {
    pub loading: String,
    pub content: String,
}

impl OutputAnchors {
    pub fn new(prefix: &str) -> Self {
        Self {
            loading: format!("{prefix}-loading"),
            content: format!("{prefix}-content"),
        }
    }

    fn resolve(prefix: &str, page: &Page) -> Result<Self> {
        let anchors = Self::new(prefix);
        for id in [&anchors.loading, &anchors.content] {
            if page.element(id).is_none() {
                return Err(ToolError::MissingAnchor(id.clone()));
            }
        }
        Ok(anchors)
    }
}

/// A single documentation render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub source: SourceSpec,
    pub mode: ViewMode,
    pub prefix: String,
    /// Spreadsheet id replacing `source` when set.
    pub sheets_override: Option<String>,
}

impl RenderRequest {
    pub fn effective_source(&self) -> SourceSpec {
        match &self.sheets_override {
            Some(id) => SourceSpec::SpreadsheetId(id.clone()),
            None => self.source.clone(),
        }
    }
}

/// Settings shared by every render of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSettings {
    pub load: LoadOptions,
    pub roots: RootAliases,
    pub render: RenderOptions,
}

/// Loads the schema, renders the requested view into `<prefix>-content` and
/// hides `<prefix>-loading`.
///
/// When the load fails the error is written into the loading element, the
/// content element is left untouched, and the error is returned.
#[instrument(
    level = "info",
    skip_all,
    fields(mode = %request.mode, prefix = %request.prefix)
)]
pub async fn init_export_docs(
    request: &RenderRequest,
    settings: &RenderSettings,
    page: &mut Page,
    fetcher: &dyn ResourceFetcher,
) -> Result<()> {
    let anchors = OutputAnchors::resolve(&request.prefix, page)?;
    let source = request.effective_source();

    let outcome = match load_schema(&source, fetcher, &settings.load).await {
        Ok(schema) => {
            let graph = ContainmentGraph::build(&schema, settings.roots.clone());
            let ctx = RenderContext::new(&schema, &graph, &settings.render);
            render::render(request.mode, &ctx).map_err(|err| ("Error rendering", ToolError::from(err)))
        }
        Err(err) => Err(("Error loading", ToolError::from(err))),
    };

    match outcome {
        Ok(html) => {
            info!(bytes = html.len(), "view rendered");
            if let Some(content) = page.element_mut(&anchors.content) {
                content.inner_html = html;
            }
            if let Some(loading) = page.element_mut(&anchors.loading) {
                loading.hidden = true;
            }
            Ok(())
        }
        Err((prefix, err)) => {
            warn!(error = %err, "render failed");
            if let Some(loading) = page.element_mut(&anchors.loading) {
                loading.inner_html = format!("{prefix}: {}", escape_html(&err.to_string()));
            }
            Err(err)
        }
    }
}
