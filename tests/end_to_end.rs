use std::collections::HashMap;
use std::fs;

use async_trait::async_trait;
use export_docs::bootstrap::{self, Page, RenderRequest, RenderSettings};
use export_docs::error::{FetchError, Relation};
use export_docs::io::source::{DefaultFetcher, LoadOptions, ResourceFetcher, SourceSpec, load_schema};
use export_docs::render::ViewMode;
use export_docs::validate::{self, FieldIndex};
use export_docs::{GraphError, ToolError, sync};
use tempfile::tempdir;

const OBJECTS: &str = "name,label,description\nSite,Site,A sampled place\nDepthInterval,Depth interval,\n";
const FIELDS: &str = "object,json_name,csv_column,csv_section,type,description\n\
Site,depth_intervals,,,DepthInterval[],\n\
DepthInterval,top,Top (cm),,Depth,\"Top, in centimetres\"\n";
const ENUM_VALUES: &str = "enum,value,label,description\nDepth,shallow,Shallow,\nDepth,deep,Deep,\n";

/// Serves fixed texts by location; unknown locations answer 404.
struct StubFetcher {
    texts: HashMap<String, String>,
}

impl StubFetcher {
    fn new(base: &str, relations: &[(Relation, &str)]) -> Self {
        let texts = relations
            .iter()
            .map(|(relation, text)| (format!("{base}/{relation}.csv"), text.to_string()))
            .collect();
        Self { texts }
    }
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn fetch_text(&self, location: &str) -> Result<String, FetchError> {
        self.texts
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                location: location.to_string(),
                status: 404,
            })
    }
}

fn full_fetcher() -> StubFetcher {
    StubFetcher::new(
        "https://example.com/export",
        &[
            (Relation::Objects, OBJECTS),
            (Relation::Fields, FIELDS),
            (Relation::EnumValues, ENUM_VALUES),
        ],
    )
}

fn request(mode: ViewMode, prefix: &str) -> RenderRequest {
    RenderRequest {
        source: SourceSpec::LocalPath("https://example.com/export".into()),
        mode,
        prefix: prefix.into(),
        sheets_override: None,
    }
}

async fn render(mode: ViewMode) -> Page {
    let mut page = Page::with_anchors("docs");
    bootstrap::init_export_docs(
        &request(mode, "docs"),
        &RenderSettings::default(),
        &mut page,
        &full_fetcher(),
    )
    .await
    .expect("render succeeded");
    page
}

#[tokio::test]
async fn outline_walks_from_sites_to_leaf_fields() {
    let page = render(ViewMode::Tree).await;
    let content = &page.element("docs-content").expect("content").inner_html;

    assert_eq!(
        content,
        "<pre><code><a href=\"#obj-site\">sites[]</a>\n  \
         <a href=\"#obj-depthinterval\">depth_intervals[]</a>\n    \
         top</code></pre>"
    );
    assert!(page.element("docs-loading").expect("loading").hidden);
}

#[tokio::test]
async fn field_reference_shows_nested_path() {
    let page = render(ViewMode::Fields).await;
    let content = &page.element("docs-content").expect("content").inner_html;

    assert!(content.contains("id=\"obj-depthinterval\""));
    assert!(content.contains("JSON path: <code>sites[].depth_intervals[]</code>"));
    assert!(content.contains("<td>shallow, deep</td>"));
}

#[tokio::test]
async fn csv_view_lists_enum_labels() {
    let page = render(ViewMode::Csv).await;
    let content = &page.element("docs-content").expect("content").inner_html;

    assert!(content.contains("<tr><td>Top (cm)</td><td>Shallow, Deep</td><td>Top, in centimetres</td></tr>"));
    assert!(content.contains("id=\"csv-depthinterval\""));
    assert!(!content.contains("id=\"overview\""));
}

#[tokio::test]
async fn hierarchy_is_stable_across_renders() {
    let first = render(ViewMode::Hierarchy).await;
    let second = render(ViewMode::Hierarchy).await;
    assert_eq!(first, second);
    assert!(
        first
            .element("docs-content")
            .expect("content")
            .inner_html
            .contains("<span class=\"field-name\">depth_intervals[]</span>")
    );
}

#[tokio::test]
async fn failed_enum_fetch_rejects_the_whole_load() {
    let fetcher = StubFetcher::new(
        "https://example.com/export",
        &[(Relation::Objects, OBJECTS), (Relation::Fields, FIELDS)],
    );

    let load = load_schema(
        &SourceSpec::LocalPath("https://example.com/export".into()),
        &fetcher,
        &LoadOptions::default(),
    )
    .await;
    let err = load.expect_err("load must fail");
    assert_eq!(err.resource(), Some(Relation::EnumValues));

    let mut page = Page::with_anchors("csv");
    let result = bootstrap::init_export_docs(
        &request(ViewMode::Csv, "csv"),
        &RenderSettings::default(),
        &mut page,
        &fetcher,
    )
    .await;

    assert!(matches!(result, Err(ToolError::Load(_))));
    let loading = page.element("csv-loading").expect("loading");
    assert!(!loading.hidden);
    assert_eq!(
        loading.inner_html,
        "Error loading: failed to load enum_values: \
         https://example.com/export/enum_values.csv returned HTTP 404"
    );
    assert_eq!(page.element("csv-content").expect("content").inner_html, "");
}

#[tokio::test]
async fn render_failure_is_written_to_the_loading_element() {
    let fetcher = StubFetcher::new(
        "https://example.com/export",
        &[
            (Relation::Objects, "name\nSite\nSample\n"),
            (
                Relation::Fields,
                "object,json_name,type\nSite,samples,Sample[]\nSample,site,Site\n",
            ),
            (Relation::EnumValues, "enum,value\n"),
        ],
    );
    let mut page = Page::with_anchors("hierarchy");
    let result = bootstrap::init_export_docs(
        &request(ViewMode::Hierarchy, "hierarchy"),
        &RenderSettings::default(),
        &mut page,
        &fetcher,
    )
    .await;

    assert!(matches!(
        result,
        Err(ToolError::Graph(GraphError::Cyclic { ref path })) if path.len() == 3
    ));
    let loading = page.element("hierarchy-loading").expect("loading");
    assert!(!loading.hidden);
    assert_eq!(
        loading.inner_html,
        "Error rendering: cyclic containment: Site -&gt; Sample -&gt; Site"
    );
    assert_eq!(page.element("hierarchy-content").expect("content").inner_html, "");
}

#[tokio::test]
async fn missing_output_anchor_fails_before_loading() {
    let mut page = Page::new();
    let result = bootstrap::init_export_docs(
        &request(ViewMode::Tree, "tree"),
        &RenderSettings::default(),
        &mut page,
        &full_fetcher(),
    )
    .await;
    assert!(matches!(result, Err(ToolError::MissingAnchor(id)) if id == "tree-loading"));
}

#[tokio::test]
async fn spreadsheet_override_uses_export_urls() {
    let template = "https://sheets.example.com/{id}/export?sheet={sheet}";
    let fetcher = StubFetcher {
        texts: [
            ("objects", OBJECTS),
            ("fields", FIELDS),
            ("enum_values", ENUM_VALUES),
        ]
        .into_iter()
        .map(|(sheet, text)| {
            (
                format!("https://sheets.example.com/abc/export?sheet={sheet}"),
                text.to_string(),
            )
        })
        .collect(),
    };
    let settings = RenderSettings {
        load: LoadOptions {
            sheet_url_template: template.to_string(),
        },
        ..RenderSettings::default()
    };
    let mut request = request(ViewMode::Fields, "fields");
    request.sheets_override = Some("abc".into());

    let mut page = Page::with_anchors("fields");
    bootstrap::init_export_docs(&request, &settings, &mut page, &fetcher)
        .await
        .expect("render succeeded");
    assert!(
        page.element("fields-content")
            .expect("content")
            .inner_html
            .contains("JSON path: <code>sites[]</code>")
    );
}

#[tokio::test]
async fn local_directory_source_reads_files() {
    let dir = tempdir().expect("temporary directory");
    fs::write(dir.path().join("objects.csv"), OBJECTS).expect("objects written");
    fs::write(dir.path().join("fields.csv"), FIELDS).expect("fields written");
    fs::write(dir.path().join("enum_values.csv"), ENUM_VALUES).expect("enum values written");

    let source = SourceSpec::LocalPath(dir.path().display().to_string());
    let schema = load_schema(&source, &DefaultFetcher::new(), &LoadOptions::default())
        .await
        .expect("schema loaded");

    assert_eq!(schema.objects.len(), 2);
    assert_eq!(schema.fields.len(), 2);
    assert_eq!(schema.enum_members("Depth").len(), 2);
}

#[tokio::test]
async fn missing_local_file_is_a_load_error() {
    let dir = tempdir().expect("temporary directory");
    fs::write(dir.path().join("objects.csv"), OBJECTS).expect("objects written");

    let source = SourceSpec::LocalPath(dir.path().display().to_string());
    let err = load_schema(&source, &DefaultFetcher::new(), &LoadOptions::default())
        .await
        .expect_err("load must fail");
    assert!(matches!(
        err.resource(),
        Some(Relation::Fields | Relation::EnumValues)
    ));
}

#[tokio::test]
async fn synced_workbook_loads_as_a_source() {
    let dir = tempdir().expect("temporary directory");
    fs::write(dir.path().join("objects.csv"), OBJECTS).expect("objects written");
    fs::write(dir.path().join("fields.csv"), FIELDS).expect("fields written");
    fs::write(dir.path().join("enum_values.csv"), ENUM_VALUES).expect("enum values written");

    let workbook = dir.path().join("schema.xlsx");
    let dry_run = sync::sync_to_workbook(dir.path(), &workbook, true).expect("dry run");
    assert_eq!(dry_run[1].sheet_name, "fields");
    assert_eq!(dry_run[1].rows, 3);
    assert!(!workbook.exists());

    sync::sync_to_workbook(dir.path(), &workbook, false).expect("workbook written");
    let from_workbook = load_schema(
        &SourceSpec::Workbook(workbook),
        &DefaultFetcher::new(),
        &LoadOptions::default(),
    )
    .await
    .expect("workbook loaded");
    let from_files = load_schema(
        &SourceSpec::LocalPath(dir.path().display().to_string()),
        &DefaultFetcher::new(),
        &LoadOptions::default(),
    )
    .await
    .expect("files loaded");

    assert_eq!(from_workbook, from_files);
}

#[tokio::test]
async fn fixtures_are_checked_against_the_schema() {
    let schema = load_schema(
        &SourceSpec::LocalPath("https://example.com/export".into()),
        &full_fetcher(),
        &LoadOptions::default(),
    )
    .await
    .expect("schema loaded");
    let index = FieldIndex::build(&schema);

    let dir = tempdir().expect("temporary directory");
    fs::write(dir.path().join("export.csv"), "Top (cm),Colour\n10,red\n").expect("csv fixture");
    fs::write(
        dir.path().join("export.json"),
        r#"{"sites": [{"depth_intervals": [{"top": 10}, {"bottom": 20}]}]}"#,
    )
    .expect("json fixture");
    fs::write(dir.path().join("export.raw.json"), "not json").expect("raw fixture");

    let reports = validate::validate_fixture_dir(dir.path(), &index, &Default::default())
        .expect("fixtures validated");

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].errors, vec!["Undocumented CSV column: 'Colour'"]);
    assert_eq!(
        reports[1].errors,
        vec!["Undocumented field 'bottom' in DepthInterval (path: sites[].depth_intervals[].bottom)"]
    );
}
