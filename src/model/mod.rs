use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::io::delimited::Record;

/// Suffix marking a repeated (array) field type.
pub const REPEATED_MARKER: &str = "[]";

/// Represents one entity type of the documented data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaObject {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub csv_name: Option<String>,
}

impl SchemaObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            csv_name: None,
        }
    }

    pub fn from_record(record: &Record) -> Self {
        Self {
            name: column(record, "name"),
            label: optional_column(record, "label"),
            description: optional_column(record, "description"),
            csv_name: optional_column(record, "csv_name"),
        }
    }

    /// Label for headings, falling back to the object name.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Primitive type tags with dedicated documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "name")]
pub enum Primitive {
    Boolean,
    DateTime,
    /// Any other free-text tag, such as `string` or `number`.
    Other(String),
}

impl Primitive {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "boolean" => Primitive::Boolean,
            "datetime" => Primitive::DateTime,
            other => Primitive::Other(other.to_string()),
        }
    }
}

/// What a field's base type refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target")]
pub enum FieldKind {
    Primitive(Primitive),
    EnumRef(String),
    ObjectRef(String),
}

/// A field type resolved against the objects and enums of its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    /// Type exactly as declared, including any repeated marker.
    pub raw: String,
    /// Declared type with the repeated marker stripped.
    pub base: String,
    pub repeated: bool,
    pub kind: FieldKind,
}

impl FieldType {
    /// Resolves `raw` against the known object and enum names. Object names
    /// take precedence over enum names.
    pub fn resolve(raw: &str, objects: &BTreeSet<String>, enums: &BTreeSet<String>) -> Self {
        let (base, repeated) = split_repeated(raw);
        let kind = if objects.contains(base) {
            FieldKind::ObjectRef(base.to_string())
        } else if enums.contains(base) {
            FieldKind::EnumRef(base.to_string())
        } else {
            FieldKind::Primitive(Primitive::from_tag(base))
        };
        Self {
            raw: raw.to_string(),
            base: base.to_string(),
            repeated,
            kind,
        }
    }

    /// Target object when the field is a containment edge.
    pub fn object_ref(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::ObjectRef(name) => Some(name),
            _ => None,
        }
    }
}

/// Splits a declared type into its base type and repeated flag.
pub fn split_repeated(raw: &str) -> (&str, bool) {
    match raw.strip_suffix(REPEATED_MARKER) {
        Some(base) => (base, true),
        None => (raw, false),
    }
}

/// An attribute or containment relation owned by one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub object: String,
    pub json_name: Option<String>,
    pub csv_column: Option<String>,
    pub csv_section: Option<String>,
    pub field_type: FieldType,
    pub description: Option<String>,
}

impl SchemaField {
    /// Name of the field in JSON-oriented views, if it appears in them.
    pub fn json_name(&self) -> Option<&str> {
        self.json_name.as_deref()
    }

    /// CSV section key: the explicit override or the owning object.
    pub fn section_key(&self) -> &str {
        self.csv_section.as_deref().unwrap_or(&self.object)
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// One legal value of an enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub enum_name: String,
    pub value: String,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl EnumValue {
    pub fn from_record(record: &Record) -> Self {
        Self {
            enum_name: column(record, "enum"),
            value: column(record, "value"),
            label: optional_column(record, "label"),
            description: optional_column(record, "description"),
        }
    }

    /// Label shown in the CSV view, falling back to the raw value.
    pub fn csv_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

/// The three relations of a documented data model, insertion ordered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub objects: Vec<SchemaObject>,
    pub fields: Vec<SchemaField>,
    pub enum_values: Vec<EnumValue>,
    enum_index: BTreeMap<String, Vec<usize>>,
}

impl Schema {
    /// Assembles a schema from raw records, resolving every field type once.
    pub fn from_records(objects: &[Record], fields: &[Record], enum_values: &[Record]) -> Self {
        let objects: Vec<SchemaObject> = objects.iter().map(SchemaObject::from_record).collect();
        let enum_values: Vec<EnumValue> = enum_values.iter().map(EnumValue::from_record).collect();

        let object_names: BTreeSet<String> = objects.iter().map(|obj| obj.name.clone()).collect();
        let enum_names: BTreeSet<String> =
            enum_values.iter().map(|value| value.enum_name.clone()).collect();

        let fields = fields
            .iter()
            .map(|record| SchemaField {
                object: column(record, "object"),
                json_name: optional_column(record, "json_name"),
                csv_column: optional_column(record, "csv_column"),
                csv_section: optional_column(record, "csv_section"),
                field_type: FieldType::resolve(&column(record, "type"), &object_names, &enum_names),
                description: optional_column(record, "description"),
            })
            .collect();

        Self::new(objects, fields, enum_values)
    }

    /// Builds a schema from already typed relations.
    pub fn new(
        objects: Vec<SchemaObject>,
        fields: Vec<SchemaField>,
        enum_values: Vec<EnumValue>,
    ) -> Self {
        let mut enum_index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, value) in enum_values.iter().enumerate() {
            enum_index
                .entry(value.enum_name.clone())
                .or_default()
                .push(idx);
        }
        Self {
            objects,
            fields,
            enum_values,
            enum_index,
        }
    }

    pub fn object(&self, name: &str) -> Option<&SchemaObject> {
        self.objects.iter().find(|obj| obj.name == name)
    }

    /// Members of `enum_name` in declaration order.
    pub fn enum_members(&self, enum_name: &str) -> Vec<&EnumValue> {
        self.enum_index
            .get(enum_name)
            .map(|indices| indices.iter().map(|idx| &self.enum_values[*idx]).collect())
            .unwrap_or_default()
    }

    /// Fields owned by `object` in declaration order.
    pub fn fields_of<'a>(&'a self, object: &'a str) -> impl Iterator<Item = &'a SchemaField> + 'a {
        self.fields.iter().filter(move |field| field.object == object)
    }
}

/// Every cell is trimmed; optional cells that end up empty are absent.
fn column(record: &Record, name: &str) -> String {
    record
        .get(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn optional_column(record: &Record, name: &str) -> Option<String> {
    record.get(name).and_then(|value| normalize_optional(value))
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::delimited::parse_table;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn field_types_resolve_once() {
        let objects = names(&["DepthInterval"]);
        let enums = names(&["Texture"]);

        let child = FieldType::resolve("DepthInterval[]", &objects, &enums);
        assert_eq!(child.kind, FieldKind::ObjectRef("DepthInterval".into()));
        assert!(child.repeated);
        assert_eq!(child.base, "DepthInterval");

        let texture = FieldType::resolve("Texture", &objects, &enums);
        assert_eq!(texture.kind, FieldKind::EnumRef("Texture".into()));

        let flag = FieldType::resolve("boolean", &objects, &enums);
        assert_eq!(flag.kind, FieldKind::Primitive(Primitive::Boolean));

        let tags = FieldType::resolve("string[]", &objects, &enums);
        assert_eq!(tags.kind, FieldKind::Primitive(Primitive::Other("string".into())));
        assert!(tags.repeated);
    }

    #[test]
    fn object_names_win_over_enum_names() {
        let both = names(&["Color"]);
        let resolved = FieldType::resolve("Color", &both, &both);
        assert_eq!(resolved.object_ref(), Some("Color"));
    }

    #[test]
    fn schema_from_records_keeps_order_and_groups_enums() {
        let objects = parse_table("name,label\nSite,\nDepthInterval,Depth");
        let fields = parse_table(
            "object,json_name,type\nSite,depth_intervals,DepthInterval[]\nDepthInterval,texture,Texture",
        );
        let values = parse_table("enum,value,label\nTexture,sand,Sand\nOther,x,\nTexture,clay,");

        let schema = Schema::from_records(&objects.records, &fields.records, &values.records);

        assert_eq!(schema.objects[0].display_name(), "Site");
        assert_eq!(schema.objects[1].display_name(), "Depth");
        assert_eq!(
            schema.fields[1].field_type.kind,
            FieldKind::EnumRef("Texture".into())
        );
        let members: Vec<&str> = schema
            .enum_members("Texture")
            .iter()
            .map(|value| value.csv_label())
            .collect();
        assert_eq!(members, vec!["Sand", "clay"]);
        assert!(schema.fields[0].csv_column.is_none());
    }

    #[test]
    fn required_and_optional_cells_are_trimmed_alike() {
        let objects = parse_table("name,label\n Site , Site label ");
        let fields = parse_table("object,json_name,type\n Site , name , string[] ");
        let values = parse_table("enum,value\n Texture , sand ");

        let schema = Schema::from_records(&objects.records, &fields.records, &values.records);

        assert_eq!(schema.objects[0].name, "Site");
        assert_eq!(schema.objects[0].label.as_deref(), Some("Site label"));
        assert_eq!(schema.fields[0].object, "Site");
        assert_eq!(schema.fields[0].json_name(), Some("name"));
        assert_eq!(schema.fields[0].field_type.base, "string");
        assert!(schema.fields[0].field_type.repeated);
        assert_eq!(schema.enum_members("Texture")[0].value, "sand");
    }
}
