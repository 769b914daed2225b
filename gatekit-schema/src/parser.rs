//! Schema document parser.
//!
//! This module reads an XML schema document into the raw [`Document`]
//! representation. The document root is `<idl>`; it holds `<schema>` blocks
//! (one per IDL file) and `<conversion>` declarations.

use crate::document::{
    ConversionDef, Definition, Document, EnumDef, FieldDef, MappingDef, SchemaDef, StructDef,
    TypeExpr, TypedefDef,
};
use crate::error::ParseError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parses a schema document from a string.
///
/// # Arguments
/// * `xml` - XML document content
///
/// # Returns
/// Parsed document or parse error.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed or contains invalid elements.
pub fn parse_document(xml: &str) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut document: Option<Document> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => parse_top_level(&mut reader, e, false, &mut document)?,
            Ok(Event::Empty(ref e)) => parse_top_level(&mut reader, e, true, &mut document)?,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    document.ok_or_else(|| ParseError::InvalidStructure {
        message: "No idl element found".to_string(),
    })
}

/// Dispatches one element found at document level.
fn parse_top_level(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
    document: &mut Option<Document>,
) -> Result<(), ParseError> {
    let name_bytes = e.name().as_ref().to_vec();
    let name = std::str::from_utf8(&name_bytes)?;

    if document.is_none() {
        if name == "idl" {
            *document = Some(Document::new());
            return Ok(());
        }
        return Err(ParseError::unknown_element(name, "document"));
    }

    match name {
        "schema" => {
            let schema = parse_schema(reader, e, empty)?;
            if let Some(doc) = document.as_mut() {
                doc.schemas.push(schema);
            }
        }
        "conversion" => {
            let conversion = parse_conversion(reader, e, empty)?;
            if let Some(doc) = document.as_mut() {
                doc.conversions.push(conversion);
            }
        }
        other => return Err(ParseError::unknown_element(other, "idl")),
    }

    Ok(())
}

/// Parses a schema document from a file.
///
/// # Errors
/// Returns `ParseError` if the file cannot be read or parsed.
pub fn parse_document_file(path: &std::path::Path) -> Result<Document, ParseError> {
    let xml = std::fs::read_to_string(path)?;
    parse_document(&xml)
}

/// Collected attributes of a single element.
struct Attributes {
    element: String,
    pairs: Vec<(String, String)>,
}

impl Attributes {
    fn read(e: &BytesStart<'_>) -> Result<Self, ParseError> {
        let element = std::str::from_utf8(e.name().as_ref())?.to_string();
        let mut pairs = Vec::new();
        for attr in e.attributes().flatten() {
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = std::str::from_utf8(&attr.value)?;
            pairs.push((key.to_string(), value.to_string()));
        }
        Ok(Self { element, pairs })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required(&self, key: &str) -> Result<String, ParseError> {
        self.get(key)
            .map(str::to_string)
            .ok_or_else(|| ParseError::missing_attr(&self.element, key))
    }

    fn flag(&self, key: &str) -> Result<bool, ParseError> {
        match self.get(key) {
            None => Ok(false),
            Some("true" | "1") => Ok(true),
            Some("false" | "0") => Ok(false),
            Some(other) => Err(ParseError::invalid_attr(&self.element, key, other)),
        }
    }

    fn type_expr(&self, key: &str) -> Result<TypeExpr, ParseError> {
        TypeExpr::parse(&self.required(key)?)
    }
}

/// Parses a `<schema>` block.
fn parse_schema(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<SchemaDef, ParseError> {
    let attrs = Attributes::read(e)?;
    let mut schema = SchemaDef::new(attrs.required("name")?, attrs.required("file")?);
    if empty {
        return Ok(schema);
    }

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let definition = parse_definition(reader, e, false)?;
                schema.add_definition(definition);
            }
            Ok(Event::Empty(ref e)) => {
                let definition = parse_definition(reader, e, true)?;
                schema.add_definition(definition);
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("unterminated schema '{}'", schema.name),
                });
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(schema)
}

/// Parses one named definition inside a schema block.
fn parse_definition(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<Definition, ParseError> {
    let attrs = Attributes::read(e)?;
    match attrs.element.as_str() {
        "struct" => {
            let mut struct_def = StructDef::new(attrs.required("name")?);
            if !empty {
                parse_children(reader, "struct", |child, child_empty, reader| {
                    if child.element != "field" {
                        return Err(ParseError::unknown_element(&child.element, "struct"));
                    }
                    if !child_empty {
                        skip_element(reader)?;
                    }
                    struct_def.add_field(FieldDef {
                        name: child.required("name")?,
                        ty: child.type_expr("type")?,
                        required: child.flag("required")?,
                    });
                    Ok(())
                })?;
            }
            Ok(Definition::Struct(struct_def))
        }
        "enum" => {
            let mut enum_def = EnumDef {
                name: attrs.required("name")?,
                values: Vec::new(),
            };
            if !empty {
                parse_children(reader, "enum", |child, child_empty, reader| {
                    if child.element != "value" {
                        return Err(ParseError::unknown_element(&child.element, "enum"));
                    }
                    if !child_empty {
                        skip_element(reader)?;
                    }
                    enum_def.values.push(child.required("name")?);
                    Ok(())
                })?;
            }
            Ok(Definition::Enum(enum_def))
        }
        "typedef" => {
            if !empty {
                skip_element(reader)?;
            }
            Ok(Definition::Typedef(TypedefDef {
                name: attrs.required("name")?,
                target: attrs.type_expr("type")?,
            }))
        }
        other => Err(ParseError::unknown_element(other, "schema")),
    }
}

/// Parses a `<conversion>` declaration.
fn parse_conversion(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<ConversionDef, ParseError> {
    let attrs = Attributes::read(e)?;
    let mut conversion = ConversionDef {
        name: attrs.required("name")?,
        from: attrs.required("from")?,
        to: attrs.required("to")?,
        mappings: Vec::new(),
    };

    if !empty {
        parse_children(reader, "conversion", |child, child_empty, reader| {
            if child.element != "mapping" {
                return Err(ParseError::unknown_element(&child.element, "conversion"));
            }
            if !child_empty {
                skip_element(reader)?;
            }
            conversion.mappings.push(MappingDef {
                to: child.required("to")?,
                from: child.required("from")?,
                override_source: child.flag("override")?,
            });
            Ok(())
        })?;
    }

    Ok(conversion)
}

/// Visits the direct children of the current element until its end tag.
fn parse_children<F>(
    reader: &mut Reader<&[u8]>,
    context: &str,
    mut visit: F,
) -> Result<(), ParseError>
where
    F: FnMut(Attributes, bool, &mut Reader<&[u8]>) -> Result<(), ParseError>,
{
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let attrs = Attributes::read(e)?;
                visit(attrs, false, reader)?;
            }
            Ok(Event::Empty(ref e)) => {
                let attrs = Attributes::read(e)?;
                visit(attrs, true, reader)?;
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("unterminated element '{context}'"),
                });
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Consumes everything up to and including the end tag of the current element.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), ParseError> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}
