//! Reader and writer for the XML sheet format.
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <spreadsheet>
//!   <cell name="A1">
//!     <bgcolor>FFFFFFFF</bgcolor>
//!     <text>=B1*2</text>
//!   </cell>
//! </spreadsheet>
//! ```
//!
//! Only the raw text and the background color are stored; values are
//! recomputed when the records are replayed into a sheet.

use cellcalc_engine::engine::{CellRef, DEFAULT_BG_COLOR};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::error::{Result, SheetError};

/// One saved cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellRecord {
    pub cell: CellRef,
    pub bg_color: u32,
    pub text: String,
}

impl CellRecord {
    pub fn new(cell: CellRef, bg_color: u32, text: &str) -> Self {
        CellRecord {
            cell,
            bg_color,
            text: text.to_string(),
        }
    }
}

/// Which child element text is currently being collected for.
#[derive(Clone, Copy, PartialEq)]
enum Field {
    None,
    BgColor,
    Text,
}

struct PendingCell {
    cell: CellRef,
    bg_color: Option<String>,
    text: String,
}

/// Read an XML sheet file.
pub fn read_xml(path: &Path) -> Result<Vec<CellRecord>> {
    let content = fs::read_to_string(path)?;
    parse_xml_content(&content)
}

/// Parse XML sheet content into records, in document order.
///
/// Cell names must be single-letter references; checking them against a
/// particular sheet size is left to the caller.
pub fn parse_xml_content(xml: &str) -> Result<Vec<CellRecord>> {
    // Text is not trimmed: leading and trailing spaces in a cell's text are data.
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut records = Vec::new();
    let mut current: Option<PendingCell> = None;
    let mut field = Field::None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"cell" => current = Some(start_cell(&e)?),
                b"bgcolor" if current.is_some() => {
                    field = Field::BgColor;
                    if let Some(pending) = current.as_mut() {
                        pending.bg_color = Some(String::new());
                    }
                }
                b"text" if current.is_some() => {
                    field = Field::Text;
                    if let Some(pending) = current.as_mut() {
                        pending.text.clear();
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"cell" {
                    records.push(finish_cell(start_cell(&e)?)?);
                }
            }
            Event::Text(e) => {
                if let Some(pending) = current.as_mut() {
                    let text = e.unescape()?;
                    match field {
                        Field::BgColor => pending.bg_color.get_or_insert_with(String::new).push_str(&text),
                        Field::Text => pending.text.push_str(&text),
                        Field::None => {}
                    }
                }
            }
            Event::CData(e) => {
                if let Some(pending) = current.as_mut() {
                    if field == Field::Text {
                        pending.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"bgcolor" | b"text" => field = Field::None,
                b"cell" => {
                    if let Some(pending) = current.take() {
                        records.push(finish_cell(pending)?);
                    }
                    field = Field::None;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn start_cell(e: &BytesStart<'_>) -> Result<PendingCell> {
    let mut name = None;
    for a in e.attributes().with_checks(false) {
        let a = a?;
        if a.key.as_ref() == b"name" {
            name = Some(a.unescape_value()?.to_string());
        }
    }
    let name = name.ok_or(SheetError::MissingAttribute {
        element: "cell",
        attribute: "name",
    })?;
    let cell = CellRef::from_str(name.trim()).ok_or(SheetError::InvalidCellName(name))?;
    Ok(PendingCell {
        cell,
        bg_color: None,
        text: String::new(),
    })
}

fn finish_cell(pending: PendingCell) -> Result<CellRecord> {
    let bg_color = match pending.bg_color {
        Some(hex) => parse_color(&hex)?,
        None => DEFAULT_BG_COLOR,
    };
    Ok(CellRecord {
        cell: pending.cell,
        bg_color,
        text: pending.text,
    })
}

/// Parse an ARGB color written as exactly 8 hex digits, case-insensitive.
pub fn parse_color(hex: &str) -> Result<u32> {
    let trimmed = hex.trim();
    if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SheetError::InvalidColor(hex.to_string()));
    }
    u32::from_str_radix(trimmed, 16).map_err(|_| SheetError::InvalidColor(hex.to_string()))
}

/// Format a color as 8 uppercase hex digits.
pub fn format_color(color: u32) -> String {
    format!("{:08X}", color)
}

/// Write records to an XML sheet file.
pub fn write_xml(path: &Path, records: &[CellRecord]) -> Result<()> {
    let content = write_xml_content(records)?;
    fs::write(path, content)?;
    Ok(())
}

/// Write records as XML sheet content, in the order given.
pub fn write_xml_content(records: &[CellRecord]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("spreadsheet")))?;

    for record in records {
        let name = record.cell.to_string();
        let mut cell = BytesStart::new("cell");
        cell.push_attribute(("name", name.as_str()));
        writer.write_event(Event::Start(cell))?;

        write_text_element(&mut writer, "bgcolor", &format_color(record.bg_color))?;
        write_text_element(&mut writer, "text", &record.text)?;

        writer.write_event(Event::End(BytesEnd::new("cell")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("spreadsheet")))?;

    let bytes = writer.into_inner().into_inner();
    let mut content = String::from_utf8_lossy(&bytes).to_string();
    content.push('\n');
    Ok(content)
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
