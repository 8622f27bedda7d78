//! Sheet file formats.

mod xml;

pub use xml::{
    CellRecord, format_color, parse_color, parse_xml_content, read_xml, write_xml,
    write_xml_content,
};
