//! Display-list JSON output

use crate::report::ReportDocument;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, doc: &ReportDocument) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, doc)?;
    writeln!(writer)
}
