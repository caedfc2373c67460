//! CSV export of the full record log.
//!
//! Output is UTF-8 with a byte-order mark so spreadsheet tools detect the
//! encoding of non-ASCII member names.

use crate::model::record::AttendanceRecord;
use crate::repo::row::{header_row, record_to_row};
use std::io::{self, Write};

pub const UTF8_BOM: &str = "\u{feff}";
pub const EXPORT_FILE_NAME: &str = "attendance_data.csv";

/// Renders records as BOM-prefixed CSV text.
pub fn render_csv(records: &[AttendanceRecord]) -> String {
    let mut out = String::from(UTF8_BOM);
    push_line(&mut out, &header_row());
    for record in records {
        push_line(&mut out, &record_to_row(record));
    }
    out
}

/// Streams the CSV rendering into `writer`.
pub fn write_csv<W: Write>(records: &[AttendanceRecord], mut writer: W) -> io::Result<()> {
    writer.write_all(render_csv(records).as_bytes())?;
    writer.flush()
}

fn push_line(out: &mut String, cells: &[String]) {
    for (index, cell) in cells.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        push_field(out, cell);
    }
    out.push('\n');
}

fn push_field(out: &mut String, value: &str) {
    if value.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}
