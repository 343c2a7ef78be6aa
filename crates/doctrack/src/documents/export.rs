use std::io::Write;

use super::views::DocumentView;

/// Write the renewal report as CSV with a header row.
pub fn write_alert_report<W: Write>(writer: W, rows: &[DocumentView]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for row in rows {
        csv_writer.serialize(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Report as an owned string, for HTTP bodies and stdout.
pub fn render_alert_report(rows: &[DocumentView]) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_alert_report(&mut buffer, rows)?;
    String::from_utf8(buffer).map_err(|err| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            err.to_string(),
        ))
    })
}
