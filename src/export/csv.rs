use crate::export::filter::ExportRow;
use crate::errors::AppResult;
use csv::Writer;
use std::io::Write;
use tracing::warn;

/// Serialize `rows` with a header line. A row that fails to serialize is
/// skipped and counted; the rest are still written.
pub fn write_rows<W: Write>(out: W, rows: &[ExportRow]) -> AppResult<(usize, usize)> {
    let mut wtr = Writer::from_writer(out);
    let mut written = 0;
    let mut failed = 0;

    if rows.is_empty() {
        // serde only emits headers alongside the first record
        wtr.write_record([
            "Name",
            "Email",
            "Phone",
            "Age",
            "City",
            "Organization",
            "Profession",
            "Hours in Period",
            "Total Lifetime Hours",
            "Total Bags Donated",
            "Status",
            "Registered",
        ])?;
    }

    for row in rows {
        match wtr.serialize(row) {
            Ok(()) => written += 1,
            Err(e) => {
                warn!(name = %row.name, error = %e, "export row skipped");
                failed += 1;
            }
        }
    }

    wtr.flush()?;
    Ok((written, failed))
}
