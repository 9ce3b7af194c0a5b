use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use tessitura_pitch::PitchRecord;

/// Serializes the aggregated records as a CSV document at `path`.
///
/// An existing file is truncated and rewritten. Fields are joined
/// with plain commas; embedded delimiters in file names are not
/// escaped.
pub fn write_csv(path: &Path, records: &[PitchRecord]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    writeln!(out, "File,Pitch,Confidence")?;
    for record in records {
        writeln!(out, "{},{},{}", record.file, record.pitch, record.confidence)?;
    }

    out.flush()
}
