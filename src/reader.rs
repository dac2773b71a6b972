use std::{fs::File, io::BufRead, io::BufReader, path::Path};

use tracing::info;

use crate::error::Error;

/// One data line split on whitespace, not yet converted to numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub name: String,
    pub amount: String,
    pub price: String,
}

/// Read every data line of `reader`.
/// The first line is a header and is dropped without being looked at.
/// Tokens past the third are ignored.
pub fn read_rows<R>(reader: R) -> Result<Vec<RawRow>, Error>
where
    R: BufRead,
{
    let mut lines = reader.lines();
    match lines.next() {
        Some(header) => {
            header.map_err(read_failure)?;
        }
        None => return Err(Error::MissingHeader),
    }

    // Line numbers are 1-based and count the header.
    lines
        .enumerate()
        .map(|(idx, line)| {
            let line = line.map_err(read_failure)?;
            let mut tokens = line.split_whitespace();
            let mut column = |column| {
                tokens
                    .next()
                    .map(str::to_string)
                    .ok_or(Error::MissingToken {
                        line: idx + 2,
                        column,
                    })
            };
            Ok(RawRow {
                name: column(1)?,
                amount: column(2)?,
                price: column(3)?,
            })
        })
        .collect()
}

/// Open `path` and read its rows. The file handle is closed on return,
/// whether or not reading succeeded.
pub fn read_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<RawRow>, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileAccess {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let rows = read_rows(BufReader::new(file)).map_err(|e| match e {
        Error::FileAccess { reason, .. } => Error::FileAccess {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })?;
    info!(path = %path.display(), rows = rows.len(), "read input rows");
    Ok(rows)
}

fn read_failure(e: std::io::Error) -> Error {
    Error::FileAccess {
        path: String::new(),
        reason: e.to_string(),
    }
}
