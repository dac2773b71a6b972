use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("failed to access input file `{path}`, reason: `{reason}`")]
    FileAccess { path: String, reason: String },
    #[error("input is empty, expected at least a header line")]
    MissingHeader,
    #[error("line {line}: missing column {column} (expected `<product> <amount> <price>`)")]
    MissingToken { line: usize, column: usize },
    #[error("invalid amount `{token}` for product `{product}`: {reason}")]
    InvalidAmount {
        product: String,
        token: String,
        reason: String,
    },
    #[error("invalid price `{token}` for product `{product}`: {reason}")]
    InvalidPrice {
        product: String,
        token: String,
        reason: String,
    },
    #[error("output directory `{0}` does not exist")]
    OutputDirectory(String),
    #[error("failed to render `{title}`, reason: `{reason}`")]
    Rendering { title: String, reason: String },
    #[error("failed to write summary, reason: `{0}`")]
    SummaryOutput(String),
}
