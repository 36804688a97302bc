#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed caller input. Nothing is produced.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("invalid DOCX: {0}")]
    InvalidDocx(String),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A style name was referenced that the registry never saw. Always a
    /// builder defect, never a data problem.
    #[error("style '{0}' is not registered")]
    MissingStyle(String),

    #[error("cannot {operation} while builder is in state {state}")]
    BuilderState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("direct splice failed: {0}")]
    Splice(String),

    #[error("reconstruction failed: {0}")]
    Reconstruct(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
}

impl Error {
    /// Errors that indicate a defect in this crate rather than bad input or a
    /// bad attachment. These are never swallowed by attachment recovery.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MissingStyle(_) | Error::BuilderState { .. })
    }
}
