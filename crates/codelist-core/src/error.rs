use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CodelistError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("invalid codelist file name: {name}")]
    InvalidCodelistName { name: String },

    /// A closed property references a codelist that no directory scope defines.
    #[error("missing codelists: {}", names.join(", "))]
    MissingCodelists { names: Vec<String> },

    /// A `+`/`-` file has no base codelist to modify.
    #[error("missing codelist for modification: {name}")]
    MissingTarget { name: String },
}

impl CodelistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Codelist names carried by a missing-codelist or missing-target error.
    pub fn missing_names(&self) -> Vec<&str> {
        match self {
            Self::MissingCodelists { names } => names.iter().map(String::as_str).collect(),
            Self::MissingTarget { name } => vec![name.as_str()],
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodelistError>;
