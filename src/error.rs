use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while importing a subscription export.
///
/// Every failure is terminal for the call that produced it.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The declared content type is not one of the recognised tokens.
    #[error("Unsupported content type: {0}")]
    UnsupportedFormat(String),

    /// The input is not the expected container or text format, or reading it failed.
    #[error("{context}")]
    MalformedInput {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A ZIP archive was read to its end without finding a known subscriptions file.
    #[error(
        "Unable to find a subscriptions.csv file (try extracting and selecting the csv file)"
    )]
    SubscriptionFileNotFound,

    /// A JSON export held records, but none of them had a usable channel id.
    #[error("Found only invalid channel ids")]
    NoValidRecords,
}

impl ImportError {
    pub(crate) fn malformed(context: impl Into<String>) -> Self {
        Self::MalformedInput {
            context: context.into(),
            source: None,
        }
    }

    pub(crate) fn malformed_from(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::MalformedInput {
            context: context.into(),
            source: Some(source.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn malformed_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err = ImportError::malformed_from("Error reading CSV file", io);

        assert_eq!(err.to_string(), "Error reading CSV file");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("eof"));
    }

    #[test]
    fn unsupported_format_names_the_token() {
        let err = ImportError::UnsupportedFormat("xml".to_string());
        assert_eq!(err.to_string(), "Unsupported content type: xml");
    }
}
