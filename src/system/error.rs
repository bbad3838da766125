/// Why a single probe could not produce a reading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    /// The metric is not exposed on this host (no sensor, no tool, no data yet).
    #[error("{source_name} unavailable: {reason}")]
    Unavailable {
        source_name: String,
        reason: String,
    },

    /// The platform call itself errored or returned nonsense.
    #[error("{source_name} query failed: {detail}")]
    OsQueryFailed { source_name: String, detail: String },

    /// Output from a tool or pseudo-file could not be interpreted.
    #[error("could not parse '{input}': {detail}")]
    ParseFailed { input: String, detail: String },
}

impl ProbeError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ProbeError::Unavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn os_query(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        ProbeError::OsQueryFailed {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }

    pub fn parse(input: impl Into<String>, detail: impl Into<String>) -> Self {
        ProbeError::ParseFailed {
            input: input.into(),
            detail: detail.into(),
        }
    }

    /// `Unavailable` and `ParseFailed` are normal on hosts without the
    /// expected hardware and only deserve an informational note.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ProbeError::Unavailable { .. } | ProbeError::ParseFailed { .. }
        )
    }
}
