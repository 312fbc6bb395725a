use thiserror::Error;

/// Everything a query pipeline can fail with.
///
/// `Canceled` is internal bookkeeping for superseded operations: it is never
/// surfaced to the user and the controller discards it silently.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("place lookup failed: {0}")]
    LookupFailed(String),
    #[error("no match for place query '{0}'")]
    NoMatch(String),
    #[error("forecast provider failed: {0}")]
    Provider(String),
    #[error("forecast response carried no timeseries")]
    EmptyForecast,
    #[error("operation superseded or torn down")]
    Canceled,
}

impl QueryError {
    /// The message shown in the dashboard's error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::LookupFailed(_) => "Klarte ikke å slå opp sted",
            Self::NoMatch(_) => "Fant ingen treff for søket",
            Self::Provider(_) => "MET returnerte en feilstatus",
            Self::EmptyForecast => "Ingen data returnert fra MET",
            Self::Canceled => "Ukjent feil",
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}
