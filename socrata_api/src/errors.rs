//! Error types for the SODA client.

/// Errors that can occur while deriving request URLs or fetching data.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A URL-dependent operation was attempted before an application token was set.
    #[error("application token is not set (use set_token)")]
    MissingToken,
    /// The endpoint suffix does not select a known decoder.
    #[error("no decoder for endpoint `{endpoint}`: expected a `.json` or `.csv` resource")]
    UnsupportedFormat { endpoint: String },
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed")]
    Transport(#[source] reqwest::Error),
    /// The API returned a non-success status with a body snippet.
    #[error("request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body could not be parsed by the selected decoder.
    #[error("failed to decode response body: {0}")]
    Decode(String),
}
