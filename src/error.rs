use thiserror::Error;

/// Anything that makes a single card unusable. The card is dropped and the
/// run moves on to the next one.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("DOM query failed: {0}")]
    Dom(String),

    #[error("invalid selector \"{selector}\"")]
    Selector { selector: String },

    #[error("image download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("image write failed: {0}")]
    Io(#[from] std::io::Error),
}
