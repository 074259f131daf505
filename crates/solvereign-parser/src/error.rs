use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("forecast text is empty")]
    EmptyInput,

    #[error("forecast has no PASS or WARN lines; nothing to expand")]
    NoUsableLines,
}
