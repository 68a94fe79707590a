use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankrecError {
    #[error("PDF is encrypted; a password is required")]
    PasswordRequired,

    #[error("Incorrect PDF password")]
    PasswordIncorrect,

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Rules error: {0}")]
    Rules(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BankrecError>;
