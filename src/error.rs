#[derive(Debug, thiserror::Error)]
pub enum DuoError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown mode '{0}', expected 'server' or 'client'")]
    UnknownMode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DuoError {
    /// Whether this error only means the peer went away.
    pub fn is_disconnect(&self) -> bool {
        match self {
            DuoError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

pub type DuoResult<T> = Result<T, DuoError>;
