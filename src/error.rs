use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// The requested configuration yields an unusable (zero-length) buffer.
    InvalidConfig {
        sample_rate: u32,
        duration_seconds: f64,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidConfig {
                sample_rate,
                duration_seconds,
            } => write!(
                f,
                "invalid engine config: {sample_rate} Hz x {duration_seconds} s gives an empty buffer"
            ),
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug)]
pub enum DbError {
    /// A table payload could not be decoded into key/value records.
    BadPayload {
        table: &'static str,
        detail: String,
    },
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::BadPayload { table, detail } => {
                write!(f, "bad {table} table payload: {detail}")
            }
        }
    }
}

impl std::error::Error for DbError {}
