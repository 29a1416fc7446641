pub type BoxedError = Box<dyn std::error::Error>;
pub type Result<T> = std::result::Result<T, BoxedError>;

#[derive(Debug)]
pub enum Error {
    ConnectionReset,
    /// The thread pool doesn't accept jobs anymore
    ShuttingDown,
    NotFound(String),
    /// The path exists but doesn't accept the method of the request
    MethodNotAllowed(String),
    BadRequest(String),
    /// The session store could not load or save a session
    SessionUnavailable(String),
    /// A session slot holds something other than the requested type
    SessionTypeMismatch(&'static str),
    /// A form field is missing or malformed
    FormDecode(String),
    /// Completion index outside of the pending orders of a restaurant
    IndexOutOfRange { index: i64, len: usize },
    /// An order record could not be written
    Persistence(String),
}

impl Error {
    /// HTTP status code a handler failing with this error should answer with
    pub fn status(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            Error::BadRequest(_) | Error::IndexOutOfRange { .. } => 400,
            _ => 500,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConnectionReset => write!(f, "Connection reset by peer"),
            Error::ShuttingDown => write!(f, "Thread pool is shutting down"),
            Error::NotFound(err) => write!(f, "Not found: {}", err),
            Error::MethodNotAllowed(err) => write!(f, "Method not allowed: {}", err),
            Error::BadRequest(err) => write!(f, "Bad request: {}", err),
            Error::SessionUnavailable(err) => write!(f, "Session unavailable: {}", err),
            Error::SessionTypeMismatch(slot) => {
                write!(f, "Session slot '{}' holds an unexpected value", slot)
            }
            Error::FormDecode(err) => write!(f, "Failed to decode form: {}", err),
            Error::IndexOutOfRange { index, len } => write!(
                f,
                "Order index {} is out of range ({} pending orders)",
                index, len
            ),
            Error::Persistence(err) => write!(f, "Failed to persist orders: {}", err),
        }
    }
}

impl std::error::Error for Error {}
