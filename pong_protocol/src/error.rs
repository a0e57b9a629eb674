use std::fmt;

/// Reasons a payload could not be encoded or decoded.
#[derive(Debug)]
pub enum CodecError {
    /// Payload did not start with any known codec signature.
    UnknownFormat,
    /// Binary payload carried the wrong schema tag.
    BadTag,
    /// Binary payload ended before the schema was complete.
    Truncated,
    /// Binary payload had bytes left over after the schema was complete.
    TrailingBytes(usize),
    /// A string field was not valid UTF-8.
    InvalidUtf8,
    /// A string or list is too long for its length prefix.
    TooLong { field: &'static str, len: usize },
    /// Text frame was expected but binary arrived (or the reverse).
    WrongFrameKind,
    /// JSON text was not a recognized control message or snapshot.
    Json(serde_json::Error),
    MsgPackEncode(rmp_serde::encode::Error),
    MsgPackDecode(rmp_serde::decode::Error),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownFormat => write!(f, "unknown payload format"),
            CodecError::BadTag => write!(f, "unexpected schema tag"),
            CodecError::Truncated => write!(f, "payload truncated"),
            CodecError::TrailingBytes(n) => write!(f, "{n} trailing bytes after payload"),
            CodecError::InvalidUtf8 => write!(f, "string field is not valid utf-8"),
            CodecError::TooLong { field, len } => write!(f, "{field} too long ({len})"),
            CodecError::WrongFrameKind => write!(f, "unexpected frame kind"),
            CodecError::Json(e) => write!(f, "json: {e}"),
            CodecError::MsgPackEncode(e) => write!(f, "msgpack encode: {e}"),
            CodecError::MsgPackDecode(e) => write!(f, "msgpack decode: {e}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Json(e)
    }
}

impl From<rmp_serde::encode::Error> for CodecError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        CodecError::MsgPackEncode(e)
    }
}

impl From<rmp_serde::decode::Error> for CodecError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        CodecError::MsgPackDecode(e)
    }
}
