// Transport-neutral message unit: the transport delivers either text or binary.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn is_text(&self) -> bool {
        matches!(self, Frame::Text(_))
    }

    /// Payload size used for bandwidth accounting: byte length for binary,
    /// character count for text.
    pub fn wire_len(&self) -> usize {
        match self {
            Frame::Text(text) => text.chars().count(),
            Frame::Binary(bytes) => bytes.len(),
        }
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Frame::Text(text)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Frame::Binary(bytes)
    }
}
