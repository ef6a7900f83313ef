/// Append-only buffer of the response bytes received during one exchange.
#[derive(Debug, Default, Clone)]
pub struct ByteAccumulator {
    bytes: Vec<u8>,
}

impl ByteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a received chunk and returns the total number of bytes received so far.
    pub fn append(&mut self, chunk: &[u8]) -> u64 {
        self.bytes.extend_from_slice(chunk);
        self.len()
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Starts over with an empty buffer, releasing the previous allocation.
    pub fn reset(&mut self) {
        self.bytes = Vec::new();
    }
}
