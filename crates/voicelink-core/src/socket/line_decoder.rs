/// Incremental newline-delimited frame decoder.
///
/// A single read is not guaranteed to align with message boundaries
/// (stream semantics), so a trailing incomplete line is buffered until the
/// next chunk arrives instead of being dropped.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes; returns every line completed by it.
    ///
    /// Lines are decoded as UTF-8 with lossy replacement and returned
    /// without their terminating newline. Blank lines are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let text = String::from_utf8_lossy(&line);
            if !text.trim().is_empty() {
                lines.push(text.into_owned());
            }
        }

        lines
    }

    /// Bytes currently held waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
