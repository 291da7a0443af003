use std::io::{self, BufRead};

/// A line as read from the stream, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLine {
    pub bytes: Vec<u8>,
    /// Bytes were dropped because the line exceeded the read limit
    pub truncated: bool,
}

impl RawLine {
    /// Lossy text view, used for header lines
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Line reader that never buffers more than `limit` bytes of a single line.
///
/// The remainder of an over-long line is consumed from the source and
/// discarded, so one huge line cannot blow up memory.
pub(crate) struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next line, keeping at most `limit` bytes of it.
    ///
    /// Returns `Ok(None)` at end of stream. A trailing `\r\n` or `\n` is
    /// stripped.
    pub fn read_line(&mut self, limit: Option<usize>) -> io::Result<Option<RawLine>> {
        self.read_line_exempt(limit, &[])
    }

    /// Like [`read_line`](Self::read_line), but lines whose first byte is in
    /// `exempt` are always read in full.
    ///
    /// The first byte of a line is always kept, even with a limit of zero.
    pub fn read_line_exempt(
        &mut self,
        limit: Option<usize>,
        exempt: &[u8],
    ) -> io::Result<Option<RawLine>> {
        let mut bytes = Vec::new();
        let mut truncated = false;
        let mut saw_any = false;
        let mut limit = limit.map(|l| l.max(1));

        loop {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }
            if !saw_any && exempt.contains(&available[0]) {
                limit = None;
            }
            saw_any = true;

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = &available[..newline.unwrap_or(available.len())];
            let room = limit.map_or(chunk.len(), |l| l.saturating_sub(bytes.len()));
            if chunk.len() > room {
                truncated = true;
            }
            bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);

            let used = newline.map_or(available.len(), |n| n + 1);
            self.inner.consume(used);
            if newline.is_some() {
                break;
            }
        }

        if !saw_any {
            return Ok(None);
        }
        if bytes.last() == Some(&b'\r') && !truncated {
            bytes.pop();
        }
        Ok(Some(RawLine { bytes, truncated }))
    }

    /// Discard everything up to the next line starting with `prefix`.
    pub fn skip_to_prefix(&mut self, prefix: &[u8]) -> io::Result<Option<RawLine>> {
        while let Some(line) = self.read_line(None)? {
            if line.bytes.starts_with(prefix) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Consume and drop the rest of the stream
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(&mut self.inner, &mut io::sink())
    }
}
