use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading the `data` of server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. Comments, `event`, `id` and `retry`
/// fields are skipped, and events without data are not reported at all.
pub struct Sse {
    // Bytes that may end in the middle of a UTF-8 sequence.
    raw: Vec<u8>,
    buf: String,
    chunks: Chunks,
    eof: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            raw: Vec::new(),
            buf: String::new(),
            chunks,
            eof: false,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain what is already buffered before reading more.
            if let Some(event) = self.try_parse_event() {
                return Ok(Some(event));
            }
            if self.eof {
                return Ok(None);
            }

            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                Some(bytes) => self.push_bytes(&bytes)?,
                None => {
                    self.eof = true;
                    if !self.raw.is_empty() {
                        return Err(Error::InvalidPayload);
                    }
                    // A final event may not be followed by a blank line.
                    if !self.buf.trim().is_empty() {
                        self.buf.push_str("\n\n");
                    }
                }
            }
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.raw.extend_from_slice(bytes);
        let valid_len = match std::str::from_utf8(&self.raw) {
            Ok(s) => s.len(),
            // An incomplete sequence at the end, wait for the rest.
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let rest = self.raw.split_off(valid_len);
        let valid = std::mem::replace(&mut self.raw, rest);
        let text =
            String::from_utf8(valid).map_err(|_| Error::InvalidPayload)?;
        self.buf.push_str(&text);
        if self.buf.contains("\r\n") {
            self.buf = self.buf.replace("\r\n", "\n");
        }
        Ok(())
    }

    fn try_parse_event(&mut self) -> Option<String> {
        // event         = *( comment / field ) end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        while let Some(end_idx) = self.buf.find("\n\n") {
            let block: String = self.buf.drain(..end_idx + 2).collect();

            let mut data: Option<String> = None;
            for line in block.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (field, value) = match line.split_once(':') {
                    Some((field, value)) => {
                        (field, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                if field != "data" {
                    continue;
                }
                match &mut data {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => data = Some(value.to_owned()),
                }
            }

            if data.is_some() {
                return data;
            }
        }
        None
    }
}
