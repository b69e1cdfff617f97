// Source input: the program text handed to run/format/share.
//
// Callers may have the program as a string, as raw bytes, or as something
// readable (stdin, an open file). `SourceInput` covers those three shapes
// and is consumed exactly once when a request is built.

use std::fmt;
use std::io::{self, Cursor, Read};

/// Program text in one of the shapes a caller can produce.
pub enum SourceInput {
    Text(String),
    Bytes(Vec<u8>),
    Stream(Box<dyn Read + Send>),
}

impl SourceInput {
    /// Wrap any readable handle. The reader is drained when the request is
    /// built, not here.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        SourceInput::Stream(Box::new(reader))
    }

    /// Normalize to a string, draining a stream to end of file.
    ///
    /// Bytes that are not UTF-8 are rejected with [`io::ErrorKind::InvalidData`]:
    /// the payload travels as a text query parameter and must not be altered
    /// on the way.
    pub fn into_string(self) -> io::Result<String> {
        let bytes = match self {
            SourceInput::Text(text) => return Ok(text),
            SourceInput::Bytes(bytes) => bytes,
            SourceInput::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                buf
            }
        };
        String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    /// Normalize to a reader suitable for a streamed request body.
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        match self {
            SourceInput::Text(text) => Box::new(Cursor::new(text.into_bytes())),
            SourceInput::Bytes(bytes) => Box::new(Cursor::new(bytes)),
            SourceInput::Stream(reader) => reader,
        }
    }
}

impl fmt::Debug for SourceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceInput::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            SourceInput::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            SourceInput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for SourceInput {
    fn from(text: String) -> Self {
        SourceInput::Text(text)
    }
}

impl From<&str> for SourceInput {
    fn from(text: &str) -> Self {
        SourceInput::Text(text.to_string())
    }
}

impl From<Vec<u8>> for SourceInput {
    fn from(bytes: Vec<u8>) -> Self {
        SourceInput::Bytes(bytes)
    }
}

impl From<&[u8]> for SourceInput {
    fn from(bytes: &[u8]) -> Self {
        SourceInput::Bytes(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "package main\n\nfunc main() { println(\"héllo\") }\n";

    fn all_shapes() -> Vec<SourceInput> {
        vec![
            SourceInput::from(PROGRAM),
            SourceInput::from(PROGRAM.as_bytes().to_vec()),
            SourceInput::from_reader(Cursor::new(PROGRAM.as_bytes().to_vec())),
        ]
    }

    #[test]
    fn every_shape_normalizes_to_the_same_string() {
        for input in all_shapes() {
            assert_eq!(input.into_string().unwrap(), PROGRAM);
        }
    }

    #[test]
    fn every_shape_normalizes_to_the_same_reader_bytes() {
        for input in all_shapes() {
            let mut buf = Vec::new();
            input.into_reader().read_to_end(&mut buf).unwrap();
            assert_eq!(buf, PROGRAM.as_bytes());
        }
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = SourceInput::from(vec![0xff, 0xfe, 0x00])
            .into_string()
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn failing_stream_surfaces_read_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }
        }

        let err = SourceInput::from_reader(Broken).into_string().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
