// Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use buffer::SegmentedBuf;
use common::ascii::{CR, LF, PERCENT, QUESTION_MARK, SP};
use common::{error_detail, is_token_char, Method, ParseError, Version};

/// Parsed request line, handed to the start-line handler.
///
/// All views borrow from the presented input (or from a transient
/// contiguous copy when the line straddled segments) and are only valid
/// for the duration of the callback; a handler that needs them longer
/// must copy.
#[derive(Debug, PartialEq)]
pub struct RequestLine<'a> {
    /// Recognised method tag.
    pub method: Method,
    /// Version tag; `Unknown` never reaches the handler.
    pub version: Version,
    /// Path plus optional query, with no surrounding spaces.
    pub target: &'a [u8],
    /// Target bytes up to the `?` or the terminating SP.
    pub path: &'a [u8],
    /// Query including its leading `?`; empty when no `?` appeared.
    pub query: &'a [u8],
    /// Method bytes, non-empty iff `method` is `Custom`.
    pub custom_method: &'a [u8],
    /// Whether the path contains a `%` byte.
    pub path_encoded: bool,
}

/// Sink receiving the parsed request line.
pub trait StartLineHandler {
    /// Called exactly once per successfully parsed request line.
    fn on_start_line(&mut self, line: &RequestLine);
}

/// Streaming HTTP/1.x request-head parser.
///
/// The parser holds no state between invocations: it reports how many
/// bytes a successful parse consumed and leaves draining those bytes to
/// the caller. Incomplete input is not an error; it is reported as
/// `Ok(None)` with nothing consumed, and the caller re-invokes with an
/// extended buffer.
pub struct RequestParser {
    pub(crate) show_error_details: bool,
}

impl Default for RequestParser {
    fn default() -> Self {
        RequestParser::new()
    }
}

impl RequestParser {
    /// Creates a parser whose rejections carry no input excerpt.
    pub fn new() -> Self {
        RequestParser {
            show_error_details: false,
        }
    }

    /// Creates a parser whose rejections carry an escaped excerpt of the
    /// offending input, bounded by `MAX_ERROR_DETAIL_SIZE`.
    pub fn with_error_details() -> Self {
        RequestParser {
            show_error_details: true,
        }
    }

    /// Parses one request line from the start of `buf`.
    ///
    /// On success the handler has been invoked exactly once and the
    /// returned count covers the line including its CRLF. `Ok(None)`
    /// means no LF was found in the buffer; nothing was consumed and the
    /// handler was not invoked.
    ///
    /// # Errors
    /// `InvalidRequestLine` on any grammar violation in the method,
    /// target or line-terminator region. `UnrecognizedHttpVersion` when
    /// the line is well-formed but the version token is neither
    /// `HTTP/1.0` nor `HTTP/1.1`; callers may answer that one with 505
    /// instead of closing the connection.
    pub fn parse_request_line<T: StartLineHandler>(
        &self,
        buf: &SegmentedBuf,
        handler: &mut T,
    ) -> Result<Option<usize>, ParseError> {
        let mut cursor = buf.cursor();
        // The LF search bounds the line; every probe below stays inside it.
        let line = match cursor.read_until_byte(LF) {
            Some(line) => line,
            None => return Ok(None),
        };
        self.parse_line(&line, handler)?;
        Ok(Some(cursor.position()))
    }

    // Parses one full request line with the trailing LF already stripped.
    fn parse_line<T: StartLineHandler>(
        &self,
        data: &[u8],
        handler: &mut T,
    ) -> Result<(), ParseError> {
        // Method, then exactly one SP.
        let (method, custom_method, path_start) = match known_method(data) {
            Some(method) => (method, &data[..0], method.raw().len() + 1),
            None => {
                let mut end = 0;
                while end < data.len() && is_token_char(data[end]) {
                    end += 1;
                }
                if end == 0 || end == data.len() || data[end] != SP {
                    return Err(self.reject_line(data));
                }
                (Method::Custom, &data[..end], end + 1)
            }
        };

        // Path region of the target.
        let mut path_encoded = false;
        let mut index = path_start;
        let path_end;
        let terminator;
        loop {
            if index == data.len() {
                // Ran past the line end without a SP terminating the target.
                return Err(self.reject_line(data));
            }
            let byte = data[index];
            if byte == SP || byte == QUESTION_MARK {
                if index == path_start {
                    // Empty path is illegal.
                    return Err(self.reject_line(data));
                }
                path_end = index;
                terminator = byte;
                break;
            } else if byte == CR {
                return Err(self.reject_line(data));
            } else if byte == PERCENT {
                if index == path_start {
                    // Path starting with % is illegal.
                    return Err(self.reject_line(data));
                }
                path_encoded = true;
            }
            index += 1;
        }

        // Query region, up to the SP before the version.
        if terminator == QUESTION_MARK {
            index += 1;
            loop {
                if index == data.len() {
                    return Err(self.reject_line(data));
                }
                let byte = data[index];
                if byte == SP {
                    break;
                } else if byte == CR {
                    return Err(self.reject_line(data));
                }
                index += 1;
            }
        }
        let target = &data[path_start..index];
        let path = &data[path_start..path_end];
        let query = &data[path_end..index];

        // Consume the SP, then the 8-byte version.
        let version_start = index + 1;
        let version = if data.len() - version_start >= 8 {
            Version::from_bytes(&data[version_start..version_start + 8])
        } else {
            Version::Unknown
        };
        if version == Version::Unknown {
            // A well-formed line with an unrecognised version is the
            // recoverable 505 case; everything else is a plain rejection.
            if version_start == data.len()
                || data[version_start] == CR
                || data[data.len() - 1] != CR
            {
                return Err(self.reject_line(data));
            }
            return Err(self.reject_version(data));
        }
        // The version and the CR must end the line exactly; the LF that
        // bounded the search follows right after.
        if version_start + 9 != data.len() || data[version_start + 8] != CR {
            return Err(self.reject_line(data));
        }

        handler.on_start_line(&RequestLine {
            method,
            version,
            target,
            path,
            query,
            custom_method,
            path_encoded,
        });
        Ok(())
    }

    fn reject_line(&self, line: &[u8]) -> ParseError {
        let error = ParseError::InvalidRequestLine(error_detail(self.show_error_details, line));
        debug!("{}", error);
        error
    }

    fn reject_version(&self, line: &[u8]) -> ParseError {
        let error =
            ParseError::UnrecognizedHttpVersion(error_detail(self.show_error_details, line));
        debug!("{}", error);
        error
    }
}

// First-byte dispatch into the method dictionary; a candidate is then
// confirmed with a word compare that includes the separating SP.
fn known_method(data: &[u8]) -> Option<Method> {
    let method = match *data.first()? {
        b'G' => Method::Get,
        b'H' => Method::Head,
        b'T' => Method::Trace,
        b'D' => Method::Delete,
        b'C' => Method::Connect,
        b'O' => Method::Options,
        b'P' => match *data.get(1)? {
            b'U' => Method::Put,
            b'O' => Method::Post,
            b'A' => Method::Patch,
            _ => return None,
        },
        _ => return None,
    };
    let raw = method.raw();
    if data.len() > raw.len() && &data[..raw.len()] == raw && data[raw.len()] == SP {
        Some(method)
    } else {
        None
    }
}
