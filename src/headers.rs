// Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use buffer::SegmentedBuf;
use common::ascii::{COLON, CR, CRLF_LEN, HTAB, LF, SP};
use common::scan;
use common::{error_detail, is_token_char, ParseError};
use request::RequestParser;

/// Sink receiving parsed headers, one callback per header line.
pub trait HeaderHandler {
    /// Called once per header, in source order.
    ///
    /// `name` is non-empty and consists of token characters only; `value`
    /// may be empty and has optional whitespace stripped from both ends.
    /// Both views are only valid for the duration of the callback.
    fn on_header(&mut self, name: &[u8], value: &[u8]);
}

impl RequestParser {
    /// Parses a header block terminated by an empty CRLF line.
    ///
    /// On success the returned count covers the whole block including the
    /// terminating CRLF. `Ok(None)` means the block is not complete yet;
    /// nothing was consumed and the caller re-invokes with an extended
    /// buffer. The parser keeps no state across calls, so callbacks
    /// already made for complete header lines are repeated on the next
    /// attempt.
    ///
    /// Obsolete line folding is unsupported: a continuation line starts
    /// with whitespace, which is not a token character, and is rejected
    /// like any other malformed name. Any CR that is not part of a
    /// terminating CRLF is rejected as well.
    ///
    /// # Errors
    /// `InvalidRequestHeader` on a grammar violation within a header
    /// line; `InvalidRequestHeadersNoCrlf` when a line starts with a CR
    /// that is not followed by LF.
    pub fn parse_headers<T: HeaderHandler>(
        &self,
        buf: &SegmentedBuf,
        handler: &mut T,
    ) -> Result<Option<usize>, ParseError> {
        let mut cursor = buf.cursor();
        loop {
            let (first, second) = match cursor.peek_pair() {
                Some(pair) => pair,
                None => return Ok(None),
            };
            if first == CR {
                if second == LF {
                    cursor.advance(CRLF_LEN);
                    return Ok(Some(cursor.position()));
                }
                return Err(self.reject_no_crlf(&[first, second]));
            }

            // One header line, bounded by the next LF.
            let chunk = cursor.current_chunk();
            if let Some(found) = scan::find(chunk, LF) {
                // Fast path: the line lies entirely in the current segment.
                self.parse_header_line(&chunk[..found + 1], handler)?;
                cursor.advance(found + 1);
            } else {
                let line_end = match cursor.seek(LF) {
                    Some(position) => position,
                    None => return Ok(None),
                };
                // The line straddles segments; materialise it once.
                let line = buf.slice(cursor.position(), line_end + 1);
                self.parse_header_line(&line, handler)?;
                let length = line_end + 1 - cursor.position();
                cursor.advance(length);
            }
        }
    }

    // Tokenizes one header line, terminating CRLF included.
    fn parse_header_line<T: HeaderHandler>(
        &self,
        line: &[u8],
        handler: &mut T,
    ) -> Result<(), ParseError> {
        if line.len() < CRLF_LEN || line[line.len() - 2] != CR || line[line.len() - 1] != LF {
            return Err(self.reject_header(line));
        }
        let content = &line[..line.len() - CRLF_LEN];

        // Name: the longest token-character prefix before the colon.
        let mut name_end = 0;
        while name_end < content.len() && content[name_end] != COLON {
            if !is_token_char(content[name_end]) {
                return Err(self.reject_header(line));
            }
            name_end += 1;
        }
        if name_end == 0 || name_end == content.len() {
            // Empty name, or no colon at all.
            return Err(self.reject_header(line));
        }
        let name = &content[..name_end];

        let mut value = &content[name_end + 1..];
        if scan::contains(value, CR) {
            return Err(self.reject_header(line));
        }
        while let Some(&byte) = value.first() {
            if byte != SP && byte != HTAB {
                break;
            }
            value = &value[1..];
        }
        while let Some(&byte) = value.last() {
            if byte != SP && byte != HTAB {
                break;
            }
            value = &value[..value.len() - 1];
        }

        handler.on_header(name, value);
        Ok(())
    }

    fn reject_header(&self, line: &[u8]) -> ParseError {
        let error = ParseError::InvalidRequestHeader(error_detail(self.show_error_details, line));
        debug!("{}", error);
        error
    }

    fn reject_no_crlf(&self, bytes: &[u8]) -> ParseError {
        let error =
            ParseError::InvalidRequestHeadersNoCrlf(error_detail(self.show_error_details, bytes));
        debug!("{}", error);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        headers: Vec<(Vec<u8>, Vec<u8>)>,
    }

    impl HeaderHandler for Recorder {
        fn on_header(&mut self, name: &[u8], value: &[u8]) {
            self.headers.push((name.to_vec(), value.to_vec()));
        }
    }

    fn parse(segments: &[&[u8]]) -> (Result<Option<usize>, ParseError>, Recorder) {
        let parser = RequestParser::new();
        let mut recorder = Recorder::default();
        let buf = SegmentedBuf::new(segments);
        let result = parser.parse_headers(&buf, &mut recorder);
        (result, recorder)
    }

    fn pair(name: &[u8], value: &[u8]) -> (Vec<u8>, Vec<u8>) {
        (name.to_vec(), value.to_vec())
    }

    #[test]
    fn test_single_header() {
        let (result, recorder) = parse(&[b"Host: example\r\n\r\n" as &[u8]]);
        assert_eq!(result, Ok(Some(17)));
        assert_eq!(recorder.headers, vec![pair(b"Host", b"example")]);
    }

    #[test]
    fn test_empty_block() {
        let (result, recorder) = parse(&[b"\r\n" as &[u8]]);
        assert_eq!(result, Ok(Some(2)));
        assert!(recorder.headers.is_empty());

        // Pipelined bytes after the block do not count as consumed.
        let (result, recorder) = parse(&[b"\r\nGET / HTTP/1.1\r\n" as &[u8]]);
        assert_eq!(result, Ok(Some(2)));
        assert!(recorder.headers.is_empty());
    }

    #[test]
    fn test_headers_in_order() {
        let (result, recorder) =
            parse(&[b"Accept: text/plain\r\nContent-Length: 13\r\nExpect:\r\n\r\n" as &[u8]]);
        assert_eq!(result, Ok(Some(51)));
        assert_eq!(
            recorder.headers,
            vec![
                pair(b"Accept", b"text/plain"),
                pair(b"Content-Length", b"13"),
                pair(b"Expect", b""),
            ]
        );
    }

    #[test]
    fn test_value_whitespace_stripped() {
        let (result, recorder) = parse(&[b"Host:\t  example  \t\r\n\r\n" as &[u8]]);
        assert_eq!(result, Ok(Some(22)));
        assert_eq!(recorder.headers, vec![pair(b"Host", b"example")]);

        // Inner whitespace survives.
        let (_, recorder) = parse(&[b"Accept: a, b\r\n\r\n" as &[u8]]);
        assert_eq!(recorder.headers, vec![pair(b"Accept", b"a, b")]);

        // A value of nothing but whitespace strips down to empty.
        let (_, recorder) = parse(&[b"X-Empty:   \r\n\r\n" as &[u8]]);
        assert_eq!(recorder.headers, vec![pair(b"X-Empty", b"")]);
    }

    #[test]
    fn test_whitespace_in_name() {
        let (result, recorder) = parse(&[b"Bad Header: x\r\n\r\n" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeader(None)));
        assert!(recorder.headers.is_empty());

        let (result, _) = parse(&[b"Host\t: x\r\n\r\n" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeader(None)));
    }

    #[test]
    fn test_obs_fold_rejected() {
        let (result, recorder) = parse(&[b"Host: a\r\n continuation\r\n\r\n" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeader(None)));
        // The preceding well-formed header was already delivered.
        assert_eq!(recorder.headers, vec![pair(b"Host", b"a")]);
    }

    #[test]
    fn test_missing_colon() {
        let (result, _) = parse(&[b"Host\r\n\r\n" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeader(None)));

        let (result, _) = parse(&[b": x\r\n\r\n" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeader(None)));
    }

    #[test]
    fn test_cr_in_value() {
        let (result, recorder) = parse(&[b"Host: a\rb\r\n\r\n" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeader(None)));
        assert!(recorder.headers.is_empty());
    }

    #[test]
    fn test_bare_lf_line() {
        let (result, _) = parse(&[b"Host: a\n\r\n" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeader(None)));
    }

    #[test]
    fn test_bare_cr() {
        let (result, recorder) = parse(&[b"\rX\r\n" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeadersNoCrlf(None)));
        assert!(recorder.headers.is_empty());

        let (result, _) = parse(&[b"Host: a\r\n\rjunk" as &[u8]]);
        assert_eq!(result, Err(ParseError::InvalidRequestHeadersNoCrlf(None)));
    }

    #[test]
    fn test_incomplete_block() {
        let (result, _) = parse(&[b"" as &[u8]]);
        assert_eq!(result, Ok(None));

        let (result, _) = parse(&[b"H" as &[u8]]);
        assert_eq!(result, Ok(None));

        let (result, _) = parse(&[b"Host: exa" as &[u8]]);
        assert_eq!(result, Ok(None));

        // The block terminator has not arrived yet.
        let (result, recorder) = parse(&[b"Host: example\r\n" as &[u8]]);
        assert_eq!(result, Ok(None));
        // The complete line was still reported; it is reported again once
        // the caller re-presents the block.
        assert_eq!(recorder.headers, vec![pair(b"Host", b"example")]);

        let (result, _) = parse(&[b"Host: example\r\n\r" as &[u8]]);
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_segment_boundaries() {
        // Line split in the middle of the value.
        let (result, recorder) = parse(&[b"Host: exa" as &[u8], b"mple\r\n\r\n"]);
        assert_eq!(result, Ok(Some(17)));
        assert_eq!(recorder.headers, vec![pair(b"Host", b"example")]);

        // CR at the end of one segment, LF at the start of the next.
        let (result, recorder) = parse(&[b"Host: a\r" as &[u8], b"\n\r\n"]);
        assert_eq!(result, Ok(Some(11)));
        assert_eq!(recorder.headers, vec![pair(b"Host", b"a")]);

        // Terminating CRLF split across segments.
        let (result, _) = parse(&[b"Host: a\r\n\r" as &[u8], b"\n"]);
        assert_eq!(result, Ok(Some(11)));

        // LF as the final byte of the first segment.
        let (result, recorder) = parse(&[b"Host: a\r\n" as &[u8], b"\r\n"]);
        assert_eq!(result, Ok(Some(11)));
        assert_eq!(recorder.headers, vec![pair(b"Host", b"a")]);
    }

    #[test]
    fn test_split_at_every_boundary() {
        let full = b"Accept: text/plain\r\nContent-Length: 13\r\n\r\n";
        let (reference, whole) = parse(&[&full[..]]);
        assert_eq!(reference, Ok(Some(full.len())));
        for split in 0..full.len() {
            let (result, recorder) = parse(&[&full[..split], &full[split..]]);
            assert_eq!(result, reference);
            assert_eq!(recorder.headers, whole.headers);
        }
    }

    #[test]
    fn test_repeated_parse_is_stateless() {
        let parser = RequestParser::new();
        let buf = SegmentedBuf::new(&[b"Host: a\r\n\r\n" as &[u8]]);
        for _ in 0..3 {
            let mut recorder = Recorder::default();
            assert_eq!(parser.parse_headers(&buf, &mut recorder), Ok(Some(11)));
            assert_eq!(recorder.headers, vec![pair(b"Host", b"a")]);
        }
    }

    #[test]
    fn test_request_line_then_bad_header() {
        use request::{RequestLine, StartLineHandler};

        struct Ignore;

        impl StartLineHandler for Ignore {
            fn on_start_line(&mut self, _line: &RequestLine) {}
        }

        let parser = RequestParser::new();
        let request = b"GET / HTTP/1.1\r\nBad Header: x\r\n\r\n";
        let buf = SegmentedBuf::new(&[&request[..]]);
        let line_len = parser
            .parse_request_line(&buf, &mut Ignore)
            .unwrap()
            .unwrap();
        assert_eq!(line_len, 16);

        let rest = SegmentedBuf::new(&[&request[line_len..]]);
        let result = parser.parse_headers(&rest, &mut Recorder::default());
        assert_eq!(result, Err(ParseError::InvalidRequestHeader(None)));
    }

    #[test]
    fn test_error_details() {
        let parser = RequestParser::with_error_details();
        let buf = SegmentedBuf::new(&[b"Bad Header: x\r\n\r\n" as &[u8]]);
        let result = parser.parse_headers(&buf, &mut Recorder::default());
        assert_eq!(
            result,
            Err(ParseError::InvalidRequestHeader(Some(String::from(
                "Bad Header: x\\x0d\\x0a"
            ))))
        );

        let buf = SegmentedBuf::new(&[b"\rX\r\n" as &[u8]]);
        let result = parser.parse_headers(&buf, &mut Recorder::default());
        assert_eq!(
            result,
            Err(ParseError::InvalidRequestHeadersNoCrlf(Some(String::from(
                "\\x0dX"
            ))))
        );
    }
}
