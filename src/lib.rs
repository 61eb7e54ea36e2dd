// Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//! Streaming, zero-copy parser for [HTTP/1.0](https://tools.ietf.org/html/rfc1945)
//! and [HTTP/1.1](https://tools.ietf.org/html/rfc7230) request heads.
//!
//! The parser consumes bytes arriving in one or more non-contiguous
//! segments (a [`SegmentedBuf`](struct.SegmentedBuf.html)) and drives a
//! pair of caller-supplied sinks: a
//! [`StartLineHandler`](trait.StartLineHandler.html) for the request line
//! and a [`HeaderHandler`](trait.HeaderHandler.html) for each header.
//! Tokens are handed out as byte-slice views into the original buffers; a
//! copy is only made when a token straddles a segment boundary. Grammar
//! is validated byte by byte against RFC 7230.
//!
//! The parser performs no I/O and keeps no state between calls. Each call
//! either succeeds and reports exactly how many bytes it consumed, asks
//! for more input (`Ok(None)`, nothing consumed), or rejects with a
//! classified [`ParseError`](enum.ParseError.html). Draining consumed
//! bytes, pipelining and connection handling are the caller's business.
//!
//! Not supported, by design: HTTP/2 and HTTP/3, body framing, trailer
//! parsing and obsolete line folding (a folded continuation line is
//! rejected).
//!
//! ## Parsing a request head
//! ```
//! extern crate h1_parse;
//! use h1_parse::{HeaderHandler, Method, RequestLine, RequestParser};
//! use h1_parse::{SegmentedBuf, StartLineHandler, Version};
//!
//! struct Sink {
//!     path: Vec<u8>,
//!     headers: Vec<(Vec<u8>, Vec<u8>)>,
//! }
//!
//! impl StartLineHandler for Sink {
//!     fn on_start_line(&mut self, line: &RequestLine) {
//!         assert_eq!(line.method, Method::Get);
//!         assert_eq!(line.version, Version::Http11);
//!         self.path = line.path.to_vec();
//!     }
//! }
//!
//! impl HeaderHandler for Sink {
//!     fn on_header(&mut self, name: &[u8], value: &[u8]) {
//!         self.headers.push((name.to_vec(), value.to_vec()));
//!     }
//! }
//!
//! let request = b"GET /metrics HTTP/1.1\r\nHost: localhost\r\n\r\n";
//! let parser = RequestParser::new();
//! let mut sink = Sink { path: Vec::new(), headers: Vec::new() };
//!
//! let buf = SegmentedBuf::new(&[&request[..]]);
//! let line_len = parser.parse_request_line(&buf, &mut sink).unwrap().unwrap();
//! assert_eq!(line_len, 23);
//!
//! let rest = SegmentedBuf::new(&[&request[line_len..]]);
//! let block_len = parser.parse_headers(&rest, &mut sink).unwrap().unwrap();
//! assert_eq!(block_len, request.len() - line_len);
//! assert_eq!(sink.path, b"/metrics");
//! assert_eq!(sink.headers, vec![(b"Host".to_vec(), b"localhost".to_vec())]);
//! ```
//!
//! ## Feeding segmented input
//! ```
//! extern crate h1_parse;
//! use h1_parse::{RequestLine, RequestParser, SegmentedBuf, StartLineHandler};
//!
//! struct Ignore;
//!
//! impl StartLineHandler for Ignore {
//!     fn on_start_line(&mut self, _line: &RequestLine) {}
//! }
//!
//! let parser = RequestParser::new();
//!
//! // The line is not complete yet; nothing is consumed.
//! let first = SegmentedBuf::new(&[b"GET /metr" as &[u8]]);
//! assert_eq!(parser.parse_request_line(&first, &mut Ignore).unwrap(), None);
//!
//! // More bytes arrived; present both segments, no copying needed by the
//! // caller. The reported count covers the line including its CRLF.
//! let both = SegmentedBuf::new(&[b"GET /metr" as &[u8], b"ics HTTP/1.1\r\n"]);
//! assert_eq!(
//!     parser.parse_request_line(&both, &mut Ignore).unwrap(),
//!     Some(23)
//! );
//! ```

#[macro_use]
extern crate log;
extern crate memchr;

mod buffer;
mod common;
mod headers;
mod request;

pub use buffer::{BufCursor, SegmentedBuf};
pub use common::{Method, ParseError, Version, MAX_ERROR_DETAIL_SIZE};
pub use headers::HeaderHandler;
pub use request::{RequestLine, RequestParser, StartLineHandler};
