use crate::errors::{Error, Result};
use std::io::{BufReader, Read};

pub mod server;
pub use server::*;

pub mod request;
pub use request::*;

pub mod response;
pub use response::*;

pub mod client;
pub use client::*;

/// Headers as they appear in a message, in order
pub type Headers = Vec<(String, String)>;

/// Find the value of a header, ignoring the case of its name
pub fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// What is known of a message once its head is parsed
pub(crate) struct Head<T> {
    /// Size of the head in bytes, the body starts right after
    pub parsed_len: usize,
    /// Request or status line
    pub start: T,
    pub headers: Headers,
}

/// Copy the headers parsed by httparse
pub(crate) fn collect_headers(headers: &[httparse::Header]) -> Headers {
    headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect()
}

/// Read a full HTTP message (request or response) from a byte stream
///
/// `parse_head` is called on everything received so far until it reports a complete head,
/// then the body is read according to Content-Length.
///
/// This should be fine for HTTP1.1 since requests are not meant to be sent before the
/// response from the last is received, although connection pooling + an eager request would
/// lose the start of the next one.
pub(crate) fn read_message<R, T, F>(
    mut buf_reader: BufReader<R>,
    mut parse_head: F,
) -> Result<(Head<T>, String)>
where
    R: Read,
    F: FnMut(&[u8]) -> Result<Option<Head<T>>>,
{
    let mut chunk = [0; 4096];
    let mut received: Vec<u8> = Vec::new();

    let head = loop {
        let bytes_read = buf_reader.read(&mut chunk)?;
        if bytes_read == 0 {
            return Err(Box::new(Error::ConnectionReset));
        }
        received.extend_from_slice(&chunk[..bytes_read]);

        if let Some(head) = parse_head(&received)? {
            break head;
        }
    };

    let body_len = find_header(&head.headers, "Content-Length")
        .and_then(|length| length.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while received.len() - head.parsed_len < body_len {
        let bytes_read = buf_reader.read(&mut chunk)?;
        if bytes_read == 0 {
            return Err(Box::new(Error::ConnectionReset));
        }
        received.extend_from_slice(&chunk[..bytes_read]);
    }

    let body = &received[head.parsed_len..head.parsed_len + body_len];
    let body = String::from_utf8_lossy(body).to_string();
    Ok((head, body))
}
