use std::io::{BufReader, Read};

use serde::Serialize;

use crate::errors::Result;
use crate::http::{collect_headers, find_header, read_message, Head, Headers};

/// HTTP response, built by the handlers or parsed by the client
#[derive(Debug)]
pub struct Response {
    /// Always set on the responses we build, httparse may not find one in what it parses
    pub status: Option<u16>,
    /// Content-Length is added when the response is sent
    pub headers: Headers,
    pub body: String,
}

impl Response {
    /// 200 with a body
    pub fn ok_with_body(body: String) -> Response {
        Response {
            status: Some(200),
            headers: vec![],
            body,
        }
    }

    /// 200 with `value` serialized as JSON
    pub fn json<T: Serialize>(value: &T) -> Result<Response> {
        Ok(Self::ok_with_body(serde_json::to_string(value)?)
            .with_header("Content-Type", "application/json"))
    }

    /// 302 sending the client to `location`
    pub fn redirect(location: &str) -> Response {
        Response {
            status: Some(302),
            headers: vec![("Location".to_string(), location.to_string())],
            body: "".to_string(),
        }
    }

    /// Error without a body, `code` must be a 4xx or 5xx status
    pub fn error(code: u16) -> Response {
        assert!((400..600).contains(&code), "Invalid error code");
        Response {
            status: Some(code),
            headers: vec![],
            body: String::new(),
        }
    }

    /// 4xx error with a plain text explanation. Server errors never get one.
    pub fn client_error(code: u16, message: &str) -> Response {
        assert!((400..500).contains(&code), "Invalid client error code");
        Response {
            status: Some(code),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: message.to_string(),
        }
    }

    pub fn internal_server_error() -> Response {
        Self::error(500)
    }

    /// Add a header, builder style
    pub fn with_header(mut self, name: &str, value: &str) -> Response {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Value of a header, the name is case insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Read and parse a whole response, body included
pub fn parse_response<T>(buf_reader: BufReader<T>) -> Result<Response>
where
    T: Sized + Read,
{
    let (head, body) = read_message(buf_reader, |received| {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut resp = httparse::Response::new(&mut headers);
        match resp.parse(received)? {
            httparse::Status::Complete(parsed_len) => Ok(Some(Head {
                parsed_len,
                start: resp.code,
                headers: collect_headers(resp.headers),
            })),
            httparse::Status::Partial => Ok(None),
        }
    })?;

    Ok(Response {
        status: head.start,
        headers: head.headers,
        body,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_parse_simple_response() {
        let req_str = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_response(buf_reader).unwrap();

        assert_eq!(parsed_req.status, Some(200));
        assert_eq!(parsed_req.headers.len(), 1);
        assert_eq!(parsed_req.body, "");
    }

    #[test]
    fn test_parse_redirect() {
        let resp_str =
            b"HTTP/1.1 302 Found\r\nContent-Length: 0\r\nLocation: /order/burger-joint\r\nSet-Cookie: session=abc; Path=/; HttpOnly\r\n\r\n";

        let parsed_resp = parse_response(BufReader::new(&resp_str[..])).unwrap();

        assert_eq!(parsed_resp.status, Some(302));
        assert_eq!(parsed_resp.header("location"), Some("/order/burger-joint"));
        assert_eq!(
            parsed_resp.header("Set-Cookie"),
            Some("session=abc; Path=/; HttpOnly")
        );
    }

    #[test]
    fn test_parse_response_with_large_body() {
        let mut rng = rand::thread_rng();
        let mut buffer = [0; 40960];
        for c in buffer.iter_mut() {
            *c = rng.gen_range(b'a'..=b'z')
        }
        let body = String::from_utf8_lossy(&buffer);

        let resp_str = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            buffer.len(),
            body
        );

        let buf_reader = BufReader::new(resp_str.as_bytes());
        let parsed_resp = parse_response(buf_reader).unwrap();

        assert_eq!(parsed_resp.headers.len(), 1);
        assert_eq!(parsed_resp.body, body);
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(&vec!["a", "b"]).unwrap();
        assert_eq!(response.status, Some(200));
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body, r#"["a","b"]"#);
    }

    #[test]
    fn test_redirect() {
        let response = Response::redirect("/orders");
        assert_eq!(response.status, Some(302));
        assert_eq!(response.header("Location"), Some("/orders"));
        assert!(response.body.is_empty());
    }
}
