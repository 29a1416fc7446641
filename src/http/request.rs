use crate::errors::{Error, Result};
use crate::http::{collect_headers, find_header, read_message, Head, Headers};
use std::collections::HashMap;
use std::io::{BufReader, Read};

/// Content type of the forms posted by the pages
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP request, as parsed by the server or built by tests
#[derive(Debug)]
pub struct Request {
    pub method: String,
    /// Path as sent, query string included
    pub path: String,
    pub headers: Headers,
    pub body: String,
}

impl Request {
    pub fn new(method: &str, path: &str, headers: Headers, body: String) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            headers,
            body,
        }
    }
    /// GET without a body
    pub fn get(path: &str) -> Request {
        Request::new("GET", path, vec![], "".to_string())
    }
    /// POST with a body and no header
    pub fn post(path: &str, body: String) -> Request {
        Request::new("POST", path, vec![], body)
    }

    /// Add a header, builder style
    pub fn with_header(mut self, name: &str, value: &str) -> Request {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Value of a header, the name is case insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Value of a cookie sent with the request
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case("Cookie"))
            .flat_map(|(_, value)| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    /// Decode the body as an url-encoded form
    ///
    /// Requests without a Content-Type are accepted, anything else than a form is a FormDecode
    /// error.
    pub fn form(&self) -> Result<Form> {
        match self.header("Content-Type") {
            Some(content_type) if !content_type.starts_with(FORM_CONTENT_TYPE) => Err(
                Error::FormDecode(format!("unexpected content type {:?}", content_type)).into(),
            ),
            _ => Ok(Form::parse(&self.body)),
        }
    }
}

/// Fields of a submitted form
///
/// When a field is repeated, the last value wins.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Form(HashMap<String, String>);

impl Form {
    /// Decode an `application/x-www-form-urlencoded` string
    pub fn parse(encoded: &str) -> Form {
        Form(
            url::form_urlencoded::parse(encoded.as_bytes())
                .into_owned()
                .collect(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|value| value.as_str())
    }

    /// Value of a field that must be present
    pub fn required(&self, field: &str) -> Result<&str> {
        self.get(field)
            .ok_or_else(|| Error::FormDecode(format!("missing field '{}'", field)).into())
    }
}

/// Read and parse a whole request, body included
pub fn parse_request<T>(buf_reader: BufReader<T>) -> Result<Request>
where
    T: Sized + Read,
{
    let (head, body) = read_message(buf_reader, |received| {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(received)? {
            httparse::Status::Complete(parsed_len) => Ok(Some(Head {
                parsed_len,
                start: (
                    req.method.unwrap_or("GET").to_string(),
                    req.path.unwrap_or("/").to_string(),
                ),
                headers: collect_headers(req.headers),
            })),
            httparse::Status::Partial => Ok(None),
        }
    })?;

    let (method, path) = head.start;
    Ok(Request {
        method,
        path,
        headers: head.headers,
        body,
    })
}
