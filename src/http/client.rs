use crate::errors;
use crate::http::{parse_response, Response, FORM_CONTENT_TYPE};
use crate::session::SESSION_COOKIE;
use std::io::{BufReader, Write};
use std::net::TcpStream;

/// Simple HTTP client
///
/// It sends HTTP requests from a set of parameters, then parses and yields the server response.
pub struct HttpClient {
    stream: TcpStream,
}

impl HttpClient {
    /// Create a new client connected to the given server.
    ///
    /// An error is returned if the connection cannot be made for whatever reason
    pub fn new(server: &str) -> errors::Result<Self> {
        Ok(HttpClient {
            stream: TcpStream::connect(server)?,
        })
    }

    /// Send an HTTP request on the open connection.
    ///
    /// Connection keep-alive is not implemented server side, drop the object after the
    /// response is retrieved.
    pub fn send(
        &mut self,
        method: &str,
        endpoint: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> errors::Result<Response> {
        let headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}: {}\r\n", k, v))
            .collect();
        self.stream.write_all(
            format! {
                "{} {} HTTP/1.1\r\nContent-Length: {}\r\n{}\r\n{}",
                method, endpoint, body.len(), headers, body
            }
            .as_bytes(),
        )?;

        let buf_reader = BufReader::new(&mut self.stream);
        parse_response(buf_reader)
    }

    /// Send an url-encoded form, within the given session if any
    pub fn send_form(
        &mut self,
        method: &str,
        endpoint: &str,
        form: &str,
        session: Option<&str>,
    ) -> errors::Result<Response> {
        let cookie = session.map(|id| format!("{}={}", SESSION_COOKIE, id));
        let mut headers = vec![("Content-Type", FORM_CONTENT_TYPE)];
        if let Some(cookie) = cookie.as_deref() {
            headers.push(("Cookie", cookie));
        }
        self.send(method, endpoint, &headers, form)
    }
}

/// Extract the session id from the Set-Cookie header of a response
pub fn session_from_response(response: &Response) -> Option<String> {
    response
        .headers
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case("Set-Cookie"))
        .filter_map(|(_, value)| value.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == SESSION_COOKIE)
        .map(|(_, id)| id.to_string())
}
