use crate::http::{parse_request, Request, Response};
use crate::{errors, threadpool::ThreadPool};
use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

/// Reason phrase sent along with a status code
pub fn code_to_string(code: u16) -> &'static str {
    match code {
        200 => "OK",
        302 => "Found",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// HTTP/1.1 server answering one request per connection
///
/// Requests are read from the socket, handed to a handler, and the response it builds is
/// written back before the connection is closed.
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// Bind the server to `addr`
    pub fn new(addr: &str) -> errors::Result<Self> {
        Ok(HttpServer {
            listener: TcpListener::bind(addr)?,
        })
    }

    /// Address the server is bound to, useful when binding to port 0
    pub fn local_addr(&self) -> errors::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, running `handler` on a pool of `workers` threads
    ///
    /// Only returns early if the pool refuses a job. Failed accepts are logged and skipped.
    pub fn serve<F>(&self, workers: usize, handler: F) -> errors::Result<()>
    where
        F: Fn(Request) -> Response + Send + Sync + 'static + Clone,
    {
        let threadpool = ThreadPool::new(workers)?;
        log::info!("Listening on {} with {} workers", self.local_addr()?, workers);

        for stream in self.listener.incoming() {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    log::warn!("Failed to accept connection: {}", err);
                    continue;
                }
            };
            let handler = handler.clone();
            threadpool.execute(move || handle_stream(&mut stream, &handler))?;
        }
        Ok(())
    }

    /// Answer a single connection on the current thread, then return
    pub fn serve_once<F>(&self, handler: F)
    where
        F: Fn(Request) -> Response,
    {
        match self.listener.accept() {
            Ok((mut stream, _)) => handle_stream(&mut stream, &handler),
            Err(err) => log::warn!("Failed to accept connection: {}", err),
        }
    }
}

/// One worker per core the system reports, 4 if it can't tell
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|x| x.into())
        .unwrap_or(4)
}

fn handle_stream<F>(mut stream: &mut TcpStream, handler: F)
where
    F: Fn(Request) -> Response,
{
    let buf_reader = BufReader::new(&mut stream);
    let response = match parse_request(buf_reader) {
        Ok(request) => handler(request),
        Err(err) => {
            log::warn!("Rejecting malformed request: {}", err);
            Response::error(400)
        }
    };

    if let Err(err) = stream.write_all(serialize(&response).as_bytes()) {
        log::error!("Failed to respond: {}", err);
    }
}

/// Status line, headers (Content-Length included) and body, ready to be sent
fn serialize(response: &Response) -> String {
    let code = response.status.unwrap_or(500);
    let mut message = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n",
        code,
        code_to_string(code),
        response.body.len()
    );
    for (name, value) in response.headers.iter() {
        message.push_str(&format!("{}: {}\r\n", name, value));
    }
    message.push_str("\r\n");
    message.push_str(&response.body);
    message
}
