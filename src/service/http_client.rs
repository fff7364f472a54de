//! HTTP agent configuration and bounded response reading.

use std::io::Read;

use super::ServiceError;
use crate::config::Config;

/// Longest error body kept in a [`ServiceError::Status`] message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Build an agent with the configured timeouts.
pub fn agent(config: &Config) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(config.connect_timeout)
        .timeout_read(config.io_timeout)
        .timeout_write(config.io_timeout)
        .build()
}

/// Read a response into memory, enforcing a maximum byte size.
pub fn read_response_bytes(
    response: ureq::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, ServiceError> {
    check_content_length(&response, max_bytes)?;
    let mut limited = response.into_reader().take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited
        .read_to_end(&mut bytes)
        .map_err(|e| ServiceError::Transport(e.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(ServiceError::ResponseTooLarge(max_bytes));
    }
    Ok(bytes)
}

/// Turn a `ureq` failure into a [`ServiceError`], keeping a short excerpt
/// of the error body for non-success statuses.
pub fn map_error(err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = read_response_bytes(response, MAX_ERROR_BODY_CHARS * 4)
                .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
                .unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            ServiceError::Status { code, body }
        }
        ureq::Error::Transport(err) => ServiceError::Transport(err.to_string()),
    }
}

fn check_content_length(response: &ureq::Response, max_bytes: usize) -> Result<(), ServiceError> {
    let Some(length) = response.header("Content-Length") else {
        return Ok(());
    };
    let Ok(length) = length.parse::<u64>() else {
        return Ok(());
    };
    if length > max_bytes as u64 {
        return Err(ServiceError::ResponseTooLarge(max_bytes));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one canned HTTP response and hand back the raw request text.
    pub(crate) fn serve_once(response: String) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = vec![0u8; 64 * 1024];
                let mut request = Vec::new();
                // Read until the headers and any declared body are in.
                loop {
                    let n = stream.read(&mut buf).unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request_complete(&request) {
                        break;
                    }
                }
                let _ = tx.send(String::from_utf8_lossy(&request).to_string());
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("http://{addr}"), rx)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[test]
    fn rejects_content_length_over_max() {
        let (url, _rx) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nok".to_string(),
        );
        let response = agent(&Config::default()).get(&url).call().unwrap();
        assert_eq!(
            read_response_bytes(response, 10).unwrap_err(),
            ServiceError::ResponseTooLarge(10)
        );
    }

    #[test]
    fn rejects_body_over_max() {
        let body = "a".repeat(32);
        let (url, _rx) = serve_once(format!("HTTP/1.0 200 OK\r\n\r\n{body}"));
        let response = agent(&Config::default()).get(&url).call().unwrap();
        assert_eq!(
            read_response_bytes(response, 16).unwrap_err(),
            ServiceError::ResponseTooLarge(16)
        );
    }

    #[test]
    fn status_errors_keep_body_excerpt() {
        let body = "model not loaded";
        let (url, _rx) = serve_once(format!(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ));
        let err = agent(&Config::default()).get(&url).call().unwrap_err();
        assert_eq!(
            map_error(err),
            ServiceError::Status {
                code: 503,
                body: body.to_string()
            }
        );
    }
}
