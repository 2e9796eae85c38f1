use std::thread;
use std::time::Duration;

/// Timeouts and resend budget for one form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PostPolicy {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) attempts: usize,
    pub(crate) retry_delay: Duration,
}

/// A failed attempt, split by whether the form may be sent again.
#[derive(Debug)]
enum AttemptError {
    /// The form never reached the server.
    NotSent(String),
    /// The server answered without acting on the form.
    Deferred(String),
    /// The server may have acted on the form; sending it again could record it twice.
    Final(String),
}

impl AttemptError {
    fn resendable(&self) -> bool {
        matches!(self, Self::NotSent(_) | Self::Deferred(_))
    }

    fn into_message(self) -> String {
        match self {
            Self::NotSent(message) | Self::Deferred(message) | Self::Final(message) => message,
        }
    }
}

fn server_deferred(status: u16) -> bool {
    matches!(status, 408 | 429 | 502 | 503 | 504)
}

fn status_error(status: u16, response: ureq::Response) -> AttemptError {
    let response_body = response.into_string().ok().unwrap_or_default();
    let body = response_body.trim();
    let message = if body.is_empty() {
        format!("HTTP status {status}")
    } else {
        let truncated = body.chars().take(240).collect::<String>();
        format!("HTTP status {status} ({truncated})")
    };
    if server_deferred(status) {
        AttemptError::Deferred(message)
    } else {
        AttemptError::Final(message)
    }
}

fn transport_error(err: &ureq::Transport) -> AttemptError {
    match err.kind() {
        ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::ProxyConnect => {
            AttemptError::NotSent(format!("could not connect: {err}"))
        }
        ureq::ErrorKind::Io => {
            AttemptError::Final(format!("no answer after the form was sent: {err}"))
        }
        _ => AttemptError::Final(format!("transport error: {err}")),
    }
}

fn send_once(
    agent: &ureq::Agent,
    url: &str,
    headers: &[(String, String)],
    fields: &[(&str, &str)],
) -> Result<String, AttemptError> {
    let mut request = agent.post(url);
    for (key, value) in headers {
        request = request.set(key, value);
    }

    match request.send_form(fields) {
        Ok(response) => response
            .into_string()
            .map_err(|err| AttemptError::Final(format!("response decode failed: {err}"))),
        Err(ureq::Error::Status(status, response)) => Err(status_error(status, response)),
        Err(ureq::Error::Transport(err)) => Err(transport_error(&err)),
    }
}

/// Submits `form` as `application/x-www-form-urlencoded`. Only attempts that
/// left the server untouched are repeated: refused connections, DNS failures
/// and the statuses a server uses to defer work. A read timeout after the body
/// went out is final.
pub(crate) fn post_form(
    url: &str,
    headers: &[(String, String)],
    form: &[(String, String)],
    policy: PostPolicy,
) -> Result<String, String> {
    let attempts = policy.attempts.max(1);
    let fields: Vec<(&str, &str)> = form
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(policy.connect_timeout)
        .timeout_read(policy.read_timeout)
        .timeout_write(policy.read_timeout)
        .build();

    let mut attempt = 1;
    loop {
        match send_once(&agent, url, headers, &fields) {
            Ok(body) => return Ok(body),
            Err(err) if err.resendable() && attempt < attempts => {
                attempt += 1;
                thread::sleep(policy.retry_delay);
            }
            Err(err) if err.resendable() => {
                return Err(format!(
                    "request failed after {attempts} attempt(s): {}",
                    err.into_message()
                ));
            }
            Err(err) => return Err(format!("request failed: {}", err.into_message())),
        }
    }
}
