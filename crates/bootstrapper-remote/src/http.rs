//! Request policy shared by every call to the server.
//!
//! GET only, no request body, fixed timeouts, redirects followed, and a
//! User-Agent naming both this tool and the embedding product.

use std::time::Duration;

use crate::error::RemoteError;

pub const VERSION_PATH: &str = "/api/server/version";
pub const BATCH_PATH: &str = "/batch/";

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_REDIRECTS: u32 = 5;

/// Product name this subsystem reports in the User-Agent header.
pub const BOOTSTRAPPER_NAME: &str = "sonar-bootstrapper";

/// `sonar-bootstrapper/{version} {product_token}`.
pub fn user_agent_for(version: &str, product_token: &str) -> String {
    format!("{}/{} {}", BOOTSTRAPPER_NAME, version, product_token)
}

pub(crate) fn make_agent(user_agent: &str) -> ureq::Agent {
    agent_with_timeouts(user_agent, CONNECT_TIMEOUT, READ_TIMEOUT)
}

fn agent_with_timeouts(user_agent: &str, connect: Duration, read: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(connect)
        .timeout_read(read)
        .redirects(MAX_REDIRECTS)
        .user_agent(user_agent)
        .build()
}

/// Issue a GET and require a 2xx answer.
///
/// Transport failures and non-2xx statuses both come back as errors carrying
/// the URL, so callers never inspect a failed response body.
pub(crate) fn get(agent: &ureq::Agent, url: &str) -> Result<ureq::Response, RemoteError> {
    tracing::debug!("GET {}", url);
    match agent.get(url).call() {
        Ok(response) => {
            let status = response.status();
            if (200..300).contains(&status) {
                Ok(response)
            } else {
                Err(RemoteError::UnexpectedStatus {
                    url: url.to_string(),
                    status,
                })
            }
        }
        Err(ureq::Error::Status(status, _)) => Err(RemoteError::UnexpectedStatus {
            url: url.to_string(),
            status,
        }),
        Err(ureq::Error::Transport(transport)) => Err(RemoteError::ServerUnreachable {
            url: url.to_string(),
            source: Box::new(transport),
        }),
    }
}
