//! Remote side of the bootstrap: talk to the server over plain GETs, learn its
//! version, and copy the batch artifacts it lists into `{work_dir}/batch`.
//!
//! - **server**: `ServerIdentity`, version resolution (memoized)
//! - **batch**: manifest parsing and sequential, all-or-nothing artifact download
//! - **http**: the fixed request policy (timeouts, redirects, User-Agent)

mod batch;
mod error;
mod http;
mod server;

pub use batch::{ArtifactManifest, LocalArtifact};
pub use error::RemoteError;
pub use http::{
    user_agent_for, BATCH_PATH, BOOTSTRAPPER_NAME, CONNECT_TIMEOUT, READ_TIMEOUT, VERSION_PATH,
};
pub use server::ServerIdentity;
