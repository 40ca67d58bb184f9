pub mod category;
pub mod cdn;
pub mod config;
pub mod download;
mod error;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod session;
pub mod submission;
pub mod submission_url;
pub mod transport;

pub use category::SubmissionType;
pub use config::SiteConfig;
pub use download::{DownloadExecutor, DownloadOutcome};
pub use error::{FailerError, FailureCategory, Result};
pub use session::{Credentials, Session, SessionManager};
pub use submission::{Submission, SubmissionResolver};
pub use transport::{HttpTransport, Transport};
