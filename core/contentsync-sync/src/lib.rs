//! Content sync engine.
//!
//! Pulls one content item at a time from a source repository into a
//! destination repository whose field schema is compatible but whose file
//! and item IDs are unrelated.
//!
//! # Components
//!
//! - **Reference cache**: source URL to destination file ID, per pull
//! - **Media importer**: resolves file references, importing each URL once
//! - **Content mapper**: resolves item references by slug, then title
//! - **Field walker**: walks the destination schema alongside the payload,
//!   with a bounded retry for conditionally visible fields
//! - **Payload encoder**: the source-side inverse of the walker
//! - **Pull**: fetch, top-level content, template, featured file, fields
//!
//! # Example
//!
//! ```no_run
//! use contentsync_model::Destination;
//! use contentsync_sync::{PullRequest, SourceClient, SourceConfig, pull};
//! use contentsync_types::{ContentId, SourceIdentifier};
//!
//! # async fn run<S>(site: &S) -> contentsync_sync::SyncResult<()>
//! # where S: contentsync_model::FieldSchemaLookup + contentsync_model::FieldWriter
//! #     + contentsync_model::FileStore + contentsync_model::ContentLookup
//! #     + contentsync_model::ContentStore {
//! let client = SourceClient::new(SourceConfig::load("source.toml")?)?;
//! let request = PullRequest::new(
//!     ContentId::new(12).unwrap(),
//!     SourceIdentifier::parse("about-us")?,
//! );
//! let report = pull(&client, Destination::of(site), &request).await?;
//! println!("updated {:?}", report.updated);
//! # Ok(())
//! # }
//! ```

mod cache;
pub mod config;
mod encoder;
mod error;
mod mapper;
mod media;
mod pull;
pub mod source;
mod walker;

pub use cache::ReferenceCache;
pub use config::SourceConfig;
pub use encoder::{DEFAULT_TEMPLATE, PayloadEncoder};
pub use error::{SyncError, SyncResult};
pub use mapper::ContentMapper;
pub use media::MediaImporter;
pub use pull::{PullReport, PullRequest, is_allowed_template, pull};
pub use source::{DocumentSource, PingStatus, SourceClient};
pub use walker::{FieldWalker, MAX_RETRY_PASSES, WalkReport};
