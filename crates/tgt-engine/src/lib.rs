//! Harvesting engine: scans message-id ranges through a
//! [`tgt_core::provider::ChatProvider`] and downloads, copies, or uploads
//! media, retrying around provider rate limits.

pub mod flows;
pub mod harvest;
pub mod retry;
pub mod transfer;
pub mod upload;

pub use flows::{copy_messages, download_media, upload_media, CopyRequest, DownloadRequest};
pub use harvest::{HarvestOutcome, HarvestRequest, RangeHarvester};
pub use retry::RateLimitedExecutor;
pub use transfer::{Copier, Downloader, NamingMode, TransferStrategy};
pub use upload::UploadRequest;
