pub mod archive;
pub mod bump;
pub mod sweeper;

pub use archive::{archive_listing, ArchiveNotice};
pub use bump::{BumpDenial, BumpEligibility, BumpPlan, BumpPolicy, BumpRequest};
pub use sweeper::{ExpirySweeper, FreshListings};
