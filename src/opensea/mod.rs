pub mod listings;
pub mod types;

pub use listings::ListingFetcher;
