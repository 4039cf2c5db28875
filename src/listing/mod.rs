pub mod model;

pub use model::{
    Category, Listing, ListingImage, ListingRow, ListingStatus, ListingView, NewListing,
    Transition, ValidListing,
};
