pub mod setup;
pub mod surfaces;
