pub mod context;
pub mod page_file;
pub mod result_model;
pub mod runner;
pub mod selection;
pub mod spec_model;
pub mod verifier;
