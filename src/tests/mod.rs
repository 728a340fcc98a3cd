pub mod common;

mod metadata_endpoints;
