//! Storage module for S3-compatible backends
//!
//! File bytes live in object storage; the catalog keeps only retrieval URLs.

mod s3_client;

pub use s3_client::S3Client;
