//! Common test utilities for tweetline
//!
//! - Mock Twitter API endpoints (one-shot, streaming, upload)
//! - Client and credential constructors

#![allow(dead_code)]

pub mod mock_server;
pub mod test_helpers;
