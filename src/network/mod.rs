//! Network module for the remote calculation service.
//!
//! One client, one endpoint: the Aladhan-compatible timings API that serves
//! every (city, date) pair the embedded official table does not cover.

pub mod client;

pub use client::{AladhanClient, DEFAULT_BASE_URL};
