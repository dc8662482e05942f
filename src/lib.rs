//! apicheck - scripted verification client for a session-authenticated
//! messaging API.
//!
//! The crate drives one fixed scenario against a messaging server: log in,
//! list messages, post one, list again, and confirm that unauthenticated
//! access is rejected. Everything runs over plain HTTP/1.1 with one
//! connection per exchange.

pub mod http;
pub mod net;
pub mod scenario;
