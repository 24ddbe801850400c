//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random bytes, Base64, constant-time compare)
//! - Password hashing (PBKDF2-HMAC-SHA256 with legacy plaintext migration)
//! - Signed bearer tokens (HMAC-SHA256, principal-scoped claims)
//! - Rate limiting infrastructure
//! - Client request metadata extraction

pub mod client;
pub mod crypto;
pub mod password;
pub mod rate_limit;
pub mod token;
