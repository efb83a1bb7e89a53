pub mod client;

pub use client::{MpClient, MpError, MpUser, TokenSet};
