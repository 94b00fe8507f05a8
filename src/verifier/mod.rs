pub mod client;

pub use client::VerifierClient;
