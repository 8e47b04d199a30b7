pub mod funnel;
pub mod generator;
pub mod prompts;

#[cfg(feature = "gemini")]
pub mod client;
#[cfg(feature = "gemini")]
pub mod types;

pub use funnel::*;
pub use generator::*;
pub use prompts::*;

#[cfg(feature = "gemini")]
pub use client::*;
