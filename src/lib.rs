//! Mythic runs generative-AI flows over user-supplied images: classify a
//! magical symbol, detect hidden symbols in an artwork, or generate an
//! optical illusion.
//!
//! Every flow is the same shape: validate a typed input against an explicit
//! shape descriptor, render a prompt template, call the external model
//! collaborator exactly once, validate the structured reply, hand it back.
//! The model client is passed explicitly into each invocation; there is no
//! ambient singleton, no retry layer and no cache.

pub mod client;
pub mod config;
pub mod flow;
pub mod logger;
pub mod schema;
pub mod template;
pub mod util;
