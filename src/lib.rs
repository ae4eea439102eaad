//! Lexiq - query engine for pretrained word and text embedding models
//!
//! The embedding model (file parsing, subword hashing, vector math) is an
//! external collaborator behind the [`ModelBackend`] / [`ModelLoader`]
//! traits; this crate is the marshalling core around it:
//!
//! - dictionary lookups and word/subword/sentence vector retrieval
//! - k-nearest-neighbor search with exclusion sets over a lazily
//!   precomputed word-vector matrix
//! - analogy queries (`"king - man + woman"`) with sign-aware, normalized
//!   vector accumulation
//! - top-k label prediction with log-space to probability conversion
//! - n-gram vector enumeration
//! - rendering every outcome into a JSON document or error envelope
//!
//! # Example
//!
//! ```ignore
//! use lexiq::{EngineConfig, QueryEngine};
//!
//! let engine = QueryEngine::new(EngineConfig::default(), loader)?;
//! engine.load_model("news.bin")?;
//!
//! let neighbors = engine.nearest_neighbors("cat", 10)?;
//! let answer = engine.analogies("berlin - germany + france", 1)?;
//! println!("{}", lexiq::render(Ok(answer)).into_json());
//! ```
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod response;

pub use config::EngineConfig;
pub use engine::{default_k, NgramVector, QueryEngine, ScoredLabel};
pub use error::{QueryError, Result};
pub use model::{Matrix, ModelBackend, ModelError, ModelLoader, OOV_ID};
pub use parser::{parse_query, SignedTerm};
pub use response::{render, Document};
