pub mod config;
pub mod error;
pub mod index;
pub mod lookup;
pub mod tokenizer;

pub use config::{IndexerConfig, SourceConfig, TokenizerConfig};
pub use error::{Result, SpimiError};
pub use index::{IndexStats, Indexer};
pub use lookup::{TermLookup, TermStats};
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
