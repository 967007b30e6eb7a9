mod tokenizer;

pub use tokenizer::{DocumentTerms, Tokenizer};
