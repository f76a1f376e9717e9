//! Engine for searching Uzbek statute texts by clause.
//!
//! Raw statute text is segmented into addressable clause records
//! ([`segment`]), indexed into an inverted index with cross-script term
//! expansion ([`IndexBuilder`]), and queried with tf-idf ranking and an
//! exact clause-number boost ([`SearchIndex::search`]).

pub mod persist;
pub mod query;
pub mod segment;
pub mod tokenizer;

mod index;
pub use index::*;
