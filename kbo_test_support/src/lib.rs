//! In-memory DuckDB-backed catalog fixture (§10.4): every other crate's tests build realistic
//! catalog state through [`TestCatalog`]'s builder methods instead of hand-writing setup SQL.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self)]

mod util;

pub use util::TestCatalog;
