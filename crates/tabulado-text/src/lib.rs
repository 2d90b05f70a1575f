//! Delimited-text decoding for tabulado.
//!
//! Turns raw uploaded bytes (CSV, TSV, TXT and friends) into a raw
//! [`tabulado_core::Table`], handling the two things such uploads never
//! declare: the character encoding and the field delimiter.
//!
//! ```
//! use tabulado_text::{read, TextReadOptions};
//!
//! let out = read(b"Nombre;Valor\nAna;1\nLuis;2", &TextReadOptions::new());
//! assert_eq!(out.delimiter, Some(b';'));
//! assert_eq!(out.table.n_cols(), 2);
//! assert_eq!(out.table.n_rows(), 2);
//! ```

mod encoding;
mod options;
mod reader;
mod sniff;

pub use encoding::decode;
pub use options::TextReadOptions;
pub use reader::{read, TextTable};
pub use sniff::{auto_pick, sniff_delimiter, CANDIDATES};
