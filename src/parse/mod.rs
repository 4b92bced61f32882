// src/parse/mod.rs

//! Extraction of the issuer table from the exchange's share listing.
//!
//! The table is read as a flat stream of markup events by three small state
//! machines: [`HeaderMapper`] learns which column carries which field from the
//! header row, [`RowExtractor`] turns one data row into a [`Record`], and
//! [`TableWalker`] finds the table and drives the other two.

pub mod header;
pub mod key;
pub mod row;
pub mod table;
pub mod tokens;

pub use header::{map_header, HeaderMapper};
pub use key::normalize;
pub use row::{extract_row, RowExtractor};
pub use table::{parse_issuer_table, walk_table, TableWalker, WalkState};
pub use tokens::{document_tokens, Token, TokenStream};

pub(crate) const TABLE: &str = "table";
pub(crate) const TR: &str = "tr";
pub(crate) const TH: &str = "th";
pub(crate) const TD: &str = "td";
pub(crate) const A: &str = "a";
pub(crate) const HREF: &str = "href";

/// A column whose meaning is recognised from its header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Ticker,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "название",
            Field::Ticker => "тикер",
        }
    }

    /// Match header text, ignoring case and surrounding whitespace.
    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        [Field::Name, Field::Ticker]
            .into_iter()
            .find(|f| f.label() == text)
    }
}

/// Zero-based column ordinal per recognised field. Built once per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    name: Option<usize>,
    ticker: Option<usize>,
}

impl ColumnMap {
    pub fn insert(&mut self, field: Field, ordinal: usize) {
        match field {
            Field::Name => self.name = Some(ordinal),
            Field::Ticker => self.ticker = Some(ordinal),
        }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::Name => self.name,
            Field::Ticker => self.ticker,
        }
    }

    /// The field carried by the cell at `ordinal`, if any.
    pub fn field_at(&self, ordinal: usize) -> Option<Field> {
        if self.name == Some(ordinal) {
            Some(Field::Name)
        } else if self.ticker == Some(ordinal) {
            Some(Field::Ticker)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.name.is_some() as usize + self.ticker.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One data row, normalised. Any field may be empty when its column was
/// missing from the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub display_name: String,
    pub natural_key: String,
    pub ticker_symbol: String,
}

/// Outcome of feeding one token to a state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
}
