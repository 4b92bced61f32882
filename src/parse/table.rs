// src/parse/table.rs

use scraper::Html;
use tracing::{debug, instrument, warn};

use super::{
    document_tokens, ColumnMap, HeaderMapper, Record, RowExtractor, Step, Token, TokenStream,
    TABLE, TD, TR,
};
use crate::error::TableError;

/// Where the walker is in the document.
#[derive(Debug, Clone)]
pub enum WalkState {
    SeekTable,
    InHeaderRow(HeaderMapper),
    BetweenRows,
    /// Inside a `tr`, before its first `td`.
    RowStart,
    /// Buffering the first `td` until it shows text or closes empty.
    InFirstCell(Vec<Token>),
    InDataRow(RowExtractor),
    /// The rest of a row whose first cell was blank.
    SkipRow,
    Done,
}

/// Finds the first table, maps its header and collects one [`Record`] per
/// data row.
///
/// A row whose first cell holds no text (spacers, repeated headers) is
/// dropped without being extracted.
#[derive(Debug, Clone)]
pub struct TableWalker {
    state: WalkState,
    columns: ColumnMap,
    records: Vec<Record>,
    skipped: usize,
}

impl Default for TableWalker {
    fn default() -> Self {
        Self {
            state: WalkState::SeekTable,
            columns: ColumnMap::default(),
            records: Vec::new(),
            skipped: 0,
        }
    }
}

impl TableWalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WalkState {
        &self.state
    }

    pub fn columns(&self) -> ColumnMap {
        self.columns
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, WalkState::Done)
    }

    pub fn step(&mut self, token: Token) -> Result<(), TableError> {
        let state = std::mem::replace(&mut self.state, WalkState::Done);
        let in_body = !matches!(state, WalkState::SeekTable | WalkState::InHeaderRow(_));
        if in_body && token.is_end(TABLE) {
            if let WalkState::InDataRow(extractor) = state {
                self.records.push(extractor.finish());
            }
            return Ok(());
        }

        self.state = match state {
            WalkState::SeekTable if token.is_start(TABLE) => {
                WalkState::InHeaderRow(HeaderMapper::new())
            }
            WalkState::SeekTable => WalkState::SeekTable,

            WalkState::InHeaderRow(mut mapper) => match mapper.step(&token) {
                Step::Continue => WalkState::InHeaderRow(mapper),
                Step::Done => {
                    self.columns = mapper.finish();
                    if self.columns.is_empty() {
                        warn!("no known column labels in table header");
                        WalkState::Done
                    } else {
                        debug!(columns = ?self.columns, "header mapped");
                        WalkState::BetweenRows
                    }
                }
            },

            WalkState::BetweenRows if token.is_start(TR) => WalkState::RowStart,
            WalkState::BetweenRows => WalkState::BetweenRows,

            WalkState::RowStart if token.is_start(TD) => WalkState::InFirstCell(vec![token]),
            WalkState::RowStart if token.is_end(TR) => WalkState::BetweenRows,
            WalkState::RowStart => WalkState::RowStart,

            WalkState::InFirstCell(mut buffered) => {
                if token.is_end(TD) || token.is_end(TR) {
                    self.skipped += 1;
                    if token.is_end(TR) {
                        WalkState::BetweenRows
                    } else {
                        WalkState::SkipRow
                    }
                } else if matches!(token, Token::Text(_)) && !token.is_blank_text() {
                    buffered.push(token);
                    let mut extractor = RowExtractor::new(self.columns);
                    for t in &buffered {
                        extractor.step(t)?;
                    }
                    WalkState::InDataRow(extractor)
                } else {
                    buffered.push(token);
                    WalkState::InFirstCell(buffered)
                }
            }

            WalkState::InDataRow(mut extractor) => match extractor.step(&token)? {
                Step::Continue => WalkState::InDataRow(extractor),
                Step::Done => {
                    self.records.push(extractor.finish());
                    WalkState::BetweenRows
                }
            },

            WalkState::SkipRow if token.is_end(TR) => WalkState::BetweenRows,
            WalkState::SkipRow => WalkState::SkipRow,

            WalkState::Done => WalkState::Done,
        };
        Ok(())
    }

    /// The records collected so far. A row cut short by the end of input is
    /// kept as it stands.
    pub fn finish(mut self) -> Vec<Record> {
        if let WalkState::InDataRow(extractor) = self.state {
            self.records.push(extractor.finish());
        }
        debug!(
            records = self.records.len(),
            skipped = self.skipped,
            "table walked"
        );
        self.records
    }
}

/// Run a [`TableWalker`] over a token stream until the table closes or the
/// input ends.
pub fn walk_table<S: TokenStream>(tokens: S) -> Result<Vec<Record>, TableError> {
    let mut walker = TableWalker::new();
    for token in tokens {
        walker.step(token?)?;
        if walker.is_done() {
            break;
        }
    }
    Ok(walker.finish())
}

/// Extract the issuer table from a listing page.
#[instrument(level = "debug", skip(body), fields(body_len = body.len()))]
pub fn parse_issuer_table(body: &str) -> Result<Vec<Record>, TableError> {
    let document = Html::parse_document(body);
    walk_table(document_tokens(&document))
}
