// src/parse/row.rs

use super::{key, ColumnMap, Field, Record, Step, Token, TokenStream, A, HREF, TD, TR};
use crate::error::TableError;

/// Where the extractor is inside the current row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Between cells, or before the first one.
    InDataRow,
    InNameCell,
    InTickerCell,
    /// A cell with no mapped field, or a ticker cell already captured.
    InOtherCell,
}

/// Turns the events of one data row into a [`Record`].
#[derive(Debug, Clone)]
pub struct RowExtractor {
    columns: ColumnMap,
    ordinal: Option<usize>,
    state: RowState,
    record: Record,
}

impl RowExtractor {
    pub fn new(columns: ColumnMap) -> Self {
        Self {
            columns,
            ordinal: None,
            state: RowState::InDataRow,
            record: Record::default(),
        }
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    /// Feed one event. Returns `Step::Done` on the row's closing tag.
    pub fn step(&mut self, token: &Token) -> Result<Step, TableError> {
        if token.is_end(TR) {
            return Ok(Step::Done);
        }
        if token.is_start(TD) {
            self.enter_cell();
            return Ok(Step::Continue);
        }
        if token.is_end(TD) {
            self.state = RowState::InDataRow;
            return Ok(Step::Continue);
        }

        match self.state {
            RowState::InNameCell => match token {
                Token::Text(text) if self.record.display_name.is_empty() => {
                    self.record.display_name = text.trim().to_string();
                }
                t if t.is_start(A) => {
                    if let Some(href) = t.attr(HREF) {
                        self.record.natural_key = key::normalize(href)?;
                    }
                }
                _ => {}
            },
            RowState::InTickerCell => {
                if let Token::Text(text) = token {
                    if !text.trim().is_empty() {
                        self.record.ticker_symbol = text.trim().to_string();
                        self.state = RowState::InOtherCell;
                    }
                }
            }
            RowState::InDataRow | RowState::InOtherCell => {}
        }
        Ok(Step::Continue)
    }

    pub fn finish(self) -> Record {
        self.record
    }

    fn enter_cell(&mut self) {
        let ordinal = self.ordinal.map_or(0, |o| o + 1);
        self.ordinal = Some(ordinal);
        self.state = match self.columns.field_at(ordinal) {
            Some(Field::Name) => RowState::InNameCell,
            Some(Field::Ticker) => RowState::InTickerCell,
            None => RowState::InOtherCell,
        };
    }
}

/// Consume one data row, starting just after its `tr` tag.
///
/// Running out of input ends the row early and keeps what was captured.
pub fn extract_row<S: TokenStream>(
    tokens: &mut S,
    columns: ColumnMap,
) -> Result<Record, TableError> {
    let mut extractor = RowExtractor::new(columns);
    for token in tokens {
        if extractor.step(&token?)? == Step::Done {
            break;
        }
    }
    Ok(extractor.finish())
}
