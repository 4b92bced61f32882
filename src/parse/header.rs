// src/parse/header.rs

use tracing::trace;

use super::{ColumnMap, Field, Step, Token, TokenStream, TH, TR};
use crate::error::ParseError;

/// Learns the column layout from a table's first row.
///
/// Every `th` advances the ordinal whether or not its label is known, so the
/// ordinals line up with the data cells below.
#[derive(Debug, Clone, Default)]
pub struct HeaderMapper {
    ordinal: Option<usize>,
    in_cell: bool,
    columns: ColumnMap,
}

impl HeaderMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, token: &Token) -> Step {
        match token {
            t if t.is_start(TH) => {
                self.ordinal = Some(self.ordinal.map_or(0, |o| o + 1));
                self.in_cell = true;
            }
            t if t.is_end(TH) => self.in_cell = false,
            t if t.is_end(TR) => return Step::Done,
            Token::Text(text) if self.in_cell => {
                if let (Some(field), Some(ordinal)) = (Field::from_label(text), self.ordinal) {
                    trace!(?field, ordinal, "header column");
                    self.columns.insert(field, ordinal);
                }
            }
            _ => {}
        }
        Step::Continue
    }

    pub fn finish(self) -> ColumnMap {
        self.columns
    }
}

/// Consume a header row, starting just after the table's opening tag.
///
/// Running out of input before the row closes is not an error; whatever was
/// learned so far is returned.
pub fn map_header<S: TokenStream>(tokens: &mut S) -> Result<ColumnMap, ParseError> {
    let mut mapper = HeaderMapper::new();
    for token in tokens {
        if mapper.step(&token?) == Step::Done {
            break;
        }
    }
    Ok(mapper.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(labels: &[&str]) -> Vec<Token> {
        let mut tokens = vec![Token::start("thead"), Token::start(TR)];
        for label in labels {
            tokens.push(Token::start(TH));
            tokens.push(Token::text(label));
            tokens.push(Token::end(TH));
        }
        tokens.push(Token::end(TR));
        tokens.push(Token::end("thead"));
        tokens
    }

    fn run(tokens: Vec<Token>) -> Result<ColumnMap, ParseError> {
        map_header(&mut tokens.into_iter().map(Ok::<_, ParseError>))
    }

    #[test]
    fn test_known_labels_get_their_ordinals() {
        let map = run(header(&["#", "Название", "Тикер"])).unwrap();
        assert_eq!(map.get(Field::Name), Some(1));
        assert_eq!(map.get(Field::Ticker), Some(2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_unknown_labels_still_count() {
        let map = run(header(&[
            "#", "Цена", " ТИКЕР ", "Объем", "Изм.", "\n название\t",
        ]))
        .unwrap();
        assert_eq!(map.get(Field::Ticker), Some(2));
        assert_eq!(map.get(Field::Name), Some(5));
        assert_eq!(map.field_at(0), None);
        assert_eq!(map.field_at(5), Some(Field::Name));
    }

    #[test]
    fn test_text_outside_cells_is_ignored() {
        let tokens = vec![
            Token::start(TR),
            Token::text("Тикер"),
            Token::start(TH),
            Token::text("#"),
            Token::end(TH),
            Token::text("Название"),
            Token::end(TR),
        ];
        assert!(run(tokens).unwrap().is_empty());
    }

    #[test]
    fn test_nested_markup_inside_cell() {
        let tokens = vec![
            Token::start(TR),
            Token::start(TH),
            Token::start("span"),
            Token::text("Тикер"),
            Token::end("span"),
            Token::end(TH),
            Token::end(TR),
        ];
        assert_eq!(run(tokens).unwrap().get(Field::Ticker), Some(0));
    }

    #[test]
    fn test_stops_at_end_of_row() {
        let mut tokens = header(&["Тикер"]).into_iter().map(Ok::<_, ParseError>);
        map_header(&mut tokens).unwrap();
        assert_eq!(tokens.next(), Some(Ok(Token::end("thead"))));
    }

    #[test]
    fn test_end_of_input_is_not_an_error() {
        let tokens = vec![Token::start(TR), Token::start(TH), Token::text("Тикер")];
        assert_eq!(run(tokens).unwrap().get(Field::Ticker), Some(0));
        assert!(run(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_stream_errors_surface() {
        let mut tokens = vec![
            Ok(Token::start(TR)),
            Err(ParseError("bad byte".to_string())),
        ]
        .into_iter();
        assert_eq!(
            map_header(&mut tokens),
            Err(ParseError("bad byte".to_string()))
        );
    }
}
