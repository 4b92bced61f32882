// src/parse/tokens.rs

use ego_tree::iter::Edge;
use scraper::{Html, Node};

use crate::error::ParseError;

/// One markup event. Running out of input is the end of the stream, not a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
    },
    EndTag {
        name: String,
    },
    Text(String),
}

impl Token {
    pub fn start(name: &str) -> Self {
        Token::StartTag {
            name: name.to_string(),
            attrs: Vec::new(),
        }
    }

    pub fn start_with(name: &str, attrs: &[(&str, &str)]) -> Self {
        Token::StartTag {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn end(name: &str) -> Self {
        Token::EndTag {
            name: name.to_string(),
        }
    }

    pub fn text(text: &str) -> Self {
        Token::Text(text.to_string())
    }

    pub fn is_start(&self, tag: &str) -> bool {
        matches!(self, Token::StartTag { name, .. } if name.eq_ignore_ascii_case(tag))
    }

    pub fn is_end(&self, tag: &str) -> bool {
        matches!(self, Token::EndTag { name } if name.eq_ignore_ascii_case(tag))
    }

    /// Case-insensitive attribute lookup on a start tag.
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Token::StartTag { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Text that is empty once surrounding whitespace is removed.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Token::Text(t) if t.trim().is_empty())
    }
}

/// A lazily consumed, strictly ordered sequence of markup events.
pub trait TokenStream: Iterator<Item = Result<Token, ParseError>> {}

impl<I> TokenStream for I where I: Iterator<Item = Result<Token, ParseError>> {}

/// Replay a parsed document as markup events, in document order.
///
/// The tree builder has already merged adjacent text, so every text node
/// comes out as a single `Token::Text`.
pub fn document_tokens(html: &Html) -> impl TokenStream + '_ {
    html.tree
        .root()
        .traverse()
        .filter_map(|edge| match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(el) => Some(Token::StartTag {
                    name: el.name().to_string(),
                    attrs: el
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                }),
                Node::Text(text) => Some(Token::Text((**text).to_owned())),
                _ => None,
            },
            Edge::Close(node) => match node.value() {
                Node::Element(el) => Some(Token::EndTag {
                    name: el.name().to_string(),
                }),
                _ => None,
            },
        })
        .map(Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_order() {
        let html = Html::parse_fragment(r#"<p>one <a HREF="/x">two</a></p>"#);
        let tokens: Vec<Token> = document_tokens(&html).map(Result::unwrap).collect();

        let p = tokens.iter().position(|t| t.is_start("p")).unwrap();
        assert_eq!(tokens[p + 1], Token::text("one "));
        assert!(tokens[p + 2].is_start("a"));
        assert_eq!(tokens[p + 2].attr("href"), Some("/x"));
        assert_eq!(tokens[p + 3], Token::text("two"));
        assert!(tokens[p + 4].is_end("a"));
        assert!(tokens[p + 5].is_end("p"));
    }

    #[test]
    fn test_entities_do_not_split_text() {
        let html = Html::parse_fragment("<p>Alpha &amp; Co</p>");
        let texts: Vec<Token> = document_tokens(&html)
            .map(Result::unwrap)
            .filter(|t| matches!(t, Token::Text(_)))
            .collect();
        assert_eq!(texts, vec![Token::text("Alpha & Co")]);
    }

    #[test]
    fn test_tag_matching_ignores_case() {
        let t = Token::start_with("TD", &[("Href", "v")]);
        assert!(t.is_start("td"));
        assert!(!t.is_end("td"));
        assert_eq!(t.attr("href"), Some("v"));
        assert!(Token::text(" \n\t").is_blank_text());
        assert!(!Token::text(" x ").is_blank_text());
    }
}
