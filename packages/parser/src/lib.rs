pub mod entities;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

#[cfg(test)]
mod tests_serializer;

pub use error::{ParseError, ParseResult};
pub use parser::{parse, parse_into, parse_with_root};
pub use serializer::{serialize, serialize_children, Serializer};
pub use tokenizer::{tokenize, SpannedToken, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let tokens = tokenize("<p>Hello</p>").unwrap();
        assert_eq!(tokens.len(), 3);
    }
}
