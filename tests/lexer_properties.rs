use proptest::prelude::*;
use slim::{lex, Literal, TokenKind};

const TWO_CHAR_OPERATORS: [(&str, TokenKind); 8] = [
    ("==", TokenKind::Equal),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::Lte),
    (">=", TokenKind::Gte),
    ("+=", TokenKind::PlusAssign),
    ("-=", TokenKind::MinusAssign),
    ("*=", TokenKind::StarAssign),
    ("/=", TokenKind::SlashAssign),
];

proptest! {
    #[test]
    fn integers_lex_to_a_single_number(n in 0u64..1_000_000_000) {
        let text = n.to_string();
        let tokens = lex(&text);

        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].kind, TokenKind::Number);
        prop_assert_eq!(&tokens[0].lexeme, &text);
        prop_assert_eq!(tokens[0].literal.clone(), Some(Literal::Number(n as f64)));
        prop_assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn decimals_keep_their_lexeme(text in "[0-9]{1,6}\\.[0-9]{1,6}") {
        let tokens = lex(&text);
        let expected: f64 = text.parse().unwrap();

        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(&tokens[0].lexeme, &text);
        prop_assert_eq!(tokens[0].literal.clone(), Some(Literal::Number(expected)));
    }

    #[test]
    fn two_char_operators_take_the_longest_match(
        index in 0..TWO_CHAR_OPERATORS.len(),
        left in "v[a-z]{0,3}",
        right in "[0-9]{1,3}",
    ) {
        let (op, kind) = TWO_CHAR_OPERATORS[index];
        let source = format!("{}{}{}", left, op, right);
        let tokens = lex(&source);

        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        prop_assert_eq!(kinds, vec![TokenKind::Ident, kind, TokenKind::Number, TokenKind::Eof]);
        prop_assert_eq!(&tokens[1].lexeme, op);
    }

    #[test]
    fn spacing_out_punctuation_keeps_the_token_kinds(source in "[-+*/(){}\\[\\];,.<> ]{0,24}") {
        let spaced: String = source.chars().flat_map(|c| [c, ' ']).collect();
        let plain: Vec<TokenKind> = lex(&source).iter().map(|t| t.kind).collect();
        let padded: Vec<TokenKind> = lex(&spaced).iter().map(|t| t.kind).collect();
        prop_assert_eq!(plain, padded);
    }
}
