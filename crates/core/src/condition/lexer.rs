//! Tokenizer for the condition language.

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Integer(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(super) fn tokenize(src: &str) -> Result<Vec<Spanned>, String> {
    let mut chars = src.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '0'..='9' | '.' => lex_number(src, &mut chars)?,
            '\'' | '"' => lex_string(&mut chars)?,
            c if c.is_ascii_alphabetic() || c == '_' => lex_word(&mut chars),
            _ => lex_operator(&mut chars)?,
        };
        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}

fn lex_number(src: &str, chars: &mut Peekable<CharIndices<'_>>) -> Result<Token, String> {
    let Some(&(start, _)) = chars.peek() else {
        return Err("unexpected end of input".to_string());
    };
    let mut end = start;
    let mut seen_dot = false;

    while let Some(&(i, c)) = chars.peek() {
        if c.is_ascii_digit() {
            end = i + 1;
            chars.next();
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end = i + 1;
            chars.next();
        } else {
            break;
        }
    }

    let text = &src[start..end];
    if seen_dot {
        if text == "." || text.ends_with('.') {
            return Err(format!("malformed number `{text}` at offset {start}"));
        }
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| format!("malformed number `{text}` at offset {start}"))
    } else {
        text.parse::<i64>()
            .map(Token::Integer)
            .map_err(|_| format!("integer literal `{text}` out of range at offset {start}"))
    }
}

fn lex_string(chars: &mut Peekable<CharIndices<'_>>) -> Result<Token, String> {
    let Some((start, quote)) = chars.next() else {
        return Err("unexpected end of input".to_string());
    };
    let mut out = String::new();

    loop {
        match chars.next() {
            Some((_, c)) if c == quote => return Ok(Token::Str(out)),
            Some((i, '\\')) => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, c @ ('\\' | '\'' | '"'))) => out.push(c),
                Some((_, c)) => return Err(format!("unknown escape `\\{c}` at offset {i}")),
                None => break,
            },
            Some((_, c)) => out.push(c),
            None => break,
        }
    }

    Err(format!("unterminated string starting at offset {start}"))
}

fn lex_word(chars: &mut Peekable<CharIndices<'_>>) -> Token {
    let mut word = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            chars.next();
        } else {
            break;
        }
    }

    match word.as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "true" | "True" => Token::True,
        "false" | "False" => Token::False,
        _ => Token::Ident(word),
    }
}

fn lex_operator(chars: &mut Peekable<CharIndices<'_>>) -> Result<Token, String> {
    let Some((offset, c)) = chars.next() else {
        return Err("unexpected end of input".to_string());
    };
    let followed_by_eq = matches!(chars.peek(), Some(&(_, '=')));

    let token = match c {
        '+' => Token::Plus,
        '-' => Token::Minus,
        '*' => Token::Star,
        '/' => Token::Slash,
        '(' => Token::LParen,
        ')' => Token::RParen,
        '<' if followed_by_eq => Token::Le,
        '<' => Token::Lt,
        '>' if followed_by_eq => Token::Ge,
        '>' => Token::Gt,
        '=' if followed_by_eq => Token::Eq,
        '!' if followed_by_eq => Token::Ne,
        '=' => return Err(format!("unexpected `=` at offset {offset}, use `==` for equality")),
        _ => return Err(format!("unexpected character `{c}` at offset {offset}")),
    };

    if matches!(token, Token::Le | Token::Ge | Token::Eq | Token::Ne) {
        chars.next();
    }
    Ok(token)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn tokenizes_comparison() {
        assert_eq!(
            kinds("value >= 10"),
            vec![Token::Ident("value".into()), Token::Ge, Token::Integer(10)]
        );
    }

    #[test]
    fn tokenizes_all_operators() {
        assert_eq!(
            kinds("< <= > >= == != + - * / ( )"),
            vec![
                Token::Lt,
                Token::Le,
                Token::Gt,
                Token::Ge,
                Token::Eq,
                Token::Ne,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::LParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn tokenizes_keywords() {
        assert_eq!(
            kinds("and or not true False"),
            vec![Token::And, Token::Or, Token::Not, Token::True, Token::False]
        );
    }

    #[test]
    fn tokenizes_floats_and_strings() {
        assert_eq!(
            kinds(r#"0.5 'it\'s' "a\tb""#),
            vec![
                Token::Float(0.5),
                Token::Str("it's".into()),
                Token::Str("a\tb".into()),
            ]
        );
    }

    #[test]
    fn records_offsets() {
        let tokens = tokenize("  a<1").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![2, 3, 4]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(tokenize("value = 1").is_err());
        assert!(tokenize("value ! 1").is_err());
        assert!(tokenize("'open").is_err());
        assert!(tokenize("1.").is_err());
        assert!(tokenize("99999999999999999999").is_err());
        assert!(tokenize("value; 1").is_err());
    }
}
