//! Turning expression text into postfix token order.
//!
//! Parsing happens in two passes: a cursor-based tokenizer produces a flat
//! token stream, then [`to_postfix`] reorders it with the shunting-yard
//! algorithm so the evaluator can run it as a stack machine.

use smol_str::SmolStr;
use std::fmt::{self, Display, Formatter};

/// Tokenize an expression string.
///
/// Fails with [`ParseError::UnexpectedCharacter`] on the first symbol the
/// grammar doesn't know about.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    Tokens::new(src).collect()
}

/// The kinds of token that can appear in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(SmolStr),
    Operator(Op),
    OpenParen,
    CloseParen,
}

/// An operator, with a fixed precedence and arity.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Op {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    /// Postfix transpose, written `'` or `^t`.
    Transpose,
}

impl Op {
    /// Higher binds tighter.
    pub(crate) fn precedence(self) -> u8 {
        match self {
            Op::Plus | Op::Minus => 1,
            Op::Times | Op::Divide => 2,
            Op::Power => 3,
            Op::Transpose => 4,
        }
    }

    /// How many operands the operator pops. Transpose is the only unary
    /// operator, and it is postfix; marking its arity explicitly is what
    /// keeps the evaluator from popping two values for it.
    pub(crate) fn arity(self) -> usize {
        match self {
            Op::Transpose => 1,
            _ => 2,
        }
    }
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedCharacter { character: char, index: usize },
    EmptyExpression,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedCharacter { character, .. } => {
                write!(f, "Unexpected character: {}", character)
            },
            ParseError::EmptyExpression => write!(f, "Empty expression"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
struct Tokens<'a> {
    src: &'a str,
    cursor: usize,
    /// An implicit `*` waiting to be emitted after a number.
    pending: Option<Token>,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Tokens {
            src,
            cursor: 0,
            pending: None,
        }
    }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn chomp(&mut self, token: Token) -> Option<Result<Token, ParseError>> {
        self.advance()?;
        Some(Ok(token))
    }

    fn take_while<P>(&mut self, mut predicate: P) -> &'a str
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        &self.src[start..self.cursor]
    }

    fn chomp_number(&mut self) -> Token {
        let start = self.cursor;
        self.take_while(|c| c.is_ascii_digit());

        if self.peek() == Some('.') {
            // skip past the decimal point and any digits after it
            self.advance();
            self.take_while(|c| c.is_ascii_digit());
        }

        let text = &self.src[start..self.cursor];
        let value = text.parse().expect("Guaranteed correct by the lexer");

        // juxtaposition like "3A" or "2(A + B)" means multiplication
        let next = self.rest().chars().find(|c| !c.is_whitespace());
        if let Some('(') | Some('a'..='z') | Some('A'..='Z') = next {
            self.pending = Some(Token::Operator(Op::Times));
        }

        Token::Number(value)
    }

    fn chomp_identifier(&mut self) -> Token {
        let mut seen_first_character = false;

        let text = self.take_while(|c| {
            if seen_first_character {
                c.is_ascii_alphanumeric() || c == '_'
            } else {
                seen_first_character = true;
                c.is_ascii_alphabetic()
            }
        });

        Token::Identifier(text.into())
    }

    /// `^t` (with optional whitespace before the `t`) is transpose, any
    /// other `^` is the power operator.
    fn chomp_caret(&mut self) -> Token {
        self.advance();

        let mut lookahead = self.clone();
        Tokens::take_while(&mut lookahead, char::is_whitespace);

        match lookahead.peek() {
            Some('t') | Some('T') => {
                lookahead.advance();
                *self = lookahead;
                Token::Operator(Op::Transpose)
            },
            _ => Token::Operator(Op::Power),
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.take() {
            return Some(Ok(token));
        }

        loop {
            return match self.peek()? {
                space if space.is_whitespace() => {
                    self.advance();
                    continue;
                },
                '(' => self.chomp(Token::OpenParen),
                ')' => self.chomp(Token::CloseParen),
                '+' => self.chomp(Token::Operator(Op::Plus)),
                '-' => self.chomp(Token::Operator(Op::Minus)),
                '*' | '·' | '.' => self.chomp(Token::Operator(Op::Times)),
                '/' => self.chomp(Token::Operator(Op::Divide)),
                '\'' => self.chomp(Token::Operator(Op::Transpose)),
                '^' => Some(Ok(self.chomp_caret())),
                '0'..='9' => Some(Ok(self.chomp_number())),
                'a'..='z' | 'A'..='Z' => Some(Ok(self.chomp_identifier())),
                other => Some(Err(ParseError::UnexpectedCharacter {
                    character: other,
                    index: self.cursor,
                })),
            };
        }
    }
}

/// What the shunting-yard operator stack can hold.
enum Pending {
    Op(Op),
    OpenParen,
}

/// Reorder an infix token sequence into postfix (operator-last) order.
///
/// Grouping is permissive: an excess `)` just drains the operator stack and
/// an unmatched `(` left over at the end of input is dropped. Mismatched
/// input therefore still evaluates rather than erroring.
pub fn to_postfix<T>(tokens: T) -> Vec<Token>
where
    T: IntoIterator<Item = Token>,
{
    let mut output = Vec::new();
    let mut operators: Vec<Pending> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) | Token::Identifier(_) => output.push(token),
            Token::Operator(op) => {
                while let Some(Pending::Op(top)) = operators.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }

                    output.push(Token::Operator(*top));
                    operators.pop();
                }

                operators.push(Pending::Op(op));
            },
            Token::OpenParen => operators.push(Pending::OpenParen),
            Token::CloseParen => loop {
                match operators.pop() {
                    Some(Pending::Op(top)) => {
                        output.push(Token::Operator(top))
                    },
                    Some(Pending::OpenParen) | None => break,
                }
            },
        }
    }

    for pending in operators.into_iter().rev() {
        if let Pending::Op(op) = pending {
            output.push(Token::Operator(op));
        }
    }

    output
}


#[cfg(test)]
mod postfix_tests {
    use super::*;

    fn postfix_of(src: &str) -> Vec<Token> {
        to_postfix(tokenize(src).unwrap())
    }

    fn render(tokens: &[Token]) -> String {
        let words: Vec<String> = tokens
            .iter()
            .map(|token| match token {
                Token::Number(value) => value.to_string(),
                Token::Identifier(name) => name.to_string(),
                Token::Operator(Op::Plus) => "+".into(),
                Token::Operator(Op::Minus) => "-".into(),
                Token::Operator(Op::Times) => "*".into(),
                Token::Operator(Op::Divide) => "/".into(),
                Token::Operator(Op::Power) => "^".into(),
                Token::Operator(Op::Transpose) => "'".into(),
                Token::OpenParen => "(".into(),
                Token::CloseParen => ")".into(),
            })
            .collect();

        words.join(" ")
    }

    macro_rules! postfix_test {
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let got = postfix_of($src);

                assert_eq!(render(&got), $should_be);
            }
        };
    }

    postfix_test!(plain_sum, "A + B", "A B +");
    postfix_test!(product_binds_tighter, "A + B*C", "A B C * +");
    postfix_test!(groups_override_precedence, "(A + B)*C", "A B + C *");
    postfix_test!(left_to_right_at_equal_precedence, "A - B + C", "A B - C +");
    postfix_test!(transpose_binds_tightest, "3A^t", "3 A ' *");
    postfix_test!(
        power_and_transpose_before_anything_else,
        "3A^t - B^2",
        "3 A ' * B 2 ^ -"
    );
    postfix_test!(scalar_division, "A/2", "A 2 /");

    #[test]
    fn implicit_multiplication_matches_explicit() {
        assert_eq!(postfix_of("2A"), postfix_of("2*A"));
    }

    #[test]
    fn transpose_spellings_place_identically() {
        assert_eq!(postfix_of("A' + B"), postfix_of("A^t + B"));
    }

    #[test]
    fn excess_closing_paren_is_tolerated() {
        assert_eq!(render(&postfix_of("A + B)")), "A B +");
    }

    #[test]
    fn unmatched_opening_paren_is_tolerated() {
        assert_eq!(render(&postfix_of("(A + B")), "A B +");
    }
}
