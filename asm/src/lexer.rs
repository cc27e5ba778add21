use arch::mnemonic::Mnemonic;

use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    A,
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Byte,
    Word,
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Byte => "BYTE",
            Directive::Word => "WORD",
        }
    }

    /// Bytes emitted per operand.
    pub fn operand_bytes(&self) -> usize {
        match self {
            Directive::Byte => 1,
            Directive::Word => 2,
        }
    }
}

/// One lexeme of assembly source. Numeric text is converted while lexing;
/// address literals keep their digit count because mode selection is
/// digit-count driven, not value driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Mnemonic(Mnemonic),
    Register(Register),
    LabelRef(String),
    LabelDecl(String),
    ImmDec(u16),
    ImmHex(u16),
    AddrHex { value: u16, digits: usize },
    Directive(Directive),
    Comma,
    LParen,
    RParen,
    Asterisk,
    Equal,
    Newline,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn take_while(&mut self, pred: fn(char) -> bool) -> String {
        let mut run = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            run.push(c);
            self.bump();
        }
        run
    }

    fn hex_run(&mut self) -> Result<(u16, usize), LexError> {
        let run = self.take_while(|c| c.is_ascii_hexdigit());
        if run.is_empty() {
            return Err(LexError::MissingHexDigits);
        }
        let value =
            u16::from_str_radix(&run, 16).map_err(|_| LexError::NumberOutOfRange(run.clone()))?;
        Ok((value, run.len()))
    }

    fn dec_run(&mut self) -> Result<u16, LexError> {
        let run = self.take_while(|c| c.is_ascii_digit());
        run.parse::<u16>()
            .map_err(|_| LexError::NumberOutOfRange(run.clone()))
    }

    fn lex(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.peek() {
            match c {
                ';' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '\n' => {
                    self.tokens.push(Token::Newline);
                    self.bump();
                }
                ' ' | '\t' | '\r' => self.bump(),
                '*' => {
                    self.tokens.push(Token::Asterisk);
                    self.bump();
                }
                '=' => {
                    self.tokens.push(Token::Equal);
                    self.bump();
                }
                ',' => {
                    self.tokens.push(Token::Comma);
                    self.bump();
                }
                '(' => {
                    self.tokens.push(Token::LParen);
                    self.bump();
                }
                ')' => {
                    self.tokens.push(Token::RParen);
                    self.bump();
                }
                '#' => {
                    self.bump();
                    match self.peek() {
                        Some('$') => {
                            self.bump();
                            let (value, _) = self.hex_run()?;
                            self.tokens.push(Token::ImmHex(value));
                        }
                        Some(c) if c.is_ascii_digit() => {
                            let value = self.dec_run()?;
                            self.tokens.push(Token::ImmDec(value));
                        }
                        _ => return Err(LexError::InvalidImmediate),
                    }
                }
                '$' => {
                    self.bump();
                    let (value, digits) = self.hex_run()?;
                    self.tokens.push(Token::AddrHex { value, digits });
                }
                '"' => {
                    self.bump();
                    loop {
                        match self.peek() {
                            None | Some('\n') => return Err(LexError::UnterminatedString),
                            Some('"') => {
                                self.bump();
                                break;
                            }
                            Some(ch) => {
                                self.tokens.push(Token::ImmDec((ch as u32 & 0xFF) as u16));
                                self.tokens.push(Token::Comma);
                                self.bump();
                            }
                        }
                    }
                }
                '\'' => {
                    self.bump();
                    let ch = match self.peek() {
                        None | Some('\n') => return Err(LexError::UnterminatedChar),
                        Some(ch) => ch,
                    };
                    self.bump();
                    if self.peek() != Some('\'') {
                        return Err(LexError::UnterminatedChar);
                    }
                    self.bump();
                    self.tokens.push(Token::ImmDec((ch as u32 & 0xFF) as u16));
                }
                '.' => {
                    self.bump();
                    let run = self.take_while(|c| c.is_ascii_alphabetic());
                    if run.is_empty() {
                        return Err(LexError::UnrecognizedChar('.'));
                    }
                    match run.to_uppercase().as_str() {
                        "BYTE" => self.tokens.push(Token::Directive(Directive::Byte)),
                        "WORD" => self.tokens.push(Token::Directive(Directive::Word)),
                        other => return Err(LexError::UnknownDirective(other.to_string())),
                    }
                }
                c if c.is_ascii_alphabetic() => {
                    let run = self
                        .take_while(|c| c.is_ascii_alphanumeric() || c == '_')
                        .to_uppercase();
                    if self.peek() == Some(':') {
                        self.bump();
                        self.tokens.push(Token::LabelDecl(run));
                    } else if let Ok(mnemonic) = run.parse::<Mnemonic>() {
                        self.tokens.push(Token::Mnemonic(mnemonic));
                    } else if run.len() == 1 {
                        match run.as_str() {
                            "A" => self.tokens.push(Token::Register(Register::A)),
                            "X" => self.tokens.push(Token::Register(Register::X)),
                            "Y" => self.tokens.push(Token::Register(Register::Y)),
                            _ => self.tokens.push(Token::LabelRef(run)),
                        }
                    } else {
                        self.tokens.push(Token::LabelRef(run));
                    }
                }
                c if c.is_ascii_digit() => {
                    let value = self.dec_run()?;
                    self.tokens.push(Token::ImmDec(value));
                }
                other => return Err(LexError::UnrecognizedChar(other)),
            }
        }
        Ok(self.tokens)
    }
}

/// Turn source text into a token stream, failing on the first
/// unrecognized lexeme.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer {
        chars: source.chars().collect(),
        pos: 0,
        tokens: Vec::new(),
    }
    .lex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::mnemonic::Mnemonic::*;

    #[test]
    fn mnemonic_and_immediate() {
        let tokens = tokenize("lda #$0A\n").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Mnemonic(LDA), Token::ImmHex(0x0A), Token::Newline]
        );
    }

    #[test]
    fn address_literals_keep_digit_count() {
        let tokens = tokenize("LDA $05\nLDA $0005\n").unwrap();
        assert_eq!(tokens[1], Token::AddrHex { value: 5, digits: 2 });
        assert_eq!(tokens[4], Token::AddrHex { value: 5, digits: 4 });
    }

    #[test]
    fn labels_and_declarations() {
        let tokens = tokenize("LOOP:\nBNE LOOP\n").unwrap();
        assert_eq!(tokens[0], Token::LabelDecl("LOOP".into()));
        assert_eq!(tokens[3], Token::LabelRef("LOOP".into()));
    }

    #[test]
    fn registers_after_comma() {
        let tokens = tokenize("STA $10,X\n").unwrap();
        assert_eq!(tokens[2], Token::Comma);
        assert_eq!(tokens[3], Token::Register(Register::X));
    }

    #[test]
    fn string_expands_to_byte_comma_pairs() {
        let tokens = tokenize(".BYTE \"AB\"\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Directive(Directive::Byte),
                Token::ImmDec(0x41),
                Token::Comma,
                Token::ImmDec(0x42),
                Token::Comma,
                Token::Newline,
            ]
        );
    }

    #[test]
    fn char_literal_is_one_byte() {
        let tokens = tokenize("LDA #$00\nCMP 'Z'\n").unwrap();
        assert!(tokens.contains(&Token::ImmDec(0x5A)));
    }

    #[test]
    fn comments_are_discarded() {
        let tokens = tokenize("NOP ; does nothing\n").unwrap();
        assert_eq!(tokens, vec![Token::Mnemonic(NOP), Token::Newline]);
    }

    #[test]
    fn origin_and_constant_tokens() {
        let tokens = tokenize("* = $0200\nFOO = $12\n").unwrap();
        assert_eq!(tokens[0], Token::Asterisk);
        assert_eq!(tokens[1], Token::Equal);
        assert_eq!(tokens[4], Token::LabelRef("FOO".into()));
    }

    #[test]
    fn bad_directive_is_fatal() {
        assert_eq!(
            tokenize(".ORG $0200\n"),
            Err(LexError::UnknownDirective("ORG".into()))
        );
    }

    #[test]
    fn stray_character_is_fatal() {
        assert_eq!(tokenize("LDA @\n"), Err(LexError::UnrecognizedChar('@')));
    }
}
