//! Lexer over the hotkey config DSL.
//!
//! Context-sensitive in exactly one way: after emitting a [`Colon`]
//! token, the next token is the raw remainder of the line (the shell
//! command), with no escape processing.
//!
//! [`Colon`]: TokenKind::Colon

use std::str::FromStr;

use hkkeys::LiteralKey;

use crate::token::{Token, TokenKind};

/// The `define_modifier` statement keyword.
const DEFINE_MODIFIER: &str = "define_modifier";

pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    row: usize,
    col: usize,
    next_is_command: bool,
    peeked: Option<Token>,
}

impl Lexer {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            position: 0,
            row: 0,
            col: 0,
            next_is_command: false,
            peeked: None,
        }
    }

    /// Peek the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            let token = self.read_token();
            self.peeked = Some(token);
        }
        // The cache was just filled.
        self.peeked.as_ref().unwrap()
    }

    /// Get the next token and consume it.
    pub fn next(&mut self) -> Token {
        match self.peeked.take() {
            Some(token) => token,
            None => self.read_token(),
        }
    }

    fn read_token(&mut self) -> Token {
        // The command context must win before any whitespace handling:
        // the command is the remainder of the *current* line.
        if self.next_is_command {
            self.next_is_command = false;
            return self.read_command();
        }

        self.skip_whitespace_and_comments();

        let Some(c) = self.peek_char() else {
            return Token::new(TokenKind::EndOfFile, "", self.row, self.col);
        };

        let start_row = self.row;
        let start_col = self.col;

        let single = match c {
            '+' => Some(TokenKind::Plus),
            '=' => Some(TokenKind::Equals),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            '{' => Some(TokenKind::OpenBrace),
            '}' => Some(TokenKind::CloseBrace),
            '@' => Some(TokenKind::At),
            '^' => Some(TokenKind::Caret),
            '&' => Some(TokenKind::Ampersand),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            if kind == TokenKind::Colon {
                self.next_is_command = true;
            }
            return Token::new(kind, c, start_row, start_col);
        }

        let text = self.read_identifier();
        if text.is_empty() {
            // Unknown character: emit it as a one-character key token
            // and let the parser reject it.
            self.advance();
            return Token::new(TokenKind::Key, c, start_row, start_col);
        }

        if let Some(digits) = text.strip_prefix("0x") {
            if !digits.is_empty() && digits.chars().all(|d| d.is_ascii_hexdigit()) {
                return Token::new(TokenKind::KeyHex, digits, start_row, start_col);
            }
        }

        let kind = if text == DEFINE_MODIFIER {
            TokenKind::DefineModifier
        } else if LiteralKey::from_str(&text).is_ok() {
            TokenKind::Literal
        } else if text.chars().count() == 1 {
            TokenKind::Key
        } else {
            TokenKind::Modifier
        };

        Token::new(kind, text, start_row, start_col)
    }

    /// Read the rest of the line as a single command token, consuming
    /// the trailing newline.
    ///
    /// A colon at the end of a line yields an empty command; a colon at
    /// the end of the file yields [`TokenKind::EndOfFile`] so the parser
    /// can report the missing command.
    fn read_command(&mut self) -> Token {
        while matches!(self.peek_char(), Some(' ' | '\t')) {
            self.advance();
        }

        let start_row = self.row;
        let start_col = self.col;

        if self.peek_char().is_none() {
            return Token::new(TokenKind::EndOfFile, "", start_row, start_col);
        }

        let mut line = String::new();

        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            line.push(c);
            self.advance();
        }
        if self.peek_char() == Some('\n') {
            self.advance_newline();
        }

        Token::new(TokenKind::Command, line, start_row, start_col)
    }

    fn read_identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.skip_whitespace();
            if self.peek_char() == Some('#') {
                self.eat_comment();
            } else {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            match c {
                ' ' | '\t' | '\r' => self.advance(),
                '\n' => self.advance_newline(),
                _ => break,
            }
        }
    }

    fn eat_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                self.advance_newline();
                return;
            }
            self.advance();
        }
    }

    fn advance(&mut self) {
        if self.position < self.chars.len() {
            self.position += 1;
            self.col += 1;
        }
    }

    fn advance_newline(&mut self) {
        self.position += 1;
        self.row += 1;
        self.col = 0;
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next();
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn single_chord_hotkey() {
        let tokens = lex_all("cmd + q : echo bye\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Modifier,
                TokenKind::Plus,
                TokenKind::Key,
                TokenKind::Colon,
                TokenKind::Command,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[4].text, "echo bye");
    }

    #[test]
    fn positions_are_tracked() {
        let tokens = lex_all("ctrl + a : one\nalt + b : two\n");
        assert_eq!((tokens[0].row, tokens[0].col), (0, 0));
        assert_eq!((tokens[1].row, tokens[1].col), (0, 5));
        assert_eq!((tokens[2].row, tokens[2].col), (0, 7));
        assert_eq!((tokens[3].row, tokens[3].col), (0, 9));
        assert_eq!((tokens[4].row, tokens[4].col), (0, 11));
        // Second statement starts on row 1.
        assert_eq!((tokens[5].row, tokens[5].col), (1, 0));
        assert_eq!(tokens[5].text, "alt");
    }

    #[test]
    fn command_is_raw_remainder_of_line() {
        let tokens = lex_all("cmd + x :   osascript -e 'tell app \"X\"' # not a comment\n");
        let command = &tokens[4];
        assert_eq!(command.kind, TokenKind::Command);
        assert_eq!(command.text, "osascript -e 'tell app \"X\"' # not a comment");
    }

    #[test]
    fn empty_command_at_end_of_line() {
        let tokens = lex_all("cmd + x :\ncmd + y : next\n");
        assert_eq!(tokens[4].kind, TokenKind::Command);
        assert_eq!(tokens[4].text, "");
        // The next statement lexes normally.
        assert_eq!(tokens[5].kind, TokenKind::Modifier);
        assert_eq!(tokens[5].row, 1);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let tokens = lex_all("# header\n\n  # indented\nshift + tab : x\n");
        assert_eq!(tokens[0].kind, TokenKind::Modifier);
        assert_eq!(tokens[0].row, 3);
        assert_eq!(tokens[2].kind, TokenKind::Literal);
        assert_eq!(tokens[2].text, "tab");
    }

    #[test]
    fn brace_expansion_tokens() {
        let tokens = lex_all("ctrl + {1,2,3} : workspace {one,two,three}\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Modifier,
                TokenKind::Plus,
                TokenKind::OpenBrace,
                TokenKind::Key,
                TokenKind::Comma,
                TokenKind::Key,
                TokenKind::Comma,
                TokenKind::Key,
                TokenKind::CloseBrace,
                TokenKind::Colon,
                TokenKind::Command,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(tokens[10].text, "workspace {one,two,three}");
    }

    #[test]
    fn hex_keycodes() {
        let tokens = lex_all("cmd + 0x1f : x\n");
        assert_eq!(tokens[2].kind, TokenKind::KeyHex);
        assert_eq!(tokens[2].text, "1f");
        // `0x` without digits falls back to an identifier.
        let tokens = lex_all("0x = 5\n");
        assert_eq!(tokens[0].kind, TokenKind::Modifier);
        assert_eq!(tokens[0].text, "0x");
    }

    #[test]
    fn flags_and_sequences() {
        let tokens = lex_all("@ ^ & ctrl + x ; ctrl + c : quit\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::At,
                TokenKind::Caret,
                TokenKind::Ampersand,
                TokenKind::Modifier,
                TokenKind::Plus,
                TokenKind::Key,
                TokenKind::Semicolon,
                TokenKind::Modifier,
                TokenKind::Plus,
                TokenKind::Key,
                TokenKind::Colon,
                TokenKind::Command,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn define_modifier_keyword() {
        let tokens = lex_all("define_modifier hyper = cmd + ctrl + alt + shift\n");
        assert_eq!(tokens[0].kind, TokenKind::DefineModifier);
        assert_eq!(tokens[1].kind, TokenKind::Modifier);
        assert_eq!(tokens[1].text, "hyper");
        assert_eq!(tokens[2].kind, TokenKind::Equals);
    }

    #[test]
    fn unknown_character_becomes_key_token() {
        let tokens = lex_all("cmd - h : x\n");
        assert_eq!(tokens[1].kind, TokenKind::Key);
        assert_eq!(tokens[1].text, "-");
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("cmd + q : x\n");
        assert_eq!(lexer.peek().text, "cmd");
        assert_eq!(lexer.peek().text, "cmd");
        assert_eq!(lexer.next().text, "cmd");
        assert_eq!(lexer.next().kind, TokenKind::Plus);
    }

    #[test]
    fn lexing_is_deterministic() {
        let source = "define_modifier hyper = cmd + alt\n@ hyper + return : open -a Terminal\n";
        let first: Vec<_> = lex_all(source)
            .into_iter()
            .map(|t| (t.kind, t.text, t.row, t.col))
            .collect();
        let second: Vec<_> = lex_all(source)
            .into_iter()
            .map(|t| (t.kind, t.text, t.row, t.col))
            .collect();
        assert_eq!(first, second);
    }
}
