use crate::lexer::{Lexer, Token, TokenKind};

/// Words of one input line. Index 0, when present, is the command name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokens {
    words: Vec<String>,
}

impl Tokens {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn command(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn args(&self) -> &[String] {
        self.words.get(1..).unwrap_or_default()
    }
}

impl<S: Into<String>> FromIterator<S> for Tokens {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Splits a raw line into words. Never fails; an unterminated quote runs to the end of the line.
pub fn tokenize(line: &str) -> Tokens {
    Tokenizer::new(Lexer::new(line).lex()).tokenize()
}

struct Tokenizer {
    input: Vec<Token>,
    position: usize,
    quote: Option<TokenKind>,
    word: String,
    // distinguishes `''` (an empty word) from no word at all
    in_word: bool,
    words: Vec<String>,
}

impl Tokenizer {
    fn new(input: Vec<Token>) -> Self {
        Self {
            input,
            position: 0,
            quote: None,
            word: String::new(),
            in_word: false,
            words: Vec::new(),
        }
    }

    fn tokenize(mut self) -> Tokens {
        while self.position < self.input.len() {
            let kind = self.input[self.position].kind;
            match kind {
                TokenKind::SingleQuote | TokenKind::DoubleQuote => self.handle_quote(kind),
                TokenKind::Escape => self.handle_escape(),
                TokenKind::Word => self.handle_word(),
                TokenKind::Whitespace => self.handle_whitespace(),
                TokenKind::EOF => self.flush(),
            }
            self.position += 1;
        }

        Tokens { words: self.words }
    }

    fn current(&self) -> &str {
        &self.input[self.position].lexeme
    }

    fn handle_quote(&mut self, kind: TokenKind) {
        match self.quote {
            None => {
                self.quote = Some(kind);
                self.in_word = true;
            }
            Some(open) if open == kind => self.quote = None,
            Some(_) => self.push_current(),
        }
    }

    fn handle_escape(&mut self) {
        let escaped = self.input[self.position].lexeme.clone();
        let literal = match self.quote {
            None => true,
            Some(TokenKind::DoubleQuote) => escaped == "\"" || escaped == "\\",
            Some(_) => false,
        };
        if !literal {
            self.word.push('\\');
        }
        self.word.push_str(&escaped);
        self.in_word = true;
    }

    fn handle_word(&mut self) {
        self.push_current();
    }

    fn handle_whitespace(&mut self) {
        if self.quote.is_some() {
            self.push_current();
        } else {
            self.flush();
        }
    }

    fn push_current(&mut self) {
        let lexeme = self.current().to_owned();
        self.word.push_str(&lexeme);
        self.in_word = true;
    }

    fn flush(&mut self) {
        if !self.in_word {
            return;
        }

        self.words.push(std::mem::take(&mut self.word));
        self.in_word = false;
    }
}
