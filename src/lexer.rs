pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();
        while !self.is_eof() {
            tokens.push(self.next_token());
        }
        tokens.push(Token::eof());
        tokens
    }

    fn next_token(&mut self) -> Token {
        match self.input[self.position] {
            '\'' => self.single_char(TokenKind::SingleQuote),
            '"' => self.single_char(TokenKind::DoubleQuote),
            '\\' => self.handle_backslash(),
            char if char::is_whitespace(char) => self.handle_run(TokenKind::Whitespace),
            _ => self.handle_run(TokenKind::Word),
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let lexeme = String::from(self.input[self.position]);
        self.position += 1;

        Token { kind, lexeme }
    }

    // A trailing backslash has nothing to escape and is kept as a plain word.
    fn handle_backslash(&mut self) -> Token {
        let Some(&escaped) = self.input.get(self.position + 1) else {
            return self.single_char(TokenKind::Word);
        };
        self.position += 2;

        Token {
            kind: TokenKind::Escape,
            lexeme: String::from(escaped),
        }
    }

    fn handle_run(&mut self, kind: TokenKind) -> Token {
        let mut end_position = self.position;
        while end_position < self.input.len() && classify(self.input[end_position]) == kind {
            end_position += 1;
        }
        let lexeme: String = self.input[self.position..end_position].iter().collect();
        self.position = end_position;

        Token { kind, lexeme }
    }
}

fn classify(char: char) -> TokenKind {
    match char {
        '\'' => TokenKind::SingleQuote,
        '"' => TokenKind::DoubleQuote,
        '\\' => TokenKind::Escape,
        char if char::is_whitespace(char) => TokenKind::Whitespace,
        _ => TokenKind::Word,
    }
}

#[derive(PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
}

impl Token {
    fn eof() -> Self {
        Self {
            kind: TokenKind::EOF,
            lexeme: String::new(),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TokenKind {
    SingleQuote,
    DoubleQuote,
    /// Backslash followed by one character; the lexeme holds only the escaped character.
    Escape,
    Word,
    Whitespace,
    EOF,
}
