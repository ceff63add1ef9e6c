use crate::expr::ast::{Expr, ParseError, Token};

/// Deepest nesting of parentheses, calls and prefix operators accepted
pub const MAX_DEPTH: usize = 100;

/// Parse a complete assignment expression, rejecting trailing input.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(source, tokenize(source));
    let expr = parser.parse_expr_result()?;
    if parser.pos < parser.tokens.len() {
        return Err(ParseError {
            source: source.to_string(),
            pos: parser.pos,
            found: parser.peek().cloned(),
            expected: vec!["<end>".to_string()],
        });
    }
    Ok(expr)
}

// Tokenizer + recursive-descent parser
pub fn tokenize(s: &str) -> Vec<Token> {
    let mut toks = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c.is_ascii_digit() || c == '.' {
            let mut num = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit()
                    || d == '.'
                    || d == 'e'
                    || d == 'E'
                    || ((d == '+' || d == '-') && (num.ends_with('e') || num.ends_with('E')))
                {
                    num.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            match num.parse::<f64>() {
                Ok(v) => toks.push(Token::Num(v)),
                Err(_) => toks.push(Token::BadNumber(num)),
            }
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let mut id = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' {
                    id.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            if id.eq_ignore_ascii_case("true") {
                toks.push(Token::Bool(true));
            } else if id.eq_ignore_ascii_case("false") {
                toks.push(Token::Bool(false));
            } else {
                toks.push(Token::Ident(id));
            }
            continue;
        }
        chars.next();
        match c {
            '(' => toks.push(Token::LParen),
            ')' => toks.push(Token::RParen),
            ',' => toks.push(Token::Comma),
            '?' => toks.push(Token::Question),
            ':' => toks.push(Token::Colon),
            '+' | '-' | '*' | '/' | '^' => toks.push(Token::Op(c)),
            '<' => {
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    toks.push(Token::Le);
                } else {
                    toks.push(Token::Lt);
                }
            }
            '>' => {
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    toks.push(Token::Ge);
                } else {
                    toks.push(Token::Gt);
                }
            }
            '=' => {
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    toks.push(Token::EqEq);
                } else {
                    toks.push(Token::Unknown('='));
                }
            }
            '!' => {
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    toks.push(Token::Ne);
                } else {
                    toks.push(Token::Bang);
                }
            }
            '&' => {
                if let Some(&'&') = chars.peek() {
                    chars.next();
                    toks.push(Token::And);
                } else {
                    toks.push(Token::Unknown('&'));
                }
            }
            '|' => {
                if let Some(&'|') = chars.peek() {
                    chars.next();
                    toks.push(Token::Or);
                } else {
                    toks.push(Token::Unknown('|'));
                }
            }
            other => toks.push(Token::Unknown(other)),
        }
    }
    toks
}

pub struct Parser {
    source: String,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    expected: Vec<String>,
}

impl Parser {
    pub fn new(source: &str, tokens: Vec<Token>) -> Self {
        Self {
            source: source.to_string(),
            tokens,
            pos: 0,
            depth: 0,
            expected: Vec::new(),
        }
    }

    fn expected_push(&mut self, s: &str) {
        if !self.expected.iter().any(|e| e == s) {
            self.expected.push(s.to_string());
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let r = self.tokens.get(self.pos);
        if r.is_some() {
            self.pos += 1;
        }
        r
    }

    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.nested(Self::parse_ternary)
    }

    fn nested(&mut self, rule: fn(&mut Self) -> Option<Expr>) -> Option<Expr> {
        if self.depth >= MAX_DEPTH {
            self.expected_push(&format!("at most {} nested levels", MAX_DEPTH));
            return None;
        }
        self.depth += 1;
        let node = rule(self);
        self.depth -= 1;
        node
    }

    pub fn parse_expr_result(&mut self) -> Result<Expr, ParseError> {
        if let Some(expr) = self.parse_expr() {
            Ok(expr)
        } else {
            Err(ParseError {
                source: self.source.clone(),
                pos: self.pos,
                found: self.peek().cloned(),
                expected: self.expected.clone(),
            })
        }
    }

    fn parse_ternary(&mut self) -> Option<Expr> {
        let cond = self.parse_or()?;
        if let Some(Token::Question) = self.peek() {
            self.next();
            let then_branch = self.parse_expr()?;
            if let Some(Token::Colon) = self.peek() {
                self.next();
                let else_branch = self.parse_expr()?;
                return Some(Expr::Ternary {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                });
            }
            self.expected_push(":");
            return None;
        }
        Some(cond)
    }

    fn binary(lhs: Expr, op: &str, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs),
            op: op.to_string(),
            rhs: Box::new(rhs),
        }
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut node = self.parse_and()?;
        while let Some(Token::Or) = self.peek() {
            self.next();
            let rhs = self.parse_and()?;
            node = Self::binary(node, "||", rhs);
        }
        Some(node)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut node = self.parse_eq()?;
        while let Some(Token::And) = self.peek() {
            self.next();
            let rhs = self.parse_eq()?;
            node = Self::binary(node, "&&", rhs);
        }
        Some(node)
    }

    fn parse_eq(&mut self) -> Option<Expr> {
        let mut node = self.parse_cmp()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => "==",
                Some(Token::Ne) => "!=",
                _ => break,
            };
            self.next();
            let rhs = self.parse_cmp()?;
            node = Self::binary(node, op, rhs);
        }
        Some(node)
    }

    fn parse_cmp(&mut self) -> Option<Expr> {
        let mut node = self.parse_add_sub()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => "<",
                Some(Token::Gt) => ">",
                Some(Token::Le) => "<=",
                Some(Token::Ge) => ">=",
                _ => break,
            };
            self.next();
            let rhs = self.parse_add_sub()?;
            node = Self::binary(node, op, rhs);
        }
        Some(node)
    }

    fn parse_add_sub(&mut self) -> Option<Expr> {
        let mut node = self.parse_mul_div()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('+')) => "+",
                Some(Token::Op('-')) => "-",
                _ => break,
            };
            self.next();
            let rhs = self.parse_mul_div()?;
            node = Self::binary(node, op, rhs);
        }
        Some(node)
    }

    fn parse_mul_div(&mut self) -> Option<Expr> {
        let mut node = self.parse_power()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op('*')) => "*",
                Some(Token::Op('/')) => "/",
                _ => break,
            };
            self.next();
            let rhs = self.parse_power()?;
            node = Self::binary(node, op, rhs);
        }
        Some(node)
    }

    // right-associative
    fn parse_power(&mut self) -> Option<Expr> {
        let node = self.parse_unary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.next();
            let rhs = self.nested(Self::parse_power)?;
            return Some(Self::binary(node, "^", rhs));
        }
        Some(node)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek() {
            Some(Token::Op('-')) => "-",
            Some(Token::Op('+')) => "+",
            Some(Token::Bang) => "!",
            _ => return self.parse_primary(),
        };
        self.next();
        let rhs = self.nested(Self::parse_unary)?;
        Some(Expr::UnaryOp {
            op: op.to_string(),
            rhs: Box::new(rhs),
        })
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let tok = match self.next().cloned() {
            Some(tok) => tok,
            None => {
                self.expected_push("number|identifier|'('");
                return None;
            }
        };
        match tok {
            Token::Num(v) => Some(Expr::Number(v)),
            Token::Bool(b) => Some(Expr::Bool(b)),
            Token::Ident(id) => {
                if let Some(Token::LParen) = self.peek() {
                    self.next();
                    let args = self.parse_call_args()?;
                    Some(Expr::Call { name: id, args })
                } else {
                    Some(Expr::Ident(id))
                }
            }
            Token::LParen => {
                let expr = self.parse_expr()?;
                if let Some(Token::RParen) = self.peek() {
                    self.next();
                    Some(expr)
                } else {
                    self.expected_push(")");
                    None
                }
            }
            _ => {
                // point the error at the offending token
                self.pos -= 1;
                self.expected_push("number|identifier|'('");
                None
            }
        }
    }

    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.next();
            return Some(args);
        }
        loop {
            match self.parse_expr() {
                Some(expr) => args.push(expr),
                None => {
                    self.expected_push("expression");
                    return None;
                }
            }
            match self.peek() {
                Some(Token::Comma) => {
                    self.next();
                }
                Some(Token::RParen) => {
                    self.next();
                    return Some(args);
                }
                _ => {
                    self.expected_push(",|)");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Expr {
        Expr::Ident(s.to_string())
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse("a + b * c").unwrap();
        assert_eq!(
            expr,
            Parser::binary(ident("a"), "+", Parser::binary(ident("b"), "*", ident("c")))
        );
    }

    #[test]
    fn test_parse_power_binds_tighter_than_mul() {
        let expr = parse("k * A ^ 2").unwrap();
        assert_eq!(
            expr,
            Parser::binary(
                ident("k"),
                "*",
                Parser::binary(ident("A"), "^", Expr::Number(2.0))
            )
        );
    }

    #[test]
    fn test_parse_call_and_scientific_number() {
        let expr = parse("delay(A, 1.5e-1)").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                name: "delay".to_string(),
                args: vec![ident("A"), Expr::Number(0.15)],
            }
        );
    }

    #[test]
    fn test_parse_ternary() {
        let expr = parse("t > TLAG ? ka * Ad : 0").unwrap();
        assert!(matches!(expr, Expr::Ternary { .. }));
    }

    #[test]
    fn test_reject_trailing_tokens() {
        let err = parse("a b").unwrap_err();
        assert_eq!(err.pos, 1);
        assert_eq!(err.found, Some(Token::Ident("b".to_string())));
    }

    #[test]
    fn test_reject_unknown_character() {
        let err = parse("CL $ V").unwrap_err();
        assert_eq!(err.found, Some(Token::Unknown('$')));
    }

    #[test]
    fn test_reject_unbalanced_parens() {
        let err = parse("(CL / V").unwrap_err();
        assert!(err.expected.contains(&")".to_string()));
    }

    #[test]
    fn test_reject_malformed_number() {
        let err = parse("k * 1.2.3").unwrap_err();
        assert_eq!(err.found, Some(Token::BadNumber("1.2.3".to_string())));
        assert!(err.to_string().contains("1.2.3"));
    }

    #[test]
    fn test_nesting_within_limit() {
        let src = format!("{}A{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(parse(&src).unwrap(), ident("A"));
    }

    #[test]
    fn test_reject_deep_nesting() {
        let limit = format!("at most {} nested levels", MAX_DEPTH);

        let parens = format!("{}A{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse(&parens).unwrap_err();
        assert!(err.expected.contains(&limit));

        let negations = format!("{}A", "-".repeat(10_000));
        let err = parse(&negations).unwrap_err();
        assert!(err.expected.contains(&limit));

        let powers = vec!["A"; 10_000].join("^");
        let err = parse(&powers).unwrap_err();
        assert!(err.expected.contains(&limit));
    }

    #[test]
    fn test_reject_empty() {
        assert!(parse("   ").is_err());
    }
}
