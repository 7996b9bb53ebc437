use serde_json::Value;

use crate::simulation::StateSnapshot;

/// Roots a condition path may start from, with the shape each one allows.
/// Anything outside this list is rejected at parse time, which happens once
/// at content load; runtime evaluation only ever sees validated ASTs.
const KNOWN_ROOTS: &[&str] = &[
    "attributes",
    "flags",
    "world",
    "inventory",
    "special_items",
    "karma",
    "gunas",
    "dharmic",
    "archetype",
    "gana",
    "progression",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(i64),
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatePath {
    pub segments: Vec<String>,
}

impl StatePath {
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

/// A gating predicate over a read-only state snapshot. Parsed once from the
/// catalog's condition string; evaluation never mutates state.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        path: StatePath,
        op: CompareOp,
        value: Literal,
    },
    Contains {
        path: StatePath,
        item: String,
    },
    Truthy(StatePath),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

#[derive(Debug)]
pub struct ConditionParseError {
    pub condition: String,
    pub message: String,
}

impl std::fmt::Display for ConditionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid condition `{}`: {}", self.condition, self.message)
    }
}

impl std::error::Error for ConditionParseError {}

#[derive(Debug)]
pub struct ConditionEvalError {
    pub detail: String,
}

impl std::fmt::Display for ConditionEvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail)
    }
}

impl std::error::Error for ConditionEvalError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Op(CompareOp),
    Word(String),
    Text(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(ch) => text.push(ch),
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::Text(text));
            }
            '=' | '!' | '<' | '>' => {
                let mut op = String::new();
                op.push(c);
                chars.next();
                if chars.peek() == Some(&'=') {
                    op.push('=');
                    chars.next();
                }
                let parsed = match op.as_str() {
                    "==" => CompareOp::Eq,
                    "!=" => CompareOp::Ne,
                    ">=" => CompareOp::Ge,
                    "<=" => CompareOp::Le,
                    ">" => CompareOp::Gt,
                    "<" => CompareOp::Lt,
                    _ => return Err(format!("unknown operator {}", op)),
                };
                tokens.push(Token::Op(parsed));
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if matches!(ch, ' ' | '\t' | '(' | ')' | '=' | '!' | '<' | '>' | '"') {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(word)) if word.eq_ignore_ascii_case(keyword))
    }

    fn parse_or(&mut self) -> Result<Condition, String> {
        let mut terms = vec![self.parse_and()?];
        while self.peek_keyword("or") {
            self.advance();
            terms.push(self.parse_and()?);
        }
        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(Condition::Any(terms))
        }
    }

    fn parse_and(&mut self) -> Result<Condition, String> {
        let mut terms = vec![self.parse_unary()?];
        while self.peek_keyword("and") {
            self.advance();
            terms.push(self.parse_unary()?);
        }
        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(Condition::All(terms))
        }
    }

    fn parse_unary(&mut self) -> Result<Condition, String> {
        if self.peek_keyword("not") {
            self.advance();
            return Ok(Condition::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Condition, String> {
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(Token::Word(word)) => self.parse_predicate(&word),
            Some(Token::Text(_)) => Err("expected a path, found a string literal".to_string()),
            Some(Token::Op(op)) => Err(format!("unexpected operator {}", op.as_str())),
            Some(Token::RParen) => Err("unexpected closing parenthesis".to_string()),
            None => Err("unexpected end of condition".to_string()),
        }
    }

    fn parse_predicate(&mut self, word: &str) -> Result<Condition, String> {
        let path = parse_path(word)?;
        match self.peek() {
            Some(Token::Op(op)) => {
                let op = *op;
                self.advance();
                let value = match self.advance() {
                    Some(Token::Word(word)) => literal_from_word(&word),
                    Some(Token::Text(text)) => Literal::Text(text),
                    _ => return Err(format!("operator {} is missing a value", op.as_str())),
                };
                Ok(Condition::Compare { path, op, value })
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("contains") => {
                self.advance();
                let item = match self.advance() {
                    Some(Token::Text(text)) => text,
                    Some(Token::Word(word)) => word,
                    _ => return Err("contains is missing an item".to_string()),
                };
                Ok(Condition::Contains { path, item })
            }
            _ => Ok(Condition::Truthy(path)),
        }
    }
}

fn literal_from_word(word: &str) -> Literal {
    if word.eq_ignore_ascii_case("true") {
        return Literal::Bool(true);
    }
    if word.eq_ignore_ascii_case("false") {
        return Literal::Bool(false);
    }
    match word.parse::<i64>() {
        Ok(number) => Literal::Number(number),
        Err(_) => Literal::Text(word.to_string()),
    }
}

fn parse_path(word: &str) -> Result<StatePath, String> {
    let segments: Vec<String> = word.split('.').map(str::to_string).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(format!("malformed path {}", word));
    }
    let root = segments[0].as_str();
    if !KNOWN_ROOTS.contains(&root) {
        return Err(format!("unknown path root {}", root));
    }
    let arity_ok = match root {
        "attributes" => segments.len() == 2,
        "flags" | "world" => segments.len() >= 2,
        "inventory" | "special_items" | "karma" | "archetype" | "gana" => segments.len() == 1,
        "gunas" => {
            segments.len() == 2 && matches!(segments[1].as_str(), "sattva" | "rajas" | "tamas")
        }
        "dharmic" => {
            segments.len() == 2
                && matches!(segments[1].as_str(), "dharma" | "artha" | "kama" | "moksha")
        }
        "progression" => {
            segments.len() == 2
                && matches!(
                    segments[1].as_str(),
                    "choices_made" | "puzzles_solved" | "quests_completed"
                )
        }
        _ => false,
    };
    if !arity_ok {
        return Err(format!("path {} has the wrong shape", word));
    }
    Ok(StatePath { segments })
}

impl Condition {
    pub fn parse(input: &str) -> Result<Condition, ConditionParseError> {
        let parse_err = |message: String| ConditionParseError {
            condition: input.to_string(),
            message,
        };
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(parse_err("empty condition".to_string()));
        }
        let tokens = tokenize(trimmed).map_err(parse_err)?;
        let mut parser = Parser { tokens, pos: 0 };
        let condition = parser.parse_or().map_err(parse_err)?;
        if parser.pos != parser.tokens.len() {
            return Err(parse_err("unexpected trailing tokens".to_string()));
        }
        Ok(condition)
    }

    /// Evaluates against a snapshot. An undefined path or a type mismatch is
    /// an error for the caller to log and fail closed on, never a panic.
    pub fn evaluate(&self, snapshot: &StateSnapshot) -> Result<bool, ConditionEvalError> {
        match self {
            Condition::Compare { path, op, value } => {
                let actual = resolve_path(snapshot, path).ok_or_else(|| ConditionEvalError {
                    detail: format!("undefined path {}", path.dotted()),
                })?;
                compare_values(&actual, *op, value).ok_or_else(|| ConditionEvalError {
                    detail: format!(
                        "cannot compare {} {} given value",
                        path.dotted(),
                        op.as_str()
                    ),
                })
            }
            Condition::Contains { path, item } => {
                let actual = resolve_path(snapshot, path).ok_or_else(|| ConditionEvalError {
                    detail: format!("undefined path {}", path.dotted()),
                })?;
                match actual {
                    Value::Array(entries) => Ok(entries
                        .iter()
                        .any(|entry| entry.as_str() == Some(item.as_str()))),
                    _ => Err(ConditionEvalError {
                        detail: format!("{} is not a list", path.dotted()),
                    }),
                }
            }
            Condition::Truthy(path) => {
                let actual = resolve_path(snapshot, path).ok_or_else(|| ConditionEvalError {
                    detail: format!("undefined path {}", path.dotted()),
                })?;
                Ok(truthy(&actual))
            }
            Condition::Not(inner) => Ok(!inner.evaluate(snapshot)?),
            Condition::All(terms) => {
                for term in terms {
                    if !term.evaluate(snapshot)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any(terms) => {
                for term in terms {
                    if term.evaluate(snapshot)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn resolve_path(snapshot: &StateSnapshot, path: &StatePath) -> Option<Value> {
    let segments = &path.segments;
    match segments[0].as_str() {
        // Attributes default to 0: absent means never granted, not undefined.
        "attributes" => Some(Value::from(snapshot.player.attribute(&segments[1]))),
        "flags" => {
            let value = snapshot.player.flags.get(&segments[1])?;
            walk_value(value, &segments[2..])
        }
        "world" => {
            let value = snapshot.world.get(&segments[1])?;
            walk_value(value, &segments[2..])
        }
        "inventory" => Some(Value::Array(
            snapshot
                .player
                .inventory
                .iter()
                .map(|item| Value::from(item.as_str()))
                .collect(),
        )),
        "special_items" => {
            let mut ids: Vec<&str> = snapshot
                .player
                .special_items
                .keys()
                .map(String::as_str)
                .collect();
            ids.sort_unstable();
            Some(Value::Array(ids.into_iter().map(Value::from).collect()))
        }
        "karma" => Some(Value::from(snapshot.player.karma)),
        "gunas" => {
            let gunas = &snapshot.profile.gunas;
            let value = match segments[1].as_str() {
                "sattva" => gunas.sattva,
                "rajas" => gunas.rajas,
                "tamas" => gunas.tamas,
                _ => return None,
            };
            Some(Value::from(value))
        }
        "dharmic" => {
            let dharmic = &snapshot.player.dharmic;
            let value = match segments[1].as_str() {
                "dharma" => dharmic.dharma,
                "artha" => dharmic.artha,
                "kama" => dharmic.kama,
                "moksha" => dharmic.moksha,
                _ => return None,
            };
            Some(Value::from(value))
        }
        "archetype" => snapshot
            .profile
            .archetype
            .as_ref()
            .map(|id| Value::from(id.as_str())),
        "gana" => snapshot
            .profile
            .gana
            .map(|gana| Value::from(gana.as_str())),
        "progression" => {
            let progression = &snapshot.player.progression;
            let value = match segments[1].as_str() {
                "choices_made" => progression.choices_made,
                "puzzles_solved" => progression.puzzles_solved,
                "quests_completed" => progression.quests_completed,
                _ => return None,
            };
            Some(Value::from(value))
        }
        _ => None,
    }
}

fn walk_value(value: &Value, rest: &[String]) -> Option<Value> {
    let mut current = value;
    for segment in rest {
        current = current.get(segment)?;
    }
    Some(current.clone())
}

fn compare_values(actual: &Value, op: CompareOp, expected: &Literal) -> Option<bool> {
    match expected {
        Literal::Number(number) => {
            let left = actual.as_f64()?;
            let right = *number as f64;
            Some(match op {
                CompareOp::Eq => left == right,
                CompareOp::Ne => left != right,
                CompareOp::Ge => left >= right,
                CompareOp::Le => left <= right,
                CompareOp::Gt => left > right,
                CompareOp::Lt => left < right,
            })
        }
        Literal::Bool(expected) => {
            let left = actual.as_bool()?;
            match op {
                CompareOp::Eq => Some(left == *expected),
                CompareOp::Ne => Some(left != *expected),
                _ => None,
            }
        }
        Literal::Text(expected) => {
            let left = actual.as_str()?;
            match op {
                CompareOp::Eq => Some(left == expected),
                CompareOp::Ne => Some(left != expected),
                _ => None,
            }
        }
    }
}

/// Truthiness used for flag gates: null is false, numbers are true when
/// nonzero, strings and containers when non-empty.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(entries) => !entries.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{PlayerProfile, PlayerState, StateSnapshot, WorldFacts};
    use serde_json::json;

    fn snapshot() -> StateSnapshot {
        let mut player = PlayerState::default();
        player.apply_attribute_delta("wisdom", 3);
        player.add_inventory_item("Pearl Earring");
        player.set_flag("met_boatman", json!(true));
        player.karma = 2;
        let mut world = WorldFacts::default();
        world.set("curse_broken", json!(false));
        StateSnapshot {
            profile: PlayerProfile::default(),
            player,
            world,
        }
    }

    #[test]
    fn parses_and_evaluates_comparison() {
        let condition = Condition::parse("attributes.wisdom >= 3").unwrap();
        assert!(condition.evaluate(&snapshot()).unwrap());
        let condition = Condition::parse("attributes.wisdom > 3").unwrap();
        assert!(!condition.evaluate(&snapshot()).unwrap());
    }

    #[test]
    fn missing_attribute_defaults_to_zero() {
        let condition = Condition::parse("attributes.valor >= 1").unwrap();
        assert!(!condition.evaluate(&snapshot()).unwrap());
        let condition = Condition::parse("attributes.valor == 0").unwrap();
        assert!(condition.evaluate(&snapshot()).unwrap());
    }

    #[test]
    fn membership_matches_quoted_items() {
        let condition = Condition::parse("inventory contains \"Pearl Earring\"").unwrap();
        assert!(condition.evaluate(&snapshot()).unwrap());
        let condition = Condition::parse("inventory contains \"Conch Shell\"").unwrap();
        assert!(!condition.evaluate(&snapshot()).unwrap());
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let condition =
            Condition::parse("karma >= 10 or attributes.wisdom >= 1 and flags.met_boatman")
                .unwrap();
        assert!(condition.evaluate(&snapshot()).unwrap());
        match condition {
            Condition::Any(terms) => assert_eq!(terms.len(), 2),
            other => panic!("expected Any, got {:?}", other),
        }
    }

    #[test]
    fn not_and_parentheses() {
        let condition = Condition::parse("not (world.curse_broken == true)").unwrap();
        assert!(condition.evaluate(&snapshot()).unwrap());
    }

    #[test]
    fn unknown_root_is_a_parse_error() {
        assert!(Condition::parse("player.wisdom >= 1").is_err());
        assert!(Condition::parse("gunas.vigor >= 1").is_err());
    }

    #[test]
    fn undefined_flag_path_fails_at_evaluation() {
        let condition = Condition::parse("flags.unseen == true").unwrap();
        assert!(condition.evaluate(&snapshot()).is_err());
    }

    #[test]
    fn type_mismatch_is_an_evaluation_error() {
        let condition = Condition::parse("flags.met_boatman >= 2").unwrap();
        assert!(condition.evaluate(&snapshot()).is_err());
    }

    #[test]
    fn evaluation_does_not_mutate_the_snapshot() {
        let before = snapshot();
        let condition = Condition::parse("attributes.wisdom >= 1 and karma >= 1").unwrap();
        let after = snapshot();
        condition.evaluate(&before).unwrap();
        assert_eq!(before.player, after.player);
        assert_eq!(before.world, after.world);
    }
}
