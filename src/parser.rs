use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{complete::digit1, is_digit},
    combinator::{map, map_res, verify},
    sequence::preceded,
    IResult,
};

use crate::ast::{Command::*, Segment::*, *};
use crate::error::ParseError;

/// Largest literal an address-load instruction can carry.
pub(crate) const MAX_LITERAL: u16 = 0x7fff;

fn integer(input: &str) -> IResult<&str, u16> {
    verify(map_res(digit1, |c: &str| c.parse()), |n: &u16| {
        *n <= MAX_LITERAL
    })(input)
}

#[test]
fn test_integer() {
    assert_eq!(integer("32767"), Ok(("", 32767)));
    assert!(integer("32768").is_err());
    assert!(integer("-1").is_err());
}

fn segment(input: &str) -> IResult<&str, Segment> {
    map(
        alt((
            tag("constant"),
            tag("local"),
            tag("static"),
            tag("argument"),
            tag("this"),
            tag("that"),
            tag("pointer"),
            tag("temp"),
        )),
        |seg| match seg {
            "constant" => Constant,
            "local" => Local,
            "static" => Static,
            "argument" => Argument,
            "this" => This,
            "that" => That,
            "pointer" => Pointer,
            _ => Temp,
        },
    )(input)
}

fn prim(input: &str) -> IResult<&str, Op> {
    map(
        alt((
            tag("add"),
            tag("sub"),
            tag("neg"),
            tag("eq"),
            tag("gt"),
            tag("lt"),
            tag("and"),
            tag("or"),
            tag("not"),
        )),
        |prim| match prim {
            "add" => Op::Add,
            "sub" => Op::Sub,
            "neg" => Op::Neg,
            "eq" => Op::Eq,
            "gt" => Op::Gt,
            "lt" => Op::Lt,
            "and" => Op::And,
            "or" => Op::Or,
            _ => Op::Not,
        },
    )(input)
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Op::Neg)));
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

#[test]
fn test_symbol() {
    assert_eq!(symbol("Main.fib$LOOP"), Ok(("", "Main.fib$LOOP".to_string())));
    assert!(symbol("1abc").is_err());
}

/// The shape of a generated return-address suffix, `ret.<digits>`.
fn return_suffix(input: &str) -> IResult<&str, &str> {
    preceded(tag("ret."), digit1)(input)
}

#[test]
fn test_return_suffix() {
    assert_eq!(return_suffix("ret.000"), Ok(("", "000")));
    assert!(return_suffix("ret.x").is_err());
    assert!(return_suffix("RET.1").is_err());
}

/// Runs `parser` over a whole token, rejecting partial matches.
fn whole<'a, O>(mut parser: impl FnMut(&'a str) -> IResult<&'a str, O>, token: &'a str) -> Option<O> {
    match parser(token) {
        Ok(("", out)) => Some(out),
        _ => None,
    }
}

fn operand<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    operand: &'static str,
) -> Result<&'a str, ParseError> {
    tokens
        .next()
        .ok_or(ParseError::MissingOperand { command, operand })
}

fn number<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    name: &'static str,
) -> Result<u16, ParseError> {
    let token = operand(tokens, command, name)?;
    whole(integer, token).ok_or_else(|| ParseError::InvalidNumber(token.to_string()))
}

fn name<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    name: &'static str,
) -> Result<String, ParseError> {
    let token = operand(tokens, command, name)?;
    whole(symbol, token).ok_or_else(|| ParseError::InvalidSymbol(token.to_string()))
}

/// Branch target names; `ret.<digits>` would shadow a return address.
fn label<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<String, ParseError> {
    let label = name(tokens, command, "label")?;
    if whole(return_suffix, &label).is_some() {
        return Err(ParseError::ReservedLabel(label));
    }
    Ok(label)
}

/// Checks that a name supplied from outside the source text (a unit name,
/// the entry function) is a valid symbol.
pub(crate) fn check_symbol(name: &str) -> Result<(), ParseError> {
    whole(symbol, name)
        .map(|_| ())
        .ok_or_else(|| ParseError::InvalidSymbol(name.to_string()))
}

fn access<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<(Segment, u16), ParseError> {
    let token = operand(tokens, command, "segment")?;
    let seg = whole(segment, token).ok_or_else(|| ParseError::UnknownSegment(token.to_string()))?;
    Ok((seg, number(tokens, command, "index")?))
}

/// Parses one significant line (comment already stripped, not blank).
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let mut tokens = line.split_whitespace();
    let head = tokens.next().unwrap_or_default();

    let command = match head {
        "push" => {
            let (seg, index) = access(&mut tokens, "push")?;
            Push(seg, index)
        }
        "pop" => {
            let (seg, index) = access(&mut tokens, "pop")?;
            Pop(seg, index)
        }
        "label" => Label(label(&mut tokens, "label")?),
        "goto" => Goto(label(&mut tokens, "goto")?),
        "if-goto" => IfGoto(label(&mut tokens, "if-goto")?),
        "function" => {
            let function = name(&mut tokens, "function", "name")?;
            Function(function, number(&mut tokens, "function", "local count")?)
        }
        "call" => {
            let function = name(&mut tokens, "call", "name")?;
            Call(function, number(&mut tokens, "call", "argument count")?)
        }
        "return" => Return,
        _ => match whole(prim, head) {
            Some(op) => Arithmetic(op),
            None => return Err(ParseError::UnknownCommand(head.to_string())),
        },
    };

    let rest: Vec<&str> = tokens.collect();
    if !rest.is_empty() {
        return Err(ParseError::TrailingInput(rest.join(" ")));
    }

    Ok(command)
}

fn significant(line: &str) -> Option<&str> {
    let line = line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim();
    (!line.is_empty()).then_some(line)
}

/// Sequential reader over the commands of one translation unit.
///
/// Blank lines and comments are skipped; [`Parser::line_number`] reports the
/// 1-based source line of the command most recently returned by
/// [`Parser::advance`].
pub struct Parser<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
    line_number: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lines: source.lines().collect(),
            cursor: 0,
            line_number: 0,
        }
    }

    fn next_significant(&self) -> Option<(usize, &'a str)> {
        self.lines[self.cursor..]
            .iter()
            .enumerate()
            .find_map(|(offset, &line)| significant(line).map(|l| (self.cursor + offset, l)))
    }

    pub fn has_more_commands(&self) -> bool {
        self.next_significant().is_some()
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Parses the next command without moving the cursor.
    pub fn peek(&self) -> Option<Result<Command, ParseError>> {
        self.next_significant().map(|(_, line)| parse_command(line))
    }

    pub fn advance(&mut self) -> Option<Result<Command, ParseError>> {
        let (at, line) = self.next_significant()?;
        self.cursor = at + 1;
        self.line_number = at + 1;
        Some(parse_command(line))
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Command, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
