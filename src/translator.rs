use log::{debug, trace};

use crate::ast::{Command, Op};
use crate::error::{ErrorKind, OptionsError, SegmentRangeError, UnitError};
use crate::labels::Labels;
use crate::parser::{check_symbol, Parser, MAX_LITERAL};
use crate::segment::{self, Location};

macro_rules! svec {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}

/// Symbol of the halting loop appended by [`Translator::finish`].
pub const END_LABEL: &str = "END";

fn at_c(arg: u16) -> String {
    format!("@{arg}", arg = arg)
}

fn at_s(arg: &str) -> String {
    format!("@{arg}", arg = arg)
}

fn def(label: &str) -> String {
    format!("({})", label)
}

/// Pushes D onto the stack
fn push_d() -> Vec<String> {
    svec![
        "@SP",
        "M=M+1",
        "A=M-1", // Don't need to refetch SP; this is safe
        "M=D"
    ]
}

/// Pops the stack into D
fn pop_d() -> Vec<String> {
    svec![
        "@SP",
        "AM=M-1", // SP--, A <- new SP (val to be popped)
        "D=M"
    ]
}

/// Loads the value at `location` into D
fn load(location: &Location) -> Vec<String> {
    match location {
        Location::Literal(value) => svec![at_c(*value), "D=A"],
        Location::Based { base, index } => svec![
            at_s(base),
            "D=M",
            at_c(*index),
            "A=D+A", // A = SEG+arg
            "D=M"    // D = value to push
        ],
        Location::Direct(symbol) => svec![at_s(symbol), "D=M"],
    }
}

fn simple_un_op(op: char) -> Vec<String> {
    svec!["@SP", "A=M-1", format!("M={}M", op)]
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(comp: &str) -> Vec<String> {
    svec![
        "@SP",
        "AM=M-1",             // SP--, looking at top of stack now
        "D=M",                // Right arg in D
        "A=A-1",              // Looking at second arg of stack, will overwrite
        format!("M={}", comp) // Op and overwrite second element
    ]
}

/// Knobs for one program's translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Function the bootstrap calls once the stack is set up.
    pub entry: String,
    /// Address the stack pointer starts at, at most 32767.
    pub stack_base: u16,
    /// Precede each command's instructions with a `// <command>` comment.
    pub annotate: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            entry: "Sys.init".to_string(),
            stack_base: 256,
            annotate: true,
        }
    }
}

/// Generates assembly for a whole program, one unit after another.
///
/// Construction emits the bootstrap; [`Translator::finish`] appends the
/// halting loop and hands back the listing.
pub struct Translator {
    options: Options,
    labels: Labels,
    lines: Vec<String>,
}

impl Translator {
    pub fn new(options: Options) -> Result<Self, OptionsError> {
        if check_symbol(&options.entry).is_err() {
            return Err(OptionsError::Entry(options.entry));
        }
        if options.stack_base > MAX_LITERAL {
            return Err(OptionsError::StackBase(options.stack_base));
        }

        let mut translator = Translator {
            options,
            labels: Labels::new(),
            lines: vec![],
        };
        translator.bootstrap();
        Ok(translator)
    }

    fn bootstrap(&mut self) {
        let entry = self.options.entry.clone();
        if self.options.annotate {
            self.lines.push(format!("// bootstrap: SP={}, call {}", self.options.stack_base, entry));
        }
        self.lines.extend(svec![at_c(self.options.stack_base), "D=A", "@SP", "M=D"]);
        let call = self.call(&entry, 0);
        self.lines.extend(call);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Starts a new translation unit; `static` slots are scoped to it.
    pub fn begin_unit(&mut self, unit: &str) {
        debug!("entering unit {}", unit);
        self.labels.enter_unit(unit);
    }

    fn push(&self, location: Location) -> Vec<String> {
        let mut lines = load(&location);
        lines.extend(push_d());
        lines
    }

    fn pop(&self, location: Location) -> Result<Vec<String>, SegmentRangeError> {
        match location {
            Location::Literal(_) => Err(SegmentRangeError::PopConstant),
            Location::Based { base, index } => Ok(svec![
                at_s(base),
                "D=M",
                at_c(index),
                "D=D+A", // D = SEG+arg
                "@R13",
                "M=D", // Store target addr in R13
                "@SP",
                "AM=M-1", // SP--, A <- new SP (val to be popped)
                "D=M",
                "@R13",
                "A=M", // At the target's address...
                "M=D"  // ... store the popped val
            ]),
            Location::Direct(symbol) => {
                let mut lines = pop_d();
                lines.extend(svec![at_s(&symbol), "M=D"]);
                Ok(lines)
            }
        }
    }

    fn compare(&mut self, op: Op) -> Vec<String> {
        let (true_sym, end_sym) = self.labels.comparison(op);
        svec![
            "@SP",
            "AM=M-1", // SP--, looking at top of stack now
            "D=M",    // Right arg in D
            "A=A-1",  // Looking at second arg of stack, will overwrite
            "D=M-D",
            at_s(&true_sym),
            format!("D;J{}", op.mnemonic().to_uppercase()),
            "D=0",
            at_s(&end_sym),
            "0;JMP",
            def(&true_sym),
            "D=-1",
            def(&end_sym),
            "@SP",
            "A=M-1",
            "M=D"
        ]
    }

    fn arithmetic(&mut self, op: Op) -> Vec<String> {
        match op {
            Op::Add => simple_bin_op("D+M"),
            Op::Sub => simple_bin_op("M-D"),
            Op::And => simple_bin_op("D&M"),
            Op::Or => simple_bin_op("D|M"),
            Op::Neg => simple_un_op('-'),
            Op::Not => simple_un_op('!'),
            Op::Eq | Op::Gt | Op::Lt => self.compare(op),
        }
    }

    fn label(&self, label: &str) -> Vec<String> {
        svec![def(&self.labels.user(label))]
    }

    fn goto(&self, label: &str) -> Vec<String> {
        svec![
            at_s(&self.labels.user(label)),
            "0;JMP" // Unconditional jump
        ]
    }

    fn if_goto(&self, label: &str) -> Vec<String> {
        let mut lines = pop_d();
        lines.extend(svec![
            at_s(&self.labels.user(label)),
            "D;JNE" // False is 0
        ]);
        lines
    }

    fn function(&mut self, name: &str, locals: u16) -> Vec<String> {
        debug!("function {} with {} locals", name, locals);
        self.labels.enter_function(name);

        let mut lines = svec![def(name)];
        for _ in 0..locals {
            lines.extend(svec!["@SP", "M=M+1", "A=M-1", "M=0"]);
        }
        lines
    }

    fn call(&mut self, name: &str, args: u16) -> Vec<String> {
        let ret = self.labels.return_address();

        let mut lines = svec![at_s(&ret), "D=A"];
        lines.extend(push_d());
        for register in ["LCL", "ARG", "THIS", "THAT"] {
            lines.extend(svec![at_s(register), "D=M"]);
            lines.extend(push_d());
        }
        lines.extend(svec![
            // ARG = SP - 5 - args
            "@SP",
            "D=M",
            "@5",
            "D=D-A",
            at_c(args),
            "D=D-A",
            "@ARG",
            "M=D",
            // LCL = SP
            "@SP",
            "D=M",
            "@LCL",
            "M=D",
            at_s(name),
            "0;JMP",
            def(&ret)
        ]);
        lines
    }

    fn ret(&mut self) -> Vec<String> {
        let mut lines = svec![
            "@LCL",
            "D=M",
            "@R13",
            "M=D", // R13 = frame
            "@5",
            "A=D-A",
            "D=M",
            "@R14",
            "M=D" // R14 = return address, saved before ARG[0] is overwritten
        ];
        lines.extend(pop_d());
        lines.extend(svec![
            "@ARG",
            "A=M",
            "M=D", // Result replaces the first argument
            "@ARG",
            "D=M+1",
            "@SP",
            "M=D"
        ]);
        for register in ["THAT", "THIS", "ARG", "LCL"] {
            lines.extend(svec![
                "@R13",
                "AM=M-1", // Walk back through the saved frame
                "D=M",
                at_s(register),
                "M=D"
            ]);
        }
        lines.extend(svec!["@R14", "A=M", "0;JMP"]);
        lines
    }

    /// Emits the instructions for one command.
    pub fn translate(&mut self, command: &Command) -> Result<(), SegmentRangeError> {
        trace!("{}: {}", self.labels.unit(), command);

        let translated = match command {
            Command::Arithmetic(op) => self.arithmetic(*op),
            Command::Push(seg, index) => {
                let location = segment::resolve(*seg, *index, &mut self.labels)?;
                self.push(location)
            }
            Command::Pop(seg, index) => {
                let location = segment::destination(*seg, *index, &mut self.labels)?;
                self.pop(location)?
            }
            Command::Label(sym) => self.label(sym),
            Command::Goto(sym) => self.goto(sym),
            Command::IfGoto(sym) => self.if_goto(sym),
            Command::Function(name, locals) => self.function(name, *locals),
            Command::Call(name, args) => self.call(name, *args),
            Command::Return => self.ret(),
        };

        if self.options.annotate {
            self.lines.push(format!("// {}", command));
        }
        self.lines.extend(translated);
        Ok(())
    }

    /// Translates every command of one unit, stopping at the first error.
    ///
    /// `origin` names the unit in error reports (usually its path). The unit
    /// name prefixes static symbols, so it must itself be a symbol.
    pub fn translate_unit(&mut self, unit: &str, origin: &str, source: &str) -> Result<(), UnitError> {
        check_symbol(unit).map_err(|e| UnitError {
            origin: origin.to_string(),
            line: 0,
            kind: e.into(),
        })?;
        self.begin_unit(unit);

        let mut parser = Parser::new(source);
        while let Some(parsed) = parser.advance() {
            let line = parser.line_number();
            let located = |kind: ErrorKind| UnitError {
                origin: origin.to_string(),
                line,
                kind,
            };

            let command = parsed.map_err(|e| located(e.into()))?;
            self.translate(&command).map_err(|e| located(e.into()))?;
        }
        Ok(())
    }

    /// Appends the halting loop and returns the finished listing.
    pub fn finish(mut self) -> Vec<String> {
        self.lines.extend(svec![def(END_LABEL), at_s(END_LABEL), "0;JMP"]);
        self.lines
    }
}
