//! Reference assembler and CPU for the Hack machine, used to execute the
//! translator's output in tests.

#![allow(dead_code)]

use std::collections::HashMap;

use vmil_translator::{translate_units, Options};

pub const SP: usize = 0;
pub const LCL: usize = 1;
pub const ARG: usize = 2;
pub const THIS: usize = 3;
pub const THAT: usize = 4;

const RAM_SIZE: usize = 32768;
const FIRST_VARIABLE: u16 = 16;

#[derive(Debug, Clone)]
enum Instr {
    A(u16),
    C {
        dest: String,
        comp: String,
        jump: String,
    },
}

pub struct Program {
    instrs: Vec<Instr>,
    symbols: HashMap<String, u16>,
}

fn predefined() -> HashMap<String, u16> {
    let mut symbols: HashMap<String, u16> = (0..16).map(|r| (format!("R{}", r), r)).collect();
    for (name, addr) in [
        ("SP", 0),
        ("LCL", 1),
        ("ARG", 2),
        ("THIS", 3),
        ("THAT", 4),
        ("SCREEN", 16384),
        ("KBD", 24576),
    ] {
        symbols.insert(name.to_string(), addr);
    }
    symbols
}

fn strip(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

/// Two-pass assembly: labels first, then variables from address 16.
pub fn assemble(lines: &[String]) -> Program {
    let mut symbols = predefined();
    let mut rom = 0u16;
    for line in lines.iter().map(|l| strip(l)).filter(|l| !l.is_empty()) {
        if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
            assert!(
                symbols.insert(label.to_string(), rom).is_none(),
                "duplicate label {}",
                label
            );
        } else {
            rom += 1;
        }
    }

    let mut next_variable = FIRST_VARIABLE;
    let mut instrs = vec![];
    for line in lines.iter().map(|l| strip(l)).filter(|l| !l.is_empty()) {
        if line.starts_with('(') {
            continue;
        }
        if let Some(value) = line.strip_prefix('@') {
            let addr = match value.parse::<u16>() {
                Ok(n) => {
                    assert!(n < 0x8000, "literal {} does not fit an A-instruction", n);
                    n
                }
                Err(_) => *symbols.entry(value.to_string()).or_insert_with(|| {
                    next_variable += 1;
                    next_variable - 1
                }),
            };
            instrs.push(Instr::A(addr));
            continue;
        }

        let (dest, rest) = match line.split_once('=') {
            Some((dest, rest)) => (dest, rest),
            None => ("", line),
        };
        let (comp, jump) = match rest.split_once(';') {
            Some((comp, jump)) => (comp, jump),
            None => (rest, ""),
        };
        assert!(
            ["", "M", "D", "MD", "DM", "A", "AM", "AD", "ADM"].contains(&dest),
            "bad dest in `{}`",
            line
        );
        assert!(
            ["", "JGT", "JEQ", "JGE", "JLT", "JNE", "JLE", "JMP"].contains(&jump),
            "bad jump in `{}`",
            line
        );
        instrs.push(Instr::C {
            dest: dest.to_string(),
            comp: comp.to_string(),
            jump: jump.to_string(),
        });
    }

    Program { instrs, symbols }
}

pub struct Machine {
    pub ram: Vec<i16>,
    a: i16,
    d: i16,
    pc: u16,
    program: Program,
}

impl Machine {
    pub fn new(program: Program) -> Self {
        Machine {
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
            program,
        }
    }

    pub fn address_of(&self, symbol: &str) -> u16 {
        *self
            .program
            .symbols
            .get(symbol)
            .unwrap_or_else(|| panic!("no symbol {}", symbol))
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.program.symbols.contains_key(symbol)
    }

    pub fn jump_to(&mut self, label: &str) {
        self.pc = self.address_of(label);
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.ram[SP] as usize
    }

    pub fn top(&self) -> i16 {
        self.ram[self.sp() - 1]
    }

    /// `SP`, `LCL`, `ARG`, `THIS`, `THAT`.
    pub fn registers(&self) -> [i16; 5] {
        [self.ram[SP], self.ram[LCL], self.ram[ARG], self.ram[THIS], self.ram[THAT]]
    }

    fn m(&self) -> i16 {
        self.ram[(self.a as u16 as usize) % RAM_SIZE]
    }

    fn alu(&self, comp: &str) -> i16 {
        let (a, d, m) = (self.a, self.d, self.m());
        match comp {
            "0" => 0,
            "1" => 1,
            "-1" => -1,
            "D" => d,
            "A" => a,
            "M" => m,
            "!D" => !d,
            "!A" => !a,
            "!M" => !m,
            "-D" => d.wrapping_neg(),
            "-A" => a.wrapping_neg(),
            "-M" => m.wrapping_neg(),
            "D+1" => d.wrapping_add(1),
            "A+1" => a.wrapping_add(1),
            "M+1" => m.wrapping_add(1),
            "D-1" => d.wrapping_sub(1),
            "A-1" => a.wrapping_sub(1),
            "M-1" => m.wrapping_sub(1),
            "D+A" => d.wrapping_add(a),
            "D+M" => d.wrapping_add(m),
            "D-A" => d.wrapping_sub(a),
            "D-M" => d.wrapping_sub(m),
            "A-D" => a.wrapping_sub(d),
            "M-D" => m.wrapping_sub(d),
            "D&A" => d & a,
            "D&M" => d & m,
            "D|A" => d | a,
            "D|M" => d | m,
            _ => panic!("non-canonical comp `{}`", comp),
        }
    }

    pub fn step(&mut self) {
        let instr = self
            .program
            .instrs
            .get(self.pc as usize)
            .cloned()
            .unwrap_or_else(|| panic!("pc {} ran past the program", self.pc));

        match instr {
            Instr::A(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Instr::C { dest, comp, jump } => {
                let value = self.alu(&comp);
                let target = self.a as u16;
                if dest.contains('M') {
                    self.ram[(target as usize) % RAM_SIZE] = value;
                }
                if dest.contains('A') {
                    self.a = value;
                }
                if dest.contains('D') {
                    self.d = value;
                }
                let taken = match jump.as_str() {
                    "JGT" => value > 0,
                    "JEQ" => value == 0,
                    "JGE" => value >= 0,
                    "JLT" => value < 0,
                    "JNE" => value != 0,
                    "JLE" => value <= 0,
                    "JMP" => true,
                    _ => false,
                };
                self.pc = if taken { target } else { self.pc + 1 };
            }
        }
    }

    /// Runs until the program counter reaches `label`.
    pub fn run_until(&mut self, label: &str) {
        let target = self.address_of(label);
        for _ in 0..5_000_000 {
            if self.pc == target {
                return;
            }
            self.step();
        }
        panic!("never reached {}", label);
    }
}

/// Translates the given units and loads the result into a fresh machine.
pub fn boot(units: &[(&str, &str)]) -> Machine {
    let lines = translate_units(units.iter().copied(), Options::default())
        .unwrap_or_else(|e| panic!("translation failed: {}", e));
    Machine::new(assemble(&lines))
}

/// A `Sys.init` that runs `body` and then spins on `HALT`.
pub fn sys_init(locals: u16, body: &str) -> String {
    format!("function Sys.init {}\n{}\nlabel HALT\ngoto HALT\n", locals, body)
}

/// VM code leaving `value` on the stack, for any 16-bit value.
pub fn push_value(value: i16) -> String {
    match value {
        i16::MIN => "push constant 32767\nneg\npush constant 1\nsub".to_string(),
        v if v < 0 => format!("push constant {}\nneg", -(v as i32)),
        v => format!("push constant {}", v),
    }
}
