//! Naming state for generated assembly symbols.
//!
//! Every symbol the translator invents comes from here:
//!
//! | kind          | format                         |
//! |---------------|--------------------------------|
//! | static slot   | `<unit>.<n>`                   |
//! | comparison    | `.<OP>.true.<n>`, `.<OP>.end.<n>` |
//! | return address| `<function>$ret.<n>`           |
//! | user label    | `<function>$<name>`            |
//!
//! Comparison numbers are unique across the whole program, return numbers
//! restart with each function, and static numbers are handed out per unit.

use std::collections::HashMap;

use crate::ast::Op;

#[derive(Debug, Default)]
pub struct Labels {
    unit: String,
    function: String,
    comparisons: usize,
    returns: usize,
    statics: HashMap<String, HashMap<u16, String>>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn enter_unit(&mut self, unit: &str) {
        self.unit = unit.to_string();
    }

    pub fn enter_function(&mut self, name: &str) {
        self.function = name.to_string();
        self.returns = 0;
    }

    /// Label for a `label`/`goto`/`if-goto` target inside the current function.
    pub fn user(&self, name: &str) -> String {
        format!("{}${}", self.function, name)
    }

    /// Returns the `(true, end)` label pair for one comparison.
    pub fn comparison(&mut self, op: Op) -> (String, String) {
        let n = self.comparisons;
        self.comparisons += 1;
        let op = op.mnemonic().to_uppercase();
        (
            format!(".{}.true.{:03}", op, n),
            format!(".{}.end.{:03}", op, n),
        )
    }

    pub fn return_address(&mut self) -> String {
        let n = self.returns;
        self.returns += 1;
        format!("{}$ret.{:03}", self.function, n)
    }

    /// Slot label for `static <index>` in the current unit, allocated on
    /// first use.
    pub fn static_slot(&mut self, index: u16) -> String {
        let slots = self.statics.entry(self.unit.clone()).or_default();
        let next = slots.len();
        slots
            .entry(index)
            .or_insert_with(|| format!("{}.{:03}", self.unit, next))
            .clone()
    }
}
