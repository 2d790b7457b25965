use std::io::Write;

use crate::error::Result;

/// Whether a built-in took care of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handled by the built-in, with this exit code.
    Handled(i32),
    /// Not for this built-in; the line goes to the native shell instead.
    NotHandled,
}

pub trait Command {
    fn execute(&self, args: &[&str], out: &mut dyn Write) -> Result<Outcome>;
    fn name(&self) -> &'static str;
    fn usage(&self) -> &'static str {
        self.name()
    }
}
