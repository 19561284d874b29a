//! Rule evaluation context.

use crate::models::{Module, Program};

/// What a priority rule may look at: the request's module and program.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub module: &'a Module,
    pub program: &'a Program,
}

impl<'a> RequestContext<'a> {
    /// Creates a context.
    pub fn new(module: &'a Module, program: &'a Program) -> Self {
        Self { module, program }
    }
}
