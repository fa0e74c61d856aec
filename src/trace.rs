//! Evaluation tracing.
//!
//! A [`TraceListener`] passed to the evaluator receives the program source
//! once, then one message per evaluated node: `<node> [<operands>] => <result>`,
//! where the bracketed list holds the values the node's operands evaluated
//! to and is left out for leaves. A failing node reports
//! `<node> [<operands>] failed: <error>` instead.

use std::cell::RefCell;

pub trait TraceListener {
    fn trace(&self, message: &str);
}

impl<F: Fn(&str)> TraceListener for F {
    fn trace(&self, message: &str) {
        self(message)
    }
}

/// Collects trace messages in memory.
///
/// # Examples
///
/// ```
/// use tally_lang::{Config, Expression, Scope, Variables};
/// use tally_lang::trace::TraceLog;
///
/// let config = Config::default();
/// let log = TraceLog::new();
/// Expression::compile("1 + 2", &config)
///     .unwrap()
///     .execute_traced(&mut Variables::new(), &Scope::new(), &config, &log)
///     .unwrap();
///
/// assert_eq!(log.messages().last().unwrap(), "(1 + 2) [1, 2] => 3");
/// ```
#[derive(Debug, Default)]
pub struct TraceLog {
    messages: RefCell<Vec<String>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the messages recorded so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Removes and returns the recorded messages.
    pub fn take(&self) -> Vec<String> {
        self.messages.take()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}

impl TraceListener for TraceLog {
    fn trace(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Forwards trace messages to the `tracing` subscriber at `TRACE` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl TraceListener for TracingListener {
    fn trace(&self, message: &str) {
        tracing::trace!(target: "tally::trace", "{}", message);
    }
}
