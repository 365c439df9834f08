// ABOUTME: Environment frames: ordered bindings with def-tunnelling and splice support

use crate::error::EvalError;
use crate::value::{List, ListCell, Symbol, Value};
use std::rc::Rc;

/// One frame of the environment chain. `fixed` frames are tunnelled through
/// by `def`, which is what gives function bodies and `assoc` their
/// define-in-outer-scope behaviour. `params_of` ties a frame to the function
/// value whose call produced it; the tail-call splice compares it by
/// reference.
#[derive(Debug, Default)]
pub struct Frame {
    pub fixed: bool,
    pub params_of: List,
    bindings: Vec<(Rc<Symbol>, Value)>,
}

impl Frame {
    pub fn new(fixed: bool) -> Frame {
        Frame {
            fixed,
            params_of: None,
            bindings: Vec::new(),
        }
    }

    /// The frame for a list-function call, remembering which function it
    /// binds the parameters of.
    pub fn for_call(function: Rc<ListCell>) -> Frame {
        Frame {
            fixed: true,
            params_of: Some(function),
            bindings: Vec::new(),
        }
    }

    /// Append a binding. Rebinding a name appends again; the newest entry
    /// wins on lookup.
    pub fn define(&mut self, name: Rc<Symbol>, value: Value) {
        self.bindings.push((name, value));
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound.text() == name)
            .map(|(_, value)| value)
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.bindings
            .iter_mut()
            .rev()
            .find(|(bound, _)| bound.text() == name)
            .map(|(_, value)| value)
    }
}

/// The environment chain, stored as a stack: the last frame is the
/// innermost scope and each frame's parent is the one below it. The root
/// frame is never popped.
#[derive(Debug)]
pub struct Env {
    frames: Vec<Frame>,
}

impl Env {
    pub fn new() -> Env {
        Env {
            frames: vec![Frame::new(false)],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) {
        debug_assert!(self.frames.len() > 1);
        self.frames.pop();
    }

    /// Drop the innermost `count` frames.
    pub fn unwind(&mut self, count: usize) {
        debug_assert!(count < self.frames.len());
        let keep = self.frames.len() - count;
        self.frames.truncate(keep);
    }

    /// Swap the innermost frame for `frame`, keeping its parent chain: the
    /// tail-call splice.
    pub fn replace_top(&mut self, frame: Frame) {
        if let Some(top) = self.frames.last_mut() {
            *top = frame;
        }
    }

    /// Whether a tail call to `function` may reuse the innermost frame.
    pub fn splices_with(&self, function: &Rc<ListCell>) -> bool {
        match self.frames.last().and_then(|f| f.params_of.as_ref()) {
            Some(params_of) => Rc::ptr_eq(params_of, function),
            None => false,
        }
    }

    /// Define in the innermost frame that is not `fixed`.
    pub fn define(&mut self, name: Rc<Symbol>, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if !frame.fixed {
                frame.define(name, value);
                return;
            }
        }
    }

    /// Define in the innermost frame regardless of its `fixed` flag.
    pub fn define_local(&mut self, name: Rc<Symbol>, value: Value) {
        if let Some(top) = self.frames.last_mut() {
            top.define(name, value);
        }
    }

    /// Newest-first scan of the innermost frame, then outward.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.lookup(name))
    }

    /// Overwrite an existing binding wherever it lives, returning the new
    /// value. A missing binding is an error.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<Value, EvalError> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.lookup_mut(name) {
                *slot = value;
                return Ok(slot.clone());
            }
        }
        Err(EvalError::UnboundAssign(name.to_string()))
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl Default for Env {
    fn default() -> Env {
        Env::new()
    }
}
