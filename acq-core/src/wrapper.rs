//! The acquisition wrapper: an object paired with the context it was reached through

use crate::error::{AcqError, Result};
use crate::value::Value;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Search behaviour of a wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Searches the container automatically when the wrapped object lacks an attribute
    Implicit,
    /// Searches the container only when asked to acquire
    Explicit,
}

impl Mode {
    /// Type name of wrappers in this mode
    pub fn type_name(self) -> &'static str {
        match self {
            Mode::Implicit => "ImplicitAcquisitionWrapper",
            Mode::Explicit => "ExplicitAcquisitionWrapper",
        }
    }
}

struct WrapperCell {
    wrapped: RefCell<Value>,
    container: RefCell<Value>,
    mode: Mode,
}

/// A `(wrapped, container)` pair.
///
/// Cloning a `Wrapper` clones the handle, not the pair. Engine steps that
/// would mutate a wrapper (container caching, layer collapsing) only do so
/// in place when the handle is exclusive and copy it otherwise.
#[derive(Clone)]
pub struct Wrapper(Rc<WrapperCell>);

/// Non-owning wrapper handle
#[derive(Clone)]
pub struct WeakWrapper(Weak<WrapperCell>);

impl WeakWrapper {
    /// Recover the wrapper if it is still alive
    pub fn upgrade(&self) -> Option<Wrapper> {
        self.0.upgrade().map(Wrapper)
    }
}

impl Wrapper {
    /// Wrap `wrapped` in `container`
    pub fn new(wrapped: impl Into<Value>, container: impl Into<Value>, mode: Mode) -> Self {
        Wrapper(Rc::new(WrapperCell {
            wrapped: RefCell::new(wrapped.into()),
            container: RefCell::new(container.into()),
            mode,
        }))
    }

    /// Implicit wrapper
    pub fn implicit(wrapped: impl Into<Value>, container: impl Into<Value>) -> Self {
        Self::new(wrapped, container, Mode::Implicit)
    }

    /// Explicit wrapper
    pub fn explicit(wrapped: impl Into<Value>, container: impl Into<Value>) -> Self {
        Self::new(wrapped, container, Mode::Explicit)
    }

    /// Re-run construction on this wrapper.
    ///
    /// Fails when `wrapped` is this wrapper or contains it anywhere down its
    /// wrapped chain; the wrapper is left untouched in that case.
    pub fn reinit(&self, wrapped: impl Into<Value>, container: impl Into<Value>) -> Result<()> {
        let wrapped = wrapped.into();
        let mut cursor = wrapped.clone();
        while let Value::Wrapper(inner) = cursor {
            if inner.ptr_eq(self) {
                return Err(AcqError::Construction(
                    "cannot wrap acquisition wrapper in itself".to_string(),
                ));
            }
            cursor = inner.wrapped();
        }
        *self.0.wrapped.borrow_mut() = wrapped;
        *self.0.container.borrow_mut() = container.into();
        Ok(())
    }

    /// The wrapped value, one level in
    pub fn wrapped(&self) -> Value {
        self.0.wrapped.borrow().clone()
    }

    /// The current context; `Value::None` at the end of a chain
    pub fn container(&self) -> Value {
        self.0.container.borrow().clone()
    }

    /// Search mode
    pub fn mode(&self) -> Mode {
        self.0.mode
    }

    /// Whether the wrapper searches its container automatically
    pub fn is_implicit(&self) -> bool {
        self.0.mode == Mode::Implicit
    }

    /// Type name of the wrapper
    pub fn type_name(&self) -> &'static str {
        self.0.mode.type_name()
    }

    /// Replace the context
    pub fn set_container(&self, container: impl Into<Value>) {
        *self.0.container.borrow_mut() = container.into();
    }

    /// Make this wrapper the end of its context
    pub fn clear_container(&self) {
        *self.0.container.borrow_mut() = Value::None;
    }

    /// Same handle?
    pub fn ptr_eq(&self, other: &Wrapper) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared pair
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// True when this is the only handle, strong or weak
    pub fn is_exclusive(&self) -> bool {
        Rc::strong_count(&self.0) == 1 && Rc::weak_count(&self.0) == 0
    }

    /// The handles this wrapper owns, for cycle-aware traversal
    pub fn owned_handles(&self) -> SmallVec<[Value; 2]> {
        let mut handles = SmallVec::new();
        let wrapped = self.wrapped();
        if !wrapped.is_none() {
            handles.push(wrapped);
        }
        let container = self.container();
        if !container.is_none() {
            handles.push(container);
        }
        handles
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakWrapper {
        WeakWrapper(Rc::downgrade(&self.0))
    }

    /// Same pair in `mode`; returns this handle when the mode already matches
    pub fn with_mode(&self, mode: Mode) -> Wrapper {
        if self.0.mode == mode {
            self.clone()
        } else {
            Wrapper::new(self.wrapped(), self.container(), mode)
        }
    }

    /// This wrapper if exclusive, otherwise a fresh copy of the pair
    pub fn make_mut(self) -> Wrapper {
        if self.is_exclusive() {
            self
        } else {
            Wrapper::new(self.wrapped(), self.container(), self.0.mode)
        }
    }

    pub(crate) fn replace_wrapped(&self, wrapped: Value) {
        *self.0.wrapped.borrow_mut() = wrapped;
    }

    /// Store a synthesized context in place of a bare parent pointer,
    /// only when nobody else can observe the change.
    pub(crate) fn cache_container(&self, container: &Wrapper) -> bool {
        if self.is_exclusive() {
            *self.0.container.borrow_mut() = Value::Wrapper(container.clone());
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let container = self.container();
        let context = match &container {
            Value::Wrapper(outer) => format!("{}({})", outer.type_name(), outer.wrapped().type_name()),
            other => other.type_name(),
        };
        f.debug_struct(self.type_name())
            .field("wrapped", &self.wrapped())
            .field("container", &format_args!("{}", context))
            .finish()
    }
}
