#![forbid(unsafe_code)]

//! Colon-command registry.
//!
//! Commands live in a byte trie so the prompt can complete a prefix with
//! [`CommandRegistry::partial_lookup`]. Each node owns its children in a
//! `BTreeMap`, which keeps completion deterministic.
//!
//! # Example
//! ```
//! use vilo_runtime::command::{CommandRegistry, Dispatch, Handler};
//!
//! let mut reg: CommandRegistry<u32> = CommandRegistry::new();
//! reg.register("write", Handler::NoArg(|n| *n += 1));
//! assert_eq!(reg.partial_lookup("wr").as_deref(), Some("ite"));
//!
//! let mut count = 0;
//! assert_eq!(reg.dispatch(&mut count, "write", ""), Dispatch::Invoked);
//! assert_eq!(count, 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// A command body, tagged by arity.
pub enum Handler<C> {
    /// Ignores any argument.
    NoArg(fn(&mut C)),
    /// Requires a non-empty argument.
    OneArg(fn(&mut C, &str)),
}

// Manual impls: derives would require `C: Clone`.
impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Handler<C> {}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::NoArg(_) => f.write_str("Handler::NoArg"),
            Handler::OneArg(_) => f.write_str("Handler::OneArg"),
        }
    }
}

/// Outcome of [`CommandRegistry::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Invoked,
    NotFound,
    /// The command takes an argument and none was given.
    MissingArgument,
}

struct Node<C> {
    children: BTreeMap<u8, Node<C>>,
    handler: Option<Handler<C>>,
}

impl<C> Node<C> {
    fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            handler: None,
        }
    }
}

/// Name → handler trie.
pub struct CommandRegistry<C> {
    root: Node<C>,
    len: usize,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for CommandRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("len", &self.len)
            .finish()
    }
}

impl<C> CommandRegistry<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::new(),
            len: 0,
        }
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bind `name` to `handler`, returning the handler it replaced.
    ///
    /// An empty name binds the root and is never reachable from the prompt.
    pub fn register(&mut self, name: &str, handler: Handler<C>) -> Option<Handler<C>> {
        let mut node = &mut self.root;
        for &b in name.as_bytes() {
            node = node.children.entry(b).or_insert_with(Node::new);
        }
        let previous = node.handler.replace(handler);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    fn node(&self, path: &str) -> Option<&Node<C>> {
        path.as_bytes()
            .iter()
            .try_fold(&self.root, |node, b| node.children.get(b))
    }

    /// Exact-name lookup.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Handler<C>> {
        self.node(name).and_then(|node| node.handler)
    }

    /// The unambiguous completion of `prefix`.
    ///
    /// Walks down from `prefix` while the current node has exactly one child
    /// and no handler of its own. Returns `None` when `prefix` names no path,
    /// and `Some("")` when the prefix is already a command or a branch point.
    #[must_use]
    pub fn partial_lookup(&self, prefix: &str) -> Option<String> {
        let mut node = self.node(prefix)?;
        let mut suffix = Vec::new();
        while node.handler.is_none() && node.children.len() == 1 {
            let Some((&b, child)) = node.children.iter().next() else {
                break;
            };
            suffix.push(b);
            node = child;
        }
        Some(String::from_utf8_lossy(&suffix).into_owned())
    }

    /// Run `name` against `ctx`.
    pub fn dispatch(&self, ctx: &mut C, name: &str, arg: &str) -> Dispatch {
        let Some(handler) = self.lookup(name).filter(|_| !name.is_empty()) else {
            tracing::debug!(command = name, "command not found");
            return Dispatch::NotFound;
        };
        match handler {
            Handler::NoArg(f) => f(ctx),
            Handler::OneArg(f) => {
                if arg.is_empty() {
                    return Dispatch::MissingArgument;
                }
                f(ctx, arg);
            }
        }
        tracing::debug!(command = name, "command dispatched");
        Dispatch::Invoked
    }
}
