//! Transitive fragment dependencies of operations.
//!
//! Each fragment is resolved once per pass. Its closure (every fragment it
//! reaches, in first-visit order) or the reasons it cannot be used are cached
//! and reused by every later operation that spreads it.

use crate::collect::{DefinitionTable, OperationDef};
use crate::source::{node_offset, SourceDocument};
use apollo_compiler::{ast, Node};
use std::collections::{HashMap, HashSet};

/// Why a fragment or operation cannot be assembled.
#[derive(Debug, Clone)]
pub(crate) enum ResolveFailure<'a> {
    /// A spread names a fragment that is not in the table.
    Missing {
        fragment_name: &'a str,
        document: &'a SourceDocument,
        offset: Option<usize>,
    },
    /// A spread leads back to `fragment_name`, passing through `via`.
    Cycle {
        fragment_name: &'a str,
        via: Vec<&'a str>,
        document: &'a SourceDocument,
        offset: Option<usize>,
    },
}

impl PartialEq for ResolveFailure<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Missing {
                    fragment_name,
                    document,
                    offset,
                },
                Self::Missing {
                    fragment_name: other_name,
                    document: other_document,
                    offset: other_offset,
                },
            ) => {
                fragment_name == other_name
                    && std::ptr::eq(*document, *other_document)
                    && offset == other_offset
            }
            (
                Self::Cycle {
                    fragment_name,
                    via,
                    document,
                    offset,
                },
                Self::Cycle {
                    fragment_name: other_name,
                    via: other_via,
                    document: other_document,
                    offset: other_offset,
                },
            ) => {
                fragment_name == other_name
                    && via == other_via
                    && std::ptr::eq(*document, *other_document)
                    && offset == other_offset
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
enum Closure<'a> {
    InProgress,
    Resolved(Vec<&'a str>),
    Broken(Vec<ResolveFailure<'a>>),
}

/// Ordered, duplicate-free set of fragment names.
#[derive(Default)]
struct UsedSet<'a> {
    order: Vec<&'a str>,
    seen: HashSet<&'a str>,
}

impl<'a> UsedSet<'a> {
    fn insert(&mut self, name: &'a str) {
        if self.seen.insert(name) {
            self.order.push(name);
        }
    }
}

fn push_failure<'a>(failures: &mut Vec<ResolveFailure<'a>>, failure: ResolveFailure<'a>) {
    if !failures.contains(&failure) {
        failures.push(failure);
    }
}

/// One operation or fragment body being walked. `pending` holds its
/// remaining spreads, last one first.
struct Frame<'a> {
    fragment: Option<&'a str>,
    document: &'a SourceDocument,
    pending: Vec<&'a Node<ast::FragmentSpread>>,
    used: UsedSet<'a>,
    failures: Vec<ResolveFailure<'a>>,
}

impl<'a> Frame<'a> {
    fn new(
        fragment: Option<&'a str>,
        document: &'a SourceDocument,
        selections: &'a [ast::Selection],
    ) -> Self {
        let mut pending = spreads(selections);
        pending.reverse();
        Self {
            fragment,
            document,
            pending,
            used: UsedSet::default(),
            failures: Vec::new(),
        }
    }

    /// Take in the finished closure of a spread of `name`.
    fn absorb(&mut self, name: &'a str, closure: &Closure<'a>) {
        match closure {
            Closure::Resolved(names) => {
                self.used.insert(name);
                for &name in names {
                    self.used.insert(name);
                }
            }
            Closure::Broken(broken) => {
                for failure in broken {
                    push_failure(&mut self.failures, failure.clone());
                }
            }
            Closure::InProgress => {}
        }
    }

    fn into_closure(self) -> Closure<'a> {
        if self.failures.is_empty() {
            Closure::Resolved(self.used.order)
        } else {
            Closure::Broken(self.failures)
        }
    }
}

pub(crate) struct Resolver<'t, 'a> {
    table: &'t DefinitionTable<'a>,
    cache: HashMap<&'a str, Closure<'a>>,
}

impl<'t, 'a> Resolver<'t, 'a> {
    pub fn new(table: &'t DefinitionTable<'a>) -> Self {
        Self {
            table,
            cache: HashMap::new(),
        }
    }

    /// Every fragment `operation` needs, or every reason it can't be built.
    ///
    /// Fragment bodies are walked with an explicit stack, so the depth of a
    /// spread chain is bounded by memory, not by the call stack.
    pub fn resolve_operation(
        &mut self,
        operation: &OperationDef<'a>,
    ) -> Result<Vec<&'a str>, Vec<ResolveFailure<'a>>> {
        let mut root = Frame::new(None, operation.document, &operation.node.selection_set);
        let mut frames: Vec<Frame<'a>> = Vec::new();
        // Fragments currently being walked, outermost first.
        let mut path: Vec<&'a str> = Vec::new();

        loop {
            let frame = frames.last_mut().unwrap_or(&mut root);
            if let Some(spread) = frame.pending.pop() {
                if let Some(entered) = self.visit(spread, frame, &path) {
                    if let Some(name) = entered.fragment {
                        path.push(name);
                    }
                    frames.push(entered);
                }
                continue;
            }

            let Some(finished) = frames.pop() else {
                break;
            };
            let Some(name) = finished.fragment else {
                continue;
            };
            path.pop();
            let closure = finished.into_closure();
            frames.last_mut().unwrap_or(&mut root).absorb(name, &closure);
            self.cache.insert(name, closure);
        }

        match root.into_closure() {
            Closure::Broken(failures) => Err(failures),
            Closure::Resolved(names) => Ok(names),
            Closure::InProgress => Ok(Vec::new()),
        }
    }

    /// Number of fragments resolved so far, for logging.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Handle one spread found in `frame`. Returns a new frame when the
    /// target fragment still has to be walked.
    fn visit(
        &mut self,
        spread: &'a Node<ast::FragmentSpread>,
        frame: &mut Frame<'a>,
        path: &[&'a str],
    ) -> Option<Frame<'a>> {
        let target = spread.fragment_name.as_str();

        let Some(fragment) = self.table.get(target) else {
            tracing::trace!(fragment = target, path = %frame.document.path(), "unknown fragment");
            push_failure(
                &mut frame.failures,
                ResolveFailure::Missing {
                    fragment_name: target,
                    document: frame.document,
                    offset: node_offset(spread),
                },
            );
            return None;
        };

        match self.cache.get(target) {
            Some(Closure::InProgress) => {
                let start = path.iter().position(|name| *name == target).unwrap_or(0);
                let via = path.get(start + 1..).unwrap_or_default().to_vec();
                tracing::trace!(fragment = target, ?via, "fragment cycle");
                push_failure(
                    &mut frame.failures,
                    ResolveFailure::Cycle {
                        fragment_name: target,
                        via,
                        document: frame.document,
                        offset: node_offset(spread),
                    },
                );
                None
            }
            Some(closure) => {
                frame.absorb(target, closure);
                None
            }
            None => {
                let (document, node) = (fragment.document, fragment.node);
                self.cache.insert(target, Closure::InProgress);
                Some(Frame::new(Some(target), document, &node.selection_set))
            }
        }
    }
}

/// Fragment spreads inside a selection set, in document order.
fn spreads(selections: &[ast::Selection]) -> Vec<&Node<ast::FragmentSpread>> {
    fn walk<'n>(selections: &'n [ast::Selection], found: &mut Vec<&'n Node<ast::FragmentSpread>>) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => walk(&field.selection_set, found),
                ast::Selection::FragmentSpread(spread) => found.push(spread),
                ast::Selection::InlineFragment(inline) => walk(&inline.selection_set, found),
            }
        }
    }

    let mut found = Vec::new();
    walk(selections, &mut found);
    found
}

/// The known fragment name closest to `name` by edit distance, if any is
/// close enough to be a plausible typo.
pub(crate) fn closest_fragment<'a>(
    name: &str,
    known: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    const MAX_DISTANCE: usize = 10;

    let mut best: Option<(usize, &'a str)> = None;
    for candidate in known {
        let distance = strsim::levenshtein(name, candidate);
        if distance < MAX_DISTANCE && best.is_none_or(|(best_distance, _)| distance < best_distance)
        {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}
