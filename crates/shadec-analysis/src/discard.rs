//! Discard reachability.
//!
//! Determines, for every function and entry point, whether executing it
//! may discard the invocation: it contains a `Kill` statement, or it
//! calls (directly or transitively) a function that does. The demotion
//! pass rewrites exactly the functions this analysis marks.

use shadec_ir::{Function, Handle, Module, Statement};

use crate::callgraph::CallGraph;

/// Which functions of a module may discard.
///
/// Computed once, before any rewriting; the demotion pass introduces no
/// new `Kill` statements, so the result stays valid while it runs.
#[derive(Clone, Debug)]
pub struct DiscardAnalysis {
    functions: Vec<bool>,
    entry_points: Vec<bool>,
}

impl DiscardAnalysis {
    /// Analyzes `module`.
    ///
    /// Propagation over the call graph iterates to a fixed point, so the
    /// analysis terminates even on (malformed) recursive input; a module
    /// with recursion is flagged separately by validation.
    pub fn of(module: &Module) -> Self {
        let graph = CallGraph::build(module);

        let mut functions: Vec<bool> = module
            .functions
            .iter()
            .map(|(_, func)| block_kills(&func.body))
            .collect();

        loop {
            let mut changed = false;
            for (index, callees) in graph.function_callees().iter().enumerate() {
                if !functions[index] && callees.iter().any(|callee| functions[callee.index()]) {
                    functions[index] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let entry_points = module
            .entry_points
            .iter()
            .enumerate()
            .map(|(index, ep)| {
                block_kills(&ep.function.body)
                    || graph
                        .entry_point_callees(index)
                        .iter()
                        .any(|callee| functions[callee.index()])
            })
            .collect();

        Self {
            functions,
            entry_points,
        }
    }

    /// Whether the given function may discard.
    pub fn may_discard(&self, function: Handle<Function>) -> bool {
        self.functions[function.index()]
    }

    /// Whether the entry point at `index` may discard.
    pub fn entry_point_may_discard(&self, index: usize) -> bool {
        self.entry_points[index]
    }

    /// Whether anything in the module may discard.
    pub fn any(&self) -> bool {
        self.functions.iter().chain(self.entry_points.iter()).any(|&d| d)
    }
}

/// Whether a block tree contains a `Kill` statement.
fn block_kills(block: &[Statement]) -> bool {
    block.iter().any(|stmt| match stmt {
        Statement::Kill => true,
        Statement::If { accept, reject, .. } => block_kills(accept) || block_kills(reject),
        Statement::Loop {
            body, continuing, ..
        } => block_kills(body) || block_kills(continuing),
        _ => false,
    })
}
