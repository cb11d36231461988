//! Static call graph construction.
//!
//! Collects, for every function and entry point, the set of user
//! functions it calls directly. Built-in operations (math, texture
//! sampling) are expressions in this IR, so they never form edges.

use std::collections::BTreeSet;

use shadec_ir::{Function, Handle, Module, Statement};

/// Errors during call graph analysis.
#[derive(Debug, thiserror::Error)]
pub enum CallGraphError {
    /// The graph contains a cycle; the shading model forbids recursion.
    #[error("recursive call cycle detected ({visited} of {total} functions ordered)")]
    RecursionDetected { visited: usize, total: usize },
}

/// The static call graph of a module.
///
/// Callee sets are `BTreeSet`s so iteration order is deterministic.
#[derive(Clone, Debug)]
pub struct CallGraph {
    /// All function handles, in arena order (`handles[i].index() == i`).
    handles: Vec<Handle<Function>>,
    function_callees: Vec<BTreeSet<Handle<Function>>>,
    entry_point_callees: Vec<BTreeSet<Handle<Function>>>,
}

impl CallGraph {
    /// Builds the call graph of `module`.
    ///
    /// Every function is included, reachable from an entry point or not.
    ///
    /// # Panics
    ///
    /// Panics if a `Call` statement targets a function handle outside the
    /// module's function arena; such a module is malformed.
    pub fn build(module: &Module) -> Self {
        let mut handles = Vec::with_capacity(module.functions.len());
        let mut function_callees = Vec::with_capacity(module.functions.len());
        for (handle, func) in module.functions.iter() {
            let mut callees = BTreeSet::new();
            collect_callees(&func.body, module, &mut callees);
            handles.push(handle);
            function_callees.push(callees);
        }

        let entry_point_callees = module
            .entry_points
            .iter()
            .map(|ep| {
                let mut callees = BTreeSet::new();
                collect_callees(&ep.function.body, module, &mut callees);
                callees
            })
            .collect();

        Self {
            handles,
            function_callees,
            entry_point_callees,
        }
    }

    /// Functions called directly by the given function.
    pub fn callees(&self, function: Handle<Function>) -> &BTreeSet<Handle<Function>> {
        &self.function_callees[function.index()]
    }

    /// Functions called directly by the entry point at `index`.
    pub fn entry_point_callees(&self, index: usize) -> &BTreeSet<Handle<Function>> {
        &self.entry_point_callees[index]
    }

    /// Per-function callee sets, indexed by function handle index.
    pub fn function_callees(&self) -> &[BTreeSet<Handle<Function>>] {
        &self.function_callees
    }

    /// Returns the functions in callee-first (post) order.
    ///
    /// # Errors
    ///
    /// Returns [`CallGraphError::RecursionDetected`] if the call graph has
    /// a cycle.
    pub fn topological_order(&self) -> Result<Vec<Handle<Function>>, CallGraphError> {
        let n = self.function_callees.len();

        // Kahn's algorithm over reversed edges: a function becomes ready
        // once all of its callees are ordered.
        let mut remaining: Vec<usize> = self
            .function_callees
            .iter()
            .map(|callees| callees.len())
            .collect();
        let mut callers: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (caller, callees) in self.function_callees.iter().enumerate() {
            for callee in callees {
                callers[callee.index()].push(caller);
            }
        }

        let mut ready: BTreeSet<usize> = remaining
            .iter()
            .enumerate()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(n);

        while let Some(&index) = ready.iter().next() {
            ready.remove(&index);
            order.push(self.handles[index]);
            for &caller in &callers[index] {
                remaining[caller] -= 1;
                if remaining[caller] == 0 {
                    ready.insert(caller);
                }
            }
        }

        if order.len() != n {
            return Err(CallGraphError::RecursionDetected {
                visited: order.len(),
                total: n,
            });
        }
        Ok(order)
    }
}

fn collect_callees(
    block: &[Statement],
    module: &Module,
    callees: &mut BTreeSet<Handle<Function>>,
) {
    for stmt in block {
        match stmt {
            Statement::Call { function, .. } => {
                assert!(
                    module.functions.try_get(*function).is_some(),
                    "call to unknown function {function:?}",
                );
                callees.insert(*function);
            }
            Statement::If { accept, reject, .. } => {
                collect_callees(accept, module, callees);
                collect_callees(reject, module, callees);
            }
            Statement::Loop {
                body, continuing, ..
            } => {
                collect_callees(body, module, callees);
                collect_callees(continuing, module, callees);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadec_ir::Function;

    fn module_with_chain() -> (Module, Vec<Handle<Function>>) {
        // leaf <- mid <- root, plus an entry point calling root.
        let mut module = Module::default();
        let leaf = module.functions.append(Function::new("leaf"));

        let mut mid = Function::new("mid");
        mid.body.push(Statement::Call {
            function: leaf,
            arguments: vec![],
            result: None,
        });
        let mid = module.functions.append(mid);

        let mut root = Function::new("root");
        let cond = root
            .expressions
            .append(shadec_ir::Expression::Literal(shadec_ir::Literal::Bool(
                true,
            )));
        root.body.push(Statement::If {
            condition: cond,
            accept: vec![Statement::Call {
                function: mid,
                arguments: vec![],
                result: None,
            }],
            reject: vec![],
        });
        let root = module.functions.append(root);

        let mut main = Function::new("main");
        main.body.push(Statement::Call {
            function: root,
            arguments: vec![],
            result: None,
        });
        module
            .entry_points
            .push(shadec_ir::EntryPoint::fragment("main", main));

        (module, vec![leaf, mid, root])
    }

    #[test]
    fn collects_nested_calls() {
        let (module, handles) = module_with_chain();
        let graph = CallGraph::build(&module);

        assert!(graph.callees(handles[0]).is_empty());
        assert!(graph.callees(handles[1]).contains(&handles[0]));
        assert!(graph.callees(handles[2]).contains(&handles[1]));
        assert!(graph.entry_point_callees(0).contains(&handles[2]));
    }

    #[test]
    fn topological_order_is_callee_first() {
        let (module, handles) = module_with_chain();
        let graph = CallGraph::build(&module);
        let order = graph.topological_order().unwrap();

        let pos = |h: Handle<Function>| order.iter().position(|&o| o == h).unwrap();
        assert!(pos(handles[0]) < pos(handles[1]));
        assert!(pos(handles[1]) < pos(handles[2]));
    }

    #[test]
    fn recursion_is_reported() {
        let mut module = Module::default();
        // Two functions calling each other. The bodies are patched after
        // both handles exist.
        let a = module.functions.append(Function::new("a"));
        let b = module.functions.append(Function::new("b"));
        module.functions[a].body.push(Statement::Call {
            function: b,
            arguments: vec![],
            result: None,
        });
        module.functions[b].body.push(Statement::Call {
            function: a,
            arguments: vec![],
            result: None,
        });

        let graph = CallGraph::build(&module);
        assert!(matches!(
            graph.topological_order(),
            Err(CallGraphError::RecursionDetected { .. })
        ));
    }

    #[test]
    fn empty_module_orders_trivially() {
        let module = Module::default();
        let graph = CallGraph::build(&module);
        assert!(graph.topological_order().unwrap().is_empty());
    }
}
