//! Discard-to-helper-invocation demotion.
//!
//! Backends that run fragment invocations in lock-step groups cannot let
//! one lane exit at a `discard`: neighboring lanes still need its values
//! for derivatives. This pass rewrites `Kill` into a *logical* discard:
//! the invocation keeps executing to the end of the entry point, every
//! externally visible effect after the discard point is suppressed, and a
//! real termination is issued exactly once, at the very end.
//!
//! For a fragment shader
//!
//! ```wgsl
//! if (front_facing) { discard; }
//! output[0] = 42.0;
//! return 0.5;
//! ```
//!
//! the rewritten module reads
//!
//! ```wgsl
//! var<private> continue_execution: bool = true;
//! ...
//! if (front_facing) { continue_execution = false; }
//! if (continue_execution) { output[0] = 42.0; }
//! if (!continue_execution) { terminate_invocation; }
//! return 0.5;
//! ```
//!
//! Functions that cannot discard (directly or through calls) are left
//! untouched. A function that can is rewritten in full: a discard in a
//! callee suppresses the caller's later effects too, because the flag is
//! a single module global and every gate re-loads it.

use std::collections::HashMap;

use shadec_analysis::DiscardAnalysis;
use shadec_ir::{
    AddressSpace, Arena, AtomicFunction, Block, Expression, Function, FunctionArgument,
    GlobalVariable, Handle, Literal, LocalVariable, Module, Range, Scalar, Statement, Type,
    TypeInner, UnaryOp, UniqueArena, pointer_space,
};

use crate::Pass;

/// Name of the injected module-private flag.
const FLAG_NAME: &str = "continue_execution";

/// Rewrites `Kill` statements into flag-based demotion, gating all
/// later externally visible writes, and terminates demoted invocations
/// at the end of each affected entry point.
#[derive(Debug)]
pub struct DemoteToHelper;

impl Pass for DemoteToHelper {
    fn name(&self) -> &str {
        "demote-to-helper"
    }

    fn run(&self, module: &mut Module) -> bool {
        let analysis = DiscardAnalysis::of(module);
        if !analysis.any() {
            return false;
        }

        let flag = inject_flag(module);

        let Module {
            ref types,
            ref global_variables,
            ref mut functions,
            ref mut entry_points,
            ..
        } = *module;

        // Helper functions, including ones no entry point reaches: a raw
        // `Kill` must not survive the pass anywhere in the module.
        let handles: Vec<Handle<Function>> = functions.iter().map(|(h, _)| h).collect();
        for handle in handles {
            if analysis.may_discard(handle) {
                rewrite_function(
                    &mut functions[handle],
                    types,
                    global_variables,
                    &analysis,
                    flag,
                );
            }
        }

        for (index, ep) in entry_points.iter_mut().enumerate() {
            if analysis.entry_point_may_discard(index) {
                rewrite_function(&mut ep.function, types, global_variables, &analysis, flag);
                inject_terminator(&mut ep.function, flag);
                log::debug!("demote-to-helper: terminated entry point '{}'", ep.name);
            }
        }

        true
    }
}

/// Appends the invocation-liveness flag to the module's globals.
///
/// Called once per run, on the first (and only) time the module is found
/// to contain a discard; the returned handle is threaded through every
/// rewrite, so the flag is shared no matter how many functions need it.
fn inject_flag(module: &mut Module) -> Handle<GlobalVariable> {
    let bool_ty = module.types.insert(Type {
        name: None,
        inner: TypeInner::Scalar(Scalar::BOOL),
    });
    let init = module
        .global_expressions
        .append(Expression::Literal(Literal::Bool(true)));
    let flag = module.global_variables.append(GlobalVariable {
        name: Some(FLAG_NAME.into()),
        space: AddressSpace::Private,
        binding: None,
        ty: bool_ty,
        init: Some(init),
    });
    log::debug!("demote-to-helper: injected flag {flag:?}");
    flag
}

/// Whether, at a point in the rewrite, the invocation may already have
/// discarded. Monotonic: never falls back to `NotYet` within a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DiscardState {
    NotYet,
    Possibly,
}

impl DiscardState {
    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::NotYet, Self::NotYet) => Self::NotYet,
            _ => Self::Possibly,
        }
    }
}

struct Rewriter<'a> {
    arguments: &'a [FunctionArgument],
    types: &'a UniqueArena<Type>,
    global_variables: &'a Arena<GlobalVariable>,
    analysis: &'a DiscardAnalysis,
    flag: Handle<GlobalVariable>,
    expressions: &'a mut Arena<Expression>,
    local_variables: &'a mut Arena<LocalVariable>,
    /// Pointer expression for the flag, shared within the function.
    flag_pointer: Option<Handle<Expression>>,
    /// The `false` stored at former `Kill` sites.
    false_literal: Option<Handle<Expression>>,
    /// Gated atomic results, mapped to their re-loaded replacements.
    substitutions: HashMap<Handle<Expression>, Handle<Expression>>,
}

fn rewrite_function(
    function: &mut Function,
    types: &UniqueArena<Type>,
    global_variables: &Arena<GlobalVariable>,
    analysis: &DiscardAnalysis,
    flag: Handle<GlobalVariable>,
) {
    log::debug!(
        "demote-to-helper: rewriting '{}'",
        function.name.as_deref().unwrap_or("_")
    );

    let Function {
        ref arguments,
        ref mut local_variables,
        ref mut expressions,
        ref mut body,
        ..
    } = *function;

    let mut rewriter = Rewriter {
        arguments: arguments.as_slice(),
        types,
        global_variables,
        analysis,
        flag,
        expressions,
        local_variables,
        flag_pointer: None,
        false_literal: None,
        substitutions: HashMap::new(),
    };

    let taken = std::mem::take(body);
    let (rewritten, _) = rewriter.rewrite_block(taken, DiscardState::NotYet);
    rewriter.apply_substitutions();
    *body = rewritten;
}

impl Rewriter<'_> {
    fn rewrite_block(&mut self, block: Block, state: DiscardState) -> (Block, DiscardState) {
        let mut out = Vec::with_capacity(block.len());
        let mut state = state;
        for mut stmt in block {
            self.substitute_uses(&mut stmt);
            match stmt {
                Statement::Kill => {
                    // The discard becomes a flag clear. Control flow is
                    // deliberately untouched: execution falls through to
                    // the next statement, exactly as the demoted lane
                    // will at runtime.
                    let pointer = self.flag_pointer();
                    let value = self.false_literal();
                    out.push(Statement::Store { pointer, value });
                    state = DiscardState::Possibly;
                }
                Statement::Call {
                    function,
                    arguments,
                    result,
                } => {
                    // Any call into a function that may discard taints
                    // everything after the call site, whether the discard
                    // is direct or buried further down the chain.
                    if self.analysis.may_discard(function) {
                        state = DiscardState::Possibly;
                    }
                    out.push(Statement::Call {
                        function,
                        arguments,
                        result,
                    });
                }
                Statement::Store { pointer, value } => {
                    if state == DiscardState::Possibly && self.store_is_visible(pointer) {
                        self.gate(&mut out, Statement::Store { pointer, value });
                    } else {
                        out.push(Statement::Store { pointer, value });
                    }
                }
                Statement::ImageStore {
                    image,
                    coordinate,
                    value,
                } => {
                    let stmt = Statement::ImageStore {
                        image,
                        coordinate,
                        value,
                    };
                    if state == DiscardState::Possibly {
                        self.gate(&mut out, stmt);
                    } else {
                        out.push(stmt);
                    }
                }
                Statement::Atomic {
                    pointer,
                    fun,
                    value,
                    result,
                } => {
                    if state == DiscardState::Possibly {
                        match result {
                            Some(result) => {
                                self.gate_atomic(&mut out, pointer, fun, value, result)
                            }
                            None => self.gate(
                                &mut out,
                                Statement::Atomic {
                                    pointer,
                                    fun,
                                    value,
                                    result: None,
                                },
                            ),
                        }
                    } else {
                        out.push(Statement::Atomic {
                            pointer,
                            fun,
                            value,
                            result,
                        });
                    }
                }
                Statement::If {
                    condition,
                    accept,
                    reject,
                } => {
                    // Both arms start from the state at the branch. Once
                    // either arm may discard, everything after the `If`
                    // must be treated as possibly demoted, even though at
                    // runtime only one arm was taken.
                    let (accept, accept_state) = self.rewrite_block(accept, state);
                    let (reject, reject_state) = self.rewrite_block(reject, state);
                    state = state.merge(accept_state).merge(reject_state);
                    out.push(Statement::If {
                        condition,
                        accept,
                        reject,
                    });
                }
                Statement::Loop {
                    body,
                    continuing,
                    break_if,
                } => {
                    // The continuing block runs after the body on every
                    // iteration.
                    let (body, body_state) = self.rewrite_block(body, state);
                    let (continuing, continuing_state) =
                        self.rewrite_block(continuing, body_state);
                    state = state.merge(body_state).merge(continuing_state);
                    out.push(Statement::Loop {
                        body,
                        continuing,
                        break_if,
                    });
                }
                other => out.push(other),
            }
        }
        (out, state)
    }

    /// Wraps a statement in `if (continue_execution) { ... }` with a
    /// fresh flag load.
    fn gate(&mut self, out: &mut Block, inner: Statement) {
        let load = self.fresh_flag_load(out);
        out.push(Statement::If {
            condition: load,
            accept: vec![inner],
            reject: vec![],
        });
    }

    /// Gates an atomic whose result feeds later code.
    ///
    /// The result is materialized through an uninitialized local: the
    /// gated arm performs the atomic and stores its result, and code
    /// after the gate reads the local back. A demoted lane observes an
    /// unspecified value, which cannot escape: any use that would make it
    /// visible outside the invocation is itself gated.
    fn gate_atomic(
        &mut self,
        out: &mut Block,
        pointer: Handle<Expression>,
        fun: AtomicFunction,
        value: Handle<Expression>,
        result: Handle<Expression>,
    ) {
        let result_ty = match self.expressions.try_get(result) {
            Some(&Expression::AtomicResult { ty, .. }) => ty,
            Some(other) => panic!(
                "demote-to-helper: atomic result {result:?} is not an AtomicResult: {other:?}"
            ),
            None => panic!("demote-to-helper: atomic result {result:?} out of bounds"),
        };

        let local = self.local_variables.append(LocalVariable {
            name: Some("demoted_result".into()),
            ty: result_ty,
            init: None,
        });
        let local_pointer = self.expressions.append(Expression::LocalVariable(local));

        let load = self.fresh_flag_load(out);
        out.push(Statement::If {
            condition: load,
            accept: vec![
                Statement::Atomic {
                    pointer,
                    fun,
                    value,
                    result: Some(result),
                },
                Statement::Store {
                    pointer: local_pointer,
                    value: result,
                },
            ],
            reject: vec![],
        });

        let reload = self.expressions.append(Expression::Load {
            pointer: local_pointer,
        });
        out.push(Statement::Emit(Range::new(
            reload,
            self.expressions.next_handle(),
        )));
        self.substitutions.insert(result, reload);
    }

    /// Loads the flag and emits the load, returning its handle.
    fn fresh_flag_load(&mut self, out: &mut Block) -> Handle<Expression> {
        let pointer = self.flag_pointer();
        let load = self.expressions.append(Expression::Load { pointer });
        out.push(Statement::Emit(Range::new(
            load,
            self.expressions.next_handle(),
        )));
        load
    }

    fn flag_pointer(&mut self) -> Handle<Expression> {
        match self.flag_pointer {
            Some(handle) => handle,
            None => {
                let handle = self
                    .expressions
                    .append(Expression::GlobalVariable(self.flag));
                self.flag_pointer = Some(handle);
                handle
            }
        }
    }

    fn false_literal(&mut self) -> Handle<Expression> {
        match self.false_literal {
            Some(handle) => handle,
            None => {
                let handle = self
                    .expressions
                    .append(Expression::Literal(Literal::Bool(false)));
                self.false_literal = Some(handle);
                handle
            }
        }
    }

    /// Whether a store through `pointer` is visible outside the
    /// invocation. Function/private/workgroup stores are not; plain
    /// workgroup stores stay ungated, only atomics on workgroup memory
    /// are (handled separately).
    fn store_is_visible(&self, pointer: Handle<Expression>) -> bool {
        let space = pointer_space(
            self.arguments,
            self.expressions,
            self.global_variables,
            self.types,
            pointer,
        )
        .unwrap_or_else(|e| panic!("demote-to-helper: unresolvable store destination: {e}"));
        matches!(
            space,
            AddressSpace::Storage { .. } | AddressSpace::Handle
        )
    }

    /// Redirects statement-level uses of gated atomic results to their
    /// re-loaded values. Definitions (`Call`/`Atomic` results) are left
    /// alone.
    fn substitute_uses(&self, stmt: &mut Statement) {
        if self.substitutions.is_empty() {
            return;
        }
        let subst = |handle: &mut Handle<Expression>| {
            if let Some(&new) = self.substitutions.get(handle) {
                *handle = new;
            }
        };
        match stmt {
            Statement::Store { pointer, value } => {
                subst(pointer);
                subst(value);
            }
            Statement::ImageStore {
                image,
                coordinate,
                value,
            } => {
                subst(image);
                subst(coordinate);
                subst(value);
            }
            Statement::If { condition, .. } => subst(condition),
            Statement::Loop { break_if, .. } => {
                if let Some(break_if) = break_if {
                    subst(break_if);
                }
            }
            Statement::Call { arguments, .. } => {
                for argument in arguments {
                    subst(argument);
                }
            }
            Statement::Atomic {
                pointer, fun, value, ..
            } => {
                subst(pointer);
                subst(value);
                if let AtomicFunction::Exchange {
                    compare: Some(compare),
                } = fun
                {
                    subst(compare);
                }
            }
            Statement::Return { value: Some(value) } => subst(value),
            _ => {}
        }
    }

    /// Redirects expression-level uses of gated atomic results. Runs once
    /// after the body rewrite; every use of a gated result necessarily
    /// sits after its atomic, so a blanket pass over the arena is safe.
    fn apply_substitutions(&mut self) {
        if self.substitutions.is_empty() {
            return;
        }
        for (_, expr) in self.expressions.iter_mut() {
            remap_operands(expr, &self.substitutions);
        }
    }
}

fn remap_operands(
    expr: &mut Expression,
    substitutions: &HashMap<Handle<Expression>, Handle<Expression>>,
) {
    let remap = |handle: &mut Handle<Expression>| {
        if let Some(&new) = substitutions.get(handle) {
            *handle = new;
        }
    };
    match expr {
        Expression::Literal(_)
        | Expression::FunctionArgument(_)
        | Expression::GlobalVariable(_)
        | Expression::LocalVariable(_)
        | Expression::CallResult(_)
        | Expression::AtomicResult { .. }
        | Expression::ZeroValue(_) => {}

        Expression::Load { pointer } => remap(pointer),
        Expression::Unary { expr, .. } => remap(expr),
        Expression::Derivative { expr, .. } => remap(expr),
        Expression::ArrayLength(expr) => remap(expr),
        Expression::Splat { value, .. } => remap(value),
        Expression::As { expr, .. } => remap(expr),
        Expression::AccessIndex { base, .. } => remap(base),
        Expression::Swizzle { vector, .. } => remap(vector),

        Expression::Binary { left, right, .. } => {
            remap(left);
            remap(right);
        }
        Expression::Access { base, index } => {
            remap(base);
            remap(index);
        }
        Expression::ImageLoad { image, coordinate } => {
            remap(image);
            remap(coordinate);
        }
        Expression::Select {
            condition,
            accept,
            reject,
        } => {
            remap(condition);
            remap(accept);
            remap(reject);
        }
        Expression::ImageSample {
            image,
            sampler,
            coordinate,
        } => {
            remap(image);
            remap(sampler);
            remap(coordinate);
        }
        Expression::Compose { components, .. } => {
            for component in components {
                remap(component);
            }
        }
        Expression::Math {
            arg, arg1, arg2, ..
        } => {
            remap(arg);
            if let Some(arg1) = arg1 {
                remap(arg1);
            }
            if let Some(arg2) = arg2 {
                remap(arg2);
            }
        }
    }
}

/// Appends the end-of-entry-point check: a lane whose flag was cleared
/// issues the one true termination. Inserted immediately before the final
/// `Return`, or at the end of the body if there is none. Helper functions
/// never get this; they return to their caller's gated continuation.
fn inject_terminator(function: &mut Function, flag: Handle<GlobalVariable>) {
    let expressions = &mut function.expressions;
    let pointer = expressions.append(Expression::GlobalVariable(flag));
    let load = expressions.append(Expression::Load { pointer });
    let discarded = expressions.append(Expression::Unary {
        op: UnaryOp::LogicalNot,
        expr: load,
    });
    let emit = Statement::Emit(Range::new(load, expressions.next_handle()));
    let check = Statement::If {
        condition: discarded,
        accept: vec![Statement::TerminateInvocation],
        reject: vec![],
    };

    let body = &mut function.body;
    let at = match body.last() {
        Some(Statement::Return { .. }) => body.len() - 1,
        _ => body.len(),
    };
    body.insert(at, emit);
    body.insert(at + 1, check);
}
