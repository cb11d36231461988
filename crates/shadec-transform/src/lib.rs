//! IR transform passes for shadec.
//!
//! Provides a [`Pass`] trait, a [`PassManager`] with fixed-point
//! iteration, and the lowering passes backends rely on (discard
//! demotion, IR validation).

mod demote;
mod validation;

pub use demote::DemoteToHelper;
pub use validation::IrValidation;

use std::fmt::Debug;

use shadec_ir::Module;

/// A transform pass that rewrites an IR module.
pub trait Pass: Debug {
    /// Human-readable name of the pass.
    fn name(&self) -> &str;

    /// Run the pass on a module. Returns `true` if anything was modified.
    fn run(&self, module: &mut Module) -> bool;
}

/// Maximum number of fixed-point iterations before giving up.
const MAX_ITERATIONS: usize = 10;

/// Runs passes in sequence with fixed-point iteration.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PassManager {
    /// Creates an empty pass manager with no passes.
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Creates the standard lowering pipeline: discard demotion followed
    /// by validation.
    pub fn standard() -> Self {
        let mut pm = Self::new();
        pm.add_pass(Box::new(DemoteToHelper));
        pm.add_pass(Box::new(IrValidation));
        pm
    }

    /// Adds a pass to the pipeline.
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Runs all passes until a fixed point is reached or the iteration
    /// limit.
    pub fn run(&self, module: &mut Module) {
        for _ in 0..MAX_ITERATIONS {
            let mut changed = false;
            for pass in &self.passes {
                changed |= pass.run(module);
            }
            if !changed {
                break;
            }
        }
    }
}

/// Convenience function: runs the standard lowering pipeline on a module.
pub fn lower(module: &mut Module) {
    PassManager::standard().run(module);
}
