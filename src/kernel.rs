// SPDX-License-Identifier: AGPL-3.0-only

//! Kernel selection for the elementwise per-particle maps.
//!
//! Every map ships two interchangeable kernels:
//!   - `Reference`: plain sequential loops, formulas written as derived.
//!   - `Optimized`: coefficients folded once per call, particles updated
//!     in parallel through rayon.
//!
//! Thread count is an explicit parameter. Nothing here reads process
//! environment.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// Degree of particle-level parallelism for the optimized kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    /// Use rayon's global pool.
    #[default]
    Global,
    /// Use a dedicated pool with this many threads.
    Threads(NonZeroUsize),
}

/// Which implementation of a map to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    #[default]
    Reference,
    Optimized(Parallelism),
}

impl Kernel {
    /// Optimized kernel on the global rayon pool.
    #[must_use]
    pub const fn optimized() -> Self {
        Self::Optimized(Parallelism::Global)
    }

    #[must_use]
    pub const fn is_optimized(&self) -> bool {
        matches!(self, Self::Optimized(_))
    }
}

/// Runs optimized kernels on the configured pool.
#[derive(Clone, Debug, Default)]
pub struct Executor {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Executor {
    /// Build the executor for a kernel choice.
    ///
    /// # Errors
    /// [`KernelError::ThreadPool`] if a dedicated pool cannot be created.
    pub fn new(kernel: Kernel) -> Result<Self, KernelError> {
        let pool = match kernel {
            Kernel::Optimized(Parallelism::Threads(n)) => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n.get())
                    .build()?,
            )),
            _ => None,
        };
        Ok(Self { pool })
    }

    /// Run `op` inside the dedicated pool if there is one.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Threads available to parallel work run through this executor.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |p| p.current_num_threads())
    }
}
