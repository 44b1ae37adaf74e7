// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application callbacks around steps and execution.
//!
//! Callbacks are an owned bundle handed to the lifecycle manager rather
//! than process-global registrations; dropping the manager drops them.
//! Registration is rejected when the same function is registered twice
//! for the same hook.

use partcraft_core::{Part, ProjectInfo, StepInfo};
use thiserror::Error;

/// Callback invoked before and after each executed step.
pub type StepCallback = fn(&StepInfo);

/// Callback invoked at the start and end of an execution context.
pub type ExecutionCallback = fn(&ProjectInfo, &[Part]);

#[derive(Debug, Error)]
#[error("callback registration error: the callback function is already registered")]
pub struct CallbackRegistration;

/// The set of callbacks observed during a lifecycle run.
#[derive(Debug, Default)]
pub struct Callbacks {
    pre_step: Vec<StepCallback>,
    post_step: Vec<StepCallback>,
    prologue: Vec<ExecutionCallback>,
    epilogue: Vec<ExecutionCallback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function called before every executed step.
    pub fn register_pre_step(&mut self, callback: StepCallback) -> Result<(), CallbackRegistration> {
        register_step(&mut self.pre_step, callback)
    }

    /// Register a function called after every executed step.
    pub fn register_post_step(
        &mut self,
        callback: StepCallback,
    ) -> Result<(), CallbackRegistration> {
        register_step(&mut self.post_step, callback)
    }

    /// Register a function called when an execution context starts.
    pub fn register_prologue(
        &mut self,
        callback: ExecutionCallback,
    ) -> Result<(), CallbackRegistration> {
        register_execution(&mut self.prologue, callback)
    }

    /// Register a function called when an execution context ends.
    pub fn register_epilogue(
        &mut self,
        callback: ExecutionCallback,
    ) -> Result<(), CallbackRegistration> {
        register_execution(&mut self.epilogue, callback)
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.pre_step.clear();
        self.post_step.clear();
        self.prologue.clear();
        self.epilogue.clear();
    }

    pub fn run_pre_step(&self, step_info: &StepInfo) {
        for callback in &self.pre_step {
            callback(step_info);
        }
    }

    pub fn run_post_step(&self, step_info: &StepInfo) {
        for callback in &self.post_step {
            callback(step_info);
        }
    }

    pub fn run_prologue(&self, project_info: &ProjectInfo, parts: &[Part]) {
        for callback in &self.prologue {
            callback(project_info, parts);
        }
    }

    pub fn run_epilogue(&self, project_info: &ProjectInfo, parts: &[Part]) {
        for callback in &self.epilogue {
            callback(project_info, parts);
        }
    }
}

fn register_step(
    registered: &mut Vec<StepCallback>,
    callback: StepCallback,
) -> Result<(), CallbackRegistration> {
    if registered.iter().any(|&r| std::ptr::fn_addr_eq(r, callback)) {
        return Err(CallbackRegistration);
    }
    registered.push(callback);
    Ok(())
}

fn register_execution(
    registered: &mut Vec<ExecutionCallback>,
    callback: ExecutionCallback,
) -> Result<(), CallbackRegistration> {
    if registered.iter().any(|&r| std::ptr::fn_addr_eq(r, callback)) {
        return Err(CallbackRegistration);
    }
    registered.push(callback);
    Ok(())
}

#[cfg(test)]
#[path = "callbacks_tests.rs"]
mod tests;
