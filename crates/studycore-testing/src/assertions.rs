//! Custom assertions for study-orchestration-specific validation,
//! matching the universal invariants of spec.md §8.

use anyhow::{bail, Result};
use studycore_types::Task;

/// I2: at most one of `{is_completed, is_aborted, is_timed_out}` is set.
pub fn assert_at_most_one_terminal(task: &Task) -> Result<()> {
    let terminal_count = [task.is_completed, task.is_aborted, task.is_timed_out].iter().filter(|set| **set).count();
    if terminal_count > 1 {
        bail!("task '{}' has {terminal_count} terminal flags set, expected at most 1 (I2)", task.task_id);
    }
    Ok(())
}

pub fn assert_task_completed(task: &Task) -> Result<()> {
    if !task.is_completed {
        bail!("expected task '{}' to be completed", task.task_id);
    }
    Ok(())
}

pub fn assert_task_timed_out(task: &Task) -> Result<()> {
    if !task.is_timed_out {
        bail!("expected task '{}' to be timed out", task.task_id);
    }
    Ok(())
}

pub fn assert_task_aborted(task: &Task, reason: &str) -> Result<()> {
    if !task.is_aborted {
        bail!("expected task '{}' to be aborted", task.task_id);
    }
    match &task.aborted_reason {
        Some(actual) if actual == reason => Ok(()),
        Some(actual) => bail!("task '{}' aborted with reason '{actual}', expected '{reason}'", task.task_id),
        None => bail!("task '{}' is aborted but has no aborted_reason recorded", task.task_id),
    }
}

/// I4: `task_order` is a contiguous `0..N-1` permutation.
pub fn assert_contiguous_task_order(tasks: &[Task]) -> Result<()> {
    let mut orders: Vec<usize> = tasks.iter().map(|t| t.task_order).collect();
    orders.sort_unstable();
    let expected: Vec<usize> = (0..tasks.len()).collect();
    if orders != expected {
        bail!("task_order values {orders:?} are not a contiguous 0..{} permutation (I4)", tasks.len());
    }
    Ok(())
}
