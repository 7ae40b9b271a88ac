//! Dependency ordering for task lists.
use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};

use super::Task;
use crate::error::TaskError;

/// Order `tasks` so every task follows the tasks it depends on.
///
/// Kahn's algorithm, always taking the earliest ready task in list order, so
/// the result equals the input whenever the input already satisfies every
/// dependency. Dependencies on tasks absent from the list (filtered out with
/// `--only`/`--skip`) are ignored.
///
/// # Errors
///
/// Returns [`TaskError::DependencyCycle`] naming the tasks left unordered.
pub fn topo_order<'a>(tasks: &[&'a dyn Task]) -> Result<Vec<&'a dyn Task>, TaskError> {
    let index: HashMap<TypeId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.task_id(), i))
        .collect();

    let mut in_degree = vec![0usize; tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dep in task.dependencies() {
            if let Some(&d) = index.get(dep)
                && let (Some(list), Some(count)) = (dependents.get_mut(d), in_degree.get_mut(i))
            {
                list.push(i);
                *count += 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| i)
        .collect();
    let mut ordered = Vec::with_capacity(tasks.len());

    while let Some(idx) = ready.pop_first() {
        if let Some(&task) = tasks.get(idx) {
            ordered.push(task);
        }
        for &next in dependents.get(idx).map_or(&[][..], Vec::as_slice) {
            if let Some(count) = in_degree.get_mut(next) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(next);
                }
            }
        }
    }

    if ordered.len() == tasks.len() {
        Ok(ordered)
    } else {
        let stuck: Vec<&str> = tasks
            .iter()
            .zip(&in_degree)
            .filter(|&(_, &d)| d > 0)
            .map(|(t, _)| t.name())
            .collect();
        Err(TaskError::DependencyCycle(stuck.join(", ")))
    }
}
