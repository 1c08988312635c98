// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Task Registry
//!
//! Maps `(task id, backend)` to the entry point the runtime invokes.
//!
//! A registry is assembled once through [`TaskRegistry::builder`], which
//! rejects duplicate task ids, and is read-only afterwards. [`register_tasks`]
//! builds the crate's own tasks into a process-wide instance on first call.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::OnceLock;

use tracing::debug;

use crate::{
    Backend, BackendAvailability, BinaryOpError, BinaryOpTask, RegistryError, TaskContext, TaskId,
};

/// Uniform entry-point signature.
pub type VariantFn = for<'a> fn(TaskContext<'a>) -> Result<(), BinaryOpError>;

/// Entry points of one task. The single-threaded variant is mandatory.
#[derive(Debug, Clone, Copy)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub name: &'static str,
    pub cpu: VariantFn,
    pub omp: Option<VariantFn>,
    pub gpu: Option<VariantFn>,
}

impl TaskRecord {
    /// Entry point for `backend`, if this task provides one.
    pub fn variant(&self, backend: Backend) -> Option<VariantFn> {
        match backend {
            Backend::Cpu => Some(self.cpu),
            Backend::Omp => self.omp,
            Backend::Gpu => self.gpu,
        }
    }
}

/// Frozen task table.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, TaskRecord>,
}

impl TaskRegistry {
    pub fn builder() -> TaskRegistryBuilder {
        TaskRegistryBuilder::default()
    }

    pub fn get(&self, task_id: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(&task_id)
    }

    /// Exact `(task id, backend)` lookup.
    pub fn lookup(&self, task_id: TaskId, backend: Backend) -> Option<VariantFn> {
        self.get(task_id)?.variant(backend)
    }

    /// Preferred entry point for what the runtime has enabled.
    ///
    /// Falls back GPU, then multithreaded, then single-threaded, skipping
    /// variants the task does not provide.
    pub fn select(
        &self,
        task_id: TaskId,
        available: &BackendAvailability,
    ) -> Option<(Backend, VariantFn)> {
        let record = self.get(task_id)?;
        let preferred = Backend::select(available);
        [Backend::Gpu, Backend::Omp, Backend::Cpu]
            .into_iter()
            .skip_while(|&b| b != preferred)
            .filter(|&b| match b {
                Backend::Gpu => available.gpu,
                Backend::Omp => available.multithreading,
                Backend::Cpu => true,
            })
            .find_map(|b| record.variant(b).map(|f| (b, f)))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Records in task-id order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.values()
    }
}

/// Collects records before freezing them into a [`TaskRegistry`].
#[derive(Debug, Default)]
pub struct TaskRegistryBuilder {
    tasks: BTreeMap<TaskId, TaskRecord>,
}

impl TaskRegistryBuilder {
    pub fn register(mut self, record: TaskRecord) -> Result<Self, RegistryError> {
        match self.tasks.entry(record.task_id) {
            Entry::Occupied(existing) => Err(RegistryError::DuplicateTask {
                task_id: record.task_id,
                name: existing.get().name,
            }),
            Entry::Vacant(slot) => {
                debug!(task_id = record.task_id, name = record.name, "registered task");
                slot.insert(record);
                Ok(self)
            }
        }
    }

    pub fn build(self) -> TaskRegistry {
        TaskRegistry { tasks: self.tasks }
    }
}

static REGISTRY: OnceLock<TaskRegistry> = OnceLock::new();

/// Registers this crate's tasks into the process-wide registry and returns it.
///
/// Idempotent. Later calls return the instance built by the first.
pub fn register_tasks() -> Result<&'static TaskRegistry, RegistryError> {
    if let Some(registry) = REGISTRY.get() {
        return Ok(registry);
    }
    let registry = TaskRegistry::builder()
        .register(BinaryOpTask::record())?
        .build();
    Ok(REGISTRY.get_or_init(|| registry))
}
