//! Backend dispatch boundary.
//!
//! The core only compiles plans; executing them belongs to an external
//! virtualization tool reached through the [`Backend`] trait. The executor
//! here walks a plan in order and applies the hook failure policy: a hook
//! that fails is reported and skipped while the remaining same-phase hooks
//! still run, whereas any other failed operation aborts the run and is
//! surfaced unchanged to the caller.

use crate::plan::ProvisionOp;
use color_eyre::Result;
use log::{info, warn};

/// Execution target for provisioning operations.
///
/// Implementations live outside this crate (libvirt drivers, test doubles);
/// [`LoggingBackend`] ships here for dry runs.
pub trait Backend {
    fn apply(&mut self, op: &ProvisionOp) -> Result<()>;
}

/// Outcome of executing a plan against a backend
#[derive(Debug)]
pub struct ExecutionReport {
    /// Number of operations applied successfully
    pub applied: usize,
    /// Names of hooks that failed and were skipped
    pub failed_hooks: Vec<String>,
}

impl ExecutionReport {
    /// Returns true when every operation, hooks included, succeeded
    pub fn is_clean(&self) -> bool {
        self.failed_hooks.is_empty()
    }
}

/// Apply a plan's operations in order.
///
/// Hook operations are best-effort side actions: each failure is logged and
/// recorded, and execution continues with the next operation. A failure of
/// any non-hook operation stops execution immediately.
pub fn execute_plan(ops: &[ProvisionOp], backend: &mut dyn Backend) -> Result<ExecutionReport> {
    let mut report = ExecutionReport {
        applied: 0,
        failed_hooks: Vec::new(),
    };

    for op in ops {
        match backend.apply(op) {
            Ok(()) => report.applied += 1,
            Err(error) => {
                if let ProvisionOp::RunHook { node, name, .. } = op {
                    warn!("Hook '{}' on node '{}' failed: {:#}", name, node, error);
                    report.failed_hooks.push(name.clone());
                } else {
                    return Err(error);
                }
            }
        }
    }

    if report.failed_hooks.is_empty() {
        info!("Executed {} operation(s)", report.applied);
    } else {
        warn!(
            "Executed {} operation(s), {} hook(s) failed",
            report.applied,
            report.failed_hooks.len()
        );
    }

    Ok(report)
}

/// Backend that logs and records every operation without side effects.
///
/// Used by the CLI's dry-run mode and as a test double.
#[derive(Debug, Default)]
pub struct LoggingBackend {
    pub applied: Vec<ProvisionOp>,
}

impl LoggingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for LoggingBackend {
    fn apply(&mut self, op: &ProvisionOp) -> Result<()> {
        match op {
            ProvisionOp::DefineNode {
                node,
                box_image,
                cpus,
                memory_mb,
            } => info!(
                "define node '{}' (box {}, {} cpus, {} MB)",
                node, box_image, cpus, memory_mb
            ),
            ProvisionOp::AttachInterface {
                node,
                interface,
                mac,
                tunnel,
            } => info!(
                "attach {}:{} mac {} tunnel {}:{} -> {}:{}",
                node,
                interface,
                mac,
                tunnel.local_addr,
                tunnel.local_port,
                tunnel.remote_addr,
                tunnel.remote_port
            ),
            ProvisionOp::EstablishTunnel {
                encapsulation,
                a,
                b,
            } => info!(
                "establish {} tunnel {}:{} <-> {}:{}",
                encapsulation, a.node, a.interface, b.node, b.interface
            ),
            ProvisionOp::RunHook {
                node, name, command, ..
            } => info!("run hook '{}' on '{}': {}", name, node, command),
        }
        self.applied.push(op.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{HookPhase, ProvisionOp};
    use color_eyre::eyre::eyre;

    fn hook(name: &str) -> ProvisionOp {
        ProvisionOp::RunHook {
            node: "sw01".to_string(),
            phase: HookPhase::PreProvision,
            name: name.to_string(),
            command: format!("echo {}", name),
        }
    }

    fn define(node: &str) -> ProvisionOp {
        ProvisionOp::DefineNode {
            node: node.to_string(),
            box_image: "arista/veos".to_string(),
            cpus: 1,
            memory_mb: 1024,
        }
    }

    /// Backend that fails on operations matching a predicate
    struct FailingBackend {
        applied: Vec<ProvisionOp>,
        fail_on: fn(&ProvisionOp) -> bool,
    }

    impl Backend for FailingBackend {
        fn apply(&mut self, op: &ProvisionOp) -> Result<()> {
            if (self.fail_on)(op) {
                return Err(eyre!("backend rejected operation"));
            }
            self.applied.push(op.clone());
            Ok(())
        }
    }

    #[test]
    fn test_logging_backend_records_everything() {
        let ops = vec![define("sw01"), hook("h1")];
        let mut backend = LoggingBackend::new();

        let report = execute_plan(&ops, &mut backend).unwrap();
        assert_eq!(report.applied, 2);
        assert!(report.is_clean());
        assert_eq!(backend.applied, ops);
    }

    #[test]
    fn test_failed_hook_does_not_abort_remaining_hooks() {
        let ops = vec![define("sw01"), hook("h1"), hook("h2"), hook("h3")];
        let mut backend = FailingBackend {
            applied: Vec::new(),
            fail_on: |op| matches!(op, ProvisionOp::RunHook { name, .. } if name == "h2"),
        };

        let report = execute_plan(&ops, &mut backend).unwrap();

        // h2 failed but h3 still ran
        assert_eq!(report.applied, 3);
        assert_eq!(report.failed_hooks, vec!["h2".to_string()]);
        assert!(!report.is_clean());
        assert!(backend
            .applied
            .iter()
            .any(|op| matches!(op, ProvisionOp::RunHook { name, .. } if name == "h3")));
    }

    #[test]
    fn test_non_hook_failure_aborts() {
        let ops = vec![define("sw01"), define("sw02"), hook("h1")];
        let mut backend = FailingBackend {
            applied: Vec::new(),
            fail_on: |op| matches!(op, ProvisionOp::DefineNode { node, .. } if node == "sw02"),
        };

        assert!(execute_plan(&ops, &mut backend).is_err());

        // Nothing past the failing define was attempted
        assert_eq!(backend.applied.len(), 1);
    }
}
