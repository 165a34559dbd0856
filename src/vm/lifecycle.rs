//! Drive the VM into the `running` state.
//!
//! ## State handling
//!
//! ```text
//! absent        → NotExist
//! shut off      → start (→ resume if it lands paused)
//! paused        → resume
//! running       → nothing to do
//! in shutdown   → wait for shut off, then start      (ShutdownTimeout)
//! crashed       → destroy, then start
//! dying         → wait for crashed | shut off, then as above (DieTimeout)
//! pmsuspended   → resume
//! anything else → UnexpectedState
//! ```
//!
//! Exactly one branch runs per call. Waits are level-triggered: every probe
//! re-queries the live state. After the branch the state is queried once
//! more, and success is only reported when the VM says `running`.

use tracing::{info, warn};

use crate::error::{FailureCode, LaunchError};
use crate::notify::{Notification, Notifier};
use crate::vm::VmState;
use crate::vm::hypervisor::Hypervisor;
use crate::vm::poll::PollPolicy;

/// Bring `vm` to `running` or fail with the reason it could not be.
///
/// `policy` bounds the shutdown and dying waits.
pub async fn ensure_running<H, N>(
    hypervisor: &H,
    notifier: &N,
    vm: &str,
    policy: PollPolicy,
) -> Result<(), LaunchError>
where
    H: Hypervisor,
    N: Notifier,
{
    let state = hypervisor.query_state(vm).await?;
    info!(vm, %state, "VM state");

    match state {
        VmState::Absent => return Err(FailureCode::NotExist.into()),
        VmState::Running => {}
        VmState::ShutOff => {
            notifier.notify(&Notification::info(format!("Booting {vm}.")));
            start(hypervisor, vm).await?;
            // Some domains are defined to start paused.
            if hypervisor.domain_state(vm).await? == VmState::Paused {
                resume(hypervisor, vm).await?;
            }
        }
        VmState::Paused => {
            notifier.notify(&Notification::info(format!("Resuming {vm}.")));
            resume(hypervisor, vm).await?;
        }
        VmState::ShuttingDown => {
            notifier.notify(&Notification::info(format!(
                "{vm} is shutting down. It will be restarted once it has stopped."
            )));
            match wait_for(hypervisor, vm, policy, |s| *s == VmState::ShutOff).await? {
                Some(_) => start(hypervisor, vm).await?,
                None => return Err(FailureCode::ShutdownTimeout.into()),
            }
        }
        VmState::Crashed => {
            notifier.notify(&Notification::info(format!(
                "{vm} has crashed. Forcing it off and restarting."
            )));
            destroy_and_start(hypervisor, vm).await?;
        }
        VmState::Dying => {
            notifier.notify(&Notification::info(format!(
                "{vm} is being torn down. It will be restarted once that finishes."
            )));
            let settled = wait_for(hypervisor, vm, policy, |s| {
                matches!(s, VmState::Crashed | VmState::ShutOff)
            })
            .await?;
            match settled {
                Some(VmState::Crashed) => destroy_and_start(hypervisor, vm).await?,
                Some(_) => start(hypervisor, vm).await?,
                None => return Err(FailureCode::DieTimeout.into()),
            }
        }
        VmState::Suspended => {
            notifier.notify(&Notification::info(format!("Waking {vm} from suspend.")));
            resume(hypervisor, vm).await?;
        }
        VmState::Other(_) => {
            warn!(vm, %state, "no rule for VM state");
            return Err(FailureCode::UnexpectedState(state).into());
        }
    }

    let settled = hypervisor.domain_state(vm).await?;
    if settled.is_running() {
        info!(vm, "VM is running");
        Ok(())
    } else {
        warn!(vm, state = %settled, "VM did not reach running");
        Err(FailureCode::UnexpectedState(settled).into())
    }
}

/// Poll until `accept` matches the live state or the budget runs out.
async fn wait_for<H: Hypervisor>(
    hypervisor: &H,
    vm: &str,
    policy: PollPolicy,
    accept: fn(&VmState) -> bool,
) -> Result<Option<VmState>, LaunchError> {
    let settled = policy
        .run(|elapsed| async move {
            let state = hypervisor.query_state(vm).await?;
            info!(
                vm,
                %state,
                elapsed_secs = elapsed.as_secs(),
                max_attempts = policy.max_attempts(),
                "waiting for VM to settle"
            );
            Ok::<_, LaunchError>(accept(&state).then_some(state))
        })
        .await?;
    Ok(settled)
}

async fn start<H: Hypervisor>(hypervisor: &H, vm: &str) -> Result<(), FailureCode> {
    hypervisor.start(vm).await.map_err(|e| {
        warn!(vm, error = %e, "start rejected");
        FailureCode::FailStart
    })
}

async fn resume<H: Hypervisor>(hypervisor: &H, vm: &str) -> Result<(), FailureCode> {
    hypervisor.resume(vm).await.map_err(|e| {
        warn!(vm, error = %e, "resume rejected");
        FailureCode::FailResume
    })
}

async fn destroy_and_start<H: Hypervisor>(hypervisor: &H, vm: &str) -> Result<(), FailureCode> {
    hypervisor.destroy(vm).await.map_err(|e| {
        warn!(vm, error = %e, "destroy rejected");
        FailureCode::FailDestroy
    })?;
    start(hypervisor, vm).await
}
