//! Runs a `CheckoutMachine` as an actor.
//!
//! User actions arrive one at a time over an mpsc channel, so no two
//! transitions ever touch the cart concurrently. When a transition commits
//! to a submission, the network call runs on its own task and its result
//! comes back through the same channel. The actor keeps serving events in
//! the meantime, and any checkout click during that window finds the
//! machine in `Submitting` and is ignored.

use crate::application::checkout::{
    CheckoutMachine, CheckoutSnapshot, CheckoutState, SubmissionTicket, UserAction,
};
use crate::domain::order::OrderConfirmation;
use crate::error::{CheckoutError, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::warn;

const COMMAND_BUFFER: usize = 32;

enum Command {
    Apply {
        action: UserAction,
        reply: oneshot::Sender<Result<CheckoutState>>,
    },
    Snapshot {
        reply: oneshot::Sender<CheckoutSnapshot>,
    },
    SubmissionFinished(Result<OrderConfirmation>),
}

/// A cloneable handle to a running checkout actor.
#[derive(Clone)]
pub struct CheckoutHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<CheckoutSnapshot>,
}

impl CheckoutHandle {
    /// Delivers `action` and returns the state right after its transition.
    ///
    /// A checkout that starts a submission returns `Submitting`; use
    /// `wait_until_settled` to observe the outcome.
    pub async fn apply(&self, action: UserAction) -> Result<CheckoutState> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Apply { action, reply })
            .await
            .map_err(|_| CheckoutError::RuntimeStopped)?;
        response.await.map_err(|_| CheckoutError::RuntimeStopped)?
    }

    pub async fn snapshot(&self) -> Result<CheckoutSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| CheckoutError::RuntimeStopped)?;
        response.await.map_err(|_| CheckoutError::RuntimeStopped)
    }

    /// A live view of the checkout, updated after every transition.
    pub fn subscribe(&self) -> watch::Receiver<CheckoutSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until no submission is in flight.
    pub async fn wait_until_settled(&self) -> Result<CheckoutSnapshot> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|s| s.state != CheckoutState::Submitting)
            .await
            .map_err(|_| CheckoutError::RuntimeStopped)?;
        Ok((*snapshot).clone())
    }
}

/// Spawns the actor. The join handle yields the machine once every handle
/// is dropped and no submission is outstanding.
pub fn spawn(machine: CheckoutMachine) -> (CheckoutHandle, JoinHandle<CheckoutMachine>) {
    let (commands, inbox) = mpsc::channel(COMMAND_BUFFER);
    let (publisher, snapshots) = watch::channel(machine.snapshot());
    let feedback = commands.downgrade();

    let task = tokio::spawn(run(machine, inbox, feedback, publisher));
    (
        CheckoutHandle {
            commands,
            snapshots,
        },
        task,
    )
}

async fn run(
    mut machine: CheckoutMachine,
    mut inbox: mpsc::Receiver<Command>,
    feedback: mpsc::WeakSender<Command>,
    publisher: watch::Sender<CheckoutSnapshot>,
) -> CheckoutMachine {
    while let Some(command) = inbox.recv().await {
        match command {
            Command::Apply { action, reply } => {
                let result = match machine.step(action).await {
                    Ok(Some(ticket)) => {
                        dispatch(&mut machine, ticket, &feedback).await;
                        Ok(machine.state())
                    }
                    Ok(None) => Ok(machine.state()),
                    Err(err) => Err(err),
                };
                // Publish before replying so the caller never sees an older state.
                publisher.send_replace(machine.snapshot());
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(machine.snapshot());
            }
            Command::SubmissionFinished(outcome) => {
                if let Err(err) = machine.complete_submission(outcome).await {
                    warn!(error = %err, "Order submission did not complete");
                }
                publisher.send_replace(machine.snapshot());
            }
        }
    }
    machine
}

async fn dispatch(
    machine: &mut CheckoutMachine,
    ticket: SubmissionTicket,
    feedback: &mpsc::WeakSender<Command>,
) {
    let Some(feedback) = feedback.upgrade() else {
        // No task can report the outcome; settle it here as failed.
        warn!(
            items = ticket.items().len(),
            "Checkout runtime is shutting down, dropping submission"
        );
        let _ = machine
            .complete_submission(Err(CheckoutError::RuntimeStopped))
            .await;
        return;
    };
    let orders = machine.order_service();
    tokio::spawn(async move {
        let outcome = ticket.send(orders.as_ref()).await;
        if feedback
            .send(Command::SubmissionFinished(outcome))
            .await
            .is_err()
        {
            warn!("Checkout runtime stopped before the submission finished");
        }
    });
}
