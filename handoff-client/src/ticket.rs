//! Resolve, flag and transfer actions on a loaded ticket.
//!
//! Resolve and flag are optimistic: the local copy flips whatever the
//! backend says, and a failed request only comes back as a warning.

use crate::error::ApiClientError;
use crate::rest::RestClient;
use handoff_core::{
    display_now, HandoffError, OperatorsResponse, RecordKind, SessionStatus, Ticket,
};
use tracing::{info, warn};

/// Result of an optimistic update: the new local value plus the request
/// error, if the backend call failed.
#[derive(Debug)]
pub struct OptimisticUpdate<T> {
    pub value: T,
    pub remote_error: Option<ApiClientError>,
}

impl<T> OptimisticUpdate<T> {
    pub fn is_confirmed(&self) -> bool {
        self.remote_error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct TicketDesk {
    kind: RecordKind,
    ticket: Ticket,
}

impl TicketDesk {
    pub fn new(kind: RecordKind, ticket: Ticket) -> Self {
        Self { kind, ticket }
    }

    pub async fn load(rest: &RestClient, kind: RecordKind, id: &str) -> Result<Self, HandoffError> {
        match rest.get(kind, id).await {
            Ok(detail) => Ok(Self::new(kind, Ticket::from_detail(id, detail))),
            Err(err) => {
                warn!(ticket_id = %id, error = %err, "Failed to load ticket");
                Err(HandoffError::LoadFailed)
            }
        }
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub async fn toggle_resolve_status(
        &mut self,
        rest: &RestClient,
    ) -> OptimisticUpdate<SessionStatus> {
        let remote_error = rest.toggle_resolve(self.kind, &self.ticket.id).await.err();
        if let Some(err) = &remote_error {
            warn!(ticket_id = %self.ticket.id, error = %err, "toggle-resolve request failed");
        }
        let value = self.ticket.toggle_resolved(&display_now());
        info!(ticket_id = %self.ticket.id, status = %value, "Ticket status toggled");
        OptimisticUpdate {
            value,
            remote_error,
        }
    }

    /// Flip the flag on the turn with `turn_id`. The value is whether that
    /// turn matched anything locally.
    pub async fn toggle_message_flag(
        &mut self,
        rest: &RestClient,
        turn_id: &str,
    ) -> OptimisticUpdate<bool> {
        let remote_error = rest
            .flag_turn(self.kind, &self.ticket.id, turn_id)
            .await
            .err();
        if let Some(err) = &remote_error {
            warn!(ticket_id = %self.ticket.id, turn_id = %turn_id, error = %err, "flag request failed");
        }
        let value = self.ticket.conversation.toggle_flag(turn_id);
        OptimisticUpdate {
            value,
            remote_error,
        }
    }

    /// Hand the ticket to another operator.
    ///
    /// `from` is the signed-in operator's email and `to` the target's.
    pub async fn transfer(
        &mut self,
        rest: &RestClient,
        from: Option<&str>,
        to: Option<&str>,
        operators: &OperatorsResponse,
    ) -> Result<String, HandoffError> {
        let to = to
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(HandoffError::NoOperatorSelected)?;
        let from = from
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .ok_or(HandoffError::MissingIdentity)?;

        rest.transfer_ticket(from, to, &self.ticket.id)
            .await
            .map_err(|err| {
                warn!(ticket_id = %self.ticket.id, to = %to, error = %err, "Transfer failed");
                err.into_handoff()
            })?;

        let assignee = operators
            .find_by_email(to)
            .map(|op| op.full_name.clone())
            .unwrap_or_else(|| to.to_string());
        info!(ticket_id = %self.ticket.id, assigned_to = %assignee, "Ticket transferred");
        self.ticket.assigned_to = assignee.clone();
        Ok(assignee)
    }

    /// Record that the operator opened the live chat for this ticket.
    pub fn mark_joined(&mut self) {
        self.ticket.has_joined = true;
    }
}
