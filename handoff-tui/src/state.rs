//! Application state and view state definitions.

use crate::config::TuiConfig;
use crate::keys::InputMode;
use crate::nav::{Portal, View};
use crate::notifications::{Notification, NotificationLevel};
use crate::persistence::PersistedState;
use crate::theme::Theme;
use handoff_client::{
    ApiClientError, ConnectionState, HandoffClient, OperatorChat, SocketEvent, SocketUpdate,
    TicketDesk, UserChat,
};
use handoff_core::dashboard::rows_from_summaries;
use handoff_core::{
    DashboardFilter, DashboardRow, DashboardStats, DashboardTab, Message, Operator,
    OperatorIdentity, OperatorsResponse, SessionId, SessionStatus,
};
use std::time::{Duration, Instant};
use tracing::debug;

/// Notifications kept for the footer; older ones are dropped on tick.
const MAX_NOTIFICATIONS: usize = 50;

const ADMIN_TABS: &[DashboardTab] = &[DashboardTab::Active, DashboardTab::Resolved];

#[derive(Debug, Clone, Default)]
pub struct DashboardViewState {
    pub rows: Vec<DashboardRow>,
    pub filter: DashboardFilter,
    pub selected: Option<SessionId>,
    pub operators: OperatorsResponse,
    pub stats: DashboardStats,
}

#[derive(Debug, Clone, Default)]
pub struct DetailViewState {
    pub desk: Option<TicketDesk>,
    pub selected_turn: Option<usize>,
    pub selected_operator: Option<usize>,
}

/// What the text field is currently editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Search,
    Message,
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    pub target: Option<EditTarget>,
    pub buffer: String,
}

pub struct App {
    pub config: TuiConfig,
    pub theme: Theme,
    pub client: HandoffClient,
    pub portal: Portal,
    pub active_view: View,
    pub identity: Option<OperatorIdentity>,

    pub dashboard: DashboardViewState,
    pub detail: DetailViewState,
    pub operator_chat: Option<OperatorChat>,
    pub user_chat: UserChat,

    pub composer: Composer,
    pub notifications: Vec<Notification>,
    /// Last time the dashboard list was fetched, by poll or by hand.
    pub dashboard_fetched_at: Instant,
}

impl App {
    pub fn new(config: TuiConfig, client: HandoffClient, portal: Portal) -> Self {
        let theme = Theme::by_name(&config.theme.name);
        let identity = config.identity();
        let user_chat = UserChat::new(config.record_kind);
        Self {
            config,
            theme,
            client,
            portal,
            active_view: portal.home_view(),
            identity,
            dashboard: DashboardViewState::default(),
            detail: DetailViewState::default(),
            operator_chat: None,
            user_chat,
            composer: Composer::default(),
            notifications: Vec::new(),
            dashboard_fetched_at: Instant::now(),
        }
    }

    /// Apply state saved by a previous run. A configured operator wins over
    /// a persisted one.
    pub fn restore(&mut self, state: PersistedState) {
        if state.portal == self.portal && self.tabs().contains(&state.tab) {
            self.dashboard.filter.tab = state.tab;
        }
        if self.identity.is_none() {
            self.identity = state.identity;
        }
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            portal: self.portal,
            tab: self.dashboard.filter.tab,
            identity: self.identity.clone(),
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    pub fn on_tick(&mut self) {
        let excess = self.notifications.len().saturating_sub(MAX_NOTIFICATIONS);
        if excess > 0 {
            self.notifications.drain(..excess);
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.composer.target.is_some() {
            InputMode::Editing
        } else {
            InputMode::Normal
        }
    }

    // ------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------

    pub fn tabs(&self) -> &'static [DashboardTab] {
        if self.portal.has_assigned_tab() {
            DashboardTab::all()
        } else {
            ADMIN_TABS
        }
    }

    pub fn next_tab(&mut self) {
        self.shift_tab(1);
    }

    pub fn prev_tab(&mut self) {
        let len = self.tabs().len();
        self.shift_tab(len.saturating_sub(1));
    }

    fn shift_tab(&mut self, step: usize) {
        let tabs = self.tabs();
        let index = tabs
            .iter()
            .position(|tab| *tab == self.dashboard.filter.tab)
            .unwrap_or(0);
        self.dashboard.filter.tab = tabs[(index + step) % tabs.len()];
        self.clamp_selection();
    }

    pub fn cycle_priority(&mut self) {
        self.dashboard.filter.cycle_priority();
        self.clamp_selection();
    }

    /// Fetch the ticket list and the operator roster.
    pub async fn refresh_dashboard(&mut self) -> Result<(), ApiClientError> {
        self.dashboard_fetched_at = Instant::now();
        let summaries = self.client.rest().list(self.config.record_kind).await?;
        self.set_rows(rows_from_summaries(&summaries));
        let operators = self.client.rest().list_operators().await?;
        self.set_operators(operators);
        Ok(())
    }

    /// Re-fetch the dashboard if it is on screen and the poll interval has
    /// passed since the last fetch. Returns whether a fetch ran.
    pub async fn poll_dashboard(&mut self, now: Instant) -> Result<bool, ApiClientError> {
        let interval = Duration::from_millis(self.config.dashboard_poll_ms);
        let due = now.saturating_duration_since(self.dashboard_fetched_at) >= interval;
        if self.active_view != View::Dashboard || !due {
            return Ok(false);
        }
        debug!(portal = %self.portal, "Polling dashboard");
        self.refresh_dashboard().await?;
        Ok(true)
    }

    pub fn visible_rows(&self) -> Vec<&DashboardRow> {
        self.dashboard
            .filter
            .apply(&self.dashboard.rows, self.identity.as_ref())
    }

    pub fn selected_row(&self) -> Option<&DashboardRow> {
        let selected = self.dashboard.selected.as_deref()?;
        self.dashboard.rows.iter().find(|row| row.id == selected)
    }

    pub fn set_rows(&mut self, rows: Vec<DashboardRow>) {
        self.dashboard.rows = rows;
        self.recompute_stats();
        self.clamp_selection();
    }

    pub fn set_operators(&mut self, operators: OperatorsResponse) {
        self.dashboard.operators = operators;
        let count = self.dashboard.operators.operators.len();
        if self.detail.selected_operator.is_some_and(|i| i >= count) {
            self.detail.selected_operator = None;
        }
        self.recompute_stats();
    }

    fn recompute_stats(&mut self) {
        self.dashboard.stats = DashboardStats::compute(
            &self.dashboard.rows,
            &self.dashboard.operators,
            self.identity.as_ref(),
        );
    }

    /// Keep the selection on a visible row, falling back to the first one.
    fn clamp_selection(&mut self) {
        let visible: Vec<SessionId> = self.visible_rows().iter().map(|r| r.id.clone()).collect();
        let keep = self
            .dashboard
            .selected
            .as_ref()
            .is_some_and(|id| visible.contains(id));
        if !keep {
            self.dashboard.selected = visible.into_iter().next();
        }
    }

    /// Mirror a local ticket change into the dashboard row.
    pub fn sync_row(&mut self, id: &str, status: SessionStatus, assigned_to: &str) {
        if let Some(row) = self.dashboard.rows.iter_mut().find(|row| row.id == id) {
            row.status = status;
            row.assigned_to = assigned_to.to_string();
        }
        self.recompute_stats();
        self.clamp_selection();
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn select_next(&mut self) {
        match self.active_view {
            View::Dashboard => {
                let ids: Vec<SessionId> =
                    self.visible_rows().iter().map(|r| r.id.clone()).collect();
                select_next_id(&ids, &mut self.dashboard.selected);
            }
            View::Detail => {
                let len = self.detail_turn_count();
                self.detail.selected_turn = next_index(self.detail.selected_turn, len);
            }
            View::OperatorChat | View::UserChat => {}
        }
    }

    pub fn select_previous(&mut self) {
        match self.active_view {
            View::Dashboard => {
                let ids: Vec<SessionId> =
                    self.visible_rows().iter().map(|r| r.id.clone()).collect();
                select_prev_id(&ids, &mut self.dashboard.selected);
            }
            View::Detail => {
                let len = self.detail_turn_count();
                self.detail.selected_turn = prev_index(self.detail.selected_turn, len);
            }
            View::OperatorChat | View::UserChat => {}
        }
    }

    fn detail_turn_count(&self) -> usize {
        self.detail
            .desk
            .as_ref()
            .map(|desk| desk.ticket().conversation.len())
            .unwrap_or(0)
    }

    pub fn selected_turn(&self) -> Option<&Message> {
        let index = self.detail.selected_turn?;
        self.detail.desk.as_ref()?.ticket().conversation.get(index)
    }

    pub fn cycle_operator(&mut self, forward: bool) {
        let len = self.dashboard.operators.operators.len();
        self.detail.selected_operator = if forward {
            next_index(self.detail.selected_operator, len)
        } else {
            prev_index(self.detail.selected_operator, len)
        };
    }

    pub fn selected_operator(&self) -> Option<&Operator> {
        let index = self.detail.selected_operator?;
        self.dashboard.operators.operators.get(index)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn open_detail(&mut self, desk: TicketDesk) {
        self.detail.desk = Some(desk);
        self.detail.selected_turn = None;
        self.active_view = View::Detail;
    }

    /// Swap in a freshly loaded copy of the ticket on screen. The selected
    /// turn and whether the operator already joined its chat carry over.
    pub fn refresh_detail(&mut self, mut desk: TicketDesk) {
        let joined = self.detail.desk.as_ref().is_some_and(|current| {
            current.ticket().id == desk.ticket().id && current.ticket().has_joined
        });
        if joined {
            desk.mark_joined();
        }
        let turns = desk.ticket().conversation.len();
        self.detail.selected_turn = self.detail.selected_turn.filter(|&i| i < turns);
        self.detail.desk = Some(desk);
    }

    pub fn open_operator_chat(&mut self, chat: OperatorChat) {
        if let Some(desk) = self.detail.desk.as_mut() {
            desk.mark_joined();
        }
        self.operator_chat = Some(chat);
        self.active_view = View::OperatorChat;
    }

    /// Leave the current view. Returns the view now shown, if it changed.
    ///
    /// Leaving the live chat drops its socket handle, which closes the
    /// connection.
    pub fn go_back(&mut self) -> Option<View> {
        let previous = self.active_view.back()?;
        match self.active_view {
            View::OperatorChat => self.operator_chat = None,
            View::Detail => self.detail.desk = None,
            View::Dashboard | View::UserChat => {}
        }
        self.composer = Composer::default();
        self.active_view = previous;
        Some(previous)
    }

    /// Resolved/Active badge for the ticket on screen.
    pub fn status_badge(&self) -> Option<SessionStatus> {
        match self.active_view {
            View::Detail => self.detail.desk.as_ref().map(|desk| desk.ticket().status),
            View::OperatorChat => self
                .operator_chat
                .as_ref()
                .map(|chat| SessionStatus::from_resolved(chat.is_resolved())),
            View::Dashboard | View::UserChat => None,
        }
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        match self.active_view {
            View::UserChat => Some(self.user_chat.state()),
            View::OperatorChat => self.operator_chat.as_ref().map(|chat| chat.state()),
            View::Dashboard | View::Detail => None,
        }
    }

    // ------------------------------------------------------------------
    // Text input
    // ------------------------------------------------------------------

    pub fn begin_edit(&mut self, target: EditTarget) {
        if target == EditTarget::Search {
            self.composer.buffer = self.dashboard.filter.query.clone();
        } else if self.composer.target == Some(EditTarget::Search) {
            self.composer.buffer.clear();
        }
        self.composer.target = Some(target);
    }

    pub fn insert_char(&mut self, c: char) {
        self.composer.buffer.push(c);
        self.sync_search();
    }

    pub fn delete_char(&mut self) {
        self.composer.buffer.pop();
        self.sync_search();
    }

    /// Leave editing; a message draft is kept for later.
    pub fn cancel_edit(&mut self) {
        if self.composer.target == Some(EditTarget::Search) {
            self.composer.buffer.clear();
        }
        self.composer.target = None;
    }

    /// Finish the current edit. Returns the message text to send, leaving
    /// the composer open for the next one.
    pub fn submit_edit(&mut self) -> Option<String> {
        match self.composer.target? {
            EditTarget::Search => {
                self.cancel_edit();
                None
            }
            EditTarget::Message => Some(std::mem::take(&mut self.composer.buffer)),
        }
    }

    fn sync_search(&mut self) {
        if self.composer.target == Some(EditTarget::Search) {
            self.dashboard.filter.query = self.composer.buffer.clone();
            self.clamp_selection();
        }
    }

    // ------------------------------------------------------------------
    // Sockets
    // ------------------------------------------------------------------

    /// Route a socket update to the chat that owns it and surface notable
    /// lifecycle changes. Updates from a socket no open chat holds, such as
    /// one left behind by [`App::go_back`], are dropped.
    pub fn apply_socket_event(&mut self, update: &SocketUpdate) {
        let owner = match self.portal {
            Portal::Chat => self.user_chat.owns(update.socket),
            Portal::Admin | Portal::Agent => self
                .operator_chat
                .as_ref()
                .is_some_and(|chat| chat.owns(update.socket)),
        };
        if !owner {
            debug!(
                socket = %update.socket,
                session_id = %update.session_id,
                "Ignoring stale socket event"
            );
            return;
        }
        let event = &update.event;
        match self.portal {
            Portal::Chat => self.user_chat.apply(event),
            Portal::Admin | Portal::Agent => {
                if let Some(chat) = self.operator_chat.as_mut() {
                    chat.apply(event);
                }
            }
        }
        match event {
            SocketEvent::OverrideEnabled => {
                self.notify(NotificationLevel::Success, "Override enabled");
            }
            SocketEvent::OverrideFailed(reason) => self.notify(
                NotificationLevel::Warning,
                format!("Override request failed: {}", reason),
            ),
            SocketEvent::Error { message } => self.notify(
                NotificationLevel::Error,
                format!("Connection error: {}", message),
            ),
            SocketEvent::Closed { .. } => {
                self.notify(NotificationLevel::Info, "Connection closed");
            }
            SocketEvent::Opened { .. } | SocketEvent::Frame(_) => {}
        }
    }
}

fn select_next_id(ids: &[SessionId], selected: &mut Option<SessionId>) {
    let index = selected
        .as_ref()
        .and_then(|id| ids.iter().position(|candidate| candidate == id));
    *selected = next_index(index, ids.len()).map(|i| ids[i].clone());
}

fn select_prev_id(ids: &[SessionId], selected: &mut Option<SessionId>) {
    let index = selected
        .as_ref()
        .and_then(|id| ids.iter().position(|candidate| candidate == id));
    *selected = prev_index(index, ids.len()).map(|i| ids[i].clone());
}

fn next_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(index) => (index + 1) % len,
        None => 0,
    })
}

fn prev_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(0) | None => len - 1,
        Some(index) => (index - 1).min(len - 1),
    })
}
