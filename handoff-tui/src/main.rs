//! Handoff TUI entry point.

use crossterm::{
    event::{self, Event as CrosstermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use handoff_client::{HandoffClient, OperatorChat, SendOutcome, TicketDesk};
use handoff_core::{HandoffError, OperatorIdentity};
use handoff_tui::config::{arg_value, TuiConfig};
use handoff_tui::error::TuiError;
use handoff_tui::events::TuiEvent;
use handoff_tui::keys::{map_key, Action};
use handoff_tui::logging;
use handoff_tui::nav::{Portal, View};
use handoff_tui::notifications::NotificationLevel;
use handoff_tui::persistence;
use handoff_tui::state::{App, EditTarget};
use handoff_tui::views::render_view;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Redirect URI sent with `--auth-code` when `--redirect-uri` is absent.
const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/auth/callback";

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    logging::init(&config.log_path)?;

    let persisted = match persistence::load(&config.persistence_path) {
        Ok(state) => state,
        Err(err) => {
            warn!(error = %err, "Ignoring unreadable UI state");
            None
        }
    };
    let portal = match arg_value("--portal") {
        Some(value) => value.parse::<Portal>().map_err(TuiError::Argument)?,
        None => persisted.as_ref().map(|s| s.portal).unwrap_or_default(),
    };

    let client = HandoffClient::new(&config.client_config(portal))?;
    let mut app = App::new(config, client, portal);
    if let Some(state) = persisted {
        app.restore(state);
    }
    info!(portal = %portal, "Starting portal");

    if let Some(code) = arg_value("--auth-code") {
        authenticate(&mut app, &code).await;
    }

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard {};

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);

    spawn_input_reader(event_tx.clone());
    initialize_app(&mut app, event_tx.clone()).await;

    let tick_rate = Duration::from_millis(app.config.refresh_interval_ms);
    let mut ticker = tokio::time::interval(tick_rate);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                let _ = event_tx.send(TuiEvent::Tick).await;
            }
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, event, &event_tx).await? {
                    break;
                }
            }
        }
    }

    app.user_chat.close();
    if let Err(err) = persistence::save(&app.config.persistence_path, &app.persisted()) {
        warn!(error = %err, "Failed to save UI state");
    }
    info!("Exiting");

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let forwarded = match evt {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        sender.blocking_send(TuiEvent::Input(key))
                    }
                    CrosstermEvent::Resize(width, height) => {
                        sender.blocking_send(TuiEvent::Resize { width, height })
                    }
                    _ => Ok(()),
                };
                if forwarded.is_err() {
                    break;
                }
            }
        }
    });
}

/// Exchange an OAuth code for the operator identity.
async fn authenticate(app: &mut App, code: &str) {
    let redirect_uri =
        arg_value("--redirect-uri").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
    match app.client.rest().authenticate(code, &redirect_uri).await {
        Ok(response) if response.success => {
            if let Some(email) = response.email {
                info!(email = %email, "Operator authenticated");
                app.identity = Some(OperatorIdentity {
                    email,
                    full_name: response.full_name,
                });
                app.notify(NotificationLevel::Success, "Signed in");
            }
        }
        Ok(_) => app.notify(NotificationLevel::Error, "Authentication failed"),
        Err(err) => app.notify(
            NotificationLevel::Error,
            format!("Authentication failed: {}", err.user_message()),
        ),
    }
}

async fn initialize_app(app: &mut App, sender: mpsc::Sender<TuiEvent>) {
    match app.portal {
        Portal::Chat => {
            let result = app
                .user_chat
                .initialize(app.client.rest())
                .await
                .map(str::to_string);
            if let Err(err) = result {
                let _ = sender
                    .send(TuiEvent::ApiError(format!(
                        "Could not start a chat: {}",
                        err.user_message()
                    )))
                    .await;
            }
            app.begin_edit(EditTarget::Message);
        }
        Portal::Admin | Portal::Agent => {
            if let Err(err) = refresh_view(app).await {
                let _ = sender
                    .send(TuiEvent::ApiError(format!("Initial refresh failed: {}", err)))
                    .await;
            }
        }
    }
}

async fn handle_event(
    app: &mut App,
    event: TuiEvent,
    sender: &mpsc::Sender<TuiEvent>,
) -> Result<bool, TuiError> {
    match event {
        TuiEvent::Input(key) => {
            if let Some(action) = map_key(key, app.input_mode()) {
                return handle_action(app, action, sender).await;
            }
        }
        TuiEvent::Socket(socket_event) => app.apply_socket_event(&socket_event),
        TuiEvent::ApiError(message) => app.notify(NotificationLevel::Error, message),
        TuiEvent::Tick => {
            app.on_tick();
            if let Err(err) = app.poll_dashboard(Instant::now()).await {
                warn!(error = %err, "Dashboard poll failed");
                app.notify(
                    NotificationLevel::Warning,
                    format!("Refresh failed: {}", err.user_message()),
                );
            }
        }
        TuiEvent::Resize { .. } => {}
    }
    Ok(false)
}

async fn handle_action(
    app: &mut App,
    action: Action,
    sender: &mpsc::Sender<TuiEvent>,
) -> Result<bool, TuiError> {
    match action {
        Action::Quit => return Ok(true),
        Action::NextTab => app.next_tab(),
        Action::PrevTab => app.prev_tab(),
        Action::MoveDown => app.select_next(),
        Action::MoveUp => app.select_previous(),
        Action::NextOperator => app.cycle_operator(true),
        Action::PrevOperator => app.cycle_operator(false),
        Action::CyclePriority => {
            if app.active_view == View::Dashboard {
                app.cycle_priority();
            }
        }
        Action::OpenSearch => {
            if app.active_view == View::Dashboard {
                app.begin_edit(EditTarget::Search);
            }
        }
        Action::Compose => {
            if matches!(app.active_view, View::OperatorChat | View::UserChat) {
                app.begin_edit(EditTarget::Message);
            }
        }
        Action::Select => match app.active_view {
            View::Dashboard => open_selected(app).await,
            View::OperatorChat | View::UserChat => app.begin_edit(EditTarget::Message),
            View::Detail => {}
        },
        Action::Resolve => resolve(app).await,
        Action::Flag => flag_selected_turn(app).await,
        Action::Transfer => transfer_selected(app).await,
        Action::JoinChat => join_chat(app, sender).await,
        Action::Refresh => {
            if let Err(err) = refresh_view(app).await {
                app.notify(NotificationLevel::Error, format!("Refresh failed: {}", err));
            }
        }
        Action::Back => {
            if let Some(view) = app.go_back() {
                if view == View::Dashboard {
                    if let Err(err) = refresh_view(app).await {
                        app.notify(NotificationLevel::Error, format!("Refresh failed: {}", err));
                    }
                } else if view == View::Detail {
                    reload_detail(app).await;
                }
            }
        }
        Action::InsertChar(c) => app.insert_char(c),
        Action::DeleteChar => app.delete_char(),
        Action::Cancel => app.cancel_edit(),
        Action::Submit => {
            if let Some(text) = app.submit_edit() {
                send_message(app, &text, sender);
            }
        }
    }
    Ok(false)
}

async fn refresh_view(app: &mut App) -> Result<(), TuiError> {
    match app.active_view {
        View::Dashboard => app.refresh_dashboard().await?,
        View::Detail => reload_detail(app).await,
        View::OperatorChat => {
            if let Some(chat) = app.operator_chat.as_mut() {
                chat.load(app.client.rest()).await?;
            }
        }
        View::UserChat => {}
    }
    Ok(())
}

async fn open_selected(app: &mut App) {
    let Some(id) = app.dashboard.selected.clone() else {
        return;
    };
    match TicketDesk::load(app.client.rest(), app.config.record_kind, &id).await {
        Ok(desk) => app.open_detail(desk),
        Err(err) => app.notify(NotificationLevel::Error, err.to_string()),
    }
}

async fn reload_detail(app: &mut App) {
    let Some((kind, id)) = app
        .detail
        .desk
        .as_ref()
        .map(|desk| (desk.kind(), desk.ticket().id.clone()))
    else {
        return;
    };
    match TicketDesk::load(app.client.rest(), kind, &id).await {
        Ok(desk) => app.refresh_detail(desk),
        Err(err) => app.notify(NotificationLevel::Error, err.to_string()),
    }
}

async fn resolve(app: &mut App) {
    match app.active_view {
        View::Detail => {
            let Some(desk) = app.detail.desk.as_mut() else {
                return;
            };
            let update = desk.toggle_resolve_status(app.client.rest()).await;
            let id = desk.ticket().id.clone();
            let assigned_to = desk.ticket().assigned_to.clone();
            app.sync_row(&id, update.value, &assigned_to);
            match update.remote_error {
                Some(err) => app.notify(
                    NotificationLevel::Warning,
                    format!("Marked {} locally; backend update failed: {}", update.value, err.user_message()),
                ),
                None => app.notify(
                    NotificationLevel::Success,
                    format!("Ticket {} marked {}", id, update.value),
                ),
            }
        }
        View::OperatorChat => {
            let Some(chat) = app.operator_chat.as_mut() else {
                return;
            };
            match chat.resolve(app.client.rest()).await {
                Ok(()) => {
                    app.cancel_edit();
                    app.notify(NotificationLevel::Success, "Session resolved");
                }
                Err(err) => app.notify(NotificationLevel::Error, err.to_string()),
            }
        }
        View::Dashboard | View::UserChat => {}
    }
}

async fn flag_selected_turn(app: &mut App) {
    if app.active_view != View::Detail {
        return;
    }
    let Some(turn_id) = app.selected_turn().and_then(|m| m.turn_id.clone()) else {
        app.notify(NotificationLevel::Warning, "Select a turn to flag");
        return;
    };
    let Some(desk) = app.detail.desk.as_mut() else {
        return;
    };
    let update = desk.toggle_message_flag(app.client.rest(), &turn_id).await;
    if let Some(err) = update.remote_error {
        app.notify(
            NotificationLevel::Warning,
            format!("Flag changed locally; backend update failed: {}", err.user_message()),
        );
    }
}

async fn transfer_selected(app: &mut App) {
    if app.active_view != View::Detail {
        return;
    }
    let to = app.selected_operator().map(|op| op.email.clone());
    let from = app.identity.as_ref().map(|me| me.email.clone());
    let operators = app.dashboard.operators.clone();
    let Some(desk) = app.detail.desk.as_mut() else {
        return;
    };
    let result = desk
        .transfer(app.client.rest(), from.as_deref(), to.as_deref(), &operators)
        .await;
    let id = desk.ticket().id.clone();
    let status = desk.ticket().status;
    match result {
        Ok(assignee) => {
            app.sync_row(&id, status, &assignee);
            app.notify(
                NotificationLevel::Success,
                format!("Ticket {} transferred to {}", id, assignee),
            );
        }
        Err(err) => app.notify(NotificationLevel::Error, err.to_string()),
    }
}

async fn join_chat(app: &mut App, sender: &mpsc::Sender<TuiEvent>) {
    if app.active_view != View::Detail || !app.portal.allows(View::OperatorChat) {
        return;
    }
    let Some((kind, id, resolved)) = app.detail.desk.as_ref().map(|desk| {
        (
            desk.kind(),
            desk.ticket().id.clone(),
            desk.ticket().is_resolved(),
        )
    }) else {
        return;
    };
    if resolved {
        app.notify(
            NotificationLevel::Warning,
            HandoffError::Resolved { id }.to_string(),
        );
        return;
    }

    let mut chat = OperatorChat::new(kind, id);
    if let Err(err) = chat.load(app.client.rest()).await {
        app.notify(NotificationLevel::Error, err.to_string());
        return;
    }
    if let Err(err) = chat.join(app.client.ws(), app.client.rest(), sender) {
        app.notify(NotificationLevel::Error, err.to_string());
        return;
    }
    app.open_operator_chat(chat);
}

fn send_message(app: &mut App, text: &str, sender: &mpsc::Sender<TuiEvent>) {
    let result = match app.active_view {
        View::UserChat => app.user_chat.send(text, app.client.ws(), sender),
        View::OperatorChat => match app.operator_chat.as_mut() {
            Some(chat) => chat.send(text),
            None => Err(HandoffError::NotConnected),
        },
        View::Dashboard | View::Detail => return,
    };
    match result {
        Ok(SendOutcome::Ignored) => {}
        Ok(outcome) => debug!(outcome = ?outcome, "Message dispatched"),
        Err(err) => app.notify(NotificationLevel::Error, err.to_string()),
    }
}
