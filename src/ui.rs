use crate::app::{init, update, AppMsg, Effect};
use crate::config::{AppConfig, PageParams};
use crate::i18n::Msg;
use crate::model::{LazyOptions, SelectOption};
use crate::services::admin_client::{AdminClient, ApiError};
use crate::services::host::{CommandHost, FormHost, NoopHost};
use crate::services::loader;
use crate::widgets::form::{build_field_form, F_REF_ENTITY, F_TYPE};
use crate::widgets::form_widget::FormWidget;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

const TICK_RATE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    pub expires_at_tick: u64,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Options(Vec<SelectOption>),
    Created(String),
}

#[derive(Debug, Clone, Copy)]
pub enum LoadKind {
    RefEntities,
    Classifications,
    SubmitField,
}

/// Result of a background request, posted back to the UI loop.
pub struct LoadMsg {
    pub kind: LoadKind,
    pub outcome: Result<LoadOutcome, ApiError>,
}

pub struct AppState {
    pub(crate) config: AppConfig,
    pub(crate) page: PageParams,
    pub(crate) form: FormWidget,
    pub(crate) ref_entities: LazyOptions,
    pub(crate) classifications: LazyOptions,
    pub(crate) tick: u64,
    pub(crate) status_text: Option<String>,
    pub(crate) toast: Option<Toast>,
    pub(crate) show_debug: bool,
    // Debug log (rendered in bottom debug pane)
    pub(crate) debug_log: VecDeque<String>,
    // Set when the form hands off to the field detail page
    pub(crate) exit_url: Option<String>,
    pub(crate) should_quit: bool,
    client: Option<Arc<AdminClient>>,
    host: Box<dyn FormHost>,
    tx: Option<Sender<LoadMsg>>,
    rx: Option<Receiver<LoadMsg>>,
}

impl AppState {
    pub(crate) fn new(config: AppConfig, page: PageParams) -> Self {
        let form = FormWidget::new(build_field_form(config.lang));
        Self {
            config,
            page,
            form,
            ref_entities: LazyOptions::Unloaded,
            classifications: LazyOptions::Unloaded,
            tick: 0,
            status_text: None,
            toast: None,
            show_debug: false,
            debug_log: VecDeque::new(),
            exit_url: None,
            should_quit: false,
            client: None,
            host: Box::new(NoopHost),
            tx: None,
            rx: None,
        }
    }

    pub fn dbg(&mut self, msg: impl Into<String>) {
        const MAX_LOG_LINES: usize = 200;
        if self.debug_log.len() >= MAX_LOG_LINES {
            self.debug_log.pop_front();
        }
        let msg = msg.into();
        tracing::debug!(target: "field_new::ui", "{msg}");
        self.debug_log.push_back(msg);
    }

    fn connect(&mut self, client: AdminClient, host: Box<dyn FormHost>) {
        let (tx, rx) = mpsc::channel::<LoadMsg>();
        self.client = Some(Arc::new(client));
        self.host = host;
        self.tx = Some(tx);
        self.rx = Some(rx);
    }
}

pub(crate) fn run_effects(state: &mut AppState, effects: Vec<Effect>) {
    let lang = state.config.lang;
    for eff in effects {
        match eff {
            Effect::ResizeHost => {
                if let Err(e) = state.host.resize() {
                    state.dbg(format!("resize hook: {e:#}"));
                }
            }
            Effect::LoadRefEntities => {
                state.dbg("GET entity list");
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    loader::spawn_load_entities(client.clone(), lang, tx.clone());
                }
            }
            Effect::LoadClassifications => {
                state.dbg("GET classification list");
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    loader::spawn_load_classifications(client.clone(), lang, tx.clone());
                }
            }
            Effect::SubmitField(draft) => {
                state.dbg("POST field-new");
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    loader::spawn_submit_field(client.clone(), draft, tx.clone());
                }
            }
            Effect::ShowToast {
                text,
                level,
                seconds,
            } => {
                let ticks = seconds.saturating_mul(5); // ~200ms tick
                let exp = state.tick.saturating_add(ticks);
                state.toast = Some(Toast {
                    text,
                    level,
                    expires_at_tick: exp,
                });
            }
            Effect::RefreshFieldList => {
                if let Err(e) = state.host.load_fields() {
                    state.dbg(format!("load_fields hook: {e:#}"));
                }
            }
            Effect::AddToLayout { field_id } => {
                if let Err(e) = state.host.add_to_layout(&field_id) {
                    state.dbg(format!("add_to_layout hook: {e:#}"));
                }
            }
            Effect::Navigate { url } => {
                state.dbg(format!("navigate {url}"));
                if let Err(e) = state.host.navigate(&url) {
                    state.dbg(format!("navigate hook: {e:#}"));
                }
                state.exit_url = Some(url);
                state.should_quit = true;
            }
        }
    }
}

/// Feeds finished background requests back through `update`.
fn pump_loads(state: &mut AppState) {
    let mut drained: Vec<LoadMsg> = Vec::new();
    if let Some(rx) = &state.rx {
        while let Ok(msg) = rx.try_recv() {
            drained.push(msg);
        }
    }
    for msg in drained {
        let app_msg = match msg.kind {
            LoadKind::RefEntities => AppMsg::LoadedRefEntities(msg.outcome),
            LoadKind::Classifications => AppMsg::LoadedClassifications(msg.outcome),
            LoadKind::SubmitField => AppMsg::LoadedSubmit(msg.outcome),
        };
        let effects = update(state, app_msg);
        run_effects(state, effects);
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

pub fn run(cfg: AppConfig, page: PageParams) -> Result<()> {
    let client = AdminClient::new(&cfg).context("building http client")?;
    let host = CommandHost::new(cfg.hooks.clone(), page.entity.clone(), cfg.open_browser);
    let mut state = AppState::new(cfg, page);
    state.connect(client, Box::new(host));
    let effects = init(&mut state);
    run_effects(&mut state, effects);

    // Headless smoke mode
    if env_flag("FIELD_NEW_HEADLESS") {
        let ticks: u64 = std::env::var("FIELD_NEW_TICKS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);
        let backend = ratatui::backend::TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend)?;
        for _ in 0..ticks {
            terminal.draw(|f| ui(f, &mut state))?;
            pump_loads(&mut state);
            state.tick = state.tick.wrapping_add(1);
            std::thread::sleep(TICK_RATE);
        }
        let summary = serde_json::json!({
            "entity": state.page.entity,
            "type": state.form.form.text(F_TYPE),
            "ref_entities_loaded": state.ref_entities.is_loaded(),
            "classifications_loaded": state.classifications.is_loaded(),
            "ref_entity_options": state.form.form.options(F_REF_ENTITY).len(),
            "debug": state.debug_log.iter().collect::<Vec<_>>(),
        });
        println!("{summary}");
        return Ok(());
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let res = event_loop(&mut terminal, &mut state);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res?;
    if let Some(url) = &state.exit_url {
        println!("{url}");
    }
    Ok(())
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, state: &mut AppState) -> Result<()> {
    let mut last_tick = Instant::now();
    while !state.should_quit {
        terminal.draw(|f| ui(f, state))?;
        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(state, key.code, key.modifiers);
                }
            }
        }
        pump_loads(state);
        if last_tick.elapsed() >= TICK_RATE {
            state.tick = state.tick.wrapping_add(1);
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn handle_key(state: &mut AppState, code: KeyCode, mods: KeyModifiers) {
    if code == KeyCode::Char('q') && mods.contains(KeyModifiers::CONTROL) {
        state.should_quit = true;
        return;
    }
    if code == KeyCode::F(12) {
        state.show_debug = !state.show_debug;
        return;
    }
    if code == KeyCode::Esc && !state.form.form.editing {
        state.should_quit = true;
        return;
    }
    if let Some(msg) = state.form.on_key(code, mods) {
        let effects = update(state, msg);
        run_effects(state, effects);
    }
}

fn ui(f: &mut Frame, state: &mut AppState) {
    // Clear expired toast
    if let Some(t) = &state.toast {
        if state.tick >= t.expires_at_tick {
            state.toast = None;
        }
    }
    let mut constraints = vec![Constraint::Min(5)];
    if state.show_debug {
        constraints.push(Constraint::Length(8));
    }
    constraints.push(Constraint::Length(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());
    let tick = state.tick;
    state.form.render(f, chunks[0], true, tick);
    if state.show_debug {
        draw_debug(f, chunks[1], state);
    }
    let help = format!(
        "↑↓ move • Enter edit • ←→ change • Ctrl+S {} • F12 debug • Esc quit",
        state.config.lang.text(Msg::Save)
    );
    crate::widgets::status_bar::draw_footer(f, chunks[chunks.len() - 1], state, &help);
}

fn draw_debug(f: &mut Frame, area: Rect, state: &AppState) {
    let h = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .debug_log
        .iter()
        .rev()
        .take(h)
        .rev()
        .map(|l| Line::from(l.as_str()))
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Debug")
        .border_style(crate::theme::border_unfocused());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc as StdArc, Mutex};

    #[derive(Default)]
    struct Calls(Vec<String>);

    struct RecordingHost(StdArc<Mutex<Calls>>);

    impl FormHost for RecordingHost {
        fn resize(&mut self) -> Result<()> {
            self.0.lock().unwrap().0.push("resize".into());
            Ok(())
        }
        fn load_fields(&mut self) -> Result<()> {
            self.0.lock().unwrap().0.push("load_fields".into());
            Ok(())
        }
        fn add_to_layout(&mut self, field_id: &str) -> Result<()> {
            self.0.lock().unwrap().0.push(format!("add_to_layout:{field_id}"));
            Ok(())
        }
        fn navigate(&mut self, url: &str) -> Result<()> {
            self.0.lock().unwrap().0.push(format!("navigate:{url}"));
            Ok(())
        }
    }

    fn recording_state() -> (AppState, StdArc<Mutex<Calls>>) {
        let calls = StdArc::new(Mutex::new(Calls::default()));
        let mut st = AppState::new(
            AppConfig::default(),
            PageParams {
                entity: "Account".into(),
                design_type: None,
            },
        );
        st.host = Box::new(RecordingHost(calls.clone()));
        (st, calls)
    }

    #[test]
    fn host_effects_reach_host_in_order() {
        let (mut st, calls) = recording_state();
        run_effects(
            &mut st,
            vec![
                Effect::ResizeHost,
                Effect::RefreshFieldList,
                Effect::AddToLayout {
                    field_id: "f1".into(),
                },
            ],
        );
        assert_eq!(
            calls.lock().unwrap().0,
            vec!["resize", "load_fields", "add_to_layout:f1"]
        );
        assert!(!st.should_quit);
    }

    #[test]
    fn navigate_records_exit_url_and_quits() {
        let (mut st, calls) = recording_state();
        run_effects(
            &mut st,
            vec![Effect::Navigate {
                url: "http://x/admin/entity/Account/field/f1".into(),
            }],
        );
        assert!(st.should_quit);
        assert_eq!(
            st.exit_url.as_deref(),
            Some("http://x/admin/entity/Account/field/f1")
        );
        assert_eq!(calls.lock().unwrap().0.len(), 1);
    }

    #[test]
    fn toast_expires_after_its_ticks() {
        let (mut st, _) = recording_state();
        run_effects(
            &mut st,
            vec![Effect::ShowToast {
                text: "hi".into(),
                level: ToastLevel::Success,
                seconds: 1,
            }],
        );
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| ui(f, &mut st)).unwrap();
        assert!(st.toast.is_some());
        st.tick = 5;
        terminal.draw(|f| ui(f, &mut st)).unwrap();
        assert!(st.toast.is_none());
    }

    #[test]
    fn esc_quits_only_when_not_editing() {
        let (mut st, _) = recording_state();
        handle_key(&mut st, KeyCode::Enter, KeyModifiers::NONE);
        assert!(st.form.form.editing);
        handle_key(&mut st, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!st.should_quit);
        handle_key(&mut st, KeyCode::Esc, KeyModifiers::NONE);
        assert!(st.should_quit);
    }
}
