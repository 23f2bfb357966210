use std::collections::HashMap;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use indoc::{formatdoc, indoc};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::Level;

use overlay_wm::controller::{
    Acknowledgement, Confirmation, DialogController, DialogOptions, PopoverController,
    PopoverOptions, RequestId,
};
use overlay_wm::geometry::{CellRect, Placement};
use overlay_wm::kernel::Runtime;
use overlay_wm::modules::{
    DIALOG_MODULE, DialogModule, OVERLAY_MODULE, OverlayModule, POPOVER_MODULE, PopoverModule,
};
use overlay_wm::overlay::{
    EscapeRouter, OverlayCoordinator, OverlayFlags, OverlayId, OverlayLifecycle,
};
use overlay_wm::placement::ArrowOffset;

#[derive(Parser, Debug)]
#[command(
    name = "overlay-demo",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive tour of the overlay coordination layer"
)]
struct DemoCli {
    /// Initial popover placement (bottom, top-start, right-end, ...).
    #[arg(
        short = 'p',
        long = "placement",
        value_name = "PLACEMENT",
        default_value_t = Placement::Bottom
    )]
    placement: Placement,

    /// Cells between the anchor and the popover panel.
    #[arg(long = "gap", value_name = "CELLS", default_value_t = 1)]
    gap: u16,

    /// Draw popovers without the pointing arrow.
    #[arg(long = "no-arrow")]
    no_arrow: bool,

    /// Input poll interval in milliseconds.
    #[arg(long = "tick", value_name = "MILLIS", default_value_t = 33)]
    tick_ms: u64,

    /// Append debug traces to this file instead of staying silent.
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let args = DemoCli::parse();
    init_tracing(args.log_file.as_deref())?;

    let overlay_module = OverlayModule::new();
    let router = overlay_module.router();
    let runtime = Runtime::mount(vec![
        Box::new(overlay_module),
        Box::new(DialogModule::new()),
        Box::new(PopoverModule::new()),
    ])
    .map_err(io::Error::other)?;
    let kernel = runtime.kernel();
    let coordinator = kernel
        .require::<OverlayCoordinator>(OVERLAY_MODULE)
        .map_err(io::Error::other)?
        .clone();
    let dialogs = kernel
        .require::<DialogController>(DIALOG_MODULE)
        .map_err(io::Error::other)?
        .clone();
    let popovers = kernel
        .require::<PopoverController>(POPOVER_MODULE)
        .map_err(io::Error::other)?
        .clone();
    let mut app = DemoApp::new(&args, coordinator, router, dialogs, popovers);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_demo(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));

    terminal.show_cursor()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
    terminal::disable_raw_mode()?;

    result?;
    println!("{}", app.stats.report());
    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> io::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
    Ok(())
}

type DemoTerminal = Terminal<CrosstermBackend<Stdout>>;

fn run_demo(terminal: &mut DemoTerminal, app: &mut DemoApp, tick: Duration) -> io::Result<()> {
    loop {
        app.poll_outcomes();
        app.reconcile_overlays();
        terminal.draw(|frame| app.render(frame))?;

        if !event::poll(tick)? {
            continue;
        }
        let event = event::read()?;
        if app.handle_event(&event) {
            continue;
        }
        if should_quit(&event) {
            return Ok(());
        }
    }
}

fn should_quit(event: &Event) -> bool {
    let Event::Key(key) = event else {
        return false;
    };
    if key.kind != KeyEventKind::Press {
        return false;
    }
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Each open controller request gets one stack registration, keyed by which
/// queue minted it (the queues number their requests independently).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ViewKey {
    Dialog(RequestId),
    Popover(RequestId),
}

#[derive(Default)]
struct SessionStats {
    confirms_opened: usize,
    alerts_opened: usize,
    popovers_opened: usize,
    confirmed: usize,
    cancelled: usize,
    dismissed: usize,
}

impl SessionStats {
    fn report(&self) -> String {
        formatdoc!(
            r#"
            Overlay demo session ended.
            Confirms: {confirms} opened | {confirmed} confirmed, {cancelled} cancelled
            Alerts: {alerts} opened | {dismissed} dismissed
            Popovers: {popovers} opened
            "#,
            confirms = self.confirms_opened,
            confirmed = self.confirmed,
            cancelled = self.cancelled,
            alerts = self.alerts_opened,
            dismissed = self.dismissed,
            popovers = self.popovers_opened,
        )
    }
}

struct DemoApp {
    coordinator: OverlayCoordinator,
    router: EscapeRouter,
    dialogs: DialogController,
    popovers: PopoverController,
    views: HashMap<ViewKey, OverlayLifecycle>,
    placement: Placement,
    gap: u16,
    arrow: bool,
    selected_confirm: bool,
    scroll: u16,
    area: Rect,
    outcome: String,
    pending: Vec<(&'static str, Confirmation)>,
    acks: Vec<Acknowledgement>,
    stats: SessionStats,
}

impl DemoApp {
    fn new(
        cli: &DemoCli,
        coordinator: OverlayCoordinator,
        router: EscapeRouter,
        dialogs: DialogController,
        popovers: PopoverController,
    ) -> Self {
        Self {
            coordinator,
            router,
            dialogs,
            popovers,
            views: HashMap::new(),
            placement: cli.placement,
            gap: cli.gap,
            arrow: !cli.no_arrow,
            selected_confirm: true,
            scroll: 0,
            area: Rect::default(),
            outcome: String::new(),
            pending: Vec::new(),
            acks: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    /// Mirror the controller queues into stack registrations. Runs every
    /// frame; repeat sightings refresh the close handler only.
    fn reconcile_overlays(&mut self) {
        let mut live: Vec<ViewKey> = Vec::new();

        for request in self.dialogs.dialogs() {
            let key = ViewKey::Dialog(request.id);
            live.push(key);
            let view = self
                .views
                .entry(key)
                .or_insert_with(|| OverlayLifecycle::new(&self.coordinator));
            let queue = self.dialogs.clone();
            let options = request.options.clone();
            let id = request.id;
            view.set_on_close(move || {
                // Escape acts like cancel; alerts fall through to their
                // single button so their acknowledgement still settles
                if let Some(cancel) = &options.on_cancel {
                    cancel();
                } else if let Some(confirm) = &options.on_confirm {
                    confirm();
                } else {
                    queue.close(id);
                }
            });
            view.set_open(true);
        }

        for request in self.popovers.popovers() {
            let key = ViewKey::Popover(request.id);
            live.push(key);
            let view = self.views.entry(key).or_insert_with(|| {
                OverlayLifecycle::with_flags(
                    &self.coordinator,
                    OverlayFlags {
                        lock_scroll: false,
                        ..OverlayFlags::default()
                    },
                )
            });
            let queue = self.popovers.clone();
            let id = request.id;
            view.set_on_close(move || queue.close(id));
            view.set_open(true);
        }

        // dropping a closed view unregisters it from the stack
        self.views.retain(|key, _| live.contains(key));
    }

    fn poll_outcomes(&mut self) {
        let stats = &mut self.stats;
        let mut latest = None;
        self.pending.retain(|(label, confirmation)| {
            match confirmation.resolved() {
                Some(accepted) => {
                    let verdict = if accepted {
                        stats.confirmed += 1;
                        "confirmed"
                    } else {
                        stats.cancelled += 1;
                        "cancelled"
                    };
                    latest = Some(format!("{label}: {verdict}"));
                    false
                }
                None => true,
            }
        });
        self.acks.retain(|acknowledgement| {
            if acknowledgement.acknowledged() {
                stats.dismissed += 1;
                latest = Some("alert: dismissed".to_string());
                false
            } else {
                true
            }
        });
        if let Some(outcome) = latest {
            self.outcome = outcome;
        }
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        if self.router.handle_event(event) {
            return true;
        }
        let Event::Key(key) = event else {
            return false;
        };
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if let Some(id) = self.active_dialog() {
            match key.code {
                KeyCode::Tab => {
                    self.selected_confirm = !self.selected_confirm;
                    return true;
                }
                KeyCode::Left => {
                    self.selected_confirm = false;
                    return true;
                }
                KeyCode::Right => {
                    self.selected_confirm = true;
                    return true;
                }
                KeyCode::Enter => {
                    self.activate_dialog_button(id);
                    return true;
                }
                _ => {}
            }
        }
        match key.code {
            KeyCode::Char('d') => {
                self.open_confirm_dialog();
                true
            }
            KeyCode::Char('a') => {
                self.open_alert();
                true
            }
            KeyCode::Char('p') => {
                self.toggle_popover();
                true
            }
            KeyCode::Tab => {
                self.cycle_placement();
                true
            }
            KeyCode::Up => {
                self.scroll_background(true);
                true
            }
            KeyCode::Down => {
                self.scroll_background(false);
                true
            }
            _ => false,
        }
    }

    fn open_confirm_dialog(&mut self) {
        let mut options = DialogOptions::new(
            "Close pane",
            "Close the focused pane? Unsaved output will be lost.",
        );
        options.confirm_label = Some("Close".to_string());
        options.cancel_label = Some("Keep".to_string());
        let confirmation = self.dialogs.confirm(options);
        self.pending.push(("close pane", confirmation));
        self.stats.confirms_opened += 1;
        self.selected_confirm = true;
    }

    fn open_alert(&mut self) {
        let acknowledgement = self
            .dialogs
            .alert(DialogOptions::new("Session saved", "Layout written to disk."));
        self.acks.push(acknowledgement);
        self.stats.alerts_opened += 1;
        self.selected_confirm = true;
    }

    fn toggle_popover(&mut self) {
        if !self.popovers.is_empty() {
            self.popovers.close_all();
            return;
        }
        let anchor = anchor_rect(self.area);
        let mut options = PopoverOptions::new(
            indoc! {"
                Up / Down scroll the log
                Tab cycles placement
                Esc closes
            "},
            CellRect::from(anchor),
        );
        options.placement = self.placement;
        options.gap = self.gap;
        options.arrow = self.arrow;
        self.popovers.open(options);
        self.stats.popovers_opened += 1;
    }

    fn cycle_placement(&mut self) {
        self.placement = self.placement.cycle();
        if !self.popovers.is_empty() {
            self.popovers.close_all();
            self.toggle_popover();
        }
    }

    fn scroll_background(&mut self, up: bool) {
        if self.coordinator.should_lock_scroll() {
            return;
        }
        self.scroll = if up {
            self.scroll.saturating_sub(1)
        } else {
            self.scroll.saturating_add(1).min(60)
        };
    }

    fn active_dialog(&self) -> Option<RequestId> {
        let active = self.coordinator.active()?;
        self.views.iter().find_map(|(key, view)| match key {
            ViewKey::Dialog(id) if view.id() == active => Some(*id),
            _ => None,
        })
    }

    fn view_key_for(&self, overlay: OverlayId) -> Option<ViewKey> {
        self.views
            .iter()
            .find_map(|(key, view)| (view.id() == overlay).then_some(*key))
    }

    fn activate_dialog_button(&mut self, id: RequestId) {
        let Some(request) = self
            .dialogs
            .dialogs()
            .into_iter()
            .find(|request| request.id == id)
        else {
            return;
        };
        let single_button = request.options.on_cancel.is_none();
        let callback = if self.selected_confirm || single_button {
            request.options.on_confirm.clone()
        } else {
            request.options.on_cancel.clone()
        };
        if let Some(callback) = callback {
            callback();
        } else {
            self.dialogs.close(id);
        }
        self.selected_confirm = true;
    }

    fn render(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        self.area = area;
        if area.width == 0 || area.height == 0 {
            return;
        }
        self.render_background(frame, area);
        let active = self.coordinator.active();
        for (slot, info) in self.coordinator.overlays().into_iter().enumerate() {
            match self.view_key_for(info.id) {
                Some(ViewKey::Dialog(id)) => {
                    self.render_dialog(frame, area, id, slot, active == Some(info.id));
                }
                Some(ViewKey::Popover(id)) => self.render_popover(frame, area, id),
                None => {}
            }
        }
        self.render_status(frame, area);
    }

    fn render_background(&self, frame: &mut ratatui::Frame, area: Rect) {
        let block = Block::default().title("overlay-wm demo").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let mut lines: Vec<Line> = vec![
            Line::from("press d for a confirm dialog, a for an alert, p for a popover"),
            Line::from("tab cycles popover placement, up/down scroll this log, q quits"),
            Line::from(""),
        ];
        for n in 1..=64u16 {
            lines.push(Line::from(format!("log entry {n:02}")));
        }
        frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), inner);

        let anchor = anchor_rect(area).intersection(area);
        if anchor.width > 0 {
            frame.render_widget(
                Paragraph::new("[ Menu ]").style(Style::default().fg(Color::Black).bg(Color::Cyan)),
                anchor,
            );
        }
    }

    fn render_dialog(
        &self,
        frame: &mut ratatui::Frame,
        area: Rect,
        id: RequestId,
        slot: usize,
        is_active: bool,
    ) {
        let Some(request) = self
            .dialogs
            .dialogs()
            .into_iter()
            .find(|request| request.id == id)
        else {
            return;
        };
        let options = request.options;
        let width = area.width.min(options.width.unwrap_or(46)).max(1);
        let height = area.height.min(8).max(1);
        let x = area
            .x
            .saturating_add(area.width.saturating_sub(width) / 2)
            .saturating_add((slot as u16).saturating_mul(2));
        let y = area
            .y
            .saturating_add(area.height.saturating_sub(height) / 2)
            .saturating_add(slot as u16);
        let rect = Rect {
            x,
            y,
            width,
            height,
        }
        .intersection(area);
        if rect.width < 4 || rect.height < 4 {
            return;
        }

        frame.render_widget(Clear, rect);
        let border_style = if is_active {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(options.title.as_str())
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        if inner.width == 0 || inner.height < 2 {
            return;
        }

        let body_rect = Rect {
            height: inner.height.saturating_sub(1),
            ..inner
        };
        frame.render_widget(
            Paragraph::new(options.body.as_str()).wrap(Wrap { trim: true }),
            body_rect,
        );

        let button_rect = Rect {
            y: inner.y.saturating_add(inner.height.saturating_sub(1)),
            height: 1,
            ..inner
        };
        let selected = Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD);
        let unselected = Style::default();
        let single_button = options.on_cancel.is_none() && options.cancel_label.is_none();
        let mut spans: Vec<Span> = Vec::new();
        if !single_button {
            let style = if is_active && !self.selected_confirm {
                selected
            } else {
                unselected
            };
            spans.push(Span::styled(
                format!("[ {} ]", options.cancel_label()),
                style,
            ));
            spans.push(Span::raw(" "));
        }
        let style = if is_active && (self.selected_confirm || single_button) {
            selected
        } else {
            unselected
        };
        spans.push(Span::styled(
            format!("[ {} ]", options.confirm_label()),
            style,
        ));
        frame.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Right),
            button_rect,
        );
    }

    fn render_popover(&self, frame: &mut ratatui::Frame, area: Rect, id: RequestId) {
        let Some(request) = self
            .popovers
            .popovers()
            .into_iter()
            .find(|request| request.id == id)
        else {
            return;
        };
        let options = request.options;
        let lines: Vec<&str> = options.content.lines().collect();
        let content_width = lines
            .iter()
            .map(|line| line.chars().count() as u16)
            .max()
            .unwrap_or(0);
        let width = options
            .width
            .unwrap_or(content_width.saturating_add(2))
            .clamp(1, area.width);
        let height = options
            .height
            .unwrap_or((lines.len() as u16).saturating_add(2))
            .clamp(1, area.height);

        let position = options.position(CellRect::new(0, 0, width, height));
        let min_x = i32::from(area.x);
        let max_x = i32::from(area.right().saturating_sub(width)).max(min_x);
        let min_y = i32::from(area.y);
        let max_y = i32::from(area.bottom().saturating_sub(height)).max(min_y);
        let rect = Rect {
            x: position.left.clamp(min_x, max_x) as u16,
            y: position.top.clamp(min_y, max_y) as u16,
            width,
            height,
        };

        frame.render_widget(Clear, rect);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        frame.render_widget(Paragraph::new(options.content.as_str()), inner);

        if let Some(offset) = position.arrow {
            draw_popover_arrow(frame, area, rect, options.placement, offset);
        }
    }

    fn render_status(&self, frame: &mut ratatui::Frame, area: Rect) {
        if area.height == 0 {
            return;
        }
        let active = self
            .coordinator
            .active()
            .map(|id| id.raw().to_string())
            .unwrap_or_else(|| "-".to_string());
        let locked = if self.coordinator.should_lock_scroll() {
            "locked"
        } else {
            "free"
        };
        let text = format!(
            " overlays {} | active {} | scroll {} | placement {} | {}",
            self.coordinator.len(),
            active,
            locked,
            self.placement,
            self.outcome,
        );
        let rect = Rect {
            x: area.x,
            y: area.bottom().saturating_sub(1),
            width: area.width,
            height: 1,
        };
        frame.render_widget(
            Paragraph::new(text).style(Style::default().add_modifier(Modifier::DIM)),
            rect,
        );
    }
}

fn anchor_rect(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(4),
        y: area.y.saturating_add(2),
        width: 8u16.min(area.width.saturating_sub(4)),
        height: 1u16.min(area.height),
    }
}

fn draw_popover_arrow(
    frame: &mut ratatui::Frame,
    area: Rect,
    rect: Rect,
    placement: Placement,
    offset: ArrowOffset,
) {
    let (x, y, glyph): (i32, i32, &str) = match offset {
        ArrowOffset::FromLeft(cells) | ArrowOffset::FromRight(cells) => {
            let x = match offset {
                ArrowOffset::FromLeft(_) => i32::from(rect.x) + i32::from(cells),
                _ => i32::from(rect.right()) - 1 - i32::from(cells),
            };
            match placement {
                Placement::Bottom | Placement::BottomStart | Placement::BottomEnd => {
                    (x, i32::from(rect.y) - 1, "▲")
                }
                _ => (x, i32::from(rect.bottom()), "▼"),
            }
        }
        ArrowOffset::FromTop(cells) | ArrowOffset::FromBottom(cells) => {
            let y = match offset {
                ArrowOffset::FromTop(_) => i32::from(rect.y) + i32::from(cells),
                _ => i32::from(rect.bottom()) - 1 - i32::from(cells),
            };
            match placement {
                Placement::Right | Placement::RightStart | Placement::RightEnd => {
                    (i32::from(rect.x) - 1, y, "◀")
                }
                _ => (i32::from(rect.right()), y, "▶"),
            }
        }
    };
    if x < i32::from(area.x)
        || y < i32::from(area.y)
        || x >= i32::from(area.right())
        || y >= i32::from(area.bottom())
    {
        return;
    }
    if let Some(cell) = frame.buffer_mut().cell_mut((x as u16, y as u16)) {
        cell.set_symbol(glyph);
        cell.set_style(Style::default().fg(Color::Cyan));
    }
}
