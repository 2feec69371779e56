// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the live preview and captured photos using Unicode half-block
//! characters for improved vertical resolution. Every key press becomes an
//! [`Intent`] for the controller; what is drawn follows the controller's
//! visible controls.

use crate::app::{AppContext, Control, Intent, UiController, UiState};
use crate::backends::camera::{CameraFrame, FacingMode};
use crate::constants::{app_info, storage, timing};
use crate::errors::AppResult;
use crate::storage::{PhotoKey, ShellCache};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{info, warn};

const FALLBACK_HELP: &str =
    "o: Open camera | p/space: Take photo | r: Retake | f: Flip | h: Toggle help | q/Ctrl+C: Quit";

/// Run the terminal UI until the user quits
pub async fn run(mut ctx: AppContext, mirror_preview: bool) -> AppResult<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut ctx, mirror_preview).await;

    ctx.controller.teardown().await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Dispatch(Intent),
    ToggleHelp,
    Quit,
}

/// Map a key press to an action
pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyAction::Quit);
    }
    match key.code {
        KeyCode::Char('q') => Some(KeyAction::Quit),
        KeyCode::Char('o') => Some(KeyAction::Dispatch(Intent::OpenCamera)),
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(KeyAction::Dispatch(Intent::TakePhoto)),
        KeyCode::Char('r') => Some(KeyAction::Dispatch(Intent::RetakePhoto)),
        KeyCode::Char('f') => Some(KeyAction::Dispatch(Intent::FlipCamera)),
        KeyCode::Char('h') => Some(KeyAction::ToggleHelp),
        _ => None,
    }
}

/// Decoded photo on display
struct DisplayedPhoto {
    key: PhotoKey,
    frame: CameraFrame,
}

struct View {
    help: Option<String>,
    photo: Option<DisplayedPhoto>,
    busy: Option<&'static str>,
    mirror_preview: bool,
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ctx: &mut AppContext,
    mirror_preview: bool,
) -> AppResult<()> {
    let mut view = View {
        help: None,
        photo: None,
        busy: None,
        mirror_preview,
    };

    loop {
        refresh_photo(&mut view, &ctx.controller);
        terminal.draw(|f| draw(f, &ctx.controller, &view))?;

        // Handle input with timeout for frame updates
        if !event::poll(timing::UI_POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Notices block input until dismissed
        if ctx.controller.notice().is_some() {
            ctx.controller.take_notice();
            continue;
        }

        match key_action(&key) {
            Some(KeyAction::Quit) => break,
            Some(KeyAction::ToggleHelp) => {
                view.help = match view.help {
                    Some(_) => None,
                    None => Some(load_help(ctx.shell.as_ref()).await),
                };
            }
            Some(KeyAction::Dispatch(intent)) => {
                view.help = None;
                if !ctx.controller.state().accepts(intent) {
                    continue;
                }
                if matches!(
                    intent,
                    Intent::OpenCamera | Intent::RetakePhoto | Intent::FlipCamera
                ) {
                    view.busy = Some("Opening camera...");
                    terminal.draw(|f| draw(f, &ctx.controller, &view))?;
                }
                let quit = dispatch_watching_quit(&mut ctx.controller, intent).await?;
                view.busy = None;
                if quit {
                    break;
                }
            }
            None => {}
        }
    }

    info!("Terminal UI closed");
    Ok(())
}

/// Run an intent while still reading keys, so a quit can abort a pending open
///
/// Returns whether the user asked to quit. Other keys pressed meanwhile are
/// dropped.
async fn dispatch_watching_quit(
    controller: &mut UiController,
    intent: Intent,
) -> AppResult<bool> {
    let abort = controller.camera().abort_handle();
    let dispatch = controller.dispatch(intent);
    tokio::pin!(dispatch);

    let mut quit = false;
    loop {
        tokio::select! {
            () = &mut dispatch => return Ok(quit),
            () = tokio::time::sleep(timing::UI_POLL_INTERVAL), if !quit => {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()?
                        && key.kind == KeyEventKind::Press
                        && key_action(&key) == Some(KeyAction::Quit)
                    {
                        info!(?intent, "Quit requested, aborting camera open");
                        abort.abort();
                        quit = true;
                        break;
                    }
                }
            }
        }
    }
}

async fn load_help(shell: Option<&ShellCache>) -> String {
    let Some(shell) = shell else {
        return FALLBACK_HELP.to_string();
    };
    let help = match shell.fetch_text(storage::HELP_RESOURCE).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Help text unavailable");
            FALLBACK_HELP.to_string()
        }
    };
    match shell.fetch_text(storage::ABOUT_RESOURCE).await {
        Ok(about) => format!(
            "{}\n{}\nVersion {}",
            help.trim_end(),
            about.trim_end(),
            app_info::version()
        ),
        Err(_) => help,
    }
}

/// Decode the controller's last photo when it changes
fn refresh_photo(view: &mut View, controller: &UiController) {
    let Some(photo) = controller.last_photo() else {
        return;
    };
    if view.photo.as_ref().is_some_and(|shown| shown.key == photo.key) {
        return;
    }
    match image::load_from_memory(&photo.image) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            view.photo = Some(DisplayedPhoto {
                key: photo.key,
                frame: CameraFrame::from_rgba(width, height, rgba.into_raw()),
            });
        }
        Err(e) => warn!(key = %photo.key, error = %e, "Failed to decode photo for display"),
    }
}

fn draw(f: &mut Frame, controller: &UiController, view: &View) {
    let area = f.area();
    let controls = controller.visible_controls();

    // Top line: gallery, bottom line: status
    let gallery_area = Rect::new(area.x, area.y, area.width, 1);
    let main_area = Rect::new(
        area.x,
        area.y + 1,
        area.width,
        area.height.saturating_sub(2),
    );
    let status_area = Rect::new(area.x, area.height.saturating_sub(1), area.width, 1);

    if controls.contains(Control::Gallery) {
        let gallery = controller.gallery();
        let latest = gallery.last().map(|e| e.key.as_str()).unwrap_or_default();
        let text = format!("Gallery ({}) | latest: {}", gallery.len(), latest);
        f.render_widget(StatusBar { message: &text, bg: Color::Black }, gallery_area);
    }

    if controls.contains(Control::LivePreview) {
        let mirror = view.mirror_preview && controller.camera().facing_mode() == FacingMode::User;
        let frame = controller.camera().preview_frame();
        f.render_widget(
            FrameWidget {
                frame: frame.as_ref(),
                mirror,
                placeholder: "Waiting for camera...",
            },
            main_area,
        );
    } else if controls.contains(Control::PhotoDisplay) {
        f.render_widget(
            FrameWidget {
                frame: view.photo.as_ref().map(|p| &p.frame),
                mirror: false,
                placeholder: "Processing photo...",
            },
            main_area,
        );
    } else {
        f.render_widget(
            FrameWidget {
                frame: None,
                mirror: false,
                placeholder: "Press 'o' to open the camera",
            },
            main_area,
        );
    }

    let status = view
        .busy
        .map(str::to_string)
        .unwrap_or_else(|| build_status_message(controller));
    f.render_widget(StatusBar { message: &status, bg: Color::DarkGray }, status_area);

    if let Some(help) = &view.help {
        draw_overlay(f, main_area, "Help", help);
    }
    if let Some(notice) = controller.notice() {
        let text = format!("{}\n\nPress any key to continue.", notice);
        draw_overlay(f, main_area, "Notice", &text);
    }
}

fn draw_overlay(f: &mut Frame, area: Rect, title: &str, text: &str) {
    let width = area.width.min(64);
    let lines = text.lines().count() as u16 + 2;
    let height = lines.min(area.height);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(text.to_string())
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(title.to_string())),
        popup,
    );
}

/// Key hints for the controls currently visible
fn build_status_message(controller: &UiController) -> String {
    let mut parts: Vec<String> = controller
        .visible_controls()
        .iter()
        .filter_map(|control| match control {
            Control::OpenCamera => Some("'o' open camera"),
            Control::TakePhoto => Some("'p' take photo"),
            Control::FlipCamera => Some("'f' flip"),
            Control::RetakePhoto => Some("'r' retake"),
            Control::LivePreview | Control::PhotoDisplay | Control::Gallery => None,
        })
        .map(str::to_string)
        .collect();

    if controller.state() == UiState::CameraActive
        && let Some(session) = controller.camera().session()
    {
        parts.insert(
            0,
            format!("{} {}", session.facing_mode, session.negotiated_resolution),
        );
    }
    parts.push("'h' help".to_string());
    parts.push("'q' quit".to_string());
    parts.join(" | ")
}

/// Widget that renders a frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
    mirror: bool,
    placeholder: &'a str,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            let x = area.x + (area.width.saturating_sub(self.placeholder.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, self.placeholder, Style::default());
            }
            return;
        };

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let column = if self.mirror {
                    display_width - 1 - tx
                } else {
                    tx
                };
                let src_x = (column as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let [r, g, b, _] = frame.pixel(x.min(frame.width - 1), y.min(frame.height - 1));
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    bg: Color,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(self.bg);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(self.bg),
        );
    }
}
