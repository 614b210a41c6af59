use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use super::input::ScanBuffer;
use super::{Layer, dispatch, visible_layers};
use crate::services::ImageFrame;
use crate::spa::{App, ScreenKind, Surface};

const FRAME_TIME: Duration = Duration::from_millis(16);

/// Take over the terminal and run the kiosk until the user quits
pub async fn run_terminal(
    app: &App,
    surface: &Surface,
    frames: &UnboundedSender<ImageFrame>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app, surface, frames).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &App,
    surface: &Surface,
    frames: &UnboundedSender<ImageFrame>,
) -> Result<()> {
    let mut scan_buffer = ScanBuffer::new();

    loop {
        let frame_start = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                let action = scan_buffer.handle_key(key);
                if !dispatch(app, frames, action) {
                    return Ok(());
                }
            }
        }

        let layers = visible_layers(surface);
        terminal.draw(|frame| draw(frame, &layers, scan_buffer.pending()))?;

        // Yielding here is what lets navigation and scan tasks make progress
        let elapsed = frame_start.elapsed();
        tokio::time::sleep(FRAME_TIME.saturating_sub(elapsed)).await;
    }
}

fn draw(frame: &mut Frame, layers: &[Layer], pending_scan: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    for layer in layers {
        match layer.kind {
            ScreenKind::Page => draw_page(frame, layer, chunks[0]),
            ScreenKind::Overlay => draw_popup(frame, layer, centered_rect(60, 50, chunks[0]), None),
            ScreenKind::Loading => draw_popup(
                frame,
                layer,
                centered_rect(40, 25, chunks[0]),
                Some("Loading..."),
            ),
        }
    }

    let status = if pending_scan.is_empty() {
        "Scan a check-in code  ←/→ history  Esc quit".to_string()
    } else {
        format!("Scanning: {}", pending_scan)
    };
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );
}

fn draw_page(frame: &mut Frame, layer: &Layer, area: Rect) {
    let mut lines = layer.lines.iter();
    let title = lines.next().cloned().unwrap_or_default();
    let body: Vec<Line> = lines.map(|l| Line::from(l.as_str())).collect();

    let paragraph = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_popup(frame: &mut Frame, layer: &Layer, area: Rect, fallback: Option<&str>) {
    let mut lines: Vec<Line> = layer.lines.iter().map(|l| Line::from(l.as_str())).collect();
    if lines.is_empty() {
        if let Some(text) = fallback {
            lines.push(Line::from(text));
        }
    }

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
