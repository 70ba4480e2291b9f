//! Rendering — everything drawn from the coordinator's state.
//!
//! ```text
//!  ┌ header: title · position · favorite mark ─────────────────────┐
//!  │ viewer: animation, document link, music credit, play gate     │
//!  └ keys bar ─────────────────────────────────────────────────────┘
//!    + at most one overlay (about | favorites | share) on top
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use ethereal_core::coordinator::{AboutView, Coordinator, Phase};
use ethereal_core::credits::CreditLookup;

use crate::surfaces::Viewport;
use crate::theme::{
    style_default, style_link, style_muted, style_overlay_border, style_panel_border,
    style_secondary, style_title, C_ACCENT, C_ERROR, C_FAVORITE, C_PLAYING, C_SEPARATOR,
};

pub const PLAY_GATE_TEXT: &str = "press any key to start";

pub struct Areas {
    pub header: Rect,
    pub viewer: Rect,
    pub keys: Rect,
}

pub fn layout(area: Rect) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    Areas {
        header: rows[0],
        viewer: rows[1],
        keys: rows[2],
    }
}

pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}

// ── Phases ────────────────────────────────────────────────────────────────────

pub fn draw_loading(frame: &mut Frame, area: Rect) {
    let text = Paragraph::new(Line::from(Span::styled(
        "loading catalog…",
        style_secondary(),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(text, centered_rect(60, 1, area));
}

pub fn draw_failed(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_ERROR))
        .title(Span::styled(" catalog unavailable ", style_title()));
    let body = Paragraph::new(vec![
        Line::from(Span::styled(message.to_string(), style_default())),
        Line::from(""),
        Line::from(Span::styled("q quit", style_muted())),
    ])
    .wrap(Wrap { trim: true })
    .block(block);
    frame.render_widget(body, centered_rect(70, 7, area));
}

// ── Main view ─────────────────────────────────────────────────────────────────

pub fn draw_header(frame: &mut Frame, area: Rect, coordinator: &Coordinator) {
    let total = coordinator.catalog().map_or(0, |c| c.len());
    let mut spans = vec![
        Span::styled(" ethereal ", Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled("│ ", Style::default().fg(C_SEPARATOR)),
    ];
    if total > 0 {
        spans.push(Span::styled(
            format!("{} / {}", coordinator.index() + 1, total),
            style_secondary(),
        ));
    }
    if coordinator.is_favorited() {
        spans.push(Span::styled("  ★", Style::default().fg(C_FAVORITE)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn draw_viewer(
    frame: &mut Frame,
    area: Rect,
    coordinator: &Coordinator,
    viewport: Option<&Viewport>,
) {
    let title = coordinator.current().unwrap_or("");
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style_panel_border())
        .title(Span::styled(format!(" {} ", title), style_title()));

    let mut lines = Vec::new();
    match viewport {
        Some(v) if v.available => lines.push(Line::from(Span::styled(v.url.clone(), style_link()))),
        Some(v) => lines.push(Line::from(Span::styled(
            format!("document missing: {}", v.content_path),
            Style::default().fg(C_ERROR),
        ))),
        None => {}
    }
    lines.push(Line::from(""));

    let credit = coordinator.current_credit();
    let music_style = if coordinator.music_ready() && coordinator.has_interacted() {
        Style::default().fg(C_PLAYING)
    } else {
        style_secondary()
    };
    lines.push(Line::from(vec![
        Span::styled("♪ ", music_style),
        Span::styled(credit.text(), style_secondary()),
    ]));
    if coordinator.is_hidden() {
        lines.push(Line::from(Span::styled("paused while unfocused", style_muted())));
    }

    if !coordinator.has_interacted() {
        lines.push(Line::from(""));
        lines.push(
            Line::from(Span::styled(
                PLAY_GATE_TEXT,
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        );
    }

    let body = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(body, area);
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, coordinator: &Coordinator, favorite_key: char) {
    let keys = format!(
        " ↑↓/jk or drag  r random  {} {}  a about  v favorites  s share  q quit",
        favorite_key,
        coordinator.favorite_label()
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(keys, style_muted()))),
        area,
    );
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn overlay_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(style_overlay_border())
        .title(Span::styled(format!(" {} ", title), style_title()))
        .title_bottom(Line::from(Span::styled(" esc close ", style_muted())))
}

pub fn draw_about(frame: &mut Frame, area: Rect, about: &AboutView) {
    let popup = centered_rect(64, 8, area);
    frame.render_widget(Clear, popup);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(" file   ", style_muted()),
            Span::styled(about.filename.clone(), style_default()),
        ]),
        Line::from(vec![
            Span::styled(" music  ", style_muted()),
            Span::styled(about.credit.text(), style_default()),
        ]),
    ];
    if let CreditLookup::Found { url, .. } = &about.credit {
        lines.push(Line::from(vec![
            Span::styled(" link   ", style_muted()),
            Span::styled(url.clone(), style_link()),
        ]));
    }

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(overlay_block("about"));
    frame.render_widget(body, popup);
}

pub fn draw_share(frame: &mut Frame, area: Rect, link: &str) {
    let popup = centered_rect(70, 6, area);
    frame.render_widget(Clear, popup);
    let body = Paragraph::new(vec![
        Line::from(Span::styled(" copy this link:", style_secondary())),
        Line::from(""),
        Line::from(Span::styled(format!(" {}", link), style_link())),
    ])
    .wrap(Wrap { trim: false })
    .block(overlay_block("share"));
    frame.render_widget(body, popup);
}

/// Draw whatever the current phase calls for, minus overlays and toasts.
pub fn draw_base(
    frame: &mut Frame,
    coordinator: &Coordinator,
    viewport: Option<&Viewport>,
    favorite_key: char,
) -> Areas {
    let areas = layout(frame.area());
    match coordinator.phase() {
        Phase::Loading => draw_loading(frame, areas.viewer),
        Phase::Failed(message) => draw_failed(frame, areas.viewer, message),
        Phase::Ready => {
            draw_header(frame, areas.header, coordinator);
            draw_viewer(frame, areas.viewer, coordinator, viewport);
            draw_keys_bar(frame, areas.keys, coordinator, favorite_key);
        }
    }
    areas
}
