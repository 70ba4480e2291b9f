//! FavoritesPage — centered popup listing saved animations.
//!
//! Owns only its cursor; the list itself is re-read from the favorites store
//! on every key and every frame, so removals re-render immediately.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use ethereal_core::favorites::FavoriteEntry;
use ethereal_core::intent::Intent;

use crate::theme::{
    style_default, style_muted, style_overlay_border, style_secondary, style_selected, style_title,
    C_FAVORITE,
};
use crate::ui::centered_rect;

pub const EMPTY_TEXT: &str = "No favorites yet.";

#[derive(Debug, Default)]
pub struct FavoritesPage {
    cursor: usize,
}

impl FavoritesPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Keys while the page is open.  Everything is consumed.
    pub fn handle_key(&mut self, key: KeyEvent, entries: &[FavoriteEntry]) -> Vec<Intent> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        self.clamp(entries.len());
        match key.code {
            KeyCode::Esc => vec![Intent::HideFavorites],
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                vec![]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < entries.len() {
                    self.cursor += 1;
                }
                vec![]
            }
            KeyCode::Enter => match entries.get(self.cursor) {
                Some(entry) => vec![Intent::GoTo(entry.animation.clone()), Intent::HideFavorites],
                None => vec![],
            },
            KeyCode::Char('x') | KeyCode::Delete => match entries.get(self.cursor) {
                Some(entry) => {
                    let intents = vec![Intent::RemoveFavorite(entry.animation.clone())];
                    self.clamp(entries.len() - 1);
                    intents
                }
                None => vec![],
            },
            _ => vec![],
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, entries: &[FavoriteEntry]) {
        let popup = centered_rect(56, 20, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_overlay_border())
            .title(Span::styled(" favorites ", style_title()))
            .title_bottom(Line::from(Span::styled(
                " ↑↓ select  enter open  x remove  esc close ",
                style_muted(),
            )));

        if entries.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(EMPTY_TEXT, style_secondary())))
                .block(block);
            frame.render_widget(empty, popup);
            return;
        }

        self.clamp(entries.len());
        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| {
                let preview = if entry.screenshot.is_some() {
                    Span::styled("▣ ", ratatui::style::Style::default().fg(C_FAVORITE))
                } else {
                    Span::styled("□ ", style_muted())
                };
                ListItem::new(Line::from(vec![
                    preview,
                    Span::styled(entry.animation.clone(), style_default()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(style_selected())
            .highlight_symbol("› ");
        let mut state = ListState::default().with_selected(Some(self.cursor));
        frame.render_stateful_widget(list, popup, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn entries(names: &[&str]) -> Vec<FavoriteEntry> {
        names
            .iter()
            .map(|n| FavoriteEntry {
                animation: n.to_string(),
                screenshot: None,
            })
            .collect()
    }

    #[test]
    fn enter_opens_selected_and_closes() {
        let list = entries(&["a", "b", "c"]);
        let mut page = FavoritesPage::new();
        page.handle_key(key(KeyCode::Down), &list);
        page.handle_key(key(KeyCode::Down), &list);
        page.handle_key(key(KeyCode::Down), &list);
        assert_eq!(page.cursor(), 2);
        assert_eq!(
            page.handle_key(key(KeyCode::Enter), &list),
            vec![Intent::GoTo("c".into()), Intent::HideFavorites]
        );
    }

    #[test]
    fn remove_keeps_cursor_in_range() {
        let list = entries(&["a", "b"]);
        let mut page = FavoritesPage::new();
        page.handle_key(key(KeyCode::Down), &list);
        assert_eq!(
            page.handle_key(key(KeyCode::Char('x')), &list),
            vec![Intent::RemoveFavorite("b".into())]
        );
        assert_eq!(page.cursor(), 0);
    }

    #[test]
    fn empty_list_ignores_selection_keys() {
        let mut page = FavoritesPage::new();
        assert!(page.handle_key(key(KeyCode::Enter), &[]).is_empty());
        assert!(page.handle_key(key(KeyCode::Delete), &[]).is_empty());
        assert_eq!(page.handle_key(key(KeyCode::Esc), &[]), vec![Intent::HideFavorites]);
    }
}
