//! Wallet picker dialog.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    action::Action,
    domain::{modal::ModalState, wallet::WalletInfo},
    tui::Frame,
};

use super::{Component, centered_rect};

const POPUP_WIDTH: u16 = 56;

pub struct WalletModalComponent {
    action_tx: UnboundedSender<Action>,
    pub modal: ModalState,
    pub wallets: Vec<WalletInfo>,
    pub selected_index: usize,
    pub connected: Option<usize>,
}

impl WalletModalComponent {
    pub fn new(action_tx: UnboundedSender<Action>, wallets: Vec<WalletInfo>) -> Self {
        Self {
            action_tx,
            modal: ModalState::new(),
            wallets,
            selected_index: 0,
            connected: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.modal.is_open()
    }

    pub fn open(&mut self) {
        self.modal.open();
    }

    pub fn close(&mut self) {
        self.modal.close();
    }

    /// Index of the connected wallet, if any. Enables "Disconnect Session".
    pub fn set_connected(&mut self, index: Option<usize>) {
        self.connected = index;
    }

    fn select_next(&mut self) {
        if !self.wallets.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.wallets.len();
        }
    }

    fn select_prev(&mut self) {
        if !self.wallets.is_empty() {
            self.selected_index = self
                .selected_index
                .checked_sub(1)
                .unwrap_or(self.wallets.len() - 1);
        }
    }

    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        wallets: &[WalletInfo],
        selected_index: usize,
        connected: Option<usize>,
    ) {
        let list_height = wallets.len().max(1) as u16 + 2;
        let footer_height = if connected.is_some() { 4 } else { 3 };
        let popup = centered_rect(POPUP_WIDTH, list_height + footer_height + 2, area);
        f.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Connect a Wallet ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::vertical([
            Constraint::Length(list_height),
            Constraint::Min(0),
        ])
        .split(inner);

        if wallets.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from(Span::styled(
                    "No keypair wallets found.",
                    Style::default().fg(Color::Red),
                )),
                Line::from(Span::styled(
                    "Pass --keypair <file> to add one.",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .block(Block::default().borders(Borders::BOTTOM));
            f.render_widget(empty, chunks[0]);
        } else {
            let items: Vec<ListItem> = wallets
                .iter()
                .enumerate()
                .map(|(index, wallet)| {
                    let active = connected == Some(index);
                    let mut spans = vec![
                        Span::styled(
                            format!("[{}] ", wallet.avatar()),
                            Style::default().fg(Color::Magenta),
                        ),
                        Span::raw(wallet.name.clone()),
                    ];
                    if active {
                        spans.push(Span::styled(
                            "  (connected)",
                            Style::default().fg(Color::Green),
                        ));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect();
            let list = List::new(items)
                .block(Block::default().borders(Borders::BOTTOM))
                .highlight_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");
            let mut state = ListState::default().with_selected(Some(selected_index));
            f.render_stateful_widget(list, chunks[0], &mut state);
        }

        let mut footer = Vec::new();
        if connected.is_some() {
            footer.push(Line::from(vec![
                Span::styled("[d] ", Style::default().fg(Color::Yellow)),
                Span::styled("Disconnect Session", Style::default().fg(Color::Red)),
            ]));
        }
        footer.push(Line::from(""));
        footer.push(Line::from(Span::styled(
            "[j/k] Select  [Enter] Connect  [Esc] Close",
            Style::default().fg(Color::DarkGray),
        )));
        f.render_widget(Paragraph::new(footer), chunks[1]);
    }
}

impl Component for WalletModalComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.action_tx.send(Action::CloseWalletModal)?;
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => self.select_prev(),
            KeyCode::Enter if !self.wallets.is_empty() => {
                self.action_tx
                    .send(Action::ConnectWallet(self.selected_index))?;
                self.action_tx.send(Action::CloseWalletModal)?;
            }
            KeyCode::Char('d') if self.connected.is_some() => {
                self.action_tx.send(Action::DisconnectWallet)?;
                self.action_tx.send(Action::CloseWalletModal)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        if !self.is_open() {
            return;
        }
        Self::draw_static(
            f,
            area,
            &self.wallets,
            self.selected_index,
            self.connected,
        );
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::components::test_support::{contains, key, render};

    fn wallets() -> Vec<WalletInfo> {
        vec![
            WalletInfo {
                name: "Solana CLI".to_string(),
                icon: Some('◎'),
            },
            WalletInfo {
                name: "alice".to_string(),
                icon: None,
            },
        ]
    }

    fn modal() -> (WalletModalComponent, UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WalletModalComponent::new(tx, wallets()), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Action>) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Ok(action) = rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    #[test]
    fn test_open_close() {
        let (mut modal, _rx) = modal();
        assert!(!modal.is_open());
        modal.open();
        assert!(modal.is_open());
        modal.close();
        assert!(!modal.is_open());
        modal.close();
        assert!(!modal.is_open());
    }

    #[test]
    fn test_select_and_connect() {
        let (mut modal, mut rx) = modal();
        modal.open();

        modal.handle_key_event(key(KeyCode::Char('j'))).unwrap();
        assert_eq!(modal.selected_index, 1);
        modal.handle_key_event(key(KeyCode::Char('j'))).unwrap();
        assert_eq!(modal.selected_index, 0);
        modal.handle_key_event(key(KeyCode::Char('k'))).unwrap();
        assert_eq!(modal.selected_index, 1);

        modal.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![Action::ConnectWallet(1), Action::CloseWalletModal]
        );
    }

    #[test]
    fn test_disconnect_only_when_connected() {
        let (mut modal, mut rx) = modal();
        modal.open();

        modal.handle_key_event(key(KeyCode::Char('d'))).unwrap();
        assert!(drain(&mut rx).is_empty());

        modal.set_connected(Some(1));
        modal.handle_key_event(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![Action::DisconnectWallet, Action::CloseWalletModal]
        );
    }

    #[test]
    fn test_escape_closes() {
        let (mut modal, mut rx) = modal();
        modal.open();
        modal.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert_eq!(drain(&mut rx), vec![Action::CloseWalletModal]);
    }

    #[test]
    fn test_render_lists_wallets() {
        let (mut modal, _rx) = modal();

        let screen = render(80, 24, |f| {
            let area = f.area();
            modal.draw(f, area)
        });
        assert!(!contains(&screen, "Connect a Wallet"));

        modal.open();
        let screen = render(80, 24, |f| {
            let area = f.area();
            modal.draw(f, area)
        });
        assert!(contains(&screen, "Connect a Wallet"));
        assert!(contains(&screen, "Solana CLI"));
        assert!(contains(&screen, "[a] alice"));
        assert!(!contains(&screen, "Disconnect Session"));

        modal.set_connected(Some(1));
        let screen = render(80, 24, |f| {
            let area = f.area();
            modal.draw(f, area)
        });
        assert!(contains(&screen, "Disconnect Session"));
        assert!(contains(&screen, "(connected)"));
    }

    #[test]
    fn test_connected_marker_follows_index() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let same_name = WalletInfo {
            name: "main".to_string(),
            icon: None,
        };
        let mut modal = WalletModalComponent::new(tx, vec![same_name.clone(), same_name]);
        modal.open();
        modal.set_connected(Some(1));

        let screen = render(80, 24, |f| {
            let area = f.area();
            modal.draw(f, area)
        });
        let marked: Vec<_> = screen
            .iter()
            .filter(|line| line.contains("[m] main"))
            .map(|line| line.contains("(connected)"))
            .collect();
        assert_eq!(marked, vec![false, true]);
    }

    #[test]
    fn test_render_empty() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut modal = WalletModalComponent::new(tx, Vec::new());
        modal.open();
        let screen = render(80, 24, |f| {
            let area = f.area();
            modal.draw(f, area)
        });
        assert!(contains(&screen, "No keypair wallets found."));
    }
}
