//! Wallet connection status bar with shortcuts to the wallet dialog.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use solana_sdk::pubkey::Pubkey;
use tokio::sync::mpsc::UnboundedSender;

use crate::{action::Action, domain::wallet::WalletInfo, tui::Frame};

use super::Component;

const DISCONNECTED_GLYPH: &str = "◇";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectButtonVariant {
    Connected {
        avatar: char,
        name: String,
        address: String,
    },
    Disconnected,
}

impl ConnectButtonVariant {
    /// `Disconnected` exactly when there is no account.
    pub fn for_account(account: Option<Pubkey>, wallet: Option<&WalletInfo>) -> Self {
        match account {
            Some(pubkey) => Self::Connected {
                avatar: wallet.map_or('W', WalletInfo::avatar),
                name: wallet.map_or_else(|| "Wallet".to_string(), |w| w.name.clone()),
                address: short_address(&pubkey),
            },
            None => Self::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// First and last four characters of a base-58 address.
pub fn short_address(pubkey: &Pubkey) -> String {
    let s = pubkey.to_string();
    if s.len() <= 8 {
        return s;
    }
    format!("{}...{}", &s[..4], &s[s.len() - 4..])
}

pub struct ConnectButtonComponent {
    action_tx: UnboundedSender<Action>,
    pub variant: ConnectButtonVariant,
}

impl ConnectButtonComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            variant: ConnectButtonVariant::Disconnected,
        }
    }

    pub fn set_variant(&mut self, variant: ConnectButtonVariant) {
        self.variant = variant;
    }

    pub fn draw_static(f: &mut Frame, area: Rect, variant: &ConnectButtonVariant) {
        let key_style = Style::default().fg(Color::Yellow);
        let hint_style = Style::default().fg(Color::DarkGray);

        let line = match variant {
            ConnectButtonVariant::Connected {
                avatar,
                name,
                address,
            } => Line::from(vec![
                Span::styled(
                    format!("[{}]", avatar),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(
                    name.as_str(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(address.as_str(), Style::default().fg(Color::Green)),
                Span::raw("  "),
                Span::styled("[x]", key_style),
                Span::styled(" disconnect  ", hint_style),
                Span::styled("[c]", key_style),
                Span::styled(" wallets", hint_style),
            ]),
            ConnectButtonVariant::Disconnected => Line::from(vec![
                Span::styled(DISCONNECTED_GLYPH, Style::default().fg(Color::Cyan)),
                Span::raw(" "),
                Span::styled("[c]", key_style),
                Span::styled(
                    " Connect Wallet",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        };

        let widget = Paragraph::new(line).block(
            Block::default()
                .title("Wallet")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(widget, area);
    }
}

impl Component for ConnectButtonComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('c') => {
                self.action_tx.send(Action::OpenWalletModal)?;
            }
            KeyCode::Char('x') if self.variant.is_connected() => {
                self.action_tx.send(Action::DisconnectWallet)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        Self::draw_static(f, area, &self.variant);
    }
}
