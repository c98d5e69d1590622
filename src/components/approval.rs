//! Signature approval prompt shown while a wallet waits for the user.

use std::collections::VecDeque;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::info;

use crate::{domain::signer::ApprovalRequest, tui::Frame};

use super::{Component, centered_rect, connect_button::short_address};

#[derive(Default)]
pub struct ApprovalComponent {
    pending: VecDeque<ApprovalRequest>,
}

impl ApprovalComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: ApprovalRequest) {
        self.pending.push_back(request);
    }

    /// A request is waiting for an answer.
    pub fn is_active(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn current(&self) -> Option<&ApprovalRequest> {
        self.pending.front()
    }

    pub fn approve(&mut self) {
        if let Some(request) = self.pending.pop_front() {
            info!(wallet = %request.wallet, "Signature approved");
            request.approve();
        }
    }

    pub fn reject(&mut self) {
        if let Some(request) = self.pending.pop_front() {
            info!(wallet = %request.wallet, "Signature rejected");
            request.reject();
        }
    }

    pub fn draw_static(f: &mut Frame, area: Rect, request: &ApprovalRequest) {
        let popup = centered_rect(60, 10, area);
        f.render_widget(Clear, popup);

        let label = Style::default().fg(Color::DarkGray);
        let fee_payer = request
            .fee_payer
            .map(|p| short_address(&p))
            .unwrap_or_else(|| "-".to_string());
        let lines = vec![
            Line::from(vec![
                Span::styled(
                    request.wallet.as_str(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    " wants to sign {} transaction{}",
                    request.transaction_count,
                    if request.transaction_count == 1 { "" } else { "s" }
                )),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Signer:    ", label),
                Span::styled(short_address(&request.signer), Style::default().fg(Color::Green)),
            ]),
            Line::from(vec![
                Span::styled("Fee payer: ", label),
                Span::styled(fee_payer, Style::default().fg(Color::Green)),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("[y] Approve", Style::default().fg(Color::Green)),
                Span::raw("   "),
                Span::styled("[n] Reject", Style::default().fg(Color::Red)),
            ]),
        ];

        let widget = Paragraph::new(lines).block(
            Block::default()
                .title(" Approve Signature ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(widget, popup);
    }
}

impl Component for ApprovalComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('y') => self.approve(),
            KeyCode::Char('n') | KeyCode::Esc => self.reject(),
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        if let Some(request) = self.current() {
            Self::draw_static(f, area, request);
        }
    }
}
