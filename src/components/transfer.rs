//! Transfer form: recipient, amount and the submit button.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    action::Action,
    domain::{
        amount::parse_sol_amount,
        transfer::{TransferPhase, TransferRequest, TransferResult},
    },
    tui::Frame,
};

use super::Component;

/// Input field focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferField {
    Recipient,
    Amount,
    Submit,
}

/// Whether the submit button accepts a press.
pub fn can_submit(is_ready: bool, recipient: &str, amount: &str, phase: &TransferPhase) -> bool {
    is_ready
        && !recipient.trim().is_empty()
        && !amount.trim().is_empty()
        && !phase.is_processing()
}

pub struct TransferComponent {
    action_tx: UnboundedSender<Action>,
    pub recipient: String,
    pub amount: String,
    pub focused_field: TransferField,
    pub is_editing: bool,
    pub is_ready: bool,
    pub phase: TransferPhase,
    pub result: TransferResult,
}

impl TransferComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            recipient: String::new(),
            amount: String::new(),
            focused_field: TransferField::Recipient,
            is_editing: false,
            is_ready: false,
            phase: TransferPhase::Idle,
            result: TransferResult::default(),
        }
    }

    pub fn set_ready(&mut self, is_ready: bool) {
        self.is_ready = is_ready;
    }

    /// Track the pipeline. A terminal phase becomes the displayed result.
    pub fn set_phase(&mut self, phase: TransferPhase) {
        if matches!(
            phase,
            TransferPhase::Confirmed { .. } | TransferPhase::Failed { .. }
        ) {
            self.result = phase.result();
        }
        self.phase = phase;
    }

    pub fn can_submit(&self) -> bool {
        can_submit(self.is_ready, &self.recipient, &self.amount, &self.phase)
    }

    /// Insert pasted text into the focused input.
    pub fn paste(&mut self, text: &str) {
        for c in text.trim().chars() {
            self.handle_char(c);
        }
    }

    fn submit(&mut self) -> Result<()> {
        if !self.is_ready {
            self.action_tx.send(Action::OpenWalletModal)?;
        } else if self.can_submit() {
            self.result = TransferResult::default();
            self.action_tx
                .send(Action::SubmitTransfer(TransferRequest::new(
                    self.recipient.trim(),
                    self.amount.trim(),
                )))?;
        }
        Ok(())
    }

    fn next_field(&mut self) {
        self.focused_field = match self.focused_field {
            TransferField::Recipient => TransferField::Amount,
            TransferField::Amount => TransferField::Submit,
            TransferField::Submit => TransferField::Recipient,
        };
    }

    fn prev_field(&mut self) {
        self.focused_field = match self.focused_field {
            TransferField::Recipient => TransferField::Submit,
            TransferField::Amount => TransferField::Recipient,
            TransferField::Submit => TransferField::Amount,
        };
    }

    fn handle_char(&mut self, c: char) {
        match self.focused_field {
            TransferField::Recipient => {
                if !c.is_whitespace() {
                    self.recipient.push(c);
                }
            }
            TransferField::Amount => {
                if c.is_ascii_digit() || (c == '.' && !self.amount.contains('.')) {
                    self.amount.push(c);
                }
            }
            TransferField::Submit => {}
        }
    }

    fn handle_backspace(&mut self) {
        match self.focused_field {
            TransferField::Recipient => {
                self.recipient.pop();
            }
            TransferField::Amount => {
                self.amount.pop();
            }
            TransferField::Submit => {}
        }
    }

    fn input_style(focused: bool, is_editing: bool) -> (Style, Style) {
        let text = match (focused, is_editing) {
            (true, true) => Style::default().fg(Color::Yellow),
            (true, false) => Style::default().fg(Color::Cyan),
            _ => Style::default().fg(Color::White),
        };
        let border = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        (text, border)
    }

    fn input_line<'a>(value: &'a str, placeholder: &'a str, editing: bool, style: Style) -> Line<'a> {
        if value.is_empty() && !editing {
            return Line::from(Span::styled(placeholder, Style::default().fg(Color::DarkGray)));
        }
        let mut display = value.to_string();
        if editing {
            display.push('│');
        }
        Line::from(Span::styled(display, style))
    }

    pub fn draw_static(f: &mut Frame, area: Rect, form: &TransferComponent) {
        let chunks = Layout::vertical([
            Constraint::Length(3), // Recipient
            Constraint::Length(3), // Amount
            Constraint::Length(3), // Submit
            Constraint::Min(0),    // Result/help
        ])
        .split(area);

        let field = form.focused_field;

        // Recipient
        let focused = field == TransferField::Recipient;
        let (text_style, border_style) = Self::input_style(focused, form.is_editing);
        let recipient = Paragraph::new(Self::input_line(
            &form.recipient,
            "Recipient address (base-58)",
            focused && form.is_editing,
            text_style,
        ))
        .block(
            Block::default()
                .title(if focused { "> Recipient" } else { "  Recipient" })
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        f.render_widget(recipient, chunks[0]);

        // Amount
        let focused = field == TransferField::Amount;
        let (text_style, border_style) = Self::input_style(focused, form.is_editing);
        let preview = match parse_sol_amount(&form.amount) {
            Ok(lamports) => format!(" = {} lamports ", lamports),
            _ => String::new(),
        };
        let amount = Paragraph::new(Self::input_line(
            &form.amount,
            "Amount in SOL (e.g., 1.5)",
            focused && form.is_editing,
            text_style,
        ))
        .block(
            Block::default()
                .title(if focused {
                    "> Amount (SOL)"
                } else {
                    "  Amount (SOL)"
                })
                .title_bottom(Line::from(preview).right_aligned())
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        f.render_widget(amount, chunks[1]);

        // Submit
        let focused = field == TransferField::Submit;
        let (label, enabled) = if !form.is_ready {
            ("  [ Connect to Initiate ]  ".to_string(), true)
        } else if let TransferPhase::InProgress(stage) = &form.phase {
            (format!("  [ Processing... ]  {}", stage), false)
        } else {
            ("  [ Send Transaction ]  ".to_string(), form.can_submit())
        };
        let button_style = match (enabled, focused) {
            (false, _) => Style::default().fg(Color::DarkGray),
            (true, true) => Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(Color::Green),
        };
        let submit = Paragraph::new(Line::from(Span::styled(label, button_style))).block(
            Block::default()
                .title(if focused { "> Submit" } else { "  Submit" })
                .borders(Borders::ALL)
                .border_style(if focused {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::DarkGray)
                }),
        );
        f.render_widget(submit, chunks[2]);

        // Result and help
        let mut lines = Vec::new();
        if let Some(err) = &form.result.error {
            lines.push(Line::from(Span::styled(
                format!("Error: {}", err),
                Style::default().fg(Color::Red),
            )));
        } else if let Some(sig) = &form.result.signature {
            lines.push(Line::from(Span::styled(
                "Transmission Successful",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(vec![
                Span::styled("Sig: ", Style::default().fg(Color::DarkGray)),
                Span::styled(sig.as_str(), Style::default().fg(Color::White)),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            if form.is_editing {
                "[Esc/Enter] Stop editing  [Tab/↓] Next field  [Shift+Tab/↑] Prev field"
            } else {
                "[Enter/e] Edit field  [Tab/↓] Next field  [Enter on Submit] Send"
            },
            Style::default().fg(Color::DarkGray),
        )));

        let status = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title("Result")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(status, chunks[3]);
    }
}

impl Component for TransferComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        let on_input_field = self.focused_field != TransferField::Submit;

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.is_editing = false;
                self.next_field();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.is_editing = false;
                self.prev_field();
            }
            KeyCode::Esc => {
                self.is_editing = false;
            }
            KeyCode::Enter => {
                if on_input_field {
                    self.is_editing = !self.is_editing;
                } else {
                    self.submit()?;
                }
            }
            KeyCode::Char(c) => {
                if self.is_editing && on_input_field {
                    self.handle_char(c);
                } else if !self.is_editing {
                    match c {
                        'j' => self.next_field(),
                        'k' => self.prev_field(),
                        'e' if on_input_field => self.is_editing = true,
                        _ => {}
                    }
                }
            }
            KeyCode::Backspace => {
                if self.is_editing && on_input_field {
                    self.handle_backspace();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        Self::draw_static(f, area, self);
    }
}
