use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::{
    action::Action,
    cli::Args,
    components::{
        Component,
        approval::ApprovalComponent,
        connect_button::{ConnectButtonComponent, ConnectButtonVariant},
        transfer::TransferComponent,
        wallet_modal::WalletModalComponent,
    },
    config::Config,
    domain::{
        signer::ApprovalRequest,
        transfer::{
            TransferContext, TransferOrchestrator, TransferPhase, TransferRequest, TransferStage,
            TransferTicket,
        },
        wallet::WalletSession,
    },
    infra::{
        keystore::{discover_wallets, solana_cli_keypair_path, wallets_dir},
        provider::{ConnectionProvider, use_connection, with_connection},
    },
    tui::{Event, Tui},
};

pub struct App {
    pub should_quit: bool,
    pub should_suspend: bool,
    pub config: Config,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
    pub approval_rx: Option<UnboundedReceiver<ApprovalRequest>>,
    pub tui: Tui,
    pub provider: Arc<ConnectionProvider>,
    pub orchestrator: TransferOrchestrator,
    pub session: WalletSession,
    pub connect_button: ConnectButtonComponent,
    pub wallet_modal: WalletModalComponent,
    pub transfer: TransferComponent,
    pub approval: ApprovalComponent,
    pub status_message: String,
}

impl App {
    pub fn new(args: &Args) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let config = Config::new(
            &args.network,
            args.rpc_url.as_deref(),
            args.ws_url.as_deref(),
            args.commitment.as_deref(),
        )?
        .with_confirm_timeout(args.confirm_timeout);

        let wallets = discover_wallets(
            solana_cli_keypair_path().as_deref(),
            &wallets_dir(),
            &args.keypairs,
        );
        info!("Discovered {} wallet(s)", wallets.len());

        let (approval_tx, approval_rx) = if args.auto_approve {
            (None, None)
        } else {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(tx), Some(rx))
        };
        let session = WalletSession::new(wallets, approval_tx);

        let provider = Arc::new(ConnectionProvider::from_config(&config));
        let orchestrator = TransferOrchestrator::new(config.commitment.to_config());

        let connect_button = ConnectButtonComponent::new(action_tx.clone());
        let wallet_modal = WalletModalComponent::new(
            action_tx.clone(),
            session.wallets().iter().map(|w| w.info.clone()).collect(),
        );
        let transfer = TransferComponent::new(action_tx.clone());

        let status_message = if session.wallets().is_empty() {
            "No wallets found. Pass --keypair <file> to add one.".to_string()
        } else {
            "Press [c] to connect a wallet".to_string()
        };

        let tui = Tui::new()?
            .tick_rate(args.tick_rate)
            .frame_rate(args.frame_rate)
            .paste(true);

        Ok(Self {
            should_quit: false,
            should_suspend: false,
            config,
            action_tx,
            action_rx,
            approval_rx,
            tui,
            provider,
            orchestrator,
            session,
            connect_button,
            wallet_modal,
            transfer,
            approval: ApprovalComponent::new(),
            status_message,
        })
    }

    /// Run the UI with the connection handles in scope.
    pub async fn run(&mut self) -> Result<()> {
        let provider = Arc::clone(&self.provider);
        info!(
            "Using {} ({} / {}), commitment {}",
            self.config.network.name,
            provider.endpoints().rpc_url,
            provider.endpoints().ws_url,
            self.config.commitment
        );
        provider.scope(self.event_loop()).await
    }

    async fn event_loop(&mut self) -> Result<()> {
        self.tui.enter()?;

        loop {
            if let Some(event) = self.tui.next().await {
                self.handle_event(event)?;
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.handle_action(action)?;
            }

            if self.should_suspend {
                self.tui.suspend()?;
                self.should_suspend = false;
                self.tui.resume()?;
            }

            if self.should_quit {
                break;
            }
        }

        self.tui.exit()?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Init => {
                info!("Application initialized");
            }
            Event::Tick => {
                self.action_tx.send(Action::Tick)?;
            }
            Event::Render => {
                self.draw_ui()?;
            }
            Event::Key(key_event) => {
                self.handle_key_event(key_event)?;
            }
            Event::Paste(text) => {
                if !self.approval.is_active() && !self.wallet_modal.is_open() {
                    self.transfer.paste(&text);
                }
            }
            Event::Resize(w, h) => {
                self.action_tx.send(Action::Resize(w, h))?;
            }
            Event::Error => {
                self.action_tx
                    .send(Action::Error("Terminal input error".to_string()))?;
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.action_tx.send(Action::Quit)?;
            return Ok(());
        }

        // The topmost popup takes the key.
        if self.approval.is_active() {
            return self.approval.handle_key_event(key);
        }
        if self.wallet_modal.is_open() {
            return self.wallet_modal.handle_key_event(key);
        }
        if self.transfer.is_editing {
            return self.transfer.handle_key_event(key);
        }

        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::Quit)?;
            }
            KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.action_tx.send(Action::Suspend)?;
            }
            KeyCode::Char('c') | KeyCode::Char('x') if key.modifiers.is_empty() => {
                self.connect_button.handle_key_event(key)?;
            }
            _ => {
                self.transfer.handle_key_event(key)?;
            }
        }
        Ok(())
    }

    fn handle_action(&mut self, action: Action) -> Result<()> {
        if action != Action::Tick {
            debug!("Handling action: {:?}", action);
        }
        match action {
            Action::Tick => {
                self.poll_approvals();
            }
            Action::Resize(w, h) => {
                self.tui.resize(Rect::new(0, 0, w, h))?;
                self.draw_ui()?;
            }
            Action::Suspend => {
                self.should_suspend = true;
            }
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Error(message) => {
                error!("{}", message);
                self.status_message = message;
            }
            Action::OpenWalletModal => {
                self.wallet_modal.open();
            }
            Action::CloseWalletModal => {
                self.wallet_modal.close();
            }
            Action::ConnectWallet(index) => {
                match self.session.connect(index) {
                    Ok(info) => {
                        self.status_message = format!("Connected {}", info.name);
                    }
                    Err(e) => {
                        error!("Failed to connect wallet: {:#}", e);
                        self.status_message = format!("Failed to connect wallet: {}", e);
                    }
                }
                self.sync_wallet();
            }
            Action::DisconnectWallet => {
                self.session.disconnect();
                self.status_message = "Wallet disconnected".to_string();
                self.sync_wallet();
            }
            Action::SubmitTransfer(request) => {
                self.submit_transfer(request);
            }
            Action::TransferProgress(phase) => {
                match &phase {
                    TransferPhase::Confirmed { .. } => {
                        self.status_message = "Transfer confirmed".to_string();
                    }
                    TransferPhase::Failed { stage, .. } => {
                        self.status_message = format!("Transfer failed ({})", stage);
                    }
                    TransferPhase::InProgress(stage) => {
                        self.status_message = stage.to_string();
                    }
                    TransferPhase::Idle => {}
                }
                self.transfer.set_phase(phase);
            }
        }
        Ok(())
    }

    fn poll_approvals(&mut self) {
        if let Some(rx) = self.approval_rx.as_mut() {
            while let Ok(request) = rx.try_recv() {
                info!(wallet = %request.wallet, "Signature requested");
                self.approval.push(request);
            }
        }
    }

    fn sync_wallet(&mut self) {
        let info = self.session.wallet_info().cloned();
        self.connect_button
            .set_variant(ConnectButtonVariant::for_account(
                self.session.account(),
                info.as_ref(),
            ));
        self.wallet_modal.set_connected(self.session.connected_index());
        self.transfer.set_ready(self.session.is_ready());
    }

    /// Claim the transfer slot and run the pipeline on its own task.
    fn submit_transfer(&mut self, request: TransferRequest) {
        let ticket = match self.orchestrator.begin() {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!("{}", e);
                self.status_message = e.to_string();
                return;
            }
        };
        let handles = match use_connection() {
            Ok(handles) => handles,
            Err(e) => {
                error!("{}", e);
                self.status_message = e.to_string();
                return;
            }
        };

        let ctx = self.session.transfer_context();
        self.transfer
            .set_phase(TransferPhase::InProgress(TransferStage::Preparing));
        tokio::spawn(with_connection(
            handles,
            run_transfer(ticket, ctx, request, self.action_tx.clone()),
        ));
    }

    fn draw_ui(&mut self) -> Result<()> {
        let network_name = self.config.network.name.clone();
        let rpc_url = self.config.network.rpc_url.clone();
        let commitment = self.config.commitment;
        let status_message = self.status_message.clone();

        let connect_button = &self.connect_button;
        let transfer = &self.transfer;
        let wallet_modal = &mut self.wallet_modal;
        let approval = &mut self.approval;

        self.tui.draw(|f| {
            let chunks = Layout::vertical([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Wallet
                Constraint::Min(0),    // Transfer form
                Constraint::Length(3), // Status
            ])
            .split(f.area());

            let header = Paragraph::new(Line::from(vec![
                Span::styled(
                    "Solana Send",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", network_name),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw("  "),
                Span::styled(rpc_url, Style::default().fg(Color::DarkGray)),
                Span::raw("  "),
                Span::styled(
                    format!("commitment: {}", commitment),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
            f.render_widget(header, chunks[0]);

            ConnectButtonComponent::draw_static(f, chunks[1], &connect_button.variant);
            TransferComponent::draw_static(f, chunks[2], transfer);

            let status = Paragraph::new(Line::from(vec![
                Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
                Span::styled(status_message, Style::default().fg(Color::Green)),
                Span::raw("  |  "),
                Span::styled(
                    "[c]Wallets [q]Quit",
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
            f.render_widget(status, chunks[3]);

            let area = f.area();
            wallet_modal.draw(f, area);
            approval.draw(f, area);
        })?;
        Ok(())
    }
}

/// Body of the spawned transfer task. Phases flow back as actions.
async fn run_transfer(
    ticket: TransferTicket,
    ctx: TransferContext,
    request: TransferRequest,
    action_tx: UnboundedSender<Action>,
) {
    let report = move |phase: TransferPhase| {
        // The UI may already be gone; the transfer still runs to completion.
        let _ = action_tx.send(Action::TransferProgress(phase));
    };
    match use_connection() {
        Ok(ledger) => {
            ticket.run(&*ledger, ctx, request, report).await;
        }
        Err(e) => report(TransferPhase::Failed {
            stage: TransferStage::Preparing,
            error: e.to_string(),
        }),
    }
}
