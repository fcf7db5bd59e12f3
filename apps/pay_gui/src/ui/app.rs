use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use payment_core::ControllerSnapshot;
use shared::{
    domain::{shorten_address, shorten_hash, PaymentDraft, PaymentOutcome, Session},
    error::WorkflowError,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(0xe0, 0x5a, 0x5a);
const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(0x4c, 0xb8, 0x72);

pub struct PaymentApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    snapshot: ControllerSnapshot,
    recipient_input: String,
    amount_input: String,
    status: String,
    error: Option<UiError>,
    connect_in_flight: bool,
    submit_in_flight: bool,
}

impl PaymentApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshot: ControllerSnapshot::default(),
            recipient_input: String::new(),
            amount_input: String::new(),
            status: "Starting backend...".to_string(),
            error: None,
            connect_in_flight: false,
            submit_in_flight: false,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::error!(context = ?err.context(), code = ?err.code(), "{}", err.message());
                    self.status = err.message().to_string();
                    self.error = Some(err);
                }
                UiEvent::StateChanged(snapshot) => {
                    self.snapshot = snapshot;
                }
                UiEvent::ConnectFinished(result) => {
                    self.connect_in_flight = false;
                    match result {
                        Ok(session) => {
                            self.status = format!("Connected {}", shorten_address(session.address.as_str()));
                            self.error = None;
                        }
                        Err(err) => {
                            self.status = "Wallet connection failed".to_string();
                            self.error = Some(err);
                        }
                    }
                }
                UiEvent::PaymentFinished(result) => {
                    self.submit_in_flight = false;
                    match result {
                        Ok(hash) => {
                            self.status = format!("Payment sent: {}", shorten_hash(hash.as_str()));
                        }
                        Err(err) => {
                            self.status = "Payment not sent".to_string();
                            if !err.shown_in_payment_panel() {
                                self.error = Some(err);
                            }
                        }
                    }
                }
            }
        }
    }

    fn queue(&mut self, cmd: BackendCommand) -> bool {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status)
    }

    fn request_connect(&mut self) {
        self.error = None;
        self.connect_in_flight = self.queue(BackendCommand::Connect);
    }

    fn request_disconnect(&mut self) {
        self.error = None;
        self.queue(BackendCommand::Disconnect);
    }

    fn request_payment(&mut self) {
        self.error = None;
        let draft = PaymentDraft::new(self.recipient_input.clone(), self.amount_input.clone());
        self.submit_in_flight = self.queue(BackendCommand::SubmitPayment { draft });
    }

    fn payment_busy(&self) -> bool {
        self.submit_in_flight || self.snapshot.outcome.is_pending()
    }

    fn show_error_banner(&mut self, ui: &mut egui::Ui) {
        let Some(err) = &self.error else {
            return;
        };
        let title = match err.context() {
            UiErrorContext::BackendStartup => "Startup error",
            UiErrorContext::Connect => "Wallet",
            UiErrorContext::SendPayment => "Payment",
        };
        let mut dismissed = false;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(ERROR_COLOR, format!("{title}: {}", err.message()));
                if ui.small_button("✕").clicked() {
                    dismissed = true;
                }
            });
        });
        if dismissed {
            self.error = None;
        }
        ui.add_space(8.0);
    }

    fn show_connect_card(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label("Connect your wallet to get started");
            let label = if self.connect_in_flight {
                "Connecting..."
            } else {
                "Connect Wallet"
            };
            if ui
                .add_enabled(!self.connect_in_flight, egui::Button::new(label))
                .clicked()
            {
                self.request_connect();
            }
        });
    }

    fn show_wallet_card(&mut self, ui: &mut egui::Ui, session: &Session) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.weak("Connected Wallet");
            ui.monospace(shorten_address(session.address.as_str()))
                .on_hover_text(session.address.as_str());
            ui.add_space(4.0);
            ui.weak("XLM Balance");
            ui.strong(self.snapshot.balance.label());
            ui.add_space(4.0);
            if ui.button("Disconnect").clicked() {
                self.request_disconnect();
            }
        });
    }

    fn show_payment_form(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.heading("Send XLM");
            ui.add(
                egui::TextEdit::singleline(&mut self.recipient_input)
                    .hint_text("Recipient address (G...)")
                    .desired_width(f32::INFINITY),
            );
            ui.add(
                egui::TextEdit::singleline(&mut self.amount_input)
                    .hint_text("Amount (XLM)")
                    .desired_width(f32::INFINITY),
            );
            let busy = self.payment_busy();
            ui.horizontal(|ui| {
                let label = if busy { "Sending..." } else { "Send XLM" };
                if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                    self.request_payment();
                }
                if busy {
                    ui.spinner();
                }
            });
        });
    }

    fn show_outcome(&self, ui: &mut egui::Ui) {
        match &self.snapshot.outcome {
            PaymentOutcome::Succeeded { hash } => {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.colored_label(SUCCESS_COLOR, "Transaction Successful!");
                    ui.monospace(format!("Hash: {}", shorten_hash(hash.as_str())))
                        .on_hover_text(hash.as_str());
                    if let Some(url) = &self.snapshot.explorer_url {
                        ui.hyperlink_to("View on Explorer", url);
                    }
                });
            }
            PaymentOutcome::Failed => {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.colored_label(ERROR_COLOR, WorkflowError::TransactionFailed.user_message());
                });
            }
            PaymentOutcome::Idle | PaymentOutcome::Pending => {}
        }
    }
}

impl eframe::App for PaymentApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.weak(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.snapshot.network);
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Stellar Payment");
            ui.add_space(8.0);
            self.show_error_banner(ui);

            match self.snapshot.session.clone() {
                None => self.show_connect_card(ui),
                Some(session) => {
                    self.show_wallet_card(ui, &session);
                    ui.add_space(8.0);
                    self.show_payment_form(ui);
                    ui.add_space(8.0);
                    self.show_outcome(ui);
                }
            }
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use shared::domain::{AccountAddress, BalanceView, TxHash};

    fn app() -> (PaymentApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        (PaymentApp::new(cmd_tx, ui_rx), cmd_rx, ui_tx)
    }

    fn connected_snapshot(outcome: PaymentOutcome) -> ControllerSnapshot {
        ControllerSnapshot {
            session: Some(Session {
                address: AccountAddress::new("GABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGHIJKLMNOPQRSTUVW"),
            }),
            balance: BalanceView::Available("10.0000000".to_string()),
            outcome,
            network: "testnet".to_string(),
            explorer_url: None,
        }
    }

    #[test]
    fn send_stays_disabled_until_payment_finishes() {
        let (mut app, cmd_rx, ui_tx) = app();
        app.recipient_input = "GDEST".to_string();
        app.amount_input = "5".to_string();

        app.request_payment();
        assert!(app.payment_busy());
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(BackendCommand::SubmitPayment { draft }) if draft.amount == "5"
        ));

        ui_tx
            .try_send(UiEvent::StateChanged(connected_snapshot(PaymentOutcome::Pending)))
            .expect("send");
        ui_tx
            .try_send(UiEvent::PaymentFinished(Ok(TxHash::new("abc"))))
            .expect("send");
        app.process_ui_events();
        // controller state still reports pending until its own update lands
        assert!(app.payment_busy());

        ui_tx
            .try_send(UiEvent::StateChanged(connected_snapshot(
                PaymentOutcome::Succeeded {
                    hash: TxHash::new("abc"),
                },
            )))
            .expect("send");
        app.process_ui_events();
        assert!(!app.payment_busy());
    }

    #[test]
    fn failed_payment_is_not_duplicated_in_error_banner() {
        let (mut app, _cmd_rx, ui_tx) = app();
        app.submit_in_flight = true;

        ui_tx
            .try_send(UiEvent::PaymentFinished(Err(UiError::from_workflow(
                UiErrorContext::SendPayment,
                &WorkflowError::TransactionFailed,
            ))))
            .expect("send");
        app.process_ui_events();

        assert!(!app.submit_in_flight);
        assert!(app.error.is_none());
    }

    #[test]
    fn connect_failure_surfaces_wallet_message() {
        let (mut app, cmd_rx, ui_tx) = app();
        app.request_connect();
        assert!(app.connect_in_flight);
        assert!(matches!(cmd_rx.try_recv(), Ok(BackendCommand::Connect)));

        ui_tx
            .try_send(UiEvent::ConnectFinished(Err(UiError::from_workflow(
                UiErrorContext::Connect,
                &WorkflowError::WalletUnavailable,
            ))))
            .expect("send");
        app.process_ui_events();

        assert!(!app.connect_in_flight);
        let err = app.error.as_ref().expect("error");
        assert_eq!(err.message(), WorkflowError::WalletUnavailable.user_message());
    }

    #[test]
    fn stopped_backend_keeps_payment_enabled() {
        let (mut app, cmd_rx, _ui_tx) = app();
        drop(cmd_rx);

        app.request_payment();

        assert!(!app.payment_busy());
        assert!(app.status.contains("disconnected"));
    }
}
