//! Backend worker thread: owns the tokio runtime and the payment controller.

use std::thread;

use crossbeam_channel::{Receiver, Sender};
use payment_core::{config::Settings, ControllerEvent, PaymentController};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let controller = match PaymentController::from_settings(&settings) {
                Ok(controller) => controller,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err}"),
                    )));
                    tracing::error!("failed to build payment controller: {err}");
                    return;
                }
            };

            tokio::spawn(forward_controller_events(
                controller.subscribe_events(),
                ui_tx.clone(),
            ));
            let _ = ui_tx.try_send(UiEvent::StateChanged(controller.snapshot().await));
            let _ = ui_tx.try_send(UiEvent::Info("Ready to connect".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Connect => {
                        let result = controller
                            .connect()
                            .await
                            .map_err(|err| UiError::from_workflow(UiErrorContext::Connect, &err));
                        let _ = ui_tx.try_send(UiEvent::ConnectFinished(result));
                    }
                    BackendCommand::Disconnect => {
                        controller.disconnect().await;
                        let _ = ui_tx.try_send(UiEvent::Info("Disconnected".to_string()));
                    }
                    BackendCommand::SubmitPayment { draft } => {
                        let controller = controller.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let result = controller.submit_payment(&draft).await.map_err(|err| {
                                UiError::from_workflow(UiErrorContext::SendPayment, &err)
                            });
                            let _ = ui_tx.try_send(UiEvent::PaymentFinished(result));
                        });
                    }
                }
            }
        });
    });
}

/// Relays controller events to the UI until the controller goes away.
/// A lagging receiver skips ahead; the next `StateChanged` carries full state.
async fn forward_controller_events(
    mut events: broadcast::Receiver<ControllerEvent>,
    ui_tx: Sender<UiEvent>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "ui forwarder lagged behind controller events");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let evt = match event {
            ControllerEvent::StateChanged(snapshot) => UiEvent::StateChanged(snapshot),
            ControllerEvent::BalanceRefreshed { balance, .. } => {
                UiEvent::Info(format!("Balance: {}", balance.label()))
            }
        };
        if ui_tx.try_send(evt).is_err() {
            tracing::warn!("ui event queue full or closed; dropping controller event");
        }
    }
}
