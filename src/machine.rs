//! Session state machine
//!
//! `SessionMachine` owns the one charging session a simulator runs and is
//! the only code that mutates it. It runs as an actor: user commands,
//! scheduler ticks and settled collector calls all arrive as messages and
//! are handled one at a time by [`SessionMachine::run`], so no state is
//! shared and nothing is locked.
//!
//! Lifecycle: `idle -> starting -> running -> stopping -> idle`, with
//! `error` reachable from `starting` and `running`. A start request is
//! honoured from `idle` and `error`; a stop request only from `running`.
//! Everything else is ignored without touching the collector.

use crate::collector::CollectorClient;
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::scheduler::Scheduler;
use crate::session::{ChargingSession, SessionStatus, SessionView};
use crate::telemetry::{PhysicalState, TelemetryGenerator, TelemetryRecord};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

mod handle;
mod types;

pub use handle::SessionHandle;
pub use types::{SessionCommand, SessionEvent};

/// Main session state machine
pub struct SessionMachine {
    /// Physical model and cadence
    config: SimulationConfig,

    collector: Arc<dyn CollectorClient>,

    generator: TelemetryGenerator,

    session: ChargingSession,

    scheduler: Scheduler,

    /// Generation of the schedule whose ticks are currently honoured
    tick_generation: Option<u64>,

    /// Incremented on every accepted start; tags outstanding collector calls
    session_seq: u64,

    /// Samples generated in the current session
    ticks: u64,

    commands_rx: mpsc::UnboundedReceiver<SessionCommand>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,

    /// Snapshot channel for observers
    view_tx: watch::Sender<SessionView>,

    /// Logger without session context
    base_logger: StructuredLogger,

    /// Logger tagged with the current transaction
    logger: StructuredLogger,
}

impl SessionMachine {
    /// Create an idle machine and the handle used to drive it
    pub fn new(
        config: &SimulationConfig,
        collector: Arc<dyn CollectorClient>,
    ) -> Result<(Self, SessionHandle)> {
        let generator = TelemetryGenerator::from_config(config)?;
        let session = ChargingSession::new(PhysicalState::initial(config));

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(session.view(Utc::now()));

        let instance = uuid::Uuid::new_v4().simple().to_string();
        let base_logger = get_logger_with_context(
            LogContext::new("machine").with_instance_id(instance[..8].to_string()),
        );

        let machine = Self {
            config: config.clone(),
            collector,
            generator,
            session,
            scheduler: Scheduler::new(),
            tick_generation: None,
            session_seq: 0,
            ticks: 0,
            commands_rx,
            events_tx,
            events_rx,
            view_tx,
            logger: base_logger.clone(),
            base_logger,
        };
        Ok((machine, SessionHandle::new(commands_tx, view_rx)))
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn session(&self) -> &ChargingSession {
        &self.session
    }

    /// Run until a shutdown command arrives or every handle is dropped
    pub async fn run(mut self) -> Result<()> {
        self.logger.info("Session machine ready");
        while self.step().await {}
        Ok(())
    }

    /// Process one command or event. Returns `false` once the machine has shut down.
    ///
    /// Commands are polled first so a stop request wins over queued ticks.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            biased;
            cmd = self.commands_rx.recv() => match cmd {
                Some(SessionCommand::Shutdown) | None => {
                    self.shutdown().await;
                    false
                }
                Some(cmd) => {
                    self.handle_command(cmd);
                    true
                }
            },
            Some(event) = self.events_rx.recv() => {
                self.handle_event(event);
                true
            }
        }
    }

    pub(crate) fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Start => self.request_start(),
            SessionCommand::Stop => self.request_stop(),
            SessionCommand::Shutdown => {
                self.logger
                    .debug("Shutdown is handled by the run loop, ignoring");
            }
        }
    }

    pub(crate) fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StartSettled {
                seq,
                started_at,
                result,
            } => {
                if seq != self.session_seq || self.session.status != SessionStatus::Starting {
                    self.logger.debug("Dropping stale start result");
                    return;
                }
                match result {
                    Ok(transaction_id) => self.enter_running(transaction_id),
                    Err(e) => {
                        self.enter_error(format!("Start session failed: {}", e));
                        self.logger.debug(&format!(
                            "Start requested at {} was not accepted",
                            started_at.to_rfc3339()
                        ));
                    }
                }
            }
            SessionEvent::Tick { generation } => {
                if self.tick_generation != Some(generation)
                    || self.session.status != SessionStatus::Running
                {
                    self.logger.trace("Dropping tick from cancelled schedule");
                    return;
                }
                self.on_tick();
            }
            SessionEvent::UpdateSettled { seq, tick, result } => match result {
                Ok(()) => self.logger.trace(&format!("Update {} acknowledged", tick)),
                Err(e) => {
                    if seq == self.session_seq && self.session.status == SessionStatus::Running {
                        self.enter_error(format!("Telemetry update failed: {}", e));
                    } else {
                        self.logger.warn(&format!(
                            "Ignoring late failure of update {} (session state {}): {}",
                            tick, self.session.status, e
                        ));
                    }
                }
            },
            SessionEvent::EndSettled { seq, result } => {
                if seq != self.session_seq || self.session.status != SessionStatus::Stopping {
                    self.logger.debug("Dropping stale end result");
                    return;
                }
                match result {
                    Ok(()) => self.logger.info("Collector acknowledged session end"),
                    Err(e) => self
                        .logger
                        .warn(&format!("End session failed, resetting anyway: {}", e)),
                }
                self.reset_to_idle();
            }
        }
    }

    fn request_start(&mut self) {
        if !self.session.status.can_start() {
            self.logger.debug(&format!(
                "Start ignored while {}",
                self.session.status
            ));
            return;
        }

        self.session_seq = self.session_seq.wrapping_add(1);
        let seq = self.session_seq;
        self.session.begin_start();
        self.logger = self.base_logger.for_transaction(None);

        let started_at = Utc::now();
        let soc_start = self.config.initial_soc / 100.0;
        self.logger.info(&format!(
            "Starting session at {:.1}% SOC",
            self.config.initial_soc
        ));

        let collector = Arc::clone(&self.collector);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = collector.start_session(started_at, soc_start).await;
            let _ = events.send(SessionEvent::StartSettled {
                seq,
                started_at,
                result,
            });
        });
        self.publish();
    }

    fn request_stop(&mut self) {
        if self.session.status != SessionStatus::Running {
            self.logger
                .debug(&format!("Stop ignored while {}", self.session.status));
            return;
        }

        self.cancel_schedule();
        self.session.begin_stop();

        let Some(transaction_id) = self.session.transaction_id.clone() else {
            self.logger.warn("Running session without transaction, resetting");
            self.reset_to_idle();
            return;
        };

        let final_record = self.last_record();
        self.logger.info(&format!(
            "Stopping session after {} samples, {:.3} kWh",
            self.ticks,
            self.session.energy_dispensed_kwh()
        ));

        let seq = self.session_seq;
        let collector = Arc::clone(&self.collector);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = collector
                .end_session(&transaction_id, final_record.as_ref())
                .await;
            let _ = events.send(SessionEvent::EndSettled { seq, result });
        });
        self.publish();
    }

    fn enter_running(&mut self, transaction_id: String) {
        self.session.activate(transaction_id.clone(), Utc::now());
        self.ticks = 0;
        self.logger = self.base_logger.for_transaction(Some(&transaction_id));
        self.logger.info("Session started");

        let events = self.events_tx.clone();
        let generation = self
            .scheduler
            .start(self.config.sample_interval(), move |generation| {
                events.send(SessionEvent::Tick { generation }).is_ok()
            });
        self.tick_generation = Some(generation);
        self.publish();
    }

    /// Generate, integrate and dispatch one sample
    fn on_tick(&mut self) {
        let sample = match self.generator.next(&self.session.physical) {
            Ok(sample) => sample,
            Err(e) => {
                self.enter_error(format!("Telemetry generation failed: {}", e));
                return;
            }
        };

        let interval_secs = self.config.sample_interval().as_secs_f64();
        let energy_kwh = self.session.apply_sample(sample, interval_secs);
        self.ticks += 1;
        self.logger.debug(&format!(
            "Sample {}: soc={:.2}% power={:.0}W voltage={:.1}V current={:.1}A temp={:.2}C energy={:.4}kWh",
            self.ticks,
            sample.soc,
            sample.power_w,
            sample.voltage_v,
            sample.current_a,
            sample.temp_c,
            energy_kwh
        ));

        if let (Some(transaction_id), Some(record)) =
            (self.session.transaction_id.clone(), self.last_record())
        {
            let seq = self.session_seq;
            let tick = self.ticks;
            let collector = Arc::clone(&self.collector);
            let events = self.events_tx.clone();
            tokio::spawn(async move {
                let result = collector.send_update(&transaction_id, &record).await;
                let _ = events.send(SessionEvent::UpdateSettled { seq, tick, result });
            });
        }
        self.publish();
    }

    fn enter_error(&mut self, message: String) {
        self.cancel_schedule();
        self.logger.error(&message);
        self.session.fail(message);
        self.publish();
    }

    fn reset_to_idle(&mut self) {
        self.cancel_schedule();
        self.session.reset();
        self.ticks = 0;
        self.logger = self.base_logger.for_transaction(None);
        self.logger.info("Session reset, idle");
        self.publish();
    }

    fn cancel_schedule(&mut self) {
        self.scheduler.cancel();
        self.tick_generation = None;
    }

    /// Latest sample formatted for the collector; `None` before the first tick
    fn last_record(&self) -> Option<TelemetryRecord> {
        (self.ticks > 0).then(|| {
            TelemetryRecord::from_state(
                &self.session.physical,
                self.config.sample_interval_secs(),
            )
        })
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.session.view(Utc::now()));
    }

    /// End a running session inline (best effort) before the loop exits
    async fn shutdown(&mut self) {
        self.cancel_schedule();
        match self.session.status {
            SessionStatus::Running => {
                self.session.begin_stop();
                self.publish();
                if let Some(transaction_id) = self.session.transaction_id.clone() {
                    let final_record = self.last_record();
                    if let Err(e) = self
                        .collector
                        .end_session(&transaction_id, final_record.as_ref())
                        .await
                    {
                        self.logger
                            .warn(&format!("End session on shutdown failed: {}", e));
                    }
                }
                self.reset_to_idle();
            }
            status if status.is_pending() => {
                self.logger.warn(&format!(
                    "Shutting down while {}, collector call left outstanding",
                    status
                ));
            }
            _ => {}
        }
        self.base_logger.info("Session machine stopped");
    }
}
