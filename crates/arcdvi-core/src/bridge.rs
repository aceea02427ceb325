//! One main-loop iteration: run an operator command, then service input
//! reconfiguration.

use arcdvi_hal::{Command, RegisterBus};
use embedded_hal::delay::DelayNs;

use crate::engine::ProbeEngine;

/// Dispatches operator commands to the probe engine.
pub struct Bridge<B: RegisterBus, D: DelayNs> {
    engine: ProbeEngine<B, D>,
}

impl<B: RegisterBus, D: DelayNs> Bridge<B, D> {
    pub fn new(engine: ProbeEngine<B, D>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ProbeEngine<B, D> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ProbeEngine<B, D> {
        &mut self.engine
    }

    pub fn into_engine(self) -> ProbeEngine<B, D> {
        self.engine
    }

    /// Run a single command to completion.
    pub fn execute(&mut self, cmd: Command) {
        match cmd {
            Command::Probe { force } => {
                self.engine.probe(force);
            }
            Command::SetMode(mode) => {
                self.engine.set_mode_number(mode);
            }
            Command::DumpTiming => {
                self.engine.dump_timing();
            }
            Command::DumpInput => {
                self.engine.dump_input();
            }
            Command::SetXTiming {
                xres,
                front_porch,
                sync_width,
                back_porch,
                words_per_line_m1,
            } => self.engine.set_x_timing(
                xres,
                front_porch,
                sync_width,
                back_porch,
                words_per_line_m1,
            ),
            Command::SetYTiming {
                yres,
                front_porch,
                sync_width,
                back_porch,
            } => self
                .engine
                .set_y_timing(yres, front_porch, sync_width, back_porch),
            Command::SetCursorX(offset) => self.engine.set_cursor_x(offset),
            Command::Sync => {
                // The timeout is already logged; an unacked sync is not retried.
                if let Err(e) = self.engine.sync() {
                    log::debug!("Sync command gave up: {:?}", e);
                }
            }
            Command::ToggleAutoprobe => {
                let on = !self.engine.autoprobe();
                self.engine.set_autoprobe(on);
                log::info!("Autoprobe is {}", if on { "on" } else { "off" });
            }
        }
    }

    /// One main-loop iteration.
    pub fn service(&mut self, cmd: Option<Command>) {
        if let Some(cmd) = cmd {
            self.execute(cmd);
        }
        self.engine.poll_reconfig();
    }
}
