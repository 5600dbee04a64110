//! Barrier-synchronized multi-axis coordinator.

use core::fmt;
use core::sync::atomic::{AtomicU16, Ordering};
use core::time::Duration;
use std::sync::Arc;
use std::thread;

use heapless::{String, Vec};
use tracing::{error, info, warn};

use crate::config::{CoordinatorConfig, Percent};
use crate::error::{message, ConfigError, CoordinatorError, Error, MotorError, Result};
use crate::motor::StopHandle;

use super::barrier::CompletionBarrier;
use super::waypoint::Waypoint;
use super::{AxisControl, MAX_AXES};

/// Cloneable emergency stop for every axis of a coordinator.
///
/// Safe to trigger from any thread, including while a coordinated move
/// holds the coordinator.
#[derive(Debug, Clone)]
pub struct EmergencyStop {
    handles: Vec<StopHandle, MAX_AXES>,
}

impl EmergencyStop {
    /// Halt every axis.
    pub fn trigger(&self) {
        warn!(axes = self.handles.len(), "emergency stop triggered");
        for handle in &self.handles {
            handle.stop();
        }
    }
}

/// Last committed position of every axis, readable from any thread.
///
/// A point query: components are updated independently as each axis
/// finishes, so a snapshot taken mid-move may mix old and new values.
#[derive(Debug, Clone)]
pub struct PositionMonitor {
    slots: Arc<[AtomicU16; MAX_AXES]>,
    len: usize,
}

impl PositionMonitor {
    fn new(len: usize) -> Self {
        Self {
            slots: Arc::new(core::array::from_fn(|_| AtomicU16::new(0))),
            len,
        }
    }

    fn record(&self, index: usize, position: Percent) {
        if let Some(slot) = self.slots.get(index) {
            slot.store(position.0, Ordering::Release);
        }
    }

    /// Current positions in axis order.
    pub fn snapshot(&self) -> Vec<Percent, MAX_AXES> {
        self.slots
            .iter()
            .take(self.len)
            .map(|slot| Percent(slot.load(Ordering::Acquire)))
            .collect()
    }
}

/// Coordinator for `N` axes moving in lockstep.
///
/// Every coordinated step fans one task per axis out onto its own thread
/// and blocks on a barrier sized `N` until each has reported completion.
/// Disabling an axis means building the coordinator with fewer axes, so
/// the barrier count always equals the axis count.
pub struct Tripteron<A: AxisControl, const N: usize> {
    axes: [A; N],
    barrier: CompletionBarrier,
    stop: EmergencyStop,
    monitor: PositionMonitor,
    barrier_timeout: Duration,
    rest: Percent,
}

impl<A: AxisControl, const N: usize> Tripteron<A, N> {
    /// Take ownership of `axes`.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::InvalidAxisCount` unless `1 <= N <= 3`,
    /// and configuration errors for a zero barrier timeout or an invalid
    /// rest pose.
    pub fn new(axes: [A; N], config: &CoordinatorConfig) -> Result<Self> {
        if N == 0 || N > MAX_AXES {
            return Err(CoordinatorError::InvalidAxisCount(N).into());
        }
        if config.barrier_timeout_ms == 0 {
            return Err(ConfigError::InvalidBarrierTimeout.into());
        }
        if !config.rest_position.is_valid() {
            return Err(ConfigError::InvalidPercent(config.rest_position.0).into());
        }

        let stop = EmergencyStop {
            handles: axes.iter().map(AxisControl::stop_handle).collect(),
        };
        let monitor = PositionMonitor::new(N);
        for (index, axis) in axes.iter().enumerate() {
            monitor.record(index, axis.position());
        }

        info!(axes = N, "coordinator ready");

        Ok(Self {
            axes,
            barrier: CompletionBarrier::new(N),
            stop,
            monitor,
            barrier_timeout: config.barrier_timeout(),
            rest: config.rest_position,
        })
    }

    /// Owned axes in order.
    pub fn axes(&self) -> &[A; N] {
        &self.axes
    }

    /// Completions the barrier waits for; always `N`.
    pub fn barrier_count(&self) -> usize {
        self.barrier.required()
    }

    /// Calibrate every axis concurrently.
    ///
    /// Returns the calibration constants in axis order.
    ///
    /// # Errors
    ///
    /// The first axis failure stops every axis and is returned (all are
    /// logged), or `CoordinatorError::BarrierTimeout` after stopping every
    /// axis.
    pub fn calibrate(&mut self) -> Result<[u32; N]> {
        info!("calibrating all axes");
        let results = self.fan_out("cal", |_, axis| axis.calibrate())?;

        let mut constants = [0u32; N];
        let mut first_error = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(steps) => constants[index] = steps,
                Err(e) => {
                    error!(axis = %self.axes[index].name(), error = %e, "calibration failed");
                    first_error = Some(root_cause(first_error, e));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(?constants, "all axes calibrated");
                Ok(constants)
            }
        }
    }

    /// Visit `waypoints` in order, then return every axis to rest.
    ///
    /// Each waypoint is one coordinated step: every axis moves
    /// synchronously to its component and the next step starts only once
    /// all have finished. Rejected components (out of range, uncalibrated
    /// axis) are logged and leave that axis in place.
    ///
    /// # Errors
    ///
    /// A fault on any axis or a barrier timeout stops every axis and aborts
    /// the sequence without the final rest move.
    pub fn move_through(&mut self, waypoints: &[Waypoint]) -> Result<()> {
        for (index, waypoint) in waypoints.iter().enumerate() {
            info!(step = index, x = %waypoint.x, y = %waypoint.y, z = %waypoint.z, "waypoint");
            self.step_to(waypoint)?;
        }

        info!(rest = %self.rest, "returning to rest");
        self.step_to(&Waypoint::uniform(self.rest))
    }

    /// Last committed position of every axis.
    ///
    /// Point query, not transactional. See [`PositionMonitor`] for reading
    /// positions while a move is in progress.
    pub fn position(&self) -> [Percent; N] {
        core::array::from_fn(|index| self.axes[index].position())
    }

    /// Handle reading positions from other threads.
    pub fn monitor(&self) -> PositionMonitor {
        self.monitor.clone()
    }

    /// Emergency stop every axis.
    pub fn stop(&self) {
        self.stop.trigger();
    }

    /// Handle stopping every axis from other threads.
    pub fn emergency_stop(&self) -> EmergencyStop {
        self.stop.clone()
    }

    fn step_to(&mut self, waypoint: &Waypoint) -> Result<()> {
        let targets = waypoint.components();
        let results = self.fan_out("move", |index, axis| axis.move_to(targets[index], true))?;

        let mut fault = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(()) => {}
                Err(e) if e.is_rejection() => {
                    warn!(axis = %self.axes[index].name(), error = %e, "move rejected");
                }
                Err(e) => {
                    error!(axis = %self.axes[index].name(), error = %e, "move failed");
                    fault = Some(root_cause(fault, e));
                }
            }
        }

        match fault {
            Some(e) => {
                self.stop();
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Run `op` on every axis concurrently and wait on the barrier.
    ///
    /// Each worker arrives exactly once, even if it panics or cannot be
    /// spawned. A worker whose operation faults stops every axis at once,
    /// so its siblings return `MotorError::Halted` instead of finishing. The scope joins every worker before returning; all motor
    /// waits are bounded, so a stop after a barrier timeout lets the joins
    /// complete.
    fn fan_out<R, F>(&mut self, label: &str, op: F) -> Result<[Result<R>; N]>
    where
        R: Send,
        F: Fn(usize, &mut A) -> Result<R> + Sync,
    {
        let Self {
            axes,
            barrier,
            stop,
            monitor,
            barrier_timeout,
            ..
        } = self;

        let names: [String<16>; N] = core::array::from_fn(|index| message(axes[index].name()));
        let mut slots: [Option<Result<R>>; N] = core::array::from_fn(|_| None);
        barrier.reset();

        let waited = thread::scope(|scope| {
            let op = &op;
            let barrier = &*barrier;
            let monitor = &*monitor;
            let stop = &*stop;

            let mut workers = Vec::<_, MAX_AXES>::new();
            for (index, axis) in axes.iter_mut().enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("{}-{}", label, names[index]))
                    .spawn_scoped(scope, move || {
                        let _arrival = barrier.arrival();
                        let result = op(index, axis);
                        if let Err(e) = &result {
                            if !e.is_rejection() && !is_halt(e) {
                                error!(axis = %axis.name(), error = %e, "axis fault, stopping all axes");
                                stop.trigger();
                            }
                        }
                        monitor.record(index, axis.position());
                        result
                    });

                match spawned {
                    Ok(worker) => {
                        // At most MAX_AXES workers.
                        let _ = workers.push((index, worker));
                    }
                    Err(e) => {
                        error!(axis = %names[index], error = %e, "failed to spawn axis worker");
                        barrier.arrive();
                        slots[index] =
                            Some(Err(CoordinatorError::WorkerSpawn(message(&e.to_string())).into()));
                    }
                }
            }

            let waited = barrier.wait(*barrier_timeout);
            if let Err(e) = &waited {
                error!(error = %e, "coordinated step timed out, stopping all axes");
                stop.trigger();
            }

            for (index, worker) in workers {
                slots[index] = Some(match worker.join() {
                    Ok(result) => result,
                    Err(_) => {
                        error!(axis = %names[index], "axis worker panicked");
                        Err(CoordinatorError::WorkerPanicked(names[index].clone()).into())
                    }
                });
            }

            waited
        });

        waited?;

        Ok(core::array::from_fn(|index| {
            slots[index].take().unwrap_or_else(|| {
                Err(Error::from(CoordinatorError::WorkerPanicked(names[index].clone())))
            })
        }))
    }
}

fn is_halt(error: &Error) -> bool {
    *error == Error::Motor(MotorError::Halted)
}

/// Keep the first fault that is not itself the result of a stop.
fn root_cause(held: Option<Error>, next: Error) -> Error {
    match held {
        Some(held) if !is_halt(&held) || is_halt(&next) => held,
        _ => next,
    }
}

impl<A: AxisControl, const N: usize> fmt::Debug for Tripteron<A, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tripteron")
            .field("axes", &N)
            .field("position", &self.position())
            .field("barrier_timeout", &self.barrier_timeout)
            .finish()
    }
}
