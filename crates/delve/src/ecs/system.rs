//! # System — Functions That Advance the Simulation
//!
//! A system is just a function that takes the step context and does something
//! with it: query entities, modify components, emit events. That's it.
//!
//! ## Design Philosophy
//!
//! - A system is `FnMut(&mut C) -> SimResult<()>`, where `C` is whatever
//!   context the caller passes (the simulation uses
//!   [`SimContext`](crate::sim::SimContext)).
//! - Every system has a priority. Higher priorities run first; equal
//!   priorities run in the order they were added.
//! - No parallelism. One step is one sequential pass.
//! - The first error aborts the pass and is returned to the caller.
//!
//! ## Schedule
//!
//! A [`Schedule`] is a sorted `Vec` of systems. Call [`Schedule::run`] once per
//! simulation step.
//!
//! ## Comparison
//!
//! - **hecs**: Doesn't have a built-in system/schedule concept at all.
//! - **bevy_ecs**: `SystemParam` injection, parallel execution with conflict
//!   detection, run conditions. Much more complex.
//!
//! We stay close to hecs: systems are plain functions. The fixed priority
//! order is the only coordination between them.

use crate::error::SimResult;

/// A system that can be executed against a context `C`.
///
/// Any `FnMut(&mut C) -> SimResult<()>` implements this trait, so you can use
/// closures or function pointers directly.
pub trait System<C> {
    fn run(&mut self, ctx: &mut C) -> SimResult<()>;
}

/// Blanket impl: any `FnMut(&mut C) -> SimResult<()>` is a `System`.
impl<C, F: FnMut(&mut C) -> SimResult<()>> System<C> for F {
    fn run(&mut self, ctx: &mut C) -> SimResult<()> {
        (self)(ctx)
    }
}

/// A boxed [`System`] with its priority and a short name for diagnostics.
struct NamedSystem<C> {
    name: String,
    priority: i32,
    system: Box<dyn System<C>>,
}

/// Per-system timing recorded during a single step.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone)]
pub struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

/// A priority-ordered list of systems.
pub struct Schedule<C> {
    systems: Vec<NamedSystem<C>>,
    /// Per-system timings from the most recent `run()` call.
    #[cfg(feature = "diagnostics")]
    timings: Vec<SystemTiming>,
}

impl<C> Schedule<C> {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    /// Register a system. Higher `priority` runs earlier; ties keep
    /// registration order.
    pub fn add_system<S: System<C> + 'static>(&mut self, priority: i32, system: S) {
        self.insert(short_system_name(std::any::type_name::<S>()), priority, Box::new(system));
    }

    /// Register a system under an explicit name.
    pub fn add_named<S: System<C> + 'static>(&mut self, name: &str, priority: i32, system: S) {
        self.insert(name.to_string(), priority, Box::new(system));
    }

    fn insert(&mut self, name: String, priority: i32, system: Box<dyn System<C>>) {
        // After every existing system with priority >= ours.
        let at = self
            .systems
            .iter()
            .position(|ns| ns.priority < priority)
            .unwrap_or(self.systems.len());
        self.systems.insert(
            at,
            NamedSystem {
                name,
                priority,
                system,
            },
        );
    }

    /// Run all systems in priority order. Stops at the first error.
    pub fn run(&mut self, ctx: &mut C) -> SimResult<()> {
        #[cfg(feature = "diagnostics")]
        {
            self.timings.clear();
            for ns in &mut self.systems {
                let start = std::time::Instant::now();
                let result = ns.system.run(ctx);
                let elapsed = start.elapsed();
                self.timings.push(SystemTiming {
                    name: ns.name.clone(),
                    duration_us: elapsed.as_secs_f64() * 1_000_000.0,
                });
                if let Err(err) = result {
                    log::error!("system `{}` failed: {err}", ns.name);
                    return Err(err);
                }
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        {
            for ns in &mut self.systems {
                if let Err(err) = ns.system.run(ctx) {
                    log::error!("system `{}` failed: {err}", ns.name);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Returns the number of systems in this schedule.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// System names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|ns| ns.name.as_str())
    }

    /// Timings of the last [`run`](Self::run).
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[SystemTiming] {
        &self.timings
    }
}

impl<C> Default for Schedule<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the module path from a fully-qualified type name, keeping only the
/// last meaningful segment (e.g. `delve::systems::combat::bump_system` →
/// `bump_system`, `{{closure}}` → `<closure>`).
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn dummy_system(_log: &mut Vec<&'static str>) -> SimResult<()> {
        Ok(())
    }

    #[test]
    fn schedule_captures_system_name() {
        let mut schedule: Schedule<Vec<&'static str>> = Schedule::new();
        schedule.add_system(0, dummy_system);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.names().next(), Some("dummy_system"));
    }

    #[test]
    fn closure_system_name() {
        let mut schedule: Schedule<Vec<&'static str>> = Schedule::new();
        schedule.add_system(0, |_log: &mut Vec<&'static str>| -> SimResult<()> { Ok(()) });
        assert_eq!(schedule.names().next(), Some("<closure>"));
    }

    #[test]
    fn higher_priority_runs_first_ties_in_insertion_order() {
        let mut schedule: Schedule<Vec<&'static str>> = Schedule::new();
        schedule.add_named("low", 1, |log: &mut Vec<&'static str>| -> SimResult<()> {
            log.push("low");
            Ok(())
        });
        schedule.add_named("high", 10, |log: &mut Vec<&'static str>| -> SimResult<()> {
            log.push("high");
            Ok(())
        });
        schedule.add_named("mid-a", 5, |log: &mut Vec<&'static str>| -> SimResult<()> {
            log.push("mid-a");
            Ok(())
        });
        schedule.add_named("mid-b", 5, |log: &mut Vec<&'static str>| -> SimResult<()> {
            log.push("mid-b");
            Ok(())
        });

        let mut log = Vec::new();
        schedule.run(&mut log).unwrap();
        assert_eq!(log, vec!["high", "mid-a", "mid-b", "low"]);
        assert_eq!(
            schedule.names().collect::<Vec<_>>(),
            vec!["high", "mid-a", "mid-b", "low"]
        );
    }

    #[test]
    fn first_error_stops_the_pass() {
        let mut schedule: Schedule<Vec<&'static str>> = Schedule::new();
        schedule.add_named("fails", 2, |_: &mut Vec<&'static str>| -> SimResult<()> {
            Err(SimError::invariant("boom"))
        });
        schedule.add_named("never", 1, |log: &mut Vec<&'static str>| -> SimResult<()> {
            log.push("never");
            Ok(())
        });

        let mut log = Vec::new();
        assert!(schedule.run(&mut log).is_err());
        assert!(log.is_empty());
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn timings_recorded_per_system() {
        let mut schedule: Schedule<Vec<&'static str>> = Schedule::new();
        schedule.add_system(0, dummy_system);
        schedule.add_system(0, dummy_system);
        let mut log = Vec::new();
        schedule.run(&mut log).unwrap();
        assert_eq!(schedule.timings().len(), 2);
    }
}
