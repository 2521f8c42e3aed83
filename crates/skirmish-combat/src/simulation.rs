//! Frame driver tying the world and the scheduler together.
//!
//! One [`Simulation::step`] is one logical frame:
//! 1. Menu toggles pause or resume the clock; a paused frame does nothing else
//! 2. Player input frames go to their sequencers
//! 3. Overlap events are routed to the zone engine
//! 4. Ledgers, zones, projectiles and combo windows tick
//! 5. Deaths are processed
//! 6. Every due task resumes
//! 7. Deaths caused by tasks are processed
//!
//! Executors are attached to sequencers with queued work after input and
//! after the task pass.

use glam::Vec2;
use serde::Serialize;
use skirmish_common::{ActorKind, EntityId};
use tracing::{debug, info};

use crate::adversary::AdversaryBrain;
use crate::collision::{OverlapEvent, OverlapTracker};
use crate::config::CombatConfig;
use crate::input::{InputFrame, LogicalAction};
use crate::lifecycle::RespawnTask;
use crate::scheduler::Scheduler;
use crate::sequencer::{ActionExecutor, InputOutcome};
use crate::world::{CombatWorld, DeathAftermath};

/// What one step did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepReport {
    /// Simulation time after the step.
    pub now: f64,
    /// Whether the step was skipped because the simulation is paused.
    pub paused: bool,
    /// Overlap events routed.
    pub overlaps: usize,
    /// Zone hits from overlap enters and periodic ticks.
    pub zone_hits: usize,
    /// Projectile strikes.
    pub impacts: usize,
    /// Tasks resumed.
    pub tasks_resumed: usize,
    /// Actors that died this step.
    pub deaths: Vec<EntityId>,
    /// Input outcomes per player, skipped when there were none.
    #[serde(skip)]
    pub inputs: Vec<(EntityId, Vec<InputOutcome>)>,
}

/// World, scheduler and clock.
#[derive(Debug)]
pub struct Simulation {
    world: CombatWorld,
    scheduler: Scheduler<CombatWorld>,
    tracker: OverlapTracker,
    clock: f64,
    paused: bool,
}

impl Simulation {
    /// Creates an empty simulation with the ground at height zero.
    #[must_use]
    pub fn new(config: CombatConfig) -> Self {
        Self {
            world: CombatWorld::new(config),
            scheduler: Scheduler::new(),
            tracker: OverlapTracker::new(),
            clock: 0.0,
            paused: false,
        }
    }

    /// Set the ground height used by the built-in overlap feed.
    #[must_use]
    pub fn with_ground(mut self, height: f32) -> Self {
        self.tracker = self.tracker.with_ground(height);
        self
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &CombatWorld {
        &self.world
    }

    /// The world, mutably.
    pub fn world_mut(&mut self) -> &mut CombatWorld {
        &mut self.world
    }

    /// The scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler<CombatWorld> {
        &self.scheduler
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Whether the clock is stopped.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Spawns a player.
    pub fn spawn_player(&mut self, position: Vec2) -> EntityId {
        self.world.spawn_player(position)
    }

    /// Spawns a boss or enemy and starts its brain.
    pub fn spawn_adversary(&mut self, kind: ActorKind, position: Vec2) -> EntityId {
        let id = self.world.spawn_adversary(kind, position);
        self.scheduler.spawn(Box::new(AdversaryBrain::new(id)));
        id
    }

    /// Removes an actor, its summons and every task they own.
    pub fn destroy_actor(&mut self, id: EntityId) -> Vec<EntityId> {
        let removed = self.world.destroy_actor(id);
        for actor in &removed {
            let cancelled = self.scheduler.cancel_owned_by(*actor);
            debug!("{actor}: {cancelled} tasks cancelled");
        }
        removed
    }

    /// Advances one frame using the built-in overlap feed.
    pub fn step(&mut self, dt: f64, inputs: &[(EntityId, InputFrame)]) -> StepReport {
        self.advance(dt, inputs, None)
    }

    /// Advances one frame using overlap events from an external physics layer.
    pub fn step_with_overlaps(
        &mut self,
        dt: f64,
        inputs: &[(EntityId, InputFrame)],
        overlaps: &[OverlapEvent],
    ) -> StepReport {
        self.advance(dt, inputs, Some(overlaps))
    }

    fn advance(
        &mut self,
        dt: f64,
        inputs: &[(EntityId, InputFrame)],
        external: Option<&[OverlapEvent]>,
    ) -> StepReport {
        let toggles = inputs
            .iter()
            .filter(|(_, frame)| frame.pressed(LogicalAction::MenuToggle))
            .count();
        if toggles % 2 == 1 {
            self.paused = !self.paused;
            info!("simulation {}", if self.paused { "paused" } else { "resumed" });
        }
        if self.paused {
            return StepReport {
                now: self.clock,
                paused: true,
                ..StepReport::default()
            };
        }

        self.clock += dt.max(0.0);
        let now = self.clock;
        self.world.now = now;
        let mut report = StepReport {
            now,
            ..StepReport::default()
        };

        for (player, frame) in inputs {
            let outcomes = self.world.handle_input(*player, frame, now);
            if !outcomes.is_empty() {
                report.inputs.push((*player, outcomes));
            }
        }
        self.attach_executors();

        let events = match external {
            Some(events) => events.to_vec(),
            None => {
                self.tracker.report_grounded(&mut self.world.actors);
                self.tracker.update(&self.world.zones, &self.world.actors)
            },
        };
        report.overlaps = events.len();
        for event in &events {
            let hit = self.world.zones.handle_overlap(
                event,
                &mut self.world.actors,
                &self.world.signals,
                now,
            );
            if hit.is_some() {
                report.zone_hits += 1;
            }
        }

        let tick = self.world.tick(dt, now);
        report.zone_hits += tick.zone_hits;
        report.impacts = tick.impacts;
        report.deaths = self.reap_deaths(now);

        report.tasks_resumed = self.scheduler.tick(&mut self.world, now);
        self.attach_executors();
        report.deaths.extend(self.reap_deaths(now));
        report
    }

    /// Starts an executor for every sequencer with queued work and none running.
    fn attach_executors(&mut self) {
        let mut waiting: Vec<EntityId> = self
            .world
            .sequencers
            .iter()
            .filter(|(_, sequencer)| sequencer.needs_executor())
            .map(|(id, _)| *id)
            .collect();
        waiting.sort_unstable();

        for id in waiting {
            let task = self.scheduler.spawn(Box::new(ActionExecutor::new(id)));
            if let Some(sequencer) = self.world.sequencers.get_mut(&id) {
                sequencer.attach_executor(task);
            }
        }
    }

    fn reap_deaths(&mut self, now: f64) -> Vec<EntityId> {
        let dead = self.world.collect_deaths();
        for id in &dead {
            let cancelled = self.scheduler.cancel_owned_by(*id);
            debug!("{id} died: {cancelled} tasks cancelled");
            match self.world.on_death(*id) {
                DeathAftermath::Respawn(delay) => {
                    self.scheduler.spawn(Box::new(RespawnTask::new(*id, now + delay)));
                },
                DeathAftermath::Despawn => {
                    self.destroy_actor(*id);
                },
            }
        }
        dead
    }
}
