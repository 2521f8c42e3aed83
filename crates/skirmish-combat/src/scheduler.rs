//! Cooperative task scheduler.
//!
//! All timing-based combat behaviour (attack windups, aerial phases, respawn
//! timers, summon lifetimes) runs as [`Task`]s. A task only yields by
//! returning a [`Suspend`] from [`Task::resume`]:
//! - `DelayFor(seconds)` resumes once the clock has advanced that far
//! - `WaitUntil(predicate)` resumes on the first tick the predicate holds
//! - `NextTick` resumes on the following tick
//! - `Done` drops the task
//!
//! Everything inside one `resume` call runs without interruption, which is
//! what keeps damage application atomic. Before a task is resumed the
//! scheduler checks that its owner still exists; orphaned tasks are dropped
//! without running.

use skirmish_common::{EntityId, TaskId, TIME_EPSILON};
use std::fmt;
use tracing::{debug, trace};

/// Lets the scheduler ask whether a task's owner still exists.
pub trait OwnerCheck {
    /// Returns true while `owner` is a live entity.
    fn owner_alive(&self, owner: EntityId) -> bool;
}

/// Predicate polled once per tick by a waiting task.
pub type Predicate<C> = Box<dyn Fn(&C) -> bool>;

/// How a task suspends.
pub enum Suspend<C> {
    /// Resume after this many seconds of simulation time.
    DelayFor(f64),
    /// Resume on the first tick the predicate returns true.
    WaitUntil(Predicate<C>),
    /// Resume on the next tick.
    NextTick,
    /// The task is finished.
    Done,
}

impl<C> fmt::Debug for Suspend<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DelayFor(seconds) => write!(f, "DelayFor({seconds})"),
            Self::WaitUntil(_) => f.write_str("WaitUntil(..)"),
            Self::NextTick => f.write_str("NextTick"),
            Self::Done => f.write_str("Done"),
        }
    }
}

/// A suspendable unit of combat logic.
pub trait Task<C> {
    /// The entity this task works on behalf of, if any.
    fn owner(&self) -> Option<EntityId>;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Runs the task until its next suspension point.
    fn resume(&mut self, cx: &mut TaskContext<'_, C>) -> Suspend<C>;
}

/// Everything a task can touch while it runs.
pub struct TaskContext<'a, C> {
    /// The shared world.
    pub world: &'a mut C,
    /// Current simulation time in seconds.
    pub now: f64,
    id: TaskId,
    next_id: &'a mut TaskId,
    spawned: &'a mut Vec<(TaskId, Box<dyn Task<C>>)>,
}

impl<'a, C> TaskContext<'a, C> {
    /// ID of the running task.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// A context outside any scheduler, for driving task steps in tests.
    #[cfg(test)]
    pub(crate) fn for_tests(
        world: &'a mut C,
        now: f64,
        next_id: &'a mut TaskId,
        spawned: &'a mut Vec<(TaskId, Box<dyn Task<C>>)>,
    ) -> Self {
        Self {
            world,
            now,
            id: TaskId::from_raw(0),
            next_id,
            spawned,
        }
    }

    /// Spawns a task that first runs on the next tick.
    pub fn spawn(&mut self, task: Box<dyn Task<C>>) -> TaskId {
        let id = *self.next_id;
        *self.next_id = id.next();
        self.spawned.push((id, task));
        id
    }
}

enum Wake<C> {
    Now,
    At(f64),
    Until(Predicate<C>),
}

struct Slot<C> {
    id: TaskId,
    task: Box<dyn Task<C>>,
    wake: Wake<C>,
}

/// Drives every live task once per logical frame.
pub struct Scheduler<C> {
    slots: Vec<Slot<C>>,
    next_id: TaskId,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.slots.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<C> Scheduler<C> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_id: TaskId::from_raw(1),
        }
    }

    /// Adds a task. It first runs on the next call to [`Scheduler::tick`].
    pub fn spawn(&mut self, task: Box<dyn Task<C>>) -> TaskId {
        let id = self.next_id;
        self.next_id = id.next();
        trace!("spawned {} as {id}", task.name());
        self.slots.push(Slot {
            id,
            task,
            wake: Wake::Now,
        });
        id
    }

    /// Cancels a task. Returns false if it already finished.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        before != self.slots.len()
    }

    /// Cancels every task owned by `owner`. Returns how many were cancelled.
    pub fn cancel_owned_by(&mut self, owner: EntityId) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.task.owner() != Some(owner));
        let cancelled = before - self.slots.len();
        if cancelled > 0 {
            debug!("cancelled {cancelled} task(s) owned by {owner}");
        }
        cancelled
    }

    /// Checks whether a task is still scheduled.
    #[must_use]
    pub fn is_live(&self, id: TaskId) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    /// Number of live tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Checks if no tasks are scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Names of the live tasks owned by `owner`.
    #[must_use]
    pub fn task_names_for(&self, owner: EntityId) -> Vec<&'static str> {
        self.slots
            .iter()
            .filter(|slot| slot.task.owner() == Some(owner))
            .map(|slot| slot.task.name())
            .collect()
    }
}

impl<C: OwnerCheck> Scheduler<C> {
    /// Resumes every task whose wake condition holds at `now`.
    ///
    /// Returns the number of tasks resumed.
    pub fn tick(&mut self, world: &mut C, now: f64) -> usize {
        let mut spawned = Vec::new();
        let mut resumed = 0;
        let slots = std::mem::take(&mut self.slots);
        let mut kept = Vec::with_capacity(slots.len());

        for mut slot in slots {
            if let Some(owner) = slot.task.owner() {
                if !world.owner_alive(owner) {
                    debug!("dropping {} ({}): owner {owner} is gone", slot.task.name(), slot.id);
                    continue;
                }
            }

            let ready = match &slot.wake {
                Wake::Now => true,
                Wake::At(at) => now + TIME_EPSILON >= *at,
                Wake::Until(predicate) => predicate(&*world),
            };
            if !ready {
                kept.push(slot);
                continue;
            }

            let mut cx = TaskContext {
                world: &mut *world,
                now,
                id: slot.id,
                next_id: &mut self.next_id,
                spawned: &mut spawned,
            };
            let step = slot.task.resume(&mut cx);
            resumed += 1;
            trace!("{} ({}) -> {step:?}", slot.task.name(), slot.id);

            match step {
                Suspend::Done => {},
                Suspend::DelayFor(seconds) => {
                    slot.wake = Wake::At(now + seconds.max(0.0));
                    kept.push(slot);
                },
                Suspend::WaitUntil(predicate) => {
                    slot.wake = Wake::Until(predicate);
                    kept.push(slot);
                },
                Suspend::NextTick => {
                    slot.wake = Wake::Now;
                    kept.push(slot);
                },
            }
        }

        // Tasks spawned during this tick keep their place after the survivors.
        kept.extend(spawned.into_iter().map(|(id, task)| Slot {
            id,
            task,
            wake: Wake::Now,
        }));
        self.slots = kept;
        resumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    #[derive(Default)]
    struct TestWorld {
        alive: AHashSet<EntityId>,
        log: Vec<String>,
        gate: bool,
    }

    impl OwnerCheck for TestWorld {
        fn owner_alive(&self, owner: EntityId) -> bool {
            self.alive.contains(&owner)
        }
    }

    /// Logs a line, waits `delay`, logs again, done.
    struct TwoStep {
        owner: Option<EntityId>,
        delay: f64,
        stage: u8,
    }

    impl Task<TestWorld> for TwoStep {
        fn owner(&self) -> Option<EntityId> {
            self.owner
        }

        fn name(&self) -> &'static str {
            "two-step"
        }

        fn resume(&mut self, cx: &mut TaskContext<'_, TestWorld>) -> Suspend<TestWorld> {
            self.stage += 1;
            cx.world.log.push(format!("stage {} at {}", self.stage, cx.now));
            if self.stage == 1 {
                Suspend::DelayFor(self.delay)
            } else {
                Suspend::Done
            }
        }
    }

    struct Gated;

    impl Task<TestWorld> for Gated {
        fn owner(&self) -> Option<EntityId> {
            None
        }

        fn name(&self) -> &'static str {
            "gated"
        }

        fn resume(&mut self, cx: &mut TaskContext<'_, TestWorld>) -> Suspend<TestWorld> {
            if cx.world.log.iter().any(|line| line == "gate open") {
                cx.world.log.push("passed".into());
                return Suspend::Done;
            }
            Suspend::WaitUntil(Box::new(|world: &TestWorld| world.gate))
        }
    }

    struct Parent;

    impl Task<TestWorld> for Parent {
        fn owner(&self) -> Option<EntityId> {
            None
        }

        fn name(&self) -> &'static str {
            "parent"
        }

        fn resume(&mut self, cx: &mut TaskContext<'_, TestWorld>) -> Suspend<TestWorld> {
            cx.spawn(Box::new(TwoStep {
                owner: None,
                delay: 0.0,
                stage: 0,
            }));
            Suspend::Done
        }
    }

    #[test]
    fn test_delay_resumes_after_elapsed_time() {
        let mut world = TestWorld::default();
        let mut scheduler = Scheduler::new();
        scheduler.spawn(Box::new(TwoStep {
            owner: None,
            delay: 1.0,
            stage: 0,
        }));

        assert_eq!(scheduler.tick(&mut world, 0.0), 1);
        assert_eq!(scheduler.tick(&mut world, 0.5), 0);
        assert_eq!(scheduler.tick(&mut world, 1.0), 1);
        assert!(scheduler.is_empty());
        assert_eq!(world.log, vec!["stage 1 at 0", "stage 2 at 1"]);
    }

    #[test]
    fn test_wait_until_polls_predicate() {
        let mut world = TestWorld::default();
        let mut scheduler = Scheduler::new();
        scheduler.spawn(Box::new(Gated));

        scheduler.tick(&mut world, 0.0);
        scheduler.tick(&mut world, 0.1);
        assert_eq!(scheduler.len(), 1);

        world.gate = true;
        world.log.push("gate open".into());
        scheduler.tick(&mut world, 0.2);
        assert!(scheduler.is_empty());
        assert_eq!(world.log.last().map(String::as_str), Some("passed"));
    }

    #[test]
    fn test_orphaned_task_never_resumes() {
        let owner = EntityId::new();
        let mut world = TestWorld::default();
        world.alive.insert(owner);

        let mut scheduler = Scheduler::new();
        scheduler.spawn(Box::new(TwoStep {
            owner: Some(owner),
            delay: 1.0,
            stage: 0,
        }));
        scheduler.tick(&mut world, 0.0);

        world.alive.remove(&owner);
        scheduler.tick(&mut world, 1.0);

        assert!(scheduler.is_empty());
        assert_eq!(world.log.len(), 1);
    }

    #[test]
    fn test_cancel_owned_by() {
        let owner = EntityId::new();
        let mut scheduler: Scheduler<TestWorld> = Scheduler::new();
        let first = scheduler.spawn(Box::new(TwoStep {
            owner: Some(owner),
            delay: 1.0,
            stage: 0,
        }));
        scheduler.spawn(Box::new(Gated));

        assert!(scheduler.is_live(first));
        assert_eq!(scheduler.task_names_for(owner), vec!["two-step"]);
        assert_eq!(scheduler.cancel_owned_by(owner), 1);
        assert!(!scheduler.is_live(first));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_spawned_tasks_run_next_tick() {
        let mut world = TestWorld::default();
        let mut scheduler = Scheduler::new();
        scheduler.spawn(Box::new(Parent));

        scheduler.tick(&mut world, 0.0);
        assert!(world.log.is_empty());
        assert_eq!(scheduler.len(), 1);

        scheduler.tick(&mut world, 0.1);
        assert_eq!(world.log, vec!["stage 1 at 0.1"]);
    }
}
