//! Per-vehicle schedule.
//!
//! # Invariants
//!
//! - Tasks are ordered and contiguous: `tasks[i].end == tasks[i + 1].begin`.
//! - The first task begins at the horizon start and the last ends at the
//!   horizon end.
//! - Every task has positive duration.
//! - Location is continuous: `tasks[i].to == tasks[i + 1].from`.
//! - Statuses never increase along the list: any number of `Performed`
//!   tasks, at most one `Started`, then only `Planned` tasks.
//!
//! Every mutating method preserves these or returns an error without
//! touching the schedule.

use drt_core::{NodeId, SimTime};

use crate::{ScheduleError, ScheduleResult, Task, TaskKind, TaskStatus};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    tasks: Vec<Task>,
}

impl Schedule {
    /// A schedule holding one `Planned` Stay at `node` over `[start, end)`.
    pub fn new(node: NodeId, start: SimTime, end: SimTime) -> ScheduleResult<Self> {
        if end <= start {
            return Err(ScheduleError::InvalidHorizon { start, end });
        }
        Ok(Self { tasks: vec![Task::stay(node, start, end)] })
    }

    /// Like [`new`](Self::new) with an energy-aware initial Stay.
    pub fn with_idle_energy(
        node: NodeId,
        start: SimTime,
        end: SimTime,
        energy_kwh: f64,
    ) -> ScheduleResult<Self> {
        let mut s = Self::new(node, start, end)?;
        s.tasks[0].set_energy(Some(energy_kwh));
        Ok(s)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, idx: usize) -> ScheduleResult<&Task> {
        self.tasks.get(idx).ok_or(ScheduleError::NoSuchTask(idx))
    }

    pub fn start(&self) -> SimTime {
        self.tasks.first().map_or(SimTime::ZERO, |t| t.begin)
    }

    pub fn end(&self) -> SimTime {
        self.tasks.last().map_or(SimTime::ZERO, |t| t.end)
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// Index of the task covering `t`.
    pub fn current_index(&self, t: SimTime) -> ScheduleResult<usize> {
        if t < self.start() || t >= self.end() {
            return Err(ScheduleError::OutsideHorizon(t));
        }
        Ok(self.tasks.partition_point(|task| task.begin <= t) - 1)
    }

    /// The unique task covering `t`.
    pub fn current_task(&self, t: SimTime) -> ScheduleResult<&Task> {
        self.current_index(t).map(|i| &self.tasks[i])
    }

    /// The final task if it is a Stay, with its index.
    pub fn trailing_stay(&self) -> Option<(usize, &Task)> {
        let idx = self.tasks.len().checked_sub(1)?;
        let last = &self.tasks[idx];
        last.is_stay().then_some((idx, last))
    }

    /// The last task that is not the trailing Stay.
    pub fn last_committed(&self) -> Option<&Task> {
        match self.trailing_stay() {
            Some((idx, _)) => idx.checked_sub(1).map(|i| &self.tasks[i]),
            None => self.tasks.last(),
        }
    }

    /// Tasks that are not yet `Performed`, in order.
    pub fn unperformed(&self) -> impl Iterator<Item = (usize, &Task)> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status() != TaskStatus::Performed)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Carve `task` from the head of the `Planned` Stay at `at`.
    ///
    /// The task must begin where the Stay begins (and therefore where its
    /// predecessor ends), start at the Stay's location and end no later than
    /// the Stay.  The Stay shrinks to `[task.end, stay.end)` at `task.to`,
    /// and disappears if nothing is left.  Returns the index of the inserted
    /// task, which is always `at`.  After a Charge the remaining Stay is
    /// docked at that charger.
    pub fn insert(&mut self, task: Task, at: usize) -> ScheduleResult<usize> {
        let bad = |reason: String| Err(ScheduleError::InvalidInsertion { at, reason });

        let Some(stay) = self.tasks.get(at) else {
            return bad(format!("index beyond schedule of {} task(s)", self.tasks.len()));
        };
        if !stay.is_stay() {
            return bad(format!("target is a {} task, not a stay", stay.kind.label()));
        }
        if stay.status() != TaskStatus::Planned {
            return bad(format!("target stay is {:?}", stay.status()));
        }
        if task.status() != TaskStatus::Planned {
            return bad(format!("inserted task is {:?}", task.status()));
        }
        if task.end <= task.begin {
            return bad(format!("empty task {}..{}", task.begin, task.end));
        }
        if task.begin != stay.begin {
            return bad(format!("task begins at {}, stay begins at {}", task.begin, stay.begin));
        }
        if task.end > stay.end {
            return bad(format!("task ends at {}, after the stay ends at {}", task.end, stay.end));
        }
        if task.from != stay.from {
            return bad(format!("task starts at {}, vehicle is at {}", task.from, stay.from));
        }
        if at + 1 < self.tasks.len() && task.to != stay.to {
            return bad(format!("task moves the vehicle to {} before a task starting at {}", task.to, stay.to));
        }

        let (new_begin, new_node, docked) = (task.end, task.to, task.docks_at());
        let stay = &mut self.tasks[at];
        if new_begin == stay.end {
            self.tasks[at] = task;
        } else {
            stay.trim_head(new_begin);
            stay.from = new_node;
            stay.to = new_node;
            stay.kind = TaskKind::Stay { charger: docked };
            self.tasks.insert(at, task);
        }

        debug_assert!(self.validate().is_ok(), "{:?}", self.validate());
        Ok(at)
    }

    /// Split the Stay covering `t` into `[begin, t)` and `[t, end)`.
    ///
    /// The Stay may be `Planned` or `Started`; a started Stay keeps its
    /// status for the first part and the second part is `Planned`.  `t` must
    /// lie strictly inside the Stay.  Returns `(before_idx, after_idx)`.
    pub fn split_stay_at(&mut self, t: SimTime) -> ScheduleResult<(usize, usize)> {
        let idx = self.current_index(t)?;
        let stay = &self.tasks[idx];
        let bad = |reason: String| Err(ScheduleError::InvalidInsertion { at: idx, reason });

        if !stay.is_stay() {
            return bad(format!("cannot split a {} task", stay.kind.label()));
        }
        if stay.status() == TaskStatus::Performed {
            return bad("cannot split a performed stay".into());
        }
        if t == stay.begin {
            return bad(format!("split point {t} is the stay's own begin"));
        }

        let tail = self.tasks[idx].split_off(t);
        self.tasks.insert(idx + 1, tail);
        Ok((idx, idx + 1))
    }

    /// Index of a `Planned` Stay beginning exactly at `t`, splitting the
    /// Stay covering `t` if necessary.
    pub fn insertion_point(&mut self, t: SimTime) -> ScheduleResult<usize> {
        let idx = self.current_index(t)?;
        let task = &self.tasks[idx];
        if task.begin == t {
            if task.is_stay() && task.status() == TaskStatus::Planned {
                return Ok(idx);
            }
            return Err(ScheduleError::InvalidInsertion {
                at: idx,
                reason: format!("{} task at {t} is not a planned stay", task.kind.label()),
            });
        }
        self.split_stay_at(t).map(|(_, after)| after)
    }

    /// Advance the status of the task at `idx`.  Tasks must be advanced in
    /// schedule order, so a task can only start once its predecessor has
    /// been performed.
    pub fn advance(&mut self, idx: usize, status: TaskStatus, at: SimTime) -> ScheduleResult<&Task> {
        if idx >= self.tasks.len() {
            return Err(ScheduleError::NoSuchTask(idx));
        }
        if status == TaskStatus::Started
            && idx > 0
            && self.tasks[idx - 1].status() != TaskStatus::Performed
        {
            return Err(ScheduleError::InvalidTransition {
                from: self.tasks[idx - 1].status(),
                to: TaskStatus::Started,
            });
        }
        self.tasks[idx].advance(status, at)?;
        Ok(&self.tasks[idx])
    }

    /// Give every task from `idx` on back to idle time: they are replaced
    /// by one `Planned` Stay from task `idx`'s begin and location to the
    /// horizon end, carrying `energy_kwh`.  All of them must be `Planned`.
    pub fn retract_from(&mut self, idx: usize, energy_kwh: Option<f64>) -> ScheduleResult<()> {
        let first = self.get(idx)?;
        let (node, begin) = (first.from, first.begin);
        if let Some((i, task)) = self.tasks[idx..]
            .iter()
            .enumerate()
            .find(|(_, t)| t.status() != TaskStatus::Planned)
        {
            return Err(ScheduleError::InvalidInsertion {
                at: idx + i,
                reason: format!("cannot retract a {:?} {} task", task.status(), task.kind.label()),
            });
        }

        let mut stay = Task::stay(node, begin, self.end());
        stay.kind = TaskKind::Stay { charger: idx.checked_sub(1).and_then(|i| self.tasks[i].docks_at()) };
        stay.set_energy(energy_kwh);
        self.tasks.truncate(idx);
        self.tasks.push(stay);

        debug_assert!(self.validate().is_ok(), "{:?}", self.validate());
        Ok(())
    }

    /// Turn the `Planned` task at `idx` into a Stay over the same interval
    /// and place.  Drives cannot be vacated since they move the vehicle.
    pub fn vacate(&mut self, idx: usize) -> ScheduleResult<()> {
        let task = self.tasks.get_mut(idx).ok_or(ScheduleError::NoSuchTask(idx))?;
        if task.status() != TaskStatus::Planned || matches!(task.kind, TaskKind::Drive { .. }) {
            return Err(ScheduleError::InvalidInsertion {
                at: idx,
                reason: format!("cannot vacate a {:?} {} task", task.status(), task.kind.label()),
            });
        }
        task.kind = TaskKind::Stay { charger: None };
        Ok(())
    }

    /// Replace the energy delta of a task that has not been performed yet.
    pub fn override_energy(&mut self, idx: usize, kwh: f64) -> ScheduleResult<()> {
        let task = self.tasks.get_mut(idx).ok_or(ScheduleError::NoSuchTask(idx))?;
        if task.status() == TaskStatus::Performed {
            return Err(ScheduleError::InvalidInsertion {
                at: idx,
                reason: "energy of a performed task is history".into(),
            });
        }
        task.set_energy(Some(kwh));
        Ok(())
    }

    // ── Validation ────────────────────────────────────────────────────────

    /// Check every structural invariant listed in the module docs.
    pub fn validate(&self) -> ScheduleResult<()> {
        let err = |msg: String| Err(ScheduleError::Invariant(msg));
        if self.tasks.is_empty() {
            return err("schedule has no tasks".into());
        }
        let mut seen_started = false;
        let mut prev_status = TaskStatus::Performed;
        for (i, t) in self.tasks.iter().enumerate() {
            if t.end <= t.begin {
                return err(format!("task {i} is empty ({}..{})", t.begin, t.end));
            }
            if !matches!(t.kind, TaskKind::Drive { .. }) && t.from != t.to {
                return err(format!("non-drive task {i} moves from {} to {}", t.from, t.to));
            }
            if t.status() > prev_status {
                return err(format!("task {i} is {:?} after a {:?} task", t.status(), prev_status));
            }
            if t.status() == TaskStatus::Started {
                if seen_started {
                    return err(format!("task {i} is a second started task"));
                }
                seen_started = true;
            }
            prev_status = t.status();
            if let Some(next) = self.tasks.get(i + 1) {
                if t.end != next.begin {
                    return err(format!("gap or overlap between task {i} and {}", i + 1));
                }
                if t.to != next.from {
                    return err(format!("task {} starts at {}, task {i} ends at {}", i + 1, next.from, t.to));
                }
            }
        }
        Ok(())
    }
}
