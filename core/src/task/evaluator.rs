use serde::Serialize;

use crate::recorder::Fix;
use crate::task::turnpoint::{Turnpoint, TurnpointKind};
use crate::task::{Task, TaskClock};

/// One scored turnpoint.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Reach {
    pub turnpoint: usize,
    pub kind: TurnpointKind,
    /// Index into the flight's fixes.
    pub fix: usize,
    pub timestamp: f64,
}

/// Single-cursor state machine over a time-ordered fix scan.
///
/// The cursor only moves forward; `reached_count` never decreases.
#[derive(Debug, Clone)]
pub struct TaskCursor<'t> {
    task: &'t Task,
    clock: TaskClock,
    next: usize,
    armed: bool,
    closed: bool,
    reached: Vec<Reach>,
}

impl<'t> TaskCursor<'t> {
    pub fn new(task: &'t Task, clock: TaskClock) -> Self {
        Self {
            task,
            clock,
            next: 0,
            armed: false,
            closed: false,
            reached: Vec::with_capacity(task.turnpoints.len()),
        }
    }

    /// Feeds the next fix. Returns false once later fixes cannot change the outcome.
    pub fn advance(&mut self, fix: &Fix) -> bool {
        if !self.is_open() {
            return false;
        }
        let task = self.task;
        let task_time = self.clock.task_time(fix.timestamp);
        if task_time > task.end_time {
            self.closed = true;
            return false;
        }
        while let Some(turnpoint) = task.turnpoints.get(self.next) {
            if !self.reaches(turnpoint, fix, task_time) {
                break;
            }
            self.reached.push(Reach {
                turnpoint: self.next,
                kind: turnpoint.kind,
                fix: fix.index,
                timestamp: fix.timestamp,
            });
            self.next += 1;
            self.armed = false;
        }
        self.is_open()
    }

    pub fn is_open(&self) -> bool {
        !self.closed && self.next < self.task.turnpoints.len()
    }

    pub fn reached_count(&self) -> usize {
        self.reached.len()
    }

    pub fn target(&self) -> Option<&'t Turnpoint> {
        self.task.turnpoints.get(self.next)
    }

    pub fn into_reached(self) -> Vec<Reach> {
        self.reached
    }

    fn reaches(&mut self, turnpoint: &Turnpoint, fix: &Fix, task_time: f64) -> bool {
        let inside = turnpoint.contains(fix);
        match turnpoint.kind {
            TurnpointKind::StartExit => self.crossing(inside, task_time),
            TurnpointKind::StartEnter => self.crossing(!inside, task_time),
            TurnpointKind::Cylinder
            | TurnpointKind::EndOfSpeedSection
            | TurnpointKind::GoalCylinder => inside,
        }
    }

    /// Arms on a fix on the starting side at or after the start time, then
    /// reaches on a later fix on the other side.
    fn crossing(&mut self, on_start_side: bool, task_time: f64) -> bool {
        if self.armed {
            return !on_start_side;
        }
        if on_start_side && task_time >= self.task.start_time {
            self.armed = true;
        }
        false
    }
}
