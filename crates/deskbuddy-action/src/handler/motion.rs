//! Wheel movement.

use async_trait::async_trait;
use deskbuddy_core::config::MotionConfig;

use crate::error::ActionError;
use crate::handler::Action;
use crate::scheduler::ActionContext;
use crate::types::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

impl Direction {
    pub fn from_command(command: Command) -> Option<Self> {
        match command {
            Command::Forward => Some(Direction::Forward),
            Command::Backward => Some(Direction::Backward),
            Command::TurnLeft => Some(Direction::TurnLeft),
            Command::TurnRight => Some(Direction::TurnRight),
            _ => None,
        }
    }

    /// `(left, right)` wheel velocities for this direction.
    pub fn wheel_velocities(self, motion: &MotionConfig) -> (f64, f64) {
        let max = motion.max_speed;
        let turn = motion.turn_speed;
        match self {
            Direction::Forward => (max, max),
            Direction::Backward => (-max, -max),
            Direction::TurnLeft => (-turn, turn),
            Direction::TurnRight => (turn, -turn),
        }
    }
}

/// Drive in one direction for a fixed time, then stop the wheels.
#[derive(Debug, Clone)]
pub struct Drive {
    pub direction: Direction,
    pub left: f64,
    pub right: f64,
    pub secs: f64,
}

impl Drive {
    pub fn new(direction: Direction, motion: &MotionConfig, secs: f64) -> Self {
        let (left, right) = direction.wheel_velocities(motion);
        Self {
            direction,
            left,
            right,
            secs,
        }
    }
}

#[async_trait]
impl Action for Drive {
    fn name(&self) -> &'static str {
        match self.direction {
            Direction::Forward => "drive_forward",
            Direction::Backward => "drive_backward",
            Direction::TurnLeft => "turn_left",
            Direction::TurnRight => "turn_right",
        }
    }

    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError> {
        ctx.actuate(|a| a.set_wheels(self.left, self.right))?;
        ctx.hold(self.secs).await;
        ctx.actuate(|a| a.set_wheels(0.0, 0.0))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} for {:.1}s", self.name(), self.secs)
    }
}
