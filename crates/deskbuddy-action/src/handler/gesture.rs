//! Multi-phase gestures.
//!
//! Each gesture is sequential code inside one action: a mutation under the
//! guard, then a hold with the guard released.

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::Action;
use crate::scheduler::ActionContext;

/// Tilt the head right, left, then back to center.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wave;

const WAVE_POSITIONS: [f64; 3] = [0.5, -0.5, 0.0];

#[async_trait]
impl Action for Wave {
    fn name(&self) -> &'static str {
        "wave"
    }

    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError> {
        for position in WAVE_POSITIONS {
            ctx.actuate(|a| a.set_head(position))?;
            ctx.hold(0.5).await;
        }
        Ok(())
    }
}

/// Flash both eye LEDs.
#[derive(Debug, Clone, Copy)]
pub struct Blink {
    pub times: u32,
}

impl Default for Blink {
    fn default() -> Self {
        Self { times: 3 }
    }
}

#[async_trait]
impl Action for Blink {
    fn name(&self) -> &'static str {
        "blink"
    }

    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError> {
        for i in 0..self.times {
            ctx.actuate(|a| a.set_leds(true, true))?;
            ctx.hold(0.3).await;
            ctx.actuate(|a| a.set_leds(false, false))?;
            ctx.hold(0.3).await;
            tracing::debug!(blink = i + 1, of = self.times, "blink");
        }
        Ok(())
    }
}

/// Pause, then scan the head left and right, a few cycles over.
#[derive(Debug, Clone, Copy)]
pub struct Patrol {
    pub cycles: u32,
}

impl Default for Patrol {
    fn default() -> Self {
        Self { cycles: 5 }
    }
}

#[async_trait]
impl Action for Patrol {
    fn name(&self) -> &'static str {
        "patrol"
    }

    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError> {
        for _ in 0..self.cycles {
            ctx.hold(1.0).await;
            ctx.actuate(|a| a.set_head(0.7))?;
            ctx.hold(0.5).await;
            ctx.actuate(|a| a.set_head(-0.7))?;
            ctx.hold(0.5).await;
        }
        ctx.actuate(|a| a.set_head(0.0))?;
        Ok(())
    }
}

/// Head bobs with alternating eye flashes on each beat.
#[derive(Debug, Clone, Copy)]
pub struct Dance {
    pub beats: u32,
}

impl Default for Dance {
    fn default() -> Self {
        Self { beats: 4 }
    }
}

#[async_trait]
impl Action for Dance {
    fn name(&self) -> &'static str {
        "dance"
    }

    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError> {
        for beat in 0..self.beats {
            let even = beat % 2 == 0;
            ctx.actuate(|a| {
                a.set_head(if even { 0.5 } else { -0.5 })?;
                a.set_leds(!even, even)
            })?;
            ctx.hold(0.8).await;
        }
        ctx.actuate(|a| {
            a.set_head(0.0)?;
            a.set_leds(false, false)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::instant_scheduler;

    #[tokio::test]
    async fn test_wave_ends_centered() {
        let scheduler = instant_scheduler();
        Wave.run(scheduler.context()).await.unwrap();
        assert_eq!(scheduler.context().actuators().snapshot().head_position, 0.0);
    }

    #[tokio::test]
    async fn test_blink_ends_dark() {
        let scheduler = instant_scheduler();
        Blink::default().run(scheduler.context()).await.unwrap();
        let state = scheduler.context().actuators().snapshot();
        assert!(!state.led_left);
        assert!(!state.led_right);
    }

    #[tokio::test]
    async fn test_patrol_and_dance_return_to_neutral() {
        let scheduler = instant_scheduler();
        Patrol { cycles: 2 }.run(scheduler.context()).await.unwrap();
        Dance::default().run(scheduler.context()).await.unwrap();
        assert!(scheduler.context().actuators().snapshot().is_neutral());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wave_releases_guard_between_phases() {
        use deskbuddy_core::config::ActionsConfig;
        use std::sync::Arc;

        let ctx = ActionContext::new(
            Arc::new(crate::actuator::ActuatorGuard::simulated()),
            &ActionsConfig::default(),
        );
        let wave_ctx = ctx.clone();
        let wave = tokio::spawn(async move { Wave.run(&wave_ctx).await });

        // Mid-wave the head is reachable by other callers.
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        assert_eq!(ctx.actuators().snapshot().head_position, 0.5);
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        assert_eq!(ctx.actuators().snapshot().head_position, -0.5);

        wave.await.unwrap().unwrap();
    }
}
