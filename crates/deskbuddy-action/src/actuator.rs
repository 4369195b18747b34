//! Shared actuator guard and the device boundary.
//!
//! Every hardware output goes through [`Actuators`], and every `Actuators`
//! access goes through [`ActuatorGuard::with_actuators`]. The guard is a
//! plain `std::sync::Mutex`: mutations are short and synchronous, and the
//! lock can never be held across an `.await`.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::error::ActuatorFault;
use crate::types::ActuatorState;

/// Physical (or simulated) actuator bindings.
///
/// Implementations perform the side effect only; [`Actuators`] records the
/// resulting state once the call succeeds.
pub trait DeviceLayer: Send {
    fn set_head_position(&mut self, radians: f64) -> Result<(), ActuatorFault>;
    fn set_arm_position(&mut self, radians: f64) -> Result<(), ActuatorFault>;
    fn set_wheel_velocity(&mut self, left: f64, right: f64) -> Result<(), ActuatorFault>;
    fn set_leds(&mut self, left: bool, right: bool) -> Result<(), ActuatorFault>;
    fn speak(&mut self, message: &str) -> Result<(), ActuatorFault>;
}

/// A device that only logs what it would do.
#[derive(Debug, Default)]
pub struct SimulatedDevice;

impl DeviceLayer for SimulatedDevice {
    fn set_head_position(&mut self, radians: f64) -> Result<(), ActuatorFault> {
        debug!(radians, "head position");
        Ok(())
    }

    fn set_arm_position(&mut self, radians: f64) -> Result<(), ActuatorFault> {
        debug!(radians, "arm position");
        Ok(())
    }

    fn set_wheel_velocity(&mut self, left: f64, right: f64) -> Result<(), ActuatorFault> {
        debug!(left, right, "wheel velocity");
        Ok(())
    }

    fn set_leds(&mut self, left: bool, right: bool) -> Result<(), ActuatorFault> {
        debug!(left, right, "leds");
        Ok(())
    }

    fn speak(&mut self, message: &str) -> Result<(), ActuatorFault> {
        info!(message, "speaking");
        Ok(())
    }
}

/// The actuator outputs plus the device that drives them.
pub struct Actuators {
    state: ActuatorState,
    device: Box<dyn DeviceLayer>,
}

impl Actuators {
    pub fn new(device: Box<dyn DeviceLayer>) -> Self {
        Self {
            state: ActuatorState::default(),
            device,
        }
    }

    pub fn state(&self) -> &ActuatorState {
        &self.state
    }

    pub fn set_head(&mut self, radians: f64) -> Result<(), ActuatorFault> {
        self.device.set_head_position(radians)?;
        self.state.head_position = radians;
        Ok(())
    }

    pub fn set_arm(&mut self, radians: f64) -> Result<(), ActuatorFault> {
        self.device.set_arm_position(radians)?;
        self.state.arm_position = radians;
        Ok(())
    }

    pub fn set_wheels(&mut self, left: f64, right: f64) -> Result<(), ActuatorFault> {
        self.device.set_wheel_velocity(left, right)?;
        self.state.left_wheel_velocity = left;
        self.state.right_wheel_velocity = right;
        Ok(())
    }

    pub fn set_leds(&mut self, left: bool, right: bool) -> Result<(), ActuatorFault> {
        self.device.set_leds(left, right)?;
        self.state.led_left = left;
        self.state.led_right = right;
        Ok(())
    }

    pub fn speak(&mut self, message: &str) -> Result<(), ActuatorFault> {
        self.device.speak(message)?;
        self.state.last_message = Some(message.to_string());
        Ok(())
    }

    /// Drive every output back to neutral.
    ///
    /// All outputs are attempted even if one faults; the first fault is
    /// returned.
    pub fn reset(&mut self) -> Result<(), ActuatorFault> {
        let results = [
            self.set_wheels(0.0, 0.0),
            self.set_head(0.0),
            self.set_arm(0.0),
            self.set_leds(false, false),
        ];
        self.state.last_message = None;
        results.into_iter().collect()
    }
}

impl std::fmt::Debug for Actuators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actuators")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Mutual exclusion around [`Actuators`].
///
/// No fairness or ordering between callers. A mutation that panics does not
/// poison the guard for later callers.
#[derive(Debug)]
pub struct ActuatorGuard {
    inner: Mutex<Actuators>,
}

impl ActuatorGuard {
    pub fn new(device: Box<dyn DeviceLayer>) -> Self {
        Self {
            inner: Mutex::new(Actuators::new(device)),
        }
    }

    pub fn simulated() -> Self {
        Self::new(Box::new(SimulatedDevice))
    }

    /// Run `mutation` with exclusive access to the actuators.
    pub fn with_actuators<R>(&self, mutation: impl FnOnce(&mut Actuators) -> R) -> R {
        let mut actuators = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        mutation(&mut actuators)
    }

    pub fn snapshot(&self) -> ActuatorState {
        self.with_actuators(|a| a.state().clone())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::BrokenSpeaker;
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_setters_update_state() {
        let guard = ActuatorGuard::simulated();
        guard.with_actuators(|a| {
            a.set_head(0.5)?;
            a.set_arm(-0.2)?;
            a.set_wheels(1.0, -1.0)?;
            a.set_leds(true, false)?;
            a.speak("hi")
        })
        .unwrap();

        let state = guard.snapshot();
        assert_eq!(state.head_position, 0.5);
        assert_eq!(state.arm_position, -0.2);
        assert_eq!(state.left_wheel_velocity, 1.0);
        assert_eq!(state.right_wheel_velocity, -1.0);
        assert!(state.led_left);
        assert!(!state.led_right);
        assert_eq!(state.last_message.as_deref(), Some("hi"));
    }

    #[test]
    fn test_reset_returns_to_neutral() {
        let guard = ActuatorGuard::simulated();
        guard
            .with_actuators(|a| {
                a.set_head(0.7)?;
                a.set_leds(true, true)?;
                a.speak("hello")
            })
            .unwrap();
        guard.with_actuators(|a| a.reset()).unwrap();
        assert!(guard.snapshot().is_neutral());
    }

    #[test]
    fn test_fault_leaves_state_untouched() {
        let guard = ActuatorGuard::new(Box::new(BrokenSpeaker::default()));
        let err = guard.with_actuators(|a| a.speak("hello")).unwrap_err();
        assert_eq!(err.device, "speaker");
        assert_eq!(guard.snapshot().last_message, None);
    }

    #[test]
    fn test_panicking_mutation_does_not_poison() {
        let guard = Arc::new(ActuatorGuard::simulated());
        let g = guard.clone();
        let result = std::thread::spawn(move || {
            g.with_actuators(|a| {
                let _ = a.set_head(0.3);
                panic!("mutation blew up");
            })
        })
        .join();
        assert!(result.is_err());

        // Later callers still get in and see the partial write.
        assert_eq!(guard.snapshot().head_position, 0.3);
        guard.with_actuators(|a| a.set_head(0.0)).unwrap();
        assert_eq!(guard.snapshot().head_position, 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_lose_no_updates() {
        const N: usize = 64;
        let guard = Arc::new(ActuatorGuard::simulated());

        let mut handles = Vec::with_capacity(N);
        for _ in 0..N {
            let guard = guard.clone();
            handles.push(tokio::spawn(async move {
                tokio::task::yield_now().await;
                guard.with_actuators(|a| {
                    let next = a.state().head_position + 1.0;
                    a.set_head(next)
                })
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(guard.snapshot().head_position, N as f64);
    }
}
