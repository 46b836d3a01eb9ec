//! Property tests for the motion engine.

use proptest::prelude::*;
use stepper_server::config::HomingConfig;
use stepper_server::{Completion, Direction, HomeOutcome, MoveOutcome};

use super::support::{engine, run_to_idle};

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Clockwise), Just(Direction::CounterClockwise)]
}

/// Potentiometer that reads zero at home and grows with the distance.
fn pot_sample(position: i64) -> u16 {
    u16::try_from(position.unsigned_abs().saturating_mul(16)).unwrap_or(u16::MAX)
}

proptest! {
    /// After a completed relative move the position moved by exactly
    /// `steps` in the requested direction.
    #[test]
    fn prop_relative_move_delta(
        start in -500i64..500,
        steps in 0i64..2_000,
        dir in direction(),
        speed in 1i64..20_000,
    ) {
        let (mut engine, timer) = engine();
        engine.move_to(start, 1_000).unwrap();
        run_to_idle(&mut engine);

        engine.move_relative(steps, dir, speed).unwrap();
        let issued = run_to_idle(&mut engine);

        prop_assert_eq!(i64::from(issued), steps);
        prop_assert_eq!(engine.position(), start + dir.sign() * steps);
        prop_assert_eq!(engine.state().steps_remaining, 0);
        prop_assert!(engine.state().is_idle());
        prop_assert!(timer.armed().is_none());
    }

    /// An absolute move ends exactly on its target.
    #[test]
    fn prop_move_to_reaches_target(
        start in -1_000i64..1_000,
        target in -1_000i64..1_000,
    ) {
        let (mut engine, _timer) = engine();
        engine.move_to(start, 800).unwrap();
        run_to_idle(&mut engine);
        engine.take_completion();

        let outcome = engine.move_to(target, 800).unwrap();
        run_to_idle(&mut engine);

        prop_assert_eq!(engine.position(), target);
        if target == start {
            prop_assert_eq!(outcome, MoveOutcome::AlreadyComplete);
            prop_assert_eq!(engine.take_completion(), None);
        } else {
            prop_assert_eq!(outcome, MoveOutcome::Started);
            prop_assert_eq!(
                engine.take_completion(),
                Some(Completion::Finished { position: target })
            );
        }
    }

    /// Stopping at any point keeps only the steps issued, and stopping again
    /// changes nothing.
    #[test]
    fn prop_stop_is_idempotent(
        steps in 1i64..500,
        dir in direction(),
        ticks_before_stop in 0u32..600,
    ) {
        let (mut engine, timer) = engine();
        engine.move_relative(steps, dir, 500).unwrap();
        for _ in 0..ticks_before_stop {
            engine.on_tick().unwrap();
        }

        engine.stop().unwrap();
        let stopped = engine.state();
        let issued = i64::from(ticks_before_stop).min(steps);
        prop_assert_eq!(stopped.position, dir.sign() * issued);
        prop_assert!(stopped.is_idle());
        prop_assert!(timer.armed().is_none());

        engine.stop().unwrap();
        engine.on_tick().unwrap();
        prop_assert_eq!(engine.state(), stopped);
    }

    /// Homing from anywhere converges to position zero with the reference
    /// confirming home.
    #[test]
    fn prop_home_converges(start in -3_000i64..3_000) {
        let (mut engine, _timer) = engine();
        engine.move_to(start, 1_000).unwrap();
        run_to_idle(&mut engine);

        let homing = HomingConfig::default();
        let mut polls = 0;
        loop {
            polls += 1;
            prop_assert!(polls <= 2, "homing did not converge from {}", start);
            match engine.home_with_sample(pot_sample(engine.position())).unwrap() {
                HomeOutcome::Homed => break,
                HomeOutcome::Moving => {
                    prop_assert_eq!(engine.state().target_position, Some(0));
                    run_to_idle(&mut engine);
                }
            }
        }

        prop_assert_eq!(engine.position(), 0);
        prop_assert!(homing.is_home(homing.scale(pot_sample(0))));
        prop_assert!(engine.state().is_idle());
    }
}
