//! Toss model rules
//!
//! Time advance and fling resolution. Deterministic for a given seed and
//! input sequence.

use rand::Rng;

use super::GamePhase;
use super::model::TossModel;
use crate::audio::SoundId;
use crate::events::GameEvent;

/// Flings aimed further sideways than this sail past the chimney
const GOAL_HALF_WIDTH: f32 = 0.9;
/// Goalie speed range after each bounce (units per second)
const GOALIE_MIN_SPEED: f32 = 0.4;
const GOALIE_MAX_SPEED: f32 = 1.2;

/// How a single fling ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlingOutcome {
    /// Not accepting throws in this phase
    Ignored,
    Goal,
    Blocked,
    /// Thrown backwards or wide
    Missed,
}

/// Advance the model by `delta_ms`
pub fn advance(model: &mut TossModel, delta_ms: u64) {
    match model.phase {
        GamePhase::Loading => {
            model.title_duration_ms = model.title_duration_ms.saturating_sub(delta_ms);
            if model.title_duration_ms == 0 {
                model.bus.publish(GameEvent::PlaySound(SoundId::CharacterAppear));
                model.set_phase(GamePhase::Waiting);
            }
        }
        GamePhase::Waiting => move_goalie(model, delta_ms),
        GamePhase::Playing => {
            move_goalie(model, delta_ms);
            model.time_left_ms = model.time_left_ms.saturating_sub(delta_ms);
            if model.time_left_ms == 0 {
                model.bus.publish(GameEvent::PlaySound(SoundId::Eliminate));
                model.set_phase(GamePhase::GameOver);
            }
        }
        GamePhase::GameOver => {}
    }
}

/// Slide the goalie, bouncing off the posts with a fresh random speed
fn move_goalie(model: &mut TossModel, delta_ms: u64) {
    let dt = delta_ms as f32 / 1000.0;
    let goalie = &mut model.goalie;
    goalie.x += goalie.speed * dt;

    if goalie.x.abs() >= 1.0 {
        let direction = -goalie.x.signum();
        goalie.x = goalie.x.clamp(-1.0, 1.0);
        let speed = model.rng.random_range(GOALIE_MIN_SPEED..GOALIE_MAX_SPEED);
        model.goalie.speed = direction * speed;
    }
}

/// Resolve one fling at `radians` (screen space, straight up is -π/2)
pub fn resolve_fling(model: &mut TossModel, radians: f32) -> FlingOutcome {
    match model.phase {
        GamePhase::Loading | GamePhase::GameOver => return FlingOutcome::Ignored,
        GamePhase::Waiting => model.set_phase(GamePhase::Playing),
        GamePhase::Playing => {}
    }

    model.throws += 1;
    model.bus.publish(GameEvent::PlaySound(SoundId::Throw));

    // Screen y grows downward: anything not pointing up misses.
    let lateral = radians.cos();
    if radians.sin() >= 0.0 || lateral.abs() > GOAL_HALF_WIDTH {
        model.bus.publish(GameEvent::PlaySound(SoundId::Splash));
        return FlingOutcome::Missed;
    }

    if (lateral - model.goalie.x).abs() <= model.goalie.reach {
        model.bus.publish(GameEvent::PlaySound(SoundId::Block));
        return FlingOutcome::Blocked;
    }

    model.add_score(1);
    model.bus.publish(GameEvent::PlaySound(SoundId::Goal));
    FlingOutcome::Goal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::sim::{ModelConfig, Simulation};
    use std::f32::consts::FRAC_PI_2;

    fn model() -> (TossModel, tokio::sync::broadcast::Receiver<GameEvent>) {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let config = ModelConfig {
            seed: 42,
            title_duration_ms: 100,
            round_duration_ms: 1000,
        };
        (TossModel::new(config, bus), rx)
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<GameEvent>) -> Vec<GameEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_title_then_waiting() {
        let (mut model, mut rx) = model();
        assert_eq!(model.phase(), GamePhase::Loading);

        model.update(60);
        assert_eq!(model.phase(), GamePhase::Loading);
        model.update(60);
        assert_eq!(model.phase(), GamePhase::Waiting);

        let events = drain(&mut rx);
        assert!(events.contains(&GameEvent::GameStateChanged(GamePhase::Waiting)));
    }

    #[test]
    fn test_fling_ignored_while_loading() {
        let (mut model, _rx) = model();
        assert_eq!(resolve_fling(&mut model, -FRAC_PI_2), FlingOutcome::Ignored);
        assert_eq!(model.throws, 0);
    }

    #[test]
    fn test_first_fling_starts_play() {
        let (mut model, mut rx) = model();
        model.update(100);
        drain(&mut rx);

        // Goalie parked far right so a straight throw scores
        model.goalie.x = 1.0;
        assert_eq!(resolve_fling(&mut model, -FRAC_PI_2), FlingOutcome::Goal);
        assert_eq!(model.phase(), GamePhase::Playing);
        assert_eq!(model.score(), 1);

        let events = drain(&mut rx);
        assert_eq!(events[0], GameEvent::GameStateChanged(GamePhase::Playing));
        assert!(events.contains(&GameEvent::ScoreChanged(1)));
    }

    #[test]
    fn test_goalie_blocks_and_backwards_misses() {
        let (mut model, _rx) = model();
        model.update(100);
        model.goalie.x = 0.0;
        model.goalie.speed = 0.0;
        assert_eq!(resolve_fling(&mut model, -FRAC_PI_2), FlingOutcome::Blocked);
        assert_eq!(resolve_fling(&mut model, FRAC_PI_2), FlingOutcome::Missed);
        assert_eq!(model.score(), 0);
        assert_eq!(model.throws, 2);
    }

    #[test]
    fn test_round_ends_in_game_over() {
        let (mut model, mut rx) = model();
        model.update(100);
        model.on_fling(FRAC_PI_2);
        model.update(999);
        assert_eq!(model.phase(), GamePhase::Playing);
        model.update(1);
        assert_eq!(model.phase(), GamePhase::GameOver);

        let events = drain(&mut rx);
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameStateChanged(GamePhase::GameOver))
        );

        // Frozen after game over
        model.on_fling(-FRAC_PI_2);
        assert_eq!(model.throws, 1);
    }

    #[test]
    fn test_goalie_stays_in_bounds() {
        let (mut model, _rx) = model();
        model.update(100);
        for _ in 0..1000 {
            model.update(16);
            assert!(model.goalie.x.abs() <= 1.0);
        }
    }

    #[test]
    fn test_soft_reset_returns_to_waiting() {
        let (mut model, _rx) = model();
        model.update(100);
        model.goalie.x = 1.0;
        model.goalie.speed = 0.0;
        model.on_fling(-FRAC_PI_2);
        model.update(1000);
        assert_eq!(model.phase(), GamePhase::GameOver);

        model.reset(false);
        assert_eq!(model.phase(), GamePhase::Waiting);
        assert_eq!(model.score(), 0);
        assert_eq!(model.time_left_ms, 1000);

        model.reset(true);
        assert_eq!(model.phase(), GamePhase::Loading);
        assert_eq!(model.title_duration_ms(), 100);
    }

    #[test]
    fn test_determinism() {
        let (mut a, _rx_a) = model();
        let (mut b, _rx_b) = model();
        let flings = [-1.2, -FRAC_PI_2, -2.0, -1.7, -0.9];
        for (i, angle) in flings.iter().enumerate() {
            a.update(100 + i as u64 * 37);
            b.update(100 + i as u64 * 37);
            a.on_fling(*angle);
            b.on_fling(*angle);
        }
        assert_eq!(a.score(), b.score());
        assert!((a.goalie.x - b.goalie.x).abs() < 1e-6);
    }
}
