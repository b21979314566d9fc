/// The step function: advances an attempt by one tick.
///
/// Processing order:
///   1. Mirrored movement (light by (dx, dy), shadow by (dx, -dy))
///   2. Clamp both avatars into the grid
///   3. Idle check (light position unchanged for > idle timeout)
///   4. Collision check (light first, then shadow)
///   5. Time-up check
///
/// The first terminal transition reached wins. Terminal phases are
/// sticky: stepping a finished attempt changes nothing.

use std::time::Duration;

use crate::domain::grid::{DirInput, Pos};
use super::event::{GameEvent, COUNTDOWN_SECS};
use super::world::{Avatar, LevelState, Phase};

/// What a tick produced: the phase after the tick, both avatar
/// positions, and the events raised along the way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepResult {
    pub phase: Phase,
    pub light: Pos,
    pub shadow: Pos,
    pub events: Vec<GameEvent>,
}

pub fn step(state: &mut LevelState, input: DirInput, now: Duration) -> StepResult {
    if state.phase.is_terminal() {
        return result(state, vec![]);
    }

    let mut events = Vec::new();
    state.tick += 1;
    let prev_secs = state.elapsed.as_secs();
    state.elapsed = now.saturating_sub(state.started_at);

    resolve_movement(state, input, &mut events);

    let finished = resolve_idle(state, now, &mut events)
        || resolve_collision(state, &mut events)
        || resolve_time_up(state, &mut events);

    if !finished {
        resolve_countdown(state, prev_secs, &mut events);
    }

    result(state, events)
}

fn result(state: &LevelState, events: Vec<GameEvent>) -> StepResult {
    StepResult {
        phase: state.phase,
        light: state.light,
        shadow: state.shadow,
        events,
    }
}

// ══════════════════════════════════════════════════════════════
// Movement: vertical mirrored, horizontal identical
// ══════════════════════════════════════════════════════════════

fn resolve_movement(state: &mut LevelState, input: DirInput, events: &mut Vec<GameEvent>) {
    let (dx, dy) = (input.dx(), input.dy());
    let grid = state.grid;

    let light = grid.clamp(state.light.offset(dx, dy));
    let shadow = grid.clamp(state.shadow.offset(dx, -dy));
    debug_assert!(grid.contains(light) && grid.contains(shadow));

    if light != state.light || shadow != state.shadow {
        state.light = light;
        state.shadow = shadow;
        events.push(GameEvent::Moved { light, shadow });
    } else if input.any() {
        events.push(GameEvent::Blocked);
    }
}

// ══════════════════════════════════════════════════════════════
// Rule checks (in order)
// ══════════════════════════════════════════════════════════════

/// Idle is about light's *position*: pushing against the border
/// with a key held still counts as standing still.
fn resolve_idle(state: &mut LevelState, now: Duration, events: &mut Vec<GameEvent>) -> bool {
    if state.light != state.last_light {
        state.last_light = state.light;
        state.last_move_at = now;
        state.idle_for = Duration::ZERO;
        return false;
    }

    state.idle_for = now.saturating_sub(state.last_move_at);
    if state.idle_for > state.timing.idle_timeout {
        state.phase = Phase::FailedIdle;
        events.push(GameEvent::IdleTimeout);
        return true;
    }
    false
}

fn resolve_collision(state: &mut LevelState, events: &mut Vec<GameEvent>) -> bool {
    if state.obstacles.is_empty() {
        return false;
    }
    let hit = if state.obstacles.hits_light(state.light) {
        Some((Avatar::Light, state.light))
    } else if state.obstacles.hits_shadow(state.shadow) {
        Some((Avatar::Shadow, state.shadow))
    } else {
        None
    };

    match hit {
        Some((avatar, at)) => {
            state.phase = Phase::FailedCollision(avatar);
            events.push(GameEvent::Collision { avatar, at });
            true
        }
        None => false,
    }
}

fn resolve_time_up(state: &mut LevelState, events: &mut Vec<GameEvent>) -> bool {
    if state.elapsed >= state.timing.level_duration {
        state.phase = Phase::Succeeded;
        events.push(GameEvent::TimeUp);
        return true;
    }
    false
}

fn resolve_countdown(state: &LevelState, prev_secs: u64, events: &mut Vec<GameEvent>) {
    let secs = state.elapsed.as_secs();
    if secs == prev_secs {
        return;
    }
    let remaining = state.timing.level_duration.as_secs().saturating_sub(secs);
    if (1..=COUNTDOWN_SECS).contains(&remaining) {
        events.push(GameEvent::Countdown { remaining_secs: remaining });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::domain::emotion::Emotion;
    use crate::domain::grid::Grid;
    use crate::domain::obstacles::ObstacleSet;
    use proptest::prelude::*;

    const TICK: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn level_with(light_obstacles: Vec<Pos>) -> LevelState {
        let rules = Rules::default();
        let obstacles = ObstacleSet::from_light(&rules.grid, light_obstacles);
        LevelState::new(1, Emotion::Neutral, &rules, obstacles, Duration::ZERO)
    }

    fn empty_level() -> LevelState {
        level_with(vec![])
    }

    /// Alternate right/left so light never stands still.
    fn wiggle(tick: u64) -> DirInput {
        if tick % 2 == 0 { DirInput::RIGHT } else { DirInput::LEFT }
    }

    // ── Mirrored movement ──

    #[test]
    fn up_moves_light_up_and_shadow_down() {
        let mut s = level_with(vec![]);
        s.light = Pos::new(5, 3);
        s.last_light = s.light;
        s.shadow = Pos::new(5, 6);
        let r = step(&mut s, DirInput::UP, TICK);
        assert_eq!(r.light, Pos::new(5, 2));
        assert_eq!(r.shadow, Pos::new(5, 7));
        assert!(r.events.contains(&GameEvent::Moved { light: Pos::new(5, 2), shadow: Pos::new(5, 7) }));
    }

    #[test]
    fn down_moves_light_down_and_shadow_up() {
        let mut s = empty_level();
        let r = step(&mut s, DirInput::DOWN, TICK);
        assert_eq!(r.light, Pos::new(1, 2));
        assert_eq!(r.shadow, Pos::new(1, 7));
    }

    #[test]
    fn horizontal_moves_both_the_same_way() {
        let mut s = empty_level();
        let r = step(&mut s, DirInput::RIGHT, TICK);
        assert_eq!(r.light, Pos::new(2, 1));
        assert_eq!(r.shadow, Pos::new(2, 8));
        let r = step(&mut s, DirInput::LEFT, TICK * 2);
        assert_eq!(r.light, Pos::new(1, 1));
        assert_eq!(r.shadow, Pos::new(1, 8));
    }

    #[test]
    fn diagonal_combines_both_rules() {
        let mut s = empty_level();
        let input = DirInput { down: true, right: true, ..DirInput::NONE };
        let r = step(&mut s, input, TICK);
        assert_eq!(r.light, Pos::new(2, 2));
        assert_eq!(r.shadow, Pos::new(2, 7));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut s = empty_level();
        let all = DirInput { up: true, down: true, left: true, right: true };
        let r = step(&mut s, all, TICK);
        assert_eq!(r.light, Pos::new(1, 1));
        assert_eq!(r.shadow, Pos::new(1, 8));
        assert_eq!(r.events, vec![GameEvent::Blocked]);
    }

    #[test]
    fn no_input_no_events() {
        let mut s = empty_level();
        let r = step(&mut s, DirInput::NONE, TICK);
        assert!(r.events.is_empty());
        assert_eq!(r.phase, Phase::Running);
    }

    // ── Clamping ──

    #[test]
    fn holding_up_clamps_each_avatar_at_its_border() {
        let mut s = empty_level();
        let mut now = Duration::ZERO;
        let mut prev = (s.light, s.shadow);
        for _ in 0..5 {
            now += TICK;
            let r = step(&mut s, DirInput::UP, now);
            assert!(r.light.y <= prev.0.y);
            assert!(r.shadow.y >= prev.1.y);
            prev = (r.light, r.shadow);
        }
        assert_eq!(s.light, Pos::new(1, 0));
        assert_eq!(s.shadow, Pos::new(1, 9));
        assert_eq!(s.phase, Phase::Running);
    }

    #[test]
    fn shadow_keeps_moving_while_light_is_pinned() {
        let mut s = empty_level();
        s.light = Pos::new(1, 0);
        s.last_light = s.light;
        s.shadow = Pos::new(1, 5);
        let r = step(&mut s, DirInput::UP, TICK);
        assert_eq!(r.light, Pos::new(1, 0));
        assert_eq!(r.shadow, Pos::new(1, 6));
    }

    // ── Idle ──

    #[test]
    fn idle_fails_only_after_strictly_more_than_timeout() {
        let mut s = empty_level();
        assert_eq!(step(&mut s, DirInput::NONE, ms(3000)).phase, Phase::Running);
        let r = step(&mut s, DirInput::NONE, ms(3001));
        assert_eq!(r.phase, Phase::FailedIdle);
        assert!(r.events.contains(&GameEvent::IdleTimeout));
    }

    #[test]
    fn movement_resets_idle_timer() {
        let mut s = empty_level();
        step(&mut s, DirInput::RIGHT, ms(2900));
        assert_eq!(s.last_move_at, ms(2900));
        assert_eq!(step(&mut s, DirInput::NONE, ms(5900)).phase, Phase::Running);
        assert_eq!(step(&mut s, DirInput::NONE, ms(5901)).phase, Phase::FailedIdle);
    }

    #[test]
    fn pushing_against_border_counts_as_idle() {
        let mut s = empty_level();
        // one real move to y=0 at t=100ms, then keep pushing up
        step(&mut s, DirInput::UP, TICK);
        assert_eq!(s.light, Pos::new(1, 0));
        let mut now = TICK;
        while now < ms(3100) {
            now += TICK;
            let r = step(&mut s, DirInput::UP, now);
            assert_eq!(r.phase, Phase::Running, "failed early at {now:?}");
        }
        // 3.2s since the move at 0.1s
        let r = step(&mut s, DirInput::UP, ms(3200));
        assert_eq!(r.phase, Phase::FailedIdle);
    }

    #[test]
    fn idle_wins_over_collision() {
        // light parked on an obstacle cell without the collision being seen yet
        let mut s = level_with(vec![Pos::new(1, 1)]);
        let r = step(&mut s, DirInput::NONE, ms(3500));
        assert_eq!(r.phase, Phase::FailedIdle);
        assert!(!r.events.iter().any(|e| matches!(e, GameEvent::Collision { .. })));
    }

    // ── Collision ──

    #[test]
    fn light_hits_obstacle() {
        let mut s = level_with(vec![Pos::new(2, 1)]);
        let r = step(&mut s, DirInput::RIGHT, TICK);
        assert_eq!(r.phase, Phase::FailedCollision(Avatar::Light));
        assert!(r.events.contains(&GameEvent::Collision { avatar: Avatar::Light, at: Pos::new(2, 1) }));
    }

    #[test]
    fn shadow_hits_reflected_obstacle() {
        // light obstacle (1,0) reflects to (1,9); shadow reaches it by pressing up
        let mut s = level_with(vec![Pos::new(1, 0)]);
        s.light = Pos::new(1, 2);
        s.last_light = s.light;
        let r = step(&mut s, DirInput::UP, TICK);
        assert_eq!(r.light, Pos::new(1, 1));
        assert_eq!(r.shadow, Pos::new(1, 9));
        assert_eq!(r.phase, Phase::FailedCollision(Avatar::Shadow));
    }

    #[test]
    fn light_collision_checked_before_shadow() {
        // (2,1) reflects to (2,8): both avatars land on obstacles together
        let mut s = level_with(vec![Pos::new(2, 1)]);
        let r = step(&mut s, DirInput::RIGHT, TICK);
        assert_eq!(r.shadow, Pos::new(2, 8));
        assert_eq!(r.phase, Phase::FailedCollision(Avatar::Light));
    }

    #[test]
    fn collision_wins_over_time_up() {
        let mut s = level_with(vec![Pos::new(2, 1)]);
        let r = step(&mut s, DirInput::RIGHT, Duration::from_secs(30));
        assert_eq!(r.phase, Phase::FailedCollision(Avatar::Light));
    }

    // ── Time up ──

    #[test]
    fn succeeds_when_level_time_reached() {
        let mut s = empty_level();
        let mut now = Duration::ZERO;
        let mut last = None;
        for t in 0..300 {
            now += TICK;
            last = Some(step(&mut s, wiggle(t), now));
            if s.phase.is_terminal() {
                break;
            }
        }
        let r = last.unwrap();
        assert_eq!(now, Duration::from_secs(30));
        assert_eq!(r.phase, Phase::Succeeded);
        assert!(r.events.contains(&GameEvent::TimeUp));
        assert_eq!(s.tick, 300);
    }

    #[test]
    fn countdown_in_final_seconds() {
        let mut s = empty_level();
        let mut seen = vec![];
        let mut now = Duration::ZERO;
        for t in 0..300 {
            now += TICK;
            let r = step(&mut s, wiggle(t), now);
            for e in r.events {
                if let GameEvent::Countdown { remaining_secs } = e {
                    seen.push(remaining_secs);
                }
            }
        }
        assert_eq!(seen, vec![5, 4, 3, 2, 1]);
    }

    // ── Terminal phases ──

    #[test]
    fn terminal_phase_is_sticky() {
        let mut s = empty_level();
        step(&mut s, DirInput::NONE, ms(4000));
        assert_eq!(s.phase, Phase::FailedIdle);
        let tick = s.tick;
        let r = step(&mut s, DirInput::RIGHT, ms(4100));
        assert_eq!(r.phase, Phase::FailedIdle);
        assert_eq!(r.light, Pos::new(1, 1));
        assert!(r.events.is_empty());
        assert_eq!(s.tick, tick);
    }

    // ── Bounds invariant ──

    fn any_input() -> impl Strategy<Value = DirInput> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>())
            .prop_map(|(up, down, left, right)| DirInput { up, down, left, right })
    }

    proptest! {
        #[test]
        fn positions_stay_in_bounds(inputs in prop::collection::vec(any_input(), 1..200)) {
            let mut s = empty_level();
            let grid = Grid::default();
            let mut now = Duration::ZERO;
            for input in inputs {
                now += TICK;
                let r = step(&mut s, input, now);
                prop_assert!(grid.contains(r.light));
                prop_assert!(grid.contains(r.shadow));
            }
        }

        #[test]
        fn mirror_relation_holds_away_from_borders(input in any_input()) {
            let mut s = empty_level();
            s.light = Pos::new(7, 2);
            s.last_light = s.light;
            s.shadow = Pos::new(7, 7);
            let r = step(&mut s, input, TICK);
            prop_assert_eq!(r.light.x - 7, r.shadow.x - 7);
            prop_assert_eq!(r.light.y - 2, -(r.shadow.y - 7));
        }
    }
}
