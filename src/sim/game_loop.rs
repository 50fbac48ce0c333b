//! The session state machine
//!
//! `Idle -> Running -> Terminated`, with `start()` re-entering `Running` from
//! anywhere. The driver calls two independent step functions on its own
//! timers: `tick` (about every 50 ms) and `advance_clock` (every second).
//! Every call runs to completion, so `collect` can interleave freely.

use glam::Vec2;

use super::config::{ConfigError, GameConfig};
use super::random::{RandomSource, SeededRandom};
use super::state::{
    EndReason, GameEvent, GamePhase, Pumpkin, PumpkinId, PumpkinVariant, SessionState,
};
use crate::level_for;
use crate::rewards::SessionSummary;

/// Owns one session at a time
#[derive(Debug, Clone)]
pub struct GameLoop<R = SeededRandom> {
    config: GameConfig,
    rng: R,
    phase: GamePhase,
    state: SessionState,
    /// Active pumpkins in spawn order
    pumpkins: Vec<Pumpkin>,
    /// Spawn cursor; reset only by `start()`
    last_spawn_ms: f64,
    /// Incremented by every `start()`, keeps ids from leaking across sessions
    session: u32,
    next_seq: u32,
    events: Vec<GameEvent>,
}

impl<R: RandomSource> GameLoop<R> {
    pub fn new(config: GameConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: SessionState::idle(config.session_seconds),
            config,
            rng,
            phase: GamePhase::Idle,
            pumpkins: Vec::new(),
            last_spawn_ms: 0.0,
            session: 0,
            next_seq: 0,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Read-only snapshot of the counters
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn pumpkins(&self) -> &[Pumpkin] {
        &self.pumpkins
    }

    /// Final numbers, once the session has ended
    pub fn summary(&self) -> Option<SessionSummary> {
        (self.phase == GamePhase::Terminated).then(|| self.state.summary())
    }

    /// Take queued events (oldest first)
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a fresh session
    pub fn start(&mut self) {
        self.session = self.session.wrapping_add(1);
        self.next_seq = 0;
        self.state = SessionState::fresh(self.config.session_seconds);
        self.pumpkins.clear();
        self.last_spawn_ms = 0.0;
        self.phase = GamePhase::Running;
        self.events.push(GameEvent::Started {
            session: self.session,
        });
        log::info!(
            "Session {} started ({}s, {}x{})",
            self.session,
            self.config.session_seconds,
            self.config.width,
            self.config.height
        );
    }

    /// Spawn (if due), advance and despawn. No-op unless running.
    pub fn tick(&mut self, now_ms: f64) {
        if !self.is_running() {
            log::trace!("tick ignored in {:?}", self.phase);
            return;
        }

        // Spawn
        if now_ms - self.last_spawn_ms > self.config.spawn_interval_ms(self.state.level) {
            self.spawn();
            self.last_spawn_ms = now_ms;
        }

        // Advance
        for pumpkin in &mut self.pumpkins {
            pumpkin.fall();
        }

        // Despawn (missed pumpkins cost nothing)
        let despawn_y = self.config.despawn_y();
        let events = &mut self.events;
        self.pumpkins.retain(|p| {
            if p.pos.y >= despawn_y {
                log::trace!("Pumpkin {} fell out", p.id);
                events.push(GameEvent::Despawned { id: p.id });
                false
            } else {
                true
            }
        });
    }

    /// Credit an active pumpkin. Returns false (and changes nothing) when the
    /// id is unknown, already collected, despawned, or the loop is not running.
    pub fn collect(&mut self, id: PumpkinId) -> bool {
        if !self.is_running() {
            log::debug!("collect {} ignored in {:?}", id, self.phase);
            return false;
        }
        let Some(idx) = self.pumpkins.iter().position(|p| p.id == id) else {
            log::debug!("collect {} ignored, not active", id);
            return false;
        };
        self.pumpkins.remove(idx);

        let old_level = self.state.level;
        self.state.collected += 1;
        self.state.score += self.config.collect_reward;
        self.state.level = level_for(self.state.collected, self.config.level_step);

        self.events.push(GameEvent::Collected {
            id,
            score: self.state.score,
            collected: self.state.collected,
            level: self.state.level,
        });
        if self.state.level > old_level {
            log::info!("Level up: {}", self.state.level);
            self.events.push(GameEvent::LevelUp {
                level: self.state.level,
            });
        }
        true
    }

    /// One second of session time. Ends the session when the timer hits zero.
    pub fn advance_clock(&mut self) {
        if !self.is_running() {
            log::trace!("clock ignored in {:?}", self.phase);
            return;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds == 0 {
            self.terminate(EndReason::TimeUp);
        }
    }

    /// End the session now. Idempotent.
    pub fn stop(&mut self) {
        if !self.is_running() {
            log::debug!("stop ignored in {:?}", self.phase);
            return;
        }
        self.terminate(EndReason::Stopped);
    }

    fn terminate(&mut self, reason: EndReason) {
        self.state.running = false;
        self.phase = GamePhase::Terminated;
        self.pumpkins.clear();
        let summary = self.state.summary();
        log::info!(
            "Session {} ended ({:?}): score {}, {} pumpkins, level {}",
            self.session,
            reason,
            summary.score,
            summary.pumpkins_collected,
            summary.level
        );
        self.events.push(GameEvent::Ended { summary, reason });
    }

    fn spawn(&mut self) {
        let level = self.state.level;
        let margin = self.config.spawn_margin_x;
        let x = margin + self.rng.next_f32() * (self.config.width - 2.0 * margin);
        let (min_speed, max_speed) = self.config.speed_range(level);
        let speed = min_speed + self.rng.next_f32() * (max_speed - min_speed);
        let size =
            self.config.min_size + self.rng.next_f32() * (self.config.max_size - self.config.min_size);
        let variant = PumpkinVariant::from_unit(self.rng.next_f32());

        self.next_seq += 1;
        let id = PumpkinId {
            session: self.session,
            seq: self.next_seq,
        };
        log::trace!("Spawned pumpkin {} at x={:.1} speed={:.2}", id, x, speed);
        self.pumpkins.push(Pumpkin {
            id,
            pos: Vec2::new(x, -self.config.spawn_offset_y),
            speed,
            size,
            variant,
        });
        self.events.push(GameEvent::Spawned { id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::ScriptedRandom;
    use proptest::prelude::*;

    fn new_loop(r: f32) -> GameLoop<ScriptedRandom> {
        GameLoop::new(GameConfig::default(), ScriptedRandom::constant(r)).unwrap()
    }

    /// Tick once per spawn interval until `n` pumpkins are active
    fn spawn_n(game: &mut GameLoop<ScriptedRandom>, n: usize, now: &mut f64) {
        while game.pumpkins().len() < n {
            *now += BASE_SPAWN_INTERVAL_MS;
            game.tick(*now);
        }
    }

    #[test]
    fn test_new_is_idle() {
        let game = new_loop(0.5);
        assert_eq!(game.phase(), GamePhase::Idle);
        assert!(!game.state().running);
        assert!(game.pumpkins().is_empty());
        assert!(game.summary().is_none());
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = GameConfig {
            height: 0.0,
            ..GameConfig::default()
        };
        assert!(GameLoop::new(config, ScriptedRandom::constant(0.5)).is_err());
    }

    #[test]
    fn test_calls_before_start_are_noops() {
        let mut game = new_loop(0.5);
        game.tick(5000.0);
        game.advance_clock();
        game.stop();
        assert!(!game.collect(PumpkinId { session: 0, seq: 1 }));
        assert_eq!(game.phase(), GamePhase::Idle);
        assert_eq!(*game.state(), SessionState::idle(SESSION_SECONDS));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_start_resets() {
        let mut game = new_loop(0.5);
        game.start();
        let mut now = 0.0;
        spawn_n(&mut game, 2, &mut now);
        let id = game.pumpkins()[0].id;
        assert!(game.collect(id));
        game.advance_clock();

        game.start();
        assert_eq!(*game.state(), SessionState::fresh(SESSION_SECONDS));
        assert!(game.pumpkins().is_empty());
        assert_eq!(game.phase(), GamePhase::Running);
    }

    #[test]
    fn test_no_premature_spawn() {
        let mut game = new_loop(0.5);
        game.start();
        // Level 1 interval is 900 ms
        game.tick(899.0);
        assert!(game.pumpkins().is_empty());
        game.tick(900.0);
        assert!(game.pumpkins().is_empty(), "comparison is strict");
        game.tick(900.5);
        assert_eq!(game.pumpkins().len(), 1);
        // Cursor moved; next spawn needs another full interval
        game.tick(1500.0);
        assert_eq!(game.pumpkins().len(), 1);
        game.tick(1801.0);
        assert_eq!(game.pumpkins().len(), 2);
    }

    #[test]
    fn test_spawn_uses_draws() {
        let config = GameConfig::default();
        let rng = ScriptedRandom::new(vec![0.0, 0.5, 0.5, 0.3]);
        let mut game = GameLoop::new(config, rng).unwrap();
        game.start();
        game.tick(1000.0);

        let p = &game.pumpkins()[0];
        assert_eq!(p.pos.x, SPAWN_MARGIN_X);
        // Spawned at -offset then advanced once
        assert_eq!(p.pos.y, -SPAWN_OFFSET_Y + p.speed);
        // Level 1: [2.5, 4.5], midpoint
        assert_eq!(p.speed, 3.5);
        assert_eq!(p.size, 50.0);
        assert_eq!(p.variant, PumpkinVariant::Orange);
        assert_eq!(p.id, PumpkinId { session: 1, seq: 1 });
    }

    #[test]
    fn test_spawn_x_stays_inside_margin() {
        let mut game = new_loop(1.0);
        game.start();
        game.tick(1000.0);
        let x = game.pumpkins()[0].pos.x;
        assert!(x >= SPAWN_MARGIN_X);
        assert!(x <= VIEWPORT_WIDTH - SPAWN_MARGIN_X);
    }

    #[test]
    fn test_despawn_without_penalty() {
        let mut game = new_loop(0.0);
        game.start();
        game.tick(1000.0);
        let id = game.pumpkins()[0].id;
        // speed 2.5 from y=-47.5 needs to reach 500
        let mut ticks = 1;
        while !game.pumpkins().is_empty() {
            // Far from the next spawn
            game.tick(1000.0 + ticks as f64);
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(game.state().score, 0);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::Despawned { id }));
        assert!(!game.collect(id));
    }

    #[test]
    fn test_level_progression_scenario() {
        let mut game = new_loop(0.5);
        game.start();
        let mut now = 0.0;
        for _ in 0..9 {
            spawn_n(&mut game, 1, &mut now);
            let id = game.pumpkins()[0].id;
            assert!(game.collect(id));
        }
        assert_eq!(game.state().level, 1);
        assert_eq!(game.state().score, 90);

        spawn_n(&mut game, 1, &mut now);
        let id = game.pumpkins()[0].id;
        assert!(game.collect(id));
        assert_eq!(game.state().level, 2);
        assert_eq!(game.state().score, 100);
        assert_eq!(game.state().collected, 10);

        let events = game.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::LevelUp { .. }))
                .count(),
            1
        );
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_double_collect_credits_once() {
        let mut game = new_loop(0.5);
        game.start();
        let mut now = 0.0;
        spawn_n(&mut game, 1, &mut now);
        let id = game.pumpkins()[0].id;
        assert!(game.collect(id));
        assert!(!game.collect(id));
        assert_eq!(game.state().collected, 1);
        assert_eq!(game.state().score, COLLECT_REWARD);
    }

    #[test]
    fn test_stale_id_from_previous_session() {
        let mut game = new_loop(0.5);
        game.start();
        let mut now = 0.0;
        spawn_n(&mut game, 1, &mut now);
        let old_id = game.pumpkins()[0].id;

        game.start();
        now = 0.0;
        spawn_n(&mut game, 1, &mut now);
        assert_eq!(game.pumpkins()[0].id.seq, old_id.seq);
        assert!(!game.collect(old_id));
        assert_eq!(game.state().collected, 0);
    }

    #[test]
    fn test_clock_runs_out() {
        let mut game = new_loop(0.5);
        game.start();
        for _ in 0..SESSION_SECONDS - 1 {
            game.advance_clock();
            assert!(game.is_running());
        }
        game.advance_clock();
        assert!(!game.state().running);
        assert_eq!(game.phase(), GamePhase::Terminated);
        assert_eq!(game.state().remaining_seconds, 0);
        assert_eq!(game.state().score, 0);

        let ended = game.drain_events().into_iter().last();
        assert_eq!(
            ended,
            Some(GameEvent::Ended {
                summary: SessionSummary {
                    score: 0,
                    pumpkins_collected: 0,
                    level: 1,
                },
                reason: EndReason::TimeUp,
            })
        );

        // Late timer events are ignored
        game.advance_clock();
        game.tick(1_000_000.0);
        assert_eq!(game.state().remaining_seconds, 0);
        assert!(game.pumpkins().is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut game = new_loop(0.5);
        game.start();
        let mut now = 0.0;
        spawn_n(&mut game, 3, &mut now);
        let id = game.pumpkins()[1].id;
        game.collect(id);
        game.advance_clock();

        game.stop();
        assert!(game.pumpkins().is_empty());
        let after_first = *game.state();
        let events_first = game.drain_events();
        assert!(matches!(
            events_first.last(),
            Some(GameEvent::Ended {
                reason: EndReason::Stopped,
                ..
            })
        ));

        game.stop();
        assert_eq!(*game.state(), after_first);
        assert!(game.drain_events().is_empty());
        assert_eq!(after_first.score, COLLECT_REWARD);
        assert_eq!(after_first.remaining_seconds, SESSION_SECONDS - 1);
        assert_eq!(
            game.summary(),
            Some(SessionSummary {
                score: COLLECT_REWARD,
                pumpkins_collected: 1,
                level: 1,
            })
        );
    }

    #[test]
    fn test_collect_after_stop_ignored() {
        let mut game = new_loop(0.5);
        game.start();
        let mut now = 0.0;
        spawn_n(&mut game, 1, &mut now);
        let id = game.pumpkins()[0].id;
        game.stop();
        assert!(!game.collect(id));
        assert_eq!(game.state().collected, 0);
    }

    #[test]
    fn test_spawn_speeds_up_with_level() {
        let mut game = new_loop(0.5);
        game.start();
        let mut now = 0.0;
        for _ in 0..10 {
            spawn_n(&mut game, 1, &mut now);
            let id = game.pumpkins()[0].id;
            game.collect(id);
        }
        assert_eq!(game.state().level, 2);
        // Level 2 interval is 800 ms
        let base = now;
        game.tick(base + 801.0);
        assert_eq!(game.pumpkins().len(), 1);
        assert_eq!(game.pumpkins()[0].speed, 4.0);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Tick(u16),
        CollectFirst,
        CollectLast,
        CollectStale,
        Clock,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0u16..1500).prop_map(Op::Tick),
            2 => Just(Op::CollectFirst),
            1 => Just(Op::CollectLast),
            1 => Just(Op::CollectStale),
            1 => Just(Op::Clock),
        ]
    }

    proptest! {
        #[test]
        fn prop_pumpkins_fall_by_speed(
            draws in prop::collection::vec(0.0f32..1.0, 1..16),
            steps in prop::collection::vec(0u16..1500, 1..200),
        ) {
            let mut game = GameLoop::new(GameConfig::default(), ScriptedRandom::new(draws)).unwrap();
            game.start();
            let mut now = 0.0;
            for step in steps {
                let before: Vec<_> = game.pumpkins().iter().map(|p| (p.id, p.pos, p.speed)).collect();
                now += step as f64;
                game.tick(now);
                for (id, pos, speed) in before {
                    if let Some(p) = game.pumpkins().iter().find(|p| p.id == id) {
                        prop_assert_eq!(p.pos.y, pos.y + speed);
                        prop_assert_eq!(p.pos.x, pos.x);
                    } else {
                        // Only the despawn rule may remove it during a tick
                        prop_assert!(pos.y + speed >= game.config().despawn_y());
                    }
                }
                for p in game.pumpkins() {
                    prop_assert!(p.pos.y < game.config().despawn_y());
                    prop_assert!(p.speed > 0.0);
                }
            }
        }

        #[test]
        fn prop_counters_consistent(
            seed in any::<u64>(),
            ops in prop::collection::vec(op_strategy(), 1..300),
        ) {
            let mut game = GameLoop::new(GameConfig::default(), SeededRandom::new(seed)).unwrap();
            game.start();
            let mut now = 0.0;
            let mut credited = std::collections::HashSet::new();
            let mut stale = None;
            for op in ops {
                let before = *game.state();
                match op {
                    Op::Tick(dt) => {
                        now += dt as f64;
                        game.tick(now);
                    }
                    Op::CollectFirst | Op::CollectLast => {
                        let target = if matches!(op, Op::CollectFirst) {
                            game.pumpkins().first().map(|p| p.id)
                        } else {
                            game.pumpkins().last().map(|p| p.id)
                        };
                        if let Some(id) = target {
                            prop_assert!(game.collect(id));
                            prop_assert!(credited.insert(id));
                            stale = Some(id);
                        }
                    }
                    Op::CollectStale => {
                        if let Some(id) = stale {
                            prop_assert!(!game.collect(id));
                            prop_assert_eq!(*game.state(), before);
                        }
                    }
                    Op::Clock => game.advance_clock(),
                }
                let s = game.state();
                prop_assert_eq!(s.level, s.collected / LEVEL_STEP + 1);
                prop_assert_eq!(s.score, s.collected as u64 * COLLECT_REWARD);
                prop_assert_eq!(s.collected as usize, credited.len());
                prop_assert!(s.remaining_seconds <= SESSION_SECONDS);
                prop_assert_eq!(s.running, game.is_running());
            }
        }
    }
}
