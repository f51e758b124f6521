//! Unit tests for ra-engine.

use std::collections::BTreeSet;

use ra_config::{AllocationChannelConfig, RandomAccessConfig, SlottedAlohaConfig};
use ra_core::{AccessModel, AllocationChannelId, RandomSource, SimRng};

use crate::RandomAccess;

// ── Helpers ───────────────────────────────────────────────────────────────────

const CH0: AllocationChannelId = AllocationChannelId(0);
const CH1: AllocationChannelId = AllocationChannelId(1);

/// Random source whose real draws are pinned; integer draws stay random.
///
/// `real = 0.0` forces a backoff on any channel with a positive backoff
/// probability, `real = 0.999` prevents one.
struct PinnedReal {
    real: f64,
    ints: SimRng,
}

impl PinnedReal {
    fn new(real: f64) -> Self {
        Self { real, ints: SimRng::new(17) }
    }
}

impl RandomSource for PinnedReal {
    fn draw_int(&mut self, lo: u32, hi: u32) -> u32 {
        self.ints.draw_int(lo, hi)
    }

    fn draw_real01(&mut self) -> f64 {
        self.real
    }
}

/// Degenerate source: every integer draw returns the lower bound.
struct AlwaysLow;

impl RandomSource for AlwaysLow {
    fn draw_int(&mut self, lo: u32, _hi: u32) -> u32 {
        lo
    }

    fn draw_real01(&mut self) -> f64 {
        0.999
    }
}

/// 10-slot frame, 3 replicas, 2 packets per block, never backs off, no rate
/// limit in practice.
fn crdsa_channel() -> AllocationChannelConfig {
    AllocationChannelConfig {
        backoff_probability:             0.0,
        max_backoff_probability:         0.5,
        backoff_time_blocks:             3,
        payload_bytes:                   500,
        min_randomization_value:         0,
        max_randomization_value:         9,
        num_of_instances:                3,
        max_unique_payload_per_block:    2,
        max_consecutive_blocks_accessed: 1_000,
        min_idle_blocks:                 0,
    }
}

fn slotted_aloha(interval: f64) -> SlottedAlohaConfig {
    SlottedAlohaConfig { control_randomization_interval: interval, payload_bytes: None }
}

fn selector(model: AccessModel, channels: Vec<AllocationChannelConfig>) -> RandomAccess {
    RandomAccess::new(RandomAccessConfig::new(model, slotted_aloha(10.0), channels)).unwrap()
}

fn assert_valid_slot_sets(sets: &[BTreeSet<u32>], config: &AllocationChannelConfig) {
    let mut seen = BTreeSet::new();
    for set in sets {
        assert_eq!(set.len(), config.num_of_instances as usize, "replica count: {sets:?}");
        for &slot in set {
            assert!(
                (config.min_randomization_value..=config.max_randomization_value).contains(&slot),
                "slot {slot} out of range"
            );
            assert!(seen.insert(slot), "slot {slot} reused within one block: {sets:?}");
        }
    }
}

// ── AllocationChannelState ────────────────────────────────────────────────────

#[cfg(test)]
mod channel_state {
    use super::*;
    use crate::{AllocationChannelState, ChannelStatus};

    #[test]
    fn starts_free() {
        let s = AllocationChannelState::new(crdsa_channel());
        assert!(s.is_free());
        assert_eq!(s.status(), ChannelStatus::Free);
        assert_eq!(s.consecutive_blocks_used(), 0);
    }

    #[test]
    fn backoff_resets_consecutive_count() {
        let mut s = AllocationChannelState::new(crdsa_channel());
        s.register_block_used();
        s.register_block_used();
        assert_eq!(s.consecutive_blocks_used(), 2);
        s.enter_backoff();
        assert_eq!(s.status(), ChannelStatus::Backoff(3));
        assert_eq!(s.consecutive_blocks_used(), 0);
        assert!(!s.is_free());
    }

    #[test]
    fn reaching_limit_enters_idle() {
        let config = AllocationChannelConfig {
            max_consecutive_blocks_accessed: 2,
            min_idle_blocks:                 4,
            ..crdsa_channel()
        };
        let mut s = AllocationChannelState::new(config);
        assert!(!s.register_block_used());
        assert!(s.register_block_used());
        assert_eq!(s.status(), ChannelStatus::Idle(4));
        assert_eq!(s.consecutive_blocks_used(), 0);
    }

    #[test]
    fn tick_counts_down_and_floors_at_zero() {
        let mut s = AllocationChannelState::new(crdsa_channel());
        s.enter_backoff();
        s.tick();
        assert_eq!(s.status(), ChannelStatus::Backoff(2));
        s.tick();
        s.tick();
        assert_eq!(s.status(), ChannelStatus::Free);
        s.tick();
        assert_eq!(s.backoff_blocks_remaining(), 0);
        assert_eq!(s.idle_blocks_remaining(), 0);
    }

    #[test]
    fn status_display() {
        assert_eq!(ChannelStatus::Free.to_string(), "free");
        assert_eq!(ChannelStatus::Backoff(2).to_string(), "backoff(2)");
        assert_eq!(ChannelStatus::Idle(1).to_string(), "idle(1)");
    }
}

// ── FixedUplink ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod fixed_uplink {
    use crate::{FixedUplink, UplinkState};

    #[test]
    fn counts_candidates_by_size() {
        let uplink = FixedUplink::with_packets(vec![100, 500, 501, 2_000]);
        assert!(!uplink.are_buffers_empty());
        assert_eq!(uplink.num_candidate_packets(500), 2);
        assert_eq!(uplink.num_candidate_packets(99), 0);
        assert_eq!(uplink.num_candidate_packets(u32::MAX), 4);
    }

    #[test]
    fn empty_and_dama() {
        let uplink = FixedUplink::new();
        assert!(uplink.are_buffers_empty());
        assert!(!uplink.is_dama_available());
        assert!(uplink.with_dama().is_dama_available());
    }
}

// ── SlottedAlohaEngine ────────────────────────────────────────────────────────

#[cfg(test)]
mod slotted_aloha_engine {
    use ra_config::ConfigError;
    use ra_core::RaError;

    use super::*;
    use crate::{SlottedAlohaEngine, randomize_release_slot};

    #[test]
    fn zero_bound_is_error() {
        let mut rng = SimRng::new(0);
        assert_eq!(randomize_release_slot(0, &mut rng), Err(RaError::ZeroBound));
    }

    #[test]
    fn draws_below_bound_and_covers_it() {
        let mut rng = SimRng::new(3);
        let mut seen = BTreeSet::new();
        for _ in 0..2_000 {
            let slot = randomize_release_slot(10, &mut rng).unwrap();
            assert!(slot < 10);
            seen.insert(slot);
        }
        assert_eq!(seen.len(), 10, "every slot in [0, 10) should come up");
    }

    #[test]
    fn engine_rejects_bad_interval_and_keeps_old() {
        let mut engine = SlottedAlohaEngine::new(slotted_aloha(4.0)).unwrap();
        assert!(engine.set_control_randomization_interval(-1.0).is_err());
        assert_eq!(engine.config().interval_bound(), 4);
        engine.set_control_randomization_interval(7.5).unwrap();
        assert_eq!(engine.config().interval_bound(), 8);
        assert!(SlottedAlohaEngine::new(slotted_aloha(0.0)).is_err());
    }

    #[test]
    fn payload_class_update() {
        let mut engine = SlottedAlohaEngine::new(slotted_aloha(4.0)).unwrap();
        assert_eq!(engine.payload_bytes(), None);
        assert!(engine.set_payload_bytes(Some(0)).is_err());
        engine.set_payload_bytes(Some(300)).unwrap();
        assert_eq!(engine.payload_bytes(), Some(300));

        let err = engine.set_payload_bytes(Some(0)).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroSlottedAlohaPayload));
        assert_eq!(engine.payload_bytes(), Some(300));
        assert_eq!(engine.config().interval_bound(), 4);

        engine.set_payload_bytes(None).unwrap();
        assert_eq!(engine.payload_bytes(), None);
    }
}

// ── CrdsaEngine ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod crdsa_engine {
    use super::*;
    use crate::{ChannelStatus, CrdsaEngine, EngineError, FixedUplink};

    #[test]
    fn empty_channel_list_rejected() {
        assert!(CrdsaEngine::new(vec![]).is_err());
    }

    #[test]
    fn invalid_channel_rejected_at_construction() {
        let bad = AllocationChannelConfig { num_of_instances: 11, ..crdsa_channel() };
        assert!(CrdsaEngine::new(vec![crdsa_channel(), bad]).is_err());
    }

    #[test]
    fn caps_packets_at_max_unique_payload() {
        let mut engine = CrdsaEngine::new(vec![crdsa_channel()]).unwrap();
        let uplink = FixedUplink::with_packets(vec![100; 5]);
        let mut rng = SimRng::new(1);
        let op = engine.prepare_to_transmit(CH0, &uplink, &mut rng).unwrap();
        assert_eq!(op.crdsa_slot_sets().len(), 2);
        assert_valid_slot_sets(op.crdsa_slot_sets(), &crdsa_channel());
    }

    #[test]
    fn fewer_candidates_than_cap() {
        let mut engine = CrdsaEngine::new(vec![crdsa_channel()]).unwrap();
        // Only one packet fits the 500-byte payload class.
        let uplink = FixedUplink::with_packets(vec![400, 900, 1_500]);
        let mut rng = SimRng::new(2);
        let op = engine.prepare_to_transmit(CH0, &uplink, &mut rng).unwrap();
        assert_eq!(op.crdsa_slot_sets().len(), 1);
    }

    #[test]
    fn no_candidates_is_none() {
        let mut engine = CrdsaEngine::new(vec![crdsa_channel()]).unwrap();
        let uplink = FixedUplink::with_packets(vec![900]);
        let mut rng = SimRng::new(2);
        assert!(engine.prepare_to_transmit(CH0, &uplink, &mut rng).unwrap().is_none());
        assert_eq!(engine.channel(CH0).unwrap().status(), ChannelStatus::Free);
    }

    #[test]
    fn backoff_draw_enters_backoff() {
        let config = AllocationChannelConfig { backoff_probability: 0.3, ..crdsa_channel() };
        let mut engine = CrdsaEngine::new(vec![config]).unwrap();
        let uplink = FixedUplink::with_packets(vec![100]);
        let op = engine.prepare_to_transmit(CH0, &uplink, &mut PinnedReal::new(0.0)).unwrap();
        assert!(op.is_none());
        assert_eq!(engine.channel(CH0).unwrap().status(), ChannelStatus::Backoff(3));
        assert!(engine.is_backoff_probability_too_high(CH0).unwrap());

        // Still backing off: no draw can help.
        let op = engine.prepare_to_transmit(CH0, &uplink, &mut PinnedReal::new(0.999)).unwrap();
        assert!(op.is_none());
    }

    #[test]
    fn empty_buffers_still_draw_backoff() {
        let config = AllocationChannelConfig { backoff_probability: 0.3, ..crdsa_channel() };
        let mut engine = CrdsaEngine::new(vec![config]).unwrap();
        let op = engine
            .prepare_to_transmit(CH0, &FixedUplink::new(), &mut PinnedReal::new(0.0))
            .unwrap();
        assert!(op.is_none());
        assert_eq!(engine.channel(CH0).unwrap().status(), ChannelStatus::Backoff(3));
    }

    #[test]
    fn draw_at_probability_does_not_back_off() {
        let config = AllocationChannelConfig { backoff_probability: 0.3, ..crdsa_channel() };
        let mut engine = CrdsaEngine::new(vec![config]).unwrap();
        let uplink = FixedUplink::with_packets(vec![100]);
        let op = engine.prepare_to_transmit(CH0, &uplink, &mut PinnedReal::new(0.3)).unwrap();
        assert!(!op.is_none());
    }

    #[test]
    fn whole_range_can_be_filled() {
        // 2 packets × 3 replicas in a 6-slot range: every slot gets used.
        let config = AllocationChannelConfig {
            min_randomization_value: 4,
            max_randomization_value: 9,
            ..crdsa_channel()
        };
        let mut engine = CrdsaEngine::new(vec![config.clone()]).unwrap();
        let uplink = FixedUplink::with_packets(vec![100, 100]);
        let mut rng = SimRng::new(5);
        for _ in 0..50 {
            let op = engine.prepare_to_transmit(CH0, &uplink, &mut rng).unwrap();
            assert_valid_slot_sets(op.crdsa_slot_sets(), &config);
            let used: BTreeSet<u32> = op.crdsa_slot_sets().iter().flatten().copied().collect();
            assert_eq!(used, (4..=9).collect());
        }
    }

    #[test]
    fn bounded_redraw_with_degenerate_source() {
        // Every draw returns the lower bound; the fallback walks the free
        // slots in order.
        let mut engine = CrdsaEngine::new(vec![crdsa_channel()]).unwrap();
        let uplink = FixedUplink::with_packets(vec![100, 100]);
        let op = engine.prepare_to_transmit(CH0, &uplink, &mut AlwaysLow).unwrap();
        assert_eq!(
            op.crdsa_slot_sets(),
            &[BTreeSet::from([0, 1, 2]), BTreeSet::from([3, 4, 5])]
        );
    }

    #[test]
    fn end_block_ticks_every_channel() {
        let config = AllocationChannelConfig { backoff_probability: 0.3, ..crdsa_channel() };
        let mut engine = CrdsaEngine::new(vec![config.clone(), config]).unwrap();
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut force = PinnedReal::new(0.0);
        engine.prepare_to_transmit(CH0, &uplink, &mut force).unwrap();
        engine.prepare_to_transmit(CH1, &uplink, &mut force).unwrap();
        engine.end_block(None);
        assert_eq!(engine.channel(CH0).unwrap().backoff_blocks_remaining(), 2);
        assert_eq!(engine.channel(CH1).unwrap().backoff_blocks_remaining(), 2);
    }

    #[test]
    fn unknown_channel() {
        let mut engine = CrdsaEngine::new(vec![crdsa_channel()]).unwrap();
        let uplink = FixedUplink::with_packets(vec![100]);
        let err = engine
            .prepare_to_transmit(AllocationChannelId(4), &uplink, &mut SimRng::new(0))
            .unwrap_err();
        assert!(matches!(err, EngineError::ChannelNotFound(AllocationChannelId(4))));
    }

    #[test]
    fn reconfigure_is_atomic() {
        let mut engine = CrdsaEngine::new(vec![crdsa_channel()]).unwrap();
        let err = engine
            .reconfigure(CH0, |c| {
                c.payload_bytes = 9_999;
                c.num_of_instances = 0;
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert_eq!(engine.channel(CH0).unwrap().config(), &crdsa_channel());
    }
}

// ── RandomAccess (selector) ───────────────────────────────────────────────────

#[cfg(test)]
mod selector_tests {
    use ra_core::{OpportunityKind, TriggerKind};

    use super::*;
    use crate::{ChannelStatus, EngineError, FixedUplink};

    #[test]
    fn invalid_config_rejected() {
        let bad = AllocationChannelConfig {
            min_randomization_value: 9,
            max_randomization_value: 0,
            ..crdsa_channel()
        };
        let result = RandomAccess::new(RandomAccessConfig::new(
            AccessModel::Crdsa,
            slotted_aloha(10.0),
            vec![bad],
        ));
        assert!(matches!(result, Err(EngineError::Config(_))));

        let result = RandomAccess::new(RandomAccessConfig::new(
            AccessModel::SlottedAloha,
            slotted_aloha(0.0),
            vec![crdsa_channel()],
        ));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn off_never_grants() {
        let mut ra = selector(AccessModel::Off, vec![crdsa_channel()]);
        let uplink = FixedUplink::with_packets(vec![100; 3]);
        let mut rng = SimRng::new(0);
        for trigger in [TriggerKind::SlottedAloha, TriggerKind::Crdsa] {
            assert!(ra.evaluate(CH0, trigger, &uplink, &mut rng).unwrap().is_none());
        }
    }

    #[test]
    fn trigger_must_match_model() {
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut rng = SimRng::new(0);

        let mut sa = selector(AccessModel::SlottedAloha, vec![crdsa_channel()]);
        assert!(sa.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap().is_none());

        let mut crdsa = selector(AccessModel::Crdsa, vec![crdsa_channel()]);
        assert!(crdsa.evaluate(CH0, TriggerKind::SlottedAloha, &uplink, &mut rng).unwrap().is_none());
    }

    #[test]
    fn dama_suppresses_every_model_and_trigger() {
        let uplink = FixedUplink::with_packets(vec![100; 4]).with_dama();
        let mut rng = SimRng::new(9);
        for model in [
            AccessModel::Off,
            AccessModel::SlottedAloha,
            AccessModel::Crdsa,
            AccessModel::AnyAvailable,
        ] {
            let mut ra = selector(model, vec![crdsa_channel(), crdsa_channel()]);
            for _ in 0..20 {
                for trigger in [TriggerKind::SlottedAloha, TriggerKind::Crdsa] {
                    for ch in [CH0, CH1] {
                        let op = ra.evaluate(ch, trigger, &uplink, &mut rng).unwrap();
                        assert!(op.is_none(), "{model} / {trigger} granted under DAMA");
                    }
                }
            }
        }
    }

    #[test]
    fn slotted_aloha_scenario() {
        let mut ra = selector(AccessModel::SlottedAloha, vec![crdsa_channel()]);
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut rng = SimRng::new(21);
        for _ in 0..200 {
            let op = ra.evaluate(CH0, TriggerKind::SlottedAloha, &uplink, &mut rng).unwrap();
            assert_eq!(op.kind(), OpportunityKind::SlottedAloha);
            assert_eq!(op.allocation_channel, CH0);
            assert!(op.slotted_aloha_slot().unwrap() < 10);
        }
    }

    #[test]
    fn slotted_aloha_needs_data_in_size_class() {
        let config = RandomAccessConfig::new(
            AccessModel::SlottedAloha,
            SlottedAlohaConfig { control_randomization_interval: 10.0, payload_bytes: Some(200) },
            vec![crdsa_channel()],
        );
        let mut ra = RandomAccess::new(config).unwrap();
        let mut rng = SimRng::new(0);

        let empty = FixedUplink::new();
        assert!(ra.evaluate(CH0, TriggerKind::SlottedAloha, &empty, &mut rng).unwrap().is_none());

        let too_big = FixedUplink::with_packets(vec![300]);
        assert!(ra.evaluate(CH0, TriggerKind::SlottedAloha, &too_big, &mut rng).unwrap().is_none());

        let fits = FixedUplink::with_packets(vec![300, 150]);
        let op = ra.evaluate(CH0, TriggerKind::SlottedAloha, &fits, &mut rng).unwrap();
        assert_eq!(op.kind(), OpportunityKind::SlottedAloha);
    }

    #[test]
    fn crdsa_scenario() {
        let mut ra = selector(AccessModel::Crdsa, vec![crdsa_channel()]);
        let uplink = FixedUplink::with_packets(vec![100; 5]);
        let mut rng = SimRng::new(33);
        for _ in 0..100 {
            let op = ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
            assert_eq!(op.kind(), OpportunityKind::Crdsa);
            assert_eq!(op.crdsa_slot_sets().len(), 2);
            assert_valid_slot_sets(op.crdsa_slot_sets(), &crdsa_channel());
        }
    }

    #[test]
    fn backoff_silences_for_k_minus_one_evaluations() {
        let k = 4;
        let config = AllocationChannelConfig {
            backoff_probability: 0.5,
            backoff_time_blocks: k,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::Crdsa, vec![config]);
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut rng = PinnedReal::new(0.0);

        assert!(ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap().is_none());
        rng.real = 0.999;
        for i in 1..k {
            let op = ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
            assert!(op.is_none(), "evaluation {i} should still be backing off");
        }
        assert_eq!(ra.channel(CH0).unwrap().status(), ChannelStatus::Free);
        let op = ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
        assert_eq!(op.kind(), OpportunityKind::Crdsa);
    }

    #[test]
    fn idle_after_single_block_limit() {
        let config = AllocationChannelConfig {
            max_consecutive_blocks_accessed: 1,
            min_idle_blocks:                 2,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::Crdsa, vec![config]);
        let uplink = FixedUplink::with_packets(vec![100; 3]);
        let mut rng = SimRng::new(8);

        let op = ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
        assert_eq!(op.kind(), OpportunityKind::Crdsa);
        assert_eq!(ra.channel(CH0).unwrap().status(), ChannelStatus::Idle(2));

        assert!(ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap().is_none());
        assert!(ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap().is_none());
        let op = ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
        assert_eq!(op.kind(), OpportunityKind::Crdsa);
    }

    #[test]
    fn consecutive_limit_cycles() {
        let config = AllocationChannelConfig {
            max_consecutive_blocks_accessed: 3,
            min_idle_blocks:                 1,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::Crdsa, vec![config]);
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut rng = SimRng::new(8);

        let kinds: Vec<OpportunityKind> = (0..8)
            .map(|_| ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap().kind())
            .collect();
        use OpportunityKind as K;
        assert_eq!(kinds, vec![K::Crdsa, K::Crdsa, K::Crdsa, K::None, K::Crdsa, K::Crdsa, K::Crdsa, K::None]);
    }

    #[test]
    fn unused_blocks_keep_consecutive_count() {
        let config = AllocationChannelConfig {
            max_consecutive_blocks_accessed: 3,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::Crdsa, vec![config]);
        let data = FixedUplink::with_packets(vec![100]);
        let empty = FixedUplink::new();
        let mut rng = SimRng::new(8);

        ra.evaluate(CH0, TriggerKind::Crdsa, &data, &mut rng).unwrap();
        ra.evaluate(CH0, TriggerKind::Crdsa, &empty, &mut rng).unwrap();
        assert_eq!(ra.channel(CH0).unwrap().consecutive_blocks_used(), 1);
    }

    #[test]
    fn tick_happens_on_every_path() {
        let config = AllocationChannelConfig {
            backoff_probability: 0.5,
            backoff_time_blocks: 10,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::AnyAvailable, vec![config.clone(), config]);
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut rng = PinnedReal::new(0.0);

        ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
        assert_eq!(ra.channel(CH0).unwrap().backoff_blocks_remaining(), 9);

        // DAMA path, Slotted ALOHA path, other channel: each ticks once.
        let dama = uplink.clone().with_dama();
        ra.evaluate(CH0, TriggerKind::Crdsa, &dama, &mut rng).unwrap();
        ra.evaluate(CH0, TriggerKind::SlottedAloha, &uplink, &mut rng).unwrap();
        ra.evaluate(CH1, TriggerKind::SlottedAloha, &uplink, &mut rng).unwrap();
        assert_eq!(ra.channel(CH0).unwrap().backoff_blocks_remaining(), 6);
        assert_eq!(ra.block().0, 4);
    }

    #[test]
    fn unknown_channel_is_error_without_tick() {
        let config = AllocationChannelConfig {
            backoff_probability: 0.5,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::Crdsa, vec![config]);
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut rng = PinnedReal::new(0.0);
        ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
        let before = ra.channel(CH0).unwrap().backoff_blocks_remaining();

        let err = ra.evaluate(CH1, TriggerKind::Crdsa, &uplink, &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::ChannelNotFound(CH1)));
        assert_eq!(ra.channel(CH0).unwrap().backoff_blocks_remaining(), before);
        assert_eq!(ra.block().0, 1);
    }

    #[test]
    fn slotted_aloha_leaves_crdsa_counters_alone() {
        let config = AllocationChannelConfig {
            max_consecutive_blocks_accessed: 2,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::AnyAvailable, vec![config]);
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut rng = SimRng::new(4);
        for _ in 0..10 {
            let op = ra.evaluate(CH0, TriggerKind::SlottedAloha, &uplink, &mut rng).unwrap();
            assert_eq!(op.kind(), OpportunityKind::SlottedAloha);
        }
        let state = ra.channel(CH0).unwrap();
        assert_eq!(state.consecutive_blocks_used(), 0);
        assert_eq!(state.status(), ChannelStatus::Free);
    }

    #[test]
    fn any_available_attempts_crdsa_while_backing_off() {
        let config = AllocationChannelConfig {
            backoff_probability: 0.5,
            backoff_time_blocks: 5,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::AnyAvailable, vec![config]);
        let uplink = FixedUplink::with_packets(vec![100]);
        let mut rng = PinnedReal::new(0.0);

        assert!(!ra.is_crdsa_backoff_probability_too_high(CH0).unwrap());
        ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
        assert!(ra.is_crdsa_backoff_probability_too_high(CH0).unwrap());

        // CRDSA trigger is not rerouted to Slotted ALOHA.
        let op = ra.evaluate(CH0, TriggerKind::Crdsa, &uplink, &mut rng).unwrap();
        assert!(op.is_none());
        // The Slotted ALOHA trigger still works on its own.
        let op = ra.evaluate(CH0, TriggerKind::SlottedAloha, &uplink, &mut rng).unwrap();
        assert_eq!(op.kind(), OpportunityKind::SlottedAloha);
    }

    #[test]
    fn counters_never_increase_except_on_entry() {
        let busy = AllocationChannelConfig {
            backoff_probability:             0.3,
            max_backoff_probability:         0.5,
            backoff_time_blocks:             4,
            max_consecutive_blocks_accessed: 3,
            min_idle_blocks:                 2,
            ..crdsa_channel()
        };
        let mut ra = selector(AccessModel::AnyAvailable, vec![busy.clone(), busy.clone(), busy]);
        let uplink = FixedUplink::with_packets(vec![100; 4]);
        let mut rng = SimRng::new(2024);

        let snapshot = |ra: &RandomAccess| -> Vec<(u32, u32)> {
            ra.crdsa()
                .channels()
                .iter()
                .map(|s| (s.backoff_blocks_remaining(), s.idle_blocks_remaining()))
                .collect()
        };

        let mut before = snapshot(&ra);
        for step in 0..2_000u32 {
            let ch = AllocationChannelId(step % 3);
            let trigger = if step % 5 == 0 { TriggerKind::SlottedAloha } else { TriggerKind::Crdsa };
            ra.evaluate(ch, trigger, &uplink, &mut rng).unwrap();
            let after = snapshot(&ra);
            for (i, (&(b0, i0), &(b1, i1))) in before.iter().zip(after.iter()).enumerate() {
                if i != ch.index() {
                    assert!(b1 <= b0 && i1 <= i0, "channel {i} counters rose at step {step}");
                    continue;
                }
                if b1 > b0 || i1 > i0 {
                    assert_eq!((b0, i0), (0, 0), "counter rose on a busy channel at step {step}");
                }
            }
            before = after;
        }
    }

    #[test]
    fn runtime_updates_validated() {
        let mut ra = selector(AccessModel::Crdsa, vec![crdsa_channel()]);

        // Above the 0.5 ceiling: rejected, nothing changes.
        assert!(ra.set_load_control_parameters(CH0, 0.8, 7).is_err());
        assert_eq!(ra.channel(CH0).unwrap().config(), &crdsa_channel());

        ra.set_load_control_parameters(CH0, 0.2, 7).unwrap();
        let c = ra.channel(CH0).unwrap().config().clone();
        assert_eq!((c.backoff_probability, c.backoff_time_blocks), (0.2, 7));

        // Lowering the ceiling below the current probability is rejected.
        assert!(ra.set_maximum_backoff_probability(CH0, 0.1).is_err());
        ra.set_maximum_backoff_probability(CH0, 0.9).unwrap();

        assert!(ra.set_randomization_parameters(CH0, 5, 4, 1).is_err());
        ra.set_randomization_parameters(CH0, 10, 29, 2).unwrap();
        assert!(ra.set_rate_limitation_parameters(CH0, 11, 1, 0).is_err());
        ra.set_rate_limitation_parameters(CH0, 10, 2, 3).unwrap();
        ra.set_payload_bytes(CH0, 64).unwrap();

        let c = ra.channel(CH0).unwrap().config();
        assert_eq!(c.max_randomization_value, 29);
        assert_eq!(c.max_unique_payload_per_block, 10);
        assert_eq!(c.payload_bytes, 64);

        assert!(matches!(
            ra.set_payload_bytes(CH1, 64),
            Err(EngineError::ChannelNotFound(CH1))
        ));

        assert!(ra.set_control_randomization_interval(0.0).is_err());
        ra.set_control_randomization_interval(3.0).unwrap();
        assert_eq!(ra.slotted_aloha().config().interval_bound(), 3);
        assert!(ra.set_slotted_aloha_payload_bytes(Some(0)).is_err());
        ra.set_slotted_aloha_payload_bytes(Some(100)).unwrap();
        assert_eq!(ra.slotted_aloha().payload_bytes(), Some(100));

        ra.set_model(AccessModel::AnyAvailable);
        assert_eq!(ra.model(), AccessModel::AnyAvailable);
        ra.log_variables();
    }

    #[test]
    fn certain_backoff_rejected() {
        let mut ra = selector(AccessModel::Crdsa, vec![crdsa_channel()]);
        ra.set_maximum_backoff_probability(CH0, 1.0).unwrap();
        assert!(ra.set_load_control_parameters(CH0, 1.0, 3).is_err());
        assert_eq!(ra.channel(CH0).unwrap().config().backoff_probability, 0.0);

        let certain = AllocationChannelConfig {
            backoff_probability:     1.0,
            max_backoff_probability: 1.0,
            ..crdsa_channel()
        };
        let result = RandomAccess::new(RandomAccessConfig::new(
            AccessModel::Crdsa,
            slotted_aloha(10.0),
            vec![certain],
        ));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn same_seed_same_decisions() {
        let run = |seed: u64| -> Vec<ra_core::TxOpportunity> {
            let config = AllocationChannelConfig { backoff_probability: 0.2, ..crdsa_channel() };
            let mut ra = selector(AccessModel::AnyAvailable, vec![config]);
            let uplink = FixedUplink::with_packets(vec![100; 3]);
            let mut rng = SimRng::new(seed);
            (0..50)
                .map(|i| {
                    let trigger = if i % 2 == 0 { TriggerKind::Crdsa } else { TriggerKind::SlottedAloha };
                    ra.evaluate(CH0, trigger, &uplink, &mut rng).unwrap()
                })
                .collect()
        };
        assert_eq!(run(5), run(5));
    }
}
