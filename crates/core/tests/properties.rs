//! Property-based tests for the model's algebraic laws.
//!
//! These pin the laws the components promise: squash idempotence, newest-
//! first store buffer forwarding, CAS semantics, LL/SC single-use
//! reservations, and counter saturation bounds.

use proptest::prelude::*;

use mdsim_core::common::SeqNum;
use mdsim_core::core::pipeline::lsq::{Lsq, LsqEntry, MemOpKind};
use mdsim_core::core::pipeline::store_buffer::StoreBuffer;
use mdsim_core::core::units::lsu::atomic::{AtomicKind, AtomicOp};
use mdsim_core::core::units::lsu::llsc::ReservationTable;
use mdsim_core::core::units::mdp::{DependencePredictor, SimplePredictor, StoreSetPredictor};
use mdsim_core::core::units::mlp::tracker::MlpTracker;

fn snapshot(lsq: &Lsq) -> Vec<LsqEntry> {
    lsq.iter().cloned().collect()
}

proptest! {
    /// Squashing the same sequence number twice equals squashing once.
    #[test]
    fn squash_from_is_idempotent(
        ops in prop::collection::vec((0u8..3, 0u64..0x4000u64), 1..12),
        squash_at in 1u64..14,
    ) {
        let mut lsq = Lsq::new(16);
        for (i, (kind, addr)) in ops.iter().enumerate() {
            let kind = match kind {
                0 => MemOpKind::Load,
                1 => MemOpKind::Store,
                _ => MemOpKind::Atomic,
            };
            if let Some(idx) = lsq.allocate(SeqNum(i as u64 + 1), 0x100 + i as u64 * 4, kind, 4) {
                lsq.update_address(idx, *addr);
            }
        }

        lsq.squash_from(SeqNum(squash_at));
        let once = snapshot(&lsq);
        lsq.squash_from(SeqNum(squash_at));
        let twice = snapshot(&lsq);

        prop_assert_eq!(&once, &twice);
        prop_assert!(once.iter().all(|e| e.seq < SeqNum(squash_at)));
    }

    /// LSQ sequence numbers increase strictly from head to tail, across
    /// arbitrary allocate/commit interleavings.
    #[test]
    fn lsq_stays_age_ordered(pops in prop::collection::vec(any::<bool>(), 1..32)) {
        let mut lsq = Lsq::new(8);
        let mut next = 1u64;
        for pop in pops {
            if pop {
                let _ = lsq.commit_head();
            } else if lsq.allocate(SeqNum(next), 0x100, MemOpKind::Store, 4).is_some() {
                next += 1;
            }
            let seqs: Vec<u64> = lsq.iter().map(|e| e.seq.0).collect();
            prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        }
    }

    /// After a push, forwarding with the same address and size returns
    /// the newest matching data.
    #[test]
    fn store_buffer_forwards_newest(
        stores in prop::collection::vec((0u64..8, 0u64..0x1_0000), 1..8),
    ) {
        let mut sb = StoreBuffer::new(8);
        for (i, (slot, data)) in stores.iter().enumerate() {
            let addr = 0x1000 + slot * 4;
            prop_assert!(sb.push(addr, *data, 4, SeqNum(i as u64 + 1)));
        }

        // The newest store to each address wins.
        for slot in 0..8u64 {
            let addr = 0x1000 + slot * 4;
            let expected = stores.iter().rev().find(|(s, _)| *s == slot).map(|(_, d)| *d);
            prop_assert_eq!(sb.forward_to_load(addr, 4), expected);
        }
    }

    /// CAS succeeds exactly when the expected value matches memory, and
    /// always returns the old value.
    #[test]
    fn cas_law(mem in any::<u64>(), write in any::<u64>(), expected in any::<u64>()) {
        let mut op = AtomicOp::new(AtomicKind::CompareAndSwap, 0x1000, SeqNum(1));
        let (ok, old) = op.execute(mem, write, Some(expected));
        prop_assert_eq!(old, mem);
        prop_assert_eq!(ok, mem == expected);
        if ok {
            prop_assert_eq!(op.new_value, Some(write));
        } else {
            prop_assert_eq!(op.new_value, None);
        }
    }

    /// A reservation admits exactly one matching store-conditional.
    #[test]
    fn llsc_single_use(addr in any::<u64>(), seq in 1u64..1000) {
        let mut llsc = ReservationTable::new();
        llsc.load_link(addr, SeqNum(seq));
        prop_assert!(llsc.store_conditional(addr, SeqNum(seq)));
        prop_assert!(!llsc.store_conditional(addr, SeqNum(seq)));
    }

    /// Store-set confidence stays within [0, 3] under arbitrary
    /// violation/correct interleavings.
    #[test]
    fn store_set_confidence_bounded(events in prop::collection::vec(any::<bool>(), 0..64)) {
        let mut p = StoreSetPredictor::default();
        for good in events {
            if good {
                p.report_correct(0x104);
            } else {
                p.report_violation(0x104, 0x100);
            }
            prop_assert!(p.confidence(0x104) <= 3);
        }
    }

    /// The baseline predictor's counters saturate within [0, 3] too.
    #[test]
    fn simple_counters_bounded(events in prop::collection::vec(any::<bool>(), 0..64)) {
        let mut p = SimplePredictor::new(16);
        for good in events {
            if good {
                p.report_correct(0x104);
            } else {
                p.report_violation(0x104, 0x100);
            }
            prop_assert!(p.counter(0x104) <= 3);
        }
    }

    /// MLP aggregates are mutually consistent: average <= peak and
    /// utilization <= 100%.
    #[test]
    fn mlp_aggregates_consistent(samples in prop::collection::vec(0usize..16, 1..64)) {
        let mut mlp = MlpTracker::new();
        for s in &samples {
            mlp.record_cycle(*s);
        }
        prop_assert!(mlp.average() <= mlp.peak() as f64);
        prop_assert!(mlp.utilization() <= 100.0);
        prop_assert_eq!(mlp.cycles(), samples.len() as u64);
    }
}
