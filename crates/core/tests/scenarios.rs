//! Memory disambiguation scenarios.
//!
//! Each test drives the components directly through a canonical memory
//! pattern: independent operations, forwarding, a speculation violation with
//! recovery, fence ordering, memory-level parallelism, bank conflicts, and
//! atomics. These mirror the patterns the pipeline produces, pinned at the
//! component level where every intermediate step is observable.

use pretty_assertions::assert_eq;

use mdsim_core::common::SeqNum;
use mdsim_core::core::pipeline::lsq::{Conflict, Lsq, MemOpKind};
use mdsim_core::core::pipeline::store_buffer::StoreBuffer;
use mdsim_core::core::units::lsu::atomic::{AtomicKind, AtomicOp};
use mdsim_core::core::units::lsu::fence::{FenceKind, MemoryFence};
use mdsim_core::core::units::mdp::{DependencePredictor, StoreSetPredictor};
use mdsim_core::core::units::mlp::banks::BankConflictDetector;
use mdsim_core::core::units::mlp::mshr::MshrFile;
use mdsim_core::core::units::mlp::tracker::MlpTracker;

/// Scenario 1: a load to an unrelated address speculates past a store and
/// validates clean.
#[test]
fn independent_load_and_store() {
    let mut lsq = Lsq::new(8);
    let mut predictor = StoreSetPredictor::default();

    let st = lsq
        .allocate(SeqNum(1), 0x100, MemOpKind::Store, 4)
        .unwrap();
    lsq.update_address(st, 0x1000);
    lsq.update_data(st, 0xDEAD);

    let ld = lsq.allocate(SeqNum(2), 0x104, MemOpKind::Load, 4).unwrap();
    lsq.update_address(ld, 0x2000);

    let prediction = predictor.predict_load(0x104);
    assert!(prediction.speculate);

    let check = lsq.check_dependency(ld);
    assert!(!check.has_conflict());
    lsq.mark_speculative(ld);
    lsq.mark_completed(ld);

    // Commit-time validation: still no conflict, speculation was correct.
    let check = lsq.check_dependency(ld);
    assert!(!check.has_conflict());
    predictor.report_correct(0x104);

    let stats = predictor.stats();
    assert_eq!(stats.correct, 1);
    assert_eq!(stats.violations, 0);
}

/// Scenario 2: a load to the same address forwards the store's data instead
/// of reading memory.
#[test]
fn store_to_load_forwarding() {
    let mut lsq = Lsq::new(8);

    let st = lsq
        .allocate(SeqNum(1), 0x200, MemOpKind::Store, 4)
        .unwrap();
    lsq.update_address(st, 0x1000);
    lsq.update_data(st, 0xBEEF);

    let ld = lsq.allocate(SeqNum(2), 0x204, MemOpKind::Load, 4).unwrap();
    lsq.update_address(ld, 0x1000);

    let check = lsq.check_dependency(ld);
    assert_eq!(check.conflict, Some(Conflict::Resolved));
    assert_eq!(check.forward_data, Some(0xBEEF));
    assert_eq!(check.forward_index, Some(st));
}

/// Scenario 3: a load speculates past a store with an unresolved address;
/// the address later lands on the load's, and validation trips. Recovery
/// unions the PCs into one store set and the retrained predictor makes the
/// load wait.
#[test]
fn speculation_violation_and_recovery() {
    let mut lsq = Lsq::new(8);
    let mut predictor = StoreSetPredictor::default();

    let st = lsq
        .allocate(SeqNum(1), 0x300, MemOpKind::Store, 4)
        .unwrap();

    let ld = lsq.allocate(SeqNum(2), 0x304, MemOpKind::Load, 4).unwrap();
    lsq.update_address(ld, 0x1000);

    let prediction = predictor.predict_load(0x304);
    assert!(prediction.speculate, "untrained predictor speculates");

    let check = lsq.check_dependency(ld);
    assert_eq!(check.conflict, Some(Conflict::Unresolved));
    lsq.mark_speculative(ld);
    lsq.mark_completed(ld); // observed memory's 0x0

    // The store's address resolves onto the load's address.
    lsq.update_address(st, 0x1000);
    lsq.update_data(st, 0xCAFE);

    // Commit-time validation finds a forwardable store the load missed.
    let check = lsq.check_dependency(ld);
    assert_eq!(check.conflict, Some(Conflict::Resolved));
    assert_eq!(check.forward_data, Some(0xCAFE));

    predictor.report_violation(0x304, 0x300);
    assert_eq!(predictor.stats().violations, 1);
    assert_eq!(
        predictor.set_of(0x304),
        predictor.set_of(0x300),
        "violation unions load and store into one set"
    );

    // Recovery squashes the load; re-fetch re-issues it.
    lsq.squash_from(SeqNum(2));
    assert_eq!(lsq.len(), 1);

    // With the store registered in flight, the load now waits for it.
    predictor.register_store(0x300, SeqNum(1));
    let prediction = predictor.predict_load(0x304);
    assert!(!prediction.speculate);
    assert_eq!(prediction.wait_for, Some(SeqNum(1)));
}

/// Scenario 4: a full fence blocks a younger load until the older store and
/// loads have drained.
#[test]
fn fence_orders_younger_load() {
    let mut lsq = Lsq::new(8);

    let st = lsq
        .allocate(SeqNum(1), 0x400, MemOpKind::Store, 4)
        .unwrap();
    lsq.update_address(st, 0x1000);
    lsq.update_data(st, 0x1111);

    let mut fence = MemoryFence::new(FenceKind::Full, SeqNum(2));

    let ld = lsq.allocate(SeqNum(3), 0x408, MemOpKind::Load, 4).unwrap();
    lsq.update_address(ld, 0x2000);

    assert!(fence.blocks_load(SeqNum(3)), "load defers behind the fence");

    // The older store has not completed: the fence cannot finish.
    let older_stores_done = lsq
        .iter()
        .filter(|e| e.seq < SeqNum(2) && e.kind == MemOpKind::Store)
        .all(|e| e.completed);
    assert!(!fence.can_complete(true, older_stores_done));

    // Store completes; fence completes; the load proceeds.
    lsq.mark_completed(st);
    let older_stores_done = lsq
        .iter()
        .filter(|e| e.seq < SeqNum(2) && e.kind == MemOpKind::Store)
        .all(|e| e.completed);
    assert!(fence.can_complete(true, older_stores_done));
    fence.completed = true;
    assert!(fence.completed);
}

/// Scenario 5: three concurrent line misses plus one merged request.
#[test]
fn memory_level_parallelism() {
    let mut mshr = MshrFile::new(4, 64);
    let mut mlp = MlpTracker::new();

    let idx1 = mshr.allocate(0x1000, SeqNum(1), false, false, 10).unwrap();
    mlp.record_cycle(mshr.active_count());
    let idx2 = mshr.allocate(0x2000, SeqNum(2), false, false, 11).unwrap();
    mlp.record_cycle(mshr.active_count());
    let idx3 = mshr.allocate(0x3000, SeqNum(3), false, false, 12).unwrap();
    mlp.record_cycle(mshr.active_count());

    // Same line as the first miss: merges instead of allocating.
    let idx4 = mshr.allocate(0x1010, SeqNum(4), false, false, 13).unwrap();
    assert_eq!(idx4, idx1);
    mlp.record_cycle(mshr.active_count());

    let _ = mshr.complete(idx1, 20).unwrap();
    mshr.free(idx1);
    mlp.record_cycle(mshr.active_count());
    let _ = mshr.complete(idx2, 21).unwrap();
    mshr.free(idx2);
    mlp.record_cycle(mshr.active_count());
    let entry = mshr.complete(idx3, 22).unwrap();
    assert_eq!(entry.latency(), Some(10));
    mshr.free(idx3);
    mlp.record_cycle(mshr.active_count());

    let stats = mshr.stats();
    assert_eq!(stats.total_misses, 3);
    assert_eq!(stats.merged_requests, 1);
    assert_eq!(stats.peak_concurrent, 3);
    assert_eq!(stats.active_entries, 0);

    assert_eq!(mlp.peak(), 3);
    assert!(mlp.average() > 1.0);
    assert!(mlp.utilization() > 80.0);
}

/// Scenario 6: an access to a busy bank is refused and counted, then
/// proceeds once the reservation expires.
#[test]
fn bank_conflict_and_release() {
    // Single bank: every line contends, so 0x1040 shares 0x1000's bank.
    let mut banks = BankConflictDetector::new(1, 64);

    banks.reserve_bank(0x1000, 0, 1);
    assert!(!banks.can_access(0x1040, 0));
    assert_eq!(banks.conflicts(), 1);

    banks.update_cycle(1);
    assert!(banks.can_access(0x1040, 1));
    assert_eq!(banks.conflicts(), 1);
}

/// Atomic operations: CAS success/failure and fetch-and-add.
#[test]
fn atomic_read_modify_write() {
    let mut cas = AtomicOp::new(AtomicKind::CompareAndSwap, 0x5000, SeqNum(10));
    let (ok, old) = cas.execute(42, 100, Some(42));
    assert!(ok);
    assert_eq!(old, 42);
    assert_eq!(cas.new_value, Some(100));

    let mut cas = AtomicOp::new(AtomicKind::CompareAndSwap, 0x5000, SeqNum(11));
    let (ok, old) = cas.execute(42, 100, Some(50));
    assert!(!ok);
    assert_eq!(old, 42, "failed CAS still returns the memory value");
    assert_eq!(cas.new_value, None, "failed CAS writes nothing");

    let mut fadd = AtomicOp::new(AtomicKind::FetchAndAdd, 0x5004, SeqNum(12));
    let (ok, old) = fadd.execute(10, 5, None);
    assert!(ok);
    assert_eq!(old, 10);
    assert_eq!(fadd.new_value, Some(15));
}

/// Store buffer: newest-first forwarding and in-order drain.
#[test]
fn store_buffer_forwarding_and_drain() {
    let mut sb = StoreBuffer::new(4);
    assert!(sb.push(0x1000, 0xAA, 4, SeqNum(1)));
    assert!(sb.push(0x1004, 0xBB, 4, SeqNum(2)));
    assert!(sb.push(0x1000, 0xCC, 4, SeqNum(3)));

    assert_eq!(sb.forward_to_load(0x1000, 4), Some(0xCC));
    assert_eq!(sb.forward_to_load(0x1004, 4), Some(0xBB));

    assert!(sb.has_pending_stores(None));
    let drained: Vec<u64> = std::iter::from_fn(|| sb.drain_oldest().map(|e| e.seq.0)).collect();
    assert_eq!(drained, vec![1, 2, 3]);
    assert!(!sb.has_pending_stores(None));
}
