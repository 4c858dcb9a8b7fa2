//! End-to-end epoch scenarios against in-memory collaborators.

use rings_engine::epoch::{CycleSelector, EpochSchedule};
use rings_engine::points::average_reserve;
use rings_engine::pool_weights::compute_pool_weights;
use rings_engine::{
    weight_unit, BlockRange, BlockSampler, EngineError, EpochRunner, MergedPoolSource, NoGauges,
    OwnershipAccumulator,
};
use rings_nullables::{NullBlocks, NullGauges, NullPools, NullReserves};
use rings_types::{
    Address, BlockHeight, FixedDecimal, GaugeSnapshot, HolderShare, PoolId, PoolSnapshot,
    Timestamp, TokenReserve, U256, WAD_DECIMALS,
};

// ── helpers ────────────────────────────────────────────────────────────

fn addr(n: u8) -> Address {
    Address::parse(&format!("0x{:040x}", n)).unwrap()
}

fn pool_id(n: u16) -> PoolId {
    PoolId::parse(&format!("0x{:064x}", n)).unwrap()
}

fn wad(s: &str) -> FixedDecimal {
    FixedDecimal::parse(s, WAD_DECIMALS).unwrap()
}

fn units(n: u128) -> U256 {
    U256::new(n) * U256::new(10).pow(18)
}

fn token() -> Address {
    addr(0xee)
}

const GAUGE: u8 = 0x99;

fn pool(id: u16, total: &str, reserve: &str, holders: &[(u8, &str)]) -> PoolSnapshot {
    PoolSnapshot {
        pool_id: pool_id(id),
        total_shares: wad(total),
        tokens: vec![
            TokenReserve {
                token: addr(0xdd),
                balance: wad("77"),
            },
            TokenReserve {
                token: token(),
                balance: wad(reserve),
            },
        ],
        holders: holders
            .iter()
            .map(|(h, b)| HolderShare::new(addr(*h), wad(b)))
            .collect(),
    }
}

fn gauge(holders: &[(u8, &str)], supply: &str) -> GaugeSnapshot {
    GaugeSnapshot {
        gauge_id: addr(GAUGE),
        total_supply: wad(supply),
        holders: holders
            .iter()
            .map(|(h, b)| HolderShare::new(addr(*h), wad(b)))
            .collect(),
    }
}

fn single_block() -> BlockRange {
    BlockRange {
        start: BlockHeight::new(100),
        end: BlockHeight::new(100),
    }
}

// ── scenarios ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sixty_forty_single_block() {
    let pools = NullPools::new("registry-a")
        .with_default(vec![pool(1, "100", "1000", &[(0xa, "60"), (0xb, "40")])]);
    let runner = EpochRunner::new(pools, NoGauges);

    let acc = runner
        .accumulate_block(&token(), BlockHeight::new(100), OwnershipAccumulator::new())
        .await
        .unwrap();
    assert_eq!(acc.balance(&addr(0xa)), units(600));
    assert_eq!(acc.balance(&addr(0xb)), units(400));

    let weights = runner.compute_weights(&token(), single_block()).await.unwrap();
    assert_eq!(weights.records.len(), 2);
    assert_eq!(weights.records[0].user, addr(0xa));
    assert_eq!(weights.records[0].weight, U256::new(6) * U256::new(10).pow(35));
    assert_eq!(weights.records[1].weight, U256::new(4) * U256::new(10).pow(35));
}

#[tokio::test]
async fn gauge_depositors_replace_gauge() {
    let pools = NullPools::new("registry-a")
        .with_default(vec![pool(1, "100", "1000", &[(0xa, "70"), (GAUGE, "30")])]);
    let gauges =
        NullGauges::new().with_gauge(pool_id(1), gauge(&[(0x10, "20"), (0x11, "10")], "30"));
    let runner = EpochRunner::new(pools, gauges);

    let acc = runner
        .accumulate_block(&token(), BlockHeight::new(100), OwnershipAccumulator::new())
        .await
        .unwrap();
    assert_eq!(acc.balance(&addr(0x10)), units(200));
    assert_eq!(acc.balance(&addr(0x11)), units(100));
    assert_eq!(acc.balance(&addr(0xa)), units(700));
    assert!(!acc.contains(&addr(GAUGE)));

    let weights = runner.compute_weights(&token(), single_block()).await.unwrap();
    assert!(weights.records.iter().all(|r| r.user != addr(GAUGE)));
}

#[tokio::test]
async fn gauge_resolution_conserves_attributed_total() {
    let snapshot = pool(1, "97", "1234.5678", &[(0xa, "41"), (0xb, "23"), (GAUGE, "33")]);

    let plain = EpochRunner::new(
        NullPools::new("a").with_default(vec![snapshot.clone()]),
        NoGauges,
    );
    let without = plain
        .accumulate_block(&token(), BlockHeight::new(1), OwnershipAccumulator::new())
        .await
        .unwrap();

    let gauges = NullGauges::new().with_gauge(
        pool_id(1),
        gauge(&[(0x10, "13"), (0x11, "11"), (0x12, "9")], "33"),
    );
    let resolved = EpochRunner::new(NullPools::new("a").with_default(vec![snapshot]), gauges);
    let with = resolved
        .accumulate_block(&token(), BlockHeight::new(1), OwnershipAccumulator::new())
        .await
        .unwrap();

    let (a, b) = (without.total(), with.total());
    let diff = if a > b { a - b } else { b - a };
    assert!(diff <= units(1), "gauge resolution moved {diff} raw units");
}

#[tokio::test]
async fn overcounted_shares_abort_the_epoch() {
    let pools = NullPools::new("registry-a")
        .with_default(vec![pool(1, "100", "1000", &[(0xa, "60"), (0xb, "45")])]);
    let runner = EpochRunner::new(pools, NoGauges);

    let err = runner.compute_weights(&token(), single_block()).await.unwrap_err();
    match err {
        EngineError::Conservation {
            expected, actual, ..
        } => {
            assert_eq!(expected, "100");
            assert_eq!(actual, "105");
        }
        other => panic!("expected conservation error, got {other}"),
    }
}

#[tokio::test]
async fn gauge_supply_mismatch_aborts() {
    let pools = NullPools::new("registry-a")
        .with_default(vec![pool(1, "100", "1000", &[(0xa, "70"), (GAUGE, "30")])]);
    let gauges =
        NullGauges::new().with_gauge(pool_id(1), gauge(&[(0x10, "20"), (0x11, "10")], "40"));
    let runner = EpochRunner::new(pools, gauges);
    let err = runner.compute_weights(&token(), single_block()).await.unwrap_err();
    assert!(matches!(err, EngineError::Conservation { .. }));
}

#[tokio::test]
async fn missing_token_reserve_is_data_error() {
    let mut snapshot = pool(1, "100", "1000", &[(0xa, "100")]);
    snapshot.tokens.retain(|t| t.token != token());
    let runner = EpochRunner::new(NullPools::new("a").with_default(vec![snapshot]), NoGauges);
    let err = runner.compute_weights(&token(), single_block()).await.unwrap_err();
    assert!(matches!(err, EngineError::Data(_)));
}

#[tokio::test]
async fn remainder_goes_to_last_holder_only() {
    let pools = NullPools::new("a")
        .with_default(vec![pool(1, "3", "1", &[(0x3, "1"), (0x1, "1"), (0x2, "1")])]);
    let runner = EpochRunner::new(pools, NoGauges);
    let weights = runner.compute_weights(&token(), single_block()).await.unwrap();

    let third = weight_unit() / U256::new(3);
    let users: Vec<_> = weights.records.iter().map(|r| r.user.clone()).collect();
    assert_eq!(users, vec![addr(1), addr(2), addr(3)]);
    assert_eq!(weights.records[0].weight, third);
    assert_eq!(weights.records[1].weight, third);
    assert_eq!(weights.records[2].weight, weight_unit() - third - third);
    let sum = weights.records.iter().fold(U256::ZERO, |acc, r| acc + r.weight);
    assert_eq!(sum, weight_unit());
}

#[tokio::test]
async fn identical_snapshots_give_identical_output() {
    let make = || {
        EpochRunner::new(
            NullPools::new("a")
                .with_default(vec![pool(1, "7", "999.999", &[(0x5, "3"), (0x1, "2"), (0x9, "2")])])
                .with_block(
                    BlockHeight::new(110),
                    vec![pool(1, "7", "12", &[(0x5, "1"), (0x1, "6")])],
                ),
            NoGauges,
        )
    };
    let range = BlockRange {
        start: BlockHeight::new(100),
        end: BlockHeight::new(200),
    };
    let first = make().compute_weights(&token(), range).await.unwrap();
    let second = make().compute_weights(&token(), range).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn every_sampled_block_is_fetched_in_order() {
    let pools = NullPools::new("a").with_default(vec![pool(1, "10", "10", &[(0x1, "10")])]);
    let runner = EpochRunner::new(pools, NoGauges).with_sampler(BlockSampler::new(4).unwrap());
    let range = BlockRange {
        start: BlockHeight::new(1_000),
        end: BlockHeight::new(1_010),
    };
    let weights = runner.compute_weights(&token(), range).await.unwrap();
    let expected: Vec<_> = [1_000, 1_002, 1_004, 1_006, 1_008, 1_010]
        .into_iter()
        .map(BlockHeight::new)
        .collect();
    assert_eq!(weights.samples, expected);
    assert_eq!(runner.pools().requested(), expected);
}

#[tokio::test]
async fn ownership_accumulates_across_blocks() {
    let pools = NullPools::new("a")
        .with_default(vec![pool(1, "10", "100", &[(0x1, "10")])])
        .with_block(BlockHeight::new(2), vec![pool(1, "10", "100", &[(0x2, "10")])]);
    let runner = EpochRunner::new(pools, NoGauges);

    let mut acc = OwnershipAccumulator::new();
    for b in 1..=4 {
        acc = runner.accumulate_block(&token(), BlockHeight::new(b), acc).await.unwrap();
    }
    assert_eq!(acc.balance(&addr(1)), units(300));
    assert_eq!(acc.balance(&addr(2)), units(100));
}

#[tokio::test]
async fn transport_failure_aborts_without_output() {
    let pools = NullPools::new("a")
        .with_default(vec![pool(1, "10", "10", &[(0x1, "10")])])
        .failing_at(BlockHeight::new(1_004));
    let runner = EpochRunner::new(pools, NoGauges).with_sampler(BlockSampler::new(5).unwrap());
    let range = BlockRange {
        start: BlockHeight::new(1_000),
        end: BlockHeight::new(1_010),
    };
    let err = runner.compute_weights(&token(), range).await.unwrap_err();
    assert!(matches!(err, EngineError::Data(_)));
    // nothing after the failing block was fetched
    assert_eq!(runner.pools().requested().last(), Some(&BlockHeight::new(1_004)));
}

#[tokio::test]
async fn registry_variants_merge_into_one_accumulator() {
    let a = NullPools::new("registry-a").with_default(vec![pool(1, "10", "100", &[(0x1, "10")])]);
    let b = NullPools::new("registry-b")
        .with_default(vec![pool(2, "4", "300", &[(0x1, "1"), (0x2, "3")])]);
    let merged = MergedPoolSource::new().with_variant(a).with_variant(b);
    assert_eq!(merged.variant_count(), 2);

    let runner = EpochRunner::new(merged, NoGauges);
    let acc = runner
        .accumulate_block(&token(), BlockHeight::new(1), OwnershipAccumulator::new())
        .await
        .unwrap();
    assert_eq!(acc.balance(&addr(1)), units(175));
    assert_eq!(acc.balance(&addr(2)), units(225));
}

#[tokio::test]
async fn duplicate_pool_across_variants_is_data_error() {
    let a = NullPools::new("registry-a").with_default(vec![pool(1, "10", "100", &[(0x1, "10")])]);
    let b = NullPools::new("registry-b").with_default(vec![pool(1, "10", "100", &[(0x1, "10")])]);
    let merged = MergedPoolSource::new().with_variant(a).with_variant(b);
    let runner = EpochRunner::new(merged, NoGauges);
    let err = runner.compute_weights(&token(), single_block()).await.unwrap_err();
    assert!(matches!(err, EngineError::Data(_)));
}

#[tokio::test]
async fn unindexed_gauge_keeps_direct_ownership() {
    let pools = NullPools::new("a")
        .with_default(vec![pool(1, "100", "1000", &[(0xa, "70"), (GAUGE, "30")])]);
    let gauges = NullGauges::new().with_link(pool_id(1), addr(GAUGE));
    let runner = EpochRunner::new(pools, gauges);
    let acc = runner
        .accumulate_block(&token(), BlockHeight::new(1), OwnershipAccumulator::new())
        .await
        .unwrap();
    assert_eq!(acc.balance(&addr(GAUGE)), units(300));
}

#[tokio::test]
async fn window_resolves_to_block_range() {
    let schedule = EpochSchedule::default();
    // one block every second since cycle zero started
    let blocks = NullBlocks::new(schedule.cycle_zero_start, 1);
    let now = Timestamp::new(2_000_000_000);
    let window = schedule.window(CycleSelector::Cycle(1), now).unwrap();
    let range = BlockRange::resolve(&blocks, &window, now).await.unwrap();
    let offset = schedule.cycle_one_start.as_secs() - schedule.cycle_zero_start.as_secs();
    assert_eq!(range.start, BlockHeight::new(offset));
    assert_eq!(range.end, BlockHeight::new(offset + 604_800));
}

#[tokio::test]
async fn pool_weights_drop_small_pools() {
    let pools = NullPools::new("registry-b").with_default(vec![
        pool(1, "1", "600", &[(0x1, "1")]),
        pool(2, "1", "395", &[(0x1, "1")]),
        pool(3, "1", "5", &[(0x1, "1")]),
    ]);
    let weights = compute_pool_weights(
        &pools,
        &BlockSampler::default(),
        &token(),
        BlockHeight::new(0),
        BlockHeight::new(560),
    )
    .await
    .unwrap();
    assert_eq!(weights.len(), 2);
    assert!(weights.iter().all(|w| w.pool_id != pool_id(3)));
    let sum = weights.iter().fold(U256::ZERO, |acc, w| acc + w.weight);
    assert_eq!(sum, weight_unit());
}

#[tokio::test]
async fn average_reserve_divides_by_nominal_sample_count() {
    let reader = NullReserves::constant(U256::new(1_000))
        .with_block(BlockHeight::new(2), U256::new(3_000));
    let blocks: Vec<_> = (1..=4).map(BlockHeight::new).collect();
    let avg = average_reserve(&reader, &token(), &addr(0x42), &blocks, 2).await.unwrap();
    assert_eq!(avg, U256::new(3_000));
}
