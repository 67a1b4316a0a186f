//! Benchmark for the pure engines.
//!
//! Run with: cargo bench --package questpet_economy --bench gacha_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use questpet_economy::{ChaChaSource, EconomyConfig, ExperienceSource, Ledger, LevelingTable, RarityTable, UpgradeTable};

fn benchmark_rarity_draw(c: &mut Criterion) {
    let table = RarityTable::default();
    let mut source = ChaChaSource::seeded(1);

    c.bench_function("rarity_draw", |b| {
        b.iter(|| black_box(table.draw(&mut source)));
    });
}

fn benchmark_million_draws(c: &mut Criterion) {
    let table = RarityTable::default();
    let mut source = ChaChaSource::seeded(2);

    let mut group = c.benchmark_group("million_draws");
    group.throughput(Throughput::Elements(1_000_000));
    group.sample_size(10);

    group.bench_function("1M_draws", |b| {
        b.iter(|| black_box(table.run_statistics(&mut source, 1_000_000)));
    });

    group.finish();
}

fn benchmark_apply_experience(c: &mut Criterion) {
    let table = LevelingTable::default();

    c.bench_function("apply_experience_max_grant", |b| {
        b.iter(|| black_box(table.apply_experience(black_box(0), black_box(1), black_box(u32::MAX))));
    });
}

fn benchmark_upgrade_attempt(c: &mut Criterion) {
    let table = UpgradeTable::default();
    let mut source = ChaChaSource::seeded(3);

    c.bench_function("upgrade_attempt", |b| {
        let mut stars = 0u32;
        b.iter(|| {
            stars = (stars + 1) % 5;
            black_box(table.attempt(black_box(stars), &mut source))
        });
    });
}

fn benchmark_ledger_click(c: &mut Criterion) {
    let ledger = Ledger::new(EconomyConfig::default(), ChaChaSource::seeded(4)).unwrap();
    ledger.register_user(1).unwrap();
    ledger.credit_powder(1, 100).unwrap();
    let pet = ledger.summon_pet(1, "bench").unwrap();

    c.bench_function("ledger_pet_click", |b| {
        let mut day = 0u32;
        b.iter(|| {
            day = day.wrapping_add(1);
            black_box(ledger.grant_experience(1, pet.id, ExperienceSource::PetClick, day, None))
        });
    });
}

criterion_group!(
    benches,
    benchmark_rarity_draw,
    benchmark_million_draws,
    benchmark_apply_experience,
    benchmark_upgrade_attempt,
    benchmark_ledger_click
);
criterion_main!(benches);
