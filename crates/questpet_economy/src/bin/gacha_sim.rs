//! # Gacha Simulator
//!
//! Command-line tool to check balance tables against many simulated pulls.

use questpet_economy::{ChaChaSource, EconomyConfig, RarityTier, UniformSource};

/// Average cost of climbing one star tier, fragments included.
struct TierReport {
    stars: u32,
    attempts: f64,
    powder: f64,
    via_fragments: f64,
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Climbs from `stars` to `stars + 1` once, carrying fragments between climbs.
fn climb(config: &EconomyConfig, stars: u32, fragments: &mut u32, source: &mut impl UniformSource) -> (u32, u64, bool) {
    let upgrade = &config.upgrade;
    let Ok(cost) = upgrade.upgrade_cost(stars) else {
        return (0, 0, false);
    };
    let mut attempts = 0;
    let mut powder = 0u64;
    loop {
        if upgrade.can_guarantee(*fragments) {
            *fragments -= upgrade.fragment_threshold;
            return (attempts, powder, true);
        }
        attempts += 1;
        powder = powder.saturating_add(cost);
        let result = upgrade.attempt(stars, source);
        *fragments += result.fragments_gained;
        if result.success {
            return (attempts, powder, false);
        }
    }
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         QUESTPET GACHA SIMULATOR                                 ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help") {
        println!("Usage: gacha_sim [options]");
        println!();
        println!("Options:");
        println!("  --config <path>    Balance tables (default: built-in)");
        println!("  --seed <n>         RNG seed (default: 42)");
        println!("  --draws <n>        Summons to simulate (default: 100000)");
        println!("  --climbs <n>       Climbs per star tier (default: 10000)");
        return;
    }

    let config = match args.iter().position(|a| a == "--config").and_then(|i| args.get(i + 1)) {
        Some(path) => match EconomyConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => EconomyConfig::default(),
    };
    let seed: u64 = parse_flag(&args, "--seed", 42);
    let draws: u32 = parse_flag(&args, "--draws", 100_000);
    let climbs: u32 = parse_flag(&args, "--climbs", 10_000).max(1);

    let mut source = ChaChaSource::seeded(seed);

    println!("Seed: {seed}");
    println!();
    println!("┌─ SUMMONS ({draws} draws) ─────────────────────────────────────────");
    let stats = config.rarity.run_statistics(&mut source, draws);
    for tier in RarityTier::SCARCEST_FIRST {
        println!(
            "│ {:<10} {:>8} draws   {:>6.2}%   (target {:>5.2}%)",
            tier.as_str(),
            stats.count(tier),
            stats.percent(tier),
            config.rarity.probability(tier) * 100.0
        );
    }
    println!("└──────────────────────────────────────────────────────────────────");
    println!();

    let mut reports = Vec::new();
    let mut fragments = 0u32;
    let mut stars = 0u32;
    while config.upgrade.has_probabilistic_upgrade(stars) {
        let mut attempts = 0u64;
        let mut powder = 0u64;
        let mut via_fragments = 0u64;
        for _ in 0..climbs {
            let (a, p, guaranteed) = climb(&config, stars, &mut fragments, &mut source);
            attempts += u64::from(a);
            powder = powder.saturating_add(p);
            via_fragments += u64::from(guaranteed);
        }
        let n = f64::from(climbs);
        reports.push(TierReport {
            stars,
            attempts: attempts as f64 / n,
            powder: powder as f64 / n,
            via_fragments: via_fragments as f64 / n * 100.0,
        });
        stars += 1;
    }

    println!("┌─ UPGRADES ({climbs} climbs per tier) ─────────────────────────────");
    for report in &reports {
        println!(
            "│ {}★ -> {}★   {:>3}%   {:>6.2} attempts   {:>9.1} powder   {:>5.2}% via fragments",
            report.stars,
            report.stars + 1,
            config.upgrade.success_rate(report.stars),
            report.attempts,
            report.powder,
            report.via_fragments
        );
    }
    println!("└──────────────────────────────────────────────────────────────────");
    println!();
    println!(
        "Tiers past {}★ only upgrade by spending {} fragments.",
        stars, config.upgrade.fragment_threshold
    );
}
