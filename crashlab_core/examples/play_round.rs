use crashlab_core::{Provider, Registry, SeedPair};

fn main() {
    // Example end-to-end round settlement
    let seeds = SeedPair::new("example-client-seed", "example-server-seed").unwrap();
    let registry = Registry::new(Provider::Bch);

    let nonce = 1u64;
    let target = 2.0;
    let bet = 10.0;

    let multiplier = registry.multiplier(&seeds, nonce, None).unwrap();
    let won = multiplier >= target;
    let profit = if won { bet * multiplier - bet } else { -bet };

    println!(
        "nonce={} multiplier={}x target={}x won={} profit={:.2}",
        nonce, multiplier, target, won, profit
    );
}
