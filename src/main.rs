use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;
use treap_map::treap::{PriorityPool, TreapMap};

const NUM_OF_REPLICATIONS: usize = 1000;
const NUM_OF_KEYS: u32 = 60;

fn mean_and_deviation(samples: &[f64]) -> (f64, f64) {
    let len = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / len;
    if samples.len() < 2 {
        return (mean, 0.0);
    }
    let variance = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (len - 1.0);
    (mean, variance.sqrt())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let seed = env::args().nth(1).and_then(|arg| arg.parse::<u64>().ok());
    let mut balance_factors = Vec::with_capacity(NUM_OF_REPLICATIONS);
    for replication in 0..NUM_OF_REPLICATIONS {
        let pool = match seed {
            Some(seed) => PriorityPool::with_seed(seed.wrapping_add(replication as u64)),
            None => PriorityPool::new(),
        };
        let mut tree = TreapMap::with_pool(pool);
        for key in 0..NUM_OF_KEYS {
            if let Err(error) = tree.insert(key, key) {
                eprintln!("error: {}", error);
                std::process::exit(1);
            }
        }
        balance_factors.push(tree.balance_factor());
    }

    let (mean, deviation) = mean_and_deviation(&balance_factors);
    info!(
        replications = NUM_OF_REPLICATIONS,
        keys = NUM_OF_KEYS,
        "characterized treap balance"
    );
    println!("mean balance factor: {:.4}", mean);
    println!("standard deviation: {:.4}", deviation);
}
