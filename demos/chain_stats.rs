use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use dense_hash::DenseTable;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "capacity", default_value_t = 1000)]
    capacity: usize,

    /// Fraction of the capacity to fill before printing statistics.
    #[arg(short = 'f', long = "fill", default_value_t = 0.9)]
    fill: f64,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn main() {
    let args = Args::parse();

    println!("Creating DenseTable with capacity: {}", args.capacity);

    let mut table: DenseTable<u64> =
        DenseTable::with_capacity(args.capacity).expect("capacity must be at least 1");

    println!(
        "Hashable prefix: {} of {} cells",
        table.hashable_capacity(),
        table.bucket_count()
    );

    let target = (args.capacity as f64 * args.fill) as usize;
    println!("Filling table with {} u64 values...", target);

    for value in 0..target as u64 {
        let hash = hash_u64(value);
        let (_, inserted) = table.insert(hash, value, |a, b| a == b, |v| hash_u64(*v));
        assert!(inserted, "value already present: {}", value);
    }

    // Erase a stride of entries so the free list shows up in the report.
    let mut erased = 0;
    for value in (0..target as u64).step_by(7) {
        if table.remove(hash_u64(value), |v| *v == value).is_some() {
            erased += 1;
        }
    }

    println!(
        "Inserted {} values, erased {}, final population {}",
        target,
        erased,
        table.len()
    );
    println!(
        "Final load factor: {:.2}%",
        f64::from(table.load_factor()) * 100.0
    );

    table.chain_stats().print();
}
