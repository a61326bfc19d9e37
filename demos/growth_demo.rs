use std::collections::hash_map::RandomState;

use chain_hash::HashSet;
use chain_hash::LinkedHashSet;
use chain_hash::TableConfig;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "values", default_value_t = 1000)]
    values: u64,

    #[arg(short = 'c', long = "initial_capacity", default_value_t = 16)]
    initial_capacity: usize,

    #[arg(short = 'l', long = "load_factor", default_value_t = 0.75)]
    load_factor: f32,

    #[arg(short = 'm', long = "max_capacity", default_value_t = chain_hash::MAX_CAPACITY)]
    max_capacity: usize,

    /// Remove every other value after filling, to show that capacity stays.
    #[arg(long)]
    remove_half: bool,
}

fn main() {
    let args = Args::parse();
    let config = TableConfig {
        initial_capacity: args.initial_capacity,
        load_factor: args.load_factor,
        max_capacity: args.max_capacity,
    };

    let mut set = match HashSet::try_with_config_and_hasher(config, RandomState::new()) {
        Ok(set) => set,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };

    println!("Initial capacity: {}", set.capacity());
    println!("Inserting {} values...", args.values);

    let mut capacity = set.capacity();
    let mut refused = 0;
    for value in 0..args.values {
        match set.try_insert(value) {
            Ok(_) => {}
            Err(err) => {
                if refused == 0 {
                    println!("  insert of {value} refused: {err}");
                }
                refused += 1;
                continue;
            }
        }
        if set.capacity() != capacity {
            println!(
                "  grew {} -> {} buckets at {} values",
                capacity,
                set.capacity(),
                set.len()
            );
            capacity = set.capacity();
        }
    }

    println!("Inserted {} values ({} refused)", set.len(), refused);
    println!();
    set.stats().print();
    println!("chain histogram: {:?}", set.chain_histogram());

    if args.remove_half {
        set.retain(|v| v % 2 == 1);
        println!();
        println!(
            "After removing even values: {} values in {} buckets",
            set.len(),
            set.capacity()
        );
        set.stats().print();
    }

    let mut linked = LinkedHashSet::with_hasher(RandomState::new());
    linked.extend(set.iter().copied().take(8));
    linked.insert(u64::MAX);
    println!();
    println!("First values in insertion order: {:?}", linked);
}
