use std::num::NonZeroUsize;

use auction::reference::optimal_assignment;
use auction::source::RandomMatrices;
use auction::{solve, AuctionConfig};

const ASSIGNMENT_SIZE: usize = 64;
const N: usize = 100;

fn main() {
    let config = AuctionConfig::default()
        .with_pipeline_depth(NonZeroUsize::new(4).expect("non-zero depth"));
    let mut totals = [0.; 3];
    let mut iterations = [0; 3];
    let mut optimal = 0.;
    for rewards in RandomMatrices::new(0, ASSIGNMENT_SIZE, ASSIGNMENT_SIZE).take(N) {
        for (i, variant) in auction::Variant::ALL.into_iter().enumerate() {
            let solution = solve(&rewards, variant, &config).expect("converges");
            totals[i] += solution.gain;
            iterations[i] += solution.iterations;
        }
        optimal += optimal_assignment(&rewards).gain;
    }

    for (i, variant) in auction::Variant::ALL.into_iter().enumerate() {
        println!(
            "{variant}: total {:.2}, {} iterations",
            totals[i], iterations[i]
        );
    }
    println!("optimal: total {optimal:.2}");
}
