use auction::{solve_rows, AuctionConfig, Variant};

fn main() {
    let inf = f64::INFINITY;
    // rows are measurements, columns are tracks; -inf marks an impossible pairing
    #[rustfmt::skip]
    let rewards = vec![
        vec![-inf,   2., -inf, -inf,    3.],
        vec![  7., -inf,  23., -inf, -inf],
        vec![ 17.,  24., -inf, -inf, -inf],
        vec![-inf,   6.,  13.,   2., -inf],
    ];

    let config = AuctionConfig::default();
    for variant in Variant::ALL {
        match solve_rows(&rewards, variant, &config) {
            Ok(solution) => println!(
                "{variant}: gain {} after {} iterations, assignment {:?}",
                solution.gain, solution.iterations, solution.assignment
            ),
            Err(err) => eprintln!("{variant}: {err}"),
        }
    }
}
