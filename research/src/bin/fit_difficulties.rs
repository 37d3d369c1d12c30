use std::{collections::BTreeMap, error::Error as StdError, io};

use clap::Parser as _;
use ordered_float::OrderedFloat;
use sieglinde::{Estimator, MaxDeltaTracking, Observation, Solution};
use sieglinde_research::score::{ByThreshold, RawScore, Threshold};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(clap::Parser)]
struct Opt {
    #[clap(long, default_value = "0.001")]
    tolerance: f64,
    #[clap(long, default_value = "20")]
    warmup_rounds: u64,
    /// Stop after this many rounds even without convergence.
    #[clap(long)]
    max_rounds: Option<u64>,
    /// Stop when two consecutive rounds report the same max delta.
    #[clap(long)]
    detect_stall: bool,
    /// Track the max delta by magnitude rather than in the direction of the
    /// first nonzero delta.
    #[clap(long)]
    absolute_max_delta: bool,
}

fn describe(solution: &Solution) -> String {
    format!(
        "{:?} after {} rounds (md = {}, alpha = {})",
        solution.termination, solution.rounds, solution.max_delta, solution.alpha
    )
}

fn main() -> Result<(), Box<dyn StdError>> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let opt = Opt::parse();

    let estimator = Estimator::builder()
        .tolerance(opt.tolerance)
        .warmup_rounds(opt.warmup_rounds)
        .max_rounds(opt.max_rounds)
        .detect_stall(opt.detect_stall)
        .max_delta_tracking(if opt.absolute_max_delta {
            MaxDeltaTracking::Absolute
        } else {
            MaxDeltaTracking::SignBiased
        })
        .build();

    let mut reader = csv::Reader::from_reader(io::stdin().lock());

    let mut observations: ByThreshold<Vec<Observation>> = ByThreshold::default();

    for score in reader.deserialize() {
        let score: RawScore = score?;
        if let Some(by_threshold) = score.observations() {
            for threshold in Threshold::ALL {
                observations
                    .get_mut(threshold)
                    .push(by_threshold.get(threshold).clone());
            }
        }
    }

    let ByThreshold {
        easy_clear,
        hard_clear,
    } = observations;

    let (easy_clear, hard_clear) = rayon::join(
        || estimator.fit(easy_clear),
        || estimator.fit(hard_clear),
    );
    let (easy_clear, hard_clear) = (easy_clear?, hard_clear?);

    let mut charts: BTreeMap<&str, ByThreshold<Option<f64>>> = BTreeMap::new();
    for (chart, difficulty) in &easy_clear.difficulties {
        charts.entry(chart.as_str()).or_default().easy_clear = Some(f64::from(*difficulty));
    }
    for (chart, difficulty) in &hard_clear.difficulties {
        charts.entry(chart.as_str()).or_default().hard_clear = Some(f64::from(*difficulty));
    }

    let mut rows: Vec<_> = charts.into_iter().collect();
    rows.sort_by_key(|(_, difficulty)| {
        OrderedFloat(difficulty.easy_clear.unwrap_or(f64::INFINITY))
    });

    let cell = |value: Option<f64>| value.map_or_else(String::new, |v| v.to_string());

    println!("chart,ec,hc");
    for (chart, difficulty) in rows {
        println!(
            "{},{},{}",
            chart,
            cell(difficulty.easy_clear),
            cell(difficulty.hard_clear)
        );
    }
    println!("# ec: {}", describe(&easy_clear));
    println!("# hc: {}", describe(&hard_clear));

    Ok(())
}
