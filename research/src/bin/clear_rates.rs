use std::{error::Error as StdError, io};

use compensated_summation::KahanBabuskaNeumaier;
use rustc_hash::FxHashMap;
use sieglinde_research::score::{ByThreshold, RawScore, Threshold};

#[derive(Default, Debug)]
struct Stats {
    plays: u64,
    clears: ByThreshold<u64>,
}

impl Stats {
    fn rate(&self, threshold: Threshold) -> f64 {
        *self.clears.get(threshold) as f64 / self.plays as f64
    }
}

fn main() -> Result<(), Box<dyn StdError>> {
    let mut reader = csv::Reader::from_reader(io::stdin().lock());

    let mut by_chart: FxHashMap<String, Stats> = FxHashMap::default();

    for score in reader.deserialize() {
        let score: RawScore = score?;
        let Some(observations) = score.observations() else {
            continue;
        };

        let stats = by_chart.entry(score.chart).or_default();
        stats.plays += 1;
        for threshold in Threshold::ALL {
            if observations.get(threshold).outcome.is_pass() {
                *stats.clears.get_mut(threshold) += 1;
            }
        }
    }

    let mut charts: Vec<_> = by_chart.into_iter().collect();
    charts.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

    let mut total_rate: ByThreshold<KahanBabuskaNeumaier<f64>> = ByThreshold::default();

    println!("chart,plays,ec_rate,hc_rate");
    for (chart, stats) in &charts {
        println!(
            "{},{},{},{}",
            chart,
            stats.plays,
            stats.rate(Threshold::EasyClear),
            stats.rate(Threshold::HardClear)
        );
        for threshold in Threshold::ALL {
            *total_rate.get_mut(threshold) += stats.rate(threshold);
        }
    }

    println!(
        "# average ec_rate {}, average hc_rate {} over {} charts",
        total_rate.easy_clear.total() / charts.len() as f64,
        total_rate.hard_clear.total() / charts.len() as f64,
        charts.len()
    );

    Ok(())
}
