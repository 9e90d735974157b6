use roitrack::{AssociationConfig, AssociationStrategy, EndpointPair, LabeledRoi, Roi};

/// `count` correspondences `step` px apart, each moved by `shift` between frames
fn matches_along(start: [f64; 2], step: f64, count: usize, shift: [f64; 2]) -> Vec<EndpointPair> {
    (0..count)
        .map(|i| {
            let prev = [start[0] + i as f64 * step, start[1]];
            (prev, [prev[0] + shift[0], prev[1] + shift[1]])
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    println!("Comparing greedy and bipartite box association...");

    // Two cars in the previous frame; in the current frame a third detection
    // overlaps the first car and steals most of its keypoints.
    let previous = vec![
        LabeledRoi::new(0, Roi::new(100.0, 100.0, 200.0, 150.0)),
        LabeledRoi::new(1, Roi::new(500.0, 120.0, 180.0, 140.0)),
    ];
    let current = vec![
        LabeledRoi::new(0, Roi::new(105.0, 102.0, 200.0, 150.0)),
        LabeledRoi::new(1, Roi::new(505.0, 121.0, 180.0, 140.0)),
        LabeledRoi::new(2, Roi::new(120.0, 110.0, 80.0, 60.0)),
    ];

    let mut endpoints: Vec<EndpointPair> = Vec::new();
    endpoints.extend(matches_along([150.0, 200.0], 20.0, 6, [5.0, 2.0]));
    endpoints.extend(matches_along([130.0, 130.0], 5.0, 8, [5.0, 2.0]));
    endpoints.extend(matches_along([520.0, 180.0], 30.0, 5, [5.0, 1.0]));

    for strategy in [AssociationStrategy::GreedyMaxTally, AssociationStrategy::Bipartite] {
        let config = AssociationConfig {
            strategy,
            ..Default::default()
        };
        let (tally, map) = config.associate(&current, &previous, &endpoints);

        println!("\n{:?}", strategy);
        println!(
            "  tally (rows = current, cols = previous):\n{}",
            tally.counts
        );
        for a in map.iter() {
            println!(
                "  current {} -> previous {} (support {})",
                a.current_id, a.previous_id, a.support
            );
        }
        let shared = map.previous_claims();
        if !shared.is_empty() {
            println!("  previous boxes claimed twice: {:?}", shared);
        }
    }

    Ok(())
}
