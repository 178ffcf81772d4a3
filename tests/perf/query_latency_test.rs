use std::time::Instant;

use crate::config::ResolverPolicy;
use crate::matcher::{normalize, transliterate};
use crate::model::CatalogEntry;
use crate::resolver::rank_candidates;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.total_cmp(b));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn warm_catalog_match_p95_under_budget() {
    let mut catalog: Vec<CatalogEntry> = (0..10_000)
        .map(|i| {
            CatalogEntry::new(
                &format!("Tool {i:05} Studio"),
                &format!("C:\\Program Files\\Tool{i:05}\\tool{i:05}.exe"),
            )
        })
        .collect();
    catalog.push(CatalogEntry::new(
        "discord",
        "C:\\Users\\X\\AppData\\Local\\Discord\\app-1.2\\Discord.exe",
    ));

    let policy = ResolverPolicy::default();
    let query = normalize("дискорд");
    let transliterated = transliterate(&query);

    for _ in 0..10 {
        let _ = rank_candidates(&catalog, &query, &transliterated, &policy);
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(20);
        for _ in 0..20 {
            let start = Instant::now();
            let ranked = rank_candidates(&catalog, &query, &transliterated, &policy);
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
            assert_eq!(ranked[0].0.name, "discord");
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.total_cmp(b));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 250.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 250.0ms); batches={batch_p95:?}",
    );
}
