// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scriptshim::network::ResourceType;
use scriptshim::{Classifier, InterceptConfig};
use url::Url;

fn classify_benchmark(c: &mut Criterion) {
    let classifier = Classifier::new(&InterceptConfig::default());
    let urls: Vec<Url> = [
        "https://localhost/src/app.ts",
        "https://localhost/src/app.js",
        "https://example.com/src/app.ts",
        "http://localhost:8080/assets/",
        "http://localhost/vendor/lib.min.js?v=3",
    ]
    .iter()
    .map(|u| Url::parse(u).unwrap())
    .collect();

    c.bench_function("classify_script_requests", |b| {
        b.iter(|| {
            for url in &urls {
                black_box(classifier.classify(black_box(url), ResourceType::Script));
            }
        })
    });
}

criterion_group!(benches, classify_benchmark);
criterion_main!(benches);
