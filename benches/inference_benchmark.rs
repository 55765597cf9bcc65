use criterion::{black_box, criterion_group, criterion_main, Criterion};
use medipredict::{
    DiseaseModel, FeatureSchema, FeatureVector, InferenceService, LabelCodec, PredictorError,
    SymptomClassifier, SymptomDataset, SymptomPresence, SymptomStatistics, VectorBuilder,
};
use std::fmt::Write as _;
use std::sync::Arc;

/// Scores each class by the number of set features in its slice of the schema.
#[derive(Debug)]
struct SliceClassifier {
    classes: usize,
}

impl SymptomClassifier for SliceClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<usize, PredictorError> {
        let probabilities = self.predict_probabilities(features)?;
        Ok(probabilities.iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0))
    }

    fn predict_probabilities(&self, features: &FeatureVector) -> Result<Vec<f32>, PredictorError> {
        let mut scores = vec![1.0f32; self.classes];
        for (i, value) in features.as_array().iter().enumerate() {
            scores[i % self.classes] += value;
        }
        let total: f32 = scores.iter().sum();
        Ok(scores.into_iter().map(|s| s / total).collect())
    }
}

fn sample_symptoms() -> SymptomPresence {
    [
        "itching", "skin_rash", "nodal_skin_eruptions", "dischromic_patches",
        "high_fever", "headache", "made_up_symptom",
    ]
    .iter()
    .map(|name| (name.to_string(), 1.0))
    .collect()
}

fn bench_vector_building(c: &mut Criterion) {
    let builder = VectorBuilder::new(FeatureSchema::builtin());
    let symptoms = sample_symptoms();
    let mut group = c.benchmark_group("VectorBuilder");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("build", |b| b.iter(|| {
        builder.build(black_box(&symptoms)).unwrap()
    }));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let codec = LabelCodec::new((0..41).map(|i| format!("disease_{}", i)).collect()).unwrap();
    let model = DiseaseModel::builder()
        .with_classifier(SliceClassifier { classes: 41 })
        .unwrap()
        .with_labels(codec)
        .build()
        .unwrap();
    let service = InferenceService::new(Arc::new(model));
    let symptoms = sample_symptoms();

    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);

    group.bench_function("predict", |b| b.iter(|| {
        service.predict(black_box(&symptoms)).unwrap()
    }));

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let schema = FeatureSchema::builtin();
    let mut csv = schema.names().join(",");
    csv.push_str(",prognosis\n");
    for row in 0..4920 {
        let cells: Vec<&str> = (0..schema.len())
            .map(|i| if (row + i) % 7 == 0 { "1" } else { "0" })
            .collect();
        writeln!(csv, "{},disease_{}", cells.join(","), row % 41).unwrap();
    }
    let dataset = SymptomDataset::from_csv_str(&csv, "prognosis").unwrap();

    c.bench_function("top_symptoms", |b| b.iter(|| {
        SymptomStatistics::new(&dataset).top_symptoms(black_box("disease_7"), 5)
    }));
}

criterion_group!(benches, bench_vector_building, bench_prediction, bench_statistics);
criterion_main!(benches);
