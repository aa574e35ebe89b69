use super::classifier::{ClassifyError, Classifier, MalformedInput};
use super::cluster::{LabelStrategy, WastageVerdict};
use super::trainer::{ModelTrainer, TrainerConfig};
use crate::logic::dataset::{DatasetError, DatasetFormat, HistoricalDataset};
use crate::logic::features::layout::FEATURE_VERSION;
use crate::logic::features::{FeatureError, FeatureVector};

fn scenario_dataset() -> HistoricalDataset {
    HistoricalDataset::from_values(&[
        [0.0, 20.0, 0.0, 0.0, 0.1],
        [0.0, 21.0, 0.0, 0.0, 0.1],
        [1.0, 28.0, 1.0, 1.0, 5.0],
        [1.0, 29.0, 1.0, 1.0, 5.2],
    ])
    .unwrap()
}

fn fitted_classifier() -> Classifier {
    let (model, _) = ModelTrainer::default().fit(&scenario_dataset()).unwrap();
    let classifier = Classifier::new();
    classifier.install(model).unwrap();
    classifier
}

fn active_reading() -> FeatureVector {
    FeatureVector::from_values([1.0, 29.0, 1.0, 1.0, 5.1])
}

#[test]
fn test_high_activity_rows_cluster_together_as_wastage() {
    let (model, report) = ModelTrainer::default().fit(&scenario_dataset()).unwrap();

    let a = &report.assignments;
    assert_eq!(a.len(), 4);
    assert_eq!(a[0], a[1]);
    assert_eq!(a[2], a[3]);
    assert_ne!(a[0], a[2]);
    assert_eq!(report.cluster_sizes, vec![2, 2]);

    assert_eq!(report.wastage_cluster, a[2]);
    assert_eq!(model.clusters.verdict_for(a[2]), WastageVerdict::Wastage);
    assert_eq!(model.clusters.verdict_for(a[0]), WastageVerdict::Normal);
    assert_eq!(report.row_predictions(), vec![0, 0, 1, 1]);
}

#[test]
fn test_active_reading_predicts_wastage() {
    let classifier = fitted_classifier();
    let verdict = classifier.predict(&active_reading()).unwrap();
    assert_eq!(verdict, WastageVerdict::Wastage);

    let idle = FeatureVector::from_values([0.0, 20.5, 0.0, 0.0, 0.1]);
    assert_eq!(classifier.predict(&idle).unwrap(), WastageVerdict::Normal);
}

#[test]
fn test_predict_before_fit_is_rejected() {
    let classifier = Classifier::new();
    assert!(matches!(classifier.model(), Err(ClassifyError::UnfittedModel)));

    let result = classifier.predict(&active_reading());
    assert!(matches!(result, Err(ClassifyError::UnfittedModel)));
}

#[test]
fn test_install_only_once() {
    let classifier = Classifier::new();
    let (first, _) = ModelTrainer::default().fit(&scenario_dataset()).unwrap();
    let (second, _) = ModelTrainer::default().fit(&scenario_dataset()).unwrap();
    let first_id = first.metadata.model_id.clone();

    classifier.install(first).unwrap();
    assert!(classifier.model().is_ok());

    let again = classifier.install(second);
    assert!(matches!(again, Err(ClassifyError::AlreadyFitted)));
    assert_eq!(classifier.model().unwrap().metadata.model_id, first_id);
}

#[test]
fn test_prediction_is_deterministic() {
    let classifier = fitted_classifier();
    let reading = FeatureVector::from_values([1.0, 24.0, 0.0, 1.0, 2.6]);

    let first = classifier.classify(&reading).unwrap();
    for _ in 0..10 {
        assert_eq!(classifier.classify(&reading).unwrap(), first);
    }
}

#[test]
fn test_mean_point_normalizes_to_zero() {
    let (model, _) = ModelTrainer::default().fit(&scenario_dataset()).unwrap();
    let mean = model.normalizer.mean;

    let normalized = model.normalizer.transform(&mean);
    assert!(normalized.iter().all(|v| *v == 0.0));
}

#[test]
fn test_every_reading_gets_a_cluster() {
    let classifier = fitted_classifier();
    let readings = [
        [0.0, -40.0, 0.0, 0.0, 0.0],
        [1.0, 100.0, 1.0, 1.0, 1000.0],
        [0.5, 24.5, 0.5, 0.5, 2.6],
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0, 1e9, 0.0, 1.0, -1e9],
    ];

    for values in readings {
        let c = classifier.classify(&FeatureVector::from_values(values)).unwrap();
        assert!(c.cluster < 2);
        assert_eq!(c.distances.len(), 2);
        assert!(c.confidence >= 0.5 && c.confidence <= 1.0);
    }
}

#[test]
fn test_refit_with_same_seed_is_reproducible() {
    let trainer = ModelTrainer::new(TrainerConfig {
        seed: 1234,
        ..Default::default()
    });
    let (a, report_a) = trainer.fit(&scenario_dataset()).unwrap();
    let (b, report_b) = trainer.fit(&scenario_dataset()).unwrap();

    assert_eq!(a.normalizer, b.normalizer);
    assert_eq!(a.clusters, b.clusters);
    assert_eq!(report_a.assignments, report_b.assignments);
    // Each fit gets its own identity
    assert_ne!(a.metadata.model_id, b.metadata.model_id);
}

#[test]
fn test_fixed_cluster_id_strategy() {
    let trainer = ModelTrainer::new(TrainerConfig {
        label_strategy: LabelStrategy::FixedClusterId,
        ..Default::default()
    });
    let (model, report) = trainer.fit(&scenario_dataset()).unwrap();

    assert_eq!(report.wastage_cluster, 1);
    assert_eq!(model.clusters.strategy, LabelStrategy::FixedClusterId);
    assert_eq!(model.clusters.verdict_for(1), WastageVerdict::Wastage);
    assert_eq!(model.clusters.verdict_for(0), WastageVerdict::Normal);
}

#[test]
fn test_single_row_is_insufficient() {
    let dataset = HistoricalDataset::from_values(&[[1.0, 25.0, 1.0, 0.0, 1.5]]).unwrap();
    let result = ModelTrainer::default().fit(&dataset);

    match result {
        Err(DatasetError::InsufficientData { rows, required }) => {
            assert_eq!(rows, 1);
            assert_eq!(required, 2);
        }
        other => panic!("Expected InsufficientData, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_constant_column_does_not_break_fit() {
    // person_detected never changes
    let dataset = HistoricalDataset::from_values(&[
        [1.0, 20.0, 0.0, 0.0, 0.1],
        [1.0, 21.0, 0.0, 0.0, 0.2],
        [1.0, 28.0, 1.0, 1.0, 4.8],
        [1.0, 29.0, 1.0, 1.0, 5.0],
    ])
    .unwrap();
    let (model, report) = ModelTrainer::default().fit(&dataset).unwrap();

    assert_eq!(model.normalizer.std_dev[0], 0.0);
    assert_eq!(model.normalizer.scale[0], 1.0);
    assert!(model.clusters.centroids.iter().all(|v| v.is_finite()));
    assert_eq!(report.row_predictions(), vec![0, 0, 1, 1]);
}

#[test]
fn test_metadata_records_layout_and_rows() {
    let (model, _) = ModelTrainer::default().fit(&scenario_dataset()).unwrap();

    assert_eq!(model.metadata.training_rows, 4);
    assert_eq!(model.metadata.seed, 42);
    assert_eq!(model.metadata.layout.version, FEATURE_VERSION);
    assert!(uuid::Uuid::parse_str(&model.metadata.model_id).is_ok());
    assert_eq!(model.metadata.dataset_fingerprint, scenario_dataset().fingerprint());
    assert_eq!(model.metadata.dataset_fingerprint.len(), 64);
}

#[test]
fn test_layout_mismatch_is_rejected() {
    let classifier = fitted_classifier();
    let mut reading = active_reading();
    reading.layout_hash = !reading.layout_hash;

    let result = classifier.predict(&reading);
    assert!(matches!(result, Err(ClassifyError::LayoutMismatch(_))));
}

#[test]
fn test_non_finite_reading_is_malformed() {
    let classifier = fitted_classifier();
    let reading = FeatureVector::from_values([1.0, f64::NAN, 1.0, 1.0, 5.0]);

    match classifier.predict(&reading) {
        Err(ClassifyError::MalformedInput(MalformedInput::Field(FeatureError::NotFinite(f)))) => {
            assert_eq!(f, "temperature");
        }
        other => panic!("Expected NotFinite, got {:?}", other),
    }
}

#[test]
fn test_confidence_higher_near_centroid() {
    let classifier = fitted_classifier();
    let near = classifier.classify(&active_reading()).unwrap();
    let middle = classifier
        .classify(&FeatureVector::from_values([0.5, 24.5, 0.5, 0.5, 2.6]))
        .unwrap();

    assert!(near.confidence > middle.confidence);
}

#[test]
fn test_bundled_dataset_trains() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("dataset.csv");
    let dataset = HistoricalDataset::load(&path, DatasetFormat::Csv).unwrap();
    let (model, report) = ModelTrainer::default().fit(&dataset).unwrap();

    assert_eq!(report.rows, dataset.len());
    assert_eq!(report.cluster_sizes.iter().sum::<usize>(), dataset.len());

    // Wastage cluster is the one drawing more current
    let raw = model.clusters.raw_centroids(&model.normalizer);
    let wastage = raw[report.wastage_cluster][4];
    let normal = raw[1 - report.wastage_cluster][4];
    assert!(wastage > normal);
}

#[test]
fn test_huge_reading_keeps_confidence_bounded() {
    let classifier = fitted_classifier();

    let huge = classifier
        .classify(&FeatureVector::from_values([1.0, 1e200, 1.0, 1.0, 1e200]))
        .unwrap();
    assert!(huge.cluster < 2);
    assert!(huge.distances.iter().all(|d| d.is_finite()));
    assert!(huge.confidence.is_finite());
    assert!(huge.confidence >= 0.5 && huge.confidence <= 1.0);

    // True distances overflow, the verdict and confidence do not
    let extreme = classifier
        .classify(&FeatureVector::from_values([1.0, f64::MAX, 1.0, 1.0, f64::MAX]))
        .unwrap();
    assert!(extreme.cluster < 2);
    assert!(extreme.confidence >= 0.5 && extreme.confidence <= 1.0);
}

#[test]
fn test_unbounded_reading_falls_to_lower_cluster() {
    let classifier = fitted_classifier();
    // person_detected has std 0.5, so MAX overflows once normalized
    let reading = FeatureVector::from_values([f64::MAX, 25.0, 0.0, 0.0, 1.0]);

    let c = classifier.classify(&reading).unwrap();
    assert_eq!(c.cluster, 0);
    assert_eq!(c.confidence, 0.5);
    assert!(c.distances.iter().all(|d| d.is_infinite()));
}
