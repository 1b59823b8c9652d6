//! Prediction orchestration: build vector, validate against the artefacts,
//! scale, predict, map to a verdict.

use tracing::{info, warn};

use crate::artifacts::domain::{ArtifactStore, Classifier, FlowArtifacts, Scaler};
use crate::common::error::{PredictError, PredictResult};
use crate::common::fingerprint::Fingerprint;
use crate::common::time;
use crate::features::domain::{DiabetesInput, FeatureVector, HeartInput};
use crate::features::image::{self, ResizeFilter};
use crate::features::service::{diabetes_vector, heart_vector};

use super::domain::{Flow, FlowRequest, Prediction};

/// Runs the per-flow pipelines against an artefact store.
pub struct Predictor<S> {
    store: S,
    resize_filter: ResizeFilter,
}

impl<S: ArtifactStore> Predictor<S> {
    pub fn new(store: S, resize_filter: ResizeFilter) -> Self {
        Self {
            store,
            resize_filter,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn predict_heart(&self, input: &HeartInput) -> PredictResult<Prediction> {
        self.run(Flow::Heart, || Ok(heart_vector(input)))
    }

    pub fn predict_diabetes(&self, input: &DiabetesInput) -> PredictResult<Prediction> {
        self.run(Flow::Diabetes, || Ok(diabetes_vector(input)))
    }

    /// Predict from raw upload bytes (PNG or JPEG).
    pub fn predict_covid(&self, image_bytes: &[u8]) -> PredictResult<Prediction> {
        self.run(Flow::Covid, || {
            image::extract_bytes(image_bytes, self.resize_filter)
        })
    }

    pub fn predict(&self, request: &FlowRequest) -> PredictResult<Prediction> {
        match request {
            FlowRequest::Heart(input) => self.predict_heart(input),
            FlowRequest::Diabetes(input) => self.predict_diabetes(input),
            FlowRequest::Covid { image } => self.predict_covid(image),
        }
    }

    fn run<F>(&self, flow: Flow, build: F) -> PredictResult<Prediction>
    where
        F: FnOnce() -> PredictResult<FeatureVector>,
    {
        let start = time::now_ms();
        let outcome = build().and_then(|vector| {
            let fingerprint = Fingerprint::of_values(vector.as_slice());
            let label = self.classify(flow, vector)?;
            Ok((label, fingerprint))
        });
        let dur_ms = time::elapsed_ms(start);

        match outcome {
            Ok((label, fingerprint)) => {
                let prediction = Prediction::new(flow, label, dur_ms, fingerprint);
                info!(
                    ev = "predict",
                    flow = %flow,
                    code = 0u32,
                    dur_ms,
                    label,
                    verdict = ?prediction.verdict,
                    fingerprint = %prediction.fingerprint,
                    "prediction complete"
                );
                Ok(prediction)
            }
            Err(err) => {
                warn!(
                    ev = "predict",
                    flow = %flow,
                    code = err.code() as u32,
                    dur_ms,
                    error = %err,
                    "prediction failed"
                );
                Err(err)
            }
        }
    }

    fn classify(&self, flow: Flow, vector: FeatureVector) -> PredictResult<i64> {
        let FlowArtifacts { classifier, scaler } = self.store.load(flow)?;

        let model_input = match (flow.uses_scaler(), scaler) {
            (true, Some(scaler)) => {
                check_input(flow, "scaler", scaler.n_features(), scaler.feature_names(), &vector)?;
                scaler.transform(&vector)
            }
            (true, None) => {
                return Err(PredictError::schema(
                    flow,
                    "scaler",
                    "flow requires a fitted scaler but none was loaded",
                ))
            }
            (false, _) => vector,
        };

        check_input(
            flow,
            "classifier",
            classifier.n_features(),
            classifier.feature_names(),
            &model_input,
        )?;
        Ok(classifier.predict(&model_input))
    }
}

/// Reject a vector whose width or column names disagree with an artefact.
fn check_input(
    flow: Flow,
    stage: &'static str,
    expected: usize,
    names: Option<&[String]>,
    vector: &FeatureVector,
) -> PredictResult<()> {
    if vector.len() != expected {
        return Err(PredictError::schema(
            flow,
            stage,
            format!("expected {expected} values, got {}", vector.len()),
        ));
    }
    if let (Some(names), Some(schema)) = (names, flow.schema()) {
        for (idx, (have, want)) in schema.names().zip(names).enumerate() {
            if have != want.as_str() {
                return Err(PredictError::schema(
                    flow,
                    stage,
                    format!("column {idx} is '{have}' but the artefact expects '{want}'"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::common::error::PredictCode;
    use crate::features::domain::{Sex, YesNo};

    type CallLog = Rc<RefCell<Vec<String>>>;

    struct StubClassifier {
        width: usize,
        label: i64,
        names: Option<Vec<String>>,
        log: CallLog,
    }

    impl Classifier for StubClassifier {
        fn n_features(&self) -> usize {
            self.width
        }

        fn feature_names(&self) -> Option<&[String]> {
            self.names.as_deref()
        }

        fn predict(&self, features: &FeatureVector) -> i64 {
            self.log
                .borrow_mut()
                .push(format!("predict {:?}", features.as_slice()));
            self.label
        }
    }

    /// Adds 100 to every column so tests can see what the classifier received.
    struct StubScaler {
        width: usize,
        log: CallLog,
    }

    impl Scaler for StubScaler {
        fn n_features(&self) -> usize {
            self.width
        }

        fn transform(&self, features: &FeatureVector) -> FeatureVector {
            self.log.borrow_mut().push("transform".to_string());
            FeatureVector::new(features.as_slice().iter().map(|v| v + 100.0).collect())
        }
    }

    struct StubStore {
        width: usize,
        scaler_width: Option<usize>,
        label: i64,
        names: Option<Vec<String>>,
        log: CallLog,
    }

    impl StubStore {
        fn new(width: usize, scaler_width: Option<usize>, label: i64) -> Self {
            Self {
                width,
                scaler_width,
                label,
                names: None,
                log: CallLog::default(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    impl ArtifactStore for StubStore {
        fn load(&self, flow: Flow) -> PredictResult<FlowArtifacts> {
            self.log.borrow_mut().push(format!("load {flow}"));
            Ok(FlowArtifacts {
                classifier: Box::new(StubClassifier {
                    width: self.width,
                    label: self.label,
                    names: self.names.clone(),
                    log: self.log.clone(),
                }),
                scaler: self.scaler_width.map(|width| {
                    Box::new(StubScaler {
                        width,
                        log: self.log.clone(),
                    }) as Box<dyn Scaler>
                }),
            })
        }
    }

    fn reference_heart() -> HeartInput {
        HeartInput {
            fasting_blood_sugar: YesNo::No,
            exercise_angina: YesNo::No,
            sex: Sex::Male,
            ..HeartInput::default()
        }
    }

    #[test]
    fn heart_reference_case_detects_disease() {
        let predictor = Predictor::new(StubStore::new(13, None, 1), ResizeFilter::default());
        let p = predictor.predict_heart(&reference_heart()).unwrap();
        assert_eq!(p.message, "Detected Heart Disease");
        assert_eq!(
            predictor.store().calls(),
            vec![
                "load heart".to_string(),
                "predict [30.0, 1.0, 0.0, 120.0, 200.0, 0.0, 0.0, 150.0, 0.0, 0.0, 0.0, 0.0, 2.0]"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn heart_ignores_a_stray_scaler() {
        let predictor = Predictor::new(StubStore::new(13, Some(13), 0), ResizeFilter::default());
        let p = predictor.predict_heart(&reference_heart()).unwrap();
        assert_eq!(p.message, "Healthy Heart");
        assert!(!predictor.store().calls().contains(&"transform".to_string()));
    }

    #[test]
    fn diabetes_scales_once_before_predicting() {
        let predictor = Predictor::new(StubStore::new(8, Some(8), 0), ResizeFilter::default());
        let p = predictor.predict_diabetes(&DiabetesInput::default()).unwrap();
        assert_eq!(p.message, "Do not worry, there is no diabetes.");
        assert_eq!(
            predictor.store().calls(),
            vec![
                "load diabetes".to_string(),
                "transform".to_string(),
                format!("predict {:?}", [100.0; 8]),
            ]
        );
    }

    #[test]
    fn diabetes_without_scaler_is_rejected() {
        let predictor = Predictor::new(StubStore::new(8, None, 0), ResizeFilter::default());
        let err = predictor.predict_diabetes(&DiabetesInput::default()).unwrap_err();
        assert_eq!(err.code(), PredictCode::SchemaMismatch);
    }

    #[test]
    fn width_mismatch_never_reaches_the_model() {
        let predictor = Predictor::new(StubStore::new(12, None, 1), ResizeFilter::default());
        let err = predictor.predict_heart(&reference_heart()).unwrap_err();
        assert_eq!(err.code(), PredictCode::SchemaMismatch);
        assert_eq!(
            err.to_string(),
            "heart input does not match the classifier: expected 12 values, got 13"
        );
        assert_eq!(predictor.store().calls(), vec!["load heart".to_string()]);

        let predictor = Predictor::new(StubStore::new(8, Some(7), 1), ResizeFilter::default());
        let err = predictor.predict_diabetes(&DiabetesInput::default()).unwrap_err();
        assert!(err.to_string().contains("scaler"));
    }

    #[test]
    fn column_order_mismatch_is_detected() {
        let mut store = StubStore::new(8, Some(8), 0);
        let mut names: Vec<String> = crate::features::domain::DIABETES_SCHEMA
            .names()
            .map(String::from)
            .collect();
        names.swap(0, 7);
        store.names = Some(names);

        let predictor = Predictor::new(store, ResizeFilter::default());
        let err = predictor.predict_diabetes(&DiabetesInput::default()).unwrap_err();
        assert_eq!(err.code(), PredictCode::SchemaMismatch);
        assert!(err.to_string().contains("column 0 is 'pregnancies'"));
    }

    #[test]
    fn covid_decode_failure_skips_artifacts() {
        let predictor = Predictor::new(StubStore::new(784, Some(784), 0), ResizeFilter::default());
        let err = predictor.predict_covid(b"not an image").unwrap_err();
        assert_eq!(err.code(), PredictCode::ImageDecode);
        assert!(predictor.store().calls().is_empty());
    }

    #[test]
    fn repeated_requests_agree() {
        let predictor = Predictor::new(StubStore::new(13, None, 1), ResizeFilter::default());
        let request = FlowRequest::Heart(reference_heart());
        let a = predictor.predict(&request).unwrap();
        let b = predictor.predict(&request).unwrap();
        assert_eq!(a.verdict, b.verdict);
        assert_eq!(a.fingerprint, b.fingerprint);
        // One load per request: nothing is cached.
        let loads = predictor
            .store()
            .calls()
            .iter()
            .filter(|c| c.starts_with("load"))
            .count();
        assert_eq!(loads, 2);
    }
}
