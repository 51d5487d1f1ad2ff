//! Loaded Model Artifacts

use crate::StoreError;
use feature_engine::ColumnLayout;
use inference_engine::{Classifier, FeatureScaler};

/// Classifier, scaler and column layout trained together.
///
/// Only constructed through [`ModelArtifacts::new`], which guarantees the
/// three agree on the feature columns.
#[derive(Debug)]
pub struct ModelArtifacts {
    layout: ColumnLayout,
    scaler: FeatureScaler,
    classifier: Box<dyn Classifier>,
}

impl ModelArtifacts {
    /// Bundle artifacts after checking they agree on width and column names
    pub fn new(
        layout: ColumnLayout,
        scaler: FeatureScaler,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, StoreError> {
        let width = layout.width();

        if scaler.width() != width {
            return Err(StoreError::Inconsistent(format!(
                "scaler was fitted on {} columns, column list has {}",
                scaler.width(),
                width
            )));
        }
        if classifier.n_features() != width {
            return Err(StoreError::Inconsistent(format!(
                "{} classifier expects {} features, column list has {}",
                classifier.kind(),
                classifier.n_features(),
                width
            )));
        }
        if let Some(names) = scaler.feature_names() {
            if names.len() != width {
                return Err(StoreError::Inconsistent(format!(
                    "scaler lists {} feature names, column list has {}",
                    names.len(),
                    width
                )));
            }
            if let Some((i, (fitted, listed))) = names
                .iter()
                .zip(layout.columns())
                .enumerate()
                .find(|(_, (fitted, listed))| fitted != listed)
            {
                return Err(StoreError::Inconsistent(format!(
                    "scaler column {} is '{}', column list has '{}'",
                    i, fitted, listed
                )));
            }
        }

        Ok(Self {
            layout,
            scaler,
            classifier,
        })
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Hand the artifacts to the encoder and inference engine
    pub fn into_parts(self) -> (ColumnLayout, FeatureScaler, Box<dyn Classifier>) {
        (self.layout, self.scaler, self.classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::DEFAULT_TARGET_COLUMN;
    use inference_engine::{KnnClassifier, KnnParams, NeighborWeights};

    const COLUMNS: [&str; 15] = [
        "Age", "RestingBP", "Cholesterol", "FastingBS", "MaxHR", "Oldpeak",
        "Sex_M", "ChestPainType_ATA", "ChestPainType_NAP", "ChestPainType_TA",
        "RestingECG_Normal", "RestingECG_ST", "ExerciseAngina_Y", "ST_Slope_Flat",
        "ST_Slope_Up",
    ];

    fn layout() -> ColumnLayout {
        ColumnLayout::new(&COLUMNS, DEFAULT_TARGET_COLUMN).unwrap()
    }

    fn knn(width: usize) -> Box<dyn Classifier> {
        Box::new(
            KnnClassifier::new(KnnParams {
                n_neighbors: 1,
                weights: NeighborWeights::Uniform,
                p: 2.0,
                fit_x: vec![vec![0.0; width], vec![1.0; width]],
                fit_y: vec![0, 1],
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_consistent_artifacts() {
        let scaler = FeatureScaler::standard(vec![0.0; 15], vec![1.0; 15]);
        let artifacts = ModelArtifacts::new(layout(), scaler, knn(15)).unwrap();
        assert_eq!(artifacts.layout().width(), 15);
        assert_eq!(artifacts.classifier().kind(), "knn");
    }

    #[test]
    fn test_scaler_width_mismatch() {
        let scaler = FeatureScaler::standard(vec![0.0; 14], vec![1.0; 14]);
        let err = ModelArtifacts::new(layout(), scaler, knn(15)).unwrap_err();
        assert!(matches!(err, StoreError::Inconsistent(_)));
    }

    #[test]
    fn test_classifier_width_mismatch() {
        let scaler = FeatureScaler::standard(vec![0.0; 15], vec![1.0; 15]);
        let err = ModelArtifacts::new(layout(), scaler, knn(16)).unwrap_err();
        assert!(err.to_string().contains("expects 16 features"));
    }

    #[test]
    fn test_scaler_feature_names_must_match_columns() {
        let mut names: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
        names.swap(0, 1);
        let scaler = FeatureScaler::Standard {
            mean: vec![0.0; 15],
            scale: vec![1.0; 15],
            feature_names: Some(names),
        };
        let err = ModelArtifacts::new(layout(), scaler, knn(15)).unwrap_err();
        assert!(err.to_string().contains("scaler column 0 is 'RestingBP'"));
    }

    #[test]
    fn test_scaler_feature_names_too_short() {
        let names: Vec<String> = COLUMNS[..14].iter().map(|c| c.to_string()).collect();
        let scaler = FeatureScaler::Standard {
            mean: vec![0.0; 15],
            scale: vec![1.0; 15],
            feature_names: Some(names),
        };
        let err = ModelArtifacts::new(layout(), scaler, knn(15)).unwrap_err();
        assert!(matches!(err, StoreError::Inconsistent(_)));
        assert!(err.to_string().contains("14 feature names"));
    }
}
