//! Artifact Store Implementation

use crate::artifacts::ModelArtifacts;
use crate::StoreError;
use feature_engine::{ColumnLayout, DEFAULT_TARGET_COLUMN};
use inference_engine::{Classifier, FeatureScaler, KnnClassifier, KnnParams, OnnxClassifier};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locations of the trained artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Ordered column names, `.json` array or `.txt` one per line
    pub columns: PathBuf,
    /// Fitted scaler, JSON
    pub scaler: PathBuf,
    /// Classifier, `.json` (k-NN) or `.onnx`
    pub classifier: PathBuf,
    /// Label column to drop from the column list
    pub target_column: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            columns: PathBuf::from("artifacts/columns.json"),
            scaler: PathBuf::from("artifacts/scaler.json"),
            classifier: PathBuf::from("artifacts/knn_heart.json"),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
        }
    }
}

impl ArtifactPaths {
    /// Default file names inside one directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            columns: dir.join("columns.json"),
            scaler: dir.join("scaler.json"),
            classifier: dir.join("knn_heart.json"),
            ..Default::default()
        }
    }
}

/// Reads model artifacts from disk
pub struct ArtifactStore {
    paths: ArtifactPaths,
}

impl ArtifactStore {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }

    /// Load all artifacts; called once before serving
    pub fn load(&self) -> Result<ModelArtifacts, StoreError> {
        info!(
            "Loading model artifacts: columns={}, scaler={}, classifier={}",
            self.paths.columns.display(),
            self.paths.scaler.display(),
            self.paths.classifier.display()
        );

        let columns = read_columns(&self.paths.columns)?;
        let layout = ColumnLayout::new(&columns, &self.paths.target_column)?;
        debug!("Feature columns: {:?}", layout.columns());

        let scaler: FeatureScaler = read_json(&self.paths.scaler)?;
        scaler.validate()?;

        let classifier = load_classifier(&self.paths.classifier, layout.width())?;

        let artifacts = ModelArtifacts::new(layout, scaler, classifier)?;
        info!(
            "Model artifacts loaded: {} features, {} scaler, {} classifier",
            artifacts.layout().width(),
            artifacts.scaler().kind(),
            artifacts.classifier().kind()
        );
        Ok(artifacts)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn read_to_string(path: &Path) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let raw = read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| StoreError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read_columns(path: &Path) -> Result<Vec<String>, StoreError> {
    match extension(path).as_deref() {
        Some("txt") => Ok(read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Some("json") => read_json(path),
        _ => Err(StoreError::UnsupportedFormat(format!(
            "column list {} (expected .json or .txt)",
            path.display()
        ))),
    }
}

fn load_classifier(path: &Path, n_features: usize) -> Result<Box<dyn Classifier>, StoreError> {
    match extension(path).as_deref() {
        Some("json") => {
            let params: KnnParams = read_json(path)?;
            Ok(Box::new(KnnClassifier::new(params)?))
        }
        Some("onnx") => Ok(Box::new(OnnxClassifier::load(path, n_features)?)),
        _ => Err(StoreError::UnsupportedFormat(format!(
            "classifier {} (expected .json or .onnx)",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const COLUMNS_JSON: &str = r#"["Age", "RestingBP", "Cholesterol", "FastingBS", "MaxHR",
        "Oldpeak", "HeartDisease", "Sex_M", "ChestPainType_ATA", "ChestPainType_NAP",
        "ChestPainType_TA", "RestingECG_Normal", "RestingECG_ST", "ExerciseAngina_Y",
        "ST_Slope_Flat", "ST_Slope_Up"]"#;

    fn scaler_json(width: usize) -> String {
        format!(
            r#"{{"kind": "standard", "mean": {:?}, "scale": {:?}}}"#,
            vec![0.0; width],
            vec![1.0; width]
        )
    }

    fn knn_json(width: usize) -> String {
        format!(
            r#"{{"n_neighbors": 1, "fit_x": [{:?}, {:?}], "fit_y": [0, 1]}}"#,
            vec![0.0; width],
            vec![1.0; width]
        )
    }

    fn write_artifacts(dir: &Path, scaler_width: usize, knn_width: usize) -> ArtifactPaths {
        let paths = ArtifactPaths::in_dir(dir);
        fs::write(&paths.columns, COLUMNS_JSON).expect("write columns");
        fs::write(&paths.scaler, scaler_json(scaler_width)).expect("write scaler");
        fs::write(&paths.classifier, knn_json(knn_width)).expect("write classifier");
        paths
    }

    #[test]
    fn test_load_artifacts() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let paths = write_artifacts(tmp.path(), 15, 15);

        let artifacts = ArtifactStore::new(paths).load().expect("load");
        assert_eq!(artifacts.layout().width(), 15);
        assert_eq!(artifacts.layout().columns()[6], "Sex_M");
        assert_eq!(artifacts.scaler().kind(), "standard");
        assert_eq!(artifacts.classifier().n_features(), 15);
    }

    #[test]
    fn test_load_text_columns() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let mut paths = write_artifacts(tmp.path(), 15, 15);
        let columns: Vec<String> = serde_json::from_str(COLUMNS_JSON).expect("columns");
        paths.columns = tmp.path().join("columns.txt");
        fs::write(&paths.columns, columns.join("\n") + "\n").expect("write columns");

        let artifacts = ArtifactStore::new(paths).load().expect("load");
        assert_eq!(artifacts.layout().width(), 15);
    }

    /// softmax(x · W) with no label output, W all zeros except Age
    fn onnx_model(width: usize) -> Vec<u8> {
        use prost::Message;
        use tract_onnx::pb;

        let mut weights = vec![0.0f32; width * 2];
        weights[0] = -1.0;
        weights[1] = 1.0;

        let dim = [1, width as i64]
            .iter()
            .map(|d| pb::tensor_shape_proto::Dimension {
                value: Some(pb::tensor_shape_proto::dimension::Value::DimValue(*d)),
                ..Default::default()
            })
            .collect();
        let input = pb::ValueInfoProto {
            name: "input".to_string(),
            r#type: Some(pb::TypeProto {
                value: Some(pb::type_proto::Value::TensorType(pb::type_proto::Tensor {
                    elem_type: pb::tensor_proto::DataType::Float as i32,
                    shape: Some(pb::TensorShapeProto { dim }),
                })),
                ..Default::default()
            }),
            ..Default::default()
        };
        let node = |op: &str, input: Vec<String>, output: &str| pb::NodeProto {
            input,
            output: vec![output.to_string()],
            op_type: op.to_string(),
            ..Default::default()
        };

        pb::ModelProto {
            ir_version: 8,
            opset_import: vec![pb::OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            graph: Some(pb::GraphProto {
                node: vec![
                    node("MatMul", vec!["input".into(), "weights".into()], "logits"),
                    node("Softmax", vec!["logits".into()], "probabilities"),
                ],
                initializer: vec![pb::TensorProto {
                    name: "weights".to_string(),
                    dims: vec![width as i64, 2],
                    data_type: pb::tensor_proto::DataType::Float as i32,
                    float_data: weights,
                    ..Default::default()
                }],
                input: vec![input],
                output: vec![pb::ValueInfoProto {
                    name: "probabilities".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn test_load_onnx_classifier() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let mut paths = write_artifacts(tmp.path(), 15, 15);
        paths.classifier = tmp.path().join("heart.onnx");
        fs::write(&paths.classifier, onnx_model(15)).expect("write model");

        let artifacts = ArtifactStore::new(paths).load().expect("load");
        let classifier = artifacts.classifier();
        assert_eq!(classifier.kind(), "onnx");
        assert_eq!(classifier.n_features(), 15);

        let mut row = vec![0.0; 15];
        row[0] = 2.0;
        let (label, proba) = classifier.classify(&row).expect("classify");
        assert_eq!(label, 1);
        assert!(proba[1] > 0.95);

        row[0] = -2.0;
        assert_eq!(classifier.predict(&row).expect("predict"), 0);
    }

    #[test]
    fn test_onnx_width_disagreement() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let mut paths = write_artifacts(tmp.path(), 15, 15);
        paths.classifier = tmp.path().join("heart.onnx");
        fs::write(&paths.classifier, onnx_model(14)).expect("write model");

        let err = ArtifactStore::new(paths).load().unwrap_err();
        assert!(matches!(err, StoreError::Model(_)));
    }

    #[test]
    fn test_missing_artifact() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let paths = write_artifacts(tmp.path(), 15, 15);
        fs::remove_file(&paths.scaler).expect("remove scaler");

        let err = ArtifactStore::new(paths).load().unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_corrupt_artifact() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let paths = write_artifacts(tmp.path(), 15, 15);
        fs::write(&paths.classifier, "{not json").expect("write classifier");

        let err = ArtifactStore::new(paths).load().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_width_disagreement() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let paths = write_artifacts(tmp.path(), 15, 14);

        let err = ArtifactStore::new(paths).load().unwrap_err();
        assert!(matches!(err, StoreError::Inconsistent(_)));
    }

    #[test]
    fn test_invalid_scaler() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let paths = write_artifacts(tmp.path(), 15, 15);
        fs::write(&paths.scaler, r#"{"kind": "standard", "mean": [0.0], "scale": [0.0]}"#)
            .expect("write scaler");

        let err = ArtifactStore::new(paths).load().unwrap_err();
        assert!(matches!(err, StoreError::Model(_)));
    }

    #[test]
    fn test_unsupported_classifier_format() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let mut paths = write_artifacts(tmp.path(), 15, 15);
        paths.classifier = tmp.path().join("KNN_heart.pkl");
        fs::write(&paths.classifier, b"\x80\x04").expect("write pickle");

        let err = ArtifactStore::new(paths).load().unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_layout_failure() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let paths = write_artifacts(tmp.path(), 15, 15);
        fs::write(&paths.columns, r#"["Age", "HeartDisease"]"#).expect("write columns");

        let err = ArtifactStore::new(paths).load().unwrap_err();
        assert!(matches!(err, StoreError::Layout(_)));
    }
}
