//! k-Nearest-Neighbors Classifier

use crate::classifier::{ClassProbabilities, Classifier};
use crate::InferenceError;
use serde::{Deserialize, Serialize};
use tracing::info;

/// How neighbor votes are weighted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborWeights {
    /// Every neighbor counts once
    #[default]
    Uniform,
    /// Votes weighted by inverse distance
    Distance,
}

fn default_p() -> f64 {
    2.0
}

/// Serialized k-NN model: fitted (already scaled) training rows and labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnParams {
    pub n_neighbors: usize,
    #[serde(default)]
    pub weights: NeighborWeights,
    /// Minkowski power (2 = Euclidean)
    #[serde(default = "default_p")]
    pub p: f64,
    pub fit_x: Vec<Vec<f64>>,
    pub fit_y: Vec<u8>,
}

/// Brute-force k-NN over the stored training set
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    params: KnnParams,
    n_features: usize,
}

impl KnnClassifier {
    /// Validate parameters and build the classifier
    pub fn new(params: KnnParams) -> Result<Self, InferenceError> {
        let n_samples = params.fit_x.len();
        let n_features = params.fit_x.first().map(Vec::len).unwrap_or(0);

        if n_samples == 0 || n_features == 0 {
            return Err(InferenceError::ModelLoadError(
                "k-NN model has no training samples".to_string(),
            ));
        }
        if let Some(i) = params.fit_x.iter().position(|x| x.len() != n_features) {
            return Err(InferenceError::ModelLoadError(format!(
                "k-NN training row {} has {} features, expected {}",
                i,
                params.fit_x[i].len(),
                n_features
            )));
        }
        if params.fit_y.len() != n_samples {
            return Err(InferenceError::ModelLoadError(format!(
                "k-NN has {} training rows but {} labels",
                n_samples,
                params.fit_y.len()
            )));
        }
        if let Some(label) = params.fit_y.iter().find(|y| **y > 1) {
            return Err(InferenceError::ModelLoadError(format!(
                "k-NN label {} is not a binary class",
                label
            )));
        }
        if params.n_neighbors == 0 || params.n_neighbors > n_samples {
            return Err(InferenceError::ModelLoadError(format!(
                "n_neighbors must be in 1..={}, got {}",
                n_samples, params.n_neighbors
            )));
        }
        if !(params.p >= 1.0) {
            return Err(InferenceError::ModelLoadError(format!(
                "Minkowski p must be >= 1, got {}",
                params.p
            )));
        }

        info!(
            "Loaded k-NN classifier: k={}, weights={:?}, p={}, samples={}, features={}",
            params.n_neighbors, params.weights, params.p, n_samples, n_features
        );

        Ok(Self { params, n_features })
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let p = self.params.p;
        let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
        if p == 1.0 {
            diffs.sum()
        } else if p == 2.0 {
            diffs.map(|d| d * d).sum::<f64>().sqrt()
        } else {
            diffs.map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p)
        }
    }
}

impl Classifier for KnnClassifier {
    fn kind(&self) -> &'static str {
        "knn"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, row: &[f64]) -> Result<ClassProbabilities, InferenceError> {
        if row.len() != self.n_features {
            return Err(InferenceError::InvalidInputShape {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::InferenceFailed(
                "feature row contains non-finite values".to_string(),
            ));
        }

        // (distance, training index) keeps neighbor order stable on ties
        let mut neighbors: Vec<(f64, usize)> = self
            .params
            .fit_x
            .iter()
            .enumerate()
            .map(|(i, x)| (self.distance(row, x), i))
            .collect();
        neighbors.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let nearest = &neighbors[..self.params.n_neighbors];

        let mut votes = [0.0f64; 2];
        match self.params.weights {
            NeighborWeights::Uniform => {
                for &(_, i) in nearest {
                    votes[self.params.fit_y[i] as usize] += 1.0;
                }
            }
            NeighborWeights::Distance => {
                // exact matches take all the weight
                let exact = nearest.iter().any(|&(d, _)| d == 0.0);
                for &(d, i) in nearest {
                    let weight = match (exact, d == 0.0) {
                        (true, true) => 1.0,
                        (true, false) => 0.0,
                        (false, _) => 1.0 / d,
                    };
                    votes[self.params.fit_y[i] as usize] += weight;
                }
            }
        }

        let total = votes[0] + votes[1];
        Ok([votes[0] / total, votes[1] / total])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(weights: NeighborWeights) -> KnnParams {
        KnnParams {
            n_neighbors: 3,
            weights,
            p: 2.0,
            fit_x: vec![
                vec![0.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 0.0],
                vec![5.0, 5.0],
                vec![5.0, 6.0],
                vec![6.0, 5.0],
            ],
            fit_y: vec![0, 0, 1, 1, 1, 1],
        }
    }

    #[test]
    fn test_uniform_votes() {
        let knn = KnnClassifier::new(params(NeighborWeights::Uniform)).unwrap();

        let proba = knn.predict_proba(&[0.1, 0.1]).unwrap();
        assert!((proba[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((proba[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(knn.predict(&[0.1, 0.1]).unwrap(), 0);

        assert_eq!(knn.predict_proba(&[5.2, 5.2]).unwrap(), [0.0, 1.0]);
        assert_eq!(knn.predict(&[5.2, 5.2]).unwrap(), 1);
    }

    #[test]
    fn test_distance_weights_exact_match() {
        let knn = KnnClassifier::new(params(NeighborWeights::Distance)).unwrap();
        assert_eq!(knn.predict_proba(&[1.0, 0.0]).unwrap(), [0.0, 1.0]);
    }

    #[test]
    fn test_distance_weights_favor_closer() {
        let knn = KnnClassifier::new(params(NeighborWeights::Distance)).unwrap();
        // nearest: (1,0) at 0.1 -> class 1, then (0,0) and (0,1) -> class 0
        let proba = knn.predict_proba(&[0.9, 0.0]).unwrap();
        assert!(proba[1] > proba[0]);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_manhattan_distance() {
        let knn = KnnClassifier::new(KnnParams {
            p: 1.0,
            ..params(NeighborWeights::Uniform)
        })
        .unwrap();
        assert_eq!(knn.distance(&[0.0, 0.0], &[3.0, 4.0]), 7.0);
    }

    #[test]
    fn test_wrong_width() {
        let knn = KnnClassifier::new(params(NeighborWeights::Uniform)).unwrap();
        let err = knn.predict_proba(&[0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInputShape { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_invalid_params() {
        let too_many = KnnParams {
            n_neighbors: 7,
            ..params(NeighborWeights::Uniform)
        };
        assert!(KnnClassifier::new(too_many).is_err());

        let mut ragged = params(NeighborWeights::Uniform);
        ragged.fit_x[2].push(1.0);
        assert!(KnnClassifier::new(ragged).is_err());

        let mut multiclass = params(NeighborWeights::Uniform);
        multiclass.fit_y[0] = 2;
        assert!(KnnClassifier::new(multiclass).is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"n_neighbors": 1, "fit_x": [[0.0], [1.0]], "fit_y": [0, 1]}"#;
        let params: KnnParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.weights, NeighborWeights::Uniform);
        assert_eq!(params.p, 2.0);
    }
}
