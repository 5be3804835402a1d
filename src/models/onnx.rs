// src/models/onnx.rs
use crate::error::ModelError;
use ndarray::Array2;
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Dense f32 input, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub shape: [usize; 2],
    pub data: Vec<f32>,
}

impl InputTensor {
    /// Build a `[rows, cols]` tensor from a rectangular nested list.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, ModelError> {
        let cols = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| ModelError::InvalidInput("input has no rows".to_string()))?;
        if cols == 0 {
            return Err(ModelError::InvalidInput("input rows are empty".to_string()));
        }
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(ModelError::InvalidInput(format!(
                "row {} has {} values, expected {}",
                index,
                row.len(),
                cols
            )));
        }

        Ok(Self {
            shape: [rows.len(), cols],
            data: rows.iter().flatten().copied().collect(),
        })
    }
}

/// Element values of one output, in the runtime's own element type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "dtype", content = "values", rename_all = "snake_case")]
pub enum OutputData {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I64(Vec<i64>),
    I32(Vec<i32>),
    Bool(Vec<bool>),
    String(Vec<String>),
    /// Sequences, maps and exotic element types: only the type is reported.
    Unsupported(String),
}

/// One graph output, exactly as the runtime produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTensor {
    pub name: String,
    /// Empty for non-tensor outputs.
    pub shape: Vec<i64>,
    pub data: OutputData,
}

/// Something that can execute a single-input graph.
pub trait InferenceBackend {
    fn run(&mut self, input: InputTensor) -> Result<Vec<OutputTensor>, ModelError>;
}

/// Convert `rows` into the graph input and return every output unmodified.
pub fn infer<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    rows: &[Vec<f32>],
) -> Result<Vec<OutputTensor>, ModelError> {
    let input = InputTensor::from_rows(rows)?;
    debug!("Running inference on input of shape {:?}", input.shape);
    backend.run(input)
}

/// ONNX Runtime session loaded from a model file.
pub struct OrtBackend {
    session: Session,
}

impl OrtBackend {
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::Io {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "model file not found"),
            });
        }

        info!("Loading ONNX model: {}", path.display());
        let session = Session::builder()?.commit_from_file(path)?;
        Ok(Self { session })
    }
}

impl InferenceBackend for OrtBackend {
    fn run(&mut self, input: InputTensor) -> Result<Vec<OutputTensor>, ModelError> {
        let array = Array2::from_shape_vec((input.shape[0], input.shape[1]), input.data)
            .map_err(|e| ModelError::InvalidInput(e.to_string()))?;
        let tensor = Tensor::from_array(array)?;

        // Bound positionally to the graph's first input.
        let outputs = self.session.run(ort::inputs![tensor])?;

        let mut results = Vec::new();
        for (name, value) in outputs.iter() {
            let (shape, data) = match value.dtype() {
                ValueType::Tensor { ty, .. } => match ty {
                    TensorElementType::Float32 => {
                        let (shape, data) = value.try_extract_tensor::<f32>()?;
                        (dims(shape), OutputData::F32(data.to_vec()))
                    }
                    TensorElementType::Float64 => {
                        let (shape, data) = value.try_extract_tensor::<f64>()?;
                        (dims(shape), OutputData::F64(data.to_vec()))
                    }
                    TensorElementType::Int64 => {
                        let (shape, data) = value.try_extract_tensor::<i64>()?;
                        (dims(shape), OutputData::I64(data.to_vec()))
                    }
                    TensorElementType::Int32 => {
                        let (shape, data) = value.try_extract_tensor::<i32>()?;
                        (dims(shape), OutputData::I32(data.to_vec()))
                    }
                    TensorElementType::Bool => {
                        let (shape, data) = value.try_extract_tensor::<bool>()?;
                        (dims(shape), OutputData::Bool(data.to_vec()))
                    }
                    TensorElementType::String => {
                        let (shape, data) = value.try_extract_strings()?;
                        (dims(shape), OutputData::String(data))
                    }
                    other => (
                        Vec::new(),
                        OutputData::Unsupported(format!("tensor({:?})", other)),
                    ),
                },
                other => {
                    warn!("Output {} is not a tensor: {:?}", name, other);
                    (Vec::new(), OutputData::Unsupported(format!("{:?}", other)))
                }
            };
            results.push(OutputTensor {
                name: name.to_string(),
                shape,
                data,
            });
        }
        Ok(results)
    }
}

fn dims(shape: &[i64]) -> Vec<i64> {
    shape.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Graph stand-in with a known, fixed output.
    struct FixedGraph {
        received: Option<InputTensor>,
        output: Vec<OutputTensor>,
    }

    impl InferenceBackend for FixedGraph {
        fn run(&mut self, input: InputTensor) -> Result<Vec<OutputTensor>, ModelError> {
            self.received = Some(input);
            Ok(self.output.clone())
        }
    }

    fn fixed_output() -> Vec<OutputTensor> {
        vec![OutputTensor {
            name: "output".to_string(),
            shape: vec![1, 2],
            data: OutputData::F32(vec![0.25, 0.75]),
        }]
    }

    /// Classifier-shaped outputs: an int64 label, class scores and a ZipMap.
    fn classifier_output() -> Vec<OutputTensor> {
        vec![
            OutputTensor {
                name: "label".to_string(),
                shape: vec![1],
                data: OutputData::I64(vec![2]),
            },
            OutputTensor {
                name: "probabilities".to_string(),
                shape: vec![1, 3],
                data: OutputData::F32(vec![0.1, 0.2, 0.7]),
            },
            OutputTensor {
                name: "output_probability".to_string(),
                shape: Vec::new(),
                data: OutputData::Unsupported("Sequence(Map)".to_string()),
            },
        ]
    }

    #[test]
    fn test_fixed_output_passes_through_unmodified() {
        let mut graph = FixedGraph {
            received: None,
            output: fixed_output(),
        };

        let outputs = infer(&mut graph, &[vec![0.5, 0.2, 0.1]]).unwrap();

        assert_eq!(outputs, fixed_output());
        assert_eq!(
            graph.received,
            Some(InputTensor {
                shape: [1, 3],
                data: vec![0.5, 0.2, 0.1],
            })
        );
    }

    #[test]
    fn test_mixed_output_types_all_returned() {
        let mut graph = FixedGraph {
            received: None,
            output: classifier_output(),
        };

        let outputs = infer(&mut graph, &[vec![0.5, 0.2, 0.1]]).unwrap();

        assert_eq!(outputs, classifier_output());
        assert_eq!(outputs[0].data, OutputData::I64(vec![2]));
    }

    #[test]
    fn test_output_json_carries_dtype() {
        let json = serde_json::to_value(classifier_output()).unwrap();

        assert_eq!(
            json[0],
            serde_json::json!({
                "name": "label",
                "shape": [1],
                "data": {"dtype": "i64", "values": [2]}
            })
        );
        assert_eq!(json[1]["data"]["dtype"], "f32");
        assert_eq!(
            json[2]["data"],
            serde_json::json!({"dtype": "unsupported", "values": "Sequence(Map)"})
        );
    }

    #[test]
    fn test_rows_flatten_row_major() {
        let input = InputTensor::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]])
            .unwrap();
        assert_eq!(input.shape, [3, 2]);
        assert_eq!(input.data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_ragged_rows_rejected_before_backend() {
        let mut graph = FixedGraph {
            received: None,
            output: fixed_output(),
        };

        let err = infer(&mut graph, &[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput(ref msg) if msg.contains("row 1")));
        assert!(graph.received.is_none());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(InputTensor::from_rows(&[]).is_err());
        assert!(InputTensor::from_rows(&[vec![]]).is_err());
    }

    #[test]
    fn test_missing_model_file() {
        let err = OrtBackend::from_file(Path::new("/nonexistent/ai_model.onnx"))
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
