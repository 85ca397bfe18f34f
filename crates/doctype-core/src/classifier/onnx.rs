//! Transformer sequence classifier over an `InferenceBackend`.

use std::path::Path;

use doctype_inference::{InferenceBackend, InputTensor, OutputTensor};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, trace};

use super::{LabelEncoder, Prediction, SequenceClassifier, argmax, round3, softmax};
use crate::error::ClassifierError;

#[cfg(feature = "native")]
use crate::models::config::ClassifierConfig;
#[cfg(feature = "native")]
use doctype_inference::{Device, OrtBackend, OrtOptions};
#[cfg(feature = "native")]
use tracing::info;

const TOKEN_TYPE_IDS: &str = "token_type_ids";

/// Load a `tokenizer.json`.
pub fn load_tokenizer(path: &Path) -> Result<Tokenizer, ClassifierError> {
    if !path.exists() {
        return Err(ClassifierError::ModelNotFound(path.to_path_buf()));
    }
    Tokenizer::from_file(path)
        .map_err(|e| ClassifierError::Tokenizer(format!("{}: {}", path.display(), e)))
}

/// Tokenizer, model and label encoder as one immutable unit.
pub struct OnnxClassifier<B: InferenceBackend> {
    backend: B,
    tokenizer: Tokenizer,
    labels: LabelEncoder,
    max_length: usize,
}

impl<B: InferenceBackend> OnnxClassifier<B> {
    /// Assemble a classifier. The tokenizer is reconfigured to truncate
    /// and pad every input to exactly `max_length` tokens.
    pub fn new(
        backend: B,
        mut tokenizer: Tokenizer,
        labels: LabelEncoder,
        max_length: usize,
    ) -> Result<Self, ClassifierError> {
        let (pad_id, pad_token) = padding_token(&tokenizer);

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token,
            ..Default::default()
        }));

        Ok(Self {
            backend,
            tokenizer,
            labels,
            max_length,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn encode(&self, text: &str) -> Result<Vec<(&'static str, InputTensor)>, ClassifierError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::Tokenizer(e.to_string()))?;

        let len = encoding.get_ids().len();
        trace!("Encoded {} bytes into {} tokens", text.len(), len);

        let mut inputs = vec![
            ("input_ids", InputTensor::from_token_ids(encoding.get_ids())?),
            (
                "attention_mask",
                InputTensor::from_token_ids(encoding.get_attention_mask())?,
            ),
        ];

        if self.backend.accepts(TOKEN_TYPE_IDS) {
            inputs.push((
                TOKEN_TYPE_IDS,
                InputTensor::from_token_ids(encoding.get_type_ids())?,
            ));
        }

        Ok(inputs)
    }
}

impl<B: InferenceBackend> SequenceClassifier for OnnxClassifier<B> {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let inputs = self.encode(text)?;
        let outputs = self.backend.run(&inputs)?;
        let logits = select_logits(&outputs)?;

        if logits.iter().any(|v| !v.is_finite()) {
            return Err(ClassifierError::UnexpectedOutput(
                "non-finite logits".into(),
            ));
        }

        let probs = softmax(&logits);
        let (index, probability) = argmax(&probs)
            .ok_or_else(|| ClassifierError::UnexpectedOutput("empty logits".into()))?;
        let label = self.labels.decode(index)?.to_string();

        debug!("Predicted '{}' with probability {:.4}", label, probability);

        Ok(Prediction {
            label,
            confidence: round3(probability as f64).clamp(0.0, 1.0),
        })
    }

    fn labels(&self) -> &[String] {
        self.labels.classes()
    }
}

#[cfg(feature = "native")]
impl OnnxClassifier<OrtBackend> {
    /// Load the model directory named in `config`.
    ///
    /// A missing directory, model file or tokenizer is
    /// [`ClassifierError::ModelNotFound`]. The execution device is probed
    /// here, once.
    pub fn load(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let dir = &config.model_dir;
        if !dir.is_dir() {
            return Err(ClassifierError::ModelNotFound(dir.clone()));
        }

        let model_path = dir.join(&config.model_file);
        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(model_path));
        }

        let labels = LabelEncoder::from_dir(dir)?;
        let tokenizer = load_tokenizer(&dir.join(&config.tokenizer_file))?;

        let device = Device::probe(config.use_gpu);
        info!("Loading classifier from {} on {}", dir.display(), device);

        let backend = OrtBackend::from_file(
            &model_path,
            OrtOptions {
                device,
                intra_threads: config.num_threads,
            },
        )?;

        Self::new(backend, tokenizer, labels, config.max_length)
    }
}

/// The `logits` output, or the first float output when none is named so.
/// Returns the values of the single batch row.
fn select_logits(outputs: &[(String, OutputTensor)]) -> Result<Vec<f32>, ClassifierError> {
    let tensor = outputs
        .iter()
        .find(|(name, t)| name == "logits" && t.as_f32().is_some())
        .or_else(|| outputs.iter().find(|(_, t)| t.as_f32().is_some()))
        .and_then(|(_, t)| t.as_f32())
        .ok_or_else(|| ClassifierError::UnexpectedOutput("no float output".into()))?;

    let shape = tensor.shape();
    let valid = match shape {
        [_] => true,
        [1, _] => true,
        _ => false,
    };
    if !valid {
        return Err(ClassifierError::UnexpectedOutput(format!(
            "expected logits of shape [1, num_labels], got {:?}",
            shape
        )));
    }

    Ok(tensor.iter().copied().collect())
}

/// Pad token from the tokenizer's own padding config, else a `[PAD]` or
/// `<pad>` vocabulary entry, else id 0.
fn padding_token(tokenizer: &Tokenizer) -> (u32, String) {
    if let Some(params) = tokenizer.get_padding() {
        return (params.pad_id, params.pad_token.clone());
    }
    for token in ["[PAD]", "<pad>"] {
        if let Some(id) = tokenizer.token_to_id(token) {
            return (id, token.to_string());
        }
    }
    (0, "[PAD]".to_string())
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::Mutex;

    use doctype_inference::{InferenceError, Result as InferenceResult};
    use ndarray::{ArrayD, IxDyn};

    use super::*;

    pub const TOKENIZER_JSON: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {
                "[PAD]": 0, "[UNK]": 1, "invoice": 2, "order": 3, "date": 4,
                "contact": 5, "name": 6, "john": 7, "smith": 8, "shipping": 9,
                "report": 10, "product": 11, "quantity": 12, "ship": 13
            },
            "unk_token": "[UNK]"
        }
    }"#;

    pub fn tokenizer() -> Tokenizer {
        TOKENIZER_JSON.parse().unwrap()
    }

    /// Returns fixed logits and records the shapes it was fed.
    pub struct FakeBackend {
        pub logits: Vec<f32>,
        pub inputs: Vec<String>,
        pub fail: bool,
        pub seen: Mutex<Vec<(String, Vec<usize>, Vec<i64>)>>,
    }

    impl FakeBackend {
        pub fn new(logits: Vec<f32>) -> Self {
            Self {
                logits,
                inputs: vec!["input_ids".into(), "attention_mask".into()],
                fail: false,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl InferenceBackend for FakeBackend {
        fn run(
            &self,
            inputs: &[(&str, InputTensor)],
        ) -> InferenceResult<Vec<(String, OutputTensor)>> {
            if self.fail {
                return Err(InferenceError::Run("fake".into()));
            }
            let mut seen = self.seen.lock().unwrap();
            for (name, tensor) in inputs {
                let values = match tensor {
                    InputTensor::Int64(arr) => arr.iter().copied().collect(),
                    InputTensor::Float32(_) => Vec::new(),
                };
                seen.push((name.to_string(), tensor.shape().to_vec(), values));
            }
            let arr = ArrayD::from_shape_vec(IxDyn(&[1, self.logits.len()]), self.logits.clone())
                .unwrap();
            Ok(vec![("logits".to_string(), OutputTensor::Float32(arr))])
        }

        fn input_names(&self) -> &[String] {
            &self.inputs
        }

        fn output_names(&self) -> &[String] {
            &[]
        }
    }

    pub fn labels() -> LabelEncoder {
        LabelEncoder::new(vec![
            "invoice".into(),
            "purchase order".into(),
            "report".into(),
            "shippingorder".into(),
        ])
        .unwrap()
    }

    pub fn classifier(logits: Vec<f32>) -> OnnxClassifier<FakeBackend> {
        OnnxClassifier::new(FakeBackend::new(logits), tokenizer(), labels(), 512).unwrap()
    }
}
