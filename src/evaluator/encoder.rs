// src/evaluator/encoder.rs — Token-level contextual embeddings via ONNX

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use ndarray::Array2;
use once_cell::sync::OnceCell;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use crate::index::normalize_l2;
use crate::infra::config::ScorerConfig;
use crate::infra::errors::CaseforgeError;

/// Runs a pretrained encoder (MiniLM by default) and returns one normalized
/// vector per real token. There is no pooling step; the scorer matches
/// individual tokens, not whole sentences.
///
/// Model and tokenizer are fetched from the HuggingFace Hub on first use and
/// cached locally. The ONNX session itself is lazy (~hundreds of ms init)
/// and guarded by a Mutex since `run` needs exclusive access.
pub struct TokenEncoder {
    session: OnceCell<Mutex<Session>>,
    tokenizer: OnceCell<Tokenizer>,
    model_path: PathBuf,
    tokenizer_path: PathBuf,
    max_length: usize,
}

impl TokenEncoder {
    pub fn new(config: &ScorerConfig) -> Result<Self, CaseforgeError> {
        let (model_path, tokenizer_path) = fetch_artifacts(config)?;
        Ok(Self {
            session: OnceCell::new(),
            tokenizer: OnceCell::new(),
            model_path,
            tokenizer_path,
            max_length: config.max_length,
        })
    }

    fn session(&self) -> Result<MutexGuard<'_, Session>, CaseforgeError> {
        let session = self.session.get_or_try_init(|| {
            Session::builder()?
                .commit_from_file(&self.model_path)
                .map(Mutex::new)
                .map_err(CaseforgeError::from)
        })?;
        Ok(session.lock().unwrap_or_else(|p| p.into_inner()))
    }

    fn tokenizer(&self) -> Result<&Tokenizer, CaseforgeError> {
        self.tokenizer.get_or_try_init(|| {
            Tokenizer::from_file(&self.tokenizer_path)
                .map_err(|e| CaseforgeError::Scorer(e.to_string()))
        })
    }

    /// Per-token L2-normalized embeddings for each text, in input order.
    /// Special tokens ([CLS], [SEP]) and padding are excluded, so a text's
    /// vector count equals its real token count (capped at `max_length`).
    pub fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<Vec<f32>>>, CaseforgeError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer()?
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| CaseforgeError::Scorer(e.to_string()))?;

        // INT64 inputs for the ONNX graph
        let input_ids: Vec<Vec<i64>> = encodings
            .iter()
            .map(|e| e.get_ids().iter().map(|&id| id as i64).collect())
            .collect();
        let attention_mask: Vec<Vec<i64>> = encodings
            .iter()
            .map(|e| e.get_attention_mask().iter().map(|&m| m as i64).collect())
            .collect();

        let max_len = input_ids
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .min(self.max_length);
        if max_len == 0 {
            return Ok(texts.iter().map(|_| Vec::new()).collect());
        }

        let input_ids_arr = pad_2d_i64(&input_ids, max_len, 0);
        let attention_mask_arr = pad_2d_i64(&attention_mask, max_len, 0);
        let token_type_ids_arr = Array2::<i64>::zeros((texts.len(), max_len));

        let input_ids_tensor = Tensor::from_array(input_ids_arr)?;
        let attention_mask_tensor = Tensor::from_array(attention_mask_arr)?;
        let token_type_ids_tensor = Tensor::from_array(token_type_ids_arr)?;

        let mut session = self.session()?;
        let outputs = session.run(ort::inputs![
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor,
        ])?;

        // last_hidden_state: [batch, seq_len, hidden]
        let (shape, data) = outputs["last_hidden_state"].try_extract_tensor::<f32>()?;
        if shape.len() != 3 {
            return Err(CaseforgeError::Scorer(format!(
                "expected rank-3 hidden state, got rank {}",
                shape.len()
            )));
        }
        let seq_len = shape[1] as usize;
        let hidden = shape[2] as usize;

        let mut results = Vec::with_capacity(texts.len());
        for (i, encoding) in encodings.iter().enumerate() {
            let attention = encoding.get_attention_mask();
            let special = encoding.get_special_tokens_mask();

            let mut tokens = Vec::new();
            for j in 0..seq_len {
                let attended = attention.get(j).copied().unwrap_or(0) == 1;
                let is_special = special.get(j).copied().unwrap_or(1) == 1;
                if !attended || is_special {
                    continue;
                }
                let offset = i * seq_len * hidden + j * hidden;
                tokens.push(normalize_l2(data[offset..offset + hidden].to_vec()));
            }
            results.push(tokens);
        }

        Ok(results)
    }
}

/// Download encoder artifacts from the HuggingFace Hub (cached after the
/// first run).
fn fetch_artifacts(config: &ScorerConfig) -> Result<(PathBuf, PathBuf), CaseforgeError> {
    use hf_hub::api::sync::Api;

    tracing::debug!(repo = %config.model_repo, "resolving scorer model");
    let api = Api::new().map_err(|e| CaseforgeError::Scorer(e.to_string()))?;
    let repo = api.model(config.model_repo.clone());

    let model_path = repo.get(&config.model_file).map_err(|e| {
        CaseforgeError::Scorer(format!("failed to fetch {}: {}", config.model_file, e))
    })?;
    let tokenizer_path = repo.get(&config.tokenizer_file).map_err(|e| {
        CaseforgeError::Scorer(format!("failed to fetch {}: {}", config.tokenizer_file, e))
    })?;

    Ok((model_path, tokenizer_path))
}

/// Pad 2D sequences to a fixed length.
fn pad_2d_i64(inputs: &[Vec<i64>], max_len: usize, pad_value: i64) -> Array2<i64> {
    let batch_size = inputs.len();
    let mut arr = Array2::from_elem((batch_size, max_len), pad_value);
    for (i, seq) in inputs.iter().enumerate() {
        for (j, &val) in seq.iter().take(max_len).enumerate() {
            arr[[i, j]] = val;
        }
    }
    arr
}
