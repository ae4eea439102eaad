//! Embedding query engine
//!
//! [`QueryEngine`] owns at most one loaded model and marshals every query
//! into the backend: dictionary lookups, vector retrieval, top-k label
//! prediction, and nearest-neighbor / analogy search over a lazily
//! precomputed word-vector matrix.
//!
//! The engine is synchronous and blocking. It is not meant for concurrent
//! use on one instance: the matrix cache is built on first use, and callers
//! sharing an engine across threads must serialize access themselves.
use crate::config::EngineConfig;
use crate::error::{QueryError, Result};
use crate::model::{Matrix, ModelBackend, ModelLoader};
use crate::parser::{parse_query, SignedTerm};
use lru::LruCache;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;

/// Norm floor applied when weighting analogy term vectors, so zero vectors
/// cannot divide the accumulation.
const ANALOGY_NORM_EPSILON: f32 = 1e-8;

/// Query norms below this count as 1 during similarity scoring.
const MIN_QUERY_NORM: f32 = 1e-8;

/// One ranked search or prediction result.
///
/// `score` is a probability for predictions and a cosine similarity for
/// nearest-neighbor and analogy results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLabel {
    pub score: f32,
    pub label: String,
}

/// One n-gram of a query word with its vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NgramVector {
    pub word: String,
    pub vector: Vec<f32>,
}

/// Default result count when a caller passes `k <= 0`: the square root of
/// the label count for supervised models, of the word count otherwise,
/// rounded to the nearest integer.
pub fn default_k(supervised: bool, label_count: usize, word_count: usize) -> usize {
    let total = if supervised { label_count } else { word_count };
    ((total as f32).sqrt() + 0.5) as usize
}

/// Loaded backend plus the derived state tied to its lifetime.
struct LoadedModel {
    backend: Box<dyn ModelBackend>,
    /// Word-vector matrix, built on the first nearest-neighbor or analogy
    /// query and reused until the model is replaced or released.
    vectors: Option<Matrix>,
}

/// Query engine over one pretrained embedding model.
///
/// Created empty; `load_model` attaches a model, loading again replaces it,
/// and `close` (or drop) releases it together with every derived cache.
pub struct QueryEngine {
    config: EngineConfig,
    loader: Box<dyn ModelLoader>,
    state: Mutex<Option<LoadedModel>>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl QueryEngine {
    /// Create an engine with no model loaded. Queries fail with
    /// [`QueryError::ModelNotLoaded`] until `load_model` succeeds.
    pub fn new(config: EngineConfig, loader: Box<dyn ModelLoader>) -> Result<Self> {
        config.validate().map_err(QueryError::InvalidArgument)?;

        let cache_capacity = NonZeroUsize::new(config.cache_capacity).ok_or_else(|| {
            QueryError::InvalidArgument("cache_capacity must be > 0".to_string())
        })?;

        Ok(Self {
            config,
            loader,
            state: Mutex::new(None),
            cache: Mutex::new(LruCache::new(cache_capacity)),
        })
    }

    /// Load the model at `path`, replacing any previously loaded model.
    ///
    /// The path is resolved against the configured model directory first
    /// (see [`EngineConfig::resolve_model_path`]). On failure the previous
    /// state is kept: a fresh engine stays unloaded, a loaded engine keeps
    /// serving its current model.
    pub fn load_model(&self, path: impl AsRef<Path>) -> Result<()> {
        let resolved = self.config.resolve_model_path(path.as_ref())?;
        tracing::info!(path = %resolved.display(), "loading model");

        let backend = self.loader.load(&resolved)?;
        tracing::info!(
            dimension = backend.dimension(),
            words = backend.word_count(),
            labels = backend.label_count(),
            "model loaded"
        );

        *self.lock_state() = Some(LoadedModel {
            backend,
            vectors: None,
        });
        self.lock_cache().clear();
        Ok(())
    }

    /// Release the model and every derived cache. Safe to call when nothing
    /// is loaded, and safe to call twice.
    pub fn close(&self) {
        if self.lock_state().take().is_some() {
            tracing::info!("model released");
        }
        self.lock_cache().clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.lock_state().is_some()
    }

    /// Word-vector cache statistics (entries, capacity).
    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.lock_cache();
        (cache.len(), cache.cap().get())
    }

    /// Number of distinct words in the model dictionary.
    pub fn word_count(&self) -> Result<usize> {
        self.with_model(|m| Ok(m.backend.word_count()))
    }

    /// Number of supervised labels in the model dictionary.
    pub fn label_count(&self) -> Result<usize> {
        self.with_model(|m| Ok(m.backend.label_count()))
    }

    /// Dictionary index of `word`; [`crate::model::OOV_ID`] when out of
    /// vocabulary.
    pub fn word_id(&self, word: &str) -> Result<i32> {
        self.with_model(|m| Ok(m.backend.word_id(word)))
    }

    /// Subword hash index of `token`; [`crate::model::OOV_ID`] when the
    /// token has no subword entry.
    pub fn subword_id(&self, token: &str) -> Result<i32> {
        self.with_model(|m| Ok(m.backend.subword_id(token)))
    }

    /// Word at dictionary index `id`.
    pub fn word_at(&self, id: i32) -> Result<String> {
        self.with_model(|m| {
            let len = m.backend.word_count();
            check_index(id, len)?;
            Ok(m.backend.word(id))
        })
    }

    /// Label at dictionary index `id`.
    pub fn label_at(&self, id: i32) -> Result<String> {
        self.with_model(|m| {
            let len = m.backend.label_count();
            check_index(id, len)?;
            Ok(m.backend.label(id))
        })
    }

    /// Full-word embedding, composed from subwords when `word` is out of
    /// vocabulary. Cached per word until the model is replaced or released.
    pub fn word_vector(&self, word: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.lock_cache().get(word) {
            return Ok(hit.clone());
        }

        let vector = self.with_model(|m| Ok(m.backend.word_vector(word)))?;
        self.lock_cache().put(word.to_string(), vector.clone());
        Ok(vector)
    }

    /// Embedding restricted to the subword hashing path.
    pub fn subword_vector(&self, token: &str) -> Result<Vec<f32>> {
        self.with_model(|m| Ok(m.backend.subword_vector(token)))
    }

    /// Embedding of `text` under the backend's line-reading convention. The
    /// trailing newline the line reader expects is appended when missing.
    pub fn sentence_vector(&self, text: &str) -> Result<Vec<f32>> {
        self.with_model(|m| Ok(m.backend.sentence_vector(&terminate_line(text))))
    }

    /// Top-`k` label predictions for `text`, scored as probabilities.
    ///
    /// `k <= 0` selects the [`default_k`] heuristic. The backend reports in
    /// log-space; scores are converted with `exp` before being returned.
    pub fn predict(&self, text: &str, k: i32) -> Result<Vec<ScoredLabel>> {
        self.with_model(|m| {
            let k = effective_k(k, m.backend.as_ref());
            let line = terminate_line(text);
            let (words, _labels) = m.backend.line_ids(&line);

            let predictions = m
                .backend
                .predict_ids(k, &words)
                .map_err(|e| QueryError::Prediction(e.to_string()))?;

            Ok(predictions
                .into_iter()
                .map(|(log_prob, id)| ScoredLabel {
                    score: log_prob.exp(),
                    label: m.backend.label(id),
                })
                .collect())
        })
    }

    /// The `k` words most similar to `word`, excluding `word` itself.
    ///
    /// The first call on a loaded model precomputes the word-vector matrix;
    /// later calls reuse it.
    pub fn nearest_neighbors(&self, word: &str, k: i32) -> Result<Vec<ScoredLabel>> {
        self.with_model(|m| {
            let k = effective_k(k, m.backend.as_ref());
            let query = m.backend.word_vector(word);
            let ban: HashSet<String> = std::iter::once(word.to_string()).collect();
            Ok(search(m, &query, k, &ban))
        })
    }

    /// Resolve an analogy query such as `"king - man + woman"`.
    ///
    /// Each term contributes its word vector scaled by `sign / (norm + eps)`
    /// so high-magnitude outliers cannot dominate the accumulated query, and
    /// every term is excluded from the results.
    pub fn analogies(&self, query: &str, k: i32) -> Result<Vec<ScoredLabel>> {
        self.with_model(|m| {
            let k = effective_k(k, m.backend.as_ref());
            let mut ban = HashSet::new();
            let mut accumulated = vec![0.0f32; m.backend.dimension()];

            for SignedTerm { sign, token } in parse_query(query) {
                let vector = m.backend.word_vector(&token);
                let weight = sign as f32 / (l2_norm(&vector) + ANALOGY_NORM_EPSILON);
                for (acc, component) in accumulated.iter_mut().zip(&vector) {
                    *acc += weight * component;
                }
                ban.insert(token);
            }

            Ok(search(m, &accumulated, k, &ban))
        })
    }

    /// Every n-gram the model extracts from `word`, with its vector, in the
    /// backend's enumeration order.
    pub fn ngram_vectors(&self, word: &str) -> Result<Vec<NgramVector>> {
        self.with_model(|m| {
            Ok(m.backend
                .ngram_vectors(word)
                .into_iter()
                .map(|(gram, vector)| NgramVector { word: gram, vector })
                .collect())
        })
    }

    fn with_model<T>(&self, f: impl FnOnce(&mut LoadedModel) -> Result<T>) -> Result<T> {
        let mut state = self.lock_state();
        match state.as_mut() {
            Some(model) => f(model),
            None => Err(QueryError::ModelNotLoaded),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Option<LoadedModel>> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<String, Vec<f32>>> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn check_index(id: i32, len: usize) -> Result<()> {
    if id < 0 || id as usize >= len {
        return Err(QueryError::IndexOutOfRange { id, len });
    }
    Ok(())
}

fn effective_k(k: i32, backend: &dyn ModelBackend) -> usize {
    if k > 0 {
        k as usize
    } else {
        default_k(
            backend.is_supervised(),
            backend.label_count(),
            backend.word_count(),
        )
    }
}

fn terminate_line(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

/// Nearest-neighbor search over the (lazily built) word-vector matrix.
fn search(model: &mut LoadedModel, query: &[f32], k: usize, ban: &HashSet<String>) -> Vec<ScoredLabel> {
    let LoadedModel { backend, vectors } = model;
    let matrix = vectors.get_or_insert_with(|| {
        tracing::debug!(words = backend.word_count(), "precomputing word-vector matrix");
        backend.precompute_word_vectors()
    });
    find_nn(matrix, backend.as_ref(), query, k, ban)
}

/// Score every non-banned dictionary word against `query` and keep the top
/// `k`. Matrix rows are normalized, so a dot product divided by the query
/// norm is a cosine score.
fn find_nn(
    vectors: &Matrix,
    backend: &dyn ModelBackend,
    query: &[f32],
    k: usize,
    ban: &HashSet<String>,
) -> Vec<ScoredLabel> {
    let mut query_norm = l2_norm(query);
    if query_norm < MIN_QUERY_NORM {
        query_norm = 1.0;
    }

    let mut scored: Vec<ScoredLabel> = Vec::with_capacity(vectors.rows());
    for row in 0..vectors.rows() {
        let word = backend.word(row as i32);
        if ban.contains(&word) {
            continue;
        }
        scored.push(ScoredLabel {
            score: dot(vectors.row(row), query) / query_norm,
            label: word,
        });
    }

    // Stable sort keeps dictionary order among equal scores.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().fold(0.0f32, |acc, &x| x.mul_add(x, acc)).sqrt()
}
