//! Embedding provider with lazy, single-flight model loading.
//!
//! The provider owns the only model handle in the process. Every caller
//! shares it; the first caller to need it triggers the load and everyone
//! arriving while the load runs awaits that same attempt.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;

use super::traits::{EmbeddingError, EmbeddingResult, ModelHandle, ModelLoader};
use super::vector::{random_vector, Embedding};

type LoadFuture = Shared<BoxFuture<'static, EmbeddingResult<ModelHandle>>>;

/// Lifecycle of the shared model.
enum LoadState {
    Unloaded,
    /// A load is running; waiters clone and await the shared future.
    Loading(LoadFuture),
    Ready(ModelHandle),
}

/// Read-only snapshot of the provider for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub loading: bool,
    pub model_name: String,
}

/// Converts text into embeddings using a lazily loaded model.
///
/// Meant to be created once and shared behind an `Arc`. Load failures are
/// not cached: the state returns to unloaded and the next caller starts a
/// fresh attempt.
pub struct EmbeddingProvider {
    loader: Arc<dyn ModelLoader>,
    state: Arc<Mutex<LoadState>>,
}

impl EmbeddingProvider {
    /// Creates a provider that will load its model with `loader`.
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            state: Arc::new(Mutex::new(LoadState::Unloaded)),
        }
    }

    /// Returns the loaded model, loading it first if necessary.
    ///
    /// Concurrent callers during a load all receive the outcome of that one
    /// load, whether it succeeds or fails.
    pub async fn initialize(&self) -> EmbeddingResult<ModelHandle> {
        let flight = {
            let mut state = lock(&self.state);
            match &*state {
                LoadState::Ready(handle) => return Ok(Arc::clone(handle)),
                LoadState::Loading(flight) => flight.clone(),
                LoadState::Unloaded => {
                    let flight = self.start_load();
                    *state = LoadState::Loading(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    fn start_load(&self) -> LoadFuture {
        let loader = Arc::clone(&self.loader);
        let state = Arc::clone(&self.state);

        async move {
            let result = loader.load().await;
            let mut guard = lock(&state);
            *guard = match &result {
                Ok(handle) => LoadState::Ready(Arc::clone(handle)),
                Err(err) => {
                    tracing::error!(
                        model = %loader.model_name(),
                        error = %err,
                        "Embedding model load failed"
                    );
                    LoadState::Unloaded
                }
            };
            result
        }
        .boxed()
        .shared()
    }

    /// Embeds one text with mean pooling and L2 normalization.
    pub async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        let model = self.initialize().await?;
        let input = text.to_owned();

        let values = tokio::task::spawn_blocking(move || model.embed(&input))
            .await
            .map_err(EmbeddingError::inference)??;

        tracing::debug!(
            dimension = values.len(),
            preview = %text.chars().take(50).collect::<String>(),
            "Created embedding"
        );
        Ok(Embedding::new(values))
    }

    /// Embeds texts one after another, preserving order.
    ///
    /// The first failure aborts the batch; no partial results are returned.
    pub async fn embed_batch<S: AsRef<str>>(&self, texts: &[S]) -> EmbeddingResult<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text.as_ref()).await?);
        }
        Ok(embeddings)
    }

    /// Generates a non-semantic vector of uniform values in `[0, 1)`.
    pub fn random_vector(&self, dimension: usize) -> Embedding {
        random_vector(dimension)
    }

    /// Reports whether the model is loaded or loading.
    ///
    /// A load whose callers were all dropped stays `loading` until the next
    /// [`initialize`](Self::initialize) resumes it.
    pub fn status(&self) -> ModelStatus {
        let state = lock(&self.state);
        ModelStatus {
            loaded: matches!(*state, LoadState::Ready(_)),
            loading: matches!(*state, LoadState::Loading(_)),
            model_name: self.loader.model_name().to_owned(),
        }
    }

    /// Output dimension of the loaded model, if loaded.
    pub fn dimension(&self) -> Option<usize> {
        match &*lock(&self.state) {
            LoadState::Ready(handle) => Some(handle.dimension()),
            _ => None,
        }
    }

    pub fn model_name(&self) -> &str {
        self.loader.model_name()
    }
}

fn lock(state: &Mutex<LoadState>) -> MutexGuard<'_, LoadState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::traits::EmbeddingModel;
    use async_trait::async_trait;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Model that hashes characters into a fixed number of buckets.
    struct BucketModel {
        dimension: usize,
    }

    impl EmbeddingModel for BucketModel {
        fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
            if text.contains("\u{0}") {
                return Err(EmbeddingError::inference("nul byte in input"));
            }
            let mut values = vec![0.0f32; self.dimension];
            for (i, c) in text.chars().enumerate() {
                values[(c as usize + i) % self.dimension] += 1.0;
            }
            Ok(Embedding::new(values).normalized().into_inner())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }

    /// Loader that counts loads and can be held open until released.
    struct GatedLoader {
        loads: AtomicUsize,
        fail_first: usize,
        gate: Option<Arc<Notify>>,
    }

    impl GatedLoader {
        fn ready() -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail_first: 0,
                gate: None,
            }
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelLoader for GatedLoader {
        fn model_name(&self) -> &str {
            "test/bucket-model"
        }

        async fn load(&self) -> EmbeddingResult<ModelHandle> {
            let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if attempt < self.fail_first {
                return Err(EmbeddingError::model_load("test/bucket-model", "offline"));
            }
            Ok(Arc::new(BucketModel { dimension: 16 }))
        }
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let loader = Arc::new(GatedLoader::ready());
        let provider = EmbeddingProvider::new(loader.clone());

        let first = provider.initialize().await.unwrap();
        let second = provider.initialize().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.loads(), 1);
    }

    #[tokio::test]
    async fn concurrent_initialize_loads_once() {
        let gate = Arc::new(Notify::new());
        let loader = Arc::new(GatedLoader {
            gate: Some(gate.clone()),
            ..GatedLoader::ready()
        });
        let provider = EmbeddingProvider::new(loader.clone());

        // Runs only once every caller below is parked on the load.
        let release = tokio::spawn(async move { gate.notify_one() });
        let handles: Vec<_> = join_all((0..8).map(|_| provider.initialize()))
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        release.await.unwrap();

        assert_eq!(loader.loads(), 1);
        assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn concurrent_callers_share_a_failed_load() {
        let gate = Arc::new(Notify::new());
        let loader = Arc::new(GatedLoader {
            fail_first: 1,
            gate: Some(gate.clone()),
            ..GatedLoader::ready()
        });
        let provider = EmbeddingProvider::new(loader.clone());

        let release = tokio::spawn(async move { gate.notify_one() });
        let results = join_all((0..4).map(|_| provider.initialize())).await;
        release.await.unwrap();

        for result in results {
            assert!(matches!(result, Err(EmbeddingError::ModelLoad { .. })));
        }
        assert_eq!(loader.loads(), 1);
        assert!(!provider.status().loading);
        assert!(!provider.status().loaded);
    }

    #[tokio::test]
    async fn failed_load_can_be_retried() {
        let loader = Arc::new(GatedLoader {
            fail_first: 1,
            ..GatedLoader::ready()
        });
        let provider = EmbeddingProvider::new(loader.clone());

        assert!(provider.initialize().await.is_err());
        assert!(provider.initialize().await.is_ok());
        assert_eq!(loader.loads(), 2);
    }

    #[tokio::test]
    async fn status_tracks_load_lifecycle() {
        let gate = Arc::new(Notify::new());
        let loader = Arc::new(GatedLoader {
            gate: Some(gate.clone()),
            ..GatedLoader::ready()
        });
        let provider = EmbeddingProvider::new(loader);

        let before = provider.status();
        assert!(!before.loaded && !before.loading);
        assert_eq!(before.model_name, "test/bucket-model");

        let init = provider.initialize();
        tokio::pin!(init);
        assert!(futures::poll!(&mut init).is_pending());

        let during = provider.status();
        assert!(during.loading && !during.loaded);
        assert!(provider.dimension().is_none());

        gate.notify_one();
        init.await.unwrap();

        let after = provider.status();
        assert!(after.loaded && !after.loading);
        assert_eq!(provider.dimension(), Some(16));
    }

    #[tokio::test]
    async fn abandoned_load_is_resumed_by_next_caller() {
        let gate = Arc::new(Notify::new());
        let loader = Arc::new(GatedLoader {
            gate: Some(gate.clone()),
            ..GatedLoader::ready()
        });
        let provider = EmbeddingProvider::new(loader.clone());

        {
            let init = provider.initialize();
            tokio::pin!(init);
            assert!(futures::poll!(&mut init).is_pending());
        }

        let abandoned = provider.status();
        assert!(abandoned.loading && !abandoned.loaded);

        gate.notify_one();
        provider.initialize().await.unwrap();

        assert!(provider.status().loaded);
        assert_eq!(loader.loads(), 1);
    }

    #[tokio::test]
    async fn embed_returns_unit_vector() {
        let provider = EmbeddingProvider::new(Arc::new(GatedLoader::ready()));

        for text in ["hello", "a much longer sentence about vector search", "é"] {
            let embedding = provider.embed(text).await.unwrap();
            assert_eq!(embedding.dimension(), 16);
            assert!((embedding.l2_norm() - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn embed_surfaces_load_failure() {
        let loader = Arc::new(GatedLoader {
            fail_first: usize::MAX,
            ..GatedLoader::ready()
        });
        let provider = EmbeddingProvider::new(loader);

        let err = provider.embed("anything").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelLoad { .. }));
    }

    #[tokio::test]
    async fn embed_batch_preserves_order() {
        let provider = EmbeddingProvider::new(Arc::new(GatedLoader::ready()));
        let texts = ["alpha", "beta", "gamma"];

        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 3);
        for (text, embedding) in texts.iter().zip(&batch) {
            assert_eq!(embedding, &provider.embed(text).await.unwrap());
        }
    }

    #[tokio::test]
    async fn embed_batch_aborts_on_first_error() {
        let provider = EmbeddingProvider::new(Arc::new(GatedLoader::ready()));
        let texts = ["fine", "bad\u{0}", "never reached"];

        let err = provider.embed_batch(&texts).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Inference(_)));
    }

    #[test]
    fn random_vector_needs_no_model() {
        let loader = Arc::new(GatedLoader::ready());
        let provider = EmbeddingProvider::new(loader.clone());

        assert_eq!(provider.random_vector(5).dimension(), 5);
        assert_eq!(loader.loads(), 0);
        assert!(!provider.status().loaded);
    }
}
