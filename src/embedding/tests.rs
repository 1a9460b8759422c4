use super::*;

#[test]
fn test_normalize_unit_length() {
    let mut v = vec![3.0, 4.0];
    let norm = normalize(&mut v);
    assert!((norm - 5.0).abs() < 1e-6);
    assert!((v[0] - 0.6).abs() < 1e-6);
    assert!((v[1] - 0.8).abs() < 1e-6);
}

#[test]
fn test_normalize_zero_vector() {
    let mut v = vec![0.0; 4];
    assert_eq!(normalize(&mut v), 0.0);
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn test_cosine_identical_and_mismatched() {
    let doc = to_unit_f16(vec![1.0, 2.0, 2.0]);
    let mut query = vec![1.0, 2.0, 2.0];
    normalize(&mut query);

    assert!((cosine_f16_f32(&doc, &query) - 1.0).abs() < 1e-2);
    assert_eq!(cosine_f16_f32(&doc, &[1.0]), 0.0);
}

#[tokio::test]
async fn test_stub_embedder_deterministic() {
    let embedder = StubEmbedder::new(64);

    let a = embedder.embed("Jokić triple double").await.unwrap();
    let b = embedder.embed("Jokić triple double").await.unwrap();

    assert_eq!(a.len(), 64);
    assert_eq!(a, b);
    let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_stub_embedder_shared_vocabulary_is_closer() {
    let embedder = StubEmbedder::new(256);

    let query = embedder.embed("elite playmaker passing vision").await.unwrap();
    let related = embedder.embed("his passing vision makes him an elite playmaker").await.unwrap();
    let unrelated = embedder.embed("arena parking prices downtown").await.unwrap();

    let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    assert!(dot(&query, &related) > dot(&query, &unrelated));
}

#[tokio::test]
async fn test_stub_embedder_empty_text() {
    let embedder = StubEmbedder::new(8);
    let v = embedder.embed("").await.unwrap();
    assert!(v.iter().all(|x| *x == 0.0));
}

#[tokio::test]
async fn test_mock_embedder_pinned_and_failures() {
    let embedder = MockEmbedder::new(2).with_vector("q", vec![2.0, 0.0]);
    embedder.fail_next(1, || EmbeddingError::RateLimited);

    let err = embedder.embed("q").await.unwrap_err();
    assert!(crate::retry::Transient::is_transient(&err));

    let v = embedder.embed("q").await.unwrap();
    assert_eq!(v, vec![1.0, 0.0]);
    assert_eq!(embedder.calls(), 2);
}

#[test]
fn test_transient_classification() {
    use crate::retry::Transient;

    assert!(EmbeddingError::RateLimited.is_transient());
    assert!(
        EmbeddingError::Timeout {
            reason: "slow".into()
        }
        .is_transient()
    );
    assert!(
        !EmbeddingError::Rejected {
            status: 400,
            reason: "bad".into()
        }
        .is_transient()
    );
    assert!(
        !EmbeddingError::DimensionMismatch {
            expected: 3,
            actual: 2
        }
        .is_transient()
    );
}

#[test]
fn test_http_embedder_rejects_bad_config() {
    let config = HttpEmbedderConfig {
        url: String::new(),
        model: "m".into(),
        dimension: 8,
        api_key: None,
        timeout: std::time::Duration::from_secs(1),
    };
    assert!(matches!(
        HttpEmbedder::new(config),
        Err(EmbeddingError::InvalidConfig { .. })
    ));
}
