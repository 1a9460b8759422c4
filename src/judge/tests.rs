use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

#[test]
fn test_scale_threshold_and_normalize() {
    assert_eq!(JudgeScale::UNIT.threshold(0.3), 0.3);
    assert_eq!(JudgeScale::TEN_POINT.threshold(0.3), 3.0);
    assert_eq!(JudgeScale::TEN_POINT.threshold(2.0), 10.0);
    assert_eq!(JudgeScale::TEN_POINT.normalize(5.0), 0.5);
    assert_eq!(JudgeScale::TEN_POINT.normalize(-1.0), 0.0);
}

#[test]
fn test_score_distribution() {
    let dist = ScoreDistribution::from_scores(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0])
        .unwrap();

    assert_eq!(dist.count, 10);
    assert_eq!(dist.min, 1.0);
    assert_eq!(dist.max, 10.0);
    assert!((dist.mean - 5.5).abs() < 1e-6);
    assert_eq!(dist.p50, 5.0);
    assert_eq!(dist.p90, 9.0);

    assert!(ScoreDistribution::from_scores(&[]).is_none());
    assert_eq!(ScoreDistribution::above(&[0.1, 0.5, 0.9], 0.5), 2);
}

#[tokio::test]
async fn test_lexical_judge_orders_by_overlap() {
    let judge = LexicalJudge::new();
    let scores = judge
        .judge(
            "Jokić passing vision",
            &[
                "Jokić has incredible passing vision for a center",
                "Tickets for the arena go on sale Friday",
            ],
        )
        .await
        .unwrap();

    assert_eq!(scores.len(), 2);
    assert!(scores[0] > 0.5);
    assert!(scores[1] < 0.1);
    assert_eq!(judge.scale(), JudgeScale::UNIT);
}

#[test]
fn test_lexical_judge_stopword_only_query() {
    let score = LexicalJudge::new().score("what is the", "what is the");
    assert!((score - 0.3).abs() < 1e-6);
}

#[test]
fn test_parse_scores() {
    assert_eq!(
        parse_scores("Scores: [7, 2, 10]", 3).unwrap(),
        vec![7.0, 2.0, 10.0]
    );
    assert_eq!(parse_scores("[12, -3]", 2).unwrap(), vec![10.0, 0.0]);
    assert!(matches!(
        parse_scores("[1, 2]", 3),
        Err(JudgeError::ScoreCountMismatch {
            expected: 3,
            actual: 2
        })
    ));
    assert!(matches!(
        parse_scores("I cannot rate these", 1),
        Err(JudgeError::InvalidResponse { .. })
    ));
}

#[test]
fn test_judge_kind_parse() {
    assert_eq!("none".parse::<JudgeKind>().unwrap(), JudgeKind::None);
    assert_eq!("Cross-Encoder".parse::<JudgeKind>().unwrap(), JudgeKind::CrossEncoder);
    assert_eq!("llm".parse::<JudgeKind>().unwrap(), JudgeKind::Llm);
    assert!("bogus".parse::<JudgeKind>().is_err());
}

#[test]
fn test_judge_config_validate() {
    assert!(JudgeConfig::default().validate().is_ok());
    assert!(JudgeConfig::disabled().validate().is_ok());

    let config = JudgeConfig {
        kind: JudgeKind::CrossEncoder,
        ..JudgeConfig::default()
    };
    assert!(config.validate().is_err());

    let config = JudgeConfig::cross_encoder("");
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_judge_config_from_env() {
    with_env_vars(
        &[
            ("SIFT_JUDGE", "cross-encoder"),
            ("SIFT_JUDGE_MODEL_PATH", "/models/ms-marco"),
        ],
        || {
            let config = JudgeConfig::from_env();
            assert_eq!(config.kind, JudgeKind::CrossEncoder);
            assert_eq!(config.model_path, Some(PathBuf::from("/models/ms-marco")));
        },
    );

    let config = JudgeConfig::from_env();
    assert_eq!(config.kind, JudgeKind::Lexical);
    assert_eq!(config.llm_model, DEFAULT_LLM_JUDGE_MODEL);
}

#[test]
fn test_build_judge() {
    assert!(build_judge(&JudgeConfig::disabled()).unwrap().is_none());

    let judge = build_judge(&JudgeConfig::default()).unwrap().unwrap();
    assert_eq!(judge.name(), "lexical");

    let Err(err) = build_judge(&JudgeConfig::cross_encoder("/definitely/not/a/model")) else {
        panic!("missing model directory must be rejected");
    };
    assert!(matches!(err, JudgeError::ModelNotFound { .. }));
}

#[tokio::test]
async fn test_mock_judge() {
    let judge = MockJudge::new(JudgeScale::TEN_POINT, 2.0).with_score("good", 9.0);
    let scores = judge.judge("q", &["good", "other"]).await.unwrap();
    assert_eq!(scores, vec![9.0, 2.0]);

    judge.fail_next(1, || JudgeError::RateLimited);
    assert!(judge.judge("q", &["good"]).await.is_err());
    assert_eq!(judge.calls(), 2);
}

#[cfg(not(any(feature = "metal", feature = "cuda")))]
#[test]
fn test_select_device_without_gpu_backend_is_cpu() {
    let device = device::select_device();
    assert!(matches!(device, candle_core::Device::Cpu));
    assert_eq!(device::device_label(&device), "cpu");
}
