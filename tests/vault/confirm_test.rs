use didvault::vault::{AutoConfirm, Confirmer, MockConfirmer};

/// Test: AutoConfirm approves everything
#[tokio::test]
async fn test_auto_confirm() {
    assert!(AutoConfirm.confirm("anything?").await);
}

/// Test: Mock records prompts in order
#[tokio::test]
async fn test_mock_records_prompts() {
    let mock = MockConfirmer::approving();

    assert!(mock.confirm("first").await);
    assert!(mock.confirm("second").await);

    assert_eq!(mock.call_count(), 2);
    assert_eq!(mock.prompts(), vec!["first".to_string(), "second".to_string()]);
}

/// Test: Declining mock answers false
#[tokio::test]
async fn test_mock_declines() {
    let mock = MockConfirmer::declining();
    assert!(!mock.confirm("reveal?").await);
    assert_eq!(mock.call_count(), 1);
}
