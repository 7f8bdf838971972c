use super::*;

#[tokio::test]
async fn static_token_accepts_matching_token() {
    let provider = StaticTokenAuthProvider::new("secret");
    assert!(provider.verify("alice", Some("secret")).await.is_ok());
}

#[tokio::test]
async fn static_token_rejects_wrong_token() {
    let provider = StaticTokenAuthProvider::new("secret");
    let err = provider.verify("alice", Some("wrong")).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingSession));
}

#[tokio::test]
async fn static_token_rejects_missing_credential() {
    let provider = StaticTokenAuthProvider::new("secret");
    assert!(provider.verify("alice", None).await.is_err());
}

#[tokio::test]
async fn allow_all_accepts_anything() {
    let provider = AllowAllAuthProvider;
    assert!(provider.verify("anyone", None).await.is_ok());
}
