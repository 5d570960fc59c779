use didvault::identity::{Address, SeedPhrase, ETHEREUM_DERIVATION_PATH};
use didvault::storage::{MemoryBackend, SeedStore};
use didvault::vault::{
    AutoConfirm, Confirmer, KeyVault, MockConfirmer, ProtectionLevel, SeedVault, VaultConfig,
    VaultError, SHOW_SEED_PROMPT, SIGN_PROMPT, STORE_PROMPT,
};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use std::sync::Arc;
use tempfile::TempDir;

const ABANDON: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn vault(confirmer: Arc<dyn Confirmer>) -> SeedVault {
    SeedVault::new(Box::new(MemoryBackend::new()), confirmer, VaultConfig::default()).unwrap()
}

fn recover(digest: [u8; 32], sig: &[u8; 65]) -> Address {
    let secp = Secp256k1::new();
    let recid = RecoveryId::from_i32(sig[64] as i32).unwrap();
    let recoverable = RecoverableSignature::from_compact(&sig[..64], recid).unwrap();
    let public = secp
        .recover_ecdsa(&Message::from_digest(digest), &recoverable)
        .unwrap();
    Address::from_public_key(&public)
}

// ============================================================================
// CREATE / IMPORT
// ============================================================================

/// Test: Created seeds show up in the address list
#[tokio::test]
async fn test_create_lists_address() {
    let vault = vault(Arc::new(AutoConfirm));

    let a = vault.create(ProtectionLevel::Simple).await.unwrap();
    let b = vault.create(ProtectionLevel::Simple).await.unwrap();

    let listed = vault.list_addresses().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&a) && listed.contains(&b));
}

/// Test: Import derives the address along the configured path
#[tokio::test]
async fn test_import_uses_configured_path() {
    let config = VaultConfig::new().with_derivation_path(ETHEREUM_DERIVATION_PATH);
    let vault = SeedVault::new(Box::new(MemoryBackend::new()), Arc::new(AutoConfirm), config).unwrap();

    let address = vault.import(ABANDON, ProtectionLevel::Simple).await.unwrap();
    assert_eq!(address.to_string(), "0x9858effd232b4033e47d90003d41ec34ecaeda94");
}

/// Test: Importing the same phrase twice fails with AlreadyExists
#[tokio::test]
async fn test_import_duplicate() {
    let vault = vault(Arc::new(AutoConfirm));

    let first = vault.import(ABANDON, ProtectionLevel::Simple).await.unwrap();
    let second = vault.import(ABANDON, ProtectionLevel::SinglePrompt).await;

    assert!(
        matches!(second, Err(VaultError::AlreadyExists(a)) if a == first),
        "Second import should fail, got: {:?}",
        second
    );
    assert_eq!(vault.list_addresses().await.unwrap(), vec![first]);
}

/// Test: Malformed phrases are InvalidSeed
#[tokio::test]
async fn test_import_invalid_seed() {
    let vault = vault(Arc::new(AutoConfirm));

    let result = vault.import("not a real seed phrase", ProtectionLevel::Simple).await;
    assert!(matches!(result, Err(VaultError::InvalidSeed(_))));
    assert!(vault.list_addresses().await.unwrap().is_empty());
}

/// Test: Cloud backup is refused unless enabled
#[tokio::test]
async fn test_cloud_level_unsupported_by_default() {
    let vault = vault(Arc::new(AutoConfirm));

    let result = vault.create(ProtectionLevel::CloudBacked).await;
    assert!(matches!(
        result,
        Err(VaultError::UnsupportedLevel(ProtectionLevel::CloudBacked))
    ));
}

/// Test: Cloud backup works once enabled
#[tokio::test]
async fn test_cloud_level_when_enabled() {
    let config = VaultConfig::new().with_cloud_backup();
    let vault = SeedVault::new(Box::new(MemoryBackend::new()), Arc::new(AutoConfirm), config).unwrap();

    assert!(vault.create(ProtectionLevel::CloudBacked).await.is_ok());
}

/// Test: PromptEveryTime asks before storing, and a refusal stores nothing
#[tokio::test]
async fn test_prompt_level_declined_on_create() {
    let confirmer = Arc::new(MockConfirmer::declining());
    let vault = vault(confirmer.clone());

    let result = vault.create(ProtectionLevel::PromptEveryTime).await;

    assert!(matches!(result, Err(VaultError::UserDeclined)));
    assert_eq!(confirmer.prompts(), vec![STORE_PROMPT.to_string()]);
    assert!(vault.list_addresses().await.unwrap().is_empty());
}

/// Test: Simple level never prompts on create
#[tokio::test]
async fn test_simple_create_does_not_prompt() {
    let confirmer = Arc::new(MockConfirmer::declining());
    let vault = vault(confirmer.clone());

    vault.create(ProtectionLevel::Simple).await.unwrap();
    assert_eq!(confirmer.call_count(), 0);
}

/// Test: Concurrent imports of the same phrase store it once
#[tokio::test]
async fn test_concurrent_duplicate_imports() {
    let vault = Arc::new(vault(Arc::new(AutoConfirm)));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let vault = vault.clone();
        tasks.push(tokio::spawn(async move {
            vault.import(ABANDON, ProtectionLevel::Simple).await
        }));
    }

    let mut ok = 0;
    let mut exists = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => ok += 1,
            Err(VaultError::AlreadyExists(_)) => exists += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(ok, 1, "Exactly one import should win");
    assert_eq!(exists, 7);
    assert_eq!(vault.list_addresses().await.unwrap().len(), 1);
}

// ============================================================================
// DELETE
// ============================================================================

/// Test: Delete reports whether something was removed
#[tokio::test]
async fn test_delete_true_then_false() {
    let vault = vault(Arc::new(AutoConfirm));
    let address = vault.create(ProtectionLevel::Simple).await.unwrap();

    assert!(vault.delete(&address).await.unwrap());
    assert!(!vault.delete(&address).await.unwrap());
    assert!(vault.list_addresses().await.unwrap().is_empty());
}

// ============================================================================
// REVEAL
// ============================================================================

/// Test: Reveal returns the imported phrase after confirmation
#[tokio::test]
async fn test_reveal_approved() {
    let confirmer = Arc::new(MockConfirmer::approving());
    let vault = vault(confirmer.clone());
    let address = vault.import(ABANDON, ProtectionLevel::Simple).await.unwrap();

    let seed = vault.reveal(&address, SHOW_SEED_PROMPT).await.unwrap();

    assert_eq!(seed, SeedPhrase::parse(ABANDON).unwrap());
    assert_eq!(confirmer.prompts(), vec![SHOW_SEED_PROMPT.to_string()]);
}

/// Test: Declined reveal returns UserDeclined
#[tokio::test]
async fn test_reveal_declined() {
    let vault = vault(Arc::new(MockConfirmer::declining()));
    let address = vault.import(ABANDON, ProtectionLevel::Simple).await.unwrap();

    let result = vault.reveal(&address, SHOW_SEED_PROMPT).await;
    assert!(matches!(result, Err(VaultError::UserDeclined)));
}

/// Test: Unknown address fails before the user is asked
#[tokio::test]
async fn test_reveal_not_found_skips_prompt() {
    let confirmer = Arc::new(MockConfirmer::approving());
    let vault = vault(confirmer.clone());
    let address = Address::from_bytes([0x42; 20]);

    let result = vault.reveal(&address, SHOW_SEED_PROMPT).await;

    assert!(matches!(result, Err(VaultError::NotFound(a)) if a == address));
    assert_eq!(confirmer.call_count(), 0);
}

/// Test: A prompt that outlives the timeout is Cancelled
#[tokio::test]
async fn test_reveal_timeout_cancels() {
    let confirmer = Arc::new(MockConfirmer::approving().with_delay_ms(500));
    let config = VaultConfig::new().with_confirm_timeout_ms(20);
    let vault = SeedVault::new(Box::new(MemoryBackend::new()), confirmer, config).unwrap();
    let address = vault.create(ProtectionLevel::Simple).await.unwrap();

    let result = vault.reveal(&address, SHOW_SEED_PROMPT).await;
    assert!(matches!(result, Err(VaultError::Cancelled)));
}

/// Test: A timed-out store prompt leaves nothing behind
#[tokio::test]
async fn test_create_timeout_does_not_store() {
    let confirmer = Arc::new(MockConfirmer::approving().with_delay_ms(500));
    let config = VaultConfig::new().with_confirm_timeout_ms(20);
    let vault = SeedVault::new(Box::new(MemoryBackend::new()), confirmer, config).unwrap();

    let result = vault.create(ProtectionLevel::PromptEveryTime).await;

    assert!(matches!(result, Err(VaultError::Cancelled)));
    assert!(vault.list_addresses().await.unwrap().is_empty());
}

// ============================================================================
// SIGNING HANDLES
// ============================================================================

/// Test: Handle signatures recover to the handle's address
#[tokio::test]
async fn test_handle_signature_matches_address() {
    let vault = vault(Arc::new(AutoConfirm));
    let address = vault.create(ProtectionLevel::Simple).await.unwrap();

    let handle = vault.signing_handle(&address).await.unwrap();
    let digest = [0x5a; 32];
    let sig = handle.sign_digest(&digest).unwrap();

    assert_eq!(handle.address(), address);
    assert!(sig[64] <= 1, "Recovery id should be 0 or 1");
    assert_eq!(recover(digest, &sig), address);
}

/// Test: Handle for an unknown address is NotFound
#[tokio::test]
async fn test_handle_not_found() {
    let vault = vault(Arc::new(AutoConfirm));
    let result = vault.signing_handle(&Address::from_bytes([1; 20])).await;
    assert!(matches!(result, Err(VaultError::NotFound(_))));
}

/// Test: SinglePrompt asks once per session
#[tokio::test]
async fn test_single_prompt_asks_once() {
    let confirmer = Arc::new(MockConfirmer::approving());
    let vault = vault(confirmer.clone());
    let address = vault.create(ProtectionLevel::SinglePrompt).await.unwrap();

    vault.signing_handle(&address).await.unwrap();
    vault.signing_handle(&address).await.unwrap();
    vault.signing_handle(&address).await.unwrap();

    assert_eq!(confirmer.prompts(), vec![SIGN_PROMPT.to_string()]);
}

/// Test: Deleting a SinglePrompt identity locks it again
#[tokio::test]
async fn test_single_prompt_relocks_after_delete() {
    let confirmer = Arc::new(MockConfirmer::approving());
    let vault = vault(confirmer.clone());
    let address = vault.import(ABANDON, ProtectionLevel::SinglePrompt).await.unwrap();

    vault.signing_handle(&address).await.unwrap();
    assert!(vault.delete(&address).await.unwrap());

    let again = vault.import(ABANDON, ProtectionLevel::SinglePrompt).await.unwrap();
    assert_eq!(again, address);
    vault.signing_handle(&address).await.unwrap();

    assert_eq!(
        confirmer.prompts(),
        vec![SIGN_PROMPT.to_string(), SIGN_PROMPT.to_string()],
        "Re-imported identity should ask before signing again"
    );
}

/// Test: A delete during the unlock prompt does not leave the address unlocked
#[tokio::test]
async fn test_single_prompt_delete_during_prompt() {
    let confirmer = Arc::new(MockConfirmer::approving().with_delay_ms(200));
    let vault = Arc::new(vault(confirmer.clone()));
    let address = vault.import(ABANDON, ProtectionLevel::SinglePrompt).await.unwrap();

    let pending = {
        let vault = vault.clone();
        tokio::spawn(async move { vault.signing_handle(&address).await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(vault.delete(&address).await.unwrap());

    let result = pending.await.unwrap();
    assert!(
        matches!(result, Err(VaultError::NotFound(a)) if a == address),
        "Handle for a deleted identity should fail, got: {:?}",
        result.map(|h| h.address())
    );

    vault.import(ABANDON, ProtectionLevel::SinglePrompt).await.unwrap();
    vault.signing_handle(&address).await.unwrap();
    assert_eq!(confirmer.call_count(), 2, "Unlock should not survive the delete");
}

/// Test: PromptEveryTime asks on every handle
#[tokio::test]
async fn test_prompt_every_time_asks_each_time() {
    let confirmer = Arc::new(MockConfirmer::approving());
    let vault = vault(confirmer.clone());
    let address = vault.create(ProtectionLevel::PromptEveryTime).await.unwrap();
    let after_create = confirmer.call_count();

    vault.signing_handle(&address).await.unwrap();
    vault.signing_handle(&address).await.unwrap();

    assert_eq!(confirmer.call_count() - after_create, 2);
}

/// Test: Declining a protected handle yields UserDeclined
#[tokio::test]
async fn test_protected_handle_declined() {
    let confirmer = Arc::new(MockConfirmer::declining());
    let vault = vault(confirmer.clone());
    // SinglePrompt only asks when the key is used, so the import goes through
    let address = vault.import(ABANDON, ProtectionLevel::SinglePrompt).await.unwrap();

    let result = vault.signing_handle(&address).await;

    assert!(matches!(result, Err(VaultError::UserDeclined)));
    assert_eq!(confirmer.prompts(), vec![SIGN_PROMPT.to_string()]);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

/// Test: Seeds survive reopening a sled-backed vault
#[tokio::test]
async fn test_sled_vault_persists() {
    let temp_dir = TempDir::new().unwrap();

    let address = {
        let store = SeedStore::open(temp_dir.path()).unwrap();
        let vault = SeedVault::new(Box::new(store), Arc::new(AutoConfirm), VaultConfig::default()).unwrap();
        vault.import(ABANDON, ProtectionLevel::Simple).await.unwrap()
    };

    let store = SeedStore::open(temp_dir.path()).unwrap();
    let vault = SeedVault::new(Box::new(store), Arc::new(AutoConfirm), VaultConfig::default()).unwrap();

    assert_eq!(vault.list_addresses().await.unwrap(), vec![address]);
    assert_eq!(
        vault.reveal(&address, SHOW_SEED_PROMPT).await.unwrap(),
        SeedPhrase::parse(ABANDON).unwrap()
    );
}

/// Test: Invalid configuration is refused at construction
#[test]
fn test_invalid_config_rejected() {
    let config = VaultConfig::new().with_word_count(13);
    let result = SeedVault::new(Box::new(MemoryBackend::new()), Arc::new(AutoConfirm), config);
    assert!(matches!(result, Err(VaultError::InvalidConfig(_))));
}
