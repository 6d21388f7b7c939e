// Bridge store tests
// Raw keys, typed round trips, and resuming a deployment from disk

use std::sync::Arc;

use lockmint::controller::{Controller, ControllerConfig, ControllerProgram};
use lockmint::identity::Keypair;
use lockmint::ledger::MintProgram;
use lockmint::settlement::{AccountId, LocalChain, TransitionProgram};
use lockmint::storage::BridgeStore;
use tempfile::tempdir;

// ============================================================================
// RAW OPERATIONS
// ============================================================================

/// Test: raw put, get, delete, and prefix listing
#[test]
fn test_raw_key_operations() {
    let dir = tempdir().unwrap();
    let store = BridgeStore::open(dir.path()).unwrap();

    assert!(store.is_empty().unwrap());
    assert_eq!(store.get_raw(b"missing").unwrap(), None);

    store.put_raw(b"alpha:1", b"one").unwrap();
    store.put_raw(b"alpha:2", b"two").unwrap();
    store.put_raw(b"beta:1", b"three").unwrap();

    assert_eq!(store.get_raw(b"alpha:1").unwrap(), Some(b"one".to_vec()));
    assert_eq!(store.list_keys_with_prefix(b"alpha:").unwrap().len(), 2);
    assert!(!store.is_empty().unwrap());

    store.delete(b"alpha:1").unwrap();
    assert_eq!(store.get_raw(b"alpha:1").unwrap(), None);
    assert_eq!(store.list_keys_with_prefix(b"alpha:").unwrap().len(), 1);

    let stats = store.stats().unwrap();
    assert_eq!(stats.key_count, 2);
}

// ============================================================================
// KEYPAIRS
// ============================================================================

/// Test: the default keypair slot round trips
#[test]
fn test_keypair_round_trip() {
    let dir = tempdir().unwrap();
    let store = BridgeStore::open(dir.path()).unwrap();

    assert!(store.load_keypair().unwrap().is_none());

    let keypair = Keypair::generate();
    store.save_keypair(&keypair).unwrap();
    let loaded = store.load_keypair().unwrap().unwrap();

    assert_eq!(loaded.public_key(), keypair.public_key());
    assert_eq!(loaded.to_bytes(), keypair.to_bytes());
}

/// Test: labelled keypairs are stored and listed independently
#[test]
fn test_labelled_keypairs() {
    let dir = tempdir().unwrap();
    let store = BridgeStore::open(dir.path()).unwrap();

    let controller_key = Keypair::generate();
    let owner_key = Keypair::generate();
    store
        .save_keypair_with_label(&controller_key, "controller")
        .unwrap();
    store.save_keypair_with_label(&owner_key, "owner").unwrap();

    let mut labels = store.list_keypair_labels().unwrap();
    labels.sort();
    assert_eq!(labels, vec!["controller".to_string(), "owner".to_string()]);

    let loaded = store.load_keypair_with_label("owner").unwrap().unwrap();
    assert_eq!(loaded.public_key(), owner_key.public_key());
    assert!(store.load_keypair_with_label("nobody").unwrap().is_none());
}

// ============================================================================
// CHAIN PERSISTENCE
// ============================================================================

/// Test: chain accounts and height survive a store reopen
#[test]
fn test_chain_round_trip_across_reopen() {
    let dir = tempdir().unwrap();
    let keypair = Keypair::generate();

    {
        let store = BridgeStore::open(dir.path()).unwrap();
        let mut chain = LocalChain::new();
        chain.fund(&keypair.public_key(), 750);
        store.save_chain(&chain).unwrap();
        store.flush().unwrap();
    }

    let store = BridgeStore::open(dir.path()).unwrap();
    let chain = store.load_chain().unwrap().unwrap();

    assert_eq!(chain.balance(&AccountId::base(keypair.public_key())), 750);
    assert_eq!(chain.account_count(), 1);
    assert_eq!(chain.height(), 0);
}

/// Test: a store with no chain loads None
#[test]
fn test_missing_chain_loads_none() {
    let dir = tempdir().unwrap();
    let store = BridgeStore::open(dir.path()).unwrap();

    assert!(store.load_chain().unwrap().is_none());
    assert!(store.load_controller_record().unwrap().is_none());
}

/// Test: programs are code, not data; a loaded chain starts without them
#[test]
fn test_loaded_chain_has_no_programs() {
    let dir = tempdir().unwrap();
    let store = BridgeStore::open(dir.path()).unwrap();

    let mut chain = LocalChain::new();
    let mint_program = MintProgram::new();
    let hash = mint_program.hash();
    chain.register_program(Arc::new(mint_program));
    assert!(chain.has_program(&hash));

    store.save_chain(&chain).unwrap();
    let loaded = store.load_chain().unwrap().unwrap();

    assert!(!loaded.has_program(&hash));
}

// ============================================================================
// RESUMING A DEPLOYMENT
// ============================================================================

/// Test: a full deployment resumes from disk and keeps minting
#[test]
fn test_deployment_resumes_from_disk() {
    let dir = tempdir().unwrap();
    let controller_key = Keypair::generate();
    let owner = Keypair::generate();

    // First run: deploy, provision, mint 100, persist everything.
    {
        let store = BridgeStore::open(dir.path()).unwrap();
        let mut chain = LocalChain::new();
        let mint_program = MintProgram::new();
        let committed = mint_program.hash();
        chain.register_program(Arc::new(mint_program));

        let controller =
            Controller::deploy(&mut chain, &controller_key, ControllerConfig::new(committed))
                .unwrap();
        controller
            .set_up_storage(&mut chain, &owner, MintProgram::new().verification_program())
            .unwrap();
        let credited = controller.mint(&mut chain, &owner, 100).unwrap();
        assert_eq!(credited, 100);

        store.save_chain(&chain).unwrap();
        store.save_controller_record(&controller.record()).unwrap();
        store
            .save_keypair_with_label(&controller_key, "controller")
            .unwrap();
        store.flush().unwrap();
    }

    // Second run: load, re-register programs, and mint the next delta.
    let store = BridgeStore::open(dir.path()).unwrap();
    let mut chain = store.load_chain().unwrap().unwrap();
    chain.register_program(Arc::new(MintProgram::new()));
    chain.register_program(Arc::new(ControllerProgram::new()));

    let record = store.load_controller_record().unwrap().unwrap();
    let controller = Controller::from_record(record);

    assert_eq!(controller.minted_so_far(&chain, &owner.public_key()), Some(100));
    let credited = controller.mint(&mut chain, &owner, 150).unwrap();
    assert_eq!(credited, 50);
    assert_eq!(controller.wrapped_balance(&chain, &owner.public_key()), 150);
}
