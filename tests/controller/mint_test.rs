// Mint relay tests
// Cumulative attestations, delta credits, and the rejection paths

use std::sync::Arc;

use lockmint::controller::{Controller, ControllerConfig, ControllerError};
use lockmint::identity::Keypair;
use lockmint::ledger::{MintError, MintProgram};
use lockmint::settlement::{
    AccountId, AccountState, AccountUpdateBuilder, LocalChain, SettlementError, Transaction,
    TransitionProgram,
};

fn provisioned() -> (LocalChain, Controller, Keypair) {
    let mut chain = LocalChain::new();
    let controller_key = Keypair::generate();
    let mint_program = MintProgram::new();
    let committed = mint_program.hash();
    chain.register_program(Arc::new(mint_program));
    let controller =
        Controller::deploy(&mut chain, &controller_key, ControllerConfig::new(committed)).unwrap();

    let owner = Keypair::generate();
    controller
        .set_up_storage(&mut chain, &owner, MintProgram::new().verification_program())
        .unwrap();
    (chain, controller, owner)
}

// ============================================================================
// THE HAPPY PATH
// ============================================================================

/// Test: the first mint credits the full attested amount
#[test]
fn test_first_mint_credits_the_full_amount() {
    let (mut chain, controller, owner) = provisioned();

    let credited = controller.mint(&mut chain, &owner, 100).unwrap();

    assert_eq!(credited, 100);
    assert_eq!(controller.minted_so_far(&chain, &owner.public_key()), Some(100));
    assert_eq!(controller.wrapped_balance(&chain, &owner.public_key()), 100);
}

/// Test: a later attestation credits only the difference
#[test]
fn test_follow_up_mint_credits_the_delta() {
    let (mut chain, controller, owner) = provisioned();
    controller.mint(&mut chain, &owner, 100).unwrap();

    let credited = controller.mint(&mut chain, &owner, 150).unwrap();

    assert_eq!(credited, 50);
    assert_eq!(controller.minted_so_far(&chain, &owner.public_key()), Some(150));
    assert_eq!(controller.wrapped_balance(&chain, &owner.public_key()), 150);
}

/// Test: the wrapped balance always equals the counter
#[test]
fn test_supply_tracks_the_counter() {
    let (mut chain, controller, owner) = provisioned();

    for locked in [10, 25, 60, 61] {
        controller.mint(&mut chain, &owner, locked).unwrap();
        assert_eq!(
            controller.wrapped_balance(&chain, &owner.public_key()),
            controller
                .minted_so_far(&chain, &owner.public_key())
                .unwrap()
        );
    }
}

/// Test: owners mint against independent counters
#[test]
fn test_owners_mint_independently() {
    let (mut chain, controller, alice) = provisioned();
    let bob = Keypair::generate();
    controller
        .set_up_storage(&mut chain, &bob, MintProgram::new().verification_program())
        .unwrap();

    controller.mint(&mut chain, &alice, 100).unwrap();
    controller.mint(&mut chain, &bob, 30).unwrap();

    assert_eq!(controller.minted_so_far(&chain, &alice.public_key()), Some(100));
    assert_eq!(controller.minted_so_far(&chain, &bob.public_key()), Some(30));
}

/// Test: the counter can be driven to u64::MAX in one mint
#[test]
fn test_mint_to_u64_max() {
    let (mut chain, controller, owner) = provisioned();

    let credited = controller.mint(&mut chain, &owner, u64::MAX).unwrap();

    assert_eq!(credited, u64::MAX);
    assert_eq!(
        controller.minted_so_far(&chain, &owner.public_key()),
        Some(u64::MAX)
    );
}

// ============================================================================
// REJECTION PATHS
// ============================================================================

/// Test: repeating an attestation mints nothing and changes nothing
#[test]
fn test_repeated_attestation_is_rejected() {
    let (mut chain, controller, owner) = provisioned();
    controller.mint(&mut chain, &owner, 150).unwrap();
    let height = chain.height();

    let result = controller.mint(&mut chain, &owner, 150);

    assert!(matches!(
        result,
        Err(ControllerError::Mint(MintError::ZeroMintRejected))
    ));
    assert_eq!(controller.minted_so_far(&chain, &owner.public_key()), Some(150));
    assert_eq!(controller.wrapped_balance(&chain, &owner.public_key()), 150);
    assert_eq!(chain.height(), height);
}

/// Test: a zero attestation on a fresh sub-ledger mints nothing
#[test]
fn test_zero_attestation_is_rejected() {
    let (mut chain, controller, owner) = provisioned();

    let result = controller.mint(&mut chain, &owner, 0);

    assert!(matches!(
        result,
        Err(ControllerError::Mint(MintError::ZeroMintRejected))
    ));
    assert_eq!(controller.wrapped_balance(&chain, &owner.public_key()), 0);
}

/// Test: an attestation below the counter reports both values
#[test]
fn test_shrinking_attestation_reports_both_sides() {
    let (mut chain, controller, owner) = provisioned();
    controller.mint(&mut chain, &owner, 150).unwrap();

    let result = controller.mint(&mut chain, &owner, 60);

    match result {
        Err(ControllerError::Mint(MintError::UnderflowViolation {
            locked_so_far,
            minted_so_far,
        })) => {
            assert_eq!(locked_so_far, 60);
            assert_eq!(minted_so_far, 150);
        }
        other => panic!("expected an underflow violation, got {:?}", other),
    }
    assert_eq!(controller.minted_so_far(&chain, &owner.public_key()), Some(150));
}

/// Test: minting without a provisioned sub-ledger fails
#[test]
fn test_mint_without_provisioning_fails() {
    let (mut chain, controller, _owner) = provisioned();
    let stranger = Keypair::generate();

    let result = controller.mint(&mut chain, &stranger, 100);

    assert!(matches!(
        result,
        Err(ControllerError::StorageNotProvisioned(_))
    ));
}

/// Test: minting needs the sub-ledger program in the registry
#[test]
fn test_mint_needs_a_registered_program() {
    // Deploy and provision without ever registering the mint program; the
    // proof cannot be checked when the first mint arrives.
    let mut chain = LocalChain::new();
    let controller_key = Keypair::generate();
    let committed = MintProgram::new().hash();
    let controller =
        Controller::deploy(&mut chain, &controller_key, ControllerConfig::new(committed)).unwrap();
    let owner = Keypair::generate();
    controller
        .set_up_storage(&mut chain, &owner, MintProgram::new().verification_program())
        .unwrap();

    let result = controller.mint(&mut chain, &owner, 100);

    assert!(matches!(
        result,
        Err(ControllerError::Settlement(SettlementError::UnknownProgram(
            _
        )))
    ));
}

/// Test: bulk approval of caller-supplied bundles is always refused
#[test]
fn test_bulk_approval_is_always_refused() {
    let (mut chain, controller, owner) = provisioned();
    controller.mint(&mut chain, &owner, 10).unwrap();

    let empty = Transaction::new(Vec::new());
    assert!(matches!(
        controller.approve_base(&empty),
        Err(ControllerError::UnsupportedBulkApproval)
    ));

    let touch = AccountUpdateBuilder::new(AccountId::base(owner.public_key())).build();
    assert!(matches!(
        controller.approve_base(&Transaction::single(touch)),
        Err(ControllerError::UnsupportedBulkApproval)
    ));
}

// ============================================================================
// FORGERY
// ============================================================================

/// Test: a mint witness signed by anyone but the owner is rejected
#[test]
fn test_forged_mint_witness_is_rejected() {
    let (mut chain, controller, owner) = provisioned();
    let attacker = Keypair::generate();
    let storage_id = AccountId::in_namespace(owner.public_key(), controller.token_id());

    let storage_update = AccountUpdateBuilder::new(storage_id.clone())
        .require_minted_so_far(0)
        .set_state(AccountState::SubLedger { minted_so_far: 500 })
        .credit(500)
        .build()
        .authorize_signed_proof(controller.storage_program_hash(), &attacker);

    let controller_program = chain
        .account(&AccountId::base(controller.address().clone()))
        .unwrap()
        .program
        .unwrap();
    let parent = AccountUpdateBuilder::new(AccountId::base(controller.address().clone()))
        .require_storage_program_hash(controller.storage_program_hash())
        .child(storage_update)
        .build()
        .authorize_proof(controller_program);
    let result = chain.apply(&Transaction::single(parent));

    assert!(matches!(
        result,
        Err(SettlementError::AuthorizationRejected { .. })
    ));
    assert_eq!(controller.wrapped_balance(&chain, &owner.public_key()), 0);
}

/// Test: a bare proof without the owner witness cannot mint
#[test]
fn test_mint_without_witness_is_rejected() {
    let (mut chain, controller, owner) = provisioned();
    let storage_id = AccountId::in_namespace(owner.public_key(), controller.token_id());

    let storage_update = AccountUpdateBuilder::new(storage_id)
        .require_minted_so_far(0)
        .set_state(AccountState::SubLedger { minted_so_far: 500 })
        .credit(500)
        .build()
        .authorize_proof(controller.storage_program_hash());

    let controller_program = chain
        .account(&AccountId::base(controller.address().clone()))
        .unwrap()
        .program
        .unwrap();
    let parent = AccountUpdateBuilder::new(AccountId::base(controller.address().clone()))
        .require_storage_program_hash(controller.storage_program_hash())
        .child(storage_update)
        .build()
        .authorize_proof(controller_program);
    let result = chain.apply(&Transaction::single(parent));

    assert!(matches!(result, Err(SettlementError::ProofRejected { .. })));
    assert_eq!(controller.wrapped_balance(&chain, &owner.public_key()), 0);
}
